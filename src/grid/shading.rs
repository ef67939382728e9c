use anyhow::{Result, bail};
use serde::Deserialize;

use super::MAX_LEVEL;

/// Darkness thresholds for levels 1..=4.
///
/// A pixel with darkness `d` (`255 - luma`) gets the highest level whose
/// threshold is `<= d`. The defaults reproduce `floor(d / 255 * 4)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "[u8; 4]")]
pub struct Shading {
    thresholds: [u8; 4],
}

impl Default for Shading {
    fn default() -> Self {
        Self {
            thresholds: [64, 128, 192, 255],
        }
    }
}

impl Shading {
    pub fn new(thresholds: [u8; 4]) -> Result<Self> {
        if thresholds[0] == 0 {
            bail!("shading threshold for level 1 must be above 0");
        }
        if thresholds.windows(2).any(|w| w[0] >= w[1]) {
            bail!("shading thresholds must be strictly increasing: {:?}", thresholds);
        }
        Ok(Self { thresholds })
    }

    pub fn level(&self, darkness: u8) -> u8 {
        self.thresholds
            .iter()
            .take_while(|&&t| darkness >= t)
            .count() as u8
    }

    /// Level for a luma value (bright pixels are inactive).
    pub fn level_for_luma(&self, luma: u8) -> u8 {
        self.level(255 - luma)
    }
}

impl TryFrom<[u8; 4]> for Shading {
    type Error = anyhow::Error;

    fn try_from(value: [u8; 4]) -> Result<Self> {
        Shading::new(value)
    }
}

/// Number of commits to create for each level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "[u32; 4]")]
pub struct CommitTiers {
    counts: [u32; MAX_LEVEL as usize],
}

impl Default for CommitTiers {
    fn default() -> Self {
        Self {
            counts: [1, 2, 3, 4],
        }
    }
}

impl CommitTiers {
    pub fn new(counts: [u32; 4]) -> Result<Self> {
        if counts.contains(&0) {
            bail!("every level needs at least one commit: {:?}", counts);
        }
        if counts.windows(2).any(|w| w[0] > w[1]) {
            bail!("commit counts must not decrease with level: {:?}", counts);
        }
        Ok(Self { counts })
    }

    /// Commits for `level`; zero for inactive cells.
    pub fn count(&self, level: u8) -> u32 {
        match level {
            0 => 0,
            l => self.counts[usize::from(l.min(MAX_LEVEL)) - 1],
        }
    }

    /// Commits for the darkest level, the most any date receives.
    pub fn max(&self) -> u32 {
        self.counts[usize::from(MAX_LEVEL) - 1]
    }
}

impl TryFrom<[u32; 4]> for CommitTiers {
    type Error = anyhow::Error;

    fn try_from(value: [u32; 4]) -> Result<Self> {
        CommitTiers::new(value)
    }
}
