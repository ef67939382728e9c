//! Minimal GitHub REST client: token validation and repository access checks.

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::Failure;

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub login: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub full_name: String,
    #[serde(default)]
    pub private: bool,
    /// Present only for authenticated requests.
    #[serde(default)]
    pub permissions: Option<Permissions>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Permissions {
    #[serde(default)]
    pub push: bool,
}

impl Repository {
    pub fn can_push(&self) -> bool {
        self.permissions.is_some_and(|p| p.push)
    }
}

pub struct GitHub {
    client: Client,
    api_url: String,
}

impl GitHub {
    /// Client for `api_url` (e.g. `https://api.github.com`) authenticated with `token`.
    pub fn new(api_url: &str, token: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("contrib-art"));
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token))
            .context("token contains invalid characters")
            .context(Failure::Input)?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder().default_headers(headers).build()?;
        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    fn get(&self, path: &str) -> Result<Response> {
        let url = format!("{}{}", self.api_url, path);
        debug!(%url, "GET");
        self.client
            .get(&url)
            .send()
            .with_context(|| format!("GET {} failed", url))
    }

    /// The user the token belongs to.
    ///
    /// # Errors
    /// A rejected token (401) is a [`Failure::Auth`].
    pub fn user(&self) -> Result<User> {
        let resp = self.get("/user")?;
        match resp.status() {
            StatusCode::UNAUTHORIZED => Err(anyhow!("GitHub rejected the token (401 Unauthorized)"))
                .context(Failure::Auth),
            _ => json(resp),
        }
    }

    /// Repository `owner/name` as seen with this token.
    ///
    /// # Errors
    /// 401, and 404 (GitHub hides private repositories the token cannot see),
    /// are [`Failure::Auth`].
    pub fn repository(&self, slug: &str) -> Result<Repository> {
        let resp = self.get(&format!("/repos/{}", slug))?;
        match resp.status() {
            StatusCode::UNAUTHORIZED => Err(anyhow!("GitHub rejected the token (401 Unauthorized)"))
                .context(Failure::Auth),
            StatusCode::NOT_FOUND => Err(anyhow!(
                "repository {} not found, or not visible with this token",
                slug
            ))
            .context(Failure::Auth),
            _ => json(resp),
        }
    }

    /// Check that `slug` exists and the token may push to it.
    pub fn ensure_push_access(&self, slug: &str) -> Result<Repository> {
        let repo = self.repository(slug)?;
        if !repo.can_push() {
            return Err(anyhow!("token has no push permission on {}", repo.full_name))
                .context(Failure::Auth);
        }
        Ok(repo)
    }
}

fn json<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        let url = resp.url().clone();
        bail!("GET {} returned {}", url, status);
    }
    resp.json().context("unexpected response from GitHub")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::exit_code_for;
    use httpmock::prelude::*;

    fn client(server: &MockServer) -> GitHub {
        GitHub::new(&server.base_url(), "ghp_test").unwrap()
    }

    #[test]
    fn user_is_parsed_and_token_sent() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(GET)
                .path("/user")
                .header("Authorization", "Bearer ghp_test");
            then.status(200).json_body(serde_json::json!({
                "login": "octocat",
                "id": 1,
                "created_at": "2011-01-25T18:44:36Z"
            }));
        });

        let user = client(&server).user().unwrap();
        m.assert();
        assert_eq!(user.login, "octocat");
        assert_eq!(user.created_at.date_naive().to_string(), "2011-01-25");
    }

    #[test]
    fn rejected_token_is_an_auth_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/user");
            then.status(401).json_body(serde_json::json!({"message": "Bad credentials"}));
        });

        let err = client(&server).user().unwrap_err();
        assert_eq!(exit_code_for(&err), 3);
    }

    #[test]
    fn missing_repository_is_an_auth_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/repos/octocat/nope");
            then.status(404).json_body(serde_json::json!({"message": "Not Found"}));
        });

        let err = client(&server).repository("octocat/nope").unwrap_err();
        assert_eq!(exit_code_for(&err), 3);
        assert!(format!("{:#}", err).contains("octocat/nope"));
    }

    #[test]
    fn push_permission_is_required() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/repos/octocat/art");
            then.status(200).json_body(serde_json::json!({
                "full_name": "octocat/art",
                "private": false,
                "permissions": {"admin": false, "push": false, "pull": true}
            }));
        });
        server.mock(|when, then| {
            when.method(GET).path("/repos/octocat/mine");
            then.status(200).json_body(serde_json::json!({
                "full_name": "octocat/mine",
                "private": true,
                "permissions": {"admin": true, "push": true, "pull": true}
            }));
        });

        let gh = client(&server);
        let err = gh.ensure_push_access("octocat/art").unwrap_err();
        assert_eq!(exit_code_for(&err), 3);
        let repo = gh.ensure_push_access("octocat/mine").unwrap();
        assert!(repo.private);
    }

    #[test]
    fn server_errors_are_unclassified() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/user");
            then.status(502);
        });

        let err = client(&server).user().unwrap_err();
        assert_eq!(exit_code_for(&err), 1);
    }
}
