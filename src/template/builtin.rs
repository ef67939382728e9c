use super::Template;

fn tpl(name: &str, rows: &[&[u8]]) -> Template {
    Template {
        name: name.to_string(),
        grid: rows.iter().map(|r| r.to_vec()).collect(),
    }
}

/// Templates shipped with the binary.
pub fn builtin_templates() -> Vec<Template> {
    vec![
        tpl(
            "skull",
            &[
                &[0, 0, 2, 2, 2, 2, 0, 0],
                &[0, 2, 4, 2, 2, 4, 2, 0],
                &[2, 4, 4, 2, 2, 4, 4, 2],
                &[2, 2, 2, 4, 4, 2, 2, 2],
                &[2, 4, 2, 2, 2, 2, 4, 2],
                &[0, 2, 4, 4, 4, 4, 2, 0],
                &[0, 0, 2, 2, 2, 2, 0, 0],
            ],
        ),
        tpl(
            "heart",
            &[
                &[0, 2, 2, 0, 2, 2, 0],
                &[2, 4, 4, 2, 4, 4, 2],
                &[4, 4, 4, 4, 4, 4, 4],
                &[4, 4, 4, 4, 4, 4, 4],
                &[2, 4, 4, 4, 4, 4, 2],
                &[0, 2, 4, 4, 4, 2, 0],
                &[0, 0, 2, 2, 2, 0, 0],
            ],
        ),
        tpl(
            "smile",
            &[
                &[0, 0, 2, 2, 2, 2, 0, 0],
                &[0, 2, 0, 2, 2, 0, 2, 0],
                &[2, 0, 4, 0, 0, 4, 0, 2],
                &[2, 0, 0, 0, 0, 0, 0, 2],
                &[2, 0, 4, 0, 0, 4, 0, 2],
                &[2, 0, 0, 4, 4, 0, 0, 2],
                &[0, 2, 0, 0, 0, 0, 2, 0],
            ],
        ),
        tpl(
            "diamond",
            &[
                &[0, 0, 0, 2, 0, 0, 0],
                &[0, 0, 2, 4, 2, 0, 0],
                &[0, 2, 4, 4, 4, 2, 0],
                &[2, 4, 4, 4, 4, 4, 2],
                &[0, 2, 4, 4, 4, 2, 0],
                &[0, 0, 2, 4, 2, 0, 0],
                &[0, 0, 0, 2, 0, 0, 0],
            ],
        ),
        tpl(
            "checkmark",
            &[
                &[0, 0, 0, 0, 0, 0, 2],
                &[0, 0, 0, 0, 0, 2, 4],
                &[0, 0, 0, 0, 2, 4, 2],
                &[2, 0, 0, 2, 4, 2, 0],
                &[4, 2, 2, 4, 2, 0, 0],
                &[2, 4, 4, 2, 0, 0, 0],
                &[0, 2, 2, 0, 0, 0, 0],
            ],
        ),
    ]
}
