//! Role inference from file-access patterns.
//!
//! An agent that has only ever touched test files is probably the test
//! agent. Scores the bounded path history against an ordered category
//! list; the winner becomes the display label when the agent still has a
//! placeholder label and the signal is strong enough.

/// Minimum number of matching paths before a category is applied.
pub const MIN_MATCHES: usize = 2;

/// Ordered category patterns. Earlier entries win ties. Patterns match as
/// substrings of the normalized (lowercase, forward-slash) path.
const CATEGORIES: &[(&str, &[&str])] = &[
    ("Tests", &["test", "spec.", "__tests__", "fixture"]),
    (
        "API",
        &["/api/", "/routes/", "route", "endpoint", "handler", "controller"],
    ),
    (
        "Frontend",
        &[".tsx", ".jsx", ".vue", ".svelte", "component", "/ui/", "/views/"],
    ),
    (
        "Database",
        &["migration", "schema", ".sql", "/db/", "/models/"],
    ),
    (
        "Config",
        &["config", ".toml", ".yaml", ".yml", ".env", "settings"],
    ),
    ("Docs", &["readme", ".md", "/docs/", "changelog"]),
    (
        "CI/CD",
        &["/.github/", "/workflows/", "dockerfile", ".gitlab-ci", "deploy"],
    ),
    ("Styles", &[".css", ".scss", ".less", "theme"]),
];

fn normalize(path: &str) -> String {
    path.to_lowercase().replace('\\', "/")
}

/// Infer a role label from a path history.
///
/// Returns the best-matching category label, or `None` when no category
/// reaches the match threshold.
pub fn infer_role_label<'a, I>(paths: I) -> Option<&'static str>
where
    I: IntoIterator<Item = &'a str>,
{
    let normalized: Vec<String> = paths.into_iter().map(normalize).collect();
    if normalized.is_empty() {
        return None;
    }

    let mut best: Option<(&'static str, usize)> = None;
    for (label, patterns) in CATEGORIES {
        let count = normalized
            .iter()
            .filter(|path| patterns.iter().any(|pat| path.contains(pat)))
            .count();
        // Strictly-greater keeps declaration order as the tiebreak
        if count >= MIN_MATCHES && best.is_none_or(|(_, b)| count > b) {
            best = Some((label, count));
        }
    }
    best.map(|(label, _)| label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_test_paths_infer_tests() {
        let paths = vec![
            "/app/tests/login_test.rs",
            "/app/tests/session_test.rs",
            "/app/src/config.rs",
            "/app/tests/helpers.rs",
        ];
        assert_eq!(infer_role_label(paths.iter().copied()), Some("Tests"));
    }

    #[test]
    fn test_single_match_below_threshold() {
        let paths = vec!["/app/src/config.rs"];
        assert_eq!(infer_role_label(paths.iter().copied()), None);
    }

    #[test]
    fn test_empty_history_infers_nothing() {
        assert_eq!(infer_role_label(std::iter::empty()), None);
    }

    #[test]
    fn test_api_paths() {
        let paths = vec![
            "/app/src/api/users.rs",
            "/app/src/api/billing.rs",
            "/app/src/main.rs",
        ];
        assert_eq!(infer_role_label(paths.iter().copied()), Some("API"));
    }

    #[test]
    fn test_frontend_paths() {
        let paths = vec![
            "/web/src/components/Button.tsx",
            "/web/src/components/Modal.tsx",
        ];
        assert_eq!(infer_role_label(paths.iter().copied()), Some("Frontend"));
    }

    #[test]
    fn test_docs_paths() {
        let paths = vec!["/app/README.md", "/app/docs/guide.md"];
        assert_eq!(infer_role_label(paths.iter().copied()), Some("Docs"));
    }

    #[test]
    fn test_tie_broken_by_declaration_order() {
        // Two Tests matches and two Config matches: Tests declared first
        let paths = vec![
            "/app/tests/a.rs",
            "/app/tests/b.rs",
            "/app/config/dev.toml",
            "/app/config/prod.toml",
        ];
        assert_eq!(infer_role_label(paths.iter().copied()), Some("Tests"));
    }

    #[test]
    fn test_windows_separators_normalized() {
        let paths = vec![r"C:\app\tests\a_test.rs", r"C:\app\tests\b_test.rs"];
        assert_eq!(infer_role_label(paths.iter().copied()), Some("Tests"));
    }

    #[test]
    fn test_case_insensitive() {
        let paths = vec!["/app/TESTS/A.rs", "/app/Tests/B.rs"];
        assert_eq!(infer_role_label(paths.iter().copied()), Some("Tests"));
    }
}
