use std::collections::HashMap;
use std::path::PathBuf;

/// Snapshot of the process environment taken once at startup
///
/// Everything downstream reads variables through this type so commands can
/// be exercised in tests without touching the real environment.
#[derive(Debug, Clone, Default)]
pub struct CiEnv {
    vars: HashMap<String, String>,
}

impl CiEnv {
    pub fn from_process() -> Self {
        CiEnv {
            vars: std::env::vars().collect(),
        }
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        CiEnv {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn vars(&self) -> &HashMap<String, String> {
        &self.vars
    }

    /// Value of a variable; empty values count as unset
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(|v| v.as_str())
            .filter(|v| !v.trim().is_empty())
    }

    pub fn github_output(&self) -> Option<PathBuf> {
        self.get("GITHUB_OUTPUT").map(PathBuf::from)
    }

    pub fn step_summary(&self) -> Option<PathBuf> {
        self.get("GITHUB_STEP_SUMMARY").map(PathBuf::from)
    }

    pub fn sha(&self) -> Option<&str> {
        self.get("GITHUB_SHA")
    }

    pub fn short_sha(&self) -> Option<String> {
        self.sha().map(|sha| sha.chars().take(7).collect())
    }

    pub fn ref_name(&self) -> Option<&str> {
        self.get("GITHUB_REF_NAME")
    }

    pub fn repository(&self) -> Option<&str> {
        self.get("GITHUB_REPOSITORY")
    }

    pub fn token(&self) -> Option<&str> {
        self.get("GITHUB_TOKEN")
    }

    /// Link to the current workflow run, when running inside Actions
    pub fn run_url(&self) -> Option<String> {
        let server = self.get("GITHUB_SERVER_URL").unwrap_or("https://github.com");
        let repository = self.repository()?;
        let run_id = self.get("GITHUB_RUN_ID")?;
        Some(format!(
            "{}/{}/actions/runs/{}",
            server.trim_end_matches('/'),
            repository,
            run_id
        ))
    }

    /// `ENABLE_<NAME>` feature flag
    ///
    /// `true/1/yes/on` enable, `false/0/no/off` disable (case-insensitive);
    /// unset or unrecognised values yield `None`.
    pub fn feature_flag(&self, name: &str) -> Option<bool> {
        let value = self.get(&format!("ENABLE_{}", name))?;
        match value.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_values_are_unset() {
        let env = CiEnv::from_pairs([("GITHUB_OUTPUT", ""), ("GITHUB_SHA", "abc")]);
        assert_eq!(env.github_output(), None);
        assert_eq!(env.sha(), Some("abc"));
    }

    #[test]
    fn test_short_sha() {
        let env = CiEnv::from_pairs([("GITHUB_SHA", "0123456789abcdef")]);
        assert_eq!(env.short_sha().as_deref(), Some("0123456"));
    }

    #[test]
    fn test_run_url() {
        let env = CiEnv::from_pairs([
            ("GITHUB_REPOSITORY", "acme/widgets"),
            ("GITHUB_RUN_ID", "42"),
        ]);
        assert_eq!(
            env.run_url().as_deref(),
            Some("https://github.com/acme/widgets/actions/runs/42")
        );
        assert_eq!(CiEnv::default().run_url(), None);
    }

    #[test]
    fn test_feature_flag() {
        let env = CiEnv::from_pairs([
            ("ENABLE_BUILD", "false"),
            ("ENABLE_TEST", "Yes"),
            ("ENABLE_LINT", "maybe"),
        ]);
        assert_eq!(env.feature_flag("BUILD"), Some(false));
        assert_eq!(env.feature_flag("TEST"), Some(true));
        assert_eq!(env.feature_flag("LINT"), None);
        assert_eq!(env.feature_flag("DEPLOY"), None);
    }
}
