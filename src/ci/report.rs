//! Step outputs and job summary, written once per invocation.

use crate::ci::env::CiEnv;
use crate::error::Result;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Outputs and summary Markdown collected while a command runs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CiReport {
    outputs: Vec<(String, String)>,
    summary: Vec<String>,
}

impl CiReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an output, replacing an earlier value for the same key
    pub fn set_output(&mut self, key: impl Into<String>, value: impl ToString) {
        let key = key.into();
        let value = value.to_string();
        match self.outputs.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.outputs.push((key, value)),
        }
    }

    pub fn output(&self, key: &str) -> Option<&str> {
        self.outputs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn outputs(&self) -> &[(String, String)] {
        &self.outputs
    }

    pub fn add_summary(&mut self, line: impl Into<String>) {
        self.summary.push(line.into());
    }

    pub fn summary(&self) -> &[String] {
        &self.summary
    }

    /// `$GITHUB_OUTPUT` file content
    ///
    /// Single-line values use `key=value`; multi-line values use the
    /// `key<<DELIM` form with a delimiter that does not occur in the value.
    pub fn render_outputs(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.outputs {
            if value.contains('\n') {
                let delimiter = heredoc_delimiter(value);
                out.push_str(&format!("{}<<{}\n{}\n{}\n", key, delimiter, value, delimiter));
            } else {
                out.push_str(&format!("{}={}\n", key, value));
            }
        }
        out
    }

    /// `$GITHUB_STEP_SUMMARY` file content
    pub fn render_summary(&self) -> String {
        if self.summary.is_empty() {
            return String::new();
        }
        let mut out = self.summary.join("\n");
        out.push('\n');
        out
    }

    /// Append outputs and summary to the files named by the environment
    ///
    /// Missing variables mean "not running in Actions" and are not an error.
    pub fn write(&self, env: &CiEnv) -> Result<()> {
        match env.github_output() {
            Some(path) if !self.outputs.is_empty() => append(&path, &self.render_outputs())?,
            Some(_) => {}
            None => debug!(outputs = ?self.outputs, "GITHUB_OUTPUT not set, outputs not written"),
        }

        match env.step_summary() {
            Some(path) if !self.summary.is_empty() => append(&path, &self.render_summary())?,
            Some(_) => {}
            None => debug!("GITHUB_STEP_SUMMARY not set, summary not written"),
        }

        Ok(())
    }
}

fn heredoc_delimiter(value: &str) -> String {
    let mut delimiter = "EOF".to_string();
    let mut n = 0;
    while value.lines().any(|line| line == delimiter) {
        n += 1;
        delimiter = format!("EOF_{}", n);
    }
    delimiter
}

fn append(path: &Path, content: &str) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_output_replaces() {
        let mut report = CiReport::new();
        report.set_output("version", "1.0.0");
        report.set_output("tag", "v1.0.0");
        report.set_output("version", "1.0.1");

        assert_eq!(report.output("version"), Some("1.0.1"));
        assert_eq!(report.render_outputs(), "version=1.0.1\ntag=v1.0.0\n");
    }

    #[test]
    fn test_multiline_output_uses_heredoc() {
        let mut report = CiReport::new();
        report.set_output("body", "line one\nline two");
        assert_eq!(report.render_outputs(), "body<<EOF\nline one\nline two\nEOF\n");
    }

    #[test]
    fn test_heredoc_delimiter_avoids_collision() {
        assert_eq!(heredoc_delimiter("a\nEOF\nb"), "EOF_1");
        assert_eq!(heredoc_delimiter("EOF\nEOF_1"), "EOF_2");
        assert_eq!(heredoc_delimiter("EOFX"), "EOF");
    }

    #[test]
    fn test_render_summary() {
        let mut report = CiReport::new();
        assert_eq!(report.render_summary(), "");
        report.add_summary("## Version");
        report.add_summary("- **Version:** `1.0.0`");
        assert_eq!(report.render_summary(), "## Version\n- **Version:** `1.0.0`\n");
    }

    #[test]
    fn test_write_appends_to_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let output = dir.path().join("output");
        let summary = dir.path().join("summary");
        std::fs::write(&output, "existing=1\n").unwrap();

        let env = CiEnv::from_pairs([
            ("GITHUB_OUTPUT", output.to_str().unwrap()),
            ("GITHUB_STEP_SUMMARY", summary.to_str().unwrap()),
        ]);

        let mut report = CiReport::new();
        report.set_output("status", "success");
        report.add_summary("All good");
        report.write(&env).unwrap();

        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            "existing=1\nstatus=success\n"
        );
        assert_eq!(std::fs::read_to_string(&summary).unwrap(), "All good\n");
    }

    #[test]
    fn test_write_without_env_is_noop() {
        let mut report = CiReport::new();
        report.set_output("status", "success");
        assert!(report.write(&CiEnv::default()).is_ok());
    }
}
