use crate::error::{CiError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Result of a single workflow job as reported by GitHub Actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobResult {
    Success,
    Failure,
    Cancelled,
    Skipped,
}

impl FromStr for JobResult {
    type Err = CiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "success" => Ok(JobResult::Success),
            "failure" => Ok(JobResult::Failure),
            "cancelled" => Ok(JobResult::Cancelled),
            "skipped" => Ok(JobResult::Skipped),
            other => Err(CiError::config(format!("Unknown job result: '{}'", other))),
        }
    }
}

impl fmt::Display for JobResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobResult::Success => "success",
            JobResult::Failure => "failure",
            JobResult::Cancelled => "cancelled",
            JobResult::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

/// Overall pipeline status derived from job results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStatus {
    Success,
    Failure,
    Cancelled,
    Skipped,
}

impl PipelineStatus {
    pub fn emoji(&self) -> &'static str {
        match self {
            PipelineStatus::Success => "✅",
            PipelineStatus::Failure => "❌",
            PipelineStatus::Cancelled => "🚫",
            PipelineStatus::Skipped => "⏭️",
        }
    }
}

impl FromStr for PipelineStatus {
    type Err = CiError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s.parse::<JobResult>()? {
            JobResult::Success => PipelineStatus::Success,
            JobResult::Failure => PipelineStatus::Failure,
            JobResult::Cancelled => PipelineStatus::Cancelled,
            JobResult::Skipped => PipelineStatus::Skipped,
        })
    }
}

impl fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PipelineStatus::Success => "success",
            PipelineStatus::Failure => "failure",
            PipelineStatus::Cancelled => "cancelled",
            PipelineStatus::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

/// Named job results, ordered by job name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobResults {
    jobs: BTreeMap<String, JobResult>,
}

#[derive(Deserialize)]
struct NeedsEntry {
    result: String,
}

impl JobResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, result: JobResult) {
        self.jobs.insert(name.into(), result);
    }

    /// Parse a `name=result` pair
    pub fn insert_pair(&mut self, pair: &str) -> Result<()> {
        let (name, result) = pair.split_once('=').ok_or_else(|| {
            CiError::config(format!("Expected <job>=<result>, got '{}'", pair))
        })?;
        let name = name.trim();
        if name.is_empty() {
            return Err(CiError::config(format!("Missing job name in '{}'", pair)));
        }
        self.insert(name, result.parse()?);
        Ok(())
    }

    /// Parse the document produced by `${{ toJSON(needs) }}`
    pub fn from_needs_json(json: &str) -> Result<Self> {
        let needs: BTreeMap<String, NeedsEntry> = serde_json::from_str(json)?;
        let mut results = JobResults::new();
        for (name, entry) in needs {
            results.insert(name, entry.result.parse()?);
        }
        Ok(results)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Names of jobs with the given result
    pub fn with_result(&self, result: JobResult) -> Vec<&str> {
        self.jobs
            .iter()
            .filter(|(_, r)| **r == result)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, JobResult)> {
        self.jobs.iter().map(|(name, r)| (name.as_str(), *r))
    }

    /// Failure beats cancellation; only an all-skipped (or empty) set is skipped
    pub fn overall(&self) -> PipelineStatus {
        let results: Vec<JobResult> = self.jobs.values().copied().collect();

        if results.contains(&JobResult::Failure) {
            PipelineStatus::Failure
        } else if results.contains(&JobResult::Cancelled) {
            PipelineStatus::Cancelled
        } else if results.iter().all(|r| *r == JobResult::Skipped) {
            PipelineStatus::Skipped
        } else {
            PipelineStatus::Success
        }
    }
}
