//! GitHub Actions plumbing: environment snapshot, outputs and step summary

pub mod env;
pub mod report;
pub mod summary;

pub use env::CiEnv;
pub use report::CiReport;
