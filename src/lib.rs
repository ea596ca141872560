pub mod boundary;
pub mod ci;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod git;
pub mod logging;
pub mod notify;
pub mod release;
pub mod steps;
pub mod ui;

pub use error::{CiError, Result};
