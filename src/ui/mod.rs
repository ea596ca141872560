//! User interface module - interaction (prompts) and formatting.
//!
//! Separates concerns:
//! - `formatter` - Pure formatting functions
//! - This module - Interactive prompts and user input handling

use std::io::{self, IsTerminal};

use anyhow::Result;
use console::Term;

pub mod formatter;

// Re-export formatter functions for convenience
pub use formatter::{
    display_boundary_warning, display_determination, display_error, display_notification,
    display_pipeline_status, display_rollback, display_stability, display_status, display_step,
    display_success,
};

/// Whether a person can answer prompts
///
/// Requires stdin and stderr to be terminals; CI runners have neither.
pub fn is_interactive() -> bool {
    io::stdin().is_terminal() && Term::stderr().is_term()
}

/// Prompts user to confirm an action with a yes/no prompt.
///
/// Displays the given prompt and accepts "y" or "yes" (case-insensitive) as confirmation.
/// Default is "no" if user presses Enter.
///
/// # Arguments
/// * `prompt` - The prompt message to display (without the "(y/N): " suffix)
///
/// # Returns
/// * `Ok(true)` - If user entered "y" or "yes"
/// * `Ok(false)` - Otherwise (including Enter, or "n"/"no")
/// * `Err` - If input error occurs
pub fn confirm_action(prompt: &str) -> Result<bool> {
    let term = Term::stderr();
    term.write_str(&format!("\n{} (y/N): ", prompt))?;
    let input = term.read_line()?;
    Ok(is_yes(&input))
}

fn is_yes(input: &str) -> bool {
    let response = input.trim().to_lowercase();
    response == "y" || response == "yes"
}
