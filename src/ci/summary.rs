//! Markdown building blocks for job summaries

/// Render a Markdown table, escaping pipes in cells
pub fn markdown_table(headers: &[&str], rows: &[Vec<String>]) -> Vec<String> {
    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(format!("| {} |", headers.join(" | ")));
    lines.push(format!(
        "|{}|",
        headers.iter().map(|_| "---").collect::<Vec<_>>().join("|")
    ));
    for row in rows {
        let cells: Vec<String> = row.iter().map(|c| c.replace('|', "\\|")).collect();
        lines.push(format!("| {} |", cells.join(" | ")));
    }
    lines
}

/// `- **Key:** value` bullet
pub fn field(key: &str, value: &str) -> String {
    format!("- **{}:** {}", key, value)
}

/// Inline code span
pub fn code(value: &str) -> String {
    format!("`{}`", value)
}
