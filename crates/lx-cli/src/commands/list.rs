//! List command - one line per matching element

use super::NameDisplay;
use crate::config::Settings;
use anyhow::Result;
use lx_inspect::QueryResults;

/// Print every element selected by `patterns`
pub fn run(settings: &Settings, patterns: &[String], display: NameDisplay) -> Result<()> {
    let results = super::explore(settings, patterns)?;
    for line in render(&results, display) {
        println!("{}", line);
    }
    Ok(())
}

/// Scope glyph and display name of each element, sorted
pub fn render(results: &QueryResults, display: NameDisplay) -> Vec<String> {
    let mut lines: Vec<String> = results
        .all()
        .iter()
        .map(|element| format!("{} {}", element.glyph(), display.name(element)))
        .collect();
    lines.sort();
    lines
}
