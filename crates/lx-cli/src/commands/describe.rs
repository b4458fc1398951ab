//! Describe command - descriptions of public features and bundles

use crate::config::Settings;
use anyhow::Result;
use lx_inspect::{Element, QueryResults, Visibility};

const NO_DESCRIPTION: &str = "No description found";

pub fn run(settings: &Settings, patterns: &[String]) -> Result<()> {
    let results = super::explore(settings, patterns)?;
    for line in render(&results) {
        println!("{}", line);
    }
    Ok(())
}

/// Public features first, then bundles; each as a `name:` heading, the
/// description and a blank line
pub fn render(results: &QueryResults) -> Vec<String> {
    let all = results.all();
    let features = all
        .iter()
        .filter(|e| e.is_feature() && e.visibility() == Visibility::Public)
        .map(|e| (e.name(), e));
    let bundles = all.iter().filter_map(|e| {
        let bundle = e.as_bundle()?;
        let heading = bundle.file_name().unwrap_or(bundle.symbolic_name());
        Some((heading.to_string(), e))
    });

    let mut lines = Vec::new();
    for (heading, element) in features.chain(bundles) {
        lines.push(format!("{}:", heading));
        lines.push(description(element).to_string());
        lines.push(String::new());
    }
    lines
}

fn description(element: &Element) -> &str {
    element.description().unwrap_or(NO_DESCRIPTION)
}
