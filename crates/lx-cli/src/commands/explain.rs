//! Explain command - a readable account of each matching feature

use crate::config::Settings;
use anyhow::Result;
use lx_inspect::{Feature, QueryResults, Visibility};

const BULLET: &str = "  - ";

pub fn run(settings: &Settings, patterns: &[String]) -> Result<()> {
    let results = super::explore(settings, patterns)?;
    for line in render(&results) {
        println!("{}", line);
    }
    Ok(())
}

/// Every feature in the full result set, in natural order
pub fn render(results: &QueryResults) -> Vec<String> {
    let mut lines = Vec::new();
    for element in results.all() {
        if let Some(feature) = element.as_feature() {
            explain(feature, &mut lines);
        }
    }
    lines
}

fn explain(feature: &Feature, lines: &mut Vec<String>) {
    let name = feature.name();
    lines.push(name.to_string());
    lines.push("=".repeat(name.chars().count()));

    let path = feature
        .path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<unknown>".to_string());
    lines.push(format!(
        "The feature {} is defined by the file: {}",
        feature.symbolic_name(),
        path
    ));
    if let Some(short_name) = feature.short_name() {
        lines.push(format!("It is also known by its short name: {}", short_name));
    }

    let visibility = match feature.visibility() {
        Visibility::Public => {
            "This is a public feature; it can be configured directly in server \
             configuration, or included by other features."
        }
        Visibility::Protected => {
            "This is a protected feature; it can be included by other features."
        }
        Visibility::Private if feature.is_auto_activated() => {
            "This is an auto-feature; it will be included automatically based on the \
             presence of other features in combination."
        }
        Visibility::Private => "This is a private feature; it can be included by other features.",
        Visibility::Unknown => "The visibility of this feature is unknown.",
    };
    lines.push(visibility.to_string());
    if feature.visibility() == Visibility::Public {
        let description = feature.description().unwrap_or("No description found");
        lines.push(description.to_string());
    }

    let has_features = feature.has_feature_dependencies();
    if has_features {
        lines.push("This feature includes the following features:".to_string());
        lines.extend(feature.feature_specs().map(|s| format!("{}{}", BULLET, s)));
    }
    if feature.has_bundle_dependencies() {
        lines.push(if has_features {
            "and the following bundles:".to_string()
        } else {
            "This feature includes the following bundles:".to_string()
        });
        lines.extend(feature.bundle_specs().map(|s| format!("{}{}", BULLET, s)));
    }
    lines.push(String::new());
}
