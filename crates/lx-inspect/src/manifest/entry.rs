//! Tokenizer for multi-valued manifest attributes
//!
//! An attribute value is a comma separated list of entries; each entry is an
//! identifier followed by `;key=value` attributes or `;key:=value` directives:
//!
//! ```text
//! com.example.a-1.0; type="osgi.subsystem.feature"; ibm.tolerates:="2.0,3.0",
//! com.example.bundle; version="[1,2)"
//! ```
//!
//! Double-quoted spans are atomic, so delimiters inside quotes are literal.
//! A backslash escapes the following character anywhere in the value.

use super::{ManifestError, ManifestResult};
use std::collections::BTreeMap;
use std::fmt;

/// One entry of a multi-valued manifest attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    id: String,
    qualifiers: BTreeMap<String, String>,
}

impl ManifestEntry {
    /// Parse a single entry (no top-level commas expected)
    pub fn parse(text: &str) -> ManifestResult<Self> {
        let segments = split_unquoted(text, ';')?;
        let mut segments = segments.into_iter().map(str::trim);

        let id = segments.next().map(unquote).unwrap_or_default();
        if id.is_empty() {
            return Err(ManifestError::MissingIdentifier(text.to_string()));
        }

        let mut qualifiers = BTreeMap::new();
        for segment in segments.filter(|s| !s.is_empty()) {
            let (key, value) = split_qualifier(segment, text)?;
            if let Some(previous) = qualifiers.insert(key.clone(), value) {
                tracing::warn!(
                    key = %key,
                    previous = %previous,
                    "duplicate qualifier key in manifest value '{}', last value wins",
                    text
                );
            }
        }

        Ok(Self { id, qualifiers })
    }

    /// The leading identifier, unquoted
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Look up a qualifier (attribute or directive) by its exact key
    pub fn qualifier(&self, key: &str) -> Option<&str> {
        self.qualifiers.get(key).map(String::as_str)
    }

    pub fn qualifier_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.qualifier(key).unwrap_or(default)
    }

    pub fn qualifiers(&self) -> &BTreeMap<String, String> {
        &self.qualifiers
    }
}

impl fmt::Display for ManifestEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)?;
        for (key, value) in &self.qualifiers {
            write!(f, ";{}=\"{}\"", key, value.replace('"', "\\\""))?;
        }
        Ok(())
    }
}

/// Split a raw attribute value into its ordered entries.
///
/// Empty entries (for example a trailing comma) are skipped.
pub fn parse_entries(value: &str) -> ManifestResult<Vec<ManifestEntry>> {
    split_unquoted(value, ',')?
        .into_iter()
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(ManifestEntry::parse)
        .collect()
}

/// Split `text` on `delimiter`, ignoring delimiters inside quotes or escaped
/// with a backslash.
fn split_unquoted(text: &str, delimiter: char) -> ManifestResult<Vec<&str>> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut chars = text.char_indices();

    while let Some((index, c)) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            c if c == delimiter && !in_quotes => {
                parts.push(&text[start..index]);
                start = index + c.len_utf8();
            }
            _ => {}
        }
    }

    if in_quotes {
        return Err(ManifestError::UnterminatedQuote(text.to_string()));
    }
    parts.push(&text[start..]);
    Ok(parts)
}

/// Split `key=value` or `key:=value`; a segment without `=` is malformed.
fn split_qualifier(segment: &str, text: &str) -> ManifestResult<(String, String)> {
    let malformed = || ManifestError::MalformedQualifier {
        segment: segment.to_string(),
        value: text.to_string(),
    };

    let (key, value) = segment.split_once('=').ok_or_else(malformed)?;
    let key = key.trim_end();
    let key = key.strip_suffix(':').unwrap_or(key).trim();
    if key.is_empty() {
        return Err(malformed());
    }

    Ok((key.to_string(), unquote(value.trim())))
}

/// Strip surrounding double quotes and resolve backslash escapes.
fn unquote(text: &str) -> String {
    let inner = text
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(text);

    let mut result = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => result.extend(chars.next()),
            '"' => {}
            c => result.push(c),
        }
    }
    result
}
