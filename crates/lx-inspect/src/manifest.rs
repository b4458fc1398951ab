//! Manifest records (`*.mf` files and `META-INF/MANIFEST.MF`)
//!
//! Only the main section of a manifest is read: `Name: value` header lines,
//! where a line starting with a single space continues the previous value.
//! Attribute names are matched case-insensitively.

mod entry;

pub use entry::{parse_entries, ManifestEntry};

use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Feature identity; qualifiers include `visibility`
pub const SUBSYSTEM_SYMBOLIC_NAME: &str = "Subsystem-SymbolicName";
/// Declared feature content (dependencies)
pub const SUBSYSTEM_CONTENT: &str = "Subsystem-Content";
pub const SUBSYSTEM_VERSION: &str = "Subsystem-Version";
pub const SUBSYSTEM_NAME: &str = "Subsystem-Name";
/// Short alias of a feature
pub const IBM_SHORT_NAME: &str = "IBM-ShortName";
/// Presence marks a feature as auto-activated
pub const IBM_PROVISION_CAPABILITY: &str = "IBM-Provision-Capability";
pub const BUNDLE_SYMBOLIC_NAME: &str = "Bundle-SymbolicName";
pub const BUNDLE_VERSION: &str = "Bundle-Version";
pub const BUNDLE_NAME: &str = "Bundle-Name";
pub const BUNDLE_DESCRIPTION: &str = "Bundle-Description";

/// Manifest parsing errors
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Malformed manifest header at line {line}: '{text}'")]
    MalformedHeader { line: usize, text: String },

    #[error("Malformed qualifier '{segment}' (expected key=value) in: {value}")]
    MalformedQualifier { segment: String, value: String },

    #[error("Manifest entry has no identifier: {0}")]
    MissingIdentifier(String),

    #[error("Unterminated quoted string in: {0}")]
    UnterminatedQuote(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type ManifestResult<T> = Result<T, ManifestError>;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Attribute {
    name: String,
    value: String,
}

/// The main attributes of one manifest record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    /// Keyed by lower-cased attribute name
    attributes: BTreeMap<String, Attribute>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the main section of manifest text
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> ManifestResult<Self> {
        let mut manifest = Self::new();
        let mut current: Option<(String, String)> = None;

        for (index, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                // a blank line ends the main section
                if current.is_some() {
                    break;
                }
                continue;
            }

            if let Some(rest) = line.strip_prefix(' ') {
                match current.as_mut() {
                    Some((_, value)) => value.push_str(rest),
                    None => return Err(malformed(index, line)),
                }
                continue;
            }

            let (name, value) = line.split_once(':').ok_or_else(|| malformed(index, line))?;
            let name = name.trim();
            if name.is_empty() || name.contains(char::is_whitespace) {
                return Err(malformed(index, line));
            }

            if let Some((name, value)) = current.take() {
                manifest.insert(name, value);
            }
            current = Some((name.to_string(), value.trim_start().to_string()));
        }

        if let Some((name, value)) = current {
            manifest.insert(name, value);
        }

        Ok(manifest)
    }

    /// Load a manifest from a file
    pub fn from_file(path: &Path) -> ManifestResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Set an attribute, returning the previous value for that name
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let name = name.into();
        let previous = self.attributes.insert(
            name.to_ascii_lowercase(),
            Attribute {
                name: name.clone(),
                value: value.into(),
            },
        );
        if previous.is_some() {
            tracing::warn!(attribute = %name, "duplicate manifest attribute, last value wins");
        }
        previous.map(|a| a.value)
    }

    /// Builder-style [`Manifest::insert`]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes
            .get(&name.to_ascii_lowercase())
            .map(|a| a.value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(&name.to_ascii_lowercase())
    }

    /// Tokenize a multi-valued attribute; an absent attribute has no entries
    pub fn entries(&self, name: &str) -> ManifestResult<Vec<ManifestEntry>> {
        match self.get(name) {
            Some(value) => parse_entries(value),
            None => Ok(Vec::new()),
        }
    }

    /// The first entry of an attribute, if the attribute is present
    pub fn first_entry(&self, name: &str) -> ManifestResult<Option<ManifestEntry>> {
        Ok(self.entries(name)?.into_iter().next())
    }

    /// Attribute names as written, in case-insensitive order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.attributes.values().map(|a| a.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

fn malformed(index: usize, line: &str) -> ManifestError {
    ManifestError::MalformedHeader {
        line: index + 1,
        text: line.to_string(),
    }
}
