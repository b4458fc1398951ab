//! Reading elements from disk
//!
//! Files are visited in sorted path order so duplicate resolution is
//! deterministic.

use super::{IngestError, IngestResult};
use crate::element::{Element, ElementError};
use crate::manifest::{Manifest, ManifestError, BUNDLE_SYMBOLIC_NAME};
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use zip::result::ZipError;
use zip::ZipArchive;

const JAR_MANIFEST: &str = "META-INF/MANIFEST.MF";
const L10N_DIR: &str = "l10n";
const DESCRIPTION_KEY: &str = "description";

pub(super) fn require_dir(path: &Path) -> IngestResult<&Path> {
    if path.is_dir() {
        Ok(path)
    } else {
        Err(IngestError::NotADirectory(path.to_path_buf()))
    }
}

/// Regular files in `dir` with the given extension, sorted
fn files_with_extension(dir: &Path, extension: &str) -> IngestResult<Vec<PathBuf>> {
    let io_error = |source| IngestError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(extension));
        if matches && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Every `*.mf` record in `dir`; features pick up their `l10n` description
pub(super) fn read_manifest_dir(dir: &Path) -> IngestResult<Vec<Element>> {
    let paths = files_with_extension(dir, "mf")?;
    debug!(dir = %dir.display(), count = paths.len(), "reading manifests");

    paths
        .iter()
        .map(|path| {
            let content = fs::read_to_string(path).map_err(|source| IngestError::Io {
                path: path.clone(),
                source,
            })?;
            let element = parse_record(&content, path)?;
            Ok(match element {
                Element::Feature(feature) => {
                    let description = localized_description(dir, feature.symbolic_name());
                    Element::Feature(feature.with_description(description))
                }
                bundle => bundle,
            })
        })
        .collect()
}

/// Every bundle jar in `dir`.
///
/// Jars without a manifest or without `Bundle-SymbolicName` are not bundles
/// and are skipped.
pub(super) fn read_jar_dir(dir: &Path) -> IngestResult<Vec<Element>> {
    let paths = files_with_extension(dir, "jar")?;
    debug!(dir = %dir.display(), count = paths.len(), "reading jars");

    let mut bundles = Vec::new();
    for path in paths {
        match read_jar_manifest(&path)? {
            Some(content) => {
                let manifest = Manifest::from_str(&content).map_err(|e| record_error(&path, e))?;
                if !manifest.contains(BUNDLE_SYMBOLIC_NAME) {
                    debug!(path = %path.display(), "jar is not a bundle, skipping");
                    continue;
                }
                let element = Element::from_manifest(&manifest, Some(path.as_path())).map_err(|source| {
                    IngestError::Record {
                        path: path.clone(),
                        source,
                    }
                })?;
                bundles.push(element);
            }
            None => debug!(path = %path.display(), "jar has no manifest, skipping"),
        }
    }
    Ok(bundles)
}

fn read_jar_manifest(path: &Path) -> IngestResult<Option<String>> {
    let archive_error = |source| IngestError::Archive {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut archive = ZipArchive::new(file).map_err(archive_error)?;
    let mut entry = match archive.by_name(JAR_MANIFEST) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(archive_error(e)),
    };

    let mut content = String::new();
    entry
        .read_to_string(&mut content)
        .map_err(|source| IngestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(Some(content))
}

fn parse_record(content: &str, path: &Path) -> IngestResult<Element> {
    let manifest = Manifest::from_str(content).map_err(|e| record_error(path, e))?;
    Element::from_manifest(&manifest, Some(path)).map_err(|source| IngestError::Record {
        path: path.to_path_buf(),
        source,
    })
}

fn record_error(path: &Path, error: ManifestError) -> IngestError {
    IngestError::Record {
        path: path.to_path_buf(),
        source: ElementError::Manifest(error),
    }
}

/// `description` from `<dir>/l10n/<symbolic-name>.properties`, if present
fn localized_description(dir: &Path, symbolic_name: &str) -> Option<String> {
    let path = dir
        .join(L10N_DIR)
        .join(format!("{}.properties", symbolic_name));
    if !path.is_file() {
        return None;
    }
    match fs::read_to_string(&path) {
        Ok(content) => property(&content, DESCRIPTION_KEY),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "unreadable localization file");
            None
        }
    }
}

/// Look up one key of a `.properties` file.
///
/// Handles `#`/`!` comments, `=` or `:` separators, backslash line
/// continuations and backslash escapes.
fn property(content: &str, key: &str) -> Option<String> {
    let mut logical = String::new();
    for line in content.lines() {
        let line = line.trim_start();
        if logical.is_empty() && (line.is_empty() || line.starts_with('#') || line.starts_with('!')) {
            continue;
        }

        let trailing = line.chars().rev().take_while(|c| *c == '\\').count();
        if trailing % 2 == 1 {
            logical.push_str(&line[..line.len() - 1]);
            continue;
        }
        logical.push_str(line);

        let entry = std::mem::take(&mut logical);
        let (name, value) = split_property(&entry);
        if name == key {
            return Some(value);
        }
    }
    None
}

fn split_property(entry: &str) -> (String, String) {
    let mut name = String::new();
    let mut chars = entry.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => name.extend(chars.next()),
            '=' | ':' => break,
            c if c.is_whitespace() => {
                // whitespace may be followed by an explicit separator
                while chars.peek().is_some_and(|c| c.is_whitespace()) {
                    chars.next();
                }
                if matches!(chars.peek(), Some('=') | Some(':')) {
                    chars.next();
                }
                break;
            }
            c => name.push(c),
        }
    }

    let rest: String = chars.collect();
    (name, unescape(rest.trim_start()))
}

fn unescape(text: &str) -> String {
    let mut value = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            value.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => value.push('\n'),
            Some('t') => value.push('\t'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                value.extend(u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32));
            }
            Some(other) => value.push(other),
            None => {}
        }
    }
    value
}
