//! Declared dependencies and their resolution against a pool of elements

use crate::element::{Element, ElementError, ElementId, ElementResult};
use crate::manifest::ManifestEntry;
use crate::version::VersionRange;
use std::cmp::Ordering;
use std::fmt;

/// Content `type` of a feature reference
pub const TYPE_FEATURE: &str = "osgi.subsystem.feature";
/// Content `type` of a bundle reference; the default when no type is given
pub const TYPE_BUNDLE: &str = "bundle";

/// One dependency declared in `Subsystem-Content`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSpec {
    Feature(FeatureSpec),
    Bundle(BundleSpec),
}

impl ContentSpec {
    /// Map a content entry to a spec by its `type` qualifier.
    ///
    /// Files and jars are not elements and yield `None`.
    pub fn from_entry(entry: &ManifestEntry) -> ElementResult<Option<Self>> {
        match entry.qualifier_or("type", TYPE_BUNDLE) {
            TYPE_FEATURE => Ok(Some(ContentSpec::Feature(FeatureSpec::from_entry(entry)))),
            TYPE_BUNDLE => Ok(Some(ContentSpec::Bundle(BundleSpec::from_entry(entry)?))),
            "file" | "jar" | "boot.jar" => Ok(None),
            other => Err(ElementError::UnknownContentType {
                id: entry.id().to_string(),
                kind: other.to_string(),
            }),
        }
    }

    pub fn is_feature_spec(&self) -> bool {
        matches!(self, ContentSpec::Feature(_))
    }

    pub fn matches(&self, element: &Element) -> bool {
        match self {
            ContentSpec::Feature(spec) => spec.matches(element),
            ContentSpec::Bundle(spec) => spec.matches(element),
        }
    }

    /// Rank two matching elements; `Greater` means `a` is the better match.
    ///
    /// # Panics
    ///
    /// Panics if a feature spec is asked to rank an element outside its
    /// acceptable identities.
    pub fn compare_matches(&self, a: &Element, b: &Element) -> Ordering {
        match self {
            ContentSpec::Feature(spec) => spec.compare_matches(a, b),
            ContentSpec::Bundle(spec) => spec.compare_matches(a, b),
        }
    }

    /// The best matching element of `pool`, if any matches
    pub fn find_best_match<'a, I>(&self, pool: I) -> Option<&'a Element>
    where
        I: IntoIterator<Item = &'a Element>,
    {
        pool.into_iter()
            .filter(|e| self.matches(e))
            .max_by(|a, b| self.compare_matches(a, b))
    }
}

impl fmt::Display for ContentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentSpec::Feature(spec) => spec.fmt(f),
            ContentSpec::Bundle(spec) => spec.fmt(f),
        }
    }
}

/// A reference to a feature, with tolerated alternatives.
///
/// The first identity is preferred; later ones are fallbacks built by
/// replacing the version suffix after the last `-` with each value of
/// `ibm.tolerates`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSpec {
    acceptable: Vec<ElementId>,
}

impl FeatureSpec {
    pub fn from_entry(entry: &ManifestEntry) -> Self {
        let id = entry.id();
        let prefix = version_prefix(id);

        let mut acceptable = vec![ElementId::new(id)];
        if let Some(tolerates) = entry.qualifier("ibm.tolerates") {
            acceptable.extend(
                tolerates
                    .split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(|t| ElementId::new(format!("{}{}", prefix, t))),
            );
        }

        Self { acceptable }
    }

    /// Acceptable identities, most preferred first
    pub fn acceptable(&self) -> &[ElementId] {
        &self.acceptable
    }

    pub fn preferred(&self) -> &ElementId {
        &self.acceptable[0]
    }

    pub fn matches(&self, element: &Element) -> bool {
        element.is_feature() && self.acceptable.contains(element.id())
    }

    pub fn compare_matches(&self, a: &Element, b: &Element) -> Ordering {
        // earlier in the list is better
        self.position(b).cmp(&self.position(a))
    }

    fn position(&self, element: &Element) -> usize {
        match self.acceptable.iter().position(|id| id == element.id()) {
            Some(position) => position,
            None => panic!(
                "cannot rank feature {} which is not one of the acceptable features {:?}",
                element.id(),
                self.acceptable
            ),
        }
    }
}

impl fmt::Display for FeatureSpec {
    /// `prefix-(2.0|1.0)` when alternatives exist
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let preferred = self.preferred().as_str();
        if self.acceptable.len() == 1 {
            return f.write_str(preferred);
        }
        let prefix = version_prefix(preferred);
        let suffixes: Vec<&str> = self
            .acceptable
            .iter()
            .map(|id| id.as_str().strip_prefix(prefix).unwrap_or(id.as_str()))
            .collect();
        write!(f, "{}({})", prefix, suffixes.join("|"))
    }
}

/// A reference to a bundle within a version range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleSpec {
    symbolic_name: ElementId,
    range: VersionRange,
}

impl BundleSpec {
    pub fn new(symbolic_name: impl Into<ElementId>, range: VersionRange) -> Self {
        Self {
            symbolic_name: symbolic_name.into(),
            range,
        }
    }

    pub fn from_entry(entry: &ManifestEntry) -> ElementResult<Self> {
        let range = match entry.qualifier("version") {
            Some(text) => VersionRange::parse(text)?,
            None => VersionRange::default(),
        };
        Ok(Self::new(entry.id(), range))
    }

    pub fn symbolic_name(&self) -> &ElementId {
        &self.symbolic_name
    }

    pub fn range(&self) -> &VersionRange {
        &self.range
    }

    pub fn matches(&self, element: &Element) -> bool {
        element.is_bundle()
            && element.id() == &self.symbolic_name
            && self.range.includes(element.version())
    }

    /// Higher versions are better matches
    pub fn compare_matches(&self, a: &Element, b: &Element) -> Ordering {
        a.version().cmp(b.version()).then_with(|| a.cmp(b))
    }
}

impl fmt::Display for BundleSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.symbolic_name, self.range)
    }
}

/// Everything up to and including the last `-`, or the whole id without one
fn version_prefix(id: &str) -> &str {
    match id.rfind('-') {
        Some(index) => &id[..=index],
        None => id,
    }
}
