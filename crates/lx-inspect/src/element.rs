//! Catalog elements: features and bundles
//!
//! An [`Element`] is either a [`Feature`], which declares dependencies through
//! its content specs, or a [`Bundle`], which is a leaf artifact. Both are keyed
//! by their symbolic name ([`ElementId`]).

mod bundle;
mod feature;

pub use bundle::Bundle;
pub use feature::Feature;

use crate::content_spec::ContentSpec;
use crate::manifest::{Manifest, ManifestError, BUNDLE_SYMBOLIC_NAME, SUBSYSTEM_SYMBOLIC_NAME};
use crate::version::{Version, VersionError};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Element construction errors
#[derive(Debug, Error)]
pub enum ElementError {
    #[error("Record declares neither Subsystem-SymbolicName nor Bundle-SymbolicName")]
    MissingIdentity,

    #[error("Content entry '{id}' has unknown type '{kind}'")]
    UnknownContentType { id: String, kind: String },

    #[error(transparent)]
    InvalidVersion(#[from] VersionError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

pub type ElementResult<T> = Result<T, ElementError>;

/// Unique key of an element: its symbolic name
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId(String);

impl ElementId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ElementId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for ElementId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// How an element may be referenced from outside its product.
///
/// Declaration order is the sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Visibility {
    Public,
    Protected,
    Private,
    Unknown,
}

impl Visibility {
    /// Parse a `visibility` directive value; unrecognised values are `Unknown`
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "PUBLIC" => Visibility::Public,
            "PROTECTED" => Visibility::Protected,
            "PRIVATE" => Visibility::Private,
            _ => {
                tracing::warn!(value = %value, "unrecognised visibility, treating as unknown");
                Visibility::Unknown
            }
        }
    }

    /// Listing indicator
    pub fn glyph(&self) -> &'static str {
        match self {
            Visibility::Public => "+++",
            Visibility::Protected => "===",
            Visibility::Private => "---",
            Visibility::Unknown => "???",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Private => "private",
            Visibility::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A feature or a bundle
#[derive(Debug, Clone)]
pub enum Element {
    Feature(Feature),
    Bundle(Bundle),
}

impl Element {
    /// Build an element from one manifest record.
    ///
    /// A record with `Subsystem-SymbolicName` is a feature; one with only
    /// `Bundle-SymbolicName` is a bundle.
    pub fn from_manifest(manifest: &Manifest, path: Option<&Path>) -> ElementResult<Self> {
        if manifest.contains(SUBSYSTEM_SYMBOLIC_NAME) {
            Feature::from_manifest(manifest, path).map(Element::Feature)
        } else if manifest.contains(BUNDLE_SYMBOLIC_NAME) {
            Bundle::from_manifest(manifest, path).map(Element::Bundle)
        } else {
            Err(ElementError::MissingIdentity)
        }
    }

    pub fn id(&self) -> &ElementId {
        match self {
            Element::Feature(f) => f.id(),
            Element::Bundle(b) => b.id(),
        }
    }

    pub fn symbolic_name(&self) -> &str {
        self.id().as_str()
    }

    /// Human-facing name
    pub fn name(&self) -> String {
        match self {
            Element::Feature(f) => f.name().to_string(),
            Element::Bundle(b) => b.name(),
        }
    }

    /// [`Element::name`] without the well-known vendor namespace prefixes
    pub fn simple_name(&self) -> String {
        simplify(&self.name()).to_string()
    }

    pub fn short_name(&self) -> Option<&str> {
        match self {
            Element::Feature(f) => f.short_name(),
            Element::Bundle(_) => None,
        }
    }

    /// Every name this element can be looked up by, lower-cased
    pub fn all_names(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        names.insert(self.symbolic_name().to_lowercase());
        names.insert(self.name().to_lowercase());
        match self {
            Element::Feature(f) => {
                names.extend(f.short_name().map(str::to_lowercase));
            }
            Element::Bundle(b) => {
                names.extend(b.file_name().map(str::to_lowercase));
            }
        }
        names
    }

    pub fn visibility(&self) -> Visibility {
        match self {
            Element::Feature(f) => f.visibility(),
            Element::Bundle(_) => Visibility::Private,
        }
    }

    pub fn version(&self) -> &Version {
        match self {
            Element::Feature(f) => f.version(),
            Element::Bundle(b) => b.version(),
        }
    }

    pub fn is_auto_activated(&self) -> bool {
        matches!(self, Element::Feature(f) if f.is_auto_activated())
    }

    /// Declared dependencies in manifest order; bundles declare none
    pub fn specs(&self) -> &[ContentSpec] {
        match self {
            Element::Feature(f) => f.specs(),
            Element::Bundle(_) => &[],
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Element::Feature(f) => f.description(),
            Element::Bundle(b) => b.description(),
        }
    }

    /// File the element was read from, when it came from disk
    pub fn path(&self) -> Option<&Path> {
        match self {
            Element::Feature(f) => f.path(),
            Element::Bundle(b) => b.path(),
        }
    }

    pub fn is_feature(&self) -> bool {
        matches!(self, Element::Feature(_))
    }

    pub fn is_bundle(&self) -> bool {
        matches!(self, Element::Bundle(_))
    }

    pub fn as_feature(&self) -> Option<&Feature> {
        match self {
            Element::Feature(f) => Some(f),
            Element::Bundle(_) => None,
        }
    }

    pub fn as_bundle(&self) -> Option<&Bundle> {
        match self {
            Element::Bundle(b) => Some(b),
            Element::Feature(_) => None,
        }
    }

    /// Listing indicator: bundles, then auto-activated features, then visibility
    pub fn glyph(&self) -> &'static str {
        match self {
            Element::Bundle(_) => "-b-",
            Element::Feature(f) if f.is_auto_activated() => "-a-",
            Element::Feature(f) => f.visibility().glyph(),
        }
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Element {}

/// Natural order. Equality is by identity, so the order is only total over
/// elements with distinct identities, as in one catalog. Two records sharing
/// an identity compare equal whatever their other keys.
impl Ord for Element {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.id() == other.id() {
            return Ordering::Equal;
        }
        let natural = match (self, other) {
            (Element::Feature(a), Element::Feature(b)) => a
                .is_auto_activated()
                .cmp(&b.is_auto_activated())
                .then(a.visibility().cmp(&b.visibility()))
                .then_with(|| a.name().cmp(b.name())),
            (Element::Feature(_), Element::Bundle(_)) => Ordering::Less,
            (Element::Bundle(_), Element::Feature(_)) => Ordering::Greater,
            (Element::Bundle(a), Element::Bundle(b)) => a
                .id()
                .cmp(b.id())
                .then_with(|| a.version().cmp(b.version())),
        };
        natural.then_with(|| self.id().cmp(other.id()))
    }
}

impl PartialOrd for Element {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Strip vendor namespaces, e.g. `com.ibm.websphere.appserver.servlet-4.0`
/// becomes `servlet-4.0`.
fn simplify(name: &str) -> &str {
    let mut name = name;
    if let Some(rest) = name
        .strip_prefix("com.ibm.ws.")
        .or_else(|| name.strip_prefix("io.openliberty."))
    {
        name = ["com.", "org.", "net."]
            .iter()
            .find_map(|ns| rest.strip_prefix(ns))
            .unwrap_or(rest);
    }
    for prefix in [
        "com.ibm.websphere.appserver.",
        "com.ibm.websphere.appclient.",
        "com.ibm.websphere.",
        "io.openliberty.",
    ] {
        name = name.strip_prefix(prefix).unwrap_or(name);
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{
        BUNDLE_VERSION, IBM_PROVISION_CAPABILITY, IBM_SHORT_NAME, SUBSYSTEM_VERSION,
    };
    use rstest::rstest;

    fn feature(id: &str) -> Manifest {
        Manifest::new().with(SUBSYSTEM_SYMBOLIC_NAME, id)
    }

    fn element(manifest: Manifest) -> Element {
        Element::from_manifest(&manifest, None).unwrap()
    }

    #[test]
    fn test_record_classification() {
        assert!(element(feature("f")).is_feature());
        assert!(element(Manifest::new().with(BUNDLE_SYMBOLIC_NAME, "b")).is_bundle());
        assert!(matches!(
            Element::from_manifest(&Manifest::new().with(SUBSYSTEM_VERSION, "1"), None),
            Err(ElementError::MissingIdentity)
        ));
    }

    #[rstest]
    #[case("public", Visibility::Public)]
    #[case("PROTECTED", Visibility::Protected)]
    #[case(" private ", Visibility::Private)]
    #[case("internal", Visibility::Unknown)]
    fn test_visibility_from_str(#[case] value: &str, #[case] expected: Visibility) {
        assert_eq!(Visibility::from_str(value), expected);
    }

    #[rstest]
    #[case("com.ibm.websphere.appserver.servlet-4.0", "servlet-4.0")]
    #[case("com.ibm.websphere.appclient.client-1.0", "client-1.0")]
    #[case("com.ibm.websphere.javaee-8.0", "javaee-8.0")]
    #[case("com.ibm.ws.org.apache.cxf", "apache.cxf")]
    #[case("io.openliberty.jakarta.servlet-5.0", "jakarta.servlet-5.0")]
    #[case("org.example.thing", "org.example.thing")]
    fn test_simple_name(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(simplify(name), expected);
    }

    #[test]
    fn test_auto_activated_sorts_after_plain() {
        let plain = element(feature("z.plain"));
        let auto = element(
            feature("a.auto").with(IBM_PROVISION_CAPABILITY, "osgi.identity=x"),
        );

        assert!(plain < auto);
        assert!(auto > plain);
    }

    #[test]
    fn test_visibility_then_name_ordering() {
        let public = element(feature("b; visibility:=public"));
        let private_a = element(feature("a"));
        let private_c = element(feature("c"));

        let mut elements = vec![private_c.clone(), public.clone(), private_a.clone()];
        elements.sort();
        assert_eq!(elements, vec![public, private_a, private_c]);
    }

    #[test]
    fn test_features_sort_before_bundles() {
        let bundle = element(Manifest::new().with(BUNDLE_SYMBOLIC_NAME, "a.bundle"));
        let feature = element(
            feature("z; visibility:=private").with(IBM_PROVISION_CAPABILITY, "x"),
        );
        assert!(feature < bundle);
    }

    #[test]
    fn test_bundles_order_by_name_then_version() {
        let old = element(
            Manifest::new()
                .with(BUNDLE_SYMBOLIC_NAME, "b.x")
                .with(BUNDLE_VERSION, "1.0"),
        );
        let other = element(Manifest::new().with(BUNDLE_SYMBOLIC_NAME, "b.y"));
        assert!(old < other);
    }

    #[test]
    fn test_equality_is_by_identity() {
        let a = element(feature("same; visibility:=public"));
        let b = element(feature("same"));
        assert_eq!(a, b);
        assert_eq!(a.cmp(&b), Ordering::Equal);
    }

    #[test]
    fn test_order_is_transitive_over_distinct_identities() {
        let public = element(feature("p; visibility:=public"));
        let protected = element(feature("q; visibility:=protected"));
        let private = element(feature("r"));
        let auto = element(feature("s").with(IBM_PROVISION_CAPABILITY, "x"));
        let bundle = element(Manifest::new().with(BUNDLE_SYMBOLIC_NAME, "a.bundle"));
        let ordered = [public, protected, private, auto, bundle];

        for (i, lower) in ordered.iter().enumerate() {
            for higher in &ordered[i + 1..] {
                assert_eq!(lower.cmp(higher), Ordering::Less);
                assert_eq!(higher.cmp(lower), Ordering::Greater);
            }
        }
    }

    #[test]
    fn test_all_names_are_lower_cased() {
        let e = element(
            feature("Com.Example.Servlet-4.0; visibility:=public").with(IBM_SHORT_NAME, "Servlet-4.0"),
        );
        let names: Vec<String> = e.all_names().into_iter().collect();
        assert_eq!(names, vec!["com.example.servlet-4.0", "servlet-4.0"]);
    }

    #[test]
    fn test_glyphs() {
        assert_eq!(element(feature("f; visibility:=public")).glyph(), "+++");
        assert_eq!(element(feature("f")).glyph(), "---");
        assert_eq!(
            element(feature("f").with(IBM_PROVISION_CAPABILITY, "x")).glyph(),
            "-a-"
        );
        assert_eq!(
            element(Manifest::new().with(BUNDLE_SYMBOLIC_NAME, "b")).glyph(),
            "-b-"
        );
    }
}
