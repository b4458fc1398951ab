use super::{ElementError, ElementId, ElementResult, Visibility};
use crate::content_spec::ContentSpec;
use crate::manifest::{
    Manifest, IBM_PROVISION_CAPABILITY, IBM_SHORT_NAME, SUBSYSTEM_CONTENT,
    SUBSYSTEM_NAME, SUBSYSTEM_SYMBOLIC_NAME, SUBSYSTEM_VERSION,
};
use crate::version::Version;
use std::path::{Path, PathBuf};

/// Marker preceding each feature identity inside a provision-capability filter
const IDENTITY_FILTER: &str = "osgi.identity=";

/// A feature record (`Subsystem-SymbolicName`)
#[derive(Debug, Clone)]
pub struct Feature {
    id: ElementId,
    short_name: Option<String>,
    title: Option<String>,
    visibility: Visibility,
    version: Version,
    provision_capability: Option<String>,
    specs: Vec<ContentSpec>,
    path: Option<PathBuf>,
    description: Option<String>,
}

impl Feature {
    pub fn from_manifest(manifest: &Manifest, path: Option<&Path>) -> ElementResult<Self> {
        let identity = manifest
            .first_entry(SUBSYSTEM_SYMBOLIC_NAME)?
            .ok_or(ElementError::MissingIdentity)?;
        let visibility = identity
            .qualifier("visibility")
            .map(Visibility::from_str)
            .unwrap_or(Visibility::Private);

        let version = match manifest.get(SUBSYSTEM_VERSION) {
            Some(text) => Version::parse(text)?,
            None => Version::EMPTY,
        };

        let mut specs = Vec::new();
        for entry in manifest.entries(SUBSYSTEM_CONTENT)? {
            specs.extend(ContentSpec::from_entry(&entry)?);
        }

        Ok(Self {
            id: ElementId::new(identity.id()),
            short_name: non_empty(manifest.get(IBM_SHORT_NAME)),
            title: non_empty(manifest.get(SUBSYSTEM_NAME)),
            visibility,
            version,
            provision_capability: manifest.get(IBM_PROVISION_CAPABILITY).map(str::to_string),
            specs,
            path: path.map(Path::to_path_buf),
            description: None,
        })
    }

    /// Attach a localized description
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn id(&self) -> &ElementId {
        &self.id
    }

    pub fn symbolic_name(&self) -> &str {
        self.id.as_str()
    }

    pub fn short_name(&self) -> Option<&str> {
        self.short_name.as_deref()
    }

    /// The short name for public features that have one, else the symbolic name
    pub fn name(&self) -> &str {
        match (&self.visibility, &self.short_name) {
            (Visibility::Public, Some(short)) => short,
            _ => self.id.as_str(),
        }
    }

    /// Value of `Subsystem-Name`
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    pub fn is_auto_activated(&self) -> bool {
        self.provision_capability.is_some()
    }

    /// Feature identities named by the auto-activation filter
    pub fn auto_activation_features(&self) -> Vec<&str> {
        let Some(filter) = self.provision_capability.as_deref() else {
            return Vec::new();
        };
        filter
            .match_indices(IDENTITY_FILTER)
            .map(|(index, _)| {
                let rest = &filter[index + IDENTITY_FILTER.len()..];
                let end = rest.find(')').unwrap_or(rest.len());
                rest[..end].trim()
            })
            .filter(|id| !id.is_empty())
            .collect()
    }

    pub fn specs(&self) -> &[ContentSpec] {
        &self.specs
    }

    pub fn feature_specs(&self) -> impl Iterator<Item = &ContentSpec> {
        self.specs.iter().filter(|s| s.is_feature_spec())
    }

    pub fn bundle_specs(&self) -> impl Iterator<Item = &ContentSpec> {
        self.specs.iter().filter(|s| !s.is_feature_spec())
    }

    pub fn has_feature_dependencies(&self) -> bool {
        self.feature_specs().next().is_some()
    }

    pub fn has_bundle_dependencies(&self) -> bool {
        self.bundle_specs().next().is_some()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn feature(manifest: Manifest) -> Feature {
        Feature::from_manifest(&manifest, None).unwrap()
    }

    fn base(identity: &str) -> Manifest {
        Manifest::new().with(SUBSYSTEM_SYMBOLIC_NAME, identity)
    }

    #[test]
    fn test_visibility_defaults_to_private() {
        assert_eq!(feature(base("a")).visibility(), Visibility::Private);
        assert_eq!(
            feature(base("a; visibility:=bogus")).visibility(),
            Visibility::Unknown
        );
    }

    #[test]
    fn test_public_feature_is_named_by_short_name() {
        let public = feature(base("com.example.servlet-4.0; visibility:=public").with(IBM_SHORT_NAME, "servlet-4.0"));
        assert_eq!(public.name(), "servlet-4.0");
        assert_eq!(public.symbolic_name(), "com.example.servlet-4.0");

        let private = feature(base("com.example.internal-1.0").with(IBM_SHORT_NAME, "internal-1.0"));
        assert_eq!(private.name(), "com.example.internal-1.0");
        assert_eq!(private.short_name(), Some("internal-1.0"));
    }

    #[test]
    fn test_version_defaults_to_empty() {
        assert_eq!(feature(base("a")).version(), &Version::EMPTY);
        assert_eq!(
            feature(base("a").with(SUBSYSTEM_VERSION, "1.0.0")).version(),
            &Version::new(1, 0, 0)
        );
    }

    #[test]
    fn test_invalid_version_is_fatal() {
        let result = Feature::from_manifest(&base("a").with(SUBSYSTEM_VERSION, "one"), None);
        assert!(matches!(result, Err(ElementError::InvalidVersion(_))));
    }

    #[test]
    fn test_content_specs_skip_files_and_jars() {
        let f = feature(base("a").with(
            SUBSYSTEM_CONTENT,
            "b-1.0; type=\"osgi.subsystem.feature\", c.bundle; version=\"[1,2)\", \
             lib/x.jar; type=jar, bin/tool; type=file, ws-launch.jar; type=\"boot.jar\"",
        ));

        assert_eq!(f.specs().len(), 2);
        assert!(f.has_feature_dependencies());
        assert!(f.has_bundle_dependencies());
        assert_eq!(f.feature_specs().count(), 1);
    }

    #[test]
    fn test_unknown_content_type_is_fatal() {
        let result = Feature::from_manifest(
            &base("a").with(SUBSYSTEM_CONTENT, "x; type=\"osgi.subsystem.application\""),
            None,
        );
        assert!(matches!(
            result,
            Err(ElementError::UnknownContentType { ref kind, .. }) if kind == "osgi.subsystem.application"
        ));
    }

    #[test]
    fn test_auto_activation_features_from_filter() {
        let f = feature(base("auto").with(
            IBM_PROVISION_CAPABILITY,
            "osgi.identity; filter:=\"(&(type=osgi.subsystem.feature)\
             (|(osgi.identity=com.example.a-1.0)(osgi.identity=com.example.b-2.0)))\"",
        ));

        assert!(f.is_auto_activated());
        assert_eq!(
            f.auto_activation_features(),
            vec!["com.example.a-1.0", "com.example.b-2.0"]
        );
        assert!(feature(base("plain")).auto_activation_features().is_empty());
    }

    #[test]
    fn test_title_and_description() {
        let f = feature(base("a").with(SUBSYSTEM_NAME, "A Feature"))
            .with_description(Some("Does things".to_string()));
        assert_eq!(f.title(), Some("A Feature"));
        assert_eq!(f.description(), Some("Does things"));
    }
}
