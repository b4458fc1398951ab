use super::{ElementError, ElementId, ElementResult};
use crate::manifest::{
    Manifest, BUNDLE_DESCRIPTION, BUNDLE_NAME, BUNDLE_SYMBOLIC_NAME, BUNDLE_VERSION,
};
use crate::version::Version;
use std::path::{Path, PathBuf};

/// A bundle record (`Bundle-SymbolicName`), usually a jar's main manifest
#[derive(Debug, Clone)]
pub struct Bundle {
    id: ElementId,
    version: Version,
    title: Option<String>,
    description: Option<String>,
    path: Option<PathBuf>,
}

impl Bundle {
    pub fn from_manifest(manifest: &Manifest, path: Option<&Path>) -> ElementResult<Self> {
        // directives such as `singleton:=true` are not part of the identity
        let identity = manifest
            .first_entry(BUNDLE_SYMBOLIC_NAME)?
            .ok_or(ElementError::MissingIdentity)?;

        let version = match manifest.get(BUNDLE_VERSION) {
            Some(text) => Version::parse(text)?,
            None => Version::EMPTY,
        };

        Ok(Self {
            id: ElementId::new(identity.id()),
            version,
            title: manifest.get(BUNDLE_NAME).map(str::to_string),
            description: manifest.get(BUNDLE_DESCRIPTION).map(str::to_string),
            path: path.map(Path::to_path_buf),
        })
    }

    pub fn id(&self) -> &ElementId {
        &self.id
    }

    pub fn symbolic_name(&self) -> &str {
        self.id.as_str()
    }

    /// `<symbolic-name>_<version>`
    pub fn name(&self) -> String {
        format!("{}_{}", self.id, self.version)
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Value of `Bundle-Name`
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn file_name(&self) -> Option<&str> {
        self.path.as_deref()?.file_name()?.to_str()
    }
}
