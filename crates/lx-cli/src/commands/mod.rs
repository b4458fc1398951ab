pub mod describe;
pub mod explain;
pub mod list;

use crate::config::Settings;
use anyhow::{Context, Result};
use clap::ValueEnum;
use lx_inspect::{Catalog, Element, QueryEngine, QueryResults};
use tracing::debug;

/// How an element is named in listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum NameDisplay {
    /// Short name for public features, `<symbolic-name>_<version>` for bundles
    #[default]
    Normal,
    /// Display name without vendor namespace prefixes
    Simple,
    /// Symbolic name
    Symbolic,
    /// File name of the defining manifest or jar
    File,
    /// Full path of the defining manifest or jar
    Full,
}

impl NameDisplay {
    pub fn name(self, element: &Element) -> String {
        let path = element.path();
        match self {
            NameDisplay::Normal => element.name(),
            NameDisplay::Simple => element.simple_name(),
            NameDisplay::Symbolic => element.symbolic_name().to_string(),
            NameDisplay::File => path
                .and_then(|p| p.file_name())
                .map(|f| f.to_string_lossy().into_owned())
                .unwrap_or_else(|| element.symbolic_name().to_string()),
            NameDisplay::Full => path
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| element.symbolic_name().to_string()),
        }
    }
}

/// Read the installation and bind `patterns` to it
pub fn explore(settings: &Settings, patterns: &[String]) -> Result<QueryResults> {
    let mut catalog =
        Catalog::from_install(&settings.directory, settings.bundles).with_context(|| {
            format!(
                "Failed to read installation at {}",
                settings.directory.display()
            )
        })?;
    bind(patterns, &mut catalog)
}

pub fn bind(patterns: &[String], catalog: &mut Catalog) -> Result<QueryResults> {
    debug!(patterns = ?patterns, "binding queries");
    QueryEngine::bind(patterns, catalog).context("Invalid query pattern")
}

#[cfg(test)]
pub(crate) mod fixtures {
    use lx_inspect::manifest::{
        BUNDLE_DESCRIPTION, BUNDLE_SYMBOLIC_NAME, BUNDLE_VERSION, IBM_PROVISION_CAPABILITY,
        IBM_SHORT_NAME, SUBSYSTEM_CONTENT, SUBSYSTEM_SYMBOLIC_NAME,
    };
    use lx_inspect::{Catalog, Element, Feature, Manifest};
    use std::path::Path;

    fn element(path: &str, manifest: Manifest) -> Element {
        Element::from_manifest(&manifest, Some(Path::new(path))).unwrap()
    }

    /// ```text
    /// servlet (public) -> http (protected) -> kernel
    ///                  -> com.example.servlet.impl (bundle)
    /// servlet.jsp (auto) -> servlet
    /// ```
    pub fn catalog() -> Catalog {
        let servlet = Manifest::new()
            .with(
                SUBSYSTEM_SYMBOLIC_NAME,
                "com.example.servlet-4.0; visibility:=public",
            )
            .with(IBM_SHORT_NAME, "servlet-4.0")
            .with(
                SUBSYSTEM_CONTENT,
                "com.example.http-1.0; type=\"osgi.subsystem.feature\", \
                 com.example.servlet.impl; version=\"[1.0,2.0)\"",
            );
        let servlet = Feature::from_manifest(&servlet, Some(Path::new("features/servlet.mf")))
            .unwrap()
            .with_description(Some("Java Servlets 4.0".to_string()));

        Catalog::from_elements([
            Element::Feature(servlet),
            element(
                "features/http.mf",
                Manifest::new()
                    .with(
                        SUBSYSTEM_SYMBOLIC_NAME,
                        "com.example.http-1.0; visibility:=protected",
                    )
                    .with(
                        SUBSYSTEM_CONTENT,
                        "com.example.kernel-1.0; type=\"osgi.subsystem.feature\"",
                    ),
            ),
            element(
                "platform/kernel.mf",
                Manifest::new().with(SUBSYSTEM_SYMBOLIC_NAME, "com.example.kernel-1.0"),
            ),
            element(
                "features/servlet-jsp.mf",
                Manifest::new()
                    .with(SUBSYSTEM_SYMBOLIC_NAME, "com.example.servlet.jsp-1.0")
                    .with(
                        IBM_PROVISION_CAPABILITY,
                        "osgi.identity; filter:=\"(osgi.identity=com.example.servlet-4.0)\"",
                    )
                    .with(
                        SUBSYSTEM_CONTENT,
                        "com.example.servlet-4.0; type=\"osgi.subsystem.feature\"",
                    ),
            ),
            element(
                "lib/com.example.servlet.impl_1.2.0.jar",
                Manifest::new()
                    .with(BUNDLE_SYMBOLIC_NAME, "com.example.servlet.impl")
                    .with(BUNDLE_VERSION, "1.2.0")
                    .with(BUNDLE_DESCRIPTION, "Servlet container"),
            ),
        ])
    }
}
