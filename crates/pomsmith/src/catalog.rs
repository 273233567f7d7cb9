use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::coordinate::{Coordinate, PackageKind, ResolvableCoordinate};
use crate::management::ManagementSet;
use crate::request::{AssertionLibrary, GenerationRequest};

const MAVEN_PLUGINS_GROUP: &str = "org.apache.maven.plugins";

/// Comment placed in plugin configurations the user still has to fill in.
pub const PLACEHOLDER_COMMENT: &str = "TODO: Please add a configuration";

/// Request option an optional catalog entry depends on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Requirement {
    Assertj,
    Hamcrest,
    Spotless,
    Checkstyle,
}

impl Requirement {
    pub fn is_met_by(self, request: &GenerationRequest) -> bool {
        match self {
            Requirement::Assertj => request.assertion_library == AssertionLibrary::Assertj,
            Requirement::Hamcrest => request.assertion_library == AssertionLibrary::Hamcrest,
            Requirement::Spotless => request.include_spotless,
            Requirement::Checkstyle => request.include_checkstyle,
        }
    }
}

fn applies(requires: Option<Requirement>, request: &GenerationRequest) -> bool {
    requires.is_none_or(|requirement| requirement.is_met_by(request))
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CatalogBom {
    #[serde(flatten)]
    pub coordinate: Coordinate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires: Option<Requirement>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CatalogDependency {
    #[serde(flatten)]
    pub coordinate: Coordinate,
    #[serde(default = "default_scope")]
    pub scope: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires: Option<Requirement>,
}

fn default_scope() -> String {
    "test".to_string()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CatalogPlugin {
    #[serde(flatten)]
    pub coordinate: Coordinate,
    /// Goals bound in a single execution. Empty means no execution block.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub goals: Vec<String>,
    /// Adds an empty configuration carrying [`PLACEHOLDER_COMMENT`].
    #[serde(default)]
    pub placeholder_configuration: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires: Option<Requirement>,
}

impl CatalogPlugin {
    fn plain(artifact_id: &str) -> Self {
        Self {
            coordinate: Coordinate::new(MAVEN_PLUGINS_GROUP, artifact_id),
            goals: Vec::new(),
            placeholder_configuration: false,
            requires: None,
        }
    }

    /// True when a configuration pass has anything to add for this plugin.
    pub fn needs_configuration(&self) -> bool {
        !self.goals.is_empty() || self.placeholder_configuration
    }
}

/// The curated coordinate lists. Shared read-only between runs; can be
/// replaced wholesale from configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CatalogDefaults {
    pub boms: Vec<CatalogBom>,
    pub dependencies: Vec<CatalogDependency>,
    pub plugins: Vec<CatalogPlugin>,
}

impl Default for CatalogDefaults {
    fn default() -> Self {
        let boms = vec![
            CatalogBom {
                coordinate: Coordinate::new("org.junit", "junit-bom"),
                requires: None,
            },
            CatalogBom {
                coordinate: Coordinate::new("org.assertj", "assertj-bom"),
                requires: Some(Requirement::Assertj),
            },
        ];

        let dependencies = vec![
            CatalogDependency {
                coordinate: Coordinate::new("org.junit.jupiter", "junit-jupiter"),
                scope: default_scope(),
                requires: None,
            },
            CatalogDependency {
                coordinate: Coordinate::new("org.assertj", "assertj-core"),
                scope: default_scope(),
                requires: Some(Requirement::Assertj),
            },
            CatalogDependency {
                coordinate: Coordinate::new("org.hamcrest", "hamcrest"),
                scope: default_scope(),
                requires: Some(Requirement::Hamcrest),
            },
        ];

        let mut plugins: Vec<CatalogPlugin> = [
            "maven-clean-plugin",
            "maven-compiler-plugin",
            "maven-resources-plugin",
            "maven-surefire-plugin",
            "maven-jar-plugin",
            "maven-install-plugin",
            "maven-deploy-plugin",
        ]
        .into_iter()
        .map(CatalogPlugin::plain)
        .collect();
        plugins.push(CatalogPlugin {
            coordinate: Coordinate::new("org.jacoco", "jacoco-maven-plugin"),
            goals: vec!["prepare-agent".into(), "report".into()],
            placeholder_configuration: false,
            requires: None,
        });
        plugins.push(CatalogPlugin {
            coordinate: Coordinate::new("com.diffplug.spotless", "spotless-maven-plugin"),
            goals: vec!["check".into()],
            placeholder_configuration: true,
            requires: Some(Requirement::Spotless),
        });
        plugins.push(CatalogPlugin {
            coordinate: Coordinate::new(MAVEN_PLUGINS_GROUP, "maven-checkstyle-plugin"),
            goals: vec!["check".into()],
            placeholder_configuration: true,
            requires: Some(Requirement::Checkstyle),
        });

        Self {
            boms,
            dependencies,
            plugins,
        }
    }
}

/// Catalog entries selected for one request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CoordinateCatalog {
    boms: Vec<CatalogBom>,
    dependencies: Vec<CatalogDependency>,
    plugins: Vec<CatalogPlugin>,
}

impl CoordinateCatalog {
    /// Default entries plus the optional entries the request asks for, in
    /// catalog order. Duplicates are kept as listed.
    pub fn for_request(defaults: &CatalogDefaults, request: &GenerationRequest) -> Self {
        Self {
            boms: defaults
                .boms
                .iter()
                .filter(|bom| applies(bom.requires, request))
                .cloned()
                .collect(),
            dependencies: defaults
                .dependencies
                .iter()
                .filter(|dep| applies(dep.requires, request))
                .cloned()
                .collect(),
            plugins: defaults
                .plugins
                .iter()
                .filter(|plugin| applies(plugin.requires, request))
                .cloned()
                .collect(),
        }
    }

    pub fn boms(&self) -> &[CatalogBom] {
        &self.boms
    }

    pub fn dependencies(&self) -> &[CatalogDependency] {
        &self.dependencies
    }

    pub fn plugins(&self) -> &[CatalogPlugin] {
        &self.plugins
    }

    pub fn management_set(&self) -> ManagementSet {
        ManagementSet::new(self.boms.iter().map(|bom| bom.coordinate.clone()))
    }

    /// Coordinates whose version has to be looked up: every BOM, every plugin
    /// and each regular dependency no BOM manages. Each appears once.
    pub fn resolution_targets(&self) -> Vec<ResolvableCoordinate> {
        let management = self.management_set();
        let boms = self
            .boms
            .iter()
            .map(|bom| ResolvableCoordinate::new(bom.coordinate.clone(), PackageKind::Bom));
        let dependencies = self
            .dependencies
            .iter()
            .filter(|dep| management.should_include_version(&dep.coordinate, PackageKind::Normal))
            .map(|dep| ResolvableCoordinate::new(dep.coordinate.clone(), PackageKind::Normal));
        let plugins = self
            .plugins
            .iter()
            .map(|plugin| ResolvableCoordinate::new(plugin.coordinate.clone(), PackageKind::Plugin));

        let mut targets: Vec<ResolvableCoordinate> = Vec::new();
        for target in boms.chain(dependencies).chain(plugins) {
            if !targets.contains(&target) {
                targets.push(target);
            }
        }
        targets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(assertion: AssertionLibrary, spotless: bool, checkstyle: bool) -> GenerationRequest {
        let mut request = GenerationRequest::new("com.example", "demo");
        request.assertion_library = assertion;
        request.include_spotless = spotless;
        request.include_checkstyle = checkstyle;
        request
    }

    fn artifacts<'a>(coords: impl Iterator<Item = &'a Coordinate>) -> Vec<&'a str> {
        coords.map(Coordinate::artifact_id).collect()
    }

    #[test]
    fn minimal_request_selects_defaults_only() {
        let catalog = CoordinateCatalog::for_request(
            &CatalogDefaults::default(),
            &request(AssertionLibrary::None, false, false),
        );
        assert_eq!(artifacts(catalog.boms().iter().map(|b| &b.coordinate)), ["junit-bom"]);
        assert_eq!(
            artifacts(catalog.dependencies().iter().map(|d| &d.coordinate)),
            ["junit-jupiter"]
        );
        assert_eq!(catalog.plugins().len(), 8);
        assert_eq!(catalog.plugins()[7].coordinate.artifact_id(), "jacoco-maven-plugin");
    }

    #[test]
    fn optional_entries_follow_the_request() {
        let catalog = CoordinateCatalog::for_request(
            &CatalogDefaults::default(),
            &request(AssertionLibrary::Assertj, true, true),
        );
        assert_eq!(
            artifacts(catalog.boms().iter().map(|b| &b.coordinate)),
            ["junit-bom", "assertj-bom"]
        );
        assert_eq!(
            artifacts(catalog.dependencies().iter().map(|d| &d.coordinate)),
            ["junit-jupiter", "assertj-core"]
        );
        let tail = artifacts(catalog.plugins()[8..].iter().map(|p| &p.coordinate));
        assert_eq!(tail, ["spotless-maven-plugin", "maven-checkstyle-plugin"]);
    }

    #[test]
    fn resolution_targets_skip_bom_managed_dependencies() {
        let catalog = CoordinateCatalog::for_request(
            &CatalogDefaults::default(),
            &request(AssertionLibrary::Hamcrest, false, false),
        );
        let targets = catalog.resolution_targets();

        assert!(targets.contains(&ResolvableCoordinate::bom("org.junit", "junit-bom")));
        assert!(targets.contains(&ResolvableCoordinate::normal("org.hamcrest", "hamcrest")));
        assert!(!targets.contains(&ResolvableCoordinate::normal("org.junit.jupiter", "junit-jupiter")));
        assert!(targets.contains(&ResolvableCoordinate::plugin("org.jacoco", "jacoco-maven-plugin")));
        assert_eq!(targets.len(), 1 + 1 + 8);
    }

    #[test]
    fn catalog_loads_from_yaml_with_defaults_for_missing_lists() {
        let yaml = r#"
plugins:
  - group_id: org.apache.maven.plugins
    artifact_id: maven-enforcer-plugin
    goals: [enforce]
"#;
        let defaults: CatalogDefaults = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(defaults.plugins.len(), 1);
        assert_eq!(defaults.plugins[0].goals, ["enforce"]);
        assert!(!defaults.plugins[0].placeholder_configuration);
        assert_eq!(defaults.boms, CatalogDefaults::default().boms);
    }
}
