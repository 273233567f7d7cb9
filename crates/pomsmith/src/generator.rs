use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::archive::pack_directory;
use crate::catalog::{CatalogDefaults, CatalogPlugin, CoordinateCatalog, PLACEHOLDER_COMMENT};
use crate::config::GeneratorConfig;
use crate::coordinate::{Coordinate, PackageKind, ResolvableCoordinate};
use crate::document::{ManifestDocument, ManifestNode, entry_for};
use crate::error::PomsmithError;
use crate::formatter::ManifestFormatter;
use crate::management::ManagementSet;
use crate::request::GenerationRequest;
use crate::scaffold::{
    MANIFEST_FILE, MavenWrapperCommand, ProjectScaffolder, WrapperInstaller, create_staging_dir,
    default_project_dir, discard_staging, publish, write_file,
};
use crate::template::{HandlebarsTemplateEngine, TemplateEngine};
use crate::version::{ResolvedVersions, VersionLookup, VersionResolver};

const MODEL_VERSION: &str = "4.0.0";
const POM_NAMESPACE: &str = "http://maven.apache.org/POM/4.0.0";
const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
const POM_SCHEMA_LOCATION: &str =
    "http://maven.apache.org/POM/4.0.0 https://maven.apache.org/xsd/maven-4.0.0.xsd";

/// A formatted descriptor together with the versions that went into it.
#[derive(Clone, Debug, Serialize)]
pub struct GeneratedManifest {
    pub text: String,
    pub used_fallback_version: bool,
    pub digest: String,
    #[serde(skip)]
    pub versions: ResolvedVersions,
}

impl GeneratedManifest {
    /// Coordinates whose version fell back to the sentinel.
    pub fn fallbacks(&self) -> Vec<String> {
        self.versions
            .fallbacks()
            .map(|target| target.coordinate.to_string())
            .collect()
    }
}

/// Where and how a project is materialized.
#[derive(Clone, Debug, Default)]
pub struct GenerateOptions {
    /// Directory that receives `<artifactId>/`. A fresh temporary directory is
    /// used when unset.
    pub parent_dir: Option<PathBuf>,
    /// Also pack the finished project into a ZIP archive.
    pub archive: bool,
}

/// Outcome of a successful run. A run that had to fall back on some version
/// still produces a complete project but is not a full success.
#[derive(Clone, Debug, Serialize)]
pub struct GenerationResult {
    pub manifest: String,
    pub used_fallback_version: bool,
    pub output_dir: PathBuf,
    pub manifest_digest: String,
    pub fallbacks: Vec<String>,
    #[serde(skip)]
    pub archive: Option<Vec<u8>>,
}

impl GenerationResult {
    pub fn success(&self) -> bool {
        !self.used_fallback_version
    }
}

/// Turns a [`GenerationRequest`] into a descriptor and a project directory.
pub struct ProjectGenerator<L: VersionLookup> {
    resolver: VersionResolver<L>,
    catalog: CatalogDefaults,
    formatter: ManifestFormatter,
    scaffolder: ProjectScaffolder<Arc<dyn TemplateEngine>>,
    wrapper: Arc<dyn WrapperInstaller>,
}

impl<L: VersionLookup> ProjectGenerator<L> {
    pub fn new(lookup: L, config: &GeneratorConfig) -> Result<Self, PomsmithError> {
        let resolver = VersionResolver::new(lookup, config.max_concurrent_lookups)?;
        let templates: Arc<dyn TemplateEngine> = Arc::new(HandlebarsTemplateEngine::new()?);
        Ok(Self {
            resolver,
            catalog: config.catalog.clone(),
            formatter: ManifestFormatter::new(),
            scaffolder: ProjectScaffolder::new(templates),
            wrapper: Arc::new(MavenWrapperCommand::default()),
        })
    }

    pub fn with_wrapper_installer(mut self, installer: Arc<dyn WrapperInstaller>) -> Self {
        self.wrapper = installer;
        self
    }

    /// Validates the request and synthesizes its formatted descriptor without
    /// touching the filesystem.
    pub fn build_manifest(
        &self,
        request: &GenerationRequest,
    ) -> Result<GeneratedManifest, PomsmithError> {
        self.prepare(request).map(|(_, manifest)| manifest)
    }

    /// Builds the descriptor, scaffolds the project in a staging directory and
    /// publishes it with one rename. The archive is packed from the staging
    /// directory, so every failure leaves `target` absent.
    pub fn generate(
        &self,
        request: &GenerationRequest,
        options: &GenerateOptions,
    ) -> Result<GenerationResult, PomsmithError> {
        let (request, manifest) = self.prepare(request)?;

        let target = match &options.parent_dir {
            Some(parent) => parent.join(&request.artifact_id),
            None => default_project_dir(&request.artifact_id)?,
        };
        if target.exists() {
            return Err(PomsmithError::Generation(format!(
                "target directory {} already exists",
                target.display()
            )));
        }

        let staging = create_staging_dir(&target)?;
        let archive = match self
            .populate(&staging, &request, &manifest)
            .and_then(|()| options.archive.then(|| pack_directory(&staging)).transpose())
            .and_then(|archive| publish(&staging, &target).map(|()| archive))
        {
            Ok(archive) => archive,
            Err(err) => {
                discard_staging(&staging);
                return Err(err);
            }
        };

        info!(
            dir = %target.display(),
            fallback = manifest.used_fallback_version,
            "project generated"
        );
        Ok(GenerationResult {
            fallbacks: manifest.fallbacks(),
            manifest: manifest.text,
            used_fallback_version: manifest.used_fallback_version,
            output_dir: target,
            manifest_digest: manifest.digest,
            archive,
        })
    }

    fn prepare(
        &self,
        request: &GenerationRequest,
    ) -> Result<(GenerationRequest, GeneratedManifest), PomsmithError> {
        let request = request.clone().prepare()?;
        info!(
            group_id = %request.group_id,
            artifact_id = %request.artifact_id,
            "starting project generation"
        );
        let manifest = self
            .synthesize(&request)
            .map_err(PomsmithError::into_generation)?;
        Ok((request, manifest))
    }

    fn synthesize(&self, request: &GenerationRequest) -> Result<GeneratedManifest, PomsmithError> {
        let catalog = CoordinateCatalog::for_request(&self.catalog, request);
        let management = catalog.management_set();
        let targets = catalog.resolution_targets();
        let versions = self.resolver.resolve_all(&targets);

        let document = build_document(request, &catalog, &management, &versions);
        let text = self.formatter.format_document(&document)?;
        Ok(GeneratedManifest {
            digest: manifest_digest(&text),
            used_fallback_version: versions.used_fallback(),
            text,
            versions,
        })
    }

    fn populate(
        &self,
        staging: &Path,
        request: &GenerationRequest,
        manifest: &GeneratedManifest,
    ) -> Result<(), PomsmithError> {
        self.scaffolder
            .scaffold(staging, request)
            .map_err(PomsmithError::into_generation)?;
        write_file(&staging.join(MANIFEST_FILE), manifest.text.as_bytes())?;
        if request.include_wrapper {
            self.wrapper
                .install(staging)
                .map_err(PomsmithError::into_generation)?;
        }
        Ok(())
    }
}

/// SHA-256 of the descriptor text, hex encoded.
pub fn manifest_digest(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Assembles the descriptor in canonical section order.
pub fn build_document(
    request: &GenerationRequest,
    catalog: &CoordinateCatalog,
    management: &ManagementSet,
    versions: &ResolvedVersions,
) -> ManifestDocument {
    let mut document = ManifestDocument::new();
    let project = document.create_root("project");
    project.set_attribute("xmlns", POM_NAMESPACE);
    project.set_attribute("xmlns:xsi", XSI_NAMESPACE);
    project.set_attribute("xsi:schemaLocation", POM_SCHEMA_LOCATION);

    project.set_child_text("modelVersion", MODEL_VERSION);
    project.set_child_text("groupId", &request.group_id);
    project.set_child_text("artifactId", &request.artifact_id);
    project.set_child_text("version", &request.version);
    project.set_child_text("packaging", "jar");
    if let Some(name) = &request.name {
        project.set_child_text("name", name);
    }
    if let Some(description) = &request.description {
        project.set_child_text("description", description);
    }

    let properties = project.find_or_create_section("properties");
    properties.set_child_text("maven.compiler.release", &request.java_version);
    properties.set_child_text("project.build.sourceEncoding", "UTF-8");

    if !catalog.boms().is_empty() {
        let managed = project
            .find_or_create_section("dependencyManagement")
            .find_or_create_section("dependencies");
        for bom in catalog.boms() {
            let target = ResolvableCoordinate::new(bom.coordinate.clone(), PackageKind::Bom);
            let version = versions.value_of(&target);
            managed.upsert_repeatable_entry("dependency", entry_for(&bom.coordinate), |entry| {
                write_coordinate(entry, &bom.coordinate);
                entry.set_child_text("version", version);
                entry.set_child_text("type", "pom");
                entry.set_child_text("scope", "import");
            });
        }
    }

    if !catalog.dependencies().is_empty() {
        let dependencies = project.find_or_create_section("dependencies");
        for dependency in catalog.dependencies() {
            let target =
                ResolvableCoordinate::new(dependency.coordinate.clone(), PackageKind::Normal);
            let version = versions
                .get(&target)
                .and_then(|resolved| management.version_to_include(&dependency.coordinate, resolved));
            dependencies.upsert_repeatable_entry(
                "dependency",
                entry_for(&dependency.coordinate),
                |entry| {
                    write_coordinate(entry, &dependency.coordinate);
                    if let Some(version) = version {
                        entry.set_child_text("version", version);
                    }
                    entry.set_child_text("scope", &dependency.scope);
                },
            );
        }
    }

    if !catalog.plugins().is_empty() {
        let plugins = project
            .find_or_create_section("build")
            .find_or_create_section("plugins");
        for plugin in catalog.plugins() {
            let target = ResolvableCoordinate::new(plugin.coordinate.clone(), PackageKind::Plugin);
            let version = versions.value_of(&target);
            plugins.upsert_repeatable_entry("plugin", entry_for(&plugin.coordinate), |entry| {
                write_coordinate(entry, &plugin.coordinate);
                entry.set_child_text("version", version);
            });
        }
        for plugin in catalog.plugins().iter().filter(|plugin| plugin.needs_configuration()) {
            configure_plugin(plugins, plugin);
        }
    }

    document
}

fn write_coordinate(entry: &mut ManifestNode, coordinate: &Coordinate) {
    entry.set_child_text("groupId", coordinate.group_id());
    entry.set_child_text("artifactId", coordinate.artifact_id());
}

/// Binds the plugin's goals in one execution and adds the placeholder
/// configuration. Running it twice leaves the plugin unchanged.
pub fn configure_plugin(plugins: &mut ManifestNode, plugin: &CatalogPlugin) {
    plugins.upsert_repeatable_entry("plugin", entry_for(&plugin.coordinate), |entry| {
        if entry.child_text("groupId").is_none() {
            write_coordinate(entry, &plugin.coordinate);
        }
        if !plugin.goals.is_empty() {
            entry.find_or_create_section("executions").upsert_repeatable_entry(
                "execution",
                |execution| goals_of(execution) == plugin.goals,
                |execution| {
                    let goals = execution.find_or_create_section("goals");
                    for goal in &plugin.goals {
                        goals.upsert_repeatable_entry(
                            "goal",
                            |node| node.text() == Some(goal.as_str()),
                            |node| node.set_text(goal.as_str()),
                        );
                    }
                },
            );
        }
        if plugin.placeholder_configuration && entry.find_child("configuration").is_none() {
            entry
                .insert_child("configuration", None)
                .add_comment(PLACEHOLDER_COMMENT);
        }
    });
}

fn goals_of(execution: &ManifestNode) -> Vec<&str> {
    execution
        .find_child("goals")
        .map(|goals| {
            goals
                .children_named("goal")
                .filter_map(ManifestNode::text)
                .collect()
        })
        .unwrap_or_default()
}
