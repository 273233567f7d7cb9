pub mod archive;
pub mod catalog;
pub mod central;
pub mod config;
pub mod coordinate;
pub mod document;
pub mod error;
pub mod formatter;
pub mod generator;
pub mod management;
pub mod request;
pub mod scaffold;
pub mod template;
pub mod version;

pub use archive::pack_directory;
pub use catalog::{
    CatalogBom, CatalogDefaults, CatalogDependency, CatalogPlugin, CoordinateCatalog,
    PLACEHOLDER_COMMENT, Requirement,
};
pub use central::{MavenCentralLookup, OfflineLookup, is_stable};
pub use config::{DEFAULT_REPOSITORY_URL, GeneratorConfig};
pub use coordinate::{Coordinate, PackageKind, ResolvableCoordinate};
pub use document::{ManifestDocument, ManifestNode, Markup, entry_for};
pub use error::{FieldViolation, PomsmithError};
pub use formatter::{FORMAT_RULES, FormatRule, ManifestFormatter};
pub use generator::{
    GenerateOptions, GeneratedManifest, GenerationResult, ProjectGenerator, build_document,
    configure_plugin, manifest_digest,
};
pub use management::{ManagementSet, bom_covers};
pub use request::{AssertionLibrary, GenerationRequest};
pub use scaffold::{MANIFEST_FILE, MavenWrapperCommand, ProjectScaffolder, WrapperInstaller};
pub use template::{
    HandlebarsTemplateEngine, ProjectContext, ProjectTemplate, TemplateEngine, java_class_name,
};
pub use version::{
    DEFAULT_MAX_LOOKUPS, FALLBACK_VERSION, LookupError, ResolvedVersion, ResolvedVersions,
    VersionLookup, VersionResolver,
};
