use serde::Serialize;

use crate::error::ExitStatus;

pub mod format;
pub mod generate;
pub mod pom;
pub mod resolve;
pub mod schema;

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandResult {
    ProjectGenerated {
        output_dir: String,
        manifest_digest: String,
        used_fallback_version: bool,
        fallbacks: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        archive: Option<String>,
    },
    Manifest {
        manifest: String,
        digest: String,
        used_fallback_version: bool,
        fallbacks: Vec<String>,
    },
    ManifestFormatted {
        path: String,
        changed: bool,
    },
    ManifestChecked {
        path: String,
        canonical: bool,
    },
    VersionResolved {
        coordinate: String,
        kind: String,
        version: String,
        fallback: bool,
    },
    Schema {
        schema: serde_json::Value,
    },
}

impl CommandResult {
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            CommandResult::ManifestChecked { canonical, .. } => {
                if *canonical {
                    ExitStatus::Ok
                } else {
                    ExitStatus::Data
                }
            }
            _ => ExitStatus::Ok,
        }
    }

    /// Coordinates whose version fell back to the placeholder during generation.
    pub fn fallbacks(&self) -> &[String] {
        match self {
            CommandResult::ProjectGenerated { fallbacks, .. }
            | CommandResult::Manifest { fallbacks, .. } => fallbacks,
            _ => &[],
        }
    }
}
