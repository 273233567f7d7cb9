use std::process::ExitCode;

use serde_json::json;

use crate::commands::CommandResult;
use crate::error::{CliError, ExitStatus};

pub enum OutputFormat {
    Text,
    Json,
}

/// Renders a `CommandResult` as human-readable text or a single JSON line and
/// converts it into the process exit code. Fallback versions are reported on
/// stderr in both formats without failing the run.
pub fn emit_result(result: CommandResult, format: OutputFormat) -> Result<ExitCode, CliError> {
    warn_fallbacks(result.fallbacks());
    match format {
        OutputFormat::Text => print_text(&result)?,
        OutputFormat::Json => print_json(&result),
    };
    Ok(ExitCode::from(result.exit_status().code()))
}

fn warn_fallbacks(fallbacks: &[String]) {
    if fallbacks.is_empty() {
        return;
    }
    eprintln!(
        "warning: no version could be resolved for {} coordinate(s); the placeholder was written instead:",
        fallbacks.len()
    );
    for coordinate in fallbacks {
        eprintln!("  - {coordinate}");
    }
}

fn print_text(result: &CommandResult) -> Result<(), CliError> {
    match result {
        CommandResult::ProjectGenerated {
            output_dir,
            manifest_digest,
            archive,
            ..
        } => {
            println!("Generated project at {output_dir}");
            println!("  pom.xml sha256: {manifest_digest}");
            if let Some(archive) = archive {
                println!("  Archive: {archive}");
            }
        }
        CommandResult::Manifest { manifest, .. } => {
            print!("{manifest}");
        }
        CommandResult::ManifestFormatted { path, changed } => {
            if *changed {
                println!("Formatted {path}");
            } else {
                println!("{path} is already formatted");
            }
        }
        CommandResult::ManifestChecked { path, canonical } => {
            if *canonical {
                println!("{path} is formatted");
            } else {
                println!("{path} is not formatted; run `pomsmith format {path}`");
            }
        }
        CommandResult::VersionResolved {
            coordinate,
            kind,
            version,
            fallback,
        } => {
            if *fallback {
                println!("{coordinate} ({kind}): not found, placeholder {version}");
            } else {
                println!("{coordinate} ({kind}): {version}");
            }
        }
        CommandResult::Schema { schema } => {
            let pretty = serde_json::to_string_pretty(schema).map_err(|err| {
                CliError::new(
                    format!("failed to render schema: {err}"),
                    ExitStatus::Software,
                )
            })?;
            println!("{pretty}");
        }
    }
    Ok(())
}

fn print_json(result: &CommandResult) {
    let payload = json!(result);
    println!("{payload}");
}
