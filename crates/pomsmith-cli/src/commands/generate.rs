use std::fs;
use std::path::{Path, PathBuf};

use clap::{Arg, ArgMatches, Command, value_parser};
use pomsmith::GenerateOptions;

use crate::commands::CommandResult;
use crate::context::CliSession;
use crate::error::{CliError, ExitStatus};
use crate::util;

pub fn command() -> Command {
    util::request_args(Command::new("generate").about("Generate a Maven project skeleton"))
        .arg(
            Arg::new("output")
                .long("output")
                .value_name("DIR")
                .value_parser(value_parser!(PathBuf))
                .help("Parent directory of the project. Defaults to a fresh temporary directory."),
        )
        .arg(
            Arg::new("zip")
                .long("zip")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Also write a ZIP archive of the generated project to FILE."),
        )
}

pub fn run(session: &CliSession, matches: &ArgMatches) -> Result<CommandResult, CliError> {
    let request = util::request_from_matches(matches)?;
    let zip_path = matches.get_one::<PathBuf>("zip").cloned();
    let options = GenerateOptions {
        parent_dir: matches.get_one::<PathBuf>("output").cloned(),
        archive: zip_path.is_some(),
    };

    let result = session.generator()?.generate(&request, &options)?;

    let archive = match (zip_path, result.archive.as_deref()) {
        (Some(path), Some(bytes)) => {
            if let Err(err) = write_archive(&path, bytes) {
                if let Err(cleanup) = fs::remove_dir_all(&result.output_dir) {
                    tracing::warn!(
                        dir = %result.output_dir.display(),
                        error = %cleanup,
                        "failed to remove generated project"
                    );
                }
                return Err(CliError::new(
                    format!("failed to write archive {}: {err}", path.display()),
                    ExitStatus::Io,
                ));
            }
            Some(path.display().to_string())
        }
        _ => None,
    };

    Ok(CommandResult::ProjectGenerated {
        output_dir: result.output_dir.display().to_string(),
        manifest_digest: result.manifest_digest,
        used_fallback_version: result.used_fallback_version,
        fallbacks: result.fallbacks,
        archive,
    })
}

/// Writes next to `path` first and renames, so `path` only ever holds a complete archive.
fn write_archive(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut partial = path.as_os_str().to_owned();
    partial.push(".partial");
    let partial = PathBuf::from(partial);
    let written = fs::write(&partial, bytes).and_then(|()| fs::rename(&partial, path));
    if written.is_err() {
        let _ = fs::remove_file(&partial);
    }
    written
}
