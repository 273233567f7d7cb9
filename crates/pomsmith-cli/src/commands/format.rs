use std::fs;
use std::path::PathBuf;

use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use pomsmith::ManifestFormatter;

use crate::commands::CommandResult;
use crate::error::{CliError, ExitStatus};

pub fn command() -> Command {
    Command::new("format")
        .about("Rewrite a pom.xml in canonical layout")
        .arg(
            Arg::new("file")
                .value_name("FILE")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("Descriptor to format."),
        )
        .arg(
            Arg::new("check")
                .long("check")
                .action(ArgAction::SetTrue)
                .help("Only report whether the file is already canonical; exits 65 when it is not."),
        )
}

pub fn run(matches: &ArgMatches) -> Result<CommandResult, CliError> {
    let path = matches
        .get_one::<PathBuf>("file")
        .cloned()
        .ok_or_else(|| CliError::usage("missing descriptor path"))?;
    let raw = fs::read_to_string(&path).map_err(|err| {
        CliError::new(
            format!("failed to read {}: {err}", path.display()),
            ExitStatus::Io,
        )
    })?;
    let formatter = ManifestFormatter::new();

    if matches.get_flag("check") {
        let canonical = formatter.is_canonical(&raw)?;
        return Ok(CommandResult::ManifestChecked {
            path: path.display().to_string(),
            canonical,
        });
    }

    let formatted = formatter.format(&raw)?;
    let changed = formatted != raw;
    if changed {
        fs::write(&path, &formatted).map_err(|err| {
            CliError::new(
                format!("failed to write {}: {err}", path.display()),
                ExitStatus::Io,
            )
        })?;
        tracing::info!(file = %path.display(), "rewrote descriptor");
    }
    Ok(CommandResult::ManifestFormatted {
        path: path.display().to_string(),
        changed,
    })
}
