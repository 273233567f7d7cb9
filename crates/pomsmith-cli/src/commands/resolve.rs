use clap::{Arg, ArgMatches, Command};
use pomsmith::{Coordinate, FALLBACK_VERSION, PackageKind};

use crate::commands::CommandResult;
use crate::context::CliSession;
use crate::error::CliError;

pub fn command() -> Command {
    Command::new("resolve")
        .about("Look up the newest stable version of a coordinate")
        .arg(
            Arg::new("coordinate")
                .value_name("GROUP:ARTIFACT")
                .required(true)
                .help("Coordinate to resolve, e.g. org.junit:junit-bom."),
        )
        .arg(
            Arg::new("kind")
                .long("kind")
                .value_name("KIND")
                .default_value("normal")
                .help("How the coordinate is packaged: normal, bom or plugin."),
        )
}

pub fn run(session: &CliSession, matches: &ArgMatches) -> Result<CommandResult, CliError> {
    let coordinate = matches
        .get_one::<String>("coordinate")
        .map(String::as_str)
        .unwrap_or_default()
        .parse::<Coordinate>()
        .map_err(CliError::usage)?;
    let kind = matches
        .get_one::<String>("kind")
        .map(String::as_str)
        .unwrap_or("normal")
        .parse::<PackageKind>()
        .map_err(CliError::usage)?;

    let resolved = session
        .resolver()?
        .resolve_version(&coordinate, kind, FALLBACK_VERSION);
    Ok(CommandResult::VersionResolved {
        coordinate: coordinate.to_string(),
        kind: kind.to_string(),
        version: resolved.value,
        fallback: resolved.fallback,
    })
}
