use clap::{ArgMatches, Command};

use crate::commands::CommandResult;
use crate::context::CliSession;
use crate::error::CliError;
use crate::util;

pub fn command() -> Command {
    util::request_args(
        Command::new("pom").about("Print the pom.xml a generation run would write"),
    )
}

pub fn run(session: &CliSession, matches: &ArgMatches) -> Result<CommandResult, CliError> {
    let request = util::request_from_matches(matches)?;
    let manifest = session.generator()?.build_manifest(&request)?;
    Ok(CommandResult::Manifest {
        fallbacks: manifest.fallbacks(),
        manifest: manifest.text,
        digest: manifest.digest,
        used_fallback_version: manifest.used_fallback_version,
    })
}
