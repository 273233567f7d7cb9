use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};

use crate::commands;
use crate::context::{CliSession, SessionOptions};
use crate::error::{CliError, ExitStatus};
use crate::output::{OutputFormat, emit_result};
use crate::util::Verbosity;

const NAME: &str = "pomsmith";

pub fn run() -> ExitCode {
    init_tracing();
    match run_cli(std::env::args()) {
        Ok(code) => code,
        Err(err) => {
            err.print();
            err.exit_code()
        }
    }
}

/// Parses CLI arguments, builds the session and dispatches to the selected
/// command. Returns a `sysexits`-compatible `ExitCode`.
pub fn run_cli<I, S>(args: I) -> Result<ExitCode, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString> + Clone,
{
    let command = build_cli();
    let matches = command.try_get_matches_from(args)?;

    let verbosity = Verbosity {
        json: matches.get_flag("json"),
        verbose: matches.get_flag("verbose"),
    };
    let output = if verbosity.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    let options = SessionOptions {
        config_path: matches.get_one::<PathBuf>("config").cloned(),
        repository: matches.get_one::<String>("repository").cloned(),
        max_lookups: matches.get_one::<usize>("max-lookups").copied(),
        offline: matches.get_flag("offline"),
    };
    let session = CliSession::bootstrap(options, verbosity)?;
    if session.verbosity.verbose {
        tracing::info!(
            repository = %session.config.repository_url,
            max_lookups = session.config.max_concurrent_lookups,
            verify_artifacts = session.config.verify_artifacts,
            offline = session.offline,
            "resolved session"
        );
    }

    let result = dispatch(&session, &matches)?;
    emit_result(result, output)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

/// Root `clap::Command` with the global flags and every subcommand.
fn build_cli() -> Command {
    Command::new(NAME)
        .about("Generate Maven project skeletons with up-to-date dependency versions")
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf))
                .help("YAML configuration file (repository, timeouts, catalog)."),
        )
        .arg(
            Arg::new("repository")
                .long("repository")
                .value_name("URL")
                .help("Maven repository to query. Defaults to Maven Central."),
        )
        .arg(
            Arg::new("max-lookups")
                .long("max-lookups")
                .value_name("N")
                .value_parser(value_parser!(usize))
                .help("Maximum number of concurrent version lookups."),
        )
        .arg(
            Arg::new("offline")
                .long("offline")
                .action(ArgAction::SetTrue)
                .help("Skip the network; every version falls back to the placeholder."),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .help("Emit newline-delimited JSON instead of human-readable text."),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Log the resolved session settings."),
        )
        .subcommand_required(true)
        .subcommand(commands::generate::command())
        .subcommand(commands::pom::command())
        .subcommand(commands::format::command())
        .subcommand(commands::resolve::command())
        .subcommand(commands::schema::command())
}

fn dispatch(
    session: &CliSession,
    matches: &ArgMatches,
) -> Result<commands::CommandResult, CliError> {
    match matches.subcommand() {
        Some(("generate", sub)) => commands::generate::run(session, sub),
        Some(("pom", sub)) => commands::pom::run(session, sub),
        Some(("format", sub)) => commands::format::run(sub),
        Some(("resolve", sub)) => commands::resolve::run(session, sub),
        Some(("schema", _)) => commands::schema::run(),
        _ => Err(CliError::new("missing command", ExitStatus::Usage)),
    }
}
