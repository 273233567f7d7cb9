use clap::{Arg, ArgAction, ArgMatches, Command};
use pomsmith::{AssertionLibrary, GenerationRequest};

use crate::error::CliError;

#[derive(Clone, Copy, Debug, Default)]
pub struct Verbosity {
    pub json: bool,
    pub verbose: bool,
}

/// Adds the flags that describe a [`GenerationRequest`] to `command`.
pub fn request_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("group-id")
                .long("group-id")
                .value_name("GROUP_ID")
                .required(true)
                .help("Maven groupId; also the Java package of the generated sources."),
        )
        .arg(
            Arg::new("artifact-id")
                .long("artifact-id")
                .value_name("ARTIFACT_ID")
                .required(true)
                .help("Maven artifactId; also the project directory name."),
        )
        .arg(
            Arg::new("version")
                .long("version")
                .value_name("VERSION")
                .help("Project version. Defaults to 1.0.0-SNAPSHOT."),
        )
        .arg(
            Arg::new("name")
                .long("name")
                .value_name("NAME")
                .help("Human-readable project name."),
        )
        .arg(
            Arg::new("description")
                .long("description")
                .value_name("TEXT")
                .help("Project description."),
        )
        .arg(
            Arg::new("java-version")
                .long("java-version")
                .value_name("RELEASE")
                .help("Java release passed to maven.compiler.release. Defaults to 25."),
        )
        .arg(
            Arg::new("assertion")
                .long("assertion")
                .value_name("LIBRARY")
                .help("Assertion library for tests: none, assertj or hamcrest."),
        )
        .arg(
            Arg::new("spotless")
                .long("spotless")
                .action(ArgAction::SetTrue)
                .help("Add the Spotless plugin with a placeholder configuration."),
        )
        .arg(
            Arg::new("checkstyle")
                .long("checkstyle")
                .action(ArgAction::SetTrue)
                .help("Add the Checkstyle plugin with a placeholder configuration."),
        )
        .arg(
            Arg::new("wrapper")
                .long("wrapper")
                .action(ArgAction::SetTrue)
                .help("Install the Maven wrapper scripts (requires mvn on PATH)."),
        )
}

/// Builds the request from flags added by [`request_args`]. Field validation
/// happens in the library so every violation is reported at once.
pub fn request_from_matches(matches: &ArgMatches) -> Result<GenerationRequest, CliError> {
    let group_id = string_arg(matches, "group-id").unwrap_or_default();
    let artifact_id = string_arg(matches, "artifact-id").unwrap_or_default();
    let mut request = GenerationRequest::new(group_id, artifact_id);

    if let Some(version) = string_arg(matches, "version") {
        request.version = version;
    }
    if let Some(java_version) = string_arg(matches, "java-version") {
        request.java_version = java_version;
    }
    request.name = string_arg(matches, "name");
    request.description = string_arg(matches, "description");
    if let Some(raw) = string_arg(matches, "assertion") {
        request.assertion_library = raw
            .parse::<AssertionLibrary>()
            .map_err(CliError::usage)?;
    }
    request.include_spotless = matches.get_flag("spotless");
    request.include_checkstyle = matches.get_flag("checkstyle");
    request.include_wrapper = matches.get_flag("wrapper");
    Ok(request)
}

fn string_arg(matches: &ArgMatches, id: &str) -> Option<String> {
    matches.get_one::<String>(id).cloned()
}
