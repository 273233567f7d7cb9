use clap::Command;
use pomsmith::GenerationRequest;

use crate::commands::CommandResult;
use crate::error::CliError;

pub fn command() -> Command {
    Command::new("schema").about("Print the JSON schema of a generation request")
}

pub fn run() -> Result<CommandResult, CliError> {
    Ok(CommandResult::Schema {
        schema: GenerationRequest::json_schema()?,
    })
}
