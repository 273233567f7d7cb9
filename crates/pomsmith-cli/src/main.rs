use std::process::ExitCode;

fn main() -> ExitCode {
    pomsmith_cli::run()
}
