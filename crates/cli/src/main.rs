use std::process::ExitCode;

fn main() -> ExitCode {
    askbot_cli::run()
}
