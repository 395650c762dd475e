pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "askbot",
    about = "Askbot operator CLI",
    long_about = "Inspect askbot configuration, check Slack and agent readiness, and ask the agent directly.",
    after_help = "Examples:\n  askbot doctor --json\n  askbot config\n  askbot ask what is 2+2"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, Slack token readiness, and agent backend settings")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Send one question to the configured agent and print the answer")]
    Ask {
        #[arg(required = true, num_args = 1.., help = "The question to ask")]
        question: Vec<String>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => commands::config::run(),
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Ask { question } => commands::ask::run(&question.join(" ")),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
