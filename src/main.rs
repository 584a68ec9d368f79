//! idleguard - GPU idle watchdog
//!
//! A command-line tool that stops idle GPU jobs on the cluster platform and
//! reports what it did through email, ServerChan or DingTalk.

use clap::Parser;
use idleguard::cli::args::{generate_completions, Cli, Commands};
use idleguard::cli::logger;
use idleguard::commands::{run_probe, run_test_notify, run_token, run_watch};
use idleguard::error::{AppError, ConfigError};

fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging; -v lowers the default filter to debug
    logger(env_logger::Env::default(), cli.verbose).init();

    // Run the appropriate command
    let result = run(&cli);

    if let Err(e) = result {
        log::error!("{}", e);
        print_error(&e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), AppError> {
    let config = cli.config.as_deref();

    match &cli.command {
        Commands::Watch(args) => run_watch(args, config, cli.format),

        Commands::Probe(args) => run_probe(args, config, cli.format),

        Commands::Token => run_token(config, cli.format),

        Commands::TestNotify(args) => run_test_notify(args, config, cli.format),

        Commands::Completions { shell } => {
            generate_completions(*shell);
            Ok(())
        }
    }
}

fn print_error(err: &AppError) {
    eprintln!("Error: {}", err);

    // Print helpful hints for common errors
    match err {
        AppError::IncompleteIdentity(_) => {
            eprintln!();
            eprintln!("Hint: Pass the scheduler event line with --schedule-log, or set");
            eprintln!("      job.pod and job.node in the config file.");
        }
        AppError::Config(ConfigError::MissingField(field)) if field.starts_with("auth") => {
            eprintln!();
            eprintln!("Hint: Set auth.username in the config file and export IDLEGUARD_PASSWORD.");
        }
        AppError::Auth(_) => {
            eprintln!();
            eprintln!("Hint: Check auth.username and the IDLEGUARD_PASSWORD environment variable.");
        }
        AppError::MonitorFailed { .. } => {
            eprintln!();
            eprintln!("Hint: Check the network and whether the platform is reachable.");
        }
        _ => {}
    }
}
