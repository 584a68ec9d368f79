//! Token command implementation

use crate::api::{PasswordTokenProvider, TokenProvider};
use crate::cli::args::OutputFormat;
use crate::cli::output::{print_output, TokenOutput};
use crate::config::ConfigBuilder;
use crate::error::Result;

/// Execute the token command
pub fn run_token(config_path: Option<&str>, format: OutputFormat) -> Result<()> {
    let config = ConfigBuilder::new()
        .with_file(config_path)?
        .with_env_secrets()
        .build()?;

    let provider = PasswordTokenProvider::new(&config.api, &config.auth)?;
    let credential = provider.acquire()?;
    log::info!("Token acquired for {}", config.auth.username);

    print_output(
        &TokenOutput {
            token: credential.expose().to_string(),
        },
        format,
    )?;

    Ok(())
}
