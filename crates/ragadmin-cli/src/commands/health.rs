//! `ragadmin health` command implementation

use crate::commands::Context;
use crate::error::{CliError, Result};
use crate::progress::with_spinner;
use colored::Colorize;

/// Check that the backend answers its health endpoint
pub async fn run(ctx: &Context) -> Result<()> {
    let healthy = with_spinner("Checking backend", ctx.api.health_check()).await?;
    if !healthy {
        return Err(CliError::Network(format!(
            "{} is not answering health checks",
            ctx.config.server_url
        )));
    }
    println!("{} {} is healthy", "✓".green(), ctx.config.server_url.cyan());
    Ok(())
}
