use std::env;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use coursedesk::console::Console;
use coursedesk::gateway::HttpGateway;

fn main() -> Result<()> {
    println!(
        r"                                     __         __
  _________  __  ________________  __/ /__  _____/ /__
 / ___/ __ \/ / / / ___/ ___/ _ \/ __  / _ \/ ___/ //_/
/ /__/ /_/ / /_/ / /  (__  /  __/ /_/ /  __(__  / ,<
\___/\____/\__,_/_/  /____/\___/\__,_/\___/____/_/|_|
       Course Management Console"
    );

    // Init logging
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("warn"))?;
    fmt().with_env_filter(filter).init();

    let base = env::var("COURSEDESK_API_URL").unwrap_or_else(|_| "http://localhost:5000".to_string());
    info!(target: "coursedesk", "connecting to {}", base);

    let gateway = HttpGateway::new(&base)
        .with_context(|| format!("Failed to build API client for {}", base))?;

    // Tokio runtime
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build Tokio runtime")?;

    Console::new(gateway).run(&rt)
}
