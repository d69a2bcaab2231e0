//! # Shopline Main Entry Point
//!
//! Terminal product catalog browser.

use anyhow::Result;
use shopline::cmd_args::CommandLineArgs;
use shopline::repl::io::{TerminalEventStream, TerminalRenderStream};
use shopline::AppController;
use tracing_subscriber::{fmt::time::ChronoLocal, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cmd_args = CommandLineArgs::parse();
    init_tracing_subscriber(cmd_args.verbose());

    let mut app = AppController::with_io_streams(
        cmd_args,
        TerminalEventStream::new(),
        TerminalRenderStream::new(),
    )?;

    app.run().await?;

    println!("Bye from shopline!");
    Ok(())
}

fn init_tracing_subscriber(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let env_var = format!("{}_LOG_LEVEL", env!("CARGO_PKG_NAME").to_uppercase());

    let mut filter =
        EnvFilter::try_from_env(&env_var).unwrap_or_else(|_| EnvFilter::new(default_level));
    for directive in [
        "reqwest=warn",
        "hyper=warn",
        "hyper_util=warn",
        "rustls=warn",
        "tokio=warn",
        "tokio_util=warn",
    ] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    // Logs go to stderr; stdout belongs to the alternate screen.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_timer(ChronoLocal::rfc_3339())
        .init();
}
