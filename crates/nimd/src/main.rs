//! `nimd <port>`: runs the Nim server on all interfaces.

use std::process::ExitCode;

use nimd::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stdout)
        .init();

    let Some(port) = parse_port(std::env::args().skip(1)) else {
        eprintln!("usage: nimd <port>");
        return ExitCode::FAILURE;
    };

    let server = match NimdServer::builder()
        .bind(&format!("0.0.0.0:{port}"))
        .build()
        .await
    {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, "failed to start server");
            return ExitCode::FAILURE;
        }
    };

    server.run().await;
    ExitCode::SUCCESS
}

/// Accepts exactly one argument, a port number.
fn parse_port(mut args: impl Iterator<Item = String>) -> Option<u16> {
    let port = args.next()?.parse().ok()?;
    args.next().is_none().then_some(port)
}
