//! `nimc <host> <port> <player_name>`: play a game of Nim from the terminal.

use std::process::ExitCode;

use nimd_client::{Finish, open, play};
use nimd_protocol::PlayerName;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [host, port, name] = args.as_slice() else {
        eprintln!("usage: nimc <host> <port> <player_name>");
        return ExitCode::FAILURE;
    };

    let name = match PlayerName::new(name.as_str()) {
        Ok(name) => name,
        Err(e) => {
            eprintln!("bad player name: {e}");
            return ExitCode::FAILURE;
        }
    };

    let addr = format!("{host}:{port}");
    let peer = match open(&addr, name.clone()).await {
        Ok(peer) => peer,
        Err(e) => {
            eprintln!("could not connect to {addr}: {e}");
            return ExitCode::FAILURE;
        }
    };
    println!("Connected to {addr}, playing as {name}.");

    match play(peer, BufReader::new(tokio::io::stdin())).await {
        Ok(Finish::InputClosed) => {
            println!("Exiting.");
            ExitCode::SUCCESS
        }
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("connection lost: {e}");
            ExitCode::FAILURE
        }
    }
}
