#[macro_use]
extern crate log;
extern crate rts_bot;

use std::net::TcpListener;
use std::process;

use clap::Parser;
use rts_bot::*;

/// Game bot: answers every turn the server sends with one batch of unit commands
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// Port to accept game server connections on
    #[clap(default_value_t = 9090)]
    port: u16,
}

fn run(cli: Cli) -> Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", cli.port))?;
    serve(listener)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run(Cli::parse()) {
        error!("rts-bot error: {}", e);
        process::exit(1);
    }
}
