//! Terminal tester for a wsecho server.
//!
//! Reads commands from stdin, drives a WebSocket client session and
//! prints log entries as they arrive.

mod api;
mod command;

use std::time::Duration;

use clap::Parser;
use reqwest::Method;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;
use wsecho_client::{ClientSession, websocket_url};
use wsecho_protocol::{Direction, LogEntry};

use crate::api::ApiTester;
use crate::command::{Command, HELP};

#[derive(Parser, Debug)]
#[command(name = "wsecho-client-cli", version, long_about = None)]
#[command(about = "WebSocket and REST tester")]
struct Args {
    /// Server base address
    #[arg(short, long, default_value = "http://127.0.0.1:3000")]
    url: String,

    /// Connect immediately instead of waiting for /connect
    #[arg(long)]
    connect: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let session = ClientSession::new(websocket_url(&args.url));
    let api = ApiTester::new(&args.url);
    println!("target {}  (/help for commands)", session.url());

    if args.connect {
        // Failure is already in the log.
        let _ = session.connect().await;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(Duration::from_millis(50));
    let mut printed = 0usize;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                printed = print_new(&session.log(), printed);
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match Command::parse(&line) {
                    Command::Connect => {
                        let _ = session.connect().await;
                    }
                    Command::Disconnect => session.disconnect().await,
                    Command::Clear => {
                        session.clear_log();
                        printed = 0;
                    }
                    Command::Log => {
                        let log = session.log();
                        print_new(&log, 0);
                        printed = log.len();
                    }
                    Command::Get(path) => println!("{}", api.request(Method::GET, &path).await),
                    Command::Put(path) => println!("{}", api.request(Method::PUT, &path).await),
                    Command::Help => println!("{HELP}"),
                    Command::Quit => break,
                    Command::Send(text) => {
                        if !session.send(&text).await {
                            println!("not sent (not connected or empty)");
                        }
                    }
                }
            }
        }
    }

    session.disconnect().await;
    print_new(&session.log(), printed);
    Ok(())
}

/// Prints entries from `from` onward and returns the new cursor.
fn print_new(log: &[LogEntry], from: usize) -> usize {
    // A cleared log is shorter than the cursor.
    let from = from.min(log.len());
    for entry in &log[from..] {
        let arrow = match entry.direction {
            Direction::Sent => "->",
            Direction::Received => "<-",
        };
        match &entry.entry_type {
            Some(kind) => println!("{} {arrow} [{kind}] {}", entry.timestamp, entry.content),
            None => println!("{} {arrow} {}", entry.timestamp, entry.content),
        }
    }
    log.len()
}
