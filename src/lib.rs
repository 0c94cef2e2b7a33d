pub mod accumulator;
pub mod cli;
pub mod controller;
pub mod dispatcher;
pub mod error;
pub mod models;
pub mod session;
pub mod sink;
pub mod status;
pub mod transport;

use cli::Args;
use cli::commands::{ Command, HELP_LINES };
use log::info;
use session::SessionManager;
use sink::TerminalSink;
use status::StatusController;
use std::error::Error;
use std::io;
use std::sync::Arc;
use tokio::sync::mpsc;
use transport::HttpConnector;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Client Configuration ---");
    info!("Server URL: {}", args.server_url);
    info!("Stream Path: {}", args.stream_path);
    info!("Idle Timeout: {:?}", args.idle_timeout());
    info!("Error Status Revert: {:?}", args.error_revert());
    info!("Verbose: {}", args.verbose);
    info!("---------------------------");

    let connector = HttpConnector::new(&args.server_url, &args.stream_path, args.idle_timeout())?;
    let manager = SessionManager::new(
        TerminalSink::stdout(args.verbose),
        Arc::new(connector),
        StatusController::new(args.error_revert())
    );

    let (tx, rx) = mpsc::channel(16);
    match args.question.clone() {
        Some(question) => {
            tx.send(Command::Ask(question)).await?;
            drop(tx);
        }
        None => {
            println!("{}", HELP_LINES[0]);
            println!("Type /help for commands, /exit to quit.");
            std::thread::spawn(move || controller::read_commands(io::stdin().lock(), tx));
        }
    }

    controller::drive(manager, rx).await;
    Ok(())
}
