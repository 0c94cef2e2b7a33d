use log::{ debug, error, info };
use std::io::BufRead;
use tokio::sync::mpsc;
use tokio::time::{ sleep_until, Instant };

use crate::cli::commands::{ Command, HELP_LINES };
use crate::models::chat::Author;
use crate::models::events::TransportEvent;
use crate::session::SessionManager;
use crate::sink::PresentationSink;

enum Wake {
    Transport(Option<TransportEvent>),
    Command(Option<Command>),
    StatusRevert,
}

/// Runs the controller until the user quits, or until input ends and no
/// session is open. All handling happens on this one task, one wake-up at a
/// time, so push events are applied strictly in delivery order.
pub async fn drive<S: PresentationSink>(
    mut manager: SessionManager<S>,
    mut commands: mpsc::Receiver<Command>
) -> SessionManager<S> {
    let mut input_open = true;
    loop {
        if !input_open && !manager.is_busy() {
            debug!("Input closed and no session open; stopping");
            break;
        }
        let deadline = manager.revert_deadline();
        let wake = tokio::select! {
            event = manager.next_transport_event() => Wake::Transport(event),
            command = commands.recv(), if input_open => Wake::Command(command),
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => Wake::StatusRevert,
        };
        match wake {
            Wake::Transport(event) => manager.handle_transport(event),
            Wake::StatusRevert => manager.revert_status_if_due(Instant::now()),
            Wake::Command(None) => {
                info!("Input closed");
                input_open = false;
            }
            Wake::Command(Some(command)) => {
                if !apply_command(&mut manager, command) {
                    manager.cancel();
                    break;
                }
            }
        }
    }
    manager
}

/// Returns `false` when the command asks to leave.
fn apply_command<S: PresentationSink>(manager: &mut SessionManager<S>, command: Command) -> bool {
    match command {
        Command::Ask(question) => {
            manager.submit(&question);
        }
        Command::Interrupt(question) => {
            manager.interrupt(&question);
        }
        Command::Cancel => manager.cancel(),
        Command::History => {
            let lines: Vec<String> = manager
                .transcript()
                .iter()
                .map(|message| {
                    let who = match message.author {
                        Author::User => "You",
                        Author::Bot => "Bot",
                    };
                    format!("{}: {}", who, message.content)
                })
                .collect();
            if lines.is_empty() {
                manager.sink_mut().append_info("No messages yet.");
            }
            for line in lines {
                manager.sink_mut().append_info(&line);
            }
        }
        Command::Help => {
            for line in HELP_LINES {
                manager.sink_mut().append_info(line);
            }
        }
        Command::Unknown(text) => {
            manager.sink_mut().append_info(&format!("Unknown command: {} (type /help)", text));
        }
        Command::Quit => return false,
    }
    true
}

/// Reads lines from `input` and forwards them as commands until end of input
/// or until the controller stops listening. Blocking; run it on its own
/// thread.
pub fn read_commands<R: BufRead>(input: R, tx: mpsc::Sender<Command>) {
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to read input: {}", e);
                return;
            }
        };
        let Some(command) = Command::parse(&line) else {
            continue;
        };
        if tx.blocking_send(command).is_err() {
            return;
        }
    }
}
