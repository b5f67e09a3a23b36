// Improvement potential: Full-screen UI with a live clock instead of printing after each event.

use std::cell::Cell;
use std::io::{self, BufRead};
use std::rc::Rc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::bail;
use instant::Instant;
use live_chess::config::ClientConfig;
use live_chess::directory::{DirectoryEvent, GameDirectory, GameLookup, GameLookupError};
use live_chess::event::{GameId, WireFrame};
use live_chess::force::Force;
use live_chess::rules::{CandidateMove, StandardChessOracle};
use live_chess::session::{SessionEvent, SubmitOutcome};
use live_chess::transport::ChannelTransport;
use log::{error, info};
use tungstenite::protocol;

use crate::network;
use crate::tui;


enum IncomingEvent {
    Network(WireFrame),
    NetworkClosed(String),
    Stdin(String),
    Tick,
}

fn print_games(directory: &GameDirectory) {
    for session in directory.sessions() {
        let status = if session.is_in_progress() { "in progress" } else { "finished" };
        println!(
            "{}: {} vs {}, {} ({status})",
            session.id(),
            session.player(Force::White).name,
            session.player(Force::Black).name,
            session.timing_style(),
        );
    }
}

fn print_help() {
    println!("Enter moves like 'e2e4' or 'e7e8q'. Commands: /games, /resync, /quit.");
}

pub fn run(config: ClientConfig, game_id: GameId) -> anyhow::Result<()> {
    println!("Connecting to {}...", config.server_address);
    let mut socket_in = network::connect(&config.server_address)?;
    let mut socket_out = network::clone_websocket(&socket_in, protocol::Role::Client)?;

    let (tx, rx) = mpsc::channel();
    let tx_net = tx.clone();
    let tx_stdin = tx.clone();
    let tx_tick = tx;
    thread::spawn(move || {
        loop {
            let ev = match network::read_frame(&mut socket_in) {
                Ok(frame) => IncomingEvent::Network(frame),
                Err(err) => IncomingEvent::NetworkClosed(err.to_string()),
            };
            let closed = matches!(ev, IncomingEvent::NetworkClosed(_));
            if tx_net.send(ev).is_err() || closed {
                return;
            }
        }
    });
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { return };
            if tx_stdin.send(IncomingEvent::Stdin(line)).is_err() {
                return;
            }
        }
    });
    thread::spawn(move || {
        loop {
            thread::sleep(Duration::from_millis(100));
            if tx_tick.send(IncomingEvent::Tick).is_err() {
                return;
            }
        }
    });

    let (server_tx, server_rx) = mpsc::channel();
    thread::spawn(move || {
        for message in server_rx {
            let frame = network::outgoing_frame(message);
            if let Err(err) = network::write_frame(&mut socket_out, &frame) {
                error!("Cannot send message: {err}");
                return;
            }
        }
    });

    let transport = Rc::new(ChannelTransport::new(server_tx));
    let mut directory = GameDirectory::new(transport, Rc::new(StandardChessOracle), config);
    let dirty = Rc::new(Cell::new(false));
    let mut attached = false;
    directory.request_game(&game_id, Instant::now());

    for event in rx {
        let now = Instant::now();
        let directory_events = match event {
            IncomingEvent::Network(frame) => {
                directory.process_message(&frame.topic, frame.payload, now)
            }
            IncomingEvent::NetworkClosed(reason) => bail!("Connection lost: {reason}"),
            IncomingEvent::Tick => directory.tick(now),
            IncomingEvent::Stdin(line) => {
                let input = line.trim();
                if input == "/games" {
                    if directory.request_games(now) == GameLookup::Ready {
                        print_games(&directory);
                    }
                    continue;
                }
                let Some(session) = directory.session_mut(&game_id) else {
                    println!("Still waiting for game {game_id}...");
                    continue;
                };
                match input {
                    "" => dirty.set(true),
                    "/quit" => return Ok(()),
                    "/resync" => session.resync(),
                    "/help" => print_help(),
                    _ => match CandidateMove::from_uci(input) {
                        Err(err) => println!("Cannot parse '{input}': {err}"),
                        Ok(mv) => match session.submit_move(mv, now) {
                            SubmitOutcome::Applied(_) => {}
                            SubmitOutcome::PromotionPieceNeeded => {
                                println!("Promotion: repeat the move with a piece, e.g. {mv}q")
                            }
                            SubmitOutcome::Illegal => println!("Illegal move: {mv}"),
                            SubmitOutcome::GameNotInProgress => println!("The game is over"),
                        },
                    },
                }
                vec![]
            }
        };

        for event in directory_events {
            match event {
                DirectoryEvent::LookupResolved(id) | DirectoryEvent::GameAdded(id) => {
                    info!("Game {id} is ready");
                }
                DirectoryEvent::LookupFailed { id, error } if id == game_id => match error {
                    GameLookupError::NotFound => bail!("Game {id} does not exist"),
                    GameLookupError::Timeout => bail!("Server did not answer about game {id}"),
                    GameLookupError::InvalidGame(err) => bail!("Cannot open game {id}: {err}"),
                },
                DirectoryEvent::LookupFailed { .. } => {}
                DirectoryEvent::GameListResolved(_) => print_games(&directory),
                DirectoryEvent::GameListTimedOut => println!("Server did not send the game list"),
            }
        }

        if !attached {
            if let Some(session) = directory.session_mut(&game_id) {
                attached = true;
                let observer_dirty = Rc::clone(&dirty);
                session.add_observer(move |event| {
                    if let SessionEvent::PromotionPieceNeeded(_) = event {
                        return;
                    }
                    observer_dirty.set(true);
                });
                print_help();
                dirty.set(true);
            }
        }

        if dirty.replace(false) {
            if let Some(session) = directory.session(&game_id) {
                println!("\n{}", tui::render_session(session, now));
            }
        }
    }
    Ok(())
}
