// app/mod.rs

mod command;
mod render;

use crate::config;
use crate::constants::INPUT_POLL_MS;
use crate::error::{color_name, GameError};
use crate::event::Event;
use crate::orchestrator::Controller;
use crate::session::{GameSession, SessionRegistry};
use command::{parse_command, Command, HELP};
use crossbeam_channel::{unbounded, Receiver, TryRecvError};
use shakmaty::Color;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tracing::{debug, warn};

pub struct App {
    registry: SessionRegistry,
    session: Arc<GameSession>,
    events: broadcast::Receiver<Event>,
    profiles_dir: PathBuf,
    tick_interval: Duration,
    should_quit: bool,
    input_closed: bool,
}

impl App {
    pub fn new(registry: SessionRegistry, profiles_dir: PathBuf, tick_interval: Duration) -> Result<Self, GameError> {
        let events = registry.subscribe();
        let session = registry.create()?;
        Ok(Self {
            registry,
            session,
            events,
            profiles_dir,
            tick_interval,
            should_quit: false,
            input_closed: false,
        })
    }

    /// Reads commands from stdin until `quit` or end of input. When stdin
    /// closes, advisor-only games keep playing until they are over.
    pub async fn run_headless(&mut self) -> Result<(), GameError> {
        let input = spawn_stdin_reader();
        println!("{}", render::board(&self.session.snapshot()));
        println!("type 'help' for commands");

        self.session.notify();
        let mut last_tick = Instant::now();

        while !self.should_quit {
            loop {
                match input.try_recv() {
                    Ok(line) => self.handle_line(&line),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        if !self.input_closed {
                            debug!("Input closed");
                            self.input_closed = true;
                        }
                        break;
                    }
                }
                if self.should_quit {
                    break;
                }
            }

            self.drain_events();

            if last_tick.elapsed() >= self.tick_interval {
                self.session.tick();
                last_tick = Instant::now();
            }

            if self.input_closed && !self.keeps_playing_alone() {
                self.should_quit = true;
            }

            tokio::time::sleep(Duration::from_millis(INPUT_POLL_MS)).await;
        }

        self.drain_events();
        self.registry.terminate(self.session.id());
        Ok(())
    }

    fn keeps_playing_alone(&self) -> bool {
        let snapshot = self.session.snapshot();
        !snapshot.game_over
            && self.session.controller(Color::White) == Controller::Advisory
            && self.session.controller(Color::Black) == Controller::Advisory
    }

    fn drain_events(&mut self) {
        loop {
            match self.events.try_recv() {
                Ok(event) => {
                    if let Some(line) = render::event(&event) {
                        println!("{line}");
                    }
                    if matches!(event, Event::MoveApplied { .. }) {
                        println!("{}", render::board(&self.session.snapshot()));
                    }
                }
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!("Dropped {skipped} events");
                }
                Err(_) => break,
            }
        }
    }

    fn handle_line(&mut self, line: &str) {
        if line.trim().is_empty() {
            return;
        }
        match parse_command(line, self.session.config()) {
            Ok(command) => {
                if let Err(err) = self.execute(command) {
                    println!("error: {err}");
                }
            }
            Err(message) => println!("{message}"),
        }
    }

    fn execute(&mut self, command: Command) -> Result<(), GameError> {
        match command {
            Command::Move(mv) => {
                self.session.human_move(mv.from, mv.to)?;
                self.session.notify();
            }
            Command::Board => println!("{}", render::board(&self.session.snapshot())),
            Command::History => println!("{}", render::history(self.session.game().ledger())),
            Command::Reset => {
                self.session.reset();
                println!("{}", render::board(&self.session.snapshot()));
                self.session.notify();
            }
            Command::Strategy(strategy) => {
                self.session.set_config(strategy)?;
                self.session.notify();
            }
            Command::Control(color, controller) => {
                self.session.set_controller(color, controller);
                self.session.notify();
            }
            Command::Analyze => {
                let session = Arc::clone(&self.session);
                tokio::spawn(async move {
                    if let Err(err) = session.analyze().await {
                        println!("analysis failed: {err}");
                    }
                });
            }
            Command::Say(message) => {
                let session = Arc::clone(&self.session);
                tokio::spawn(async move {
                    if let Err(err) = session.converse(&message).await {
                        println!("assistant unavailable: {err}");
                    }
                });
            }
            Command::Save(name) => {
                config::save_profile(&self.profiles_dir, &name, &self.session.config())?;
                println!("saved profile '{name}'");
            }
            Command::Load(name) => {
                let loaded = config::load_profile(&self.profiles_dir, &name)?;
                self.session.set_config(loaded)?;
                println!("loaded profile '{name}'");
                self.session.notify();
            }
            Command::Profiles => match config::get_profiles(&self.profiles_dir) {
                Ok(profiles) if !profiles.is_empty() => println!("{}", profiles.join(", ")),
                _ => println!("no saved profiles"),
            },
            Command::Help => {
                println!("{HELP}");
                for color in [Color::White, Color::Black] {
                    println!("{}: {:?}", color_name(color), self.session.controller(color));
                }
            }
            Command::Quit => self.should_quit = true,
        }
        Ok(())
    }
}

fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = unbounded();
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}
