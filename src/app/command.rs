// src/app/command.rs

use crate::config::{StrategyConfig, StrategyMode};
use crate::game::Move;
use crate::orchestrator::Controller;
use shakmaty::Color;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Move(Move),
    Board,
    History,
    Reset,
    Strategy(StrategyConfig),
    Control(Color, Controller),
    Analyze,
    Say(String),
    Save(String),
    Load(String),
    Profiles,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  e2e4 | e2 e4 | e2-e4 | Ng1 f3   play a move
  board                           show the board
  history                         show the moves so far
  reset                           start a new game
  strategy <multi|single> [depth] change the advisory strategy
  control <white|black> <human|advisor>
  analyze                         ask for a position analysis
  say <message>                   talk to the assistant
  save <profile> | load <profile> | profiles
  quit";

fn parse_color(word: &str) -> Result<Color, String> {
    match word {
        "white" | "w" => Ok(Color::White),
        "black" | "b" => Ok(Color::Black),
        other => Err(format!("unknown side '{other}'")),
    }
}

fn parse_controller(word: &str) -> Result<Controller, String> {
    match word {
        "human" => Ok(Controller::Human),
        "advisor" | "advisory" | "ai" => Ok(Controller::Advisory),
        other => Err(format!("unknown controller '{other}'")),
    }
}

fn parse_strategy(args: &[&str], current: StrategyConfig) -> Result<StrategyConfig, String> {
    let mode = match args.first().copied() {
        Some("multi") | Some("cache") => StrategyMode::MultiMoveCache,
        Some("single") => StrategyMode::SingleMoveAnalysis,
        Some(other) => return Err(format!("unknown strategy '{other}'")),
        None => return Err("usage: strategy <multi|single> [depth]".to_string()),
    };
    let cache_depth = match args.get(1) {
        Some(depth) => depth
            .parse()
            .map_err(|_| format!("'{depth}' is not a depth"))?,
        None => current.cache_depth,
    };
    Ok(StrategyConfig { mode, cache_depth })
}

fn required(rest: &str, usage: &str) -> Result<String, String> {
    if rest.is_empty() {
        Err(format!("usage: {usage}"))
    } else {
        Ok(rest.to_string())
    }
}

/// Reads one input line. Anything that is not a keyword is tried as a move.
pub fn parse_command(line: &str, current: StrategyConfig) -> Result<Command, String> {
    let line = line.trim();
    let (keyword, rest) = match line.split_once(char::is_whitespace) {
        Some((keyword, rest)) => (keyword, rest.trim()),
        None => (line, ""),
    };
    let args: Vec<&str> = rest.split_whitespace().collect();

    match keyword.to_ascii_lowercase().as_str() {
        "" => Err("empty input".to_string()),
        "board" => Ok(Command::Board),
        "history" => Ok(Command::History),
        "reset" | "new" => Ok(Command::Reset),
        "analyze" => Ok(Command::Analyze),
        "profiles" => Ok(Command::Profiles),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" | "q" => Ok(Command::Quit),
        "strategy" => parse_strategy(&args, current).map(Command::Strategy),
        "control" => match args.as_slice() {
            [color, controller] => Ok(Command::Control(parse_color(color)?, parse_controller(controller)?)),
            _ => Err("usage: control <white|black> <human|advisor>".to_string()),
        },
        "say" => required(rest, "say <message>").map(Command::Say),
        "save" => required(rest, "save <profile>").map(Command::Save),
        "load" => required(rest, "load <profile>").map(Command::Load),
        _ => line.parse().map(Command::Move).map_err(|err| format!("{err}")),
    }
}
