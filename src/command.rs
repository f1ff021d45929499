//! Main-screen command line parsing.
//!
//! One line of input is one command: a verb followed by whitespace-separated
//! arguments. `rename` keeps the rest of the line verbatim so desk names may
//! contain spaces.

use std::str::FromStr;

use crate::model::{Floor, ThingKind};

/// Pointer events a `drag` is split into when no count is given.
pub const DEFAULT_DRAG_STEPS: u32 = 10;

/// Upper bound on pointer events in one `drag`.
pub const MAX_DRAG_STEPS: u32 = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login,
    Logout,
    Quit,
    Help,
    Menu,
    Show,
    List,
    Kinds,
    Floors,
    New(ThingKind),
    Floor(Floor),
    Select(String),
    Pick { x: i32, y: i32 },
    Deselect,
    Move { left: i32, top: i32 },
    Drag { dx: i32, dy: i32, steps: u32 },
    Rotate,
    Rename(String),
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}' (try 'help')")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("'{value}' is not a valid {what}")]
    InvalidArgument { what: &'static str, value: String },
}

/// Help text listing every main-screen command.
pub const HELP: &str = "\
commands:
  new <kind>            add a thing (see 'kinds')
  floor <pattern>       change the floor (see 'floors')
  select <key>          select by key or unique key prefix
  pick <x> <y>          select the topmost thing at a point
  deselect              clear the selection
  move <left> <top>     move the selection
  drag <dx> <dy> [n]    drag the selection in n pointer steps (1-1000)
  rotate                turn the selection a quarter turn
  rename <name>         rename the selected desk
  delete                delete the selection
  list                  list things in draw order
  show                  redraw the floor plan
  menu                  show the options menu
  logout                sign out and return to the login screen
  quit                  exit";

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };
        let args: Vec<&str> = rest.split_whitespace().collect();

        let command = match verb.to_ascii_lowercase().as_str() {
            "" => return Err(CommandError::Empty),
            "login" => no_args(&args, "login", Self::Login)?,
            "logout" => no_args(&args, "logout", Self::Logout)?,
            "quit" | "exit" => no_args(&args, "quit", Self::Quit)?,
            "help" | "?" => Self::Help,
            "menu" => no_args(&args, "menu", Self::Menu)?,
            "show" => no_args(&args, "show", Self::Show)?,
            "list" | "ls" => no_args(&args, "list", Self::List)?,
            "kinds" => no_args(&args, "kinds", Self::Kinds)?,
            "floors" => no_args(&args, "floors", Self::Floors)?,
            "deselect" => no_args(&args, "deselect", Self::Deselect)?,
            "rotate" => no_args(&args, "rotate", Self::Rotate)?,
            "delete" | "rm" => no_args(&args, "delete", Self::Delete)?,
            "new" => match args.as_slice() {
                [kind] => Self::New(parse_arg(kind, "thing kind")?),
                _ => return Err(CommandError::Usage("new <kind>")),
            },
            "floor" => match args.as_slice() {
                [floor] => Self::Floor(parse_arg(floor, "floor")?),
                _ => return Err(CommandError::Usage("floor <pattern>")),
            },
            "select" => match args.as_slice() {
                [key] => Self::Select((*key).to_string()),
                _ => return Err(CommandError::Usage("select <key>")),
            },
            "pick" => match args.as_slice() {
                [x, y] => Self::Pick { x: parse_arg(x, "coordinate")?, y: parse_arg(y, "coordinate")? },
                _ => return Err(CommandError::Usage("pick <x> <y>")),
            },
            "move" => match args.as_slice() {
                [left, top] => Self::Move { left: parse_arg(left, "coordinate")?, top: parse_arg(top, "coordinate")? },
                _ => return Err(CommandError::Usage("move <left> <top>")),
            },
            "drag" => {
                let (dx, dy, steps) = match args.as_slice() {
                    [dx, dy] => (dx, dy, DEFAULT_DRAG_STEPS),
                    [dx, dy, steps] => (dx, dy, parse_arg(steps, "step count")?),
                    _ => return Err(CommandError::Usage("drag <dx> <dy> [steps]")),
                };
                if steps == 0 || steps > MAX_DRAG_STEPS {
                    return Err(CommandError::InvalidArgument { what: "step count", value: steps.to_string() });
                }
                Self::Drag { dx: parse_arg(dx, "offset")?, dy: parse_arg(dy, "offset")?, steps }
            }
            "rename" => Self::Rename(rest.to_string()),
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

fn no_args(args: &[&str], usage: &'static str, command: Command) -> Result<Command, CommandError> {
    if args.is_empty() { Ok(command) } else { Err(CommandError::Usage(usage)) }
}

fn parse_arg<T: FromStr>(value: &str, what: &'static str) -> Result<T, CommandError> {
    value
        .parse()
        .map_err(|_| CommandError::InvalidArgument { what, value: value.to_string() })
}

#[cfg(test)]
#[path = "command_test.rs"]
mod tests;
