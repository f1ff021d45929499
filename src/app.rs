//! Terminal front end — login screen and main office screen.
//!
//! ARCHITECTURE
//! ============
//! One task drives the UI. On the main screen it selects over two sources:
//! lines of user input and notifications from the session's listeners.
//! Notifications are applied to the session as they arrive and mark the view
//! dirty; the floor plan is redrawn after the next command, so a burst of
//! remote changes costs one redraw.
//!
//! ```text
//!   stdin lines ──┐
//!                 ├─► run_office ──► OfficeSession ──► RealtimeStore
//!   listeners ────┘        │                │
//!                          ▼                └─► UpdateThrottle (40ms)
//!                     floor plan
//! ```
//!
//! ERROR HANDLING
//! ==============
//! Command and session errors are printed and the loop continues. Only I/O
//! errors on the terminal end the run.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tracing::{debug, warn};

use crate::command::{Command, HELP};
use crate::config::ConfigError;
use crate::model::{Floor, ThingKind};
use crate::render::{DEFAULT_COLS, DEFAULT_ROWS, describe, list, render_floor_plan};
use crate::session::{OfficeSession, SessionError};
use crate::store::{RealtimeStore, StoreError};

pub const AUTH_FAILED_NOTICE: &str = "Authentication failed. Please try again";

const LOGIN_HELP: &str = "\
commands:
  login                 sign in anonymously
  quit                  exit";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// What the main screen hands back to the login screen.
enum Exit {
    SignedOut,
    Quit,
}

/// Run the login screen, and the office screen after each successful login,
/// until the user quits or input ends.
///
/// # Errors
///
/// Returns `AppError::Io` if reading input or writing output fails.
pub async fn run<R, W>(store: Arc<dyn RealtimeStore>, throttle: Duration, input: R, out: &mut W) -> Result<(), AppError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    writeln!(out, "Office Mover. Type 'login' to enter the office.")?;

    loop {
        prompt(out, "login")?;
        let Some(line) = lines.next_line().await? else {
            return Ok(());
        };
        if line.trim().is_empty() {
            continue;
        }
        match line.parse::<Command>() {
            Ok(Command::Login) => match OfficeSession::open(Arc::clone(&store), throttle).await {
                Ok(session) => {
                    writeln!(out, "Signed in as {}.", session.auth().uid)?;
                    match run_office(session, &mut lines, out).await? {
                        Exit::SignedOut => writeln!(out, "Signed out.")?,
                        Exit::Quit => return Ok(()),
                    }
                }
                Err(SessionError::Auth(_)) => writeln!(out, "{AUTH_FAILED_NOTICE}")?,
                Err(e) => {
                    warn!(error = %e, "could not open office");
                    writeln!(out, "error: {e}")?;
                }
            },
            Ok(Command::Quit) => return Ok(()),
            Ok(Command::Help) => writeln!(out, "{LOGIN_HELP}")?,
            Ok(_) => writeln!(out, "Sign in first with 'login'.")?,
            Err(e) => writeln!(out, "error: {e}")?,
        }
    }
}

fn prompt<W: Write>(out: &mut W, screen: &str) -> std::io::Result<()> {
    write!(out, "{screen}> ")?;
    out.flush()
}

async fn run_office<R, W>(mut session: OfficeSession, lines: &mut Lines<R>, out: &mut W) -> Result<Exit, AppError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    session.apply_pending();
    draw(&session, out)?;
    let mut dirty = false;
    let mut listening = true;
    let mut prompted = false;

    loop {
        if !prompted {
            prompt(out, "office")?;
            prompted = true;
        }
        let line = tokio::select! {
            line = lines.next_line() => line,
            event = session.next_event(), if listening => {
                match event {
                    Some(event) => dirty |= session.apply(event),
                    None => {
                        warn!("store listeners closed");
                        listening = false;
                    }
                }
                continue;
            }
        };

        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => {
                session.close().await;
                return Ok(Exit::Quit);
            }
            Err(e) => {
                session.close().await;
                return Err(e.into());
            }
        };
        prompted = false;
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                writeln!(out, "error: {e}")?;
                continue;
            }
        };
        debug!(?command, "command");

        match command {
            Command::Logout => {
                session.close().await;
                return Ok(Exit::SignedOut);
            }
            Command::Quit => {
                session.close().await;
                return Ok(Exit::Quit);
            }
            Command::Show => {
                session.apply_pending();
                draw(&session, out)?;
                dirty = false;
            }
            other => match execute(&mut session, other, out).await {
                Ok(changed) => {
                    dirty |= session.apply_pending() | changed;
                    if dirty {
                        draw(&session, out)?;
                        dirty = false;
                    }
                }
                Err(CommandFailure::Session(e)) => writeln!(out, "error: {e}")?,
                Err(CommandFailure::Io(e)) => {
                    session.close().await;
                    return Err(e.into());
                }
            },
        }
    }
}

/// Perform one main-screen command. Returns whether local state changed.
async fn execute<W: Write>(session: &mut OfficeSession, command: Command, out: &mut W) -> Result<bool, CommandFailure> {
    match command {
        Command::Login => {
            writeln!(out, "Already signed in.")?;
            Ok(false)
        }
        Command::Help => {
            writeln!(out, "{HELP}")?;
            Ok(false)
        }
        Command::Menu => {
            for item in session.menu() {
                writeln!(out, "  {:<14} {}", item.label(), item.command_hint())?;
            }
            Ok(false)
        }
        Command::Kinds => {
            let names: Vec<&str> = ThingKind::ALL.iter().map(|k| k.as_str()).collect();
            writeln!(out, "{}", names.join(" "))?;
            Ok(false)
        }
        Command::Floors => {
            let names: Vec<&str> = Floor::ALL.iter().map(|f| f.as_str()).collect();
            writeln!(out, "{}", names.join(" "))?;
            Ok(false)
        }
        Command::List => {
            write!(out, "{}", list(session.layout(), session.selected_key()))?;
            Ok(false)
        }
        Command::New(kind) => {
            let key = session.add_thing(kind).await;
            writeln!(out, "Added {kind} {key}.")?;
            Ok(false)
        }
        Command::Floor(floor) => {
            session.change_floor(floor).await;
            Ok(false)
        }
        Command::Select(prefix) => {
            let key = session
                .layout()
                .resolve_key(&prefix)
                .map(str::to_string)
                .ok_or(SessionError::UnknownThing(prefix))?;
            let thing = session.select(&key)?;
            writeln!(out, "{}", describe(thing, true))?;
            Ok(true)
        }
        Command::Pick { x, y } => {
            match session.select_at(x, y) {
                Some(thing) => writeln!(out, "{}", describe(thing, true))?,
                None => writeln!(out, "Nothing at ({x}, {y}).")?,
            }
            Ok(true)
        }
        Command::Deselect => {
            session.deselect();
            Ok(true)
        }
        Command::Move { left, top } => {
            session.move_selected(left, top)?;
            Ok(true)
        }
        Command::Drag { dx, dy, steps } => {
            drag(session, dx, dy, steps)?;
            Ok(true)
        }
        Command::Rotate => {
            session.rotate_selected().await?;
            Ok(true)
        }
        Command::Rename(name) => {
            session.rename_selected(&name).await?;
            Ok(true)
        }
        Command::Delete => {
            session.delete_selected().await?;
            Ok(true)
        }
        Command::Logout | Command::Quit | Command::Show => Ok(false),
    }
}

/// Replay a drag as `steps` pointer moves ending at the full offset.
fn drag(session: &mut OfficeSession, dx: i32, dy: i32, steps: u32) -> Result<(), SessionError> {
    let (left, top) = session
        .selected()
        .map(|thing| (thing.left, thing.top))
        .ok_or(SessionError::NoSelection)?;
    for step in 1..=steps {
        session.move_selected(
            left.saturating_add(step_offset(dx, step, steps)),
            top.saturating_add(step_offset(dy, step, steps)),
        )?;
    }
    debug!(dx, dy, steps, "drag recorded");
    Ok(())
}

fn step_offset(delta: i32, step: u32, steps: u32) -> i32 {
    let offset = i64::from(delta) * i64::from(step) / i64::from(steps.max(1));
    i32::try_from(offset).unwrap_or(delta)
}

fn draw<W: Write>(session: &OfficeSession, out: &mut W) -> std::io::Result<()> {
    let plan = render_floor_plan(session.layout(), session.floor(), session.selected_key(), DEFAULT_COLS, DEFAULT_ROWS);
    write!(out, "{plan}")?;
    writeln!(out, "floor: {}  things: {}", session.floor(), session.layout().len())?;
    if let Some(thing) = session.selected() {
        writeln!(out, "{}", describe(thing, true))?;
    }
    Ok(())
}

/// A command either failed in the session or could not write its output.
#[derive(Debug, thiserror::Error)]
enum CommandFailure {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
#[path = "app_test.rs"]
mod tests;
