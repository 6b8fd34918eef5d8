//! A line-oriented frontend that displays a [`Window`] on the terminal.
//!
//! The window is printed as text with its clickable widgets numbered. Each
//! line of input is a [`Command`]. Input is read on its own thread and every
//! command is posted to the [`EventLoop`], so widgets are only ever touched
//! from the loop's thread.

use std::io::{self, BufRead};
use std::str::FromStr;
use std::sync::Arc;
use std::thread;

use parking_lot::{Condvar, Mutex};
use tracing::{debug, error};

use crate::app::{EventLoop, EventLoopProxy};
use crate::dialog::{DialogPresenter, MessageBox, MessageLevel};
use crate::window::Window;

const HELP: &str = "\
commands:
  <number>     click the button with that number
  show         redraw the window (an empty line works too)
  help         show this list
  quit, q      exit
";

/// A line of terminal input.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Command {
    /// Click the clickable widget with this number, starting at 1.
    Click(usize),
    /// Redraw the window.
    Show,
    /// List the available commands.
    Help,
    /// Exit the application.
    Quit,
}

/// Input that is not a [`Command`].
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
#[error("unknown command {0:?}, type `help` for a list of commands")]
pub struct UnknownCommand(pub String);

impl FromStr for Command {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "show" => Ok(Self::Show),
            "help" | "?" => Ok(Self::Help),
            "quit" | "q" => Ok(Self::Quit),
            other => match other.parse::<usize>() {
                Ok(number) if number > 0 => Ok(Self::Click(number)),
                _ => Err(UnknownCommand(other.to_string())),
            },
        }
    }
}

/// Executes `command` against `window` and returns the text to print.
#[must_use]
pub fn apply(window: &Window, command: Command) -> String {
    match command {
        Command::Click(number) => {
            let Some(widget) = number
                .checked_sub(1)
                .and_then(|index| window.clickable_widgets().into_iter().nth(index))
            else {
                return format!("there is no button numbered {number}\n");
            };
            debug!(id = %widget.id(), text = %widget.text(), "clicking");
            widget.click();
            window.render()
        }
        Command::Show => window.render(),
        Command::Help => HELP.to_string(),
        Command::Quit => String::new(),
    }
}

/// Presents message boxes on the terminal.
///
/// [`present()`](DialogPresenter::present) blocks until another thread calls
/// [`dismiss()`](Self::dismiss).
#[derive(Debug, Default)]
pub struct TerminalDialogs {
    state: Mutex<DialogState>,
    changed: Condvar,
}

#[derive(Debug, Default)]
struct DialogState {
    open: bool,
    running_commands: usize,
}

impl TerminalDialogs {
    /// Returns a presenter with no open message.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true while a message is waiting to be dismissed.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state.lock().open
    }

    /// Dismisses the open message, if any. Returns true if a message was
    /// open.
    pub fn dismiss(&self) -> bool {
        let mut state = self.state.lock();
        let was_open = std::mem::replace(&mut state.open, false);
        if was_open {
            self.changed.notify_all();
        }
        was_open
    }

    /// Blocks until every posted command has finished or one of them has
    /// opened a message.
    fn wait_for_input(&self) {
        let mut state = self.state.lock();
        while state.running_commands > 0 && !state.open {
            self.changed.wait(&mut state);
        }
    }
}

impl DialogPresenter for TerminalDialogs {
    fn present(&self, message: &MessageBox) {
        let mut state = self.state.lock();
        state.open = true;
        self.changed.notify_all();

        let marker = match message.level() {
            MessageLevel::Info => "*",
            MessageLevel::Warning => "!",
            MessageLevel::Error => "x",
        };
        println!("{marker}{marker}{marker} {} {marker}{marker}{marker}", message.text());
        if !message.explanation().is_empty() {
            println!("{}", message.explanation());
        }
        println!("(press enter to dismiss)");

        while state.open {
            self.changed.wait(&mut state);
        }
    }
}

/// A command that has been handed to the event loop. Dropping it, whether
/// after running or unexecuted, marks it finished.
struct RunningCommand(Arc<TerminalDialogs>);

impl RunningCommand {
    fn start(dialogs: &Arc<TerminalDialogs>) -> Self {
        dialogs.state.lock().running_commands += 1;
        Self(dialogs.clone())
    }
}

impl Drop for RunningCommand {
    fn drop(&mut self) {
        let mut state = self.0.state.lock();
        state.running_commands = state.running_commands.saturating_sub(1);
        self.0.changed.notify_all();
    }
}

/// Runs a [`Window`] on the terminal.
#[derive(Debug)]
pub struct Terminal {
    window: Window,
    event_loop: EventLoop,
    dialogs: Arc<TerminalDialogs>,
}

impl Terminal {
    /// Returns a frontend that displays `window`, runs commands on
    /// `event_loop`, and routes input to `dialogs` while a message is open.
    pub fn new(window: Window, event_loop: EventLoop, dialogs: Arc<TerminalDialogs>) -> Self {
        Self {
            window,
            event_loop,
            dialogs,
        }
    }

    /// Displays the window and processes commands from standard input until
    /// `quit` is entered or the input ends.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if the thread reading standard
    /// input cannot be spawned.
    pub fn run(self) -> crate::Result {
        print!("{}", self.window.render());

        let proxy = self.event_loop.proxy();
        let window = self.window.clone();
        let dialogs = self.dialogs.clone();
        thread::Builder::new()
            .name(String::from("stdin"))
            .spawn(move || {
                let stdin = io::stdin();
                if let Err(err) = read_commands(stdin.lock(), &window, &dialogs, &proxy) {
                    error!(%err, "stopped reading commands");
                }
            })?;

        self.event_loop.run();
        Ok(())
    }
}

/// Reads commands from `input`, posting each one to the event loop.
///
/// Exit is requested once `quit` is read, `input` ends, or reading fails.
fn read_commands(
    input: impl BufRead,
    window: &Window,
    dialogs: &Arc<TerminalDialogs>,
    event_loop: &EventLoopProxy,
) -> crate::Result {
    let result = forward_commands(input, window, dialogs, event_loop);
    let exit = event_loop.exit();
    result?;
    exit?;
    Ok(())
}

/// Lines read while a message is open dismiss it instead of being parsed.
/// After posting a command, the next line is not read until the command has
/// finished or opened a message.
fn forward_commands(
    mut input: impl BufRead,
    window: &Window,
    dialogs: &Arc<TerminalDialogs>,
    event_loop: &EventLoopProxy,
) -> crate::Result {
    let mut line = Vec::new();
    loop {
        line.clear();
        if input.read_until(b'\n', &mut line)? == 0 {
            return Ok(());
        }
        if dialogs.dismiss() {
            continue;
        }
        match String::from_utf8_lossy(&line).parse::<Command>() {
            Ok(Command::Quit) => return Ok(()),
            Ok(command) => {
                let window = window.clone();
                let running = RunningCommand::start(dialogs);
                event_loop.post(move || {
                    print!("{}", apply(&window, command));
                    drop(running);
                })?;
                dialogs.wait_for_input();
            }
            Err(err) => println!("{err}"),
        }
    }
}
