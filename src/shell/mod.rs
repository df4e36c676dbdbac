//! Line-oriented command shell.
//!
//! Reads commands from any [`BufRead`], runs them against a
//! [`ConnectionRegistry`], and writes diagnostics to any [`Write`]. The
//! binary wires it to stdin and stdout.
//!
//! Input never makes the shell fail: malformed commands print a diagnostic
//! and the loop continues. Only I/O errors on the streams end it early.

// ============================================================================
// Submodules
// ============================================================================

/// Shell command parsing.
pub mod command;

// ============================================================================
// Imports
// ============================================================================

use std::io::{BufRead, Write};

use tracing::debug;

use crate::error::{Error, Result};
use crate::registry::ConnectionRegistry;

pub use command::{Command, DEFAULT_URI};

// ============================================================================
// Constants
// ============================================================================

/// Printed before every read.
pub const PROMPT: &str = "Enter Command: ";

const HELP: &str = "\
Command List:
connect [<ws uri>]
show <connection id>
send <connection id> <message>
close <connection id> [<close code> [<close reason>]]
list
help: Display this help text
quit: Exit the program";

// ============================================================================
// Shell
// ============================================================================

/// Interactive shell over a registry.
pub struct Shell<'a, R, W> {
    registry: &'a ConnectionRegistry,
    input: R,
    output: W,
}

impl<'a, R: BufRead, W: Write> Shell<'a, R, W> {
    /// Creates a shell reading from `input` and writing to `output`.
    pub fn new(registry: &'a ConnectionRegistry, input: R, output: W) -> Self {
        Self {
            registry,
            input,
            output,
        }
    }

    /// Runs until `quit` or end of input.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if reading input or writing output fails.
    pub fn run(&mut self) -> Result<()> {
        let mut line = String::new();

        loop {
            write!(self.output, "{PROMPT}")?;
            self.output.flush()?;

            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                debug!("End of input");
                writeln!(self.output)?;
                return Ok(());
            }

            match Command::parse(&line) {
                Ok(Some(Command::Quit)) => return Ok(()),
                Ok(Some(command)) => self.execute(command)?,
                Ok(None) => {}
                Err(Error::UnknownCommand { command }) => {
                    debug!(%command, "Unrecognized command");
                    writeln!(self.output, "Unrecognized Command")?;
                }
                Err(e) => writeln!(self.output, "> {e}")?,
            }
        }
    }

    /// Runs one command and prints its outcome.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if writing output fails.
    pub fn execute(&mut self, command: Command) -> Result<()> {
        let registry = self.registry;
        let out = &mut self.output;

        match command {
            Command::Connect { uri } => match registry.connect(&uri) {
                Ok(id) => writeln!(out, "> Created connection with id {id}")?,
                Err(e) => writeln!(out, "> Connect initialization error: {e}")?,
            },

            Command::Show { id } => match registry.snapshot(id) {
                Some(snapshot) => writeln!(out, "{snapshot}")?,
                None => writeln!(out, "> Unknown connection id {id}")?,
            },

            Command::Send { id, text } => match registry.send(id, &text) {
                Ok(()) => {}
                Err(e) if e.is_usage_error() => writeln!(out, "> {e}")?,
                Err(e) => writeln!(out, "> Error sending message: {e}")?,
            },

            Command::Close { id, code, reason } => match registry.close(id, code, &reason) {
                Ok(()) => {}
                Err(e) if e.is_usage_error() => writeln!(out, "> {e}")?,
                Err(e) => writeln!(out, "> Error initiating close: {e}")?,
            },

            Command::List => {
                let ids = registry.ids();
                if ids.is_empty() {
                    writeln!(out, "> No connections")?;
                }
                for snapshot in ids.into_iter().filter_map(|id| registry.snapshot(id)) {
                    writeln!(out, "> {}: {} {}", snapshot.id, snapshot.status, snapshot.uri)?;
                }
            }

            Command::Help => writeln!(out, "\n{HELP}\n")?,

            Command::Quit => {}
        }

        Ok(())
    }

    /// Consumes the shell and returns its output sink.
    pub fn into_output(self) -> W {
        self.output
    }
}

// ============================================================================
// Tests
// ============================================================================
