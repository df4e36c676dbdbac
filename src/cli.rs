//! Command-line interface definitions.
//!
//! Uses clap's derive API for type-safe argument parsing.

use std::time::Duration;

use clap::{ArgAction, Parser};

use crate::registry::RegistryBuilder;
use crate::transport::event_loop::DEFAULT_THREAD_NAME;
use crate::transport::options::{DEFAULT_CLOSE_HANDSHAKE_TIMEOUT, DEFAULT_OPEN_HANDSHAKE_TIMEOUT};

/// Interactive client for many concurrent WebSocket connections.
///
/// Reads commands from stdin (`help` lists them). All connections share
/// one background I/O thread.
#[derive(Parser, Debug)]
#[command(name = "ws-utility-client")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// URIs to connect to before the shell starts.
    #[arg(value_name = "URI")]
    pub connect: Vec<String>,

    /// Opening handshake timeout in milliseconds.
    #[arg(long, value_name = "MS", default_value_t = millis(DEFAULT_OPEN_HANDSHAKE_TIMEOUT))]
    pub handshake_timeout_ms: u64,

    /// Closing handshake timeout in milliseconds.
    #[arg(long, value_name = "MS", default_value_t = millis(DEFAULT_CLOSE_HANDSHAKE_TIMEOUT))]
    pub close_timeout_ms: u64,

    /// Maximum incoming message size in bytes.
    #[arg(long, value_name = "BYTES")]
    pub max_message_size: Option<usize>,

    /// Name of the I/O thread.
    #[arg(long, value_name = "NAME", default_value = DEFAULT_THREAD_NAME)]
    pub thread_name: String,

    /// Increase log verbosity (-v debug, -vv trace). Logs go to stderr.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Converts the flags into a registry builder.
    #[must_use]
    pub fn registry_builder(&self) -> RegistryBuilder {
        let mut builder = RegistryBuilder::new()
            .thread_name(&self.thread_name)
            .open_handshake_timeout(Duration::from_millis(self.handshake_timeout_ms))
            .close_handshake_timeout(Duration::from_millis(self.close_timeout_ms));

        if let Some(bytes) = self.max_message_size {
            builder = builder.max_message_size(bytes);
        }

        builder
    }

    /// Returns the log filter directive for the verbosity level.
    #[must_use]
    pub fn log_directive(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    }
}

const fn millis(duration: Duration) -> u64 {
    duration.as_secs() * 1000 + duration.subsec_millis() as u64
}

// ============================================================================
// Tests
// ============================================================================
