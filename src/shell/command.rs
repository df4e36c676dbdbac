//! Shell command parsing.
//!
//! | Command | Arguments |
//! |---------|-----------|
//! | `connect` | `[<uri>]` |
//! | `show` | `<id>` |
//! | `send` | `<id> <text>` |
//! | `close` | `<id> [<code> [<reason>]]` |
//! | `list` | |
//! | `help` | |
//! | `quit` | |

// ============================================================================
// Imports
// ============================================================================

use crate::error::{Error, Result};
use crate::identifiers::ConnectionId;
use crate::protocol::close;

// ============================================================================
// Constants
// ============================================================================

/// URI used by `connect` without an argument.
pub const DEFAULT_URI: &str = "wss://ws.vi-server.org/mirror";

// ============================================================================
// Command
// ============================================================================

/// One parsed shell line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Open a connection.
    Connect {
        /// Target URI.
        uri: String,
    },
    /// Print a connection snapshot.
    Show {
        id: ConnectionId,
    },
    /// Send a text message.
    Send {
        id: ConnectionId,
        /// Remainder of the line after the id.
        text: String,
    },
    /// Start a closing handshake.
    Close {
        id: ConnectionId,
        code: u16,
        reason: String,
    },
    /// Print every connection.
    List,
    /// Print the command list.
    Help,
    /// Leave the shell.
    Quit,
}

impl Command {
    /// Parses one input line.
    ///
    /// Returns `Ok(None)` for a blank line.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownCommand`] for an unrecognized command word
    /// - [`Error::InvalidArgument`] for a missing or malformed argument
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim_end_matches(['\r', '\n']).trim_start();
        if line.trim().is_empty() {
            return Ok(None);
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest),
            None => (line, ""),
        };

        let command = match word {
            "connect" => {
                let uri = match rest.trim() {
                    "" => DEFAULT_URI,
                    uri => uri,
                };
                Self::Connect {
                    uri: uri.to_owned(),
                }
            }

            "show" => Self::Show {
                id: parse_id(rest.trim())?,
            },

            "send" => {
                let (id, text) = split_word(rest.trim_start());
                Self::Send {
                    id: parse_id(id)?,
                    text: text.to_owned(),
                }
            }

            "close" => {
                let (id, rest) = split_word(rest.trim_start());
                let id = parse_id(id)?;
                let (code, reason) = split_word(rest.trim_start());
                let code = if code.is_empty() {
                    close::NORMAL
                } else {
                    parse_code(code)?
                };
                Self::Close {
                    id,
                    code,
                    reason: reason.to_owned(),
                }
            }

            "list" => Self::List,
            "help" => Self::Help,
            "quit" => Self::Quit,
            other => return Err(Error::unknown_command(other)),
        };

        Ok(Some(command))
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Splits off the first word; the remainder loses exactly one separator.
fn split_word(input: &str) -> (&str, &str) {
    input
        .split_once(char::is_whitespace)
        .unwrap_or((input, ""))
}

fn parse_id(token: &str) -> Result<ConnectionId> {
    if token.is_empty() {
        return Err(Error::invalid_argument("missing connection id"));
    }
    token
        .parse()
        .map_err(|_| Error::invalid_argument(format!("'{token}' is not a connection id")))
}

fn parse_code(token: &str) -> Result<u16> {
    token
        .parse()
        .map_err(|_| Error::invalid_argument(format!("'{token}' is not a close code")))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    fn parse(line: &str) -> Command {
        Command::parse(line).expect("valid").expect("not blank")
    }

    #[test]
    fn test_tab_separated_arguments() {
        assert_eq!(
            parse("send 0\thello"),
            Command::Send {
                id: ConnectionId::new(0),
                text: "hello".into()
            }
        );
        assert_eq!(
            parse("close\t2\t4000\tbye now"),
            Command::Close {
                id: ConnectionId::new(2),
                code: 4000,
                reason: "bye now".into()
            }
        );
        assert_eq!(
            parse("close 1\t1001"),
            Command::Close {
                id: ConnectionId::new(1),
                code: 1001,
                reason: String::new()
            }
        );
    }

    #[test]
    fn test_connect_default_and_explicit() {
        assert_eq!(
            parse("connect"),
            Command::Connect {
                uri: DEFAULT_URI.into()
            }
        );
        assert_eq!(
            parse("connect ws://127.0.0.1:9001/\n"),
            Command::Connect {
                uri: "ws://127.0.0.1:9001/".into()
            }
        );
    }

    #[test]
    fn test_send_keeps_text_spacing() {
        assert_eq!(
            parse("send 3 hello  world "),
            Command::Send {
                id: ConnectionId::new(3),
                text: "hello  world ".into()
            }
        );
        assert_eq!(
            parse("send 0"),
            Command::Send {
                id: ConnectionId::new(0),
                text: String::new()
            }
        );
    }

    #[test]
    fn test_close_defaults() {
        assert_eq!(
            parse("close 1"),
            Command::Close {
                id: ConnectionId::new(1),
                code: close::NORMAL,
                reason: String::new()
            }
        );
        assert_eq!(
            parse("close 1 1001 shutting down"),
            Command::Close {
                id: ConnectionId::new(1),
                code: 1001,
                reason: "shutting down".into()
            }
        );
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(parse("list"), Command::List);
        assert_eq!(parse("help\r\n"), Command::Help);
        assert_eq!(parse("  quit"), Command::Quit);
        assert_eq!(Command::parse("   \n").expect("blank"), None);
    }

    #[test]
    fn test_unknown_command() {
        let err = Command::parse("launch 1").unwrap_err();
        assert!(matches!(err, Error::UnknownCommand { ref command } if command == "launch"));
        // Commands are case-sensitive
        assert!(Command::parse("QUIT").is_err());
    }

    #[test]
    fn test_malformed_arguments() {
        for line in ["show", "show abc", "send", "send x hi", "close", "close 1 normal"] {
            let err = Command::parse(line).unwrap_err();
            assert!(matches!(err, Error::InvalidArgument { .. }), "{line}: {err}");
        }
        assert_eq!(
            Command::parse("show -1").unwrap_err().to_string(),
            "Invalid argument: '-1' is not a connection id"
        );
    }

    proptest! {
        #[test]
        fn prop_parse_never_panics(line in ".{0,64}") {
            let _ = Command::parse(&line);
        }

        #[test]
        fn prop_send_roundtrips_text(id in any::<u64>(), text in "[a-zA-Z0-9 ]{0,32}") {
            let parsed = Command::parse(&format!("send {id} {text}")).expect("valid");
            prop_assert_eq!(
                parsed,
                Some(Command::Send { id: ConnectionId::new(id), text })
            );
        }
    }
}
