//! Error types for talking to VLC over telnet.

use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong between opening a session and parsing a reply.
#[derive(Debug, Error)]
pub enum Error {
    /// No running instance of the player was found.
    #[error("no running {0} instance")]
    ProcessUnavailable(String),

    #[error("could not connect to {addr}, make sure the telnet interface is on: {source}")]
    Connection {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// The server asked for the password again after we sent it.
    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// The lua interface reported an error while executing a command.
    #[error("script error: {0}")]
    Script(String),

    #[error("could not parse {0}")]
    Parse(String),

    #[error("invalid argument {0:?}: line breaks are not allowed")]
    InvalidArgument(String),

    #[error("connection closed before the prompt was received")]
    ConnectionClosed,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn parse(what: impl Into<String>) -> Self {
        Error::Parse(what.into())
    }

    /// Whether the session can keep being used after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::UnknownCommand(_)
                | Error::Script(_)
                | Error::Parse(_)
                | Error::InvalidArgument(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_level_errors_are_recoverable() {
        assert!(Error::UnknownCommand("x".into()).is_recoverable());
        assert!(Error::Script("Error in foo".into()).is_recoverable());
        assert!(Error::parse("status").is_recoverable());
        assert!(!Error::ConnectionClosed.is_recoverable());
        assert!(!Error::ProcessUnavailable("vlc".into()).is_recoverable());
    }

    #[test]
    fn connection_error_mentions_address() {
        let err = Error::Connection {
            addr: "localhost:4212".into(),
            source: io::Error::from(io::ErrorKind::ConnectionRefused),
        };
        assert!(err.to_string().contains("localhost:4212"));
    }
}
