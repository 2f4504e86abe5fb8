//! The telnet session: connect, log in, and run commands.

use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

use crate::error::{Error, Result};
use crate::framing::{split_lines, Framed, PASSWORD_PROMPT, PROMPT};
use crate::process::{Pidof, ProcessProbe};

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 4212;
pub const DEFAULT_PASSWORD: &str = "admin";

static UNKNOWN_COMMAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Unknown command [`'].*'\. Type [`']help' for help\.")
        .expect("unknown command pattern is valid")
});

static SCRIPT_ERROR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Error in.*").expect("script error pattern is valid"));

/// Where and how to connect.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub host: String,
    pub port: u16,
    pub password: String,
    /// Upper bound on each socket read. `None` blocks until the prompt arrives.
    pub read_timeout: Option<Duration>,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            password: DEFAULT_PASSWORD.to_string(),
            read_timeout: None,
        }
    }
}

/// A logged-in connection to the VLC telnet interface.
///
/// The protocol is strictly request/reply: each call writes one command and
/// blocks until the server prints its prompt. There are no request ids, so
/// threads sharing a session must serialise calls behind a mutex.
#[derive(Debug)]
pub struct Session<S = TcpStream> {
    stream: Framed<S>,
}

impl Session<TcpStream> {
    /// Connects to `host:port` after checking that a local `vlc` process is
    /// running.
    pub fn open(host: &str, password: &str, port: u16) -> Result<Self> {
        Self::open_with(host, password, port, &Pidof::default())
    }

    /// Like [`Session::open`], with the liveness check supplied by the caller.
    pub fn open_with(
        host: &str,
        password: &str,
        port: u16,
        probe: &impl ProcessProbe,
    ) -> Result<Self> {
        Self::connect(
            &ConnectOptions {
                host: host.to_string(),
                port,
                password: password.to_string(),
                read_timeout: None,
            },
            probe,
        )
    }

    pub fn connect(options: &ConnectOptions, probe: &impl ProcessProbe) -> Result<Self> {
        if !probe.is_running() {
            return Err(Error::ProcessUnavailable(probe.name().to_string()));
        }

        let addr = format!("{}:{}", options.host, options.port);
        let stream = TcpStream::connect((options.host.as_str(), options.port)).map_err(|source| {
            Error::Connection {
                addr: addr.clone(),
                source,
            }
        })?;
        stream.set_read_timeout(options.read_timeout)?;
        log::debug!("connected to {}", addr);

        Self::login(stream, &options.password)
    }

    pub fn peer_addr(&self) -> io::Result<std::net::SocketAddr> {
        self.stream.get_ref().peer_addr()
    }
}

impl<S: Read + Write> Session<S> {
    /// Performs the password handshake on an already connected stream.
    pub fn login(stream: S, password: &str) -> Result<Self> {
        let mut session = Self {
            stream: Framed::new(stream),
        };
        session
            .stream
            .read_until(PASSWORD_PROMPT)
            .map_err(eof_is_closed)?;
        check_argument(password)?;

        log::debug!("logging in");
        let (lines, which) = session.exchange(password, &[PROMPT, PASSWORD_PROMPT])?;
        if which == 1 {
            return Err(Error::AuthenticationFailed);
        }
        classify(lines)?;
        Ok(session)
    }

    /// Sends one command and returns the reply lines, without the prompt.
    ///
    /// Only the first line is checked for an error report.
    pub fn run_command(&mut self, command: &str) -> Result<Vec<String>> {
        check_argument(command)?;
        log::debug!("> {}", command);
        let (lines, _) = self.exchange(command, &[PROMPT])?;
        classify(lines)
    }

    fn exchange(&mut self, command: &str, markers: &[&[u8]]) -> Result<(Vec<String>, usize)> {
        let writer = self.stream.get_mut();
        writer.write_all(command.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        let (body, which) = self.stream.read_until_any(markers).map_err(eof_is_closed)?;
        let lines = split_lines(&body);
        for line in &lines {
            log::trace!("< {}", line);
        }
        Ok((lines, which))
    }

    pub fn get_ref(&self) -> &S {
        self.stream.get_ref()
    }

    pub fn into_inner(self) -> S {
        self.stream.into_inner()
    }
}

/// Turns an error report on the first line into an [`Error`].
fn classify(lines: Vec<String>) -> Result<Vec<String>> {
    let Some(first) = lines.first() else {
        return Ok(lines);
    };
    if UNKNOWN_COMMAND.is_match(first) {
        return Err(Error::UnknownCommand(first.clone()));
    }
    if let Some(found) = SCRIPT_ERROR.find(first) {
        return Err(Error::Script(found.as_str().to_string()));
    }
    Ok(lines)
}

/// Rejects text that would end the command line early.
pub(crate) fn check_argument(text: &str) -> Result<()> {
    if text.contains(['\r', '\n']) {
        return Err(Error::InvalidArgument(text.to_string()));
    }
    Ok(())
}

fn eof_is_closed(e: io::Error) -> Error {
    match e.kind() {
        io::ErrorKind::UnexpectedEof => Error::ConnectionClosed,
        _ => Error::Io(e),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// An in-memory duplex stream: reads come from a script, writes are kept.
    #[derive(Debug)]
    pub(crate) struct Scripted {
        input: io::Cursor<Vec<u8>>,
        pub(crate) written: Vec<u8>,
    }

    impl Scripted {
        pub(crate) fn new(input: &[u8]) -> Self {
            Self {
                input: io::Cursor::new(input.to_vec()),
                written: Vec::new(),
            }
        }

        pub(crate) fn sent(&self) -> String {
            String::from_utf8_lossy(&self.written).into_owned()
        }
    }

    impl Read for Scripted {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            // small reads so prompts land on chunk boundaries
            let n = buf.len().min(3);
            self.input.read(&mut buf[..n])
        }
    }

    impl Write for Scripted {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    pub(crate) const GREETING: &[u8] =
        b"VLC media player 3.0.18 Vetinari\nPassword: \xff\xfb\x01\xff\xfc\x01\r\nWelcome, Master\r\n> ";

    pub(crate) fn session(replies: &[u8]) -> Session<Scripted> {
        let mut script = GREETING.to_vec();
        script.extend_from_slice(replies);
        Session::login(Scripted::new(&script), "admin").unwrap()
    }

    #[test]
    fn login_sends_password() {
        let session = session(b"");
        assert_eq!(session.get_ref().sent(), "admin\n");
    }

    #[test]
    fn wrong_password() {
        let script = b"Password: \r\nWrong password\r\nPassword: ";
        let err = Session::login(Scripted::new(script), "nope").unwrap_err();
        assert!(matches!(err, Error::AuthenticationFailed));
    }

    #[test]
    fn closed_before_prompt() {
        let err = Session::login(Scripted::new(b"VLC media player"), "admin").unwrap_err();
        assert!(matches!(err, Error::ConnectionClosed));
    }

    #[test]
    fn run_command_returns_lines_without_prompt() {
        let mut session = session(b"( audio volume: 256 )\r\n( state stopped )\r\n> ");
        let lines = session.run_command("status").unwrap();
        assert_eq!(lines, vec!["( audio volume: 256 )", "( state stopped )"]);
        assert!(session.get_ref().sent().ends_with("status\n"));
    }

    #[test]
    fn empty_reply_is_not_an_error() {
        let mut session = session(b"> ");
        assert!(session.run_command("play").unwrap().is_empty());
    }

    #[test]
    fn unknown_command_ignores_later_lines() {
        let mut session = session(
            b"Unknown command `bogus'. Type `help' for help.\r\nmore\r\n> ( state stopped )\r\n> ",
        );
        let err = session.run_command("bogus").unwrap_err();
        assert!(matches!(err, Error::UnknownCommand(_)));
        // session is still usable
        assert_eq!(session.run_command("state").unwrap(), vec!["( state stopped )"]);
    }

    #[test]
    fn script_error_carries_detail() {
        let mut session = session(b"Error in `seek x' x is not a number\r\n> ");
        match session.run_command("seek x") {
            Err(Error::Script(detail)) => {
                assert_eq!(detail, "Error in `seek x' x is not a number")
            }
            other => panic!("expected script error, got {other:?}"),
        }
    }

    #[test]
    fn errors_only_detected_on_first_line() {
        let mut session = session(b"fine\r\nError in nothing\r\n> ");
        assert_eq!(
            session.run_command("help").unwrap(),
            vec!["fine", "Error in nothing"]
        );
    }

    #[test]
    fn line_breaks_are_rejected() {
        let mut session = session(b"");
        let err = session.run_command("add a\nshutdown").unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert_eq!(session.get_ref().sent(), "admin\n");
    }

    #[test]
    fn classify_empty() {
        assert!(classify(Vec::new()).unwrap().is_empty());
    }
}
