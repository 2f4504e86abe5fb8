//! Response framing.
//!
//! The telnet interface has no length prefix: a reply ends when the server
//! prints its prompt. [`Framed`] reads the stream in chunks and scans for the
//! prompt, which may straddle two reads. Telnet option negotiation (sent by
//! VLC around the password prompt) and subnegotiation blocks are filtered out
//! before scanning.

use std::io::{self, Read};

/// Terminates every response.
pub const PROMPT: &[u8] = b"> ";
/// Sent once on connect, and again after a wrong password.
pub const PASSWORD_PROMPT: &[u8] = b"Password: ";

const CHUNK_SIZE: usize = 1024;

const IAC: u8 = 0xff;
const SE: u8 = 0xf0;
const SB: u8 = 0xfa;
const WILL: u8 = 0xfb;
const DONT: u8 = 0xfe;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Telnet {
    Data,
    Iac,
    Option,
    /// Inside `IAC SB ... IAC SE`.
    Sub,
    SubIac,
}

/// A stream wrapper that yields everything up to the next marker.
///
/// Bytes that arrive after a marker stay buffered for the next call.
#[derive(Debug)]
pub struct Framed<S> {
    inner: S,
    pending: Vec<u8>,
    telnet: Telnet,
}

impl<S> Framed<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            pending: Vec::new(),
            telnet: Telnet::Data,
        }
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    fn push_filtered(&mut self, chunk: &[u8]) {
        for &byte in chunk {
            self.telnet = match (self.telnet, byte) {
                (Telnet::Data, IAC) => Telnet::Iac,
                (Telnet::Data, _) => {
                    self.pending.push(byte);
                    Telnet::Data
                }
                // escaped 0xff
                (Telnet::Iac, IAC) => {
                    self.pending.push(IAC);
                    Telnet::Data
                }
                (Telnet::Iac, SB) => Telnet::Sub,
                (Telnet::Iac, WILL..=DONT) => Telnet::Option,
                (Telnet::Iac, _) => Telnet::Data,
                (Telnet::Option, _) => Telnet::Data,
                (Telnet::Sub, IAC) => Telnet::SubIac,
                (Telnet::Sub, _) => Telnet::Sub,
                (Telnet::SubIac, SE) => Telnet::Data,
                (Telnet::SubIac, _) => Telnet::Sub,
            };
        }
    }
}

impl<S: Read> Framed<S> {
    /// Reads until `marker` and returns the bytes before it.
    pub fn read_until(&mut self, marker: &[u8]) -> io::Result<Vec<u8>> {
        self.read_until_any(&[marker]).map(|(body, _)| body)
    }

    /// Reads until the first of `markers` appears in the stream.
    ///
    /// Returns the bytes before the marker together with the index of the
    /// marker that matched. The marker itself is consumed.
    pub fn read_until_any(&mut self, markers: &[&[u8]]) -> io::Result<(Vec<u8>, usize)> {
        let longest = markers.iter().map(|m| m.len()).max().unwrap_or(0);
        if longest == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "empty frame marker",
            ));
        }

        let mut scanned = 0;
        let mut chunk = [0u8; CHUNK_SIZE];
        loop {
            if let Some((at, which)) = find_first(&self.pending, scanned, markers) {
                let body = self.pending.drain(..at).collect();
                self.pending.drain(..markers[which].len());
                return Ok((body, which));
            }
            // Keep enough of the tail to catch a marker split across reads.
            scanned = self.pending.len().saturating_sub(longest - 1);

            let n = match self.inner.read(&mut chunk) {
                Ok(0) => return Err(io::ErrorKind::UnexpectedEof.into()),
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            self.push_filtered(&chunk[..n]);
        }
    }
}

fn find_first(haystack: &[u8], from: usize, markers: &[&[u8]]) -> Option<(usize, usize)> {
    markers
        .iter()
        .enumerate()
        .filter(|(_, marker)| !marker.is_empty())
        .filter_map(|(which, marker)| {
            haystack
                .get(from..)?
                .windows(marker.len())
                .position(|window| window == *marker)
                .map(|at| (at + from, which))
        })
        .min_by_key(|&(at, _)| at)
}

/// Splits a response body into lines.
///
/// The final segment is where the prompt sat and is always dropped, so a body
/// ending in CRLF yields no trailing empty line and an empty body yields none.
pub fn split_lines(body: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(body);
    let mut lines: Vec<String> = text.split("\r\n").map(str::to_owned).collect();
    lines.pop();
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hands out the scripted chunks one `read` at a time.
    struct Chunked {
        chunks: Vec<Vec<u8>>,
    }

    impl Chunked {
        fn new(chunks: &[&[u8]]) -> Self {
            Self {
                chunks: chunks.iter().rev().map(|c| c.to_vec()).collect(),
            }
        }
    }

    impl Read for Chunked {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.chunks.pop() {
                Some(chunk) => {
                    let n = chunk.len().min(buf.len());
                    buf[..n].copy_from_slice(&chunk[..n]);
                    if n < chunk.len() {
                        self.chunks.push(chunk[n..].to_vec());
                    }
                    Ok(n)
                }
                None => Ok(0),
            }
        }
    }

    #[test]
    fn finds_marker_in_single_read() {
        let mut framed = Framed::new(Chunked::new(&[b"one\r\ntwo\r\n> "]));
        assert_eq!(framed.read_until(PROMPT).unwrap(), b"one\r\ntwo\r\n");
    }

    #[test]
    fn finds_marker_split_across_reads() {
        let mut framed = Framed::new(Chunked::new(&[b"status\r\n>", b" "]));
        assert_eq!(framed.read_until(PROMPT).unwrap(), b"status\r\n");
    }

    #[test]
    fn byte_at_a_time() {
        let input = b"Password: \r\nWelcome, Master\r\n> ";
        let chunks: Vec<&[u8]> = input.chunks(1).collect();
        let mut framed = Framed::new(Chunked::new(&chunks));
        assert_eq!(framed.read_until(PASSWORD_PROMPT).unwrap(), b"");
        assert_eq!(
            framed.read_until(PROMPT).unwrap(),
            b"\r\nWelcome, Master\r\n"
        );
    }

    #[test]
    fn keeps_bytes_after_marker() {
        let mut framed = Framed::new(Chunked::new(&[b"a\r\n> b\r\n> "]));
        assert_eq!(framed.read_until(PROMPT).unwrap(), b"a\r\n");
        assert_eq!(framed.read_until(PROMPT).unwrap(), b"b\r\n");
    }

    #[test]
    fn eof_before_marker_is_an_error() {
        let mut framed = Framed::new(Chunked::new(&[b"no prompt here"]));
        let err = framed.read_until(PROMPT).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn earliest_marker_wins() {
        let mut framed = Framed::new(Chunked::new(&[b"Wrong password\r\nPassword: "]));
        let (body, which) = framed.read_until_any(&[PROMPT, PASSWORD_PROMPT]).unwrap();
        assert_eq!(which, 1);
        assert_eq!(body, b"Wrong password\r\n");
    }

    #[test]
    fn strips_telnet_negotiation() {
        let mut framed = Framed::new(Chunked::new(&[
            b"Password: \xff\xfb\x01",
            b"\xff",
            b"\xfc\x01\r\nWelcome, Master\r\n> ",
        ]));
        assert_eq!(framed.read_until(PASSWORD_PROMPT).unwrap(), b"");
        assert_eq!(
            framed.read_until(PROMPT).unwrap(),
            b"\r\nWelcome, Master\r\n"
        );
    }

    #[test]
    fn strips_subnegotiation() {
        let mut framed = Framed::new(Chunked::new(&[
            b"a\xff\xfa\x18\x01",
            b"xterm\xff\xff\xff",
            b"\xf0b> ",
        ]));
        assert_eq!(framed.read_until(PROMPT).unwrap(), b"ab");
    }

    #[test]
    fn escaped_iac_is_data() {
        let mut framed = Framed::new(Chunked::new(&[b"x\xff\xffy> "]));
        assert_eq!(framed.read_until(PROMPT).unwrap(), b"x\xffy");
    }

    #[test]
    fn split_drops_final_segment() {
        assert_eq!(split_lines(b"a\r\nb\r\n"), vec!["a", "b"]);
        assert_eq!(split_lines(b"\r\nWelcome\r\n"), vec!["", "Welcome"]);
        assert!(split_lines(b"").is_empty());
    }
}
