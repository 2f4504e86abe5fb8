//! Parsers for the structured replies: `status`, `info`, `sd <name>` and
//! `is_playing`.
//!
//! All parsers work on the lines returned by [`Session::run_command`] and
//! either produce a complete record or fail with [`Error::Parse`].
//!
//! [`Session::run_command`]: crate::Session::run_command

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::error::{Error, Result};

/// Parsed output of `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusRecord {
    /// Location of the current input with spaces encoded as `%20`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    pub volume: String,
    pub state: String,
}

impl StatusRecord {
    /// ```text
    /// ( new input: file:///music/some track.ogg )
    /// ( audio volume: 256 )
    /// ( state playing )
    /// ```
    ///
    /// The first line is only present while an input is loaded.
    pub fn parse(lines: &[String]) -> Result<Self> {
        let (input, volume, state) = match lines {
            [input, volume, state] => (Some(input_location(input)?), volume, state),
            [volume, state] => (None, volume, state),
            _ => {
                return Err(Error::parse(format!(
                    "status: expected 2 or 3 lines, got {}",
                    lines.len()
                )))
            }
        };
        Ok(Self {
            input,
            volume: token(volume, 3, "status volume")?.to_owned(),
            state: token(state, 2, "status state")?.to_owned(),
        })
    }

    pub fn has_input(&self) -> bool {
        self.input.is_some()
    }
}

fn input_location(line: &str) -> Result<String> {
    let tokens: Vec<&str> = line.split(' ').collect();
    let end = tokens.len().saturating_sub(1);
    tokens
        .get(3..end)
        .map(|parts| parts.join("%20"))
        .ok_or_else(|| Error::parse("status input"))
}

fn token<'a>(line: &'a str, index: usize, what: &str) -> Result<&'a str> {
    line.split(' ')
        .nth(index)
        .ok_or_else(|| Error::parse(what))
}

/// Attributes of one stream from `info`, in the order VLC printed them.
///
/// The first entry is always `Stream`, holding the stream label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamInfo {
    fields: Vec<(String, String)>,
}

impl StreamInfo {
    pub const STREAM_KEY: &'static str = "Stream";

    fn new(label: &str) -> Self {
        Self {
            fields: vec![(Self::STREAM_KEY.to_owned(), label.to_owned())],
        }
    }

    fn insert(&mut self, key: String, value: String) {
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn stream(&self) -> &str {
        &self.fields[0].1
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parses the block-structured output of `info`:
    ///
    /// ```text
    /// +----[ Stream 0 ]
    /// |
    /// | Type: Audio
    /// | Codec: Vorbis
    /// |
    /// +----[ end of stream info ]
    /// ```
    pub fn parse_all(lines: &[String]) -> Result<Vec<Self>> {
        let lines: Vec<&str> = lines
            .iter()
            .map(String::as_str)
            .filter(|line| *line != "|")
            .collect();

        let headers: Vec<usize> = lines
            .iter()
            .enumerate()
            .filter(|(_, line)| line.starts_with('+'))
            .map(|(i, _)| i)
            .collect();
        let Some((_closer, streams)) = headers.split_last() else {
            return Err(Error::parse("info: no stream headers"));
        };
        let labels = streams
            .iter()
            .map(|&i| token(lines[i], 2, "info stream header"))
            .collect::<Result<Vec<_>>>()?;

        let mut records = Vec::with_capacity(labels.len());
        let mut cursor = headers[0] + 1;
        for label in labels {
            let mut record = Self::new(label);
            loop {
                // the closing header always ends the last block
                let Some(line) = lines.get(cursor).copied() else {
                    break;
                };
                if !line.starts_with('|') {
                    break;
                }
                let (key, value) = line.split_once(": ").unwrap_or((line, ""));
                let key = key.get(2..).unwrap_or_default();
                record.insert(key.to_owned(), value.to_owned());
                cursor += 1;
            }
            // skip the next header
            cursor += 1;
            records.push(record);
        }
        Ok(records)
    }
}

impl Serialize for StreamInfo {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Reads the reply of `sd <service>`: `true` once enabled, `false` once
/// disabled.
pub fn parse_toggle(line: &str) -> Result<bool> {
    if line.contains("enabled.") {
        Ok(true)
    } else if line.contains("disabled.") {
        Ok(false)
    } else {
        Err(Error::parse(format!("sd toggle reply {line:?}")))
    }
}

/// `is_playing` answers `1` while playing. Anything else, including an
/// empty reply, reads as not playing rather than as a parse failure.
pub fn parse_is_playing(line: &str) -> bool {
    line == "1"
}
