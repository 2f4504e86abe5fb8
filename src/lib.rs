//! Client for the VLC telnet remote-control interface.
//!
//! ```no_run
//! use vlc_telnet::{Session, DEFAULT_PORT};
//!
//! # fn main() -> vlc_telnet::Result<()> {
//! let mut vlc = Session::open("localhost", "admin", DEFAULT_PORT)?;
//! vlc.add("file:///music/track.ogg")?;
//! let status = vlc.status()?;
//! println!("{} at volume {}", status.state, status.volume);
//! # Ok(())
//! # }
//! ```

mod commands;
mod error;
pub mod framing;
pub mod parse;
pub mod process;
mod session;

pub use commands::{Attribute, FlagMode, ServiceDiscovery};
pub use error::{Error, Result};
pub use parse::{StatusRecord, StreamInfo};
pub use process::{Assume, Pidof, ProcessProbe};
pub use session::{ConnectOptions, Session, DEFAULT_HOST, DEFAULT_PASSWORD, DEFAULT_PORT};
