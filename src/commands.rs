//! Typed wrappers around the telnet command vocabulary.
//!
//! Every wrapper builds `token` or `token value`, sends it with
//! [`Session::run_command`], and then either ignores the reply or hands it to
//! one of the parsers in [`crate::parse`].

use std::fmt;
use std::io::{Read, Write};

use crate::error::{Error, Result};
use crate::parse::{parse_is_playing, parse_toggle, StatusRecord, StreamInfo};
use crate::session::{check_argument, Session};

/// A setting that is read with `token` and written with `token value`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Attribute {
    Title,
    Chapter,
    Volume,
    AudioDevice,
    AudioChannels,
    AudioTrack,
    VideoTrack,
    AspectRatio,
    Crop,
    Zoom,
    Deinterlace,
    DeinterlaceMode,
    SubtitleTrack,
}

impl Attribute {
    pub const ALL: [Attribute; 13] = [
        Attribute::Title,
        Attribute::Chapter,
        Attribute::Volume,
        Attribute::AudioDevice,
        Attribute::AudioChannels,
        Attribute::AudioTrack,
        Attribute::VideoTrack,
        Attribute::AspectRatio,
        Attribute::Crop,
        Attribute::Zoom,
        Attribute::Deinterlace,
        Attribute::DeinterlaceMode,
        Attribute::SubtitleTrack,
    ];

    pub fn to_protocol_name(self) -> &'static str {
        match self {
            Attribute::Title => "title",
            Attribute::Chapter => "chapter",
            Attribute::Volume => "volume",
            Attribute::AudioDevice => "adev",
            Attribute::AudioChannels => "achan",
            Attribute::AudioTrack => "atrack",
            Attribute::VideoTrack => "vtrack",
            Attribute::AspectRatio => "vratio",
            Attribute::Crop => "crop",
            Attribute::Zoom => "zoom",
            Attribute::Deinterlace => "vdeinterlace",
            Attribute::DeinterlaceMode => "vdeinterlace_mode",
            Attribute::SubtitleTrack => "strack",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_protocol_name())
    }
}

/// How to drive an on/off setting such as `repeat`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum FlagMode {
    /// Send the bare command and let VLC flip the current value.
    #[default]
    Toggle,
    /// Send `on` or `off` explicitly.
    Set(bool),
}

impl FlagMode {
    fn command(self, token: &str) -> String {
        match self {
            FlagMode::Toggle => token.to_string(),
            FlagMode::Set(true) => format!("{token} on"),
            FlagMode::Set(false) => format!("{token} off"),
        }
    }
}

impl From<bool> for FlagMode {
    fn from(on: bool) -> Self {
        FlagMode::Set(on)
    }
}

fn with_argument(token: &str, argument: &str) -> Result<String> {
    check_argument(argument)?;
    Ok(format!("{token} {argument}"))
}

impl<S: Read + Write> Session<S> {
    fn send(&mut self, command: &str) -> Result<()> {
        self.run_command(command).map(drop)
    }

    fn first_line(&mut self, command: &str) -> Result<String> {
        self.run_command(command)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::parse(format!("{command}: empty reply")))
    }

    /// Reads one attribute, e.g. `atrack`.
    pub fn get(&mut self, attribute: Attribute) -> Result<String> {
        self.first_line(attribute.to_protocol_name())
    }

    /// Writes one attribute, e.g. `atrack 2`.
    pub fn set(&mut self, attribute: Attribute, value: &str) -> Result<()> {
        let command = with_argument(attribute.to_protocol_name(), value)?;
        self.send(&command)
    }

    // Playlist

    /// Adds an item to the playlist and starts playing it.
    pub fn add(&mut self, location: &str) -> Result<()> {
        self.send(&with_argument("add", location)?)
    }

    pub fn enqueue(&mut self, location: &str) -> Result<()> {
        self.send(&with_argument("enqueue", location)?)
    }

    /// Lists the available service discovery modules.
    pub fn services(&mut self) -> Result<Vec<String>> {
        self.run_command("sd")
    }

    /// Toggles a service discovery module and reports whether it is now enabled.
    pub fn toggle_service(&mut self, service: &str) -> Result<bool> {
        parse_toggle(&self.first_line(&with_argument("sd", service)?)?)
    }

    /// `sd` with no target lists services; with a target toggles that service.
    pub fn sd(&mut self, service: Option<&str>) -> Result<ServiceDiscovery> {
        match service {
            None => self.services().map(ServiceDiscovery::Listing),
            Some(service) => self.toggle_service(service).map(ServiceDiscovery::Enabled),
        }
    }

    pub fn play(&mut self) -> Result<()> {
        self.send("play")
    }

    pub fn stop(&mut self) -> Result<()> {
        self.send("stop")
    }

    pub fn next(&mut self) -> Result<()> {
        self.send("next")
    }

    pub fn prev(&mut self) -> Result<()> {
        self.send("prev")
    }

    pub fn goto(&mut self, index: u32) -> Result<()> {
        self.send(&format!("goto {index}"))
    }

    pub fn repeat(&mut self, mode: FlagMode) -> Result<()> {
        self.send(&mode.command("repeat"))
    }

    pub fn loop_(&mut self, mode: FlagMode) -> Result<()> {
        self.send(&mode.command("loop"))
    }

    pub fn random(&mut self, mode: FlagMode) -> Result<()> {
        self.send(&mode.command("random"))
    }

    pub fn clear(&mut self) -> Result<()> {
        self.send("clear")
    }

    pub fn status(&mut self) -> Result<StatusRecord> {
        StatusRecord::parse(&self.run_command("status")?)
    }

    // Titles and chapters

    pub fn title(&mut self) -> Result<String> {
        self.get(Attribute::Title)
    }

    pub fn set_title(&mut self, title: &str) -> Result<()> {
        self.set(Attribute::Title, title)
    }

    pub fn title_next(&mut self) -> Result<()> {
        self.send("title_n")
    }

    pub fn title_prev(&mut self) -> Result<()> {
        self.send("title_p")
    }

    pub fn chapter(&mut self) -> Result<String> {
        self.get(Attribute::Chapter)
    }

    pub fn set_chapter(&mut self, chapter: &str) -> Result<()> {
        self.set(Attribute::Chapter, chapter)
    }

    pub fn chapter_next(&mut self) -> Result<()> {
        self.send("chapter_n")
    }

    pub fn chapter_prev(&mut self) -> Result<()> {
        self.send("chapter_p")
    }

    // Playback

    /// Seeks to a position: seconds (`12`), relative (`+10`) or percent (`50%`).
    pub fn seek(&mut self, position: &str) -> Result<()> {
        self.send(&with_argument("seek", position)?)
    }

    pub fn pause(&mut self) -> Result<()> {
        self.send("pause")
    }

    pub fn fastforward(&mut self) -> Result<()> {
        self.send("fastforward")
    }

    pub fn rewind(&mut self) -> Result<()> {
        self.send("rewind")
    }

    pub fn faster(&mut self) -> Result<()> {
        self.send("faster")
    }

    pub fn slower(&mut self) -> Result<()> {
        self.send("slower")
    }

    pub fn normal(&mut self) -> Result<()> {
        self.send("normal")
    }

    pub fn rate(&mut self, rate: f32) -> Result<()> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(Error::InvalidArgument(rate.to_string()));
        }
        self.send(&format!("rate {rate}"))
    }

    /// Advances a single frame.
    pub fn frame(&mut self) -> Result<()> {
        self.send("frame")
    }

    pub fn fullscreen(&mut self, mode: FlagMode) -> Result<()> {
        self.send(&mode.command("f"))
    }

    /// Per-stream details of the current input.
    pub fn info(&mut self) -> Result<Vec<StreamInfo>> {
        StreamInfo::parse_all(&self.run_command("info")?)
    }

    /// Seconds elapsed since the start of the stream.
    pub fn get_time(&mut self) -> Result<String> {
        self.first_line("get_time")
    }

    pub fn is_playing(&mut self) -> Result<bool> {
        let lines = self.run_command("is_playing")?;
        Ok(lines.first().is_some_and(|line| parse_is_playing(line)))
    }

    pub fn get_title(&mut self) -> Result<String> {
        self.first_line("get_title")
    }

    pub fn get_length(&mut self) -> Result<String> {
        self.first_line("get_length")
    }

    // Audio and video

    pub fn volume(&mut self) -> Result<String> {
        self.get(Attribute::Volume)
    }

    pub fn set_volume(&mut self, volume: &str) -> Result<()> {
        self.set(Attribute::Volume, volume)
    }

    /// Raises the volume by `steps` steps.
    pub fn volup(&mut self, steps: u32) -> Result<()> {
        self.send(&format!("volup {steps}"))
    }

    /// Lowers the volume by `steps` steps.
    pub fn voldown(&mut self, steps: u32) -> Result<()> {
        self.send(&format!("voldown {steps}"))
    }

    pub fn audio_device(&mut self) -> Result<String> {
        self.get(Attribute::AudioDevice)
    }

    pub fn set_audio_device(&mut self, device: &str) -> Result<()> {
        self.set(Attribute::AudioDevice, device)
    }

    pub fn audio_channels(&mut self) -> Result<String> {
        self.get(Attribute::AudioChannels)
    }

    pub fn set_audio_channels(&mut self, channels: &str) -> Result<()> {
        self.set(Attribute::AudioChannels, channels)
    }

    pub fn audio_track(&mut self) -> Result<String> {
        self.get(Attribute::AudioTrack)
    }

    pub fn set_audio_track(&mut self, track: &str) -> Result<()> {
        self.set(Attribute::AudioTrack, track)
    }

    pub fn video_track(&mut self) -> Result<String> {
        self.get(Attribute::VideoTrack)
    }

    pub fn set_video_track(&mut self, track: &str) -> Result<()> {
        self.set(Attribute::VideoTrack, track)
    }

    pub fn aspect_ratio(&mut self) -> Result<String> {
        self.get(Attribute::AspectRatio)
    }

    pub fn set_aspect_ratio(&mut self, ratio: &str) -> Result<()> {
        self.set(Attribute::AspectRatio, ratio)
    }

    pub fn crop(&mut self) -> Result<String> {
        self.get(Attribute::Crop)
    }

    pub fn set_crop(&mut self, crop: &str) -> Result<()> {
        self.set(Attribute::Crop, crop)
    }

    pub fn zoom(&mut self) -> Result<String> {
        self.get(Attribute::Zoom)
    }

    pub fn set_zoom(&mut self, zoom: &str) -> Result<()> {
        self.set(Attribute::Zoom, zoom)
    }

    pub fn deinterlace(&mut self) -> Result<String> {
        self.get(Attribute::Deinterlace)
    }

    pub fn set_deinterlace(&mut self, value: &str) -> Result<()> {
        self.set(Attribute::Deinterlace, value)
    }

    pub fn deinterlace_mode(&mut self) -> Result<String> {
        self.get(Attribute::DeinterlaceMode)
    }

    pub fn set_deinterlace_mode(&mut self, mode: &str) -> Result<()> {
        self.set(Attribute::DeinterlaceMode, mode)
    }

    pub fn snapshot(&mut self) -> Result<()> {
        self.send("snapshot")
    }

    pub fn subtitle_track(&mut self) -> Result<String> {
        self.get(Attribute::SubtitleTrack)
    }

    pub fn set_subtitle_track(&mut self, track: &str) -> Result<()> {
        self.set(Attribute::SubtitleTrack, track)
    }

    // Misc

    /// Loads the VLM (video lan manager).
    pub fn vlm(&mut self) -> Result<()> {
        self.send("vlm")
    }

    /// Ends the telnet session; VLC keeps running.
    pub fn logout(mut self) -> Result<()> {
        self.send_final("logout")
    }

    /// Quits VLC.
    pub fn shutdown(mut self) -> Result<()> {
        self.send_final("shutdown")
    }

    /// The server may hang up instead of printing a last prompt.
    fn send_final(&mut self, command: &str) -> Result<()> {
        match self.send(command) {
            Err(Error::ConnectionClosed) => Ok(()),
            other => other,
        }
    }
}

/// Result of [`Session::sd`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceDiscovery {
    Listing(Vec<String>),
    Enabled(bool),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::{session, Scripted};

    fn sent_after_login(session: &Session<Scripted>) -> String {
        let sent = session.get_ref().sent();
        sent.strip_prefix("admin\n").unwrap_or(&sent).to_string()
    }

    #[test]
    fn protocol_names_are_unique() {
        let mut names: Vec<&str> = Attribute::ALL.iter().map(|a| a.to_protocol_name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), Attribute::ALL.len());
    }

    #[test]
    fn set_appends_value_and_get_sends_bare_token() {
        let mut session = session(b"> 2\r\n> ");
        session.set(Attribute::AudioTrack, "2").unwrap();
        assert_eq!(session.get(Attribute::AudioTrack).unwrap(), "2");
        assert_eq!(sent_after_login(&session), "atrack 2\natrack\n");
    }

    #[test]
    fn flag_modes() {
        let mut session = session(b"> > > ");
        session.repeat(FlagMode::Toggle).unwrap();
        session.loop_(FlagMode::Set(true)).unwrap();
        session.random(false.into()).unwrap();
        assert_eq!(sent_after_login(&session), "repeat\nloop on\nrandom off\n");
    }

    #[test]
    fn volume_steps_are_sent() {
        let mut session = session(b"> > ");
        session.volup(3).unwrap();
        session.voldown(2).unwrap();
        assert_eq!(sent_after_login(&session), "volup 3\nvoldown 2\n");
    }

    #[test]
    fn sd_listing_and_toggle() {
        let mut session = session(b"upnp: UPnP\r\nsap: SAP\r\n> upnp enabled.\r\n> ");
        assert_eq!(
            session.sd(None).unwrap(),
            ServiceDiscovery::Listing(vec!["upnp: UPnP".into(), "sap: SAP".into()])
        );
        assert_eq!(session.sd(Some("upnp")).unwrap(), ServiceDiscovery::Enabled(true));
        assert_eq!(sent_after_login(&session), "sd\nsd upnp\n");
    }

    #[test]
    fn sd_toggle_unparseable() {
        let mut session = session(b"what?\r\n> ");
        assert!(matches!(session.toggle_service("upnp"), Err(Error::Parse(_))));
    }

    #[test]
    fn is_playing_never_fails_on_content() {
        let mut session = session(b"1\r\n> 0\r\n> > ");
        assert!(session.is_playing().unwrap());
        assert!(!session.is_playing().unwrap());
        assert!(!session.is_playing().unwrap());
    }

    #[test]
    fn status_through_session() {
        let mut session = session(
            b"( new input: file:///tmp/a b.mp3 )\r\n( audio volume: 128 )\r\n( state paused )\r\n> ",
        );
        let status = session.status().unwrap();
        assert_eq!(status.input.as_deref(), Some("file:///tmp/a%20b.mp3"));
        assert_eq!(status.volume, "128");
        assert_eq!(status.state, "paused");
    }

    #[test]
    fn getter_on_empty_reply_is_parse_error() {
        let mut session = session(b"> ");
        assert!(matches!(session.get_time(), Err(Error::Parse(_))));
    }

    #[test]
    fn arguments_with_line_breaks_are_not_sent() {
        let mut session = session(b"");
        assert!(matches!(
            session.add("a.mp3\r\nshutdown"),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(session.rate(-1.0), Err(Error::InvalidArgument(_))));
        assert_eq!(sent_after_login(&session), "");
    }

    #[test]
    fn logout_tolerates_hangup() {
        let session = session(b"");
        session.logout().unwrap();
    }

    #[test]
    fn simple_actions() {
        let mut session = session(b"> > > > > ");
        session.goto(4).unwrap();
        session.seek("+10").unwrap();
        session.rate(1.5).unwrap();
        session.fullscreen(FlagMode::Set(true)).unwrap();
        session.title_next().unwrap();
        assert_eq!(
            sent_after_login(&session),
            "goto 4\nseek +10\nrate 1.5\nf on\ntitle_n\n"
        );
    }
}
