use std::time::Duration;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use color_eyre::{eyre::eyre, Result};
use rustyline::error::ReadlineError;
use vlc_telnet::{
    Assume, ConnectOptions, Error, FlagMode, Pidof, ServiceDiscovery, Session, DEFAULT_HOST,
    DEFAULT_PASSWORD, DEFAULT_PORT,
};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[arg(long, env = "VLC_HOST", default_value = DEFAULT_HOST)]
    host: String,

    #[arg(long, env = "VLC_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    #[arg(long, env = "VLC_PASSWORD", default_value = DEFAULT_PASSWORD, hide_env_values = true)]
    password: String,

    /// Give up on a reply after this many seconds.
    #[arg(long, env = "VLC_TIMEOUT", value_name = "SECS")]
    timeout: Option<u64>,

    /// Skip checking for a local vlc process, e.g. when VLC runs on another host.
    #[arg(long)]
    no_process_check: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    GenerateCompletions,
    /// Interactive prompt sending raw commands.
    Shell,
    /// Send one raw command and print the reply.
    Text {
        command: String,
    },
    Status,
    Info,
    IsPlaying,
    /// List service discovery modules, or toggle one.
    Sd {
        service: Option<String>,
    },
    Play,
    Pause,
    Stop,
    Next,
    #[command(alias("previous"))]
    Prev,
    Clear,
    Add {
        location: String,
    },
    Enqueue {
        location: String,
    },
    Goto {
        index: u32,
    },
    Seek {
        #[arg(allow_hyphen_values = true)]
        position: String,
    },
    Rate {
        rate: f32,
    },
    Volup {
        #[arg(default_value_t = 1)]
        steps: u32,
    },
    Voldown {
        #[arg(default_value_t = 1)]
        steps: u32,
    },
    Repeat {
        switch: Option<Switch>,
    },
    Loop {
        switch: Option<Switch>,
    },
    Random {
        switch: Option<Switch>,
    },
    #[command(alias("f"))]
    Fullscreen {
        switch: Option<Switch>,
    },
    Get {
        attribute: Attribute,
    },
    Set {
        attribute: Attribute,
        value: String,
    },
    Time,
    Length,
    Title,
    Snapshot,
    Logout,
    Shutdown,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Switch {
    On,
    Off,
}

fn flag_mode(switch: Option<Switch>) -> FlagMode {
    match switch {
        None => FlagMode::Toggle,
        Some(switch) => FlagMode::Set(switch == Switch::On),
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum Attribute {
    Title,
    Chapter,
    Volume,
    #[value(alias("adev"))]
    AudioDevice,
    #[value(alias("achan"))]
    AudioChannels,
    #[value(alias("atrack"))]
    AudioTrack,
    #[value(alias("vtrack"))]
    VideoTrack,
    #[value(alias("vratio"))]
    AspectRatio,
    Crop,
    Zoom,
    #[value(alias("vdeinterlace"))]
    Deinterlace,
    #[value(alias("vdeinterlace-mode"))]
    DeinterlaceMode,
    #[value(alias("strack"))]
    SubtitleTrack,
}
impl Attribute {
    fn to_protocol_attribute(self) -> vlc_telnet::Attribute {
        match self {
            Attribute::Title => vlc_telnet::Attribute::Title,
            Attribute::Chapter => vlc_telnet::Attribute::Chapter,
            Attribute::Volume => vlc_telnet::Attribute::Volume,
            Attribute::AudioDevice => vlc_telnet::Attribute::AudioDevice,
            Attribute::AudioChannels => vlc_telnet::Attribute::AudioChannels,
            Attribute::AudioTrack => vlc_telnet::Attribute::AudioTrack,
            Attribute::VideoTrack => vlc_telnet::Attribute::VideoTrack,
            Attribute::AspectRatio => vlc_telnet::Attribute::AspectRatio,
            Attribute::Crop => vlc_telnet::Attribute::Crop,
            Attribute::Zoom => vlc_telnet::Attribute::Zoom,
            Attribute::Deinterlace => vlc_telnet::Attribute::Deinterlace,
            Attribute::DeinterlaceMode => vlc_telnet::Attribute::DeinterlaceMode,
            Attribute::SubtitleTrack => vlc_telnet::Attribute::SubtitleTrack,
        }
    }
}

struct Vlc {
    options: ConnectOptions,
    check_process: bool,
    session: Option<Session>,
}
impl Vlc {
    fn from_cli(cli: &Cli) -> Self {
        Self {
            options: ConnectOptions {
                host: cli.host.clone(),
                port: cli.port,
                password: cli.password.clone(),
                read_timeout: cli.timeout.map(Duration::from_secs),
            },
            check_process: !cli.no_process_check,
            session: None,
        }
    }
    fn connect(&mut self) -> Result<&mut Session> {
        if self.session.is_none() {
            let session = if self.check_process {
                Session::connect(&self.options, &Pidof::default())?
            } else {
                Session::connect(&self.options, &Assume(true))?
            };
            self.session = Some(session);
        }
        self.session
            .as_mut()
            .ok_or_else(|| eyre!("no session after connecting"))
    }
    fn into_session(mut self) -> Result<Session> {
        self.connect()?;
        self.session
            .take()
            .ok_or_else(|| eyre!("no session after connecting"))
    }
    fn print_lines(lines: &[String]) {
        for line in lines {
            println!("{line}");
        }
    }
    fn shell(&mut self) -> Result<()> {
        let session = self.connect()?;
        let mut editor = rustyline::DefaultEditor::new()?;
        loop {
            let line = match editor.readline("> ") {
                Ok(line) => line,
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
                Err(e) => return Err(e.into()),
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            editor.add_history_entry(line)?;
            match session.run_command(line) {
                Ok(lines) => Self::print_lines(&lines),
                Err(Error::ConnectionClosed) => {
                    eprintln!("connection closed");
                    break;
                }
                Err(e) if e.is_recoverable() => eprintln!("{e}"),
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let mut vlc = Vlc::from_cli(&cli);
    match cli.command {
        Command::GenerateCompletions => {
            clap_complete::generate(
                clap_complete::shells::Zsh,
                &mut Cli::command(),
                "vlc-telnet",
                &mut std::io::stdout(),
            );
        }
        Command::Shell => {
            vlc.shell()?;
        }
        Command::Text { command } => {
            Vlc::print_lines(&vlc.connect()?.run_command(&command)?);
        }
        Command::Status => {
            let status = vlc.connect()?.status()?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Command::Info => {
            let streams = vlc.connect()?.info()?;
            println!("{}", serde_json::to_string_pretty(&streams)?);
        }
        Command::IsPlaying => {
            println!("{}", vlc.connect()?.is_playing()?);
        }
        Command::Sd { service } => match vlc.connect()?.sd(service.as_deref())? {
            ServiceDiscovery::Listing(lines) => Vlc::print_lines(&lines),
            ServiceDiscovery::Enabled(true) => println!("enabled"),
            ServiceDiscovery::Enabled(false) => println!("disabled"),
        },
        Command::Play => {
            vlc.connect()?.play()?;
        }
        Command::Pause => {
            vlc.connect()?.pause()?;
        }
        Command::Stop => {
            vlc.connect()?.stop()?;
        }
        Command::Next => {
            vlc.connect()?.next()?;
        }
        Command::Prev => {
            vlc.connect()?.prev()?;
        }
        Command::Clear => {
            vlc.connect()?.clear()?;
        }
        Command::Add { location } => {
            vlc.connect()?.add(&location)?;
        }
        Command::Enqueue { location } => {
            vlc.connect()?.enqueue(&location)?;
        }
        Command::Goto { index } => {
            vlc.connect()?.goto(index)?;
        }
        Command::Seek { position } => {
            vlc.connect()?.seek(&position)?;
        }
        Command::Rate { rate } => {
            vlc.connect()?.rate(rate)?;
        }
        Command::Volup { steps } => {
            vlc.connect()?.volup(steps)?;
        }
        Command::Voldown { steps } => {
            vlc.connect()?.voldown(steps)?;
        }
        Command::Repeat { switch } => {
            vlc.connect()?.repeat(flag_mode(switch))?;
        }
        Command::Loop { switch } => {
            vlc.connect()?.loop_(flag_mode(switch))?;
        }
        Command::Random { switch } => {
            vlc.connect()?.random(flag_mode(switch))?;
        }
        Command::Fullscreen { switch } => {
            vlc.connect()?.fullscreen(flag_mode(switch))?;
        }
        Command::Get { attribute } => {
            println!("{}", vlc.connect()?.get(attribute.to_protocol_attribute())?);
        }
        Command::Set { attribute, value } => {
            vlc.connect()?.set(attribute.to_protocol_attribute(), &value)?;
        }
        Command::Time => {
            println!("{}", vlc.connect()?.get_time()?);
        }
        Command::Length => {
            println!("{}", vlc.connect()?.get_length()?);
        }
        Command::Title => {
            println!("{}", vlc.connect()?.get_title()?);
        }
        Command::Snapshot => {
            vlc.connect()?.snapshot()?;
        }
        Command::Logout => {
            vlc.into_session()?.logout()?;
        }
        Command::Shutdown => {
            vlc.into_session()?.shutdown()?;
        }
    }
    Ok(())
}
