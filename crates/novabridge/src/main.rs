//! NovaBridge CLI - inspect and drive the base station and Sonar from a terminal.

use std::path::PathBuf;
use std::thread::sleep;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use novabridge::{
    Config, NovaBridge, PresetChannel, SonarChannel, SonarMode, StreamerSlider, load_config,
};

/// Interval between event drains in `events`.
const EVENT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// novabridge - Arctis Nova Pro base station and Sonar diagnostics.
#[derive(Parser)]
#[command(name = "novabridge", version, about)]
struct Cli {
    /// Config file (defaults to the per-user config directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show base station telemetry.
    Status {
        /// How long to wait for fresh reports, in milliseconds.
        #[arg(long, default_value_t = 500)]
        refresh_ms: u64,
    },

    /// Print base station events as JSON lines.
    Events {
        /// Stop after this many seconds.
        #[arg(long, default_value_t = 10)]
        seconds: u64,
    },

    /// Channel volume.
    #[command(subcommand)]
    Volume(VolumeCmd),

    /// Channel mute.
    #[command(subcommand)]
    Mute(MuteCmd),

    /// Game/chat balance.
    #[command(name = "chat-mix", subcommand)]
    ChatMix(ChatMixCmd),

    /// Classic or stream mixing mode.
    #[command(subcommand)]
    Mode(ModeCmd),

    /// Applications routed to each channel.
    Routing {
        /// Print the raw routing document instead.
        #[arg(long)]
        raw: bool,
    },

    /// Sonar presets.
    #[command(subcommand)]
    Presets(PresetsCmd),

    /// Set the base station display brightness (1-10).
    Brightness { level: u8 },
}

/// Mode and slider selection shared by the mixer commands.
#[derive(clap::Args)]
struct MixerTarget {
    /// Mixing mode; queried from Sonar when omitted.
    #[arg(long)]
    mode: Option<SonarMode>,
    /// Stream mode slider.
    #[arg(long, default_value = "streaming")]
    slider: StreamerSlider,
}

#[derive(Subcommand)]
enum VolumeCmd {
    /// Read a channel's volume, or every channel's when omitted.
    Get {
        channel: Option<SonarChannel>,
        #[command(flatten)]
        target: MixerTarget,
    },
    /// Set a channel's volume (0.0-1.0).
    Set {
        channel: SonarChannel,
        volume: f64,
        #[command(flatten)]
        target: MixerTarget,
    },
}

#[derive(Subcommand)]
enum MuteCmd {
    Get {
        channel: SonarChannel,
        #[command(flatten)]
        target: MixerTarget,
    },
    Set {
        channel: SonarChannel,
        #[arg(action = clap::ArgAction::Set)]
        muted: bool,
        #[command(flatten)]
        target: MixerTarget,
    },
}

#[derive(Subcommand)]
enum ChatMixCmd {
    Get,
    /// Set the balance (-1.0 game, 1.0 chat).
    Set {
        #[arg(allow_negative_numbers = true)]
        balance: f64,
    },
}

#[derive(Subcommand)]
enum ModeCmd {
    Get,
    Set { mode: SonarMode },
}

#[derive(Subcommand)]
enum PresetsCmd {
    /// List a channel's presets.
    List { channel: PresetChannel },
    /// List favorite presets, for one channel or all of them.
    Favorites { channel: Option<PresetChannel> },
    /// Show the selected preset of a channel.
    Selected { channel: PresetChannel },
    /// Select a preset by name.
    Select { channel: PresetChannel, name: String },
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("novabridge={}", config.logging.level)));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

#[derive(Serialize)]
struct StatusReport {
    #[serde(flatten)]
    cache: novabridge::StatusCache,
    sidetone_label: Option<String>,
    mic_muted: Option<bool>,
}

fn status(bridge: &NovaBridge, refresh: Duration) -> Result<()> {
    bridge.connect().context("Failed to open the base station")?;

    // Ask for a battery report when the firmware supports it.
    if let Err(e) = bridge.request_battery_status(refresh) {
        debug!(error = %e, "Active battery query unavailable");
        bridge.battery_status(refresh)?;
    }
    bridge.drain_pending_events()?;

    let cache = bridge.cached_status();
    print_json(&StatusReport {
        cache,
        sidetone_label: bridge.sidetone_label()?,
        mic_muted: cache.mic.map(|mic| mic.muted()),
    })
}

fn events(bridge: &NovaBridge, seconds: u64) -> Result<()> {
    bridge.connect().context("Failed to open the base station")?;
    let deadline = Instant::now() + Duration::from_secs(seconds);
    info!(seconds, "Listening for base station events");

    while Instant::now() < deadline {
        for event in bridge.drain_pending_events()? {
            println!("{}", serde_json::to_string(&event)?);
        }
        sleep(EVENT_POLL_INTERVAL);
    }
    Ok(())
}

fn presets(bridge: &NovaBridge, command: PresetsCmd) -> Result<()> {
    match command {
        PresetsCmd::List { channel } => print_json(&bridge.list_presets(channel)?),
        PresetsCmd::Favorites { channel: Some(channel) } => {
            print_json(&bridge.list_favorite_presets(channel)?)
        }
        PresetsCmd::Favorites { channel: None } => {
            print_json(&bridge.favorite_presets_by_channel()?)
        }
        PresetsCmd::Selected { channel } => print_json(&bridge.selected_preset(channel)?),
        PresetsCmd::Select { channel, name } => {
            let preset = bridge
                .select_preset_by_name(channel, &name)
                .with_context(|| format!("Failed to select preset '{name}'"))?;
            print_json(&preset)
        }
    }
}

fn run(bridge: &NovaBridge, command: Commands) -> Result<()> {
    match command {
        Commands::Status { refresh_ms } => status(bridge, Duration::from_millis(refresh_ms)),
        Commands::Events { seconds } => events(bridge, seconds),
        Commands::Volume(VolumeCmd::Get { channel: Some(channel), target }) => {
            print_json(&bridge.channel_volume(channel, target.slider, target.mode)?)
        }
        Commands::Volume(VolumeCmd::Get { channel: None, target }) => {
            print_json(&bridge.volume_state(target.slider, target.mode)?)
        }
        Commands::Volume(VolumeCmd::Set { channel, volume, target }) => print_json(
            &bridge.set_channel_volume(channel, volume, target.slider, target.mode)?,
        ),
        Commands::Mute(MuteCmd::Get { channel, target }) => {
            print_json(&bridge.channel_mute(channel, target.slider, target.mode)?)
        }
        Commands::Mute(MuteCmd::Set { channel, muted, target }) => {
            print_json(&bridge.set_channel_mute(channel, muted, target.slider, target.mode)?)
        }
        Commands::ChatMix(ChatMixCmd::Get) => print_json(&bridge.chat_mix()?),
        Commands::ChatMix(ChatMixCmd::Set { balance }) => print_json(&bridge.set_chat_mix(balance)?),
        Commands::Mode(ModeCmd::Get) => print_json(&bridge.mode()?.as_str()),
        Commands::Mode(ModeCmd::Set { mode }) => {
            let stream = bridge.set_streamer_mode(mode.is_stream())?;
            print_json(&SonarMode::from_streamer(stream).as_str())
        }
        Commands::Routing { raw: true } => print_json(&bridge.routing_data()?),
        Commands::Routing { raw: false } => print_json(&bridge.routed_apps_by_channel()?),
        Commands::Presets(command) => presets(bridge, command),
        Commands::Brightness { level } => {
            bridge.connect().context("Failed to open the base station")?;
            bridge.set_brightness(level)?;
            Ok(())
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    init_logging(&config);
    debug!(?config, "Configuration loaded");

    let bridge = NovaBridge::from_config(&config).context("Failed to initialize NovaBridge")?;
    let result = run(&bridge, cli.command);
    if let Err(e) = &result {
        warn!(error = %e, "Command failed");
    }
    bridge.close();
    result
}
