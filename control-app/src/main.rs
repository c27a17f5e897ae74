// denon232 control tool -- CLI for exercising a Denon receiver over RS-232,
// or a simulated one.
//
// Usage:
//   denon232-control --port /dev/ttyUSB0 status
//   denon232-control --port /dev/ttyUSB0 --zone zone2 power on
//   denon232-control --port /dev/ttyUSB0 volume set 0.4
//   denon232-control --mock source "SAT/CBL"
//   denon232-control --mock --zone zone2 sources
//   denon232-control --port /dev/ttyUSB0 validate
//   denon232-control --port /dev/ttyUSB1 validate --skip-test --name "Den"
//   denon232-control --port /dev/ttyUSB0 monitor --interval 5 --count 12
//
// The port can also come from DENON232_PORT, the log filter from
// DENON232_LOG or RUST_LOG.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use denon232::commands::{
    cmd_mute, cmd_power, cmd_select_source, cmd_set_volume, cmd_volume_step,
};
use denon232::zones::{ZoneProfile, main_zone, zone2};
use denon232::{
    DEFAULT_NAME, Denon232, Denon232Builder, ReceiverBuilder, SetupRequest, ZoneController,
    validate_setup,
};
use denon232_core::ZoneId;
use denon232_test_harness::{MockConnector, MockTransport};

const MOCK_PORT: &str = "mock";

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// denon232 control tool -- drive a Denon receiver from the command line.
#[derive(Parser)]
#[command(name = "denon232-control", version, about)]
struct Cli {
    /// Serial port path (e.g. /dev/ttyUSB0, COM3).
    /// Required unless --mock is used.
    #[arg(long, env = "DENON232_PORT")]
    port: Option<String>,

    /// Use a simulated receiver instead of a real serial port.
    #[arg(long)]
    mock: bool,

    /// Zone to act on: main or zone2.
    #[arg(long, default_value = "main")]
    zone: ZoneId,

    /// Device display name.
    #[arg(long, default_value = DEFAULT_NAME)]
    name: String,

    /// Baud rate.
    #[arg(long, default_value_t = 9600)]
    baud: u32,

    /// Per-read timeout in milliseconds. Every query lasts at least this long.
    #[arg(long, default_value_t = 1000)]
    read_timeout_ms: u64,

    /// Write timeout in milliseconds.
    #[arg(long, default_value_t = 1000)]
    write_timeout_ms: u64,

    /// Log filter (e.g. warn, info, denon232=debug). RUST_LOG takes precedence.
    #[arg(long, default_value = "warn", env = "DENON232_LOG")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Refresh and print the state of both zones.
    Status,

    /// Power the selected zone on or off.
    Power {
        #[command(subcommand)]
        action: Switch,
    },

    /// Volume operations on the selected zone.
    Volume {
        #[command(subcommand)]
        action: VolumeAction,
    },

    /// Mute or unmute the selected zone.
    Mute {
        #[command(subcommand)]
        action: Switch,
    },

    /// Select a source by display name (unlisted names are sent verbatim).
    Source { name: String },

    /// List the selectable sources of the selected zone.
    Sources,

    /// Check a port the way initial setup does.
    Validate {
        /// Accept the port without opening it.
        #[arg(long)]
        skip_test: bool,
    },

    /// Poll both zones repeatedly and print each snapshot.
    Monitor {
        /// Seconds between polls.
        #[arg(long, default_value_t = 10)]
        interval: u64,

        /// Number of polls (0 = run until Ctrl-C).
        #[arg(long, default_value_t = 0)]
        count: u64,
    },
}

#[derive(Subcommand, Clone, Copy)]
enum Switch {
    On,
    Off,
}

#[derive(Subcommand)]
enum VolumeAction {
    Up,
    Down,
    /// Set an absolute level between 0.0 and 1.0.
    Set { level: f64 },
}

// ---------------------------------------------------------------------------
// Device construction
// ---------------------------------------------------------------------------

fn receiver_builder(cli: &Cli) -> ReceiverBuilder {
    ReceiverBuilder::new()
        .baud_rate(cli.baud)
        .read_timeout(Duration::from_millis(cli.read_timeout_ms))
        .write_timeout(Duration::from_millis(cli.write_timeout_ms))
}

/// A simulated receiver: main zone on playing CD, zone 2 off on the tuner.
fn simulated_receiver(cli: &Cli) -> MockTransport {
    let mut mock = MockTransport::new();
    mock.respond(b"PW?\r", b"PWON\r");
    mock.respond(b"MV?\r", b"MV555\rMVMAX 80\r");
    mock.respond(b"MU?\r", b"MUOFF\r");
    mock.respond(b"SI?\r", b"SICD\r");
    mock.respond(b"Z2?\r", b"Z2OFF\rZ240\rZ2TUNER\r");
    mock.respond(b"Z2MU?\r", b"Z2MUOFF\r");

    for profile in [main_zone(), zone2()] {
        let mut commands = vec![
            cmd_power(&profile, true),
            cmd_power(&profile, false),
            cmd_volume_step(&profile, true),
            cmd_volume_step(&profile, false),
            cmd_mute(&profile, true),
            cmd_mute(&profile, false),
        ];
        commands.extend((0..=99).map(|steps| cmd_set_volume(&profile, steps)));
        for name in profile.sources.names() {
            commands.push(cmd_select_source(&profile, profile.sources.resolve(&name)));
        }
        if let Command::Source { name } = &cli.command {
            commands.push(cmd_select_source(&profile, profile.sources.resolve(name)));
        }
        for command in commands {
            mock.respond(format!("{command}\r").as_bytes(), b"");
        }
    }
    mock
}

async fn create_device(cli: &Cli) -> Result<Denon232> {
    let builder = Denon232Builder::new()
        .name(&cli.name)
        .receiver(receiver_builder(cli));

    if cli.mock {
        let connector = MockConnector::with_transport(MOCK_PORT, simulated_receiver(cli));
        let device = builder
            .build_with_connector(Box::new(connector))
            .await
            .context("failed to build simulated receiver")?;
        println!("Connected (simulated receiver) -- {}", device.name());
        return Ok(device);
    }

    let port = cli
        .port
        .as_deref()
        .context("--port is required when not using --mock")?;
    let device = builder
        .serial_port(port)
        .build()
        .await
        .with_context(|| format!("failed to set up receiver on {port}"))?;
    if device.is_available() {
        println!("Connected to {port} at {} baud -- {}", cli.baud, device.name());
    } else {
        println!("Receiver on {port} is unavailable; continuing offline");
    }
    Ok(device)
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn print_zone(zone: &ZoneController) {
    let status = zone.status();
    println!("{} ({})", status.zone, zone.unique_id());
    println!("  available: {}", status.available);
    println!("  power:     {}", status.state);
    println!(
        "  volume:    {:.1} / {} ({:.0}%)",
        status.volume,
        status.volume_max,
        status.volume_level * 100.0
    );
    println!("  muted:     {}", status.muted);
    println!(
        "  source:    {}",
        status.source.as_deref().unwrap_or("(unknown)")
    );
}

async fn cmd_status(device: &mut Denon232) -> Result<()> {
    device.refresh_all().await;
    let info = device.device_info();
    println!("{} -- {} {} on {}", info.name, info.manufacturer, info.model, info.identifier);
    print_zone(device.main_zone());
    print_zone(device.zone2());
    Ok(())
}

/// Refresh first so `volume set` scales by the receiver's reported max.
async fn cmd_volume(zone: &mut ZoneController, action: &VolumeAction) -> Result<()> {
    match action {
        VolumeAction::Up => zone.volume_up().await,
        VolumeAction::Down => zone.volume_down().await,
        VolumeAction::Set { level } => {
            if !(0.0..=1.0).contains(level) {
                bail!("volume level must be between 0.0 and 1.0, got {level}");
            }
            zone.refresh().await;
            zone.set_volume(*level).await;
        }
    }
    Ok(())
}

fn cmd_sources(profile: &ZoneProfile) {
    for name in profile.sources.names() {
        let code = profile.sources.resolve(&name);
        println!("{name:<10} {code}");
    }
}

async fn cmd_validate(cli: &Cli, skip_test: bool) -> Result<()> {
    let port = cli
        .port
        .as_deref()
        .context("--port is required for validate")?;
    let request = SetupRequest {
        name: cli.name.clone(),
        serial_port: port.to_string(),
        skip_test,
    };
    let entry = validate_setup(&request)
        .await
        .with_context(|| format!("{port} failed validation"))?;
    println!("OK: \"{}\" on {}", entry.title, entry.serial_port);
    Ok(())
}

async fn cmd_monitor(device: &mut Denon232, interval: u64, count: u64) -> Result<()> {
    let mut ticker = tokio::time::interval(Duration::from_secs(interval.max(1)));
    let mut polls = 0u64;
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => break,
        }
        device.refresh_all().await;
        for zone in [ZoneId::Main, ZoneId::Zone2] {
            let status = device.zone(zone).status();
            println!(
                "{:<9} available={} power={} volume={:.1} muted={} source={}",
                status.zone.to_string(),
                status.available,
                status.state,
                status.volume,
                status.muted,
                status.source.as_deref().unwrap_or("-")
            );
        }
        polls += 1;
        if count > 0 && polls >= count {
            break;
        }
    }
    Ok(())
}

/// Report whether a fire-and-forget command could have reached the receiver.
fn check_sent(device: &Denon232, what: &str) -> Result<()> {
    if !device.is_available() {
        bail!("{what}: receiver unavailable, command not delivered");
    }
    println!("{what}: sent");
    Ok(())
}

fn init_logging(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);
    debug!(zone = %cli.zone, mock = cli.mock, "starting");

    // Validation runs before any device exists.
    if let Command::Validate { skip_test } = &cli.command {
        return cmd_validate(&cli, *skip_test).await;
    }

    let mut device = create_device(&cli).await?;
    let zone_id = cli.zone;

    let result = match &cli.command {
        Command::Status => cmd_status(&mut device).await,
        Command::Power { action } => {
            let zone = device.zone(zone_id);
            match action {
                Switch::On => zone.turn_on().await,
                Switch::Off => zone.turn_off().await,
            }
            check_sent(&device, "power")
        }
        Command::Volume { action } => match cmd_volume(device.zone_mut(zone_id), action).await {
            Ok(()) => check_sent(&device, "volume"),
            Err(e) => Err(e),
        },
        Command::Mute { action } => {
            device
                .zone(zone_id)
                .set_muted(matches!(action, Switch::On))
                .await;
            check_sent(&device, "mute")
        }
        Command::Source { name } => {
            device.zone(zone_id).select_source(name).await;
            check_sent(&device, "source")
        }
        Command::Sources => {
            cmd_sources(device.zone(zone_id).profile());
            Ok(())
        }
        Command::Monitor { interval, count } => cmd_monitor(&mut device, *interval, *count).await,
        Command::Validate { .. } => Ok(()),
    };

    device.close().await;
    result
}
