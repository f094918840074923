//! midi-player command line
//!
//! Usage:
//!   midi-player notes <FILE> [--channel N] [--pretty]   - Print the note timeline as JSON
//!   midi-player info <FILE>                             - Summarize a MIDI file
//!   midi-player simulate <FILE> [--config F] [--loop]   - Play a file on a silent transport

use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use midi_player::{
    decode_and_extract, describe, format_time, InstrumentBank, LoadedResources, MidiPlayer,
    PlaybackRegistry, PlayerEvent, SmfDecoder, VirtualClock, VirtualTransportFactory,
    WidgetConfig, CHANNEL_COUNT,
};

#[derive(Parser)]
#[command(name = "midi-player", about = "Inspect and simulate MIDI playback")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the note timeline as JSON
    Notes {
        file: PathBuf,
        /// Only this channel (0-15)
        #[arg(short, long)]
        channel: Option<u8>,
        /// Indent the output
        #[arg(long)]
        pretty: bool,
    },
    /// Summarize tracks, tempo and notes
    Info { file: PathBuf },
    /// Play a file on a silent virtual transport, printing events as JSON lines
    Simulate {
        file: PathBuf,
        /// Widget configuration in YAML
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Loop playback (overrides the config file)
        #[arg(long = "loop")]
        loop_playback: bool,
        /// Clock step between transport polls, in milliseconds
        #[arg(long, default_value_t = 50)]
        step_ms: u64,
        /// Stop after this many loop restarts
        #[arg(long, default_value_t = 1)]
        max_loops: usize,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Notes {
            file,
            channel,
            pretty,
        } => print_notes(&file, channel, pretty),
        Commands::Info { file } => print_info(&file),
        Commands::Simulate {
            file,
            config,
            loop_playback,
            step_ms,
            max_loops,
        } => simulate(&file, config.as_deref(), loop_playback, step_ms, max_loops),
    }
}

fn read_midi(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Error reading file '{}'", path.display()))
}

fn print_notes(path: &Path, channel: Option<u8>, pretty: bool) -> Result<()> {
    let timeline = decode_and_extract(&read_midi(path)?)
        .with_context(|| format!("Could not extract notes from '{}'", path.display()))?;

    let json = match channel {
        Some(ch) if usize::from(ch) >= CHANNEL_COUNT => {
            bail!("Channel must be between 0 and {}", CHANNEL_COUNT - 1)
        }
        Some(ch) if pretty => serde_json::to_string_pretty(timeline.channel(ch))?,
        Some(ch) => serde_json::to_string(timeline.channel(ch))?,
        None if pretty => serde_json::to_string_pretty(&timeline)?,
        None => serde_json::to_string(&timeline)?,
    };
    println!("{}", json);
    Ok(())
}

fn print_info(path: &Path) -> Result<()> {
    let summary = describe(&read_midi(path)?)
        .with_context(|| format!("Could not decode '{}'", path.display()))?;

    println!("File:          {}", path.display());
    println!("Duration:      {}", format_time(summary.duration));
    println!("Division:      {} ticks per quarter", summary.time_division);
    println!("Initial tempo: {:.1} BPM", summary.initial_bpm);
    println!("Tracks:        {}", summary.tracks);
    println!("Events:        {}", summary.events);
    println!("Notes:         {}", summary.notes);
    for channel in &summary.channels {
        println!(
            "  channel {:>2}: {:>5} notes, pitch {}-{}",
            channel.channel, channel.notes, channel.lowest_pitch, channel.highest_pitch
        );
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<WidgetConfig> {
    let Some(path) = path else {
        return Ok(WidgetConfig {
            instrument_bank: Some(String::new()),
            ..WidgetConfig::default()
        });
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("Error reading config '{}'", path.display()))?;
    serde_yaml::from_str(&text).with_context(|| format!("Invalid config '{}'", path.display()))
}

fn simulate(
    path: &Path,
    config_path: Option<&Path>,
    loop_playback: bool,
    step_ms: u64,
    max_loops: usize,
) -> Result<()> {
    if step_ms == 0 {
        bail!("--step-ms must be positive");
    }
    let bytes = read_midi(path)?;
    let mut config = load_config(config_path)?;
    config.src = Some(path.display().to_string());
    config.loop_playback |= loop_playback;

    let clock = VirtualClock::new();
    let factory = VirtualTransportFactory::new(clock.clone());
    let player = MidiPlayer::with_config(
        PlaybackRegistry::new(),
        Box::new(SmfDecoder),
        Box::new(factory),
        config,
    );

    let loops = Rc::new(Cell::new(0usize));
    {
        let clock = clock.clone();
        let loops = loops.clone();
        player.add_listener(move |event| {
            if matches!(event, PlayerEvent::Loop) {
                loops.set(loops.get() + 1);
            }
            let line = serde_json::json!({ "clock": clock.now(), "event": event });
            println!("{}", line);
        });
    }

    player
        .reload_with(|request| {
            Ok(LoadedResources {
                midi: Some(bytes),
                bank: Some(InstrumentBank::new(request.bank_url.clone(), Vec::new())),
            })
        })
        .with_context(|| format!("Could not load '{}'", path.display()))?;

    if !player.start() {
        bail!("Player did not start");
    }
    let step = step_ms as f64 / 1000.0;
    while player.is_playing() {
        clock.advance(step);
        player.tick();
        if loops.get() >= max_loops && player.is_playing() && player.config().loop_playback {
            player.stop();
        }
    }
    log::info!("Simulation ended after {:.3}s of transport time", clock.now());
    Ok(())
}
