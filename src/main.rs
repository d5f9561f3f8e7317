//! APU register-log player entry point.
//!
//! Replays a register-write log (or the built-in demo) through the APU and plays the result.
//! Usage: elaris-apu [path/to/log.txt] [--region pal] [--trace] [--no-audio]

use std::{
    fs,
    path::PathBuf,
    time::{Duration, Instant},
};

use ansi_term::Colour::{Green, Red, Yellow};
use anyhow::{Context, Result, ensure};
use clap::{Parser, ValueEnum};
use elaris_apu::{
    apu::{apu::APU, region::Region, state::ApuState},
    audio::{self, AudioOutput, Downsampler, SAMPLE_RATE},
    bus::SampleMemory,
    player::{self, Player, RegisterLog},
};
use log::info;
use tracing_subscriber::EnvFilter;

/// Extra playback after the last write so releases and the DMC tail are heard.
const TAIL_SECONDS: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RegionArg {
    Ntsc,
    Pal,
}

impl From<RegionArg> for Region {
    fn from(arg: RegionArg) -> Self {
        match arg {
            RegionArg::Ntsc => Region::Ntsc,
            RegionArg::Pal => Region::Pal,
        }
    }
}

#[derive(Debug, Parser)]
#[command(version, about = "Play NES APU register logs")]
struct Cli {
    /// Register-write log, one `<cycle> <addr> <value>` per line. Plays a demo when omitted.
    log: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = RegionArg::Ntsc)]
    region: RegionArg,

    /// Seconds to play [default: until the last write, plus one second]
    #[arg(long, value_parser = parse_seconds)]
    seconds: Option<f64>,

    /// Raw bytes to place in memory for the DMC to fetch.
    #[arg(long)]
    dmc_data: Option<PathBuf>,

    /// Load address for --dmc-data, in hex.
    #[arg(long, default_value = "C000", value_parser = player::parse_hex)]
    dmc_base: u16,

    /// Run flat out without opening an audio device.
    #[arg(long)]
    no_audio: bool,

    /// Print one line of channel state per frame.
    #[arg(long)]
    trace: bool,

    /// Write the final APU state to this file as JSON.
    #[arg(long)]
    save_state: Option<PathBuf>,
}

/// A finite, non-negative duration in seconds.
fn parse_seconds(text: &str) -> Result<f64> {
    let seconds: f64 = text
        .parse()
        .with_context(|| format!("bad number {:?}", text))?;
    ensure!(
        seconds.is_finite() && seconds >= 0.0,
        "seconds must be a finite, non-negative number, got {}",
        text
    );
    Ok(seconds)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let region = Region::from(cli.region);

    let (log, mut memory) = match &cli.log {
        Some(path) => (RegisterLog::load(path)?, SampleMemory::new()),
        None => (player::demo_log(), player::demo_memory()),
    };
    if let Some(path) = &cli.dmc_data {
        let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        memory.load(cli.dmc_base, &data);
        info!(
            "loaded {} bytes of DMC data at ${:04X}",
            data.len(),
            cli.dmc_base
        );
    }

    let cpu_clock = region.cpu_clock();
    let total_cycles = match cli.seconds {
        Some(seconds) => (seconds * cpu_clock) as u64,
        None => log.last_cycle() + (TAIL_SECONDS * cpu_clock) as u64,
    };
    info!(
        "{} writes, {:?}, {:.2} s",
        log.writes.len(),
        region,
        total_cycles as f64 / cpu_clock
    );

    let mut player = Player::new(APU::new(region), memory, log);
    let (mut producer, source) = audio::sample_queue(SAMPLE_RATE as usize / 4);
    let _output = if cli.no_audio {
        None
    } else {
        Some(AudioOutput::open(source)?)
    };
    let mut downsampler = Downsampler::new(cpu_clock);

    let frame_cycles = region.cycles_per_frame() as u64;
    let frame_duration = Duration::from_secs_f64(frame_cycles as f64 / cpu_clock);
    let mut remaining = total_cycles;
    let mut frame = 0u64;
    while remaining > 0 {
        let frame_start = Instant::now();
        let cycles = remaining.min(frame_cycles);
        player.run(cycles, |sample| {
            if let Some(out) = downsampler.push(sample) {
                if !cli.no_audio {
                    producer.push(out);
                }
            }
        });
        remaining -= cycles;

        if cli.trace {
            trace_frame(frame, &player.apu().snapshot());
        }
        frame += 1;

        // Pace to real time when someone is listening.
        if !cli.no_audio {
            let elapsed = frame_start.elapsed();
            if elapsed < frame_duration {
                std::thread::sleep(frame_duration - elapsed);
            }
        }
    }
    if !cli.no_audio {
        // Let the queue drain before the stream is dropped.
        std::thread::sleep(Duration::from_millis(250));
    }

    info!(
        "done: {} frames, {} DMC stall cycles, {} samples dropped",
        frame,
        player.stall_cycles(),
        producer.dropped()
    );

    if let Some(path) = &cli.save_state {
        let json = serde_json::to_string_pretty(&player.apu().snapshot())?;
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        info!("saved APU state to {}", path.display());
    }
    Ok(())
}

/// One line per frame: level and frequency per channel, green while its length counter (or
/// DMC byte count) is running, red when idle; pending IRQs in yellow.
fn trace_frame(frame: u64, state: &ApuState) {
    let clock = state.region.cpu_clock();
    let channel = |name: &str, level: u8, active: bool, hz: f64| {
        let text = format!("{}:{:>3} {:>8.1}Hz", name, level, hz);
        if active {
            Green.paint(text).to_string()
        } else {
            Red.paint(text).to_string()
        }
    };

    let mut irq = String::new();
    if state.frame_counter.irq_pending {
        irq.push('F');
    }
    if state.dmc.irq_pending {
        irq.push('D');
    }
    if state.external_irq {
        irq.push('X');
    }

    println!(
        "{:>5} CYC:{:<10} {} {} {} {} {} IRQ:{}",
        frame,
        state.cycle,
        channel(
            "P1",
            state.levels.pulse1,
            state.pulse1.length.is_active(),
            state.pulse1.frequency(clock)
        ),
        channel(
            "P2",
            state.levels.pulse2,
            state.pulse2.length.is_active(),
            state.pulse2.frequency(clock)
        ),
        channel(
            "TR",
            state.levels.triangle,
            state.triangle.length.is_active(),
            state.triangle.frequency(clock)
        ),
        channel(
            "NO",
            state.levels.noise,
            state.noise.length.is_active(),
            state.noise.frequency(clock)
        ),
        channel(
            "DM",
            state.levels.dmc,
            state.dmc.is_active(),
            state.dmc.sample_rate(clock)
        ),
        Yellow.paint(irq)
    );
}
