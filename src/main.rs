//! plcsim - Packet loss concealment simulator

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::level_filters::LevelFilter;
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use plcsim::audio::{
    decode_raw, is_wav_path, read_wav, write_wav, ConcealmentStrategy, MemorySink, PcmWriter,
};
use plcsim::network::{simulate, SimulationReport};
use plcsim::SessionConfig;

#[derive(Parser)]
#[command(name = "plcsim")]
#[command(about = "Packet loss concealment for 16-bit PCM audio streams")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a PCM file through a lossy channel and conceal the losses
    Simulate(SimulateArgs),

    /// List available concealment strategies
    Strategies,
}

#[derive(Args)]
struct SimulateArgs {
    /// Input audio (mono 16-bit WAV, or raw little-endian PCM)
    #[arg(short, long)]
    input: PathBuf,

    /// Output audio (.wav for WAV, anything else for raw PCM)
    #[arg(short, long)]
    output: PathBuf,

    /// Session configuration file (TOML)
    #[arg(short, long, env = "PLCSIM_CONFIG")]
    config: Option<PathBuf>,

    /// Concealment strategy
    #[arg(short, long, value_enum, env = "PLCSIM_STRATEGY")]
    strategy: Option<ConcealmentStrategy>,

    /// Random loss probability per packet (0.0 - 1.0)
    #[arg(long)]
    loss_rate: Option<f64>,

    /// Seed for the loss RNG
    #[arg(long)]
    seed: Option<u64>,

    /// Sequence numbers to drop (comma separated)
    #[arg(long, value_delimiter = ',')]
    drop: Vec<u32>,

    /// Sample rate for WAV output in Hz
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Largest gap to conceal, in packets
    #[arg(long)]
    max_gap: Option<u32>,

    /// Print statistics as JSON
    #[arg(long)]
    stats_json: bool,
}

impl SimulateArgs {
    /// Apply command-line overrides on top of file configuration
    fn apply(&self, config: &mut SessionConfig, input_rate: Option<u32>) {
        if let Some(strategy) = self.strategy {
            config.strategy = strategy;
        }
        if let Some(rate) = self.loss_rate {
            config.loss.rate = rate;
        }
        if self.seed.is_some() {
            config.loss.seed = self.seed;
        }
        config.loss.drop.extend(self.drop.iter().copied());
        if let Some(rate) = self.sample_rate.or(input_rate) {
            config.sample_rate = rate;
        }
        if self.max_gap.is_some() {
            config.max_gap = self.max_gap;
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(LevelFilter::from(level).into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

fn list_strategies() {
    println!("Concealment strategies:");
    for strategy in ConcealmentStrategy::ALL {
        let default_marker = if strategy == ConcealmentStrategy::default() {
            " (default)"
        } else {
            ""
        };
        println!("  - {}{}", strategy, default_marker);
    }
}

/// Read input samples, returning the WAV sample rate when there is one
fn load_input(path: &Path) -> Result<(Vec<i16>, Option<u32>)> {
    if is_wav_path(path) {
        let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
        let (samples, rate) =
            read_wav(file).with_context(|| format!("Failed to read WAV {:?}", path))?;
        Ok((samples, Some(rate)))
    } else {
        let bytes = fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
        Ok((decode_raw(&bytes), None))
    }
}

fn print_report(report: &SimulationReport) {
    println!("\n═══════════════════════════════════════════════════════════════");
    println!(" Simulation Statistics");
    println!("═══════════════════════════════════════════════════════════════");
    println!("   Packets sent:      {:>8}", report.packets_sent);
    println!("   Dropped:           {:>8}", report.channel.dropped);
    println!(
        "   Channel loss:      {:>7.1} %",
        report.channel.loss_rate() * 100.0
    );
    println!("   Received:          {:>8}", report.receiver.packets_received);
    println!("   Gaps:              {:>8}", report.receiver.gaps);
    println!("   Concealed:         {:>8}", report.receiver.packets_concealed);
    println!("   Stale dropped:     {:>8}", report.receiver.packets_stale);
    println!("   Samples written:   {:>8}", report.receiver.samples_written);
}

fn run_simulate(args: SimulateArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => SessionConfig::load(path)
            .with_context(|| format!("Failed to load config {:?}", path))?,
        None => SessionConfig::default(),
    };

    let (samples, input_rate) = load_input(&args.input)?;
    args.apply(&mut config, input_rate);
    config.validate()?;

    let SimulateArgs {
        input,
        output,
        stats_json,
        ..
    } = args;

    info!("Input: {:?} ({} samples)", input, samples.len());
    info!("Session config: {:?}", config);

    let file =
        File::create(&output).with_context(|| format!("Failed to create {:?}", output))?;
    let writer = BufWriter::new(file);

    let report = if is_wav_path(&output) {
        let (report, sink) = simulate(&samples, &config, MemorySink::new())?;
        write_wav(writer, sink.samples(), config.sample_rate)?;
        report
    } else {
        let (report, sink) = simulate(&samples, &config, PcmWriter::new(writer))?;
        sink.into_inner()?;
        report
    };

    info!("Output written to {:?}", output);

    if stats_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Simulate(args) => run_simulate(args),
        Commands::Strategies => {
            list_strategies();
            Ok(())
        }
    }
}
