// pumplink — GATT operation diagnostics
//
// Inspect engine configuration and run single operations against an
// in-process loopback radio to observe success, timeout and interruption.

mod config;
mod loopback;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use pumplink_core::gatt::{AttributeId, ExecutionEngine, Operation, Outcome};
use std::thread;
use std::time::{Duration, Instant};
use uuid::Uuid;

use loopback::{LoopbackBehavior, LoopbackRadio};

#[derive(Parser)]
#[command(name = "pumplink")]
#[command(about = "PumpLink — blocking GATT operation diagnostics", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure engine settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Run one operation against the loopback radio
    Simulate(SimulateArgs),
}

#[derive(Subcommand)]
enum ConfigAction {
    Set { key: String, value: String },
    Get { key: String },
    List,
    Path,
}

#[derive(Clone, Copy, ValueEnum)]
enum OpKind {
    Read,
    Write,
    /// Enable notifications via the CCCD
    Notify,
}

#[derive(clap::Args)]
struct SimulateArgs {
    #[arg(value_enum)]
    kind: OpKind,
    /// Characteristic UUID or 16-bit short form
    #[arg(short, long, default_value = "2a19")]
    target: String,
    /// Hex payload (written for `write`, seeded for `read`)
    #[arg(short, long, default_value = "")]
    payload: String,
    /// Callback latency
    #[arg(long, default_value = "10")]
    latency_ms: u64,
    /// Never call back
    #[arg(long)]
    drop: bool,
    /// Call back twice
    #[arg(long)]
    duplicate: bool,
    /// Identifier the callback reports instead of the target
    #[arg(long)]
    reply_id: Option<String>,
    /// Interrupt the wait after this many milliseconds
    #[arg(long)]
    interrupt_after_ms: Option<u64>,
    /// Override the configured timeout
    #[arg(long)]
    timeout_ms: Option<u64>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { action } => cmd_config(action),
        Commands::Simulate(args) => cmd_simulate(args),
    }
}

fn cmd_config(action: ConfigAction) -> Result<()> {
    let mut engine_config = config::load()?;

    match action {
        ConfigAction::Set { key, value } => {
            engine_config.set(&key, &value)?;
            config::save(&engine_config)?;
            println!("{} Set {} = {}", "✓".green(), key.bright_cyan(), value);
        }

        ConfigAction::Get { key } => {
            if let Some(value) = engine_config.get(&key) {
                println!("{} = {}", key.bright_cyan(), value);
            } else {
                anyhow::bail!("Unknown config key: {}", key);
            }
        }

        ConfigAction::List => {
            println!("{}", "Configuration".bold());
            println!();

            for (key, value) in engine_config.list() {
                println!("  {:<28} {}", key.bright_cyan(), value);
            }
        }

        ConfigAction::Path => {
            println!("{}", config::config_file()?.display());
        }
    }

    Ok(())
}

fn cmd_simulate(args: SimulateArgs) -> Result<()> {
    let engine = ExecutionEngine::new(config::load()?).context("Invalid engine config")?;
    let target = AttributeId::parse(&args.target)?;
    let payload = hex::decode(args.payload.trim_start_matches("0x"))
        .context("Payload must be hex")?;
    let reply_id = args
        .reply_id
        .as_deref()
        .map(|s| AttributeId::parse(s).map(Uuid::from))
        .transpose()?;

    let radio = LoopbackRadio::new(LoopbackBehavior {
        latency: Duration::from_millis(args.latency_ms),
        drop_callbacks: args.drop,
        duplicate: args.duplicate,
        reply_id,
    });

    let mut operation = match args.kind {
        OpKind::Read => {
            radio.set_value(target, payload);
            Operation::read(target.uuid())?
        }
        OpKind::Write => Operation::write(target.uuid(), payload)?,
        OpKind::Notify => Operation::enable_notifications(target.uuid())?,
    };
    if let Some(ms) = args.timeout_ms {
        operation = operation.with_timeout(Duration::from_millis(ms));
    }

    let canceller = args.interrupt_after_ms.map(|ms| {
        let interrupter = operation.interrupter();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(ms));
            interrupter.interrupt();
        })
    });

    println!(
        "{} {} {}",
        "Issuing".bold(),
        operation.kind(),
        operation.target().to_string().bright_cyan()
    );

    let start = Instant::now();
    let outcome = engine.execute(&mut operation, &radio)?;
    let elapsed = start.elapsed();

    if let Some(handle) = canceller {
        let _ = handle.join();
    }

    match &outcome {
        Outcome::Success(value) => {
            println!("  {} Success: {}", "✓".green(), hex::encode(value).bright_yellow());
            if let Some(received) = operation.received_id() {
                if !operation.target().matches(&received) {
                    println!(
                        "  {} Completed by callback for {}",
                        "!".yellow(),
                        received
                    );
                }
            }
        }
        Outcome::Timeout => println!("  {} Timeout", "✗".red()),
        Outcome::Interrupted => println!("  {} Interrupted", "✗".yellow()),
    }
    println!("  Elapsed: {:?}", elapsed);

    Ok(())
}
