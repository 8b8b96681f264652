use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use nova_assistant::daemon::{ListenOptions, render};
use nova_assistant::voice::{InputLevel, monitor_input};
use nova_assistant::{Config, Daemon};

/// Nova - wake-word voice assistant
#[derive(Parser)]
#[command(name = "nova", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the classifier over HTTP
    Serve {
        /// Port to listen on (overrides config)
        #[arg(long, env = "NOVA_PORT")]
        port: Option<u16>,
    },
    /// Run the voice loop
    Listen {
        /// Type commands instead of speaking them
        #[arg(long)]
        console: bool,
        /// Print replies instead of speaking them
        #[arg(long)]
        mute: bool,
    },
    /// Answer a single command
    Ask {
        /// Print the raw JSON response
        #[arg(long)]
        json: bool,
        /// Command text
        #[arg(required = true, num_args = 1..)]
        command: Vec<String>,
    },
    /// Show recently logged commands
    History {
        /// Number of entries to show
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn,nova_assistant=info",
        1 => "info,nova_assistant=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve { port } => {
            let mut config = Config::load()?;
            if let Some(port) = port {
                config.api_server.port = port;
            }
            tracing::info!(port = config.api_server.port, "starting nova server");
            daemon(config)?.serve().await?;
        }
        Command::Listen { console, mute } => {
            daemon(Config::load()?)?
                .listen(ListenOptions { console, mute })
                .await?;
        }
        Command::Ask { json, command } => {
            let command = command.join(" ");
            let response = daemon(Config::load()?)?.dispatcher()?.dispatch(&command).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                println!("{}", render(&response, true));
            }
        }
        Command::History { limit } => {
            let records = daemon(Config::load()?)?.command_log().recent(limit)?;
            if records.is_empty() {
                println!("No commands logged yet.");
            }
            for record in records.iter().rev() {
                println!(
                    "{}  {:<30}  {}",
                    record.created_at.format("%Y-%m-%d %H:%M:%S"),
                    record.command,
                    record.response
                );
            }
        }
        Command::TestMic { duration } => test_mic(duration).await?,
    }

    Ok(())
}

fn daemon(config: Config) -> anyhow::Result<Daemon> {
    tracing::debug!(?config, "loaded configuration");
    Ok(Daemon::new(config)?)
}

/// Test microphone input
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    tokio::task::spawn_blocking(move || monitor_input(duration, print_level)).await??;

    println!("\n---");
    println!("If you saw movement in the meter, your mic is working!");
    println!("If RMS stayed near 0, check:");
    println!("  1. Is your mic plugged in?");
    println!("  2. Run: pactl info | grep 'Default Source'");
    println!("  3. Run: arecord -l (to list devices)");

    Ok(())
}

fn print_level(level: InputLevel) {
    // Visual meter
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let meter_len = (level.rms * 100.0).min(50.0) as usize;
    let meter: String = "#".repeat(meter_len) + &" ".repeat(50 - meter_len);

    println!(
        "[{:2}s] RMS: {:.4} | Peak: {:.4} | [{}]",
        level.second, level.rms, level.peak, meter
    );
}
