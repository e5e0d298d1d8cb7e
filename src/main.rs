//! Entry point for `arq-over-udp`.
//!
//! Parses CLI arguments and dispatches into either **serve** (lossy-channel
//! receiver) or **send** (ARQ sender) mode.  All actual protocol work is
//! delegated to library modules; `main.rs` owns only process setup (logging,
//! argument parsing).

use std::net::SocketAddr;
use std::time::Duration;

use clap::{Parser, Subcommand};

use arq_over_udp::receiver::{LossyReceiver, ReceiverConfig};
use arq_over_udp::sender::{ArqSender, SenderConfig};

/// Windowed ARQ data transfer over a lossy UDP channel.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Run the receiver: acknowledge inbound packets across a simulated
    /// lossy channel.
    Serve {
        /// Local address to bind (e.g. 0.0.0.0:8888).
        #[arg(short, long, default_value = "0.0.0.0:8888")]
        bind: SocketAddr,

        /// Probability in [0, 1) that an inbound DATA packet is dropped.
        #[arg(short = 'p', long, default_value_t = 0.2, value_parser = parse_probability)]
        drop_probability: f64,
    },
    /// Run the sender: handshake, transfer, and print the transfer report.
    Send {
        /// Receiver address (e.g. 127.0.0.1:8888).
        #[arg(short, long)]
        server: SocketAddr,

        /// Sliding-window capacity N.
        #[arg(short, long, default_value_t = 5)]
        window: u16,

        /// DATA payload size in bytes.
        #[arg(long, default_value_t = 80)]
        payload_size: u16,

        /// Retry timeout in milliseconds.
        #[arg(long, default_value_t = 300)]
        retry_timeout_ms: u64,

        /// Total number of packets to send.
        #[arg(short, long, default_value_t = 30)]
        count: u16,

        /// Bound the handshake: re-send the SYN after each expired poll and
        /// give up after this many retries.  Omit to wait forever, matching
        /// the protocol's permissive default.
        #[arg(long)]
        handshake_retries: Option<u32>,
    },
}

fn parse_probability(s: &str) -> Result<f64, String> {
    let p: f64 = s.parse().map_err(|_| format!("`{s}` is not a number"))?;
    if (0.0..1.0).contains(&p) {
        Ok(p)
    } else {
        Err(format!("drop probability must be in [0, 1), got {p}"))
    }
}

#[tokio::main]
async fn main() {
    // Initialise env_logger; set RUST_LOG to control verbosity.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let result = match cli.mode {
        Mode::Serve {
            bind,
            drop_probability,
        } => serve(bind, drop_probability).await,
        Mode::Send {
            server,
            window,
            payload_size,
            retry_timeout_ms,
            count,
            handshake_retries,
        } => {
            let config = SenderConfig {
                server,
                window_capacity: window,
                payload_size,
                retry_timeout: Duration::from_millis(retry_timeout_ms),
                total_count: count,
                max_handshake_retries: handshake_retries,
            };
            send(config).await
        }
    };

    if let Err(e) = result {
        log::error!("{e}");
        std::process::exit(1);
    }
}

async fn serve(bind: SocketAddr, drop_probability: f64) -> Result<(), Box<dyn std::error::Error>> {
    let receiver = LossyReceiver::bind(ReceiverConfig {
        bind,
        drop_probability,
    })
    .await?;
    receiver.serve().await?;
    Ok(())
}

async fn send(config: SenderConfig) -> Result<(), Box<dyn std::error::Error>> {
    let sender = ArqSender::bind(config).await?;
    let report = sender.run().await?;
    println!("{report}");
    Ok(())
}
