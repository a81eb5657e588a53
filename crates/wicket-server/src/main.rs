//! Wicket gateway binary.
//!
//! Binds the UDP transport, steps the session once per cycle, and feeds
//! relayed bytes to a minimal line-echo console so the gateway can be driven
//! end to end with any UDP-capable terminal client.

mod console;
mod delay;
mod udp;

use std::thread;
use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use wicket_core::{Session, SessionConfig};

use crate::console::EchoConsole;
use crate::delay::ThreadDelay;
use crate::udp::UdpTransport;

/// Single-client UDP login gateway.
#[derive(Debug, Parser)]
#[command(name = "wicket-server", version, about)]
struct Args {
    /// Local UDP port to bind.
    #[arg(long, default_value_t = 5683)]
    port: u16,

    /// Expected username.
    #[arg(long, default_value = "guest")]
    username: String,

    /// Expected password.
    #[arg(long, default_value = "guest")]
    password: String,

    /// Idle seconds without received data before a forced reset.
    #[arg(long, default_value_t = 300)]
    idle_timeout_secs: u64,

    /// Scheduler cycle period in milliseconds.
    #[arg(long, default_value_t = 10)]
    cycle_ms: u64,

    /// Welcome banner sent when a client appears.
    #[arg(long, default_value = "Wicket console\r\n")]
    banner: String,
}

fn main() {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args = Args::parse();
    let config = SessionConfig {
        port: args.port,
        username: args.username,
        password: args.password,
        banner: args.banner,
        idle_timeout: Duration::from_secs(args.idle_timeout_secs),
        cycle_time: Duration::from_millis(args.cycle_ms),
        ..SessionConfig::default()
    };
    let cycle = config.cycle_time;

    let mut session = Session::new(config, UdpTransport::new(), ThreadDelay);
    let mut console = EchoConsole::new();
    session.enable();
    info!(port = args.port, "gateway enabled");

    loop {
        session.step();
        console.poll(&mut session);
        thread::sleep(cycle);
    }
}
