// CLI entry point for the duel match relay.
//
// Starts a standalone relay that game clients talk to over UDP. The relay
// assigns roles, starts the match when both players are present, and
// forwards every update to both of them. See `server.rs` for the threading
// architecture and `coordinator.rs` for the match state machine.
//
// Usage:
//   relay [OPTIONS]
//     --port <PORT>    Listen port (default: 12345)

use std::thread;
use std::time::Duration;

use duel_relay::server::{RelayConfig, start_relay};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = parse_args();

    let (_handle, addr) = match start_relay(config) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Failed to start relay: {e}");
            std::process::exit(1);
        }
    };

    println!("Relay listening on {addr}");
    println!("Press Ctrl+C to stop.");

    // The receive loop runs on its own thread; park here until the process
    // is killed. SIGINT/SIGTERM terminate the process, which tears the
    // relay threads down with it. `RelayHandle::stop` exists for embedding
    // callers that need a graceful in-process shutdown.
    loop {
        thread::sleep(Duration::from_secs(1));
    }
}

/// Parse command-line arguments into a `RelayConfig`. Uses simple
/// `std::env::args()` matching; no clap dependency.
fn parse_args() -> RelayConfig {
    let mut config = RelayConfig::default();
    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--port" => {
                i += 1;
                config.port = args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--port requires a valid port number");
                    std::process::exit(1);
                });
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    config
}

fn print_usage() {
    println!("Usage: relay [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --port <PORT>    Listen port (default: 12345)");
    println!("  --help, -h       Show this help");
}
