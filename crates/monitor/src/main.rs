use std::io;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use nmea_replay::{TcpMonitor, UdpMonitor, any_addr, forward, is_disconnect};

#[derive(Parser)]
#[command(name = "replay-monitor")]
#[command(about = "Print whatever a replay transmitter sends")]
struct Args {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Listen for (broadcast) datagrams on 0.0.0.0:<PORT>.
    Udp { port: u16 },
    /// Accept one TCP connection on 0.0.0.0:<PORT>.
    Tcp { port: u16 },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    tokio::select! {
        result = run(args.mode) => result,
        _ = tokio::signal::ctrl_c() => {
            log::info!("Interrupted, shutting down");
            Ok(())
        }
    }
}

async fn run(mode: Mode) -> Result<()> {
    let mut stdout = io::stdout();

    match mode {
        Mode::Udp { port } => {
            let mut monitor = UdpMonitor::bind(any_addr(port))
                .await
                .with_context(|| format!("failed to bind UDP port {}", port))?;
            log::info!("Listening on {}", monitor.local_addr());

            monitor.run(&mut stdout).await?;
            Ok(())
        }
        Mode::Tcp { port } => {
            let monitor = TcpMonitor::bind(any_addr(port))
                .await
                .with_context(|| format!("failed to bind TCP port {}", port))?;
            log::info!("Waiting for connection on port {}...", port);

            let (mut stream, peer) = monitor.accept().await?;
            log::info!("Connected by {}", peer);

            report(forward(&mut stream, &mut stdout).await)
        }
    }
}

/// A peer that goes away mid-stream ends the session cleanly.
fn report(result: io::Result<u64>) -> Result<()> {
    match result {
        Ok(total) => {
            log::info!("Connection closed after {} bytes", total);
            Ok(())
        }
        Err(e) if is_disconnect(&e) => {
            log::info!("Client disconnected");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn reset_connection_is_a_clean_exit() {
        assert!(report(Ok(42)).is_ok());
        assert!(report(Err(io::Error::from(io::ErrorKind::ConnectionReset))).is_ok());
    }

    #[test]
    fn other_read_errors_fail() {
        assert!(report(Err(io::Error::from(io::ErrorKind::PermissionDenied))).is_err());
    }
}
