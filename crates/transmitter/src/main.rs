use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use nmea_replay::{
    BroadcastConfig, BroadcastSink, ReplayConfig, ReplayError, ReplayListener, Replayer,
    SessionStats, Sink, any_addr, broadcast_sources, connect,
};

#[derive(Parser)]
#[command(name = "replay-tx")]
#[command(about = "Replay a timestamped NMEA/YDWG log at its recorded pace")]
struct Args {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Wait for one TCP connection on 0.0.0.0:<PORT> and stream the log to it.
    Serve {
        port: u16,
        file: PathBuf,

        #[arg(long, help = "Start over when the log is exhausted")]
        repeat: bool,
    },
    /// Connect to <HOST>:<PORT> and stream the log.
    Connect {
        host: String,
        port: u16,
        file: PathBuf,

        #[arg(long, help = "Start over when the log is exhausted")]
        repeat: bool,
    },
    /// Send every line as a datagram to 255.255.255.255:<PORT>.
    Broadcast {
        port: u16,
        file: PathBuf,

        #[arg(long, help = "Start over when the log is exhausted")]
        repeat: bool,

        #[arg(long = "source", help = "Local IPv4 address to send from (repeatable)")]
        sources: Vec<Ipv4Addr>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    match args.mode {
        Mode::Serve { port, file, repeat } => {
            let replayer = load(&file, repeat)?;
            let listener = ReplayListener::bind(any_addr(port))
                .await
                .with_context(|| format!("failed to bind port {}", port))?;

            log::info!("Waiting for connection on port {}...", listener.local_addr().port());
            let (mut sink, peer) = listener.accept().await?;
            log::info!("Connected by {}", peer);

            finish(replay(&replayer, &mut sink).await)
        }
        Mode::Connect {
            host,
            port,
            file,
            repeat,
        } => {
            let replayer = load(&file, repeat)?;

            log::info!("Attempting to connect to {}:{}...", host, port);
            let mut sink = connect((host.as_str(), port))
                .await
                .with_context(|| format!("failed to connect to {}:{}", host, port))?;
            log::info!("Connected");

            finish(replay(&replayer, &mut sink).await)
        }
        Mode::Broadcast {
            port,
            file,
            repeat,
            sources,
        } => {
            let replayer = load(&file, repeat)?;
            let config = BroadcastConfig::new(port).with_sources(broadcast_sources(&sources));

            let mut sink = BroadcastSink::bind(&config)
                .await
                .context("failed to open broadcast sockets")?;
            log::info!(
                "Broadcasting to {} from {:?}",
                sink.destination(),
                sink.source_addrs()
            );

            let outcome = replay(&replayer, &mut sink).await;
            log::info!(
                "{} datagrams sent, {} failed",
                sink.datagrams_sent(),
                sink.datagrams_failed()
            );
            finish(outcome)
        }
    }
}

fn load(file: &Path, repeat: bool) -> Result<Replayer> {
    Replayer::open(file, ReplayConfig { repeat })
        .with_context(|| format!("failed to load {}", file.display()))
}

/// Replays until done, or until Ctrl-C cuts the current wait short.
async fn replay<S: Sink>(
    replayer: &Replayer,
    sink: &mut S,
) -> Option<Result<SessionStats, ReplayError>> {
    log::info!("Transmitting data...");
    tokio::select! {
        result = replayer.run(sink) => Some(result),
        _ = tokio::signal::ctrl_c() => {
            log::info!("Interrupted, shutting down");
            None
        }
    }
}

fn finish(outcome: Option<Result<SessionStats, ReplayError>>) -> Result<()> {
    match outcome {
        Some(Ok(stats)) => {
            log::info!(
                "Done: {} lines, {} bytes sent",
                stats.lines_sent,
                stats.bytes_sent
            );
            Ok(())
        }
        Some(Err(e)) if e.is_disconnect() => {
            log::info!("Client disconnected");
            Ok(())
        }
        Some(Err(e)) => Err(e.into()),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use clap::CommandFactory;
    use nmea_replay::SinkError;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn broadcast_accepts_repeated_sources() {
        let args = Args::try_parse_from([
            "replay-tx",
            "broadcast",
            "2000",
            "log.txt",
            "--source",
            "10.0.0.2",
            "--source",
            "192.168.1.5",
            "--repeat",
        ])
        .unwrap();

        match args.mode {
            Mode::Broadcast {
                port,
                repeat,
                sources,
                ..
            } => {
                assert_eq!(port, 2000);
                assert!(repeat);
                assert_eq!(sources.len(), 2);
            }
            _ => panic!("expected broadcast mode"),
        }
    }

    #[test]
    fn disconnect_finishes_cleanly() {
        let outcome = Some(Err(ReplayError::Sink(SinkError::Disconnected)));
        assert!(finish(outcome).is_ok());
    }

    #[test]
    fn other_sink_errors_fail() {
        let err = SinkError::Io(io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(finish(Some(Err(err.into()))).is_err());
    }

    #[test]
    fn interrupted_and_completed_runs_succeed() {
        assert!(finish(None).is_ok());
        assert!(finish(Some(Ok(SessionStats::default()))).is_ok());
    }

    #[test]
    fn connect_takes_host_before_port() {
        let args = Args::try_parse_from(["replay-tx", "connect", "localhost", "10110", "log.txt"])
            .unwrap();
        assert!(matches!(
            args.mode,
            Mode::Connect { ref host, port: 10110, repeat: false, .. } if host == "localhost"
        ));
    }
}
