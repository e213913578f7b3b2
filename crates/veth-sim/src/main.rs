//! veth-sim: replays a scenario against the vETH accounting core.
//!
//! ```text
//! veth-sim [--config PATH] SCENARIO.json
//! ```
//!
//! Emitted events go to stdout as JSON lines; logs go to stderr.

mod config;
mod events;
mod scenario;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::SimConfig;
use crate::events::EventBus;
use crate::scenario::Protocol;

/// Event buffer; the printer lags rather than blocking the replay.
const EVENT_BUFFER: usize = 4096;

/// Parsed command line.
#[derive(Debug, PartialEq, Eq)]
struct Args {
    config: Option<PathBuf>,
    scenario: PathBuf,
}

impl Args {
    fn parse<I: IntoIterator<Item = String>>(args: I) -> anyhow::Result<Self> {
        let mut config = None;
        let mut scenario = None;
        let mut iter = args.into_iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    let path = iter.next().context("--config needs a path")?;
                    config = Some(PathBuf::from(path));
                }
                flag if flag.starts_with('-') => bail!("unknown flag {flag}"),
                _ if scenario.is_some() => bail!("only one scenario file may be given"),
                path => scenario = Some(PathBuf::from(path)),
            }
        }
        let scenario = scenario.context("usage: veth-sim [--config PATH] SCENARIO.json")?;
        Ok(Self { config, scenario })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse(std::env::args().skip(1))?;

    // 1. Load config
    let config = SimConfig::load(args.config.as_deref())?;

    // 2. Initialize tracing; RUST_LOG wins over the config level
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&config.logging.level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!(scenario = %args.scenario.display(), "veth-sim starting");

    // 3. Load scenario and build genesis state
    let steps = scenario::load(&args.scenario)?;
    let protocol = Arc::new(Mutex::new(Protocol::new(&config)?));

    // 4. Printer task
    let bus = EventBus::new(EVENT_BUFFER);
    let mut rx = bus.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => match event.to_json_line() {
                    Ok(line) => println!("{line}"),
                    Err(e) => warn!("event serialization failed: {}", e),
                },
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "event printer lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    // 5. Replay; each step holds the state lock for its whole duration
    let mut failed = 0usize;
    for (index, step) in steps.iter().enumerate() {
        let mut state = protocol.lock().await;
        match state.apply(step) {
            Ok(recorded) => {
                info!(
                    step = index,
                    op = step.op.name(),
                    at = step.at,
                    events = recorded.len(),
                    "step applied"
                );
                for event in recorded {
                    bus.emit(index, step.at, event);
                }
            }
            Err(e) => {
                failed += 1;
                warn!(step = index, op = step.op.name(), at = step.at, "step failed: {:#}", e);
            }
        }
    }

    let emitted = bus.sequence();
    drop(bus);
    printer.await?;

    let summary = protocol.lock().await.summary()?;
    info!(
        steps = steps.len(),
        failed,
        events = emitted,
        token_pool = %summary.token_pool,
        voucher_supply = %summary.voucher_supply,
        exchange_rate = %summary.exchange_rate,
        ledger_balance = %summary.ledger_balance,
        queued_withdrawal = %summary.queued_withdrawal,
        completed_withdrawal = %summary.completed_withdrawal,
        sink_balance = %summary.sink_balance,
        vault_total = %summary.vault_total,
        vault_paid = %summary.vault_paid,
        "replay finished"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> anyhow::Result<Args> {
        Args::parse(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_args_scenario_only() {
        let parsed = args(&["run.json"]).expect("args");
        assert_eq!(
            parsed,
            Args {
                config: None,
                scenario: PathBuf::from("run.json")
            }
        );
    }

    #[test]
    fn test_args_with_config() {
        let parsed = args(&["--config", "veth.toml", "run.json"]).expect("args");
        assert_eq!(parsed.config, Some(PathBuf::from("veth.toml")));
    }

    #[test]
    fn test_args_rejections() {
        assert!(args(&[]).is_err());
        assert!(args(&["--config"]).is_err());
        assert!(args(&["a.json", "b.json"]).is_err());
        assert!(args(&["--verbose", "a.json"]).is_err());
    }
}
