use std::future::Future;
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::time::Duration;

use colored::Colorize;
use crossterm::{cursor, terminal, QueueableCommand};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{broadcast, mpsc};

use livedev_core::{IgnoreSet, InstallationPath, ScriptName};
use livedev_locator::{log_file, plugin_destination, Locator};
use livedev_sync::Mirror;

use crate::error::{io_err, RuntimeError};
use crate::relay::{LogRelay, RelayedLine};
use crate::restart::Restarter;
use crate::tail::LogTail;
use crate::watcher::ChangeWatcher;
use crate::watchman::WatchmanClient;

/// How often the log file is checked for new lines.
pub const LOG_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// How long blocking work may outlive the runtime on exit.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

const LOG_BANNER: &str = "Ableton Live log output:";

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Command-line inputs to a watch session.
#[derive(Debug, Clone, Default)]
pub struct WatchOptions {
    pub working_dir: PathBuf,
    pub live_path: Option<PathBuf>,
    pub live_set: Option<PathBuf>,
    pub name: Option<String>,
}

/// Everything resolved before watching starts.
#[derive(Debug, Clone)]
pub struct Session {
    pub working_dir: PathBuf,
    pub script: ScriptName,
    pub installation: InstallationPath,
    pub destination: PathBuf,
    pub ignore: IgnoreSet,
    pub log_file: PathBuf,
    pub live_set: Option<PathBuf>,
}

impl Session {
    /// Resolve the installation, ignore rules and log directory, in that
    /// order. Any failure here is a configuration error.
    pub fn prepare(options: WatchOptions, locator: &Locator) -> Result<Self, RuntimeError> {
        let script = match options.name {
            Some(name) => ScriptName::from(name),
            None => ScriptName::from_dir(&options.working_dir).ok_or_else(|| {
                RuntimeError::ScriptName {
                    path: options.working_dir.clone(),
                }
            })?,
        };

        let installation = locator.locate_installation(options.live_path.as_deref())?;
        let destination = plugin_destination(&installation, &script);
        let ignore = IgnoreSet::load(&options.working_dir)?;
        let log_dir = locator.select_log_directory(&installation)?;

        tracing::debug!(
            installation = %installation,
            destination = %destination.display(),
            log_dir = %log_dir.display(),
            ignore_rules = ignore.len(),
            "session prepared",
        );

        Ok(Self {
            working_dir: options.working_dir,
            script,
            installation,
            destination,
            ignore,
            log_file: log_file(&log_dir),
            live_set: options.live_set,
        })
    }
}

// ---------------------------------------------------------------------------
// Cycle
// ---------------------------------------------------------------------------

/// One sync-then-restart pass. Cheap to clone into the processor task.
#[derive(Debug, Clone)]
pub struct Cycle {
    source: PathBuf,
    destination: PathBuf,
    installation: InstallationPath,
    live_set: Option<PathBuf>,
    mirror: Mirror,
    restarter: Restarter,
}

impl Cycle {
    pub fn for_session(session: &Session) -> Self {
        Self {
            source: session.working_dir.clone(),
            destination: session.destination.clone(),
            installation: session.installation.clone(),
            live_set: session.live_set.clone(),
            mirror: Mirror::rsync(),
            restarter: Restarter::osascript(),
        }
    }

    /// Swap the external programs, for tests and unusual setups.
    pub fn with_programs(mut self, mirror: Mirror, restarter: Restarter) -> Self {
        self.mirror = mirror;
        self.restarter = restarter;
        self
    }

    /// Run the cycle with the relay paused. The pause lifts on every exit.
    pub async fn run(&self, relay: &LogRelay) -> Result<(), RuntimeError> {
        let _paused = relay.pause();
        clear_console();

        println!(
            "Syncing {} to {} ...",
            self.source.display(),
            self.destination.display()
        );
        let mirror = self.mirror.clone();
        let (source, destination) = (self.source.clone(), self.destination.clone());
        let report = tokio::task::spawn_blocking(move || mirror.mirror(&source, &destination))
            .await
            .map_err(|err| RuntimeError::Task {
                task: "sync",
                message: err.to_string(),
            })??;
        tracing::info!(
            destination = %report.destination.display(),
            duration_ms = report.duration.as_millis(),
            "sync completed",
        );
        println!("{}", "DONE".green());

        match &self.live_set {
            Some(set) => println!(
                "Restarting Ableton Live at {} with Live set {} ...",
                self.installation,
                set.display()
            ),
            None => println!("Restarting Ableton Live at {} ...", self.installation),
        }
        let restarter = self.restarter.clone();
        let app_name = self.installation.app_name();
        let live_set = self.live_set.clone();
        tokio::task::spawn_blocking(move || restarter.restart(&app_name, live_set.as_deref()))
            .await
            .map_err(|err| RuntimeError::Task {
                task: "restart",
                message: err.to_string(),
            })??;
        tracing::info!(app = %self.installation.app_name(), "restart completed");
        println!("{}", "DONE".green());

        println!("{}\n", LOG_BANNER.blue());
        Ok(())
    }
}

fn clear_console() {
    let mut out = io::stdout();
    if !out.is_terminal() {
        return;
    }
    let cleared = out
        .queue(terminal::Clear(terminal::ClearType::All))
        .and_then(|out| out.queue(cursor::MoveTo(0, 0)))
        .and_then(|out| out.flush());
    if let Err(err) = cleared {
        tracing::debug!(error = %err, "failed to clear console");
    }
}

// ---------------------------------------------------------------------------
// Triggers
// ---------------------------------------------------------------------------

/// What happened to a change notification handed to the cycle processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// A new cycle will run.
    Queued,
    /// A cycle was already pending; this change rides along with it.
    Coalesced,
    /// The processor is gone.
    Closed,
}

/// Request a cycle without waiting. The channel must have capacity one.
pub fn trigger(tx: &mpsc::Sender<()>) -> Trigger {
    match tx.try_send(()) {
        Ok(()) => Trigger::Queued,
        Err(TrySendError::Full(())) => Trigger::Coalesced,
        Err(TrySendError::Closed(())) => Trigger::Closed,
    }
}

/// Run `cycle` once per received trigger, one at a time.
///
/// A failed cycle is reported and processing continues. Shutdown abandons a
/// cycle that is still running.
pub async fn process_triggers<F, Fut>(
    mut trigger_rx: mpsc::Receiver<()>,
    mut shutdown_rx: broadcast::Receiver<()>,
    mut cycle: F,
) -> Result<(), RuntimeError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), RuntimeError>>,
{
    loop {
        let received = tokio::select! {
            _ = shutdown_rx.recv() => break,
            received = trigger_rx.recv() => received,
        };
        let Some(()) = received else { break };

        tokio::select! {
            _ = shutdown_rx.recv() => {
                tracing::warn!("shutdown during a sync cycle, abandoning it");
                break;
            }
            result = cycle() => {
                if let Err(err) = result {
                    tracing::error!(error = %err, "sync cycle failed");
                    println!("{}", format!("Error: {err}").red());
                }
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Log relay
// ---------------------------------------------------------------------------

/// A [`LogTail`] read through a [`LogRelay`].
///
/// Lines written while the relay is paused are never shown: they are dropped
/// while the pause holds, and after each resume the tail jumps to the log
/// length recorded when the pause ended.
#[derive(Debug)]
pub struct LogFollower {
    tail: LogTail,
    relay: LogRelay,
    seen_epoch: u64,
}

impl LogFollower {
    pub fn new(tail: LogTail, relay: LogRelay) -> Self {
        let seen_epoch = relay.resume().epoch;
        Self {
            tail,
            relay,
            seen_epoch,
        }
    }

    pub fn tail(&self) -> &LogTail {
        &self.tail
    }

    /// Lines appended since the last poll that should reach the console.
    ///
    /// Read errors are relayed like log lines.
    pub async fn poll(&mut self) -> Vec<RelayedLine> {
        let resume = self.relay.resume();
        if resume.epoch != self.seen_epoch {
            self.seen_epoch = resume.epoch;
            if let Err(err) = self.tail.skip_to(resume.offset).await {
                return self.read_failed(err);
            }
        }

        let paused = self.relay.is_paused();
        match self.tail.read_lines().await {
            Ok(_) if paused => Vec::new(),
            Ok(lines) => lines.iter().filter_map(|line| self.relay.relay(line)).collect(),
            Err(err) => self.read_failed(err),
        }
    }

    fn read_failed(&self, err: io::Error) -> Vec<RelayedLine> {
        let path = self.tail.path();
        tracing::warn!(path = %path.display(), error = %err, "log read failed");
        let message = format!("Error reading {}: {err}", path.display());
        self.relay.relay(&message).into_iter().collect()
    }
}

// ---------------------------------------------------------------------------
// Runtime
// ---------------------------------------------------------------------------

/// Start the watch runtime and block the current thread until it exits.
///
/// Blocking work still running at exit (a hung `rsync` or `osascript`) is
/// given [`SHUTDOWN_GRACE`] and then abandoned.
pub fn start_blocking(session: Session) -> Result<(), RuntimeError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    let result = runtime.block_on(run(session));
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    result
}

/// Watch, sync and restart until ctrl-c or the watch service goes away.
pub async fn run(session: Session) -> Result<(), RuntimeError> {
    println!("Script name: {}", session.script.as_str().green());

    let relay = LogRelay::new(&session.script).with_log_file(&session.log_file);
    let tail = LogTail::open(&session.log_file)
        .await
        .map_err(|e| io_err(&session.log_file, e))?;

    let client = WatchmanClient::connect().await?;
    let watcher = ChangeWatcher::start(client, &session.working_dir, session.ignore.clone()).await?;

    let cycle = Cycle::for_session(&session);
    let (trigger_tx, trigger_rx) = mpsc::channel::<()>(1);
    let (shutdown_tx, _) = broadcast::channel::<()>(16);

    let watcher_handle = {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            let result = watcher_task(watcher, trigger_tx, shutdown.subscribe()).await;
            let _ = shutdown.send(());
            result
        })
    };

    let processor_handle = {
        let shutdown = shutdown_tx.clone();
        let relay = relay.clone();
        tokio::spawn(async move {
            let result = process_triggers(trigger_rx, shutdown.subscribe(), || {
                let cycle = cycle.clone();
                let relay = relay.clone();
                async move { cycle.run(&relay).await }
            })
            .await;
            let _ = shutdown.send(());
            result
        })
    };

    let tail_handle = {
        let shutdown = shutdown_tx.clone();
        let relay = relay.clone();
        tokio::spawn(async move {
            let result = tail_task(LogFollower::new(tail, relay), shutdown.subscribe()).await;
            let _ = shutdown.send(());
            result
        })
    };

    let signal_handle = {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            let mut shutdown_rx = shutdown.subscribe();
            tokio::select! {
                _ = shutdown_rx.recv() => Ok(()),
                signal = tokio::signal::ctrl_c() => {
                    match signal {
                        Ok(()) => {
                            tracing::info!("received ctrl-c, shutting down");
                            let _ = shutdown.send(());
                            Ok(())
                        }
                        Err(err) => Err(RuntimeError::Task {
                            task: "signal_handler",
                            message: format!("ctrl-c handler failed: {err}"),
                        }),
                    }
                }
            }
        })
    };

    let (watcher_result, processor_result, tail_result, signal_result) =
        tokio::join!(watcher_handle, processor_handle, tail_handle, signal_handle);

    handle_join("watcher", watcher_result)?;
    handle_join("cycle_processor", processor_result)?;
    handle_join("log_tail", tail_result)?;
    handle_join("signal_handler", signal_result)?;
    Ok(())
}

async fn watcher_task<S>(
    mut watcher: ChangeWatcher<S>,
    trigger_tx: mpsc::Sender<()>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), RuntimeError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            batch = watcher.next_batch() => {
                let Some(batch) = batch? else {
                    tracing::warn!("watchman subscription ended");
                    break;
                };
                tracing::info!(
                    files = batch.records.len(),
                    fresh_instance = batch.fresh_instance,
                    "change detected",
                );
                match trigger(&trigger_tx) {
                    Trigger::Queued => {}
                    Trigger::Coalesced => tracing::debug!("cycle already pending, coalescing"),
                    Trigger::Closed => break,
                }
            }
        }
    }
    Ok(())
}

async fn tail_task(
    mut follower: LogFollower,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), RuntimeError> {
    tracing::debug!(path = %follower.tail().path().display(), "tailing log");
    let mut ticker = tokio::time::interval(LOG_POLL_INTERVAL);
    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            _ = ticker.tick() => {
                for line in follower.poll().await {
                    println!("{}", line.render());
                }
            }
        }
    }
    Ok(())
}

fn handle_join(
    task: &'static str,
    result: Result<Result<(), RuntimeError>, tokio::task::JoinError>,
) -> Result<(), RuntimeError> {
    match result {
        Ok(inner) => inner,
        Err(err) => Err(RuntimeError::Task {
            task,
            message: format!("join failure: {err}"),
        }),
    }
}

/// Install the stderr `tracing` subscriber; `RUST_LOG` overrides `info`.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_reports_coalescing_and_closure() {
        let (tx, mut rx) = mpsc::channel(1);
        assert_eq!(trigger(&tx), Trigger::Queued);
        assert_eq!(trigger(&tx), Trigger::Coalesced);
        assert_eq!(trigger(&tx), Trigger::Coalesced);

        rx.close();
        assert_eq!(trigger(&tx), Trigger::Closed);
    }

    #[tokio::test]
    async fn join_failure_names_the_task() {
        let handle = tokio::spawn(async {
            if true {
                panic!("boom");
            }
            Ok::<(), RuntimeError>(())
        });
        let err = handle_join("watcher", handle.await).unwrap_err();
        assert!(err.to_string().starts_with("watcher task failed"), "got: {err}");
    }
}
