//! Cycle processing, coalescing and log relay behaviour.

#![cfg(unix)]

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use livedev_core::{IgnoreSet, InstallationPath, ScriptName};
use livedev_locator::Locator;
use livedev_runtime::runtime::{process_triggers, trigger, Trigger};
use livedev_runtime::{
    Cycle, LogFollower, LogRelay, LogTail, RelayedLine, Restarter, RuntimeError, Session,
    WatchOptions,
};
use livedev_sync::Mirror;
use tempfile::TempDir;
use tokio::sync::{broadcast, mpsc, Notify};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn append(path: &Path, text: &str) {
    let mut file = OpenOptions::new().append(true).open(path).expect("open log");
    file.write_all(text.as_bytes()).expect("append");
}

fn session(work: &TempDir, dest: PathBuf) -> Session {
    Session {
        working_dir: work.path().to_path_buf(),
        script: ScriptName::from("MyScript"),
        installation: InstallationPath::from(PathBuf::from(
            "/Applications/Ableton Live 12 Suite.app",
        )),
        destination: dest,
        ignore: IgnoreSet::from_patterns(work.path(), Vec::<&str>::new()).expect("ignore"),
        log_file: work.path().join("Log.txt"),
        live_set: None,
    }
}

fn copy_mirror() -> Mirror {
    Mirror::new("sh", ["-c", r#"mkdir -p "$2" && cp -R "$1". "$2""#, "sh"])
}

// ---------------------------------------------------------------------------
// Cycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cycle_mirrors_then_restarts_and_resumes_relay() {
    let work = TempDir::new().expect("work");
    let dest = TempDir::new().expect("dest");
    fs::write(work.path().join("__init__.py"), "").expect("write");
    let target = dest.path().join("MyScript");

    let cycle = Cycle::for_session(&session(&work, target.clone()))
        .with_programs(copy_mirror(), Restarter::new("true"));
    let relay = LogRelay::new(&ScriptName::from("MyScript"));

    cycle.run(&relay).await.expect("cycle");
    assert!(target.join("__init__.py").is_file());
    assert!(!relay.is_paused());
}

#[tokio::test]
async fn failed_sync_still_resumes_relay() {
    let work = TempDir::new().expect("work");
    let cycle = Cycle::for_session(&session(&work, PathBuf::from("/tmp/unused")))
        .with_programs(Mirror::new("sh", ["-c", "exit 12", "sh"]), Restarter::new("true"));
    let relay = LogRelay::new(&ScriptName::from("MyScript"));

    let err = cycle.run(&relay).await.unwrap_err();
    assert!(matches!(err, RuntimeError::Sync(_)), "got: {err}");
    assert!(!relay.is_paused());
}

#[tokio::test]
async fn failed_restart_is_a_restart_error() {
    let work = TempDir::new().expect("work");
    let dest = TempDir::new().expect("dest");
    let cycle = Cycle::for_session(&session(&work, dest.path().join("MyScript")))
        .with_programs(copy_mirror(), Restarter::new("false"));
    let relay = LogRelay::new(&ScriptName::from("MyScript"));

    let err = cycle.run(&relay).await.unwrap_err();
    assert!(matches!(err, RuntimeError::Restart(_)), "got: {err}");
    assert!(!relay.is_paused());
}

// ---------------------------------------------------------------------------
// Coalescing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn burst_during_a_cycle_yields_one_follow_up() {
    let (tx, rx) = mpsc::channel(1);
    let (shutdown_tx, _) = broadcast::channel(1);
    let runs = Arc::new(AtomicUsize::new(0));
    let release = Arc::new(Notify::new());
    let (started_tx, mut started_rx) = mpsc::unbounded_channel();

    assert_eq!(trigger(&tx), Trigger::Queued);

    let processor = {
        let runs = runs.clone();
        let release = release.clone();
        tokio::spawn(process_triggers(rx, shutdown_tx.subscribe(), move || {
            let runs = runs.clone();
            let release = release.clone();
            let started_tx = started_tx.clone();
            async move {
                let n = runs.fetch_add(1, Ordering::SeqCst) + 1;
                let _ = started_tx.send(n);
                if n == 1 {
                    release.notified().await;
                }
                Ok(())
            }
        }))
    };

    assert_eq!(started_rx.recv().await, Some(1));
    assert_eq!(trigger(&tx), Trigger::Queued);
    assert_eq!(trigger(&tx), Trigger::Coalesced);
    assert_eq!(trigger(&tx), Trigger::Coalesced);
    release.notify_one();

    assert_eq!(started_rx.recv().await, Some(2));
    drop(tx);
    processor.await.expect("join").expect("processor");
    assert_eq!(runs.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn failing_cycles_do_not_stop_processing() {
    let (tx, rx) = mpsc::channel(1);
    let (shutdown_tx, _) = broadcast::channel(1);
    let runs = Arc::new(AtomicUsize::new(0));

    let processor = {
        let runs = runs.clone();
        tokio::spawn(process_triggers(rx, shutdown_tx.subscribe(), move || {
            let runs = runs.clone();
            async move {
                runs.fetch_add(1, Ordering::SeqCst);
                Err(RuntimeError::Restart("osascript exited with 1".to_string()))
            }
        }))
    };

    tx.send(()).await.expect("send");
    tx.send(()).await.expect("send");
    drop(tx);
    processor.await.expect("join").expect("processor");
    assert_eq!(runs.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn shutdown_stops_the_processor() {
    let (_tx, rx) = mpsc::channel::<()>(1);
    let (shutdown_tx, _) = broadcast::channel(1);
    let processor = tokio::spawn(process_triggers(rx, shutdown_tx.subscribe(), || async {
        Ok::<(), RuntimeError>(())
    }));
    shutdown_tx.send(()).expect("shutdown");
    processor.await.expect("join").expect("processor");
}

#[tokio::test(start_paused = true)]
async fn shutdown_abandons_a_cycle_that_never_finishes() {
    let (tx, rx) = mpsc::channel::<()>(1);
    let (shutdown_tx, _) = broadcast::channel(1);
    let started = Arc::new(Notify::new());
    let processor = tokio::spawn(process_triggers(rx, shutdown_tx.subscribe(), {
        let started = Arc::clone(&started);
        move || {
            let started = Arc::clone(&started);
            async move {
                started.notify_one();
                std::future::pending::<Result<(), RuntimeError>>().await
            }
        }
    }));

    assert_eq!(trigger(&tx), Trigger::Queued);
    started.notified().await;
    shutdown_tx.send(()).expect("shutdown");

    tokio::time::timeout(Duration::from_secs(5), processor)
        .await
        .expect("processor stopped while the cycle hung")
        .expect("join")
        .expect("processor");
}

// ---------------------------------------------------------------------------
// Log relay
// ---------------------------------------------------------------------------

#[tokio::test]
async fn log_lines_are_dropped_while_a_cycle_holds_the_pause() {
    let dir = TempDir::new().expect("tempdir");
    let log = dir.path().join("Log.txt");
    fs::write(&log, "startup noise\n").expect("write");

    let relay = LogRelay::new(&ScriptName::from("MyScript")).with_log_file(&log);
    let tail = LogTail::open(&log).await.expect("open");
    let mut follower = LogFollower::new(tail, relay.clone());

    fs::write(&log, "startup noise\nMyScript: loaded\nAudio: ok\n").expect("append");
    assert_eq!(
        follower.poll().await,
        vec![
            RelayedLine::Highlighted("MyScript: loaded".to_string()),
            RelayedLine::Plain("Audio: ok".to_string()),
        ]
    );

    let guard = relay.pause();
    fs::write(&log, "startup noise\nMyScript: loaded\nAudio: ok\nduring restart\n")
        .expect("append");
    assert!(follower.poll().await.is_empty());
    drop(guard);

    fs::write(
        &log,
        "startup noise\nMyScript: loaded\nAudio: ok\nduring restart\nafter\n",
    )
    .expect("append");
    assert_eq!(
        follower.poll().await,
        vec![RelayedLine::Plain("after".to_string())]
    );
}

#[tokio::test]
async fn lines_written_during_a_pause_stay_hidden_after_resume() {
    let dir = TempDir::new().expect("tempdir");
    let log = dir.path().join("Log.txt");
    fs::write(&log, "").expect("write");

    let relay = LogRelay::new(&ScriptName::from("MyScript")).with_log_file(&log);
    let tail = LogTail::open(&log).await.expect("open");
    let mut follower = LogFollower::new(tail, relay.clone());

    let guard = relay.pause();
    append(&log, "MyScript: written while paused\n");
    drop(guard);

    assert!(follower.poll().await.is_empty());
    append(&log, "after\n");
    assert_eq!(
        follower.poll().await,
        vec![RelayedLine::Plain("after".to_string())]
    );
}

#[tokio::test]
async fn restart_truncating_the_log_during_a_pause_is_skipped() {
    let dir = TempDir::new().expect("tempdir");
    let log = dir.path().join("Log.txt");
    fs::write(&log, "a long line from the previous Live session\n").expect("write");

    let relay = LogRelay::new(&ScriptName::from("MyScript")).with_log_file(&log);
    let tail = LogTail::open(&log).await.expect("open");
    let mut follower = LogFollower::new(tail, relay.clone());

    let guard = relay.pause();
    fs::write(&log, "fresh session\n").expect("truncate");
    drop(guard);

    assert!(follower.poll().await.is_empty());
    append(&log, "MyScript: ready\n");
    assert_eq!(
        follower.poll().await,
        vec![RelayedLine::Highlighted("MyScript: ready".to_string())]
    );
}

#[tokio::test]
async fn resume_without_a_known_log_length_skips_to_the_end() {
    let dir = TempDir::new().expect("tempdir");
    let log = dir.path().join("Log.txt");
    fs::write(&log, "").expect("write");

    let relay = LogRelay::new(&ScriptName::from("MyScript"));
    let tail = LogTail::open(&log).await.expect("open");
    let mut follower = LogFollower::new(tail, relay.clone());

    drop({
        let guard = relay.pause();
        append(&log, "written while paused\n");
        guard
    });

    assert!(follower.poll().await.is_empty());
    append(&log, "after\n");
    assert_eq!(
        follower.poll().await,
        vec![RelayedLine::Plain("after".to_string())]
    );
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[test]
fn prepare_resolves_destination_and_log_file() {
    let apps = TempDir::new().expect("apps");
    let prefs = TempDir::new().expect("prefs");
    let work = TempDir::new().expect("work");
    let app = apps.path().join("Ableton Live 12 Suite.app");
    fs::create_dir_all(&app).expect("app");
    fs::create_dir_all(prefs.path().join("Live 12.0.5")).expect("prefs");
    fs::create_dir_all(prefs.path().join("Live 12.1")).expect("prefs");
    fs::write(work.path().join(".gitignore"), "*.pyc\n").expect("gitignore");

    let session = Session::prepare(
        WatchOptions {
            working_dir: work.path().to_path_buf(),
            name: Some("MyScript".to_string()),
            ..WatchOptions::default()
        },
        &Locator::new(apps.path(), prefs.path()),
    )
    .expect("prepare");

    assert_eq!(session.installation.as_path(), app.as_path());
    assert_eq!(
        session.destination,
        app.join("Contents/App-Resources/MIDI Remote Scripts/MyScript")
    );
    assert_eq!(session.log_file, prefs.path().join("Live 12.1").join("Log.txt"));
    assert!(session.ignore.ignores("a.pyc"));
}

#[test]
fn prepare_fails_before_log_lookup_when_install_is_ambiguous() {
    let apps = TempDir::new().expect("apps");
    let prefs = TempDir::new().expect("prefs");
    let work = TempDir::new().expect("work");
    fs::create_dir_all(apps.path().join("Ableton Live 11 Suite.app")).expect("app");
    fs::create_dir_all(apps.path().join("Ableton Live 12 Suite.app")).expect("app");

    let err = Session::prepare(
        WatchOptions {
            working_dir: work.path().to_path_buf(),
            name: Some("MyScript".to_string()),
            ..WatchOptions::default()
        },
        &Locator::new(apps.path(), prefs.path()),
    )
    .unwrap_err();
    assert!(err.to_string().contains("--livePath"), "got: {err}");
}
