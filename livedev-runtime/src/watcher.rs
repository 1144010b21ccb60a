//! Change detection on top of a watchman subscription.
//!
//! [`ChangeWatcher::next_batch`] is a lazy sequence of change batches: each
//! call reads notifications until one contains at least one record the
//! [`IgnoreSet`] does not ignore, and yields that batch exactly once.

use std::path::Path;

use livedev_core::IgnoreSet;
use serde_json::json;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::WatchmanError;
use crate::watchman::{ChangeRecord, SubscriptionQuery, WatchmanClient};

/// Subscription name registered with watchman.
pub const SUBSCRIPTION_NAME: &str = "livedev";

/// Capabilities the watcher cannot work without.
pub const REQUIRED_CAPABILITIES: &[&str] = &["relative_root"];

/// Fields requested for every changed file.
pub const FIELDS: &[&str] = &["name", "size", "mtime_ms", "exists", "type"];

/// Records delivered together in one notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeBatch {
    pub records: Vec<ChangeRecord>,
    /// True for the initial result set sent right after subscribing.
    pub fresh_instance: bool,
}

/// Whether a batch contains anything worth a sync cycle.
pub fn is_relevant(ignore: &IgnoreSet, records: &[ChangeRecord]) -> bool {
    records.iter().any(|record| !ignore.ignores(&record.name))
}

/// Query matching every file with a period in its name.
pub fn subscription_query(relative_root: Option<&Path>) -> SubscriptionQuery {
    SubscriptionQuery {
        expression: json!(["allof", ["match", "*.*"]]),
        fields: FIELDS.iter().map(|f| f.to_string()).collect(),
        relative_root: relative_root.map(Path::to_path_buf),
    }
}

pub struct ChangeWatcher<S> {
    client: WatchmanClient<S>,
    ignore: IgnoreSet,
}

impl<S> ChangeWatcher<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Negotiate capabilities, watch `dir` and subscribe to its changes.
    ///
    /// Every failure here is fatal to the caller.
    pub async fn start(
        mut client: WatchmanClient<S>,
        dir: &Path,
        ignore: IgnoreSet,
    ) -> Result<Self, WatchmanError> {
        let version = client.capability_check(REQUIRED_CAPABILITIES).await?;
        tracing::debug!(%version, "watchman capabilities confirmed");

        let watch = client.watch_project(dir).await?;
        if let Some(warning) = &watch.warning {
            tracing::warn!(%warning, "watchman warning");
        }

        let query = subscription_query(watch.relative_path.as_deref());
        client
            .subscribe(&watch.watch, SUBSCRIPTION_NAME, &query)
            .await?;
        tracing::info!(
            root = %watch.watch.display(),
            relative_root = ?watch.relative_path,
            "watching for changes",
        );

        Ok(Self { client, ignore })
    }

    /// Next batch with at least one non-ignored record.
    ///
    /// Returns `None` when the subscription is canceled or the connection
    /// closes.
    pub async fn next_batch(&mut self) -> Result<Option<ChangeBatch>, WatchmanError> {
        loop {
            let Some(pdu) = self.client.next_subscription().await? else {
                return Ok(None);
            };
            if pdu.subscription != SUBSCRIPTION_NAME {
                continue;
            }
            if pdu.canceled {
                tracing::warn!("watchman canceled the subscription");
                return Ok(None);
            }
            if !is_relevant(&self.ignore, &pdu.files) {
                tracing::debug!(files = pdu.files.len(), "discarding ignored change batch");
                continue;
            }
            return Ok(Some(ChangeBatch {
                records: pdu.files,
                fresh_instance: pdu.is_fresh_instance,
            }));
        }
    }
}
