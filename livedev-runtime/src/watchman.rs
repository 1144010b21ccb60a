//! Minimal watchman client speaking the JSON protocol.
//!
//! Requests and responses are newline-delimited JSON over the service's Unix
//! socket. Each request gets exactly one response; subscription notifications
//! ("unilateral" PDUs) may arrive at any time, including between a request
//! and its response, so they are queued and handed out by
//! [`WatchmanClient::next_subscription`].

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{
    split, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, ReadHalf, WriteHalf,
};

use crate::error::WatchmanError;

/// Environment variable watchman itself honours for the socket location.
pub const SOCKET_ENV: &str = "WATCHMAN_SOCK";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// One file entry of a subscription notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub mtime_ms: i64,
    #[serde(default = "default_exists")]
    pub exists: bool,
    #[serde(rename = "type", default)]
    pub kind: String,
}

fn default_exists() -> bool {
    true
}

/// Response to `watch-project`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WatchProject {
    /// Root actually watched; may be an ancestor of the requested directory.
    pub watch: PathBuf,
    /// Requested directory relative to [`WatchProject::watch`], if different.
    #[serde(default)]
    pub relative_path: Option<PathBuf>,
    #[serde(default)]
    pub warning: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct VersionResponse {
    #[serde(default)]
    version: String,
    #[serde(default)]
    capabilities: HashMap<String, bool>,
}

/// Query body of a `subscribe` request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubscriptionQuery {
    pub expression: Value,
    pub fields: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relative_root: Option<PathBuf>,
}

/// A unilateral subscription notification.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubscriptionPdu {
    pub subscription: String,
    #[serde(default)]
    pub files: Vec<ChangeRecord>,
    #[serde(default)]
    pub is_fresh_instance: bool,
    /// Set when the watch was removed and no further notifications follow.
    #[serde(default)]
    pub canceled: bool,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct WatchmanClient<S> {
    reader: BufReader<ReadHalf<S>>,
    writer: WriteHalf<S>,
    pending: VecDeque<Value>,
}

impl WatchmanClient<tokio::net::UnixStream> {
    /// Connect to the running watchman service, starting it if necessary.
    pub async fn connect() -> Result<Self, WatchmanError> {
        let socket = resolve_socket().await?;
        tracing::debug!(socket = %socket.display(), "connecting to watchman");
        let stream = tokio::net::UnixStream::connect(&socket)
            .await
            .map_err(|err| WatchmanError::Unavailable {
                message: format!("cannot connect to {}: {err}", socket.display()),
            })?;
        Ok(Self::new(stream))
    }
}

impl<S> WatchmanClient<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S) -> Self {
        let (reader, writer) = split(stream);
        Self {
            reader: BufReader::new(reader),
            writer,
            pending: VecDeque::new(),
        }
    }

    /// Send one request and wait for its response.
    ///
    /// A response carrying `error` is turned into [`WatchmanError::Command`].
    pub async fn command(&mut self, request: Value) -> Result<Value, WatchmanError> {
        let name = request
            .get(0)
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();

        let mut payload = serde_json::to_vec(&request)?;
        payload.push(b'\n');
        self.writer.write_all(&payload).await?;
        self.writer.flush().await?;
        tracing::debug!(command = %name, "watchman request sent");

        loop {
            let pdu = self.read_pdu().await?.ok_or(WatchmanError::Closed)?;
            if is_unilateral(&pdu) {
                self.pending.push_back(pdu);
                continue;
            }
            if let Some(message) = pdu.get("error").and_then(Value::as_str) {
                return Err(WatchmanError::Command {
                    command: name,
                    message: message.to_string(),
                });
            }
            return Ok(pdu);
        }
    }

    /// Ask the service to confirm it supports every capability in `required`.
    pub async fn capability_check(&mut self, required: &[&str]) -> Result<String, WatchmanError> {
        let request = json!(["version", { "optional": [], "required": required }]);
        let response = match self.command(request).await {
            Ok(response) => response,
            Err(WatchmanError::Command { message, .. }) => {
                return Err(WatchmanError::Unavailable { message })
            }
            Err(err) => return Err(err),
        };

        let version: VersionResponse = serde_json::from_value(response)?;
        if let Some(missing) = required
            .iter()
            .find(|cap| !version.capabilities.get(**cap).copied().unwrap_or(false))
        {
            return Err(WatchmanError::Unavailable {
                message: format!(
                    "watchman {} does not support required capability `{missing}`",
                    version.version
                ),
            });
        }
        Ok(version.version)
    }

    pub async fn watch_project(&mut self, dir: &Path) -> Result<WatchProject, WatchmanError> {
        let request = json!(["watch-project", dir.to_string_lossy()]);
        let response = self.command(request).await?;
        Ok(serde_json::from_value(response)?)
    }

    pub async fn subscribe(
        &mut self,
        root: &Path,
        name: &str,
        query: &SubscriptionQuery,
    ) -> Result<(), WatchmanError> {
        let query = serde_json::to_value(query)?;
        let request = json!(["subscribe", root.to_string_lossy(), name, query]);
        self.command(request).await?;
        Ok(())
    }

    /// Next subscription notification, or `None` once the connection closes.
    ///
    /// Non-subscription unilateral PDUs (e.g. `log`) are skipped.
    pub async fn next_subscription(&mut self) -> Result<Option<SubscriptionPdu>, WatchmanError> {
        loop {
            let pdu = match self.pending.pop_front() {
                Some(pdu) => pdu,
                None => match self.read_pdu().await? {
                    Some(pdu) => pdu,
                    None => return Ok(None),
                },
            };
            if pdu.get("subscription").is_some() {
                return Ok(Some(serde_json::from_value(pdu)?));
            }
            tracing::debug!(pdu = %pdu, "ignoring unilateral watchman message");
        }
    }

    async fn read_pdu(&mut self) -> Result<Option<Value>, WatchmanError> {
        let mut line = String::new();
        loop {
            line.clear();
            let read = self.reader.read_line(&mut line).await?;
            if read == 0 {
                return Ok(None);
            }
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            return Ok(Some(serde_json::from_str(trimmed)?));
        }
    }
}

fn is_unilateral(pdu: &Value) -> bool {
    pdu.get("unilateral").and_then(Value::as_bool) == Some(true)
        || pdu.get("subscription").is_some()
        || pdu.get("log").is_some()
}

/// Socket path from `$WATCHMAN_SOCK`, else from `watchman get-sockname`.
async fn resolve_socket() -> Result<PathBuf, WatchmanError> {
    if let Some(sock) = std::env::var_os(SOCKET_ENV).filter(|s| !s.is_empty()) {
        return Ok(PathBuf::from(sock));
    }

    let output = tokio::process::Command::new("watchman")
        .args(["--output-encoding=json", "--no-pretty", "get-sockname"])
        .output()
        .await
        .map_err(|err| WatchmanError::Unavailable {
            message: format!("failed to run `watchman get-sockname`: {err}"),
        })?;

    if !output.status.success() {
        return Err(WatchmanError::Unavailable {
            message: format!(
                "`watchman get-sockname` exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }

    parse_sockname(&output.stdout)
}

fn parse_sockname(stdout: &[u8]) -> Result<PathBuf, WatchmanError> {
    let value: Value = serde_json::from_slice(stdout)?;
    value
        .get("unix_domain")
        .or_else(|| value.get("sockname"))
        .and_then(Value::as_str)
        .map(PathBuf::from)
        .ok_or_else(|| WatchmanError::Unavailable {
            message: "`watchman get-sockname` did not report a socket".to_string(),
        })
}
