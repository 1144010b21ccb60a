use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::{io_err, RuntimeError};

/// Generate the AppleScript that quits (if running) and relaunches `app_name`,
/// optionally opening a Live set once the application is back up.
pub fn restart_script(app_name: &str, live_set: Option<&Path>) -> String {
    let open_set = match live_set {
        Some(set) => format!(
            "\n  open file POSIX file \"{}\"\n",
            escape(&set.to_string_lossy())
        ),
        None => String::new(),
    };

    format!(
        r#"tell application "{app}"
  if its running then
    quit

    repeat while its running
      delay 0.5
    end repeat
  end if

  activate

  repeat while not its running
    delay 0.5
  end repeat
{open_set}end tell
"#,
        app = escape(app_name),
        open_set = open_set,
    )
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Runs restart scripts through `osascript`.
#[derive(Debug, Clone)]
pub struct Restarter {
    program: OsString,
}

impl Restarter {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn osascript() -> Self {
        Self::new("osascript")
    }

    /// Restart `app_name` and wait for the script to finish.
    pub fn restart(&self, app_name: &str, live_set: Option<&Path>) -> Result<(), RuntimeError> {
        let script = restart_script(app_name, live_set);
        tracing::debug!(app = %app_name, live_set = ?live_set, "running restart script");

        let output = Command::new(&self.program)
            .arg("-e")
            .arg(&script)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| io_err(Path::new(&self.program), e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(RuntimeError::Restart(format!(
                "{} exited with {}: {}",
                self.program.to_string_lossy(),
                output.status,
                stderr
            )));
        }
        Ok(())
    }
}

impl Default for Restarter {
    fn default() -> Self {
        Self::osascript()
    }
}

/// Restarting Live relies on AppleScript.
#[cfg(target_os = "macos")]
pub fn ensure_macos() -> Result<(), RuntimeError> {
    Ok(())
}

#[cfg(not(target_os = "macos"))]
pub fn ensure_macos() -> Result<(), RuntimeError> {
    Err(RuntimeError::Unsupported(
        "restarting Ableton Live is only supported on macOS".to_string(),
    ))
}
