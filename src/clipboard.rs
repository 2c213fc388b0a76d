//! Write-only clipboard seam. The workflow only ever copies the draft out;
//! failures are logged and swallowed, matching the fire-and-forget contract.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

#[async_trait]
pub trait Clipboard: Send + Sync {
    async fn copy(&self, text: &str) -> Result<()>;
}

/// Copies via the platform clipboard utility.
pub struct OsClipboard;

impl OsClipboard {
    fn command() -> Command {
        #[cfg(target_os = "macos")]
        {
            Command::new("pbcopy")
        }
        #[cfg(target_os = "windows")]
        {
            Command::new("clip")
        }
        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        {
            if std::env::var_os("WAYLAND_DISPLAY").is_some() {
                Command::new("wl-copy")
            } else {
                let mut command = Command::new("xclip");
                command.args(["-selection", "clipboard"]);
                command
            }
        }
    }
}

#[async_trait]
impl Clipboard for OsClipboard {
    async fn copy(&self, text: &str) -> Result<()> {
        let mut child = Self::command()
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .context("Failed to spawn clipboard utility")?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .await
                .context("Failed to write to clipboard utility")?;
        }

        let status = child.wait().await?;
        anyhow::ensure!(status.success(), "clipboard utility exited with {status}");
        Ok(())
    }
}

/// Discards everything. Used in tests and headless runs.
pub struct NoopClipboard;

#[async_trait]
impl Clipboard for NoopClipboard {
    async fn copy(&self, _text: &str) -> Result<()> {
        Ok(())
    }
}
