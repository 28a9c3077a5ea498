//! Putting a PNG on the system clipboard through the platform's own tools

use std::process::Stdio;
#[cfg(not(target_os = "macos"))]
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::error::{AdbError, Result};

/// Copy PNG bytes to the clipboard
#[cfg(target_os = "macos")]
pub async fn copy_png(png: &[u8]) -> Result<()> {
    // osascript can only read the image back from a file
    let file = tempfile::Builder::new()
        .prefix("android_screenshot.")
        .suffix(".png")
        .tempfile()?;
    tokio::fs::write(file.path(), png).await?;
    debug!("Copying {} bytes with osascript", png.len());

    let script = format!(
        "set the clipboard to (read file POSIX file \"{}\" as «class PNGf»)",
        file.path().display()
    );
    let status = Command::new("osascript")
        .arg("-e")
        .arg(&script)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !status.status.success() {
        return Err(AdbError::Clipboard(
            String::from_utf8_lossy(&status.stderr).trim().to_string(),
        ));
    }
    Ok(())
}

/// Copy PNG bytes to the clipboard
#[cfg(not(target_os = "macos"))]
pub async fn copy_png(png: &[u8]) -> Result<()> {
    let (program, args): (&str, &[&str]) = if which::which("wl-copy").is_ok() {
        ("wl-copy", &["--type", "image/png"])
    } else if which::which("xclip").is_ok() {
        ("xclip", &["-selection", "clipboard", "-t", "image/png", "-i"])
    } else {
        return Err(AdbError::Clipboard(
            "no clipboard tool found, install wl-clipboard or xclip".to_string(),
        ));
    };
    debug!("Copying {} bytes with {}", png.len(), program);

    // Both tools fork to keep serving the selection, so their output is not captured
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(png).await?;
    }

    let status = child.wait().await?;
    if !status.success() {
        return Err(AdbError::Clipboard(format!("{} exited with {}", program, status)));
    }
    Ok(())
}
