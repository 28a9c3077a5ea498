//! Screenshot capture: grab, optionally resize, then save and/or copy to the clipboard

mod clipboard;

use chrono::{DateTime, Local};
use image::imageops::FilterType;
use std::ffi::OsString;
use std::fmt;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

use crate::adb::DeviceBridge;
use crate::error::{AdbError, Result};

pub use clipboard::copy_png;

/// Default height in pixels for low-resolution screenshots
pub const DEFAULT_LOWRES_HEIGHT: u32 = 1000;

/// Where to write the PNG
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileTarget {
    /// `./screenshot-YYYYmmdd-HHMMSS.png`
    Auto,
    Path(PathBuf),
}

/// What to do with one screenshot
#[derive(Debug, Clone, Default)]
pub struct ShotOptions {
    pub serial: Option<String>,
    /// Resize to this height, keeping the aspect ratio
    pub resize_height: Option<u32>,
    pub file: Option<FileTarget>,
    pub clipboard: bool,
}

impl ShotOptions {
    /// The clipboard is the destination when no file was asked for
    pub fn wants_clipboard(&self) -> bool {
        self.clipboard || self.file.is_none()
    }
}

/// What was done with the screenshot, printed as the status line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShotReport {
    pub saved_to: Option<PathBuf>,
    pub copied: bool,
    pub height: Option<u32>,
}

impl fmt::Display for ShotReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.copied, &self.saved_to) {
            (true, Some(path)) => write!(f, "Copied to clipboard and Saved to {}", path.display())?,
            (false, Some(path)) => write!(f, "Saved to {}", path.display())?,
            (true, None) => f.write_str("Copied to clipboard")?,
            (false, None) => f.write_str("Nothing to do")?,
        }
        if let Some(height) = self.height {
            write!(f, " ({}px tall)", height)?;
        }
        Ok(())
    }
}

/// Scale a PNG to `height` pixels tall, keeping its aspect ratio
pub fn resize_png(png: &[u8], height: u32) -> Result<Vec<u8>> {
    if height == 0 {
        return Err(AdbError::InvalidArgument(
            "height must be at least 1 pixel".to_string(),
        ));
    }

    let img = image::load_from_memory(png)?;
    let width = ((img.width() as f64) * (height as f64) / (img.height() as f64))
        .round()
        .max(1.0) as u32;
    debug!(
        "Resizing {}x{} -> {}x{}",
        img.width(),
        img.height(),
        width,
        height
    );

    let resized = img.resize_exact(width, height, FilterType::Lanczos3);
    let mut buffer = Vec::new();
    resized.write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)?;
    Ok(buffer)
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}

/// Expand a leading `~` using `home`
pub fn expand_home(path: &Path, home: Option<&Path>) -> PathBuf {
    match (path.strip_prefix("~"), home) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

/// Final path for a screenshot: `~` expanded, `.png` appended unless already there
pub fn resolve_output_path(target: &FileTarget, now: DateTime<Local>, home: Option<&Path>) -> PathBuf {
    let path = match target {
        FileTarget::Auto => PathBuf::from(format!(
            "./screenshot-{}.png",
            now.format("%Y%m%d-%H%M%S")
        )),
        FileTarget::Path(path) => expand_home(path, home),
    };

    if path.extension().and_then(|e| e.to_str()) == Some("png") {
        return path;
    }

    let mut name: OsString = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".png");
    path.with_file_name(name)
}

/// Write the PNG, creating missing parent directories
pub async fn save_png(path: &Path, png: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await.map_err(|e| {
            AdbError::Io(std::io::Error::new(
                e.kind(),
                format!("failed to create directory {}: {}", parent.display(), e),
            ))
        })?;
    }

    fs::write(path, png).await.map_err(|e| {
        AdbError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to save file {}: {}", path.display(), e),
        ))
    })?;

    debug!("Saved screenshot: {} ({} bytes)", path.display(), png.len());
    Ok(())
}

/// Capture the screen and deliver it as `options` asks
pub async fn take_screenshot<B>(bridge: &B, options: &ShotOptions) -> Result<ShotReport>
where
    B: DeviceBridge + ?Sized,
{
    let mut png = bridge.capture_screen(options.serial.as_deref()).await?;

    if let Some(height) = options.resize_height {
        png = resize_png(&png, height)?;
    }

    let saved_to = match &options.file {
        Some(target) => {
            let path = resolve_output_path(target, Local::now(), home_dir().as_deref());
            save_png(&path, &png).await?;
            Some(path)
        }
        None => None,
    };

    let copied = options.wants_clipboard();
    if copied {
        copy_png(&png).await?;
    }

    let report = ShotReport {
        saved_to,
        copied,
        height: options.resize_height,
    };
    info!("{}", report);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use image::{ImageBuffer, Rgb};
    use tempfile::tempdir;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img: ImageBuffer<Rgb<u8>, Vec<u8>> =
            ImageBuffer::from_pixel(width, height, Rgb([10, 20, 30]));
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)
            .unwrap();
        buffer
    }

    #[test]
    fn test_resize_keeps_aspect_ratio() {
        let resized = resize_png(&png(540, 1200), 600).unwrap();
        let img = image::load_from_memory(&resized).unwrap();
        assert_eq!((img.width(), img.height()), (270, 600));
    }

    #[test]
    fn test_resize_rejects_zero_height() {
        assert!(resize_png(&png(2, 2), 0).is_err());
        assert!(resize_png(b"not a png", 10).is_err());
    }

    #[test]
    fn test_resolve_output_path() {
        let now = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let home = Path::new("/home/dev");

        assert_eq!(
            resolve_output_path(&FileTarget::Auto, now, Some(home)),
            PathBuf::from("./screenshot-20240309-140507.png")
        );
        assert_eq!(
            resolve_output_path(&FileTarget::Path("~/shot".into()), now, Some(home)),
            PathBuf::from("/home/dev/shot.png")
        );
        assert_eq!(
            resolve_output_path(&FileTarget::Path("out/shot.png".into()), now, Some(home)),
            PathBuf::from("out/shot.png")
        );
        assert_eq!(
            resolve_output_path(&FileTarget::Path("shot.jpg".into()), now, None),
            PathBuf::from("shot.jpg.png")
        );
    }

    #[test]
    fn test_report_message() {
        let mut report = ShotReport {
            saved_to: None,
            copied: true,
            height: None,
        };
        assert_eq!(report.to_string(), "Copied to clipboard");

        report.saved_to = Some(PathBuf::from("/tmp/shot.png"));
        report.height = Some(1000);
        assert_eq!(
            report.to_string(),
            "Copied to clipboard and Saved to /tmp/shot.png (1000px tall)"
        );

        report.copied = false;
        assert_eq!(report.to_string(), "Saved to /tmp/shot.png (1000px tall)");
    }

    #[test]
    fn test_clipboard_is_default_destination() {
        let mut options = ShotOptions::default();
        assert!(options.wants_clipboard());

        options.file = Some(FileTarget::Auto);
        assert!(!options.wants_clipboard());

        options.clipboard = true;
        assert!(options.wants_clipboard());
    }

    #[tokio::test]
    async fn test_save_png_creates_parent_dirs() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("nested/dir/shot.png");

        save_png(&path, &png(4, 4)).await.unwrap();

        assert!(path.exists());
        assert_eq!(std::fs::read(&path).unwrap(), png(4, 4));
    }
}
