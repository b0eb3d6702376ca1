use std::path::PathBuf;

use anyhow::Context;
use image::RgbaImage;
use tracing::warn;
use xcap::Monitor;

use kuro_bot_core::agent::ports::Screen;

/// Captures the primary monitor. Optionally mirrors every frame to a file
/// for region calibration.
pub struct MonitorScreen {
    monitor: Monitor,
    dump_to: Option<PathBuf>,
}

impl MonitorScreen {
    pub fn primary(dump_to: Option<PathBuf>) -> anyhow::Result<Self> {
        let monitors = Monitor::all().context("enumerate monitors")?;
        let monitor = monitors
            .into_iter()
            .find(Monitor::is_primary)
            .ok_or_else(|| anyhow::anyhow!("no primary monitor found"))?;
        Ok(Self { monitor, dump_to })
    }
}

impl Screen for MonitorScreen {
    fn capture(&self) -> anyhow::Result<RgbaImage> {
        let frame = self
            .monitor
            .capture_image()
            .context("capture primary monitor")?;
        if let Some(path) = &self.dump_to {
            if let Err(err) = frame.save(path) {
                warn!(path = %path.display(), %err, "could not dump frame");
            }
        }
        Ok(frame)
    }
}

/// Reads frames from a file that something else keeps overwriting.
/// Useful for replaying saved screenshots without the game running.
pub struct FileScreen {
    path: PathBuf,
}

impl FileScreen {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Screen for FileScreen {
    fn capture(&self) -> anyhow::Result<RgbaImage> {
        let img = image::open(&self.path)
            .with_context(|| format!("read frame from {}", self.path.display()))?;
        Ok(img.to_rgba8())
    }
}
