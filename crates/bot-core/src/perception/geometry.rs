use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// A fixed rectangular screen region, in pixels from the top-left corner of
/// the frame. All region constants assume a 1920x1080 frame.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct Region {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub const fn new(left: u32, top: u32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Crops this region out of a frame, clamped to the frame bounds.
    /// A region entirely outside the frame yields an empty image.
    pub fn crop(&self, frame: &RgbaImage) -> RgbaImage {
        let left = self.left.min(frame.width());
        let top = self.top.min(frame.height());
        let width = self.width.min(frame.width() - left);
        let height = self.height.min(frame.height() - top);
        image::imageops::crop_imm(frame, left, top, width, height).to_image()
    }
}
