//! Pixel-level routines over the turn-order region: enemy marker location and
//! selected-portrait detection.

use image::{GrayImage, RgbaImage};

/// Pixels at or above this value-channel level count as bright.
pub const BRIGHTNESS_THRESHOLD: u8 = 128;

/// Minimum proportion of bright probe pixels for a portrait to count as selected.
pub const SELECTION_SIGNIFICANCE: f32 = 0.5;

/// Locates enemy portrait markers in the cropped turn-order region.
///
/// Scans column by column for pixels exactly matching the marker color (the
/// tip of the red chevron on enemy portraits), then clusters the matching
/// x-coordinates: the first match opens a cluster and every later match at
/// least `min_gap` pixels right of the last cluster origin opens another.
/// Returns one coordinate per cluster — the topmost matching pixel in the
/// origin column — ordered left to right.
pub fn locate_enemy_markers(
    turn_order: &RgbaImage,
    marker_rgb: [u8; 3],
    min_gap: u32,
) -> Vec<(u32, u32)> {
    let mut coords = Vec::new();
    let mut last_origin: Option<u32> = None;

    for x in 0..turn_order.width() {
        for y in 0..turn_order.height() {
            let [r, g, b, _] = turn_order.get_pixel(x, y).0;
            if [r, g, b] != marker_rgb {
                continue;
            }
            match last_origin {
                None => {
                    coords.push((x, y));
                    last_origin = Some(x);
                }
                Some(origin) if x - origin >= min_gap => {
                    coords.push((x, y));
                    last_origin = Some(x);
                }
                Some(_) => {}
            }
            // Only the topmost pixel of the origin column matters.
            break;
        }
    }

    coords
}

/// Binarizes the turn-order crop on its HSV value channel: white where
/// `max(r, g, b) >= threshold`, black elsewhere.
pub fn brightness_mask(img: &RgbaImage, threshold: u8) -> GrayImage {
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        let [r, g, b, _] = img.get_pixel(x, y).0;
        let value = r.max(g).max(b);
        image::Luma([if value >= threshold { 255 } else { 0 }])
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectedPortrait {
    /// Index into the enemy coordinate list.
    pub index: usize,
    /// Proportion of bright pixels in the winning probe square.
    pub confidence: f32,
}

/// Finds which enemy portrait is currently selected.
///
/// For each enemy coordinate, probes the `probe_size` square whose bottom-left
/// corner sits at `(x + dx, y + dy)` and measures the proportion of bright
/// mask pixels (the selection highlight washes the probe area out). A fully
/// bright probe wins immediately. Otherwise the brightest probe wins, unless
/// it fails to clear `significance`, in which case no portrait is selected.
pub fn find_selected_portrait(
    mask: &GrayImage,
    enemy_coords: &[(u32, u32)],
    probe_delta: (i32, i32),
    probe_size: u32,
    significance: f32,
) -> Option<SelectedPortrait> {
    let mut best: Option<SelectedPortrait> = None;

    for (index, &(x, y)) in enemy_coords.iter().enumerate() {
        let left = x as i64 + probe_delta.0 as i64;
        let top = y as i64 + probe_delta.1 as i64 - probe_size as i64;
        let confidence = bright_proportion(mask, left, top, probe_size);

        if confidence >= 1.0 {
            return Some(SelectedPortrait { index, confidence });
        }
        if best.map(|b| confidence > b.confidence).unwrap_or(true) {
            best = Some(SelectedPortrait { index, confidence });
        }
    }

    best.filter(|b| b.confidence >= significance)
}

fn bright_proportion(mask: &GrayImage, left: i64, top: i64, size: u32) -> f32 {
    let mut bright = 0u32;
    let mut total = 0u32;
    for dy in 0..size as i64 {
        for dx in 0..size as i64 {
            let (px, py) = (left + dx, top + dy);
            if px < 0 || py < 0 || px >= mask.width() as i64 || py >= mask.height() as i64 {
                continue;
            }
            total += 1;
            if mask.get_pixel(px as u32, py as u32).0[0] == 255 {
                bright += 1;
            }
        }
    }
    if total == 0 {
        return 0.0;
    }
    bright as f32 / total as f32
}
