//! Boundaries the agent uses to see the screen and drive the game.
//!
//! The runner implements these with OS adapters; tests implement them with
//! queue-backed fakes.

use image::RgbaImage;

/// Captures the current frame of the game screen.
pub trait Screen: Send + Sync {
    fn capture(&self) -> anyhow::Result<RgbaImage>;
}

/// A game binding the controller can press. Named for what the game does
/// with it; the physical key lives in the input adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameKey {
    /// Tab: toggle the enemy "View Specifics" data panel.
    ViewSpecifics,
    /// Enter: confirm the highlighted menu entry.
    Confirm,
    /// Esc: back out / open the system menu.
    Back,
    /// Down arrow: next menu entry.
    MenuDown,
    /// F: cycle target rightward.
    TargetRight,
    /// R: cycle target leftward.
    TargetLeft,
    /// Q: open the arts menu.
    Arts,
    /// E: open the crafts menu.
    Crafts,
    /// X: open the items menu.
    Items,
    /// Z: open the character screen from the system menu.
    Roster,
}

/// Emits synthetic input events into the game window.
pub trait InputPort: Send + Sync {
    fn press(&self, key: GameKey) -> anyhow::Result<()>;
    /// Positive scrolls up, negative down.
    fn scroll(&self, amount: i32) -> anyhow::Result<()>;
    fn middle_click(&self) -> anyhow::Result<()>;
}
