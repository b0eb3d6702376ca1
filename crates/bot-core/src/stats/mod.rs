//! Combat stat records: what the perception layer extracts from screenshots
//! and what the reasoner prompt is rendered from.

pub mod enemy;
pub mod player;
pub mod turn;

use serde::{Deserialize, Serialize};

pub use enemy::EnemyStat;
pub use player::PlayerCharacterStat;
pub use turn::TurnState;

/// Neutral elemental efficacy. Above this the target is weak, below it resistant.
pub const NEUTRAL_EFFICACY: u32 = 100;

/// Per-element arts efficacy percentages against a target.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct ElementWeakness {
    pub earth: u32,
    pub water: u32,
    pub fire: u32,
    pub wind: u32,
    pub time: u32,
    pub space: u32,
    pub mirage: u32,
}

impl Default for ElementWeakness {
    fn default() -> Self {
        Self {
            earth: NEUTRAL_EFFICACY,
            water: NEUTRAL_EFFICACY,
            fire: NEUTRAL_EFFICACY,
            wind: NEUTRAL_EFFICACY,
            time: NEUTRAL_EFFICACY,
            space: NEUTRAL_EFFICACY,
            mirage: NEUTRAL_EFFICACY,
        }
    }
}

impl ElementWeakness {
    /// Element name / value pairs in display order.
    pub fn entries(&self) -> [(&'static str, u32); 7] {
        [
            ("earth", self.earth),
            ("water", self.water),
            ("fire", self.fire),
            ("wind", self.wind),
            ("time", self.time),
            ("space", self.space),
            ("mirage", self.mirage),
        ]
    }
}

/// Status-effect flags. For enemies: susceptibility. For party members: in effect.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct AilmentFlags {
    pub stat_down: bool,
    pub burn: bool,
    pub seal: bool,
    pub rot: bool,
    pub fear: bool,
    pub delay: bool,
    pub freeze: bool,
    pub mute: bool,
    pub blind: bool,
    pub deathblow: bool,
}

impl AilmentFlags {
    /// Builds flags from the two status columns of the enemy data panel.
    /// Left column top-to-bottom: stat down, burn, seal, rot, fear.
    /// Right column top-to-bottom: delay, freeze, mute, blind, deathblow.
    pub fn from_columns(left: [bool; 5], right: [bool; 5]) -> Self {
        Self {
            stat_down: left[0],
            burn: left[1],
            seal: left[2],
            rot: left[3],
            fear: left[4],
            delay: right[0],
            freeze: right[1],
            mute: right[2],
            blind: right[3],
            deathblow: right[4],
        }
    }

    /// Names of the set flags in display order.
    pub fn active(&self) -> Vec<&'static str> {
        let all = [
            (self.stat_down, "stat down"),
            (self.burn, "burn"),
            (self.seal, "seal"),
            (self.rot, "rot"),
            (self.fear, "fear"),
            (self.delay, "delay"),
            (self.freeze, "freeze"),
            (self.mute, "mute"),
            (self.blind, "blind"),
            (self.deathblow, "deathblow"),
        ];
        all.into_iter()
            .filter_map(|(set, name)| set.then_some(name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ailments_from_columns_keeps_panel_order() {
        let flags = AilmentFlags::from_columns(
            [true, false, true, false, false],
            [false, false, false, true, true],
        );
        assert!(flags.stat_down);
        assert!(flags.seal);
        assert!(flags.blind);
        assert!(flags.deathblow);
        assert!(!flags.burn);
        assert!(!flags.delay);
        assert_eq!(flags.active(), vec!["stat down", "seal", "blind", "deathblow"]);
    }

    #[test]
    fn weakness_defaults_are_neutral() {
        let w = ElementWeakness::default();
        assert!(w.entries().iter().all(|(_, v)| *v == NEUTRAL_EFFICACY));
    }
}
