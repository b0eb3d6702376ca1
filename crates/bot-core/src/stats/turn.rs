use std::fmt::Write;

use serde::{Deserialize, Serialize};

use super::{EnemyStat, PlayerCharacterStat};

/// The VLM-derived snapshot of one combat turn. Rebuilt from screenshots at
/// the start of every player phase.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct TurnState {
    pub enemies: Vec<EnemyStat>,
    /// Enemy marker coordinates inside the turn-order region, used to find the
    /// selected portrait again when an action needs to cycle back to a target.
    pub enemy_coords: Vec<(u32, u32)>,
    pub party: Vec<PlayerCharacterStat>,
}

impl TurnState {
    pub fn active_character(&self) -> Option<&PlayerCharacterStat> {
        self.party.iter().find(|pc| pc.is_active)
    }

    pub fn enemy(&self, enemy_id: usize) -> Option<&EnemyStat> {
        self.enemies.iter().find(|e| e.enemy_id == enemy_id)
    }

    /// Renders the full turn context the reasoner is prompted with.
    pub fn to_prompt(&self) -> String {
        let mut out = String::new();

        out.push_str("# CHARACTERS STATS\n");
        for pc in &self.party {
            writeln!(out, "{}", pc.to_prompt()).unwrap();
        }

        if let Some(active) = self.active_character() {
            writeln!(
                out,
                "\nYou can give orders to Character {}.",
                active.character_id
            )
            .unwrap();
        }

        out.push_str("\n# ENEMIES STATS\n");
        for enemy in &self.enemies {
            writeln!(out, "{}", enemy.to_prompt()).unwrap();
        }

        out
    }
}
