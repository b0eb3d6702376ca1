use std::fmt::Write;

use serde::{Deserialize, Serialize};

use super::AilmentFlags;

/// Hard cap on the craft-point pool.
pub const CP_CAP: u32 = 200;

/// One party member. Built once before combat, then mutated in place as each
/// turn's screenshot is interpreted.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct PlayerCharacterStat {
    /// Roster slot, top to bottom.
    pub character_id: usize,
    /// True while this member is the one taking the current turn.
    pub is_active: bool,
    pub hp: u32,
    pub hp_max: u32,
    pub ep: u32,
    pub ep_max: u32,
    pub cp: u32,
    pub attack: u32,
    pub defense: u32,
    pub arts_attack: u32,
    pub arts_defense: u32,
    pub speed: u32,
    pub ailments: AilmentFlags,
}

impl Default for PlayerCharacterStat {
    fn default() -> Self {
        Self {
            character_id: 0,
            is_active: false,
            hp: 100,
            hp_max: 100,
            ep: 100,
            ep_max: 100,
            cp: CP_CAP,
            attack: 100,
            defense: 100,
            arts_attack: 100,
            arts_defense: 100,
            speed: 100,
            ailments: AilmentFlags::default(),
        }
    }
}

impl PlayerCharacterStat {
    pub fn new(character_id: usize) -> Self {
        Self {
            character_id,
            ..Self::default()
        }
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Records a fresh HP/EP/CP readout. Pool maxima ratchet upward when an
    /// observed value exceeds them; CP never exceeds [`CP_CAP`].
    pub fn apply_pool_readout(&mut self, hp: u32, ep: u32, cp: u32) {
        self.hp = hp;
        if self.hp > self.hp_max {
            self.hp_max = self.hp;
        }
        self.ep = ep;
        if self.ep > self.ep_max {
            self.ep_max = self.ep;
        }
        self.cp = cp.min(CP_CAP);
    }

    /// Renders the stat sentence the reasoner sees for this member.
    pub fn to_prompt(&self) -> String {
        let mut out = String::new();
        write!(
            out,
            "Character {} has HP {} out of {}, EP {} out of {}, CP {} out of {}. \
             Its attack {}, defense {}, arts strength {}, arts defense {}, initiative {}.",
            self.character_id,
            self.hp,
            self.hp_max,
            self.ep,
            self.ep_max,
            self.cp,
            CP_CAP,
            self.attack,
            self.defense,
            self.arts_attack,
            self.arts_defense,
            self.speed,
        )
        .unwrap();

        let ailments = self.ailments.active();
        if !ailments.is_empty() {
            write!(out, " It is affected by {}.", ailments.join(", ")).unwrap();
        }

        out
    }
}
