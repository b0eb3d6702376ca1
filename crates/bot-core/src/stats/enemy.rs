use std::fmt::Write;

use serde::{Deserialize, Serialize};

use super::{AilmentFlags, ElementWeakness, NEUTRAL_EFFICACY};

/// One profiled enemy. Built fresh every turn while the enemy data panel is
/// open; never persisted across turns.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct EnemyStat {
    /// Index of the enemy's portrait in the turn-order region, left to right.
    pub enemy_id: usize,
    /// True if this enemy was reached by cycling rightward when it was profiled,
    /// so the same direction is used to select it again.
    pub targeted_with_f: bool,
    /// False when the engage preview showed the out-of-reach marker.
    pub basic_attack_in_reach: bool,
    pub hp: u32,
    pub hp_max: u32,
    pub stun: u32,
    pub attack: u32,
    pub defense: u32,
    pub arts_attack: u32,
    pub arts_defense: u32,
    pub speed: u32,
    pub weakness: ElementWeakness,
    pub ailments: AilmentFlags,
}

impl EnemyStat {
    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Renders the stat block the reasoner sees for this enemy.
    pub fn to_prompt(&self) -> String {
        let mut out = String::new();
        write!(
            out,
            "Enemy {} has HP {} out of {}, stun level {}%. Its attack {}, defense {}, \
             arts strength {}, arts defense {}, initiative {}.",
            self.enemy_id,
            self.hp,
            self.hp_max,
            self.stun,
            self.attack,
            self.defense,
            self.arts_attack,
            self.arts_defense,
            self.speed,
        )
        .unwrap();

        let weak: Vec<String> = self
            .weakness
            .entries()
            .iter()
            .filter(|(_, v)| *v > NEUTRAL_EFFICACY)
            .map(|(name, v)| format!("{name} {v}% of arts damage"))
            .collect();
        if !weak.is_empty() {
            write!(out, " It is weak to elements: {}.", weak.join(", ")).unwrap();
        }

        let resist: Vec<String> = self
            .weakness
            .entries()
            .iter()
            .filter(|(_, v)| *v < NEUTRAL_EFFICACY)
            .map(|(name, v)| format!("{name} {v}% of arts damage"))
            .collect();
        if !resist.is_empty() {
            write!(out, " It is resistant to elements: {}.", resist.join(", ")).unwrap();
        }

        let ailments = self.ailments.active();
        if !ailments.is_empty() {
            write!(out, " It is susceptible to get {}.", ailments.join(", ")).unwrap();
        }

        if self.basic_attack_in_reach {
            out.push_str(" This enemy is within reach of basic attack, crafts, and attack arts.");
        } else {
            out.push_str(
                " This enemy is out of reach for basic attack, but can be attacked by crafts, and attack arts.",
            );
        }

        out
    }
}

impl Default for EnemyStat {
    fn default() -> Self {
        Self {
            enemy_id: 0,
            targeted_with_f: true,
            basic_attack_in_reach: false,
            hp: 0,
            hp_max: 0,
            stun: 0,
            attack: 0,
            defense: 0,
            arts_attack: 0,
            arts_defense: 0,
            speed: 0,
            weakness: ElementWeakness::default(),
            ailments: AilmentFlags::default(),
        }
    }
}
