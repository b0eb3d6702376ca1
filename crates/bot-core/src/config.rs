//! Agent configuration: pixel regions, model endpoints, prompts, and timing.
//!
//! Every field has a default matching a 1920x1080 frame and a locally hosted
//! model pair, so an empty TOML file yields a runnable config.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::perception::geometry::Region;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgentConfig {
    #[serde(default)]
    pub vision: VisionSection,
    #[serde(default)]
    pub reasoner: ReasonerSection,
    #[serde(default)]
    pub timing: TimingSection,
    #[serde(default)]
    pub limits: LimitsSection,
    #[serde(default)]
    pub regions: RegionSection,
    #[serde(default)]
    pub launch: LaunchSection,
    #[serde(default)]
    pub capture: CaptureSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VisionSection {
    #[serde(default = "default_vision_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_vision_model")]
    pub model: String,
    /// Sampling seed for turn/combat-state probe questions.
    #[serde(default = "default_probe_seed")]
    pub probe_seed: i64,
    /// Sampling seed for stat extraction questions.
    #[serde(default = "default_extract_seed")]
    pub extract_seed: i64,
}

impl Default for VisionSection {
    fn default() -> Self {
        Self {
            endpoint: default_vision_endpoint(),
            model: default_vision_model(),
            probe_seed: default_probe_seed(),
            extract_seed: default_extract_seed(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReasonerSection {
    #[serde(default = "default_reasoner_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_reasoner_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    /// Append `/no_think` to the turn prompt to skip chain-of-thought.
    #[serde(default = "default_true")]
    pub nothink: bool,
    /// When false the agent only observes: perception runs, no orders are given.
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

impl Default for ReasonerSection {
    fn default() -> Self {
        Self {
            endpoint: default_reasoner_endpoint(),
            model: default_reasoner_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            nothink: true,
            enabled: true,
            system_prompt: default_system_prompt(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimingSection {
    /// Delay between screenshot polls while waiting for the player phase.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Settle delay after an ordinary keypress or scroll.
    #[serde(default = "default_action_delay_ms")]
    pub action_delay_ms: u64,
    /// Settle delay after opening a menu.
    #[serde(default = "default_menu_delay_ms")]
    pub menu_delay_ms: u64,
}

impl Default for TimingSection {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            action_delay_ms: default_action_delay_ms(),
            menu_delay_ms: default_menu_delay_ms(),
        }
    }
}

impl TimingSection {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn action_delay(&self) -> Duration {
        Duration::from_millis(self.action_delay_ms)
    }

    pub fn menu_delay(&self) -> Duration {
        Duration::from_millis(self.menu_delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimitsSection {
    /// Combat ends with a `TurnLimit` outcome after this many player turns.
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,
    /// A turn that never arrives within this many polls is an error.
    #[serde(default = "default_max_turn_wait_polls")]
    pub max_turn_wait_polls: u32,
}

impl Default for LimitsSection {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            max_turn_wait_polls: default_max_turn_wait_polls(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegionSection {
    /// The turn-order bar across the top of the screen.
    #[serde(default = "default_turn_order")]
    pub turn_order: Region,
    /// Color of the chevron tip on enemy portraits in the turn-order bar.
    #[serde(default = "default_enemy_marker_rgb")]
    pub enemy_marker_rgb: [u8; 3],
    /// Minimum x-distance between two marker clusters.
    #[serde(default = "default_enemy_marker_min_gap")]
    pub enemy_marker_min_gap: u32,
    /// Value-channel level at which a pixel counts as bright.
    #[serde(default = "default_brightness_threshold")]
    pub brightness_threshold: u8,
    /// Offset from an enemy marker to its selection-highlight probe square.
    #[serde(default = "default_target_probe_delta")]
    pub target_probe_delta: (i32, i32),
    #[serde(default = "default_target_probe_size")]
    pub target_probe_size: u32,
    /// Minimum bright proportion for a probe to count as selected.
    #[serde(default = "default_target_significance")]
    pub target_significance: f32,

    // Enemy data panel ("View Specifics").
    #[serde(default = "default_enemy_hp")]
    pub enemy_hp: Region,
    #[serde(default = "default_enemy_stun")]
    pub enemy_stun: Region,
    #[serde(default = "default_enemy_atk_ats_speed")]
    pub enemy_atk_ats_speed: Region,
    #[serde(default = "default_enemy_def_adf")]
    pub enemy_def_adf: Region,
    #[serde(default = "default_enemy_weakness_basic")]
    pub enemy_weakness_basic: Region,
    #[serde(default = "default_enemy_weakness_higher")]
    pub enemy_weakness_higher: Region,
    #[serde(default = "default_enemy_ailments_left")]
    pub enemy_ailments_left: Region,
    #[serde(default = "default_enemy_ailments_right")]
    pub enemy_ailments_right: Region,

    /// HP/EP/CP readout per roster slot, top to bottom.
    #[serde(default = "default_party_pools")]
    pub party_pools: Vec<Region>,

    // Character screen (out of combat).
    #[serde(default = "default_character_atk_def")]
    pub character_atk_def: Region,
    #[serde(default = "default_character_ats_adf")]
    pub character_ats_adf: Region,
    #[serde(default = "default_character_speed")]
    pub character_speed: Region,
}

impl Default for RegionSection {
    fn default() -> Self {
        Self {
            turn_order: default_turn_order(),
            enemy_marker_rgb: default_enemy_marker_rgb(),
            enemy_marker_min_gap: default_enemy_marker_min_gap(),
            brightness_threshold: default_brightness_threshold(),
            target_probe_delta: default_target_probe_delta(),
            target_probe_size: default_target_probe_size(),
            target_significance: default_target_significance(),
            enemy_hp: default_enemy_hp(),
            enemy_stun: default_enemy_stun(),
            enemy_atk_ats_speed: default_enemy_atk_ats_speed(),
            enemy_def_adf: default_enemy_def_adf(),
            enemy_weakness_basic: default_enemy_weakness_basic(),
            enemy_weakness_higher: default_enemy_weakness_higher(),
            enemy_ailments_left: default_enemy_ailments_left(),
            enemy_ailments_right: default_enemy_ailments_right(),
            party_pools: default_party_pools(),
            character_atk_def: default_character_atk_def(),
            character_ats_adf: default_character_ats_adf(),
            character_speed: default_character_speed(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LaunchSection {
    /// Shell command that starts the game (e.g. a steam:// URL launcher).
    #[serde(default)]
    pub game_command: Option<String>,
    /// Shell command that starts the reasoner server.
    #[serde(default)]
    pub llm_server_command: Option<String>,
    /// Wait after each launch command before proceeding.
    #[serde(default = "default_startup_wait_secs")]
    pub startup_wait_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CaptureSection {
    /// When set, every captured frame is also written here (calibration aid).
    #[serde(default)]
    pub dump_latest_frame_to: Option<PathBuf>,
}

fn default_vision_endpoint() -> String {
    "http://127.0.0.1:11434/api/generate".to_string()
}

fn default_vision_model() -> String {
    "qwen2.5vl:7b".to_string()
}

fn default_probe_seed() -> i64 {
    1643
}

fn default_extract_seed() -> i64 {
    1741
}

fn default_reasoner_endpoint() -> String {
    "http://127.0.0.1:8080/v1/chat/completions".to_string()
}

fn default_reasoner_model() -> String {
    "openai/qwen3-30b-a3b".to_string()
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_temperature() -> f32 {
    0.6
}

fn default_top_p() -> f32 {
    0.95
}

fn default_true() -> bool {
    true
}

fn default_system_prompt() -> String {
    "You are playing a turn-based tactics game, where you have to control separate units \
in order to gain the upper hand. Each unit can move and attack in the same turn. Use of item \
is considered as attack action.
Attacks can be basic, craft, art. Basic attack doesn't consume CP or EP and is executed in an \
instant. Crafts consume CP and are executed in an instant, yield high damage, buff allies, or \
debuff enemies. Most crafts allow to hit multiple enemies at once while act as a damage \
multiplier. Crafts can't be canceled by enemy attacks. Treat all crafts as physical damage only.
CP pool is restored by attacking enemies with basic attacks and arts, and receiving damage. \
EP pool can be restored only through the item use.
Arts consume EP but have delayed execution before yielding high damage, buff allies, or debuff \
enemies. This delay means that arts may be casted after other characters', and enemies' turn. \
Some enemies' attacks are able to cancel casting art.
Units with high physical strength usually excel at using crafts, while units with high maximum \
EP and arts damage are better suited for using arts.
Basic attacks are available to everyone. You must give the order to active character based of \
the current turn context."
        .to_string()
}

fn default_poll_interval_ms() -> u64 {
    2500
}

fn default_action_delay_ms() -> u64 {
    500
}

fn default_menu_delay_ms() -> u64 {
    1000
}

fn default_max_turns() -> u32 {
    20
}

fn default_max_turn_wait_polls() -> u32 {
    480
}

fn default_turn_order() -> Region {
    Region::new(660, 45, 900, 140)
}

fn default_enemy_marker_rgb() -> [u8; 3] {
    [219, 0, 72]
}

fn default_enemy_marker_min_gap() -> u32 {
    10
}

fn default_brightness_threshold() -> u8 {
    crate::perception::scan::BRIGHTNESS_THRESHOLD
}

fn default_target_probe_delta() -> (i32, i32) {
    (20, 0)
}

fn default_target_probe_size() -> u32 {
    10
}

fn default_target_significance() -> f32 {
    crate::perception::scan::SELECTION_SIGNIFICANCE
}

fn default_enemy_hp() -> Region {
    Region::new(1566, 284, 200, 28)
}

fn default_enemy_stun() -> Region {
    Region::new(1566, 320, 60, 30)
}

fn default_enemy_atk_ats_speed() -> Region {
    Region::new(1566, 382, 50, 102)
}

fn default_enemy_def_adf() -> Region {
    Region::new(1704, 382, 50, 66)
}

fn default_enemy_weakness_basic() -> Region {
    Region::new(1530, 522, 50, 140)
}

fn default_enemy_weakness_higher() -> Region {
    Region::new(1715, 522, 50, 104)
}

fn default_enemy_ailments_left() -> Region {
    Region::new(1556, 700, 40, 174)
}

fn default_enemy_ailments_right() -> Region {
    Region::new(1750, 700, 40, 174)
}

fn default_party_pools() -> Vec<Region> {
    vec![
        Region::new(160, 108, 240, 50),
        Region::new(160, 208, 240, 50),
        Region::new(160, 308, 240, 50),
        Region::new(160, 408, 240, 50),
    ]
}

fn default_character_atk_def() -> Region {
    Region::new(1280, 310, 250, 64)
}

fn default_character_ats_adf() -> Region {
    Region::new(1284, 370, 250, 64)
}

fn default_character_speed() -> Region {
    Region::new(1668, 364, 38, 30)
}

fn default_startup_wait_secs() -> u64 {
    40
}
