//! Pre-combat party profiling: walks the character screen and reads each
//! member's combat parameters before any encounter starts.

use anyhow::Context;
use tracing::{debug, info};

use crate::agent::controller::Controller;
use crate::agent::ports::Screen;
use crate::config::AgentConfig;
use crate::stats::PlayerCharacterStat;
use crate::vlm::VlmClient;

use super::extract::{parse_single_number, parse_stat_pair};

pub const STR_DEF_PROMPT: &str =
    "First value is Strength, and second value is Defense. What are these values? Be very concise.";
pub const ATS_ADF_PROMPT: &str = "First value is Arts Strength, and second value is Arts Defense. \
What are these values? Be very concise.";
pub const SPEED_PROMPT: &str = "What number is it? Just give the number.";

/// Reads attack/defense, arts attack/defense and speed for every party member
/// from the character screen, advancing the roster between members.
///
/// Assumes the agent is out of combat and the field UI is responsive.
pub async fn profile_party(
    party: &mut [PlayerCharacterStat],
    controller: &Controller,
    screen: &dyn Screen,
    vlm: &dyn VlmClient,
    cfg: &AgentConfig,
) -> anyhow::Result<()> {
    debug!("reading party strengths from the character screen");
    let seed = cfg.vision.extract_seed;

    controller.open_character_screen().await?;

    for pc in party.iter_mut() {
        let frame = screen.capture().context("capture character screen")?;

        let crop = cfg.regions.character_atk_def.crop(&frame);
        let reply = vlm.ask(STR_DEF_PROMPT, &crop, seed).await?;
        let (attack, defense) = parse_stat_pair(&reply, "str", "def")
            .with_context(|| format!("str/def readout for character {}", pc.character_id))?;

        let crop = cfg.regions.character_ats_adf.crop(&frame);
        let reply = vlm.ask(ATS_ADF_PROMPT, &crop, seed).await?;
        let (arts_attack, arts_defense) = parse_stat_pair(&reply, "str", "def")
            .with_context(|| format!("ats/adf readout for character {}", pc.character_id))?;

        let crop = cfg.regions.character_speed.crop(&frame);
        let reply = vlm.ask(SPEED_PROMPT, &crop, seed).await?;
        let speed = parse_single_number(&reply)
            .with_context(|| format!("speed readout for character {}", pc.character_id))?;

        pc.attack = attack;
        pc.defense = defense;
        pc.arts_attack = arts_attack;
        pc.arts_defense = arts_defense;
        pc.speed = speed;
        info!(
            character = pc.character_id,
            attack, defense, arts_attack, arts_defense, speed, "character strengths recorded"
        );

        controller.next_roster_entry().await?;
    }

    controller.close_character_screen().await?;
    Ok(())
}
