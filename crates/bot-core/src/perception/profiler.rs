//! Per-turn stat extraction: locate enemies in the turn-order bar, cycle
//! through them profiling each from the enemy data panel, and refresh the
//! party's pool readouts.

use anyhow::Context;
use image::RgbaImage;
use tracing::{debug, info, warn};

use crate::agent::controller::Controller;
use crate::agent::ports::Screen;
use crate::config::AgentConfig;
use crate::stats::{AilmentFlags, ElementWeakness, EnemyStat, PlayerCharacterStat, TurnState};
use crate::vlm::VlmClient;

use super::extract::{
    answer_contains_yes, numbers_from_json_block_exact, parse_basic_elements, parse_binary_flags,
    parse_higher_elements, parse_pool_readout, parse_yes_no,
};
use super::scan::{brightness_mask, find_selected_portrait, locate_enemy_markers};

pub const EXTRACT_NUMBERS_PROMPT: &str = "Extract all numbers as JSON list.";
pub const LIST_NUMBERS_PROMPT: &str = "List numbers. Just give the numbers.";
pub const AILMENT_COLUMN_PROMPT: &str = "List circles, and triangles in order of their occurence \
in the column. For each circle return 1, for each triangle - 0. Just give the list.";
pub const OUT_OF_REACH_PROMPT: &str = "Is there a big red X on screen? Give only yes or no answer.";
pub const POOL_CSV_PROMPT: &str = "Extract values of HP, EP, CP as CSV: name,value";
pub const POOL_LABELS_PROMPT: &str = "Are words HP, EP, CP all present on the image? Give only answer.";

/// Rebuilds the turn snapshot: enemy profiles plus refreshed party pools.
pub async fn update_combat_stats(
    party: &mut Vec<PlayerCharacterStat>,
    controller: &mut Controller,
    screen: &dyn Screen,
    vlm: &dyn VlmClient,
    cfg: &AgentConfig,
) -> anyhow::Result<TurnState> {
    let frame = screen.capture().context("capture turn frame")?;

    let turn_order = cfg.regions.turn_order.crop(&frame);
    let enemy_coords = locate_enemy_markers(
        &turn_order,
        cfg.regions.enemy_marker_rgb,
        cfg.regions.enemy_marker_min_gap,
    );
    info!(enemies = enemy_coords.len(), "enemy markers located");

    let enemies = profile_enemies(&enemy_coords, controller, screen, vlm, cfg).await?;
    update_party_pools(&frame, party, vlm, cfg).await?;

    Ok(TurnState {
        enemies,
        enemy_coords,
        party: party.clone(),
    })
}

/// Cycles through every detected enemy and profiles each one once.
///
/// The sweep starts rightward (F). Once every detected enemy has been seen
/// while still cycling rightward, the direction flips so enemies the rightward
/// cycle skips get a leftward pass; a full leftward pass with nothing new ends
/// the sweep. The press budget is two cycles per enemy plus one.
pub async fn profile_enemies(
    enemy_coords: &[(u32, u32)],
    controller: &mut Controller,
    screen: &dyn Screen,
    vlm: &dyn VlmClient,
    cfg: &AgentConfig,
) -> anyhow::Result<Vec<EnemyStat>> {
    if enemy_coords.is_empty() {
        info!("no enemy markers; nothing to profile");
        return Ok(Vec::new());
    }

    controller.toggle_enemy_specifics().await?;
    controller.target_direction_f = true;

    let n_enemies = enemy_coords.len();
    let mut profiled: Vec<EnemyStat> = Vec::new();
    let mut profiled_ids: Vec<usize> = Vec::new();

    for _ in 0..(2 * n_enemies + 1) {
        let frame = screen.capture().context("capture profiling frame")?;
        let mask = brightness_mask(
            &cfg.regions.turn_order.crop(&frame),
            cfg.regions.brightness_threshold,
        );
        let selected = find_selected_portrait(
            &mask,
            enemy_coords,
            cfg.regions.target_probe_delta,
            cfg.regions.target_probe_size,
            cfg.regions.target_significance,
        );

        let Some(sel) = selected else {
            warn!("no portrait highlight detected; cycling on");
            controller.cycle_target(controller.target_direction_f).await?;
            continue;
        };

        if profiled_ids.contains(&sel.index) {
            let all_seen = (0..n_enemies).all(|i| profiled_ids.contains(&i));
            if all_seen && controller.target_direction_f {
                controller.target_direction_f = false;
            } else if all_seen {
                break;
            }
            controller.cycle_target(controller.target_direction_f).await?;
            continue;
        }

        profiled_ids.push(sel.index);
        let stat = profile_selected_enemy(
            &frame,
            vlm,
            cfg,
            sel.index,
            controller.target_direction_f,
        )
        .await
        .with_context(|| format!("profile enemy {}", sel.index))?;
        profiled.push(stat);

        controller.cycle_target(controller.target_direction_f).await?;
    }

    debug!(?profiled_ids, "enemy sweep finished");
    Ok(profiled)
}

/// Reads the enemy data panel for the currently selected enemy.
async fn profile_selected_enemy(
    frame: &RgbaImage,
    vlm: &dyn VlmClient,
    cfg: &AgentConfig,
    enemy_id: usize,
    targeted_with_f: bool,
) -> anyhow::Result<EnemyStat> {
    let seed = cfg.vision.extract_seed;
    let regions = &cfg.regions;

    let hp_crop = regions.enemy_hp.crop(frame);
    let reply = vlm.ask(EXTRACT_NUMBERS_PROMPT, &hp_crop, seed).await?;
    let hp = numbers_from_json_block_exact(&reply, 2).context("hp readout")?;

    let stun_crop = regions.enemy_stun.crop(frame);
    let reply = vlm.ask(EXTRACT_NUMBERS_PROMPT, &stun_crop, seed).await?;
    let stun = numbers_from_json_block_exact(&reply, 1).context("stun readout")?;

    let offense_crop = regions.enemy_atk_ats_speed.crop(frame);
    let reply = vlm.ask(EXTRACT_NUMBERS_PROMPT, &offense_crop, seed).await?;
    let offense = numbers_from_json_block_exact(&reply, 3).context("atk/ats/speed readout")?;

    let defense_crop = regions.enemy_def_adf.crop(frame);
    let reply = vlm.ask(EXTRACT_NUMBERS_PROMPT, &defense_crop, seed).await?;
    let defense = numbers_from_json_block_exact(&reply, 2).context("def/adf readout")?;

    let weakness = extract_weaknesses(frame, vlm, cfg).await?;
    let ailments = extract_ailments(frame, vlm, cfg).await?;

    // The engage preview puts a big red X over targets basic attacks can't reach.
    let reply = vlm.ask(OUT_OF_REACH_PROMPT, frame, seed).await?;
    let basic_attack_in_reach = !answer_contains_yes(&reply);

    Ok(EnemyStat {
        enemy_id,
        targeted_with_f,
        basic_attack_in_reach,
        hp: hp[0],
        hp_max: hp[1],
        stun: stun[0],
        attack: offense[0],
        arts_attack: offense[1],
        speed: offense[2],
        defense: defense[0],
        arts_defense: defense[1],
        weakness,
        ailments,
    })
}

async fn extract_weaknesses(
    frame: &RgbaImage,
    vlm: &dyn VlmClient,
    cfg: &AgentConfig,
) -> anyhow::Result<ElementWeakness> {
    let seed = cfg.vision.extract_seed;

    let basic_crop = cfg.regions.enemy_weakness_basic.crop(frame);
    let reply = vlm.ask(LIST_NUMBERS_PROMPT, &basic_crop, seed).await?;
    let (earth, water, fire, wind) = parse_basic_elements(&reply).context("basic elements")?;

    let higher_crop = cfg.regions.enemy_weakness_higher.crop(frame);
    let reply = vlm.ask(LIST_NUMBERS_PROMPT, &higher_crop, seed).await?;
    let (time, space, mirage) = parse_higher_elements(&reply).context("higher elements")?;

    Ok(ElementWeakness {
        earth,
        water,
        fire,
        wind,
        time,
        space,
        mirage,
    })
}

async fn extract_ailments(
    frame: &RgbaImage,
    vlm: &dyn VlmClient,
    cfg: &AgentConfig,
) -> anyhow::Result<AilmentFlags> {
    let seed = cfg.vision.extract_seed;

    let left_crop = cfg.regions.enemy_ailments_left.crop(frame);
    let reply = vlm.ask(AILMENT_COLUMN_PROMPT, &left_crop, seed).await?;
    let left = parse_binary_flags::<5>(&reply).context("left ailment column")?;

    let right_crop = cfg.regions.enemy_ailments_right.crop(frame);
    let reply = vlm.ask(AILMENT_COLUMN_PROMPT, &right_crop, seed).await?;
    let right = parse_binary_flags::<5>(&reply).context("right ailment column")?;

    Ok(AilmentFlags::from_columns(left, right))
}

/// Refreshes each party member's HP/EP/CP from its pool readout region and
/// marks which member is taking the turn (the slot whose readout still shows
/// the HP/EP/CP labels).
pub async fn update_party_pools(
    frame: &RgbaImage,
    party: &mut [PlayerCharacterStat],
    vlm: &dyn VlmClient,
    cfg: &AgentConfig,
) -> anyhow::Result<()> {
    let seed = cfg.vision.extract_seed;
    let mut active_found = false;

    for (pc, region) in party.iter_mut().zip(cfg.regions.party_pools.iter()) {
        let crop = region.crop(frame);

        let reply = vlm.ask(POOL_CSV_PROMPT, &crop, seed).await?;
        let (hp, ep, cp) = parse_pool_readout(&reply)
            .require()
            .with_context(|| format!("pool readout for character {}", pc.character_id))?;
        pc.apply_pool_readout(hp, ep, cp);
        pc.is_active = false;

        if !active_found {
            let reply = vlm.ask(POOL_LABELS_PROMPT, &crop, seed).await?;
            if parse_yes_no(&reply) {
                pc.is_active = true;
                active_found = true;
                info!(character = pc.character_id, "active character identified");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use image::{Rgba, RgbaImage};

    use super::*;
    use crate::agent::ports::{GameKey, InputPort};
    use crate::config::{RegionSection, TimingSection};
    use crate::perception::geometry::Region;
    use std::future::Future;
    use std::pin::Pin;

    #[derive(Default)]
    struct FakeInput {
        keys: Mutex<Vec<GameKey>>,
    }

    impl InputPort for FakeInput {
        fn press(&self, key: GameKey) -> anyhow::Result<()> {
            self.keys.lock().unwrap().push(key);
            Ok(())
        }

        fn scroll(&self, _amount: i32) -> anyhow::Result<()> {
            Ok(())
        }

        fn middle_click(&self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    struct FakeScreen {
        frame: RgbaImage,
    }

    impl Screen for FakeScreen {
        fn capture(&self) -> anyhow::Result<RgbaImage> {
            Ok(self.frame.clone())
        }
    }

    #[derive(Default)]
    struct FakeVlm {
        replies: Mutex<VecDeque<String>>,
        questions: Mutex<Vec<String>>,
    }

    impl FakeVlm {
        fn push(&self, reply: impl Into<String>) {
            self.replies.lock().unwrap().push_back(reply.into());
        }

        fn questions(&self) -> Vec<String> {
            self.questions.lock().unwrap().clone()
        }
    }

    impl VlmClient for FakeVlm {
        fn ask<'a>(
            &'a self,
            question: &'a str,
            _image: &'a RgbaImage,
            _seed: i64,
        ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>> {
            Box::pin(async move {
                self.questions.lock().unwrap().push(question.to_string());
                self.replies
                    .lock()
                    .unwrap()
                    .pop_front()
                    .ok_or_else(|| anyhow::anyhow!("no vlm reply queued for: {question}"))
            })
        }
    }

    fn test_cfg() -> AgentConfig {
        let mut cfg = AgentConfig::default();
        cfg.timing = TimingSection {
            poll_interval_ms: 0,
            action_delay_ms: 0,
            menu_delay_ms: 0,
        };
        cfg.regions = RegionSection {
            turn_order: Region::new(0, 0, 120, 40),
            target_probe_delta: (4, 0),
            target_probe_size: 4,
            enemy_hp: Region::new(0, 50, 10, 5),
            enemy_stun: Region::new(0, 56, 10, 5),
            enemy_atk_ats_speed: Region::new(0, 62, 10, 5),
            enemy_def_adf: Region::new(0, 68, 10, 5),
            enemy_weakness_basic: Region::new(20, 50, 10, 5),
            enemy_weakness_higher: Region::new(20, 56, 10, 5),
            enemy_ailments_left: Region::new(20, 62, 10, 5),
            enemy_ailments_right: Region::new(20, 68, 10, 5),
            party_pools: vec![Region::new(40, 50, 20, 10), Region::new(40, 62, 20, 10)],
            ..RegionSection::default()
        };
        cfg
    }

    /// A frame with one enemy marker at (10, 20) whose probe square is lit.
    fn frame_one_enemy_selected() -> RgbaImage {
        let mut frame = RgbaImage::from_pixel(120, 100, Rgba([0, 0, 0, 255]));
        frame.put_pixel(10, 20, Rgba([219, 0, 72, 255]));
        for dy in 0..4 {
            for dx in 0..4 {
                frame.put_pixel(14 + dx, 16 + dy, Rgba([255, 255, 255, 255]));
            }
        }
        frame
    }

    fn queue_one_enemy_profile(vlm: &FakeVlm) {
        vlm.push("```json\n[850, 1200]\n```"); // hp
        vlm.push("[40]"); // stun
        vlm.push("[310, 220, 55]"); // attack, arts attack, speed
        vlm.push("[150, 180]"); // defense, arts defense
        vlm.push("100\n120\n100\n80"); // earth, water, fire, wind
        vlm.push("100\n100\n110"); // time, space, mirage
        vlm.push("1,0,0,1,1"); // left ailment column
        vlm.push("0,0,0,0,1"); // right ailment column
        vlm.push("No."); // no red X: within reach
    }

    #[tokio::test]
    async fn full_stat_update_profiles_enemy_and_party() -> anyhow::Result<()> {
        let cfg = test_cfg();
        let screen = FakeScreen {
            frame: frame_one_enemy_selected(),
        };
        let input = Arc::new(FakeInput::default());
        let mut controller = Controller::new(input.clone(), cfg.timing.clone());
        let vlm = FakeVlm::default();

        queue_one_enemy_profile(&vlm);
        vlm.push("HP,324\nEP,118\nCP,45"); // slot 0 pools
        vlm.push("Yes."); // slot 0 is active
        vlm.push("HP,200\nEP,50\nCP,300"); // slot 1 pools

        let mut party = vec![PlayerCharacterStat::new(0), PlayerCharacterStat::new(1)];
        let turn =
            update_combat_stats(&mut party, &mut controller, &screen, &vlm, &cfg).await?;

        assert_eq!(turn.enemy_coords, vec![(10, 20)]);
        assert_eq!(turn.enemies.len(), 1);
        let enemy = &turn.enemies[0];
        assert_eq!(enemy.enemy_id, 0);
        assert_eq!((enemy.hp, enemy.hp_max, enemy.stun), (850, 1200, 40));
        assert_eq!(
            (enemy.attack, enemy.arts_attack, enemy.speed),
            (310, 220, 55)
        );
        assert_eq!((enemy.defense, enemy.arts_defense), (150, 180));
        assert_eq!(enemy.weakness.water, 120);
        assert_eq!(enemy.weakness.wind, 80);
        assert_eq!(enemy.weakness.mirage, 110);
        assert!(enemy.ailments.stat_down);
        assert!(enemy.ailments.rot);
        assert!(enemy.ailments.deathblow);
        assert!(!enemy.ailments.burn);
        assert!(enemy.basic_attack_in_reach);
        assert!(enemy.targeted_with_f);

        assert_eq!(turn.party[0].hp, 324);
        assert!(turn.party[0].is_active);
        assert_eq!(turn.party[1].hp, 200);
        assert_eq!(turn.party[1].cp, 200, "cp must stay capped");
        assert!(!turn.party[1].is_active);

        // One enemy: profile, flip direction, confirm nothing new, stop.
        assert!(!controller.target_direction_f);
        Ok(())
    }

    #[tokio::test]
    async fn hallucinated_higher_elements_fall_back_to_neutral() -> anyhow::Result<()> {
        let cfg = test_cfg();
        let screen = FakeScreen {
            frame: frame_one_enemy_selected(),
        };
        let input = Arc::new(FakeInput::default());
        let mut controller = Controller::new(input, cfg.timing.clone());
        let vlm = FakeVlm::default();

        vlm.push("[850, 1200]");
        vlm.push("[40]");
        vlm.push("[310, 220, 55]");
        vlm.push("[150, 180]");
        vlm.push("100, 120, 100, 80");
        vlm.push("100, 100, 110, 90, 70"); // too many entries
        vlm.push("0,0,0,0,0");
        vlm.push("0,0,0,0,0");
        vlm.push("Yes, there is a big red X.");

        let enemies =
            profile_enemies(&[(10, 20)], &mut controller, &screen, &vlm, &cfg).await?;

        assert_eq!(enemies.len(), 1);
        assert_eq!(enemies[0].weakness.time, 100);
        assert_eq!(enemies[0].weakness.space, 100);
        assert_eq!(enemies[0].weakness.mirage, 100);
        assert!(!enemies[0].basic_attack_in_reach);
        Ok(())
    }

    #[tokio::test]
    async fn malformed_stat_readout_is_a_typed_failure() {
        let cfg = test_cfg();
        let screen = FakeScreen {
            frame: frame_one_enemy_selected(),
        };
        let input = Arc::new(FakeInput::default());
        let mut controller = Controller::new(input, cfg.timing.clone());
        let vlm = FakeVlm::default();
        vlm.push("I cannot read any numbers in this image.");

        let err = profile_enemies(&[(10, 20)], &mut controller, &screen, &vlm, &cfg)
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("hp readout"));
    }

    #[tokio::test]
    async fn no_markers_profiles_nothing_and_presses_nothing() -> anyhow::Result<()> {
        let cfg = test_cfg();
        let screen = FakeScreen {
            frame: RgbaImage::from_pixel(120, 100, Rgba([0, 0, 0, 255])),
        };
        let input = Arc::new(FakeInput::default());
        let mut controller = Controller::new(input.clone(), cfg.timing.clone());
        let vlm = FakeVlm::default();

        let enemies = profile_enemies(&[], &mut controller, &screen, &vlm, &cfg).await?;

        assert!(enemies.is_empty());
        assert!(input.keys.lock().unwrap().is_empty());
        assert!(vlm.questions().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn active_probe_stops_after_first_match() -> anyhow::Result<()> {
        let cfg = test_cfg();
        let frame = RgbaImage::from_pixel(120, 100, Rgba([0, 0, 0, 255]));
        let vlm = FakeVlm::default();
        vlm.push("HP,100\nEP,100\nCP,100");
        vlm.push("Yes."); // slot 0 active
        vlm.push("HP,90\nEP,90\nCP,90"); // slot 1: no label question expected

        let mut party = vec![PlayerCharacterStat::new(0), PlayerCharacterStat::new(1)];
        update_party_pools(&frame, &mut party, &vlm, &cfg).await?;

        let label_questions = vlm
            .questions()
            .iter()
            .filter(|q| *q == POOL_LABELS_PROMPT)
            .count();
        assert_eq!(label_questions, 1);
        assert!(party[0].is_active);
        assert!(!party[1].is_active);
        Ok(())
    }
}
