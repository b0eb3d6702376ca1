//! The combat loop: wait for the player phase, rebuild the turn snapshot,
//! ask the reasoner for one order, execute it, and classify how the fight is
//! going — all behind trait seams so every path is testable with fakes.

use image::RgbaImage;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::AgentConfig;
use crate::llm::ReasonerClient;
use crate::perception::extract::parse_yes_no;
use crate::perception::{profiler, strengths};
use crate::stats::{PlayerCharacterStat, TurnState};
use crate::vlm::VlmClient;

use super::controller::Controller;
use super::ports::Screen;
use super::prompt::{build_turn_prompt, strip_nothink};
use super::wire::{action_from_reply, ActionParseError, CombatAction};

pub const UI_READY_PROMPT: &str = r#"Are there menu items "Attack" and "Defend" on screen? Give only binary answer - yes or no."#;
pub const VICTORY_PROMPT: &str =
    r#"Is there word "RESULTS" on screen? Give only binary answer - yes or no."#;
pub const DEFEAT_PROMPT: &str =
    r#"Is there menu with item "Retry" on screen? Give only binary answer - yes or no."#;
pub const TURN_ORDER_VISIBLE_PROMPT: &str = "Is character's turn order at the top of the screen \
is present? Ignore character portraits on the left. Give only binary answer - yes or no.";
pub const POOLS_VISIBLE_PROMPT: &str = "Are character's HP,EP,CP values on screen? Ignore \
character portraits on top. Give only binary answer - yes or no.";

/// What the end-of-turn screen check concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatStatus {
    /// The results screen is up: the fight was won.
    Victory,
    /// The retry menu is up: the party was wiped.
    Defeat,
    /// Combat UI still visible; another turn is coming.
    PlayerPhase,
    /// Neither resolution nor combat UI: back in the field.
    OutOfCombat,
}

/// How a single player turn went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// An order was decoded and executed.
    Acted(CombatAction),
    /// Reasoner disabled; stats were extracted, nothing was done.
    Observed,
    /// No usable order, or the order could not be executed; the turn was
    /// forfeited.
    Skipped,
}

/// How a whole combat ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatOutcome {
    Victory,
    Defeat,
    /// The turn budget ran out before the fight resolved.
    TurnLimit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub role: &'static str,
    pub content: String,
}

/// All mutable agent state: the party roster, the current turn snapshot, and
/// the per-turn reasoner transcript.
#[derive(Debug)]
pub struct CombatAgent {
    pub system_prompt: String,
    pub party: Vec<PlayerCharacterStat>,
    pub turn_state: TurnState,
    /// This turn's reasoner exchange; purged when the turn ends.
    pub turn_transcript: Vec<TranscriptEntry>,
    /// True once the character screen has been read this out-of-combat stretch.
    pub party_profiled: bool,
    pub turns_taken: u32,
}

impl CombatAgent {
    pub fn new(system_prompt: impl Into<String>, party_size: usize) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            party: (0..party_size).map(PlayerCharacterStat::new).collect(),
            turn_state: TurnState::default(),
            turn_transcript: Vec::new(),
            party_profiled: false,
            turns_taken: 0,
        }
    }

    /// Drops the turn's reasoner exchange so nothing leaks into the next turn.
    pub fn forget_turn(&mut self) {
        self.turn_transcript.clear();
    }
}

/// Polls screenshots until the action menu is up (it is the player's move).
pub async fn wait_for_player_turn(
    screen: &dyn Screen,
    vlm: &dyn VlmClient,
    cfg: &AgentConfig,
) -> anyhow::Result<()> {
    for poll in 0..cfg.limits.max_turn_wait_polls {
        let frame = screen.capture()?;
        let reply = vlm
            .ask(UI_READY_PROMPT, &frame, cfg.vision.probe_seed)
            .await?;
        if parse_yes_no(&reply) {
            debug!(poll, "player turn detected");
            return Ok(());
        }
        sleep(cfg.timing.poll_interval()).await;
    }
    anyhow::bail!(
        "player turn did not arrive within {} polls",
        cfg.limits.max_turn_wait_polls
    )
}

/// Classifies the post-turn screen: win, loss, still fighting, or back in
/// the field.
pub async fn classify_combat_status(
    frame: &RgbaImage,
    vlm: &dyn VlmClient,
    cfg: &AgentConfig,
) -> anyhow::Result<CombatStatus> {
    let seed = cfg.vision.probe_seed;

    let reply = vlm.ask(VICTORY_PROMPT, frame, seed).await?;
    if parse_yes_no(&reply) {
        return Ok(CombatStatus::Victory);
    }

    let reply = vlm.ask(DEFEAT_PROMPT, frame, seed).await?;
    if parse_yes_no(&reply) {
        return Ok(CombatStatus::Defeat);
    }

    let reply = vlm.ask(TURN_ORDER_VISIBLE_PROMPT, frame, seed).await?;
    let turn_order_visible = parse_yes_no(&reply);
    let reply = vlm.ask(POOLS_VISIBLE_PROMPT, frame, seed).await?;
    let pools_visible = parse_yes_no(&reply);

    if turn_order_visible || pools_visible {
        Ok(CombatStatus::PlayerPhase)
    } else {
        Ok(CombatStatus::OutOfCombat)
    }
}

/// Runs one player turn end to end: wait, perceive, decide, act, forget.
pub async fn run_turn(
    agent: &mut CombatAgent,
    controller: &mut Controller,
    screen: &dyn Screen,
    vlm: &dyn VlmClient,
    reasoner: &dyn ReasonerClient,
    cfg: &AgentConfig,
) -> anyhow::Result<TurnOutcome> {
    wait_for_player_turn(screen, vlm, cfg).await?;

    agent.turn_state =
        profiler::update_combat_stats(&mut agent.party, controller, screen, vlm, cfg).await?;

    if !cfg.reasoner.enabled {
        warn!("reasoner disabled; observing only");
        agent.forget_turn();
        return Ok(TurnOutcome::Observed);
    }

    let user = build_turn_prompt(&agent.turn_state, cfg.reasoner.nothink);
    info!(context = %agent.turn_state.to_prompt(), "turn context");

    agent.turn_transcript.push(TranscriptEntry {
        role: "system",
        content: agent.system_prompt.clone(),
    });
    agent.turn_transcript.push(TranscriptEntry {
        role: "user",
        content: user.clone(),
    });

    let reply = reasoner.decide(&agent.system_prompt, &user).await?;
    agent.turn_transcript.push(TranscriptEntry {
        role: "assistant",
        content: reply.content.clone(),
    });

    let mut decoded = action_from_reply(&reply);

    // A no-think prompt sometimes yields chatter without an order; one retry
    // with reasoning enabled usually recovers it.
    if matches!(decoded, Err(ActionParseError::NoToolCall)) && cfg.reasoner.nothink {
        debug!("no tool call in reply; retrying with reasoning enabled");
        let retry_user = strip_nothink(&user);
        let retry = reasoner.decide(&agent.system_prompt, &retry_user).await?;
        agent.turn_transcript.push(TranscriptEntry {
            role: "assistant",
            content: retry.content.clone(),
        });
        decoded = action_from_reply(&retry);
    }

    let action = match decoded {
        Ok(action) => action,
        Err(err) => {
            warn!(%err, "turn forfeited: no usable order");
            agent.forget_turn();
            return Ok(TurnOutcome::Skipped);
        }
    };

    if let Some(target) = action.target() {
        if agent.turn_state.enemy(target).is_none() {
            warn!(target, "turn forfeited: order names an unknown enemy");
            agent.forget_turn();
            return Ok(TurnOutcome::Skipped);
        }
    }

    info!(action = action.name(), target = ?action.target(), "order issued");
    if let Err(err) = controller
        .execute(&action, &agent.turn_state, screen, &cfg.regions)
        .await
    {
        warn!(%err, "turn forfeited: order could not be executed");
        agent.forget_turn();
        return Ok(TurnOutcome::Skipped);
    }

    agent.forget_turn();
    Ok(TurnOutcome::Acted(action))
}

/// Runs a whole combat: party profiling, the turn loop, and resolution.
pub async fn run_combat(
    agent: &mut CombatAgent,
    controller: &mut Controller,
    screen: &dyn Screen,
    vlm: &dyn VlmClient,
    reasoner: &dyn ReasonerClient,
    cfg: &AgentConfig,
) -> anyhow::Result<CombatOutcome> {
    loop {
        if !agent.party_profiled {
            strengths::profile_party(&mut agent.party, controller, screen, vlm, cfg).await?;
            agent.party_profiled = true;
        }

        if agent.turns_taken >= cfg.limits.max_turns {
            warn!(limit = cfg.limits.max_turns, "turn limit reached");
            return Ok(CombatOutcome::TurnLimit);
        }

        let outcome = run_turn(agent, controller, screen, vlm, reasoner, cfg).await?;
        agent.turns_taken += 1;
        debug!(?outcome, turns = agent.turns_taken, "turn finished");

        let frame = screen.capture()?;
        match classify_combat_status(&frame, vlm, cfg).await? {
            CombatStatus::Victory => {
                info!("combat won");
                controller.reset();
                return Ok(CombatOutcome::Victory);
            }
            CombatStatus::Defeat => {
                info!("combat lost");
                controller.reset();
                return Ok(CombatOutcome::Defeat);
            }
            CombatStatus::PlayerPhase => continue,
            CombatStatus::OutOfCombat => {
                info!("combat no longer detected; party strengths will be refreshed");
                agent.party_profiled = false;
                controller.reset();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::{Arc, Mutex};

    use image::{Rgba, RgbaImage};
    use serde_json::json;

    use super::*;
    use crate::agent::ports::{GameKey, InputPort};
    use crate::config::{RegionSection, TimingSection};
    use crate::llm::{RawToolCall, ReasonerReply};
    use crate::perception::geometry::Region;

    #[derive(Default)]
    struct FakeInput {
        keys: Mutex<Vec<GameKey>>,
    }

    impl FakeInput {
        fn keys(&self) -> Vec<GameKey> {
            self.keys.lock().unwrap().clone()
        }
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
    }

    impl FakeVlm {
        fn push(&self, reply: impl Into<String>) {
            self.replies.lock().unwrap().push_back(reply.into());
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
                self.replies
                    .lock()
                    .unwrap()
                    .pop_front()
                    .ok_or_else(|| anyhow::anyhow!("no vlm reply queued for: {question}"))
            })
        }
    }

    #[derive(Default)]
    struct FakeReasoner {
        replies: Mutex<VecDeque<ReasonerReply>>,
        prompts: Mutex<Vec<String>>,
    }

    impl FakeReasoner {
        fn push_tool_call(&self, name: &str, arguments: serde_json::Value) {
            self.replies.lock().unwrap().push_back(ReasonerReply {
                content: String::new(),
                tool_calls: vec![RawToolCall {
                    name: name.to_string(),
                    arguments,
                }],
            });
        }

        fn push_chatter(&self, content: &str) {
            self.replies.lock().unwrap().push_back(ReasonerReply {
                content: content.to_string(),
                tool_calls: vec![],
            });
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    impl ReasonerClient for FakeReasoner {
        fn decide<'a>(
            &'a self,
            _system: &'a str,
            user: &'a str,
        ) -> Pin<Box<dyn Future<Output = anyhow::Result<ReasonerReply>> + Send + 'a>> {
            Box::pin(async move {
                self.prompts.lock().unwrap().push(user.to_string());
                self.replies
                    .lock()
                    .unwrap()
                    .pop_front()
                    .ok_or_else(|| anyhow::anyhow!("no reasoner reply queued"))
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
        cfg.limits.max_turn_wait_polls = 3;
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
            party_pools: vec![Region::new(40, 50, 20, 10)],
            ..RegionSection::default()
        };
        cfg
    }

    /// One enemy marker at (10, 20), its selection probe lit.
    fn combat_frame() -> RgbaImage {
        let mut frame = RgbaImage::from_pixel(120, 100, Rgba([0, 0, 0, 255]));
        frame.put_pixel(10, 20, Rgba([219, 0, 72, 255]));
        for dy in 0..4 {
            for dx in 0..4 {
                frame.put_pixel(14 + dx, 16 + dy, Rgba([255, 255, 255, 255]));
            }
        }
        frame
    }

    /// Queues every VLM reply one full turn consumes: the turn-ready probe,
    /// one enemy profile, and the single party slot.
    fn queue_full_turn(vlm: &FakeVlm) {
        vlm.push("Yes."); // action menu visible
        vlm.push("[850, 1200]");
        vlm.push("[40]");
        vlm.push("[310, 220, 55]");
        vlm.push("[150, 180]");
        vlm.push("100\n120\n100\n80");
        vlm.push("100\n100\n110");
        vlm.push("1,0,0,1,1");
        vlm.push("0,0,0,0,1");
        vlm.push("No."); // no red X
        vlm.push("HP,324\nEP,118\nCP,45");
        vlm.push("Yes."); // slot 0 active
    }

    fn harness_pieces(cfg: &AgentConfig) -> (Arc<FakeInput>, Controller, FakeScreen) {
        let input = Arc::new(FakeInput::default());
        let controller = Controller::new(input.clone(), cfg.timing.clone());
        let screen = FakeScreen {
            frame: combat_frame(),
        };
        (input, controller, screen)
    }

    #[tokio::test]
    async fn full_turn_waits_perceives_decides_and_acts() -> anyhow::Result<()> {
        let cfg = test_cfg();
        let (input, mut controller, screen) = harness_pieces(&cfg);
        let vlm = FakeVlm::default();
        let reasoner = FakeReasoner::default();
        let mut agent = CombatAgent::new("system", 1);

        queue_full_turn(&vlm);
        reasoner.push_tool_call("attack", json!({"enemy_id": 0}));

        let outcome =
            run_turn(&mut agent, &mut controller, &screen, &vlm, &reasoner, &cfg).await?;

        match outcome {
            TurnOutcome::Acted(action) => {
                assert_eq!(action.name(), "attack");
                assert_eq!(action.target(), Some(0));
            }
            other => panic!("expected an executed order, got {other:?}"),
        }

        // The basic attack confirmed with Enter.
        assert!(input.keys().contains(&GameKey::Confirm));
        // Transcript purged at end of turn.
        assert!(agent.turn_transcript.is_empty());
        // The snapshot survives for inspection.
        assert_eq!(agent.turn_state.enemies.len(), 1);
        assert!(agent.turn_state.party[0].is_active);

        // The prompt carried the rendered context and the no-think suffix.
        let prompts = reasoner.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("# ENEMIES STATS"));
        assert!(prompts[0].ends_with("/no_think"));
        Ok(())
    }

    #[tokio::test]
    async fn chatter_reply_retries_once_with_reasoning_enabled() -> anyhow::Result<()> {
        let cfg = test_cfg();
        let (_input, mut controller, screen) = harness_pieces(&cfg);
        let vlm = FakeVlm::default();
        let reasoner = FakeReasoner::default();
        let mut agent = CombatAgent::new("system", 1);

        queue_full_turn(&vlm);
        reasoner.push_chatter("Let me think about this...");
        reasoner.push_tool_call("defend", json!({}));

        let outcome =
            run_turn(&mut agent, &mut controller, &screen, &vlm, &reasoner, &cfg).await?;

        assert_eq!(outcome, TurnOutcome::Acted(CombatAction::Defend));
        let prompts = reasoner.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].ends_with("/no_think"));
        assert!(!prompts[1].ends_with("/no_think"));
        Ok(())
    }

    #[tokio::test]
    async fn two_undecided_replies_forfeit_the_turn() -> anyhow::Result<()> {
        let cfg = test_cfg();
        let (input, mut controller, screen) = harness_pieces(&cfg);
        let vlm = FakeVlm::default();
        let reasoner = FakeReasoner::default();
        let mut agent = CombatAgent::new("system", 1);

        queue_full_turn(&vlm);
        reasoner.push_chatter("hmm");
        reasoner.push_chatter("still thinking");

        let outcome =
            run_turn(&mut agent, &mut controller, &screen, &vlm, &reasoner, &cfg).await?;

        assert_eq!(outcome, TurnOutcome::Skipped);
        assert!(agent.turn_transcript.is_empty());
        // Only perception keys (Tab + target cycling) were pressed; no Confirm.
        assert!(!input.keys().contains(&GameKey::Confirm));
        Ok(())
    }

    #[tokio::test]
    async fn order_against_unknown_enemy_is_forfeited() -> anyhow::Result<()> {
        let cfg = test_cfg();
        let (input, mut controller, screen) = harness_pieces(&cfg);
        let vlm = FakeVlm::default();
        let reasoner = FakeReasoner::default();
        let mut agent = CombatAgent::new("system", 1);

        queue_full_turn(&vlm);
        reasoner.push_tool_call("use_craft", json!({"enemy_id": 7}));

        let outcome =
            run_turn(&mut agent, &mut controller, &screen, &vlm, &reasoner, &cfg).await?;

        assert_eq!(outcome, TurnOutcome::Skipped);
        assert!(!input.keys().contains(&GameKey::Confirm));
        Ok(())
    }

    #[tokio::test]
    async fn observer_mode_never_polls_the_reasoner() -> anyhow::Result<()> {
        let mut cfg = test_cfg();
        cfg.reasoner.enabled = false;
        let (_input, mut controller, screen) = harness_pieces(&cfg);
        let vlm = FakeVlm::default();
        let reasoner = FakeReasoner::default();
        let mut agent = CombatAgent::new("system", 1);

        queue_full_turn(&vlm);

        let outcome =
            run_turn(&mut agent, &mut controller, &screen, &vlm, &reasoner, &cfg).await?;

        assert_eq!(outcome, TurnOutcome::Observed);
        assert!(reasoner.prompts().is_empty());
        assert_eq!(agent.turn_state.enemies.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn waiting_gives_up_after_the_poll_budget() {
        let cfg = test_cfg();
        let (_input, _controller, screen) = harness_pieces(&cfg);
        let vlm = FakeVlm::default();
        for _ in 0..cfg.limits.max_turn_wait_polls {
            vlm.push("No.");
        }

        let err = wait_for_player_turn(&screen, &vlm, &cfg).await.unwrap_err();
        assert!(format!("{err}").contains("did not arrive"));
    }

    #[tokio::test]
    async fn victory_screen_ends_combat_and_resets_latches() -> anyhow::Result<()> {
        let cfg = test_cfg();
        let (_input, mut controller, screen) = harness_pieces(&cfg);
        let vlm = FakeVlm::default();
        let reasoner = FakeReasoner::default();
        let mut agent = CombatAgent::new("system", 1);
        agent.party_profiled = true;

        queue_full_turn(&vlm);
        vlm.push("Yes."); // RESULTS on screen
        reasoner.push_tool_call("attack", json!({"enemy_id": 0}));

        let outcome =
            run_combat(&mut agent, &mut controller, &screen, &vlm, &reasoner, &cfg).await?;

        assert_eq!(outcome, CombatOutcome::Victory);
        assert_eq!(agent.turns_taken, 1);
        assert!(!controller.enemy_specifics, "latches reset after resolution");
        Ok(())
    }

    #[tokio::test]
    async fn defeat_screen_ends_combat() -> anyhow::Result<()> {
        let cfg = test_cfg();
        let (_input, mut controller, screen) = harness_pieces(&cfg);
        let vlm = FakeVlm::default();
        let reasoner = FakeReasoner::default();
        let mut agent = CombatAgent::new("system", 1);
        agent.party_profiled = true;

        queue_full_turn(&vlm);
        vlm.push("No."); // not victory
        vlm.push("Yes."); // retry menu
        reasoner.push_tool_call("defend", json!({}));

        let outcome =
            run_combat(&mut agent, &mut controller, &screen, &vlm, &reasoner, &cfg).await?;
        assert_eq!(outcome, CombatOutcome::Defeat);
        Ok(())
    }

    #[tokio::test]
    async fn turn_budget_bounds_the_combat() -> anyhow::Result<()> {
        let mut cfg = test_cfg();
        cfg.limits.max_turns = 2;
        let (_input, mut controller, screen) = harness_pieces(&cfg);
        let vlm = FakeVlm::default();
        let reasoner = FakeReasoner::default();
        let mut agent = CombatAgent::new("system", 1);
        agent.party_profiled = true;

        for _ in 0..2 {
            queue_full_turn(&vlm);
            // Not won, not lost, turn order still visible.
            vlm.push("No.");
            vlm.push("No.");
            vlm.push("Yes.");
            vlm.push("No.");
            reasoner.push_tool_call("defend", json!({}));
        }

        let outcome =
            run_combat(&mut agent, &mut controller, &screen, &vlm, &reasoner, &cfg).await?;
        assert_eq!(outcome, CombatOutcome::TurnLimit);
        assert_eq!(agent.turns_taken, 2);
        Ok(())
    }

    #[tokio::test]
    async fn leaving_combat_schedules_a_strength_refresh() -> anyhow::Result<()> {
        let mut cfg = test_cfg();
        cfg.limits.max_turns = 1;
        let (_input, mut controller, screen) = harness_pieces(&cfg);
        let vlm = FakeVlm::default();
        let reasoner = FakeReasoner::default();
        let mut agent = CombatAgent::new("system", 1);
        agent.party_profiled = true;

        queue_full_turn(&vlm);
        // Not won, not lost, no combat UI at all: out of combat.
        vlm.push("No.");
        vlm.push("No.");
        vlm.push("No.");
        vlm.push("No.");
        reasoner.push_tool_call("defend", json!({}));
        // Back at the loop top the party gets re-profiled from the character
        // screen before the turn budget check fires.
        vlm.push("Strength: 412\nDefense: 305");
        vlm.push("Strength: 280\nDefense: 260");
        vlm.push("57");

        let outcome =
            run_combat(&mut agent, &mut controller, &screen, &vlm, &reasoner, &cfg).await?;

        assert_eq!(outcome, CombatOutcome::TurnLimit);
        assert!(agent.party_profiled, "strengths were refreshed");
        assert_eq!(agent.party[0].attack, 412);
        Ok(())
    }

    #[tokio::test]
    async fn classify_prefers_victory_over_everything() -> anyhow::Result<()> {
        let cfg = test_cfg();
        let vlm = FakeVlm::default();
        vlm.push("Yes.");

        let status = classify_combat_status(&combat_frame(), &vlm, &cfg).await?;
        assert_eq!(status, CombatStatus::Victory);
        Ok(())
    }

    #[tokio::test]
    async fn classify_sees_player_phase_when_pools_are_visible() -> anyhow::Result<()> {
        let cfg = test_cfg();
        let vlm = FakeVlm::default();
        vlm.push("No.");
        vlm.push("No.");
        vlm.push("No."); // turn order hidden
        vlm.push("Yes."); // pools visible

        let status = classify_combat_status(&combat_frame(), &vlm, &cfg).await?;
        assert_eq!(status, CombatStatus::PlayerPhase);
        Ok(())
    }
}
