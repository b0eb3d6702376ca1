//! Drives the game UI: latched display toggles, target cycling against the
//! turn-order bar, and the per-action key sequences.

use std::sync::Arc;

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::{RegionSection, TimingSection};
use crate::perception::scan::{brightness_mask, find_selected_portrait};
use crate::stats::TurnState;

use super::ports::{GameKey, InputPort, Screen};
use super::wire::CombatAction;

/// UI state the game remembers between inputs, mirrored here so the agent
/// never toggles a panel twice or scrolls the action menu the wrong way.
pub struct Controller {
    input: Arc<dyn InputPort>,
    timings: TimingSection,
    /// Attack/arts/crafts detail overlay (middle click), latched.
    pub display_details: bool,
    /// Enemy "View Specifics" panel (Tab), latched.
    pub enemy_specifics: bool,
    /// True while the Attack entry of the action menu is highlighted.
    pub attack_option_selected: bool,
    /// Current target-cycling direction: true = F (rightward), false = R.
    pub target_direction_f: bool,
}

impl Controller {
    pub fn new(input: Arc<dyn InputPort>, timings: TimingSection) -> Self {
        Self {
            input,
            timings,
            display_details: false,
            enemy_specifics: false,
            attack_option_selected: true,
            target_direction_f: true,
        }
    }

    /// Restores all latches after combat resolution.
    pub fn reset(&mut self) {
        self.display_details = false;
        self.enemy_specifics = false;
        self.attack_option_selected = true;
        self.target_direction_f = true;
    }

    /// Opens the enemy data panel if it is not already up.
    pub async fn toggle_enemy_specifics(&mut self) -> anyhow::Result<()> {
        if self.enemy_specifics {
            return Ok(());
        }
        self.input.press(GameKey::ViewSpecifics)?;
        self.enemy_specifics = true;
        sleep(self.timings.action_delay()).await;
        Ok(())
    }

    /// Opens the attack/arts/crafts detail overlay if it is not already up.
    pub async fn toggle_display_details(&mut self) -> anyhow::Result<()> {
        if self.display_details {
            return Ok(());
        }
        self.input.middle_click()?;
        self.display_details = true;
        sleep(self.timings.action_delay()).await;
        Ok(())
    }

    /// Cycles the selected target one step in the given direction.
    pub async fn cycle_target(&self, rightward: bool) -> anyhow::Result<()> {
        self.input.press(if rightward {
            GameKey::TargetRight
        } else {
            GameKey::TargetLeft
        })?;
        sleep(self.timings.action_delay()).await;
        Ok(())
    }

    /// Cycles until the requested enemy's portrait is selected.
    ///
    /// Single-enemy fights short-circuit to success. Otherwise the budget is
    /// two presses per known enemy; running out means the portrait never lit
    /// up and the action should be abandoned.
    pub async fn select_enemy(
        &self,
        enemy_id: usize,
        enemy_coords: &[(u32, u32)],
        rightward: bool,
        screen: &dyn Screen,
        regions: &RegionSection,
    ) -> anyhow::Result<bool> {
        if enemy_coords.len() <= 1 {
            return Ok(true);
        }

        for _ in 0..(2 * enemy_coords.len()) {
            let frame = screen.capture()?;
            let mask = brightness_mask(
                &regions.turn_order.crop(&frame),
                regions.brightness_threshold,
            );
            let selected = find_selected_portrait(
                &mask,
                enemy_coords,
                regions.target_probe_delta,
                regions.target_probe_size,
                regions.target_significance,
            );
            debug!(?selected, enemy_id, "target selection probe");

            match selected {
                Some(sel) if sel.index == enemy_id => return Ok(true),
                _ => self.cycle_target(rightward).await?,
            }
        }

        Ok(false)
    }

    /// Basic attack on the requested enemy.
    pub async fn attack(
        &mut self,
        enemy_id: usize,
        turn: &TurnState,
        screen: &dyn Screen,
        regions: &RegionSection,
    ) -> anyhow::Result<()> {
        let rightward = self.direction_for(enemy_id, turn);
        if !self
            .select_enemy(enemy_id, &turn.enemy_coords, rightward, screen, regions)
            .await?
        {
            anyhow::bail!("could not select enemy {enemy_id} for basic attack");
        }

        if !self.attack_option_selected {
            self.input.scroll(1)?;
            self.attack_option_selected = true;
            sleep(self.timings.action_delay()).await;
        }
        self.input.press(GameKey::Confirm)?;
        Ok(())
    }

    /// Guard this turn. Scrolls down to Defend when Attack is highlighted.
    pub async fn defend(&mut self) -> anyhow::Result<()> {
        if self.attack_option_selected {
            self.input.scroll(-1)?;
            self.attack_option_selected = false;
            sleep(self.timings.action_delay()).await;
        }
        self.input.press(GameKey::Confirm)?;
        Ok(())
    }

    /// Casts an art at the requested enemy. Target-selection misses are
    /// tolerated: the art menu still opens on whatever is selected.
    pub async fn use_art(
        &mut self,
        enemy_id: usize,
        turn: &TurnState,
        screen: &dyn Screen,
        regions: &RegionSection,
    ) -> anyhow::Result<()> {
        self.select_for_menu_action(enemy_id, turn, screen, regions)
            .await?;
        self.input.press(GameKey::Arts)?;
        sleep(self.timings.menu_delay()).await;
        self.input.press(GameKey::Confirm)?;
        Ok(())
    }

    /// Uses a craft on the requested enemy.
    pub async fn use_craft(
        &mut self,
        enemy_id: usize,
        turn: &TurnState,
        screen: &dyn Screen,
        regions: &RegionSection,
    ) -> anyhow::Result<()> {
        self.select_for_menu_action(enemy_id, turn, screen, regions)
            .await?;
        self.input.press(GameKey::Crafts)?;
        sleep(self.timings.menu_delay()).await;
        self.input.press(GameKey::Confirm)?;
        Ok(())
    }

    /// Uses the first item from the items menu.
    pub async fn use_item(&mut self) -> anyhow::Result<()> {
        self.input.press(GameKey::Items)?;
        sleep(self.timings.action_delay()).await;
        self.input.press(GameKey::Confirm)?;
        Ok(())
    }

    /// Executes the turn's decoded action.
    pub async fn execute(
        &mut self,
        action: &CombatAction,
        turn: &TurnState,
        screen: &dyn Screen,
        regions: &RegionSection,
    ) -> anyhow::Result<()> {
        debug!(action = action.name(), target = ?action.target(), "executing order");
        match action {
            CombatAction::Attack(args) => self.attack(args.enemy_id, turn, screen, regions).await,
            CombatAction::UseArt(args) => self.use_art(args.enemy_id, turn, screen, regions).await,
            CombatAction::UseCraft(args) => {
                self.use_craft(args.enemy_id, turn, screen, regions).await
            }
            CombatAction::UseItem => self.use_item().await,
            CombatAction::Defend => self.defend().await,
        }
    }

    /// Opens the character screen from the field (system menu, then roster).
    pub async fn open_character_screen(&self) -> anyhow::Result<()> {
        self.input.press(GameKey::Back)?;
        sleep(self.timings.menu_delay()).await;
        self.input.press(GameKey::Roster)?;
        sleep(self.timings.menu_delay()).await;
        Ok(())
    }

    /// Backs out of the character screen to the field.
    pub async fn close_character_screen(&self) -> anyhow::Result<()> {
        self.input.press(GameKey::Back)?;
        sleep(self.timings.menu_delay()).await;
        self.input.press(GameKey::Back)?;
        sleep(self.timings.menu_delay()).await;
        Ok(())
    }

    /// Advances to the next roster entry on the character screen.
    pub async fn next_roster_entry(&self) -> anyhow::Result<()> {
        self.input.press(GameKey::MenuDown)?;
        sleep(self.timings.menu_delay()).await;
        Ok(())
    }

    async fn select_for_menu_action(
        &self,
        enemy_id: usize,
        turn: &TurnState,
        screen: &dyn Screen,
        regions: &RegionSection,
    ) -> anyhow::Result<()> {
        let rightward = self.direction_for(enemy_id, turn);
        let found = self
            .select_enemy(enemy_id, &turn.enemy_coords, rightward, screen, regions)
            .await?;
        if !found {
            warn!(enemy_id, "target not reselected; acting on current selection");
        }
        Ok(())
    }

    fn direction_for(&self, enemy_id: usize, turn: &TurnState) -> bool {
        turn.enemy(enemy_id)
            .map(|e| e.targeted_with_f)
            .unwrap_or(self.target_direction_f)
    }
}
