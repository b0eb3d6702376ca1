use std::sync::Mutex;

use anyhow::Context;
use enigo::{Axis, Button, Direction, Enigo, Key, Keyboard, Mouse, Settings};

use kuro_bot_core::agent::ports::{GameKey, InputPort};

/// Synthetic keyboard/mouse events into whatever window has focus.
pub struct EnigoInput {
    enigo: Mutex<Enigo>,
}

impl EnigoInput {
    pub fn new() -> anyhow::Result<Self> {
        let enigo = Enigo::new(&Settings::default()).context("initialize input backend")?;
        Ok(Self {
            enigo: Mutex::new(enigo),
        })
    }

    fn key_for(key: GameKey) -> Key {
        match key {
            GameKey::ViewSpecifics => Key::Tab,
            GameKey::Confirm => Key::Return,
            GameKey::Back => Key::Escape,
            GameKey::MenuDown => Key::DownArrow,
            GameKey::TargetRight => Key::Unicode('f'),
            GameKey::TargetLeft => Key::Unicode('r'),
            GameKey::Arts => Key::Unicode('q'),
            GameKey::Crafts => Key::Unicode('e'),
            GameKey::Items => Key::Unicode('x'),
            GameKey::Roster => Key::Unicode('z'),
        }
    }

    fn backend(&self) -> anyhow::Result<std::sync::MutexGuard<'_, Enigo>> {
        self.enigo
            .lock()
            .map_err(|_| anyhow::anyhow!("input backend mutex poisoned"))
    }
}

impl InputPort for EnigoInput {
    fn press(&self, key: GameKey) -> anyhow::Result<()> {
        self.backend()?
            .key(Self::key_for(key), Direction::Click)
            .with_context(|| format!("press {key:?}"))
    }

    fn scroll(&self, amount: i32) -> anyhow::Result<()> {
        // InputPort's convention is positive-up; enigo's vertical axis is
        // positive-down.
        self.backend()?
            .scroll(-amount, Axis::Vertical)
            .context("scroll")
    }

    fn middle_click(&self) -> anyhow::Result<()> {
        self.backend()?
            .button(Button::Middle, Direction::Click)
            .context("middle click")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_keys_map_to_the_expected_bindings() {
        assert_eq!(EnigoInput::key_for(GameKey::ViewSpecifics), Key::Tab);
        assert_eq!(EnigoInput::key_for(GameKey::Confirm), Key::Return);
        assert_eq!(EnigoInput::key_for(GameKey::Back), Key::Escape);
        assert_eq!(EnigoInput::key_for(GameKey::MenuDown), Key::DownArrow);
        assert_eq!(EnigoInput::key_for(GameKey::TargetRight), Key::Unicode('f'));
        assert_eq!(EnigoInput::key_for(GameKey::TargetLeft), Key::Unicode('r'));
        assert_eq!(EnigoInput::key_for(GameKey::Arts), Key::Unicode('q'));
        assert_eq!(EnigoInput::key_for(GameKey::Crafts), Key::Unicode('e'));
        assert_eq!(EnigoInput::key_for(GameKey::Items), Key::Unicode('x'));
        assert_eq!(EnigoInput::key_for(GameKey::Roster), Key::Unicode('z'));
    }
}
