use tracing::debug;

use crate::game::{ClickOutcome, GameState, InputSource, Phase, TargetId};

/// Scripted input source: clicks the required target once per tick.
///
/// Holds no game logic; every click it issues goes through
/// [`GameState::click_from`] exactly like a human click.
#[derive(Debug, Default, Clone)]
pub struct AutoPlayer {
    session: u64,
    clicks: usize,
}

impl AutoPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_target(game: &GameState) -> Option<TargetId> {
        game.required_id()
    }

    /// Clicks issued during the current game
    pub fn clicks(&self) -> usize {
        self.clicks
    }

    pub fn on_tick(&mut self, game: &mut GameState) -> Option<ClickOutcome> {
        if game.session() != self.session {
            self.session = game.session();
            self.clicks = 0;
        }
        if !game.auto_play() || game.phase() != Phase::Playing {
            return None;
        }

        let id = Self::next_target(game)?;
        let outcome = game.click_from(InputSource::Auto, id);
        if !matches!(outcome, ClickOutcome::Ignored(_)) {
            self.clicks += 1;
        }
        debug!(id, ?outcome, clicks = self.clicks, "autoplay click");
        Some(outcome)
    }
}
