use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use tracing::info;

use crate::autoplay::AutoPlayer;
use crate::clock::{GameClock, TaskKind, TICK_PERIOD};
use crate::game::{
    ClickOutcome, CountdownOutcome, GameSnapshot, GameState, TargetId, DEFAULT_POINT_COUNT,
};

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub point_count: usize,
    pub auto_play: bool,
    pub seed: Option<u64>,
    pub tick_period: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            point_count: DEFAULT_POINT_COUNT,
            auto_play: false,
            seed: None,
            tick_period: TICK_PERIOD,
        }
    }
}

/// The single writer of a game.
///
/// Human input, the clock's tasks and the autoplayer all mutate the game
/// through `&mut Session`, one atomic step at a time. After every step that
/// changed something a fresh [`GameSnapshot`] is sent to subscribers.
#[derive(Debug)]
pub struct Session {
    game: GameState,
    clock: GameClock,
    autoplayer: AutoPlayer,
    subscribers: Vec<Sender<GameSnapshot>>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        let mut game = match config.seed {
            Some(seed) => GameState::with_seed(config.point_count, seed),
            None => GameState::new(config.point_count),
        };
        game.set_auto_play(config.auto_play);

        let mut clock = GameClock::new(config.tick_period);
        clock.sync(&game);

        Self {
            game,
            clock,
            autoplayer: AutoPlayer::new(),
            subscribers: vec![],
        }
    }

    pub fn game(&self) -> &GameState {
        &self.game
    }

    pub fn clock(&self) -> &GameClock {
        &self.clock
    }

    pub fn autoplayer(&self) -> &AutoPlayer {
        &self.autoplayer
    }

    pub fn snapshot(&self) -> GameSnapshot {
        self.game.snapshot()
    }

    /// Receive a snapshot after every state change from now on.
    pub fn subscribe(&mut self) -> Receiver<GameSnapshot> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    fn publish(&mut self) {
        let snapshot = self.game.snapshot();
        self.subscribers
            .retain(|tx| tx.send(snapshot.clone()).is_ok());
    }

    /// Apply a mutation, resync the clock and publish when `changed` says so
    fn commit(&mut self, changed: bool) -> bool {
        self.clock.sync(&self.game);
        if changed {
            self.publish();
        }
        changed
    }

    pub fn configure(&mut self, requested: i64) -> bool {
        let changed = self.game.configure(requested);
        self.commit(changed)
    }

    pub fn start(&mut self) -> bool {
        let changed = self.game.start();
        self.commit(changed)
    }

    pub fn restart(&mut self) {
        self.game.restart();
        self.commit(true);
    }

    pub fn toggle_pause(&mut self) -> bool {
        let changed = self.game.toggle_pause();
        self.commit(changed)
    }

    pub fn toggle_auto_play(&mut self) -> bool {
        let enabled = self.game.toggle_auto_play();
        self.commit(true);
        enabled
    }

    pub fn click(&mut self, id: TargetId) -> ClickOutcome {
        let outcome = self.game.click(id);
        self.commit(!matches!(outcome, ClickOutcome::Ignored(_)));
        outcome
    }

    /// Run every task due within the next `dt` of virtual time.
    ///
    /// Returns true if any step changed the game.
    pub fn advance(&mut self, dt: Duration) -> bool {
        let until = self.clock.now() + dt;
        let mut changed = false;

        while let Some(kind) = self.clock.pop_due(until) {
            let step_changed = match kind {
                TaskKind::Elapsed => self.game.tick_elapsed(),
                TaskKind::Countdown => {
                    let outcome = self.game.tick_countdown();
                    if let CountdownOutcome::Expired { id } = outcome {
                        info!(id, "target expired");
                    }
                    outcome != CountdownOutcome::Inactive
                }
                TaskKind::AutoPlay => self
                    .autoplayer
                    .on_tick(&mut self.game)
                    .is_some_and(|outcome| !matches!(outcome, ClickOutcome::Ignored(_))),
            };
            changed |= self.commit(step_changed);
        }

        self.clock.settle(until);
        changed
    }
}
