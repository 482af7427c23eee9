use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub type TargetId = usize;

/// Seconds granted to every newly activated target
pub const COUNTDOWN_SECS: u32 = 3;
pub const DEFAULT_POINT_COUNT: usize = 5;
pub const MIN_POINT_COUNT: usize = 1;
/// More labels than this cannot be told apart on a terminal board
pub const MAX_POINT_COUNT: usize = 999;

/// Targets are kept away from the board edges (percent of board size)
const POSITION_MIN: f64 = 8.0;
const POSITION_MAX: f64 = 92.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Playing,
    Paused,
    Win,
    Lose,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Win | Phase::Lose)
    }

    /// Between games the point count may change
    pub fn accepts_configuration(&self) -> bool {
        matches!(self, Phase::Idle | Phase::Win | Phase::Lose)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Phase::Win => "All Cleared!",
            Phase::Lose => "Game Over!",
            _ => "Let's Play!",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub id: TargetId,
    pub position: Position,
    pub clicked: bool,
    pub countdown: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputSource {
    Human,
    Auto,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IgnoreReason {
    NotPlaying,
    AutoPlayActive,
    AutoPlayDisabled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickOutcome {
    Ignored(IgnoreReason),
    Advanced {
        clicked: TargetId,
        next: TargetId,
    },
    Won {
        clicked: TargetId,
    },
    Lost {
        clicked: TargetId,
        expected: Option<TargetId>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CountdownOutcome {
    Inactive,
    Ticked { id: TargetId, remaining: u32 },
    Expired { id: TargetId },
}

/// Owned copy of everything a renderer needs after an operation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub phase: Phase,
    pub targets: Vec<Target>,
    pub active_target_id: Option<TargetId>,
    pub elapsed_secs: u64,
    pub auto_play: bool,
    pub point_count: usize,
    pub session: u64,
}

impl GameSnapshot {
    pub fn remaining(&self) -> usize {
        self.targets.iter().filter(|t| !t.clicked).count()
    }

    pub fn active_target(&self) -> Option<&Target> {
        self.active_target_id
            .and_then(|id| self.targets.get(id))
            .filter(|t| !t.clicked)
    }
}

/// Sanitize raw point-count text. Fractions are truncated, the result is
/// clamped to `MIN_POINT_COUNT..=MAX_POINT_COUNT` and non-numbers become 1.
pub fn parse_point_count(raw: &str) -> usize {
    let raw = raw.trim();
    match raw.parse::<i64>() {
        Ok(n) => clamp_point_count(n),
        Err(_) => raw
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            // float to int casts saturate
            .map(|v| clamp_point_count(v.trunc() as i64))
            .unwrap_or(MIN_POINT_COUNT),
    }
}

fn clamp_point_count(requested: i64) -> usize {
    usize::try_from(requested)
        .unwrap_or(MIN_POINT_COUNT)
        .clamp(MIN_POINT_COUNT, MAX_POINT_COUNT)
}

/// Authoritative game model. Every transition is a plain method call;
/// time only enters through `tick_elapsed` and `tick_countdown`.
#[derive(Debug)]
pub struct GameState {
    phase: Phase,
    targets: Vec<Target>,
    active_target_id: Option<TargetId>,
    elapsed_secs: u64,
    auto_play: bool,
    point_count: usize,
    session: u64,
    rng: StdRng,
}

impl GameState {
    pub fn new(point_count: usize) -> Self {
        Self::with_rng(point_count, StdRng::from_entropy())
    }

    pub fn with_seed(point_count: usize, seed: u64) -> Self {
        Self::with_rng(point_count, StdRng::seed_from_u64(seed))
    }

    fn with_rng(point_count: usize, rng: StdRng) -> Self {
        Self {
            phase: Phase::Idle,
            targets: vec![],
            active_target_id: None,
            elapsed_secs: 0,
            auto_play: false,
            point_count: point_count.clamp(MIN_POINT_COUNT, MAX_POINT_COUNT),
            session: 0,
            rng,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn target(&self, id: TargetId) -> Option<&Target> {
        self.targets.get(id)
    }

    pub fn active_target_id(&self) -> Option<TargetId> {
        self.active_target_id
    }

    pub fn active_target(&self) -> Option<&Target> {
        self.active_target_id
            .and_then(|id| self.targets.get(id))
            .filter(|t| !t.clicked)
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    pub fn auto_play(&self) -> bool {
        self.auto_play
    }

    pub fn point_count(&self) -> usize {
        self.point_count
    }

    /// Generation counter, bumped by every start/restart
    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn remaining(&self) -> usize {
        self.targets.iter().filter(|t| !t.clicked).count()
    }

    /// The smallest unclicked id, i.e. the only id a click may name
    pub fn required_id(&self) -> Option<TargetId> {
        self.targets
            .iter()
            .filter(|t| !t.clicked)
            .map(|t| t.id)
            .min()
    }

    /// Returns true when the new count was applied.
    pub fn configure(&mut self, requested: i64) -> bool {
        if !self.phase.accepts_configuration() {
            debug!(phase = %self.phase, requested, "configure ignored");
            return false;
        }
        self.point_count = clamp_point_count(requested);
        debug!(point_count = self.point_count, "point count configured");
        true
    }

    pub fn set_auto_play(&mut self, enabled: bool) {
        self.auto_play = enabled;
    }

    /// Start the first game; only meaningful while idle.
    pub fn start(&mut self) -> bool {
        if self.phase != Phase::Idle {
            return false;
        }
        self.begin_session();
        true
    }

    /// Replace the current game with a fresh one, keeping the autoplay preference
    pub fn restart(&mut self) {
        self.begin_session();
    }

    fn begin_session(&mut self) {
        self.targets = self.generate_targets();
        self.phase = Phase::Playing;
        self.elapsed_secs = 0;
        self.active_target_id = None;
        self.session += 1;
        info!(
            session = self.session,
            points = self.point_count,
            auto_play = self.auto_play,
            "game started"
        );
    }

    fn generate_targets(&mut self) -> Vec<Target> {
        (0..self.point_count)
            .map(|id| Target {
                id,
                position: Position {
                    x: self.rng.gen_range(POSITION_MIN..POSITION_MAX),
                    y: self.rng.gen_range(POSITION_MIN..POSITION_MAX),
                },
                clicked: false,
                countdown: COUNTDOWN_SECS,
            })
            .collect()
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.phase = match self.phase {
            Phase::Playing => Phase::Paused,
            Phase::Paused => Phase::Playing,
            _ => return false,
        };
        info!(phase = %self.phase, elapsed = self.elapsed_secs, "pause toggled");
        true
    }

    pub fn toggle_auto_play(&mut self) -> bool {
        self.auto_play = !self.auto_play;
        info!(auto_play = self.auto_play, phase = %self.phase, "autoplay toggled");
        self.auto_play
    }

    /// A human click. Ignored while autoplay owns the input.
    pub fn click(&mut self, id: TargetId) -> ClickOutcome {
        self.click_from(InputSource::Human, id)
    }

    /// Shared validation path for every input source.
    pub fn click_from(&mut self, source: InputSource, id: TargetId) -> ClickOutcome {
        if self.phase != Phase::Playing {
            return ClickOutcome::Ignored(IgnoreReason::NotPlaying);
        }
        match (source, self.auto_play) {
            (InputSource::Human, true) => {
                return ClickOutcome::Ignored(IgnoreReason::AutoPlayActive)
            }
            (InputSource::Auto, false) => {
                return ClickOutcome::Ignored(IgnoreReason::AutoPlayDisabled)
            }
            _ => {}
        }

        let expected = self.required_id();
        if expected != Some(id) {
            self.finish(Phase::Lose);
            info!(clicked = id, ?expected, ?source, "wrong target clicked");
            return ClickOutcome::Lost {
                clicked: id,
                expected,
            };
        }

        if let Some(target) = self.targets.get_mut(id) {
            target.clicked = true;
        }

        match self.required_id() {
            None => {
                self.finish(Phase::Win);
                info!(elapsed = self.elapsed_secs, ?source, "all targets cleared");
                ClickOutcome::Won { clicked: id }
            }
            Some(next) => {
                if let Some(target) = self.targets.get_mut(next) {
                    target.countdown = COUNTDOWN_SECS;
                }
                self.active_target_id = Some(next);
                debug!(clicked = id, next, ?source, "target cleared");
                ClickOutcome::Advanced { clicked: id, next }
            }
        }
    }

    fn finish(&mut self, phase: Phase) {
        self.phase = phase;
        self.active_target_id = None;
    }

    pub fn tick_elapsed(&mut self) -> bool {
        if self.phase != Phase::Playing {
            return false;
        }
        self.elapsed_secs += 1;
        true
    }

    /// Decrement the active target; reaching zero loses the game.
    pub fn tick_countdown(&mut self) -> CountdownOutcome {
        if self.phase != Phase::Playing {
            return CountdownOutcome::Inactive;
        }
        let Some(id) = self.active_target_id else {
            return CountdownOutcome::Inactive;
        };
        let remaining = match self.targets.get_mut(id) {
            // clicked is read fresh here, never from an earlier snapshot
            Some(target) if !target.clicked => {
                target.countdown = target.countdown.saturating_sub(1);
                target.countdown
            }
            _ => return CountdownOutcome::Inactive,
        };

        if remaining == 0 {
            self.finish(Phase::Lose);
            info!(id, elapsed = self.elapsed_secs, "countdown expired");
            CountdownOutcome::Expired { id }
        } else {
            CountdownOutcome::Ticked { id, remaining }
        }
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            phase: self.phase,
            targets: self.targets.clone(),
            active_target_id: self.active_target_id,
            elapsed_secs: self.elapsed_secs,
            auto_play: self.auto_play,
            point_count: self.point_count,
            session: self.session,
        }
    }
}
