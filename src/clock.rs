use std::time::Duration;

use tracing::trace;

use crate::game::{GameState, Phase, TargetId};

/// Every periodic process in the game runs once per second
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskState {
    Stopped,
    Armed { due: Duration },
    /// Time left until the next firing, frozen while the game is paused
    Suspended { remaining: Duration },
}

/// A cancellable fixed-rate task on the virtual timeline
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PeriodicTask {
    period: Duration,
    state: TaskState,
}

impl PeriodicTask {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            state: TaskState::Stopped,
        }
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn due(&self) -> Option<Duration> {
        match self.state {
            TaskState::Armed { due } => Some(due),
            _ => None,
        }
    }

    /// (Re-)establish the task with a full period from `now`.
    pub fn arm(&mut self, now: Duration) {
        self.state = TaskState::Armed {
            due: now + self.period,
        };
    }

    pub fn suspend(&mut self, now: Duration) {
        if let TaskState::Armed { due } = self.state {
            self.state = TaskState::Suspended {
                remaining: due.saturating_sub(now),
            };
        }
    }

    pub fn resume(&mut self, now: Duration) {
        if let TaskState::Suspended { remaining } = self.state {
            self.state = TaskState::Armed {
                due: now + remaining,
            };
        }
    }

    pub fn stop(&mut self) {
        self.state = TaskState::Stopped;
    }

    /// Armed if stopped, resumed if suspended, untouched if already running
    fn ensure_running(&mut self, now: Duration) {
        match self.state {
            TaskState::Stopped => self.arm(now),
            TaskState::Suspended { .. } => self.resume(now),
            TaskState::Armed { .. } => {}
        }
    }

    fn reschedule(&mut self) {
        if let TaskState::Armed { due } = self.state {
            self.state = TaskState::Armed {
                due: due + self.period,
            };
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskKind {
    Elapsed,
    Countdown,
    AutoPlay,
}

/// What the clock last saw of the game, used to detect transitions
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Observed {
    session: u64,
    active: Option<TargetId>,
}

/// Drives the elapsed-time, countdown and autoplay tasks from game transitions.
///
/// The clock never mutates the game itself. Callers pull due tasks with
/// [`GameClock::pop_due`], apply them, then call [`GameClock::sync`] so
/// that any phase change cancels or re-arms the tasks before the next one
/// is considered.
#[derive(Clone, Debug)]
pub struct GameClock {
    now: Duration,
    elapsed: PeriodicTask,
    countdown: PeriodicTask,
    autoplay: PeriodicTask,
    observed: Observed,
}

impl Default for GameClock {
    fn default() -> Self {
        Self::new(TICK_PERIOD)
    }
}

impl GameClock {
    pub fn new(period: Duration) -> Self {
        Self {
            now: Duration::ZERO,
            elapsed: PeriodicTask::new(period),
            countdown: PeriodicTask::new(period),
            autoplay: PeriodicTask::new(period),
            observed: Observed::default(),
        }
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn task(&self, kind: TaskKind) -> &PeriodicTask {
        match kind {
            TaskKind::Elapsed => &self.elapsed,
            TaskKind::Countdown => &self.countdown,
            TaskKind::AutoPlay => &self.autoplay,
        }
    }

    pub fn is_running(&self) -> bool {
        [&self.elapsed, &self.countdown, &self.autoplay]
            .iter()
            .any(|t| t.due().is_some())
    }

    /// Reconcile task states with the game after any mutation.
    pub fn sync(&mut self, game: &GameState) {
        let now = self.now;
        let current = Observed {
            session: game.session(),
            active: game.active_target_id(),
        };

        if current.session != self.observed.session {
            trace!(session = current.session, "clock re-established");
            self.elapsed.stop();
            self.countdown.stop();
            self.autoplay.stop();
        } else if current.active != self.observed.active {
            self.countdown.stop();
        }
        self.observed = current;

        match game.phase() {
            Phase::Playing => {
                self.elapsed.ensure_running(now);
                if current.active.is_some() {
                    self.countdown.ensure_running(now);
                } else {
                    self.countdown.stop();
                }
                if game.auto_play() {
                    self.autoplay.ensure_running(now);
                } else {
                    self.autoplay.stop();
                }
            }
            Phase::Paused => {
                self.elapsed.suspend(now);
                self.countdown.suspend(now);
                self.autoplay.suspend(now);
                if !game.auto_play() {
                    self.autoplay.stop();
                }
            }
            Phase::Idle | Phase::Win | Phase::Lose => {
                self.elapsed.stop();
                self.countdown.stop();
                self.autoplay.stop();
            }
        }
    }

    /// Next task due at or before `until`, in chronological order.
    ///
    /// Ties fire in the order elapsed, countdown, autoplay. The returned task
    /// is rescheduled one period later and `now` moves to its due time.
    pub fn pop_due(&mut self, until: Duration) -> Option<TaskKind> {
        let (due, kind) = [TaskKind::Elapsed, TaskKind::Countdown, TaskKind::AutoPlay]
            .into_iter()
            .filter_map(|kind| self.task(kind).due().map(|due| (due, kind)))
            .filter(|(due, _)| *due <= until)
            .min_by_key(|(due, _)| *due)?;

        self.now = self.now.max(due);
        match kind {
            TaskKind::Elapsed => self.elapsed.reschedule(),
            TaskKind::Countdown => self.countdown.reschedule(),
            TaskKind::AutoPlay => self.autoplay.reschedule(),
        }
        Some(kind)
    }

    /// Move the timeline to `until` once nothing else is due.
    pub fn settle(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEC: Duration = Duration::from_secs(1);

    fn drain(clock: &mut GameClock, until: Duration) -> Vec<(Duration, TaskKind)> {
        let mut fired = vec![];
        while let Some(kind) = clock.pop_due(until) {
            fired.push((clock.now(), kind));
        }
        clock.settle(until);
        fired
    }

    #[test]
    fn test_periodic_task_lifecycle() {
        let mut task = PeriodicTask::new(SEC);
        assert_eq!(task.state(), TaskState::Stopped);

        task.arm(Duration::from_millis(200));
        assert_eq!(task.due(), Some(Duration::from_millis(1200)));

        task.suspend(Duration::from_millis(900));
        assert_eq!(
            task.state(),
            TaskState::Suspended {
                remaining: Duration::from_millis(300)
            }
        );

        task.resume(Duration::from_millis(5000));
        assert_eq!(task.due(), Some(Duration::from_millis(5300)));

        task.stop();
        assert_eq!(task.due(), None);
    }

    #[test]
    fn test_resume_and_suspend_are_noops_in_wrong_state() {
        let mut task = PeriodicTask::new(SEC);
        task.resume(SEC);
        assert_eq!(task.state(), TaskState::Stopped);
        task.suspend(SEC);
        assert_eq!(task.state(), TaskState::Stopped);
    }

    #[test]
    fn test_idle_game_runs_nothing() {
        let game = GameState::with_seed(3, 1);
        let mut clock = GameClock::default();
        clock.sync(&game);

        assert!(!clock.is_running());
        assert!(drain(&mut clock, 10 * SEC).is_empty());
        assert_eq!(clock.now(), 10 * SEC);
    }

    #[test]
    fn test_start_arms_elapsed_only() {
        let mut game = GameState::with_seed(3, 1);
        let mut clock = GameClock::default();
        game.start();
        clock.sync(&game);

        assert_eq!(clock.task(TaskKind::Elapsed).due(), Some(SEC));
        assert_eq!(clock.task(TaskKind::Countdown).due(), None);
        assert_eq!(clock.task(TaskKind::AutoPlay).due(), None);

        let fired = drain(&mut clock, 3 * SEC);
        assert_eq!(
            fired,
            vec![
                (SEC, TaskKind::Elapsed),
                (2 * SEC, TaskKind::Elapsed),
                (3 * SEC, TaskKind::Elapsed)
            ]
        );
    }

    #[test]
    fn test_activation_arms_countdown_from_click_instant() {
        let mut game = GameState::with_seed(3, 1);
        let mut clock = GameClock::default();
        game.start();
        clock.sync(&game);
        clock.settle(Duration::from_millis(400));

        game.click(0);
        clock.sync(&game);

        assert_eq!(
            clock.task(TaskKind::Countdown).due(),
            Some(Duration::from_millis(1400))
        );
    }

    #[test]
    fn test_new_activation_rearms_countdown() {
        let mut game = GameState::with_seed(3, 1);
        let mut clock = GameClock::default();
        game.start();
        game.click(0);
        clock.sync(&game);
        clock.settle(Duration::from_millis(700));

        game.click(1);
        clock.sync(&game);

        assert_eq!(
            clock.task(TaskKind::Countdown).due(),
            Some(Duration::from_millis(1700))
        );
    }

    #[test]
    fn test_pause_suspends_and_resume_continues() {
        let mut game = GameState::with_seed(3, 1);
        let mut clock = GameClock::default();
        game.start();
        game.click(0);
        clock.sync(&game);
        clock.settle(Duration::from_millis(600));

        game.toggle_pause();
        clock.sync(&game);
        assert!(!clock.is_running());
        assert!(drain(&mut clock, 20 * SEC).is_empty());

        game.toggle_pause();
        clock.sync(&game);
        assert_eq!(
            clock.task(TaskKind::Elapsed).due(),
            Some(20 * SEC + Duration::from_millis(400))
        );
        assert_eq!(
            clock.task(TaskKind::Countdown).due(),
            Some(20 * SEC + Duration::from_millis(400))
        );
    }

    #[test]
    fn test_terminal_phase_stops_everything() {
        let mut game = GameState::with_seed(3, 1);
        let mut clock = GameClock::default();
        game.set_auto_play(true);
        game.start();
        clock.sync(&game);
        assert!(clock.is_running());

        game.click_from(crate::game::InputSource::Auto, 2);
        clock.sync(&game);
        assert_eq!(game.phase(), Phase::Lose);
        assert!(!clock.is_running());
    }

    #[test]
    fn test_restart_reestablishes_tasks() {
        let mut game = GameState::with_seed(3, 1);
        let mut clock = GameClock::default();
        game.start();
        game.click(0);
        clock.sync(&game);
        clock.settle(Duration::from_millis(2500));

        game.restart();
        clock.sync(&game);

        assert_eq!(
            clock.task(TaskKind::Elapsed).due(),
            Some(Duration::from_millis(3500))
        );
        assert_eq!(clock.task(TaskKind::Countdown).due(), None);
    }

    #[test]
    fn test_autoplay_task_follows_preference() {
        let mut game = GameState::with_seed(3, 1);
        let mut clock = GameClock::default();
        game.start();
        clock.sync(&game);
        clock.settle(Duration::from_millis(300));

        game.toggle_auto_play();
        clock.sync(&game);
        assert_eq!(
            clock.task(TaskKind::AutoPlay).due(),
            Some(Duration::from_millis(1300))
        );

        game.toggle_auto_play();
        clock.sync(&game);
        assert_eq!(clock.task(TaskKind::AutoPlay).due(), None);
    }

    #[test]
    fn test_ties_fire_in_fixed_order() {
        let mut game = GameState::with_seed(3, 1);
        let mut clock = GameClock::default();
        game.set_auto_play(true);
        game.start();
        game.click_from(crate::game::InputSource::Auto, 0);
        clock.sync(&game);

        let fired: Vec<TaskKind> = drain(&mut clock, SEC).into_iter().map(|(_, k)| k).collect();
        assert_eq!(
            fired,
            vec![TaskKind::Elapsed, TaskKind::Countdown, TaskKind::AutoPlay]
        );
    }
}
