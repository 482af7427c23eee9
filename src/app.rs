use std::sync::mpsc::Receiver;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use tracing::debug;

use crate::{
    config::Config,
    game::{ClickOutcome, GameSnapshot, IgnoreReason, TargetId},
    session::Session,
    ui::{board::Board, ScreenLayout},
};

/// Longest number the entry line accepts
const MAX_ENTRY_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    Continue,
    Quit,
}

/// Presentation-side controller: turns keys and mouse clicks into session
/// commands and keeps the latest published snapshot for rendering.
#[derive(Debug)]
pub struct App {
    session: Session,
    updates: Receiver<GameSnapshot>,
    snapshot: GameSnapshot,
    entry: String,
    message: Option<String>,
}

impl App {
    pub fn new(mut session: Session) -> Self {
        let updates = session.subscribe();
        let snapshot = session.snapshot();
        Self {
            session,
            updates,
            snapshot,
            entry: String::new(),
            message: None,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn snapshot(&self) -> &GameSnapshot {
        &self.snapshot
    }

    /// Digits typed so far
    pub fn entry(&self) -> &str {
        &self.entry
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Settings worth remembering for the next run
    pub fn config(&self) -> Config {
        Config {
            point_count: self.snapshot.point_count,
            auto_play: self.snapshot.auto_play,
        }
    }

    /// Pull published snapshots; returns true when a redraw is needed.
    pub fn refresh(&mut self) -> bool {
        let mut changed = false;
        for snapshot in self.updates.try_iter() {
            self.snapshot = snapshot;
            changed = true;
        }
        changed
    }

    /// Feed wall-clock time into the game clock.
    pub fn on_elapsed(&mut self, dt: Duration) -> bool {
        self.session.advance(dt);
        self.refresh()
    }

    pub fn on_key(&mut self, key: KeyEvent) -> AppAction {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return AppAction::Quit;
        }

        match key.code {
            KeyCode::Esc => return AppAction::Quit,
            KeyCode::Char(c) if c.is_ascii_digit() => {
                if self.entry.len() < MAX_ENTRY_LEN {
                    self.entry.push(c);
                }
            }
            KeyCode::Backspace => {
                self.entry.pop();
            }
            KeyCode::Enter => self.submit_entry(),
            KeyCode::Char('s') => {
                self.message = None;
                self.session.start();
            }
            KeyCode::Char('r') => {
                self.message = None;
                self.entry.clear();
                self.session.restart();
            }
            KeyCode::Char('p') | KeyCode::Char(' ') => {
                self.session.toggle_pause();
            }
            KeyCode::Char('a') => {
                let enabled = self.session.toggle_auto_play();
                self.message = enabled.then(|| "manual clicks are off".to_string());
            }
            KeyCode::Char('+') | KeyCode::Char('=') => self.adjust_points(1),
            KeyCode::Char('-') => self.adjust_points(-1),
            _ => {}
        }

        self.refresh();
        AppAction::Continue
    }

    /// Left clicks inside the board hit the label under the cursor.
    pub fn on_mouse(&mut self, mouse: MouseEvent, area: Rect) {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return;
        }
        let board = Board::new(ScreenLayout::new(area).board_inner());
        let hit = board.hit_test(
            mouse.column,
            mouse.row,
            &self.snapshot.targets,
            self.snapshot.active_target_id,
        );
        if let Some(id) = hit {
            self.click(id);
        }
        self.refresh();
    }

    fn adjust_points(&mut self, delta: i64) {
        let requested = self.snapshot.point_count as i64 + delta;
        if !self.session.configure(requested) {
            self.message = Some("points are fixed during a game".to_string());
        }
    }

    fn submit_entry(&mut self) {
        let entry = std::mem::take(&mut self.entry);
        let Ok(number) = entry.parse::<usize>() else {
            return;
        };
        if number == 0 || number > self.snapshot.targets.len() {
            self.message = Some(format!("no target {number}"));
            return;
        }
        self.click(number - 1);
    }

    fn click(&mut self, id: TargetId) {
        let outcome = self.session.click(id);
        debug!(id, ?outcome, "player click");
        self.message = match outcome {
            ClickOutcome::Ignored(IgnoreReason::AutoPlayActive) => {
                Some("Auto Play is ON: manual clicks are off".to_string())
            }
            ClickOutcome::Lost {
                expected: Some(expected),
                ..
            } => Some(format!("{} was next", expected + 1)),
            _ => None,
        };
    }
}
