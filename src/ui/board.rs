use ratatui::layout::Rect;
use unicode_width::UnicodeWidthStr;

use crate::game::{Position, Target, TargetId};

/// Maps percentage positions onto the cells inside the board border
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Board {
    inner: Rect,
}

impl Board {
    pub fn new(inner: Rect) -> Self {
        Self { inner }
    }

    /// Cell a position points at, always inside the board
    pub fn anchor(&self, position: Position) -> (u16, u16) {
        let project = |pct: f64, origin: u16, len: u16| -> u16 {
            let offset = ((pct / 100.0) * len as f64).floor().max(0.0) as u16;
            origin + offset.min(len.saturating_sub(1))
        };
        (
            project(position.x, self.inner.x, self.inner.width),
            project(position.y, self.inner.y, self.inner.height),
        )
    }

    /// 1-based number, plus the countdown while the target is active
    pub fn label(target: &Target, active: bool) -> String {
        if active && !target.clicked {
            format!("{} ({})", target.id + 1, target.countdown)
        } else {
            (target.id + 1).to_string()
        }
    }

    /// Label cells, centered on the anchor and shifted back inside the board
    pub fn label_rect(&self, target: &Target, active: bool) -> Rect {
        let width = (Self::label(target, active).width() as u16).min(self.inner.width);
        let (x, y) = self.anchor(target.position);
        let left = x
            .saturating_sub(width / 2)
            .max(self.inner.x)
            .min(self.inner.right().saturating_sub(width));
        Rect::new(left, y, width, 1)
    }

    /// Ascending ids with the active target last, so it is never covered
    pub fn draw_order(targets: &[Target], active: Option<TargetId>) -> Vec<&Target> {
        let (mut order, on_top): (Vec<&Target>, Vec<&Target>) =
            targets.iter().partition(|t| Some(t.id) != active);
        order.extend(on_top);
        order
    }

    /// Topmost target under a cell, following [`Board::draw_order`]
    pub fn hit_test(
        &self,
        column: u16,
        row: u16,
        targets: &[Target],
        active: Option<TargetId>,
    ) -> Option<TargetId> {
        Self::draw_order(targets, active)
            .into_iter()
            .rev()
            .find(|t| {
                let rect = self.label_rect(t, active == Some(t.id));
                row == rect.y && column >= rect.x && column < rect.right()
            })
            .map(|t| t.id)
    }
}
