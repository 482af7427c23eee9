pub mod board;

use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::{
    app::App,
    game::{GameSnapshot, Phase},
};

use self::board::Board;

const HORIZONTAL_MARGIN: u16 = 2;

const NORMAL_COLOR: Color = Color::Blue;
const ACTIVE_COLOR: Color = Color::Green;
const CLICKED_COLOR: Color = Color::DarkGray;

/// Screen regions, shared by rendering and mouse hit-testing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScreenLayout {
    pub title: Rect,
    pub controls: Rect,
    pub status: Rect,
    pub board: Rect,
    pub legend: Rect,
    pub help: Rect,
}

impl ScreenLayout {
    pub fn new(area: Rect) -> Self {
        let outer = Rect {
            x: area.x + HORIZONTAL_MARGIN.min(area.width / 2),
            width: area.width.saturating_sub(HORIZONTAL_MARGIN * 2),
            ..area
        };
        let rows = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(outer);

        Self {
            title: rows[0],
            controls: rows[1],
            status: rows[2],
            board: square_board(rows[3]),
            legend: rows[4],
            help: rows[5],
        }
    }

    /// Playable cells inside the board border
    pub fn board_inner(&self) -> Rect {
        board_block(Phase::Idle).inner(self.board)
    }
}

/// Terminal cells are about twice as tall as wide, so a square board is 2:1 in cells
fn square_board(area: Rect) -> Rect {
    let width = area.width.min(area.height.saturating_mul(2));
    Rect {
        x: area.x + (area.width - width) / 2,
        width,
        ..area
    }
}

fn board_block(phase: Phase) -> Block<'static> {
    let border = match phase {
        Phase::Paused => Style::default().add_modifier(Modifier::DIM),
        _ => Style::default(),
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(" Board ")
}

fn title_style(phase: Phase) -> Style {
    let color = match phase {
        Phase::Win => Color::Green,
        Phase::Lose => Color::Red,
        _ => Color::White,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "ON"
    } else {
        "OFF"
    }
}

fn render_controls(snapshot: &GameSnapshot, area: Rect, buf: &mut Buffer) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let points_style = if snapshot.phase.accepts_configuration() {
        bold
    } else {
        bold.add_modifier(Modifier::DIM)
    };
    let auto_style = if snapshot.auto_play {
        Style::default().fg(ACTIVE_COLOR).add_modifier(Modifier::BOLD)
    } else {
        bold
    };

    let mut spans = vec![
        Span::raw("Points: "),
        Span::styled(snapshot.point_count.to_string(), points_style),
        Span::raw("   Time: "),
        Span::styled(format!("{}s", snapshot.elapsed_secs), bold),
        Span::raw("   Auto Play: "),
        Span::styled(on_off(snapshot.auto_play), auto_style),
    ];
    if snapshot.phase == Phase::Paused {
        spans.push(Span::styled(
            "   PAUSED",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ));
    }

    Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .render(area, buf);
}

fn render_status(app: &App, area: Rect, buf: &mut Buffer) {
    let snapshot = app.snapshot();
    let dim = Style::default().add_modifier(Modifier::DIM);

    let mut spans = vec![];
    if !snapshot.targets.is_empty() {
        spans.push(Span::raw(format!("Remaining: {}", snapshot.remaining())));
    }
    if !app.entry().is_empty() {
        spans.push(Span::styled(format!("   > {}_", app.entry()), Style::default().fg(Color::Cyan)));
    }
    if let Some(message) = app.message() {
        spans.push(Span::styled(format!("   {message}"), dim));
    }

    Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .render(area, buf);
}

fn render_board(snapshot: &GameSnapshot, area: Rect, buf: &mut Buffer) {
    let block = board_block(snapshot.phase);
    let inner = block.inner(area);
    block.render(area, buf);
    if inner.is_empty() {
        return;
    }

    if snapshot.targets.is_empty() {
        let hint_row = Rect {
            y: inner.y + inner.height / 2,
            height: inner.height.min(1),
            ..inner
        };
        Paragraph::new(Span::styled(
            "Game will be here",
            Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
        ))
        .alignment(Alignment::Center)
        .render(hint_row, buf);
        return;
    }

    let board = Board::new(inner);
    for target in Board::draw_order(&snapshot.targets, snapshot.active_target_id) {
        let active = snapshot.active_target_id == Some(target.id) && !target.clicked;
        let color = if target.clicked {
            CLICKED_COLOR
        } else if active {
            ACTIVE_COLOR
        } else {
            NORMAL_COLOR
        };
        let mut style = Style::default().fg(color).add_modifier(Modifier::BOLD);
        if snapshot.phase == Phase::Paused {
            style = style.add_modifier(Modifier::DIM);
        }

        let rect = board.label_rect(target, active);
        if rect.width > 0 && rect.height > 0 {
            buf.set_string(rect.x, rect.y, Board::label(target, active), style);
        }
    }
}

fn render_legend(area: Rect, buf: &mut Buffer) {
    let legend = [
        (NORMAL_COLOR, "normal"),
        (ACTIVE_COLOR, "active (counting)"),
        (CLICKED_COLOR, "clicked"),
    ];
    let spans = legend
        .iter()
        .map(|(color, name)| {
            vec![
                Span::styled("● ", Style::default().fg(*color)),
                Span::styled(*name, Style::default().add_modifier(Modifier::ITALIC)),
                Span::raw("   "),
            ]
        })
        .concat();

    Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .render(area, buf);
}

fn help_text(phase: Phase) -> String {
    let mut keys = vec![];
    if phase == Phase::Idle {
        keys.push("(s)tart");
    } else {
        keys.push("(r)estart");
    }
    if matches!(phase, Phase::Playing | Phase::Paused) {
        keys.push(if phase == Phase::Paused { "(p) resume" } else { "(p)ause" });
    }
    keys.push("(a)uto");
    if phase.accepts_configuration() {
        keys.push("(+/-) points");
    }
    keys.push("type number + enter");
    keys.push("(esc)ape");
    keys.iter().join(" / ")
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let snapshot = self.snapshot();
        let layout = ScreenLayout::new(area);

        Paragraph::new(Span::styled(snapshot.phase.title(), title_style(snapshot.phase)))
            .alignment(Alignment::Center)
            .render(layout.title, buf);

        render_controls(snapshot, layout.controls, buf);
        render_status(self, layout.status, buf);
        render_board(snapshot, layout.board, buf);
        render_legend(layout.legend, buf);

        Paragraph::new(Span::styled(
            help_text(snapshot.phase),
            Style::default().add_modifier(Modifier::ITALIC),
        ))
        .alignment(Alignment::Center)
        .render(layout.help, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Session, SessionConfig};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    fn app(points: usize) -> App {
        App::new(Session::new(SessionConfig {
            point_count: points,
            seed: Some(3),
            ..SessionConfig::default()
        }))
    }

    /// Press each key; a digit run ending in `\n` clicks that 1-based target
    fn keys(app: &mut App, input: &str) {
        for c in input.chars() {
            let code = if c == '\n' { KeyCode::Enter } else { KeyCode::Char(c) };
            app.on_key(KeyEvent::new(code, KeyModifiers::NONE));
        }
    }

    fn render(app: &App, area: Rect) -> String {
        let mut buffer = Buffer::empty(area);
        app.render(area, &mut buffer);
        buffer
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>()
    }

    #[test]
    fn test_idle_screen_shows_hint_and_title() {
        let app = app(5);
        let rendered = render(&app, Rect::new(0, 0, 80, 24));

        assert!(rendered.contains("Let's Play!"));
        assert!(rendered.contains("Game will be here"));
        assert!(rendered.contains("Points: 5"));
        assert!(rendered.contains("Auto Play: OFF"));
        assert!(rendered.contains("(s)tart"));
    }

    #[test]
    fn test_playing_screen_draws_every_target() {
        let mut app = app(3);
        keys(&mut app, "s");
        let rendered = render(&app, Rect::new(0, 0, 80, 24));

        assert!(!rendered.contains("Game will be here"));
        assert!(rendered.contains("Remaining: 3"));
        assert!(rendered.contains("Time: 0s"));
    }

    #[test]
    fn test_active_target_shows_countdown() {
        let mut app = app(3);
        keys(&mut app, "s1\n");
        let rendered = render(&app, Rect::new(0, 0, 120, 40));

        assert!(rendered.contains("2 (3)"));
        assert!(rendered.contains("Remaining: 2"));
    }

    #[test]
    fn test_terminal_titles() {
        let mut app = app(2);
        keys(&mut app, "s2\n");
        assert!(render(&app, Rect::new(0, 0, 80, 24)).contains("Game Over!"));

        keys(&mut app, "r1\n2\n");
        assert!(render(&app, Rect::new(0, 0, 80, 24)).contains("All Cleared!"));
    }

    #[test]
    fn test_paused_screen_is_marked() {
        let mut app = app(2);
        keys(&mut app, "sp");
        let rendered = render(&app, Rect::new(0, 0, 80, 24));

        assert!(rendered.contains("PAUSED"));
        assert!(rendered.contains("(p) resume"));
    }

    #[test]
    fn test_tiny_areas_do_not_panic() {
        let mut app = app(20);
        keys(&mut app, "s");

        for (w, h) in [(0, 0), (1, 1), (5, 3), (10, 5), (200, 5), (20, 60)] {
            let area = Rect::new(0, 0, w, h);
            let mut buffer = Buffer::empty(area);
            (&app).render(area, &mut buffer);
            assert_eq!(*buffer.area(), area);
        }
    }

    #[test]
    fn test_board_is_roughly_square() {
        let layout = ScreenLayout::new(Rect::new(0, 0, 200, 30));

        assert_eq!(layout.board.height, 25);
        assert_eq!(layout.board.width, 50);
        assert_eq!(layout.board.x, 2 + (196 - 50) / 2);
    }

    #[test]
    fn test_help_text_follows_phase() {
        assert!(help_text(Phase::Idle).contains("(s)tart"));
        assert!(help_text(Phase::Playing).contains("(p)ause"));
        assert!(!help_text(Phase::Playing).contains("(+/-)"));
        assert!(help_text(Phase::Lose).contains("(r)estart"));
        assert!(help_text(Phase::Win).contains("(+/-) points"));
    }
}
