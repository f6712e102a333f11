//! Layout and drawing: title, options form, playfield, sidebar boxes, game over.

use crate::assets::{Assets, Tile};
use crate::form::{Field, Form};
use crate::matrix::{COLS, Matrix, ROWS};
use crate::piece::{Orientation, Piece};
use crate::round::Phase;
use crate::scene::{BoardScene, OptionsScene, Scene};
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Widget};
use std::ops::RangeInclusive;
use std::time::Duration;
use tachyonfx::{Duration as TfxDuration, EffectRenderer, Interpolation, fx};

/// Each matrix cell is two terminal columns wide.
const CELL_WIDTH: u16 = 2;
const BOARD_WIDTH: u16 = COLS as u16 * CELL_WIDTH + 2;
const BOARD_HEIGHT: u16 = ROWS as u16 + 2;
const SIDEBAR_WIDTH: u16 = 16;
/// Sidebar fade once the game-over curtain is down.
const DIM_FADE_MS: u32 = 600;

/// What the player sees in one matrix cell. Follows the matrix through dirty
/// cells, except where flashing or the top-out cover has painted over it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CanvasCell {
    #[default]
    Blank,
    Block(Piece),
    Cover,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixCanvas {
    cells: [[CanvasCell; COLS]; ROWS],
}

impl Default for MatrixCanvas {
    fn default() -> Self {
        Self {
            cells: [[CanvasCell::Blank; COLS]; ROWS],
        }
    }
}

impl MatrixCanvas {
    pub fn cell(&self, row: usize, col: usize) -> CanvasCell {
        self.cells[row][col]
    }

    /// Copies dirty matrix cells (every cell when `full`). Returns whether any were copied.
    pub fn sync(&mut self, matrix: &mut Matrix, full: bool) -> bool {
        let mut copied = false;
        matrix.drain_dirty(full, |point, cell| {
            self.cells[point.row][point.col] = if cell.filled {
                CanvasCell::Block(cell.piece)
            } else {
                CanvasCell::Blank
            };
            copied = true;
        });
        copied
    }

    pub fn blank_rows(&mut self, rows: &[usize]) {
        for &row in rows {
            if let Some(cells) = self.cells.get_mut(row) {
                *cells = [CanvasCell::Blank; COLS];
            }
        }
    }

    pub fn cover_rows(&mut self, rows: RangeInclusive<usize>) {
        for row in rows {
            if let Some(cells) = self.cells.get_mut(row) {
                *cells = [CanvasCell::Cover; COLS];
            }
        }
    }
}

/// Draws the active scene. `delta` is the time since the previous draw, for effects.
pub fn draw(frame: &mut Frame, scene: &mut Scene, theme: &Theme, assets: &Assets, delta: Duration) {
    let area = frame.area();
    Block::default()
        .style(Style::default().bg(theme.bg))
        .render(area, frame.buffer_mut());
    match scene {
        Scene::Title(_) => draw_title(frame, theme, area),
        Scene::Options(options) => draw_options(frame, options, theme, area),
        Scene::Board(board) => draw_board(frame, board, theme, assets, area, delta),
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

fn panel<'a>(theme: &Theme, title: &'a str) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(title, Style::default().fg(theme.title)))
}

fn draw_title(frame: &mut Frame, theme: &Theme, area: Rect) {
    let key = Style::default().fg(theme.title);
    let fg = Style::default().fg(theme.main_fg);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "M A T R I X F A L L",
            Style::default().fg(theme.title).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled(" ←→ ", key),
            Span::styled("shift  ", fg),
            Span::styled(" ↓ ", key),
            Span::styled("soft  ", fg),
            Span::styled(" ↑ ", key),
            Span::styled("hard", fg),
        ]),
        Line::from(vec![
            Span::styled(" X ", key),
            Span::styled("rotate right  ", fg),
            Span::styled(" Z ", key),
            Span::styled("rotate left", fg),
        ]),
        Line::from(vec![
            Span::styled(" M ", key),
            Span::styled("music  ", fg),
            Span::styled(" N ", key),
            Span::styled("sfx  ", fg),
            Span::styled(" Q ", key),
            Span::styled("quit", fg),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "Press X",
            Style::default().fg(theme.inactive_fg),
        )),
    ];
    let rect = centered(area, 44, lines.len() as u16 + 2);
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(panel(theme, " Matrixfall "))
        .render(rect, frame.buffer_mut());
}

/// One form field as a line; the focused field blinks between title and plain colours.
fn field_line<A: Copy>(field: &Field<A>, highlighted: bool, theme: &Theme) -> Line<'static> {
    let style = if highlighted {
        Style::default().fg(theme.title).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.main_fg)
    };
    let label = Span::styled(format!("{:<6}", field.label()), style);
    match field {
        Field::Seed {
            value,
            editing,
            caret,
            ..
        } => {
            let mut spans = vec![label];
            for (i, &digit) in value.iter().enumerate() {
                let digit_style = if *editing && i == *caret {
                    style.add_modifier(Modifier::REVERSED)
                } else {
                    style
                };
                spans.push(Span::styled(char::from(digit).to_string(), digit_style));
            }
            Line::from(spans)
        }
        Field::Numeric { value, editing, .. } => {
            let text = if *editing {
                format!("< {value:>2} >")
            } else {
                format!("  {value:>2}  ")
            };
            Line::from(vec![label, Span::styled(text, style)])
        }
        Field::Boolean { value, .. } => {
            let text = if *value { "On " } else { "Off" };
            Line::from(vec![label, Span::styled(text, style)])
        }
        Field::Button { label, .. } => Line::from(Span::styled(format!("[ {label} ]"), style)),
    }
}

fn form_lines<A: Copy>(form: &Form<A>, theme: &Theme) -> Vec<Line<'static>> {
    form.fields()
        .iter()
        .enumerate()
        .map(|(i, field)| field_line(field, form.is_highlighted(i), theme))
        .collect()
}

fn draw_options(frame: &mut Frame, options: &OptionsScene, theme: &Theme, area: Rect) {
    let mut lines = vec![Line::from("")];
    for line in form_lines(options.form(), theme) {
        lines.push(line);
        lines.push(Line::from(""));
    }
    let form = options.form();
    let editing = form
        .fields()
        .get(form.focused())
        .is_some_and(Field::is_editing);
    let hint = if editing {
        "↑↓ change  ←→ digit  X done"
    } else {
        "↑↓ move  X select"
    };
    lines.push(Line::from(Span::styled(
        hint,
        Style::default().fg(theme.inactive_fg),
    )));
    let rect = centered(area, 30, lines.len() as u16 + 2);
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(panel(theme, " Options "))
        .render(rect, frame.buffer_mut());
}

fn draw_tile(frame: &mut Frame, x: u16, y: u16, tile: Tile, theme: &Theme) {
    frame
        .buffer_mut()
        .set_string(x, y, tile.glyph, Style::default().fg(tile.color).bg(theme.bg));
}

fn draw_board(
    frame: &mut Frame,
    board: &mut BoardScene,
    theme: &Theme,
    assets: &Assets,
    area: Rect,
    delta: Duration,
) {
    let outer = centered(area, BOARD_WIDTH + SIDEBAR_WIDTH, BOARD_HEIGHT + 1);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(BOARD_HEIGHT), Constraint::Length(1)])
        .split(outer);
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(BOARD_WIDTH),
            Constraint::Length(SIDEBAR_WIDTH),
        ])
        .split(rows[0]);

    draw_matrix(frame, board, theme, assets, cols[0]);
    draw_sidebar(frame, board, theme, assets, cols[1]);
    draw_status(frame, board, theme, rows[1]);

    if board.round().curtain_done() {
        let sidebar = cols[1];
        let dim = board.dim_effect().get_or_insert_with(|| {
            fx::fade_to(
                theme.inactive_fg,
                theme.bg,
                (DIM_FADE_MS, Interpolation::SineOut),
            )
            .with_area(sidebar)
        });
        let ms = delta.as_millis().min(u128::from(u32::MAX)) as u32;
        frame.render_effect(dim, sidebar, TfxDuration::from_millis(ms));
    }
}

fn draw_matrix(
    frame: &mut Frame,
    board: &BoardScene,
    theme: &Theme,
    assets: &Assets,
    area: Rect,
) {
    let block = panel(theme, "");
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());

    let canvas = board.canvas();
    for row in 0..ROWS {
        for col in 0..COLS {
            let x = inner.x + col as u16 * CELL_WIDTH;
            let y = inner.y + row as u16;
            if x + CELL_WIDTH > inner.x + inner.width || y >= inner.y + inner.height {
                continue;
            }
            let tile = match canvas.cell(row, col) {
                CanvasCell::Blank => None,
                CanvasCell::Block(piece) => assets.tile(piece),
                CanvasCell::Cover => Some(assets.cover()),
            };
            match tile {
                Some(tile) => draw_tile(frame, x, y, tile, theme),
                None => frame.buffer_mut().set_string(x, y, "  ", Style::default().bg(theme.bg)),
            }
        }
    }

    let round = board.round();
    if round.phase() != Phase::GameOver {
        return;
    }
    let covered = ((round.curtain() * ROWS as f32).round() as u16).min(inner.height);
    for y in inner.y..inner.y + covered {
        for x in inner.x..inner.x + inner.width {
            frame.buffer_mut()[(x, y)].set_symbol(" ").set_style(Style::default().bg(Color::Black));
        }
    }
    if !round.curtain_done() {
        return;
    }

    let over = Style::default().fg(theme.title).add_modifier(Modifier::BOLD);
    let mut lines = vec![
        Line::from(Span::styled("Game", over)),
        Line::from(Span::styled("Over", over)),
        Line::from(""),
    ];
    lines.extend(form_lines(board.game_over_form(), theme));
    let text = Rect {
        x: inner.x,
        y: inner.y + inner.height / 3,
        width: inner.width,
        height: (lines.len() as u16).min(inner.height),
    };
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .style(Style::default().bg(Color::Black))
        .render(text, frame.buffer_mut());
}

fn draw_sidebar(
    frame: &mut Frame,
    board: &BoardScene,
    theme: &Theme,
    assets: &Assets,
    area: Rect,
) {
    let boxes = board.boxes();
    let fg = Style::default().fg(theme.main_fg);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // Next
            Constraint::Length(3), // Level
            Constraint::Length(3), // Lines
            Constraint::Length(3), // Score
            Constraint::Length(3), // Seed
        ])
        .split(area);

    let next = panel(theme, " Next ");
    let next_inner = next.inner(chunks[0]);
    next.render(chunks[0], frame.buffer_mut());
    draw_preview(frame, boxes.next, theme, assets, next_inner);

    let values = [
        (" Level ", boxes.level.to_string()),
        (" Lines ", boxes.lines.to_string()),
        (" Score ", boxes.score.to_string()),
        (" Seed ", format!("{:08X}", boxes.seed)),
    ];
    for ((title, value), rect) in values.into_iter().zip(chunks.iter().skip(1)) {
        Paragraph::new(Line::from(Span::styled(value, fg)))
            .alignment(Alignment::Right)
            .block(panel(theme, title))
            .render(*rect, frame.buffer_mut());
    }
}

/// On-deck piece in its spawn orientation.
fn draw_preview(frame: &mut Frame, piece: Piece, theme: &Theme, assets: &Assets, area: Rect) {
    let Some(tile) = assets.tile(piece) else {
        return;
    };
    let (width, _) = piece.bounds();
    let left = area.x + area.width.saturating_sub(u16::from(width) * CELL_WIDTH) / 2;
    for &(dc, dr) in piece.cells(Orientation::SPAWN) {
        let x = left + u16::from(dc) * CELL_WIDTH;
        let y = area.y + u16::from(dr);
        if x + CELL_WIDTH <= area.x + area.width && y < area.y + area.height {
            draw_tile(frame, x, y, tile, theme);
        }
    }
}

fn draw_status(frame: &mut Frame, board: &BoardScene, theme: &Theme, area: Rect) {
    let on_off = |on: bool| if on { "on" } else { "off" };
    let key = Style::default().fg(theme.title);
    let dim = Style::default().fg(theme.inactive_fg);
    let line = Line::from(vec![
        Span::styled("M", key),
        Span::styled(format!(" music {}  ", on_off(board.music())), dim),
        Span::styled("N", key),
        Span::styled(format!(" sfx {}  ", on_off(board.sound())), dim),
        Span::styled("Esc", key),
        Span::styled(" end  ", dim),
        Span::styled("Q", key),
        Span::styled(" quit", dim),
    ]);
    Paragraph::new(line)
        .alignment(Alignment::Center)
        .render(area, frame.buffer_mut());
}
