//! One round of play: the per-frame phase machine.
//!
//! [`Round::update`] runs exactly once per frame. It never draws or plays
//! audio itself; presentation side effects are queued as [`Cue`]s for the
//! board scene to apply.

use crate::das::{AutoRepeat, RepeatDelays};
use crate::input::{Buttons, InputState};
use crate::matrix::{Matrix, PiecePoints, Position, ROWS};
use crate::piece::{Orientation, Piece};
use crate::rng::Lcg;
use crate::scoring::{
    SOFT_DROP_GRAVITY, difficulty_for_lines, gravity_frames_for, increment_score,
    line_clear_score,
};
use tracing::{debug, info};

/// Frames between spawn and player control.
pub const PRE_DROP_FRAMES: u32 = 2;
/// Value of the pre-increment phase counter on the frame rows are removed.
pub const LINE_CLEAR_FRAMES: u32 = 77;
pub const TOP_OUT_FRAMES: u32 = 45;
/// Frames between top-out cover quarters.
pub const TOP_OUT_STEP: u32 = 15;
/// Frames the game-over curtain takes to fall.
pub const CURTAIN_FRAMES: u32 = 24;

const LINE_FLASH_OFF: u32 = 10;
const LINE_FLASH_ON: u32 = 20;

pub const SPAWN: Position = Position {
    col: 4,
    row: 0,
    orientation: Orientation::SPAWN,
};

/// Settings a round starts from; a replay reuses them unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundConfig {
    pub seed: u32,
    pub initial_difficulty: u8,
    pub music: bool,
    pub sound: bool,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            initial_difficulty: 0,
            music: true,
            sound: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Select,
    PreDrop,
    Dropping,
    Settled,
    LineClear,
    TopOut,
    GameOver,
}

/// Sound effects the round asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sound {
    Rotate,
    Settle,
    LineFlash,
    TopOut,
}

/// Presentation side effects queued during an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    Sample(Sound),
    StopMusic,
    /// Redraw every matrix cell, not just dirty ones.
    FullRedraw,
    /// Blank the completed rows on screen (the matrix keeps them).
    FlashRows,
    /// Cover one quarter of the playfield, 0 = bottom.
    CoverQuarter(u8),
    /// Next/Level/Lines/Score boxes changed.
    Boxes,
}

#[derive(Debug, Clone, Copy, Default)]
struct DropTracking {
    active: bool,
    start_row: i32,
}

#[derive(Debug, Clone)]
pub struct Round {
    config: RoundConfig,
    rng: Lcg,
    matrix: Matrix,
    phase: Phase,
    phase_frames: u32,
    difficulty: u8,
    lines: u32,
    score: u32,
    gravity_frames: u32,
    piece: Piece,
    position: Position,
    on_deck: Piece,
    das: AutoRepeat<Buttons>,
    soft_drop: DropTracking,
    hard_drop: DropTracking,
    completed_rows: Vec<usize>,
    cues: Vec<Cue>,
}

impl Round {
    #[cfg(test)]
    pub fn new(config: RoundConfig) -> Self {
        Self::with_delays(config, RepeatDelays::BOARD)
    }

    pub fn with_delays(config: RoundConfig, delays: RepeatDelays) -> Self {
        info!(
            seed = %format!("{:08X}", config.seed),
            level = config.initial_difficulty,
            "round start"
        );
        let mut round = Self {
            config,
            rng: Lcg::new(config.seed),
            matrix: Matrix::new(),
            phase: Phase::Select,
            phase_frames: 0,
            difficulty: config.initial_difficulty,
            lines: 0,
            score: 0,
            gravity_frames: gravity_frames_for(config.initial_difficulty),
            piece: Piece::Empty,
            position: Position::default(),
            on_deck: Piece::Empty,
            das: AutoRepeat::new(delays),
            soft_drop: DropTracking::default(),
            hard_drop: DropTracking::default(),
            completed_rows: Vec::with_capacity(4),
            cues: Vec::new(),
        };
        // Paint the whole empty board on the first frame.
        round.matrix.clear_all();
        round
    }

    /// Advances one frame. Returns true when the screen changed.
    pub fn update(&mut self, input: &InputState) -> bool {
        let held_shift = if input.held.contains(Buttons::LEFT) {
            Some(Buttons::LEFT)
        } else if input.held.contains(Buttons::RIGHT) {
            Some(Buttons::RIGHT)
        } else {
            None
        };
        self.das.update(held_shift);

        match self.phase {
            Phase::Select => self.update_select(),
            Phase::PreDrop => self.update_pre_drop(),
            Phase::Dropping => self.update_dropping(input),
            Phase::Settled => self.update_settled(),
            Phase::LineClear => self.update_line_clear(),
            Phase::TopOut => self.update_top_out(),
            Phase::GameOver => self.update_game_over(),
        }
    }

    fn update_select(&mut self) -> bool {
        self.piece = if self.on_deck.is_empty() {
            self.rng.next_piece()
        } else {
            self.on_deck
        };
        self.on_deck = self.rng.next_piece();
        self.position = SPAWN;

        let points = PiecePoints::at(self.piece, self.position);
        let placeable = self.matrix.points_available(&points);
        self.matrix.add_points(&points, self.piece, true);

        if placeable {
            self.difficulty = difficulty_for_lines(self.config.initial_difficulty, self.lines);
            self.cues.push(Cue::Boxes);
            self.gravity_frames = gravity_frames_for(self.difficulty);
            self.soft_drop = DropTracking::default();
            self.hard_drop = DropTracking::default();
            self.change_phase(Phase::PreDrop);
        } else {
            info!(
                piece = self.piece.name(),
                score = self.score,
                lines = self.lines,
                "top out"
            );
            self.change_phase(Phase::TopOut);
        }
        true
    }

    fn update_pre_drop(&mut self) -> bool {
        self.phase_frames += 1;
        if self.phase_frames == PRE_DROP_FRAMES {
            self.change_phase(Phase::Dropping);
        }
        false
    }

    fn update_dropping(&mut self, input: &InputState) -> bool {
        let pressed = input.pressed;
        let held_down_only = input.held.directions() == Buttons::DOWN;

        if pressed.directions() == Buttons::DOWN {
            self.gravity_frames = SOFT_DROP_GRAVITY;
            if !self.soft_drop.active {
                self.soft_drop = DropTracking {
                    active: true,
                    start_row: self.position.row,
                };
            }
        }

        self.gravity_frames = self.gravity_frames.saturating_sub(1);
        let gravity = self.gravity_frames == 0;
        if gravity {
            if self.soft_drop.active && held_down_only {
                self.gravity_frames = SOFT_DROP_GRAVITY;
            } else {
                self.gravity_frames = gravity_frames_for(self.difficulty);
                self.soft_drop.active = false;
            }
        }

        let repeat = self.das.pulse().unwrap_or(Buttons::NONE);
        if !gravity && pressed.is_empty() && repeat.is_empty() {
            return false;
        }

        let current = self.position;
        let mut target = current;
        let mut settle = false;

        if pressed.contains(Buttons::UP) {
            target = self.matrix.drop_position(self.piece, current);
            settle = true;
            self.hard_drop = DropTracking {
                active: true,
                start_row: current.row,
            };
        } else {
            let mut attempt = current;
            if (repeat | (pressed & Buttons::RIGHT)) == Buttons::RIGHT {
                attempt.col += 1;
            } else if (repeat | (pressed & Buttons::LEFT)) == Buttons::LEFT {
                attempt.col -= 1;
            }
            if gravity || pressed.contains(Buttons::DOWN) {
                attempt.row += 1;
            }
            if pressed.contains(Buttons::A) {
                attempt.orientation = attempt.orientation.rotate_right();
            }
            if pressed.contains(Buttons::B) {
                attempt.orientation = attempt.orientation.rotate_left();
            }

            if attempt.row > current.row && self.matrix.can_settle(self.piece, current) {
                settle = true;
            } else {
                let points = PiecePoints::at(self.piece, attempt);
                if points.is_complete() && self.matrix.points_available(&points) {
                    target = attempt;
                } else if gravity {
                    target.row += 1;
                }
            }
        }

        if target.orientation != current.orientation {
            self.cues.push(Cue::Sample(Sound::Rotate));
        }

        let moved = target != current;
        if moved {
            self.matrix
                .remove_points(&PiecePoints::at(self.piece, current));
            self.matrix
                .add_points(&PiecePoints::at(self.piece, target), self.piece, true);
            self.position = target;
        }

        if settle {
            self.change_phase(Phase::Settled);
        }
        moved
    }

    fn update_settled(&mut self) -> bool {
        self.cues.push(Cue::Sample(Sound::Settle));
        self.matrix.clear_player_ownership();
        self.completed_rows = self.matrix.completed_rows();

        // Both bonuses apply when a hard drop follows a soft drop.
        if self.soft_drop.active {
            let rows = (self.position.row - self.soft_drop.start_row).max(0) as u32;
            self.score = increment_score(self.score, rows);
        }
        if self.hard_drop.active {
            let rows = (self.position.row - self.hard_drop.start_row).max(0) as u32;
            self.score = increment_score(self.score, rows * 2);
        }

        if self.completed_rows.is_empty() {
            self.change_phase(Phase::Select);
        } else {
            debug!(rows = ?self.completed_rows, "line clear");
            self.change_phase(Phase::LineClear);
        }
        false
    }

    fn update_line_clear(&mut self) -> bool {
        let frame = self.phase_frames;
        self.phase_frames += 1;
        if frame == LINE_CLEAR_FRAMES {
            self.matrix.remove_rows(&self.completed_rows);
            self.cues.push(Cue::FullRedraw);
            let cleared = self.completed_rows.len();
            self.score = increment_score(self.score, line_clear_score(cleared, self.difficulty));
            self.lines += cleared as u32;
            info!(
                cleared,
                lines = self.lines,
                score = self.score,
                "rows removed"
            );
            self.cues.push(Cue::Boxes);
            self.change_phase(Phase::Select);
        } else if self.phase_frames % LINE_FLASH_ON == 0 {
            self.cues.push(Cue::FullRedraw);
        } else if self.phase_frames % LINE_FLASH_OFF == 0 {
            self.cues.push(Cue::FlashRows);
            self.cues.push(Cue::Sample(Sound::LineFlash));
        }
        true
    }

    fn update_top_out(&mut self) -> bool {
        if self.phase_frames == 0 {
            self.cues.push(Cue::StopMusic);
        }
        if self.phase_frames > TOP_OUT_FRAMES {
            self.change_phase(Phase::GameOver);
            return false;
        }
        let mut updated = false;
        if self.phase_frames % TOP_OUT_STEP == 0 {
            let quarter = (self.phase_frames / TOP_OUT_STEP) as u8;
            self.cues.push(Cue::CoverQuarter(quarter));
            self.cues.push(Cue::Sample(Sound::TopOut));
            updated = true;
        }
        self.phase_frames += 1;
        updated
    }

    fn update_game_over(&mut self) -> bool {
        if self.phase_frames <= CURTAIN_FRAMES {
            self.phase_frames += 1;
        }
        true
    }

    fn change_phase(&mut self, phase: Phase) {
        debug!(from = ?self.phase, to = ?phase, "phase");
        self.phase = phase;
        self.phase_frames = 0;
    }

    /// Drains the cues queued since the last call.
    pub fn take_cues(&mut self) -> Vec<Cue> {
        std::mem::take(&mut self.cues)
    }

    /// Fraction of the playfield the game-over curtain covers, eased with a sine.
    pub fn curtain(&self) -> f32 {
        if self.phase != Phase::GameOver {
            return 0.0;
        }
        let pct = (self.phase_frames.min(CURTAIN_FRAMES) as f32) / CURTAIN_FRAMES as f32;
        (pct * std::f32::consts::FRAC_PI_2).sin()
    }

    /// The curtain has fully fallen and the game-over prompt may show.
    pub fn curtain_done(&self) -> bool {
        self.phase == Phase::GameOver && self.phase_frames > CURTAIN_FRAMES
    }

    pub fn config(&self) -> RoundConfig {
        self.config
    }

    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    pub fn matrix_mut(&mut self) -> &mut Matrix {
        &mut self.matrix
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn difficulty(&self) -> u8 {
        self.difficulty
    }

    pub fn lines(&self) -> u32 {
        self.lines
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    #[cfg(test)]
    pub fn piece(&self) -> Piece {
        self.piece
    }

    #[cfg(test)]
    pub fn position(&self) -> Position {
        self.position
    }

    pub fn on_deck(&self) -> Piece {
        self.on_deck
    }

    pub fn completed_rows(&self) -> &[usize] {
        &self.completed_rows
    }

    /// Row index range `(top, bottom)` covered by a top-out quarter.
    pub fn cover_rows(quarter: u8) -> (usize, usize) {
        let band = ROWS / 4;
        let bottom = (ROWS - 1).saturating_sub(usize::from(quarter) * band);
        (bottom + 1 - band.min(bottom + 1), bottom)
    }

    #[cfg(test)]
    fn set_on_deck(&mut self, piece: Piece) {
        self.on_deck = piece;
    }

    #[cfg(test)]
    fn set_score(&mut self, score: u32) {
        self.score = score;
    }
}
