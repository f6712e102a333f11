//! Score, difficulty and gravity rules.

/// Base points for clearing 1, 2, 3 or 4 lines at once.
pub const LINE_SCORES: [u32; 4] = [40, 100, 300, 1200];

pub const MAX_SCORE: u32 = 999_999;

pub const MAX_DIFFICULTY: u8 = 20;

/// Frames per row for each difficulty level.
pub const GRAVITY_FRAMES: [u32; MAX_DIFFICULTY as usize + 1] = [
    44, 41, 37, 34, 31, 27, 23, 18, 14, 9, 8, 7, 7, 6, 5, 5, 4, 4, 3, 3, 2,
];

/// Frames per row while soft drop is held.
pub const SOFT_DROP_GRAVITY: u32 = 2;

/// Adds `delta`, saturating at [`MAX_SCORE`].
pub fn increment_score(score: u32, delta: u32) -> u32 {
    score.saturating_add(delta).min(MAX_SCORE)
}

/// Points for clearing `lines` rows at once at `difficulty`. Zero when nothing cleared.
pub fn line_clear_score(lines: usize, difficulty: u8) -> u32 {
    match lines {
        0 => 0,
        n => LINE_SCORES[n.min(LINE_SCORES.len()) - 1] * (u32::from(difficulty) + 1),
    }
}

/// Difficulty earned from cleared lines, never below the starting difficulty.
pub fn difficulty_for_lines(initial: u8, lines: u32) -> u8 {
    let earned = (lines / 10).min(u32::from(MAX_DIFFICULTY)) as u8;
    earned.max(initial).min(MAX_DIFFICULTY)
}

pub fn gravity_frames_for(difficulty: u8) -> u32 {
    GRAVITY_FRAMES[usize::from(difficulty.min(MAX_DIFFICULTY))]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_saturates() {
        assert_eq!(increment_score(999_990, 20), MAX_SCORE);
        assert_eq!(increment_score(MAX_SCORE, u32::MAX), MAX_SCORE);
        assert_eq!(increment_score(10, 5), 15);
    }

    #[test]
    fn test_line_clear_score_scales_with_difficulty() {
        assert_eq!(line_clear_score(1, 0), 40);
        assert_eq!(line_clear_score(2, 1), 200);
        assert_eq!(line_clear_score(3, 2), 900);
        assert_eq!(line_clear_score(4, 20), 1200 * 21);
        assert_eq!(line_clear_score(0, 5), 0);
    }

    #[test]
    fn test_difficulty_for_lines() {
        assert_eq!(difficulty_for_lines(0, 95), 9);
        assert_eq!(difficulty_for_lines(5, 25), 5);
        assert_eq!(difficulty_for_lines(0, 10), 1);
        assert_eq!(difficulty_for_lines(0, 9_999), MAX_DIFFICULTY);
        assert_eq!(difficulty_for_lines(25, 0), MAX_DIFFICULTY);
    }

    #[test]
    fn test_gravity_table_is_monotonic() {
        assert!(GRAVITY_FRAMES.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(gravity_frames_for(0), 44);
        assert_eq!(gravity_frames_for(MAX_DIFFICULTY), 2);
        assert_eq!(gravity_frames_for(200), 2);
    }
}
