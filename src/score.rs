//! Scoring, level progression and gravity speed

use crate::matrix::TSpin;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lines needed per level
pub const LINES_PER_LEVEL: u32 = 10;

/// Fall delay per level in milliseconds, level 1 first. Levels past the end
/// of the table use the last entry.
const FALL_DELAY_MS: [u64; 15] = [
    1000, 793, 618, 473, 355, 262, 190, 135, 94, 64, 43, 28, 18, 11, 7,
];

/// Which scoring formula to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringRule {
    /// Base points × level
    #[default]
    Classic,
    /// Classic, plus 1.5× for back-to-back difficult clears and a combo bonus
    Guideline,
}

/// Level for a cumulative line count, never below `start_level`
pub fn level_for(lines: u32, start_level: u32) -> u32 {
    start_level.max(1 + lines / LINES_PER_LEVEL)
}

/// Gravity delay for a level
pub fn fall_delay(level: u32) -> Duration {
    let index = (level.max(1) as usize - 1).min(FALL_DELAY_MS.len() - 1);
    Duration::from_millis(FALL_DELAY_MS[index])
}

/// Base points before the level multiplier
pub fn base_points(tspin: TSpin, lines: u32) -> u64 {
    match (tspin, lines) {
        (TSpin::None, 1) => 100,
        (TSpin::None, 2) => 300,
        (TSpin::None, 3) => 500,
        (TSpin::None, 4) => 800,
        (TSpin::None, _) => 0,
        (TSpin::Normal, 0) => 400,
        (TSpin::Normal, 1) => 800,
        (TSpin::Normal, 2) => 1200,
        (TSpin::Normal, _) => 1600,
        (TSpin::Mini, _) => 100,
    }
}

/// Classic score for one lock
pub fn score_for(tspin: TSpin, level: u32, lines: u32) -> u64 {
    base_points(tspin, lines) * level as u64
}

fn action_name(tspin: TSpin, lines: u32) -> &'static str {
    match (tspin, lines) {
        (TSpin::None, 1) => "Single",
        (TSpin::None, 2) => "Double",
        (TSpin::None, 3) => "Triple",
        (TSpin::None, 4) => "Tetris",
        (TSpin::Normal, 0) => "T-Spin",
        (TSpin::Normal, 1) => "T-Spin Single",
        (TSpin::Normal, 2) => "T-Spin Double",
        (TSpin::Normal, 3) => "T-Spin Triple",
        (TSpin::Mini, 0) => "Mini T-Spin",
        (TSpin::Mini, 1) => "Mini T-Spin Single",
        (TSpin::Mini, 2) => "Mini T-Spin Double",
        _ => "",
    }
}

/// What a single lock was worth
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearResult {
    pub points: u64,
    pub lines: u32,
    pub tspin: TSpin,
    /// Text for the on-screen callout
    pub action: String,
    pub back_to_back: bool,
    pub level_up: bool,
}

/// Scoring calculation
#[derive(Debug, Clone)]
pub struct Score {
    /// Current score
    pub points: u64,
    /// Current level
    pub level: u32,
    /// Total lines cleared
    pub lines: u32,
    /// Floor for the level
    pub start_level: u32,
    /// Current combo count (-1 = no combo)
    pub combo: i32,
    /// Whether last clear was a "difficult" clear (tetris or t-spin)
    pub back_to_back: bool,
    pub rule: ScoringRule,
}

impl Default for Score {
    fn default() -> Self {
        Self::new(1, ScoringRule::default())
    }
}

impl Score {
    pub fn new(start_level: u32, rule: ScoringRule) -> Self {
        let start_level = start_level.max(1);
        Self {
            points: 0,
            level: start_level,
            lines: 0,
            start_level,
            combo: -1,
            back_to_back: false,
            rule,
        }
    }

    /// Score a lock that cleared `lines` rows (possibly zero, for a
    /// zero-line T-spin) and advance lines and level.
    pub fn add_clear(&mut self, tspin: TSpin, lines: u32) -> ClearResult {
        // Points use the level the clear happened on
        let mut points = score_for(tspin, self.level, lines);
        let difficult = lines > 0 && (lines == 4 || tspin != TSpin::None);
        let chained = difficult && self.back_to_back;

        if self.rule == ScoringRule::Guideline && chained {
            points = points * 3 / 2;
        }
        if difficult {
            self.back_to_back = true;
        } else if lines > 0 {
            self.back_to_back = false;
        }

        if lines > 0 {
            self.combo += 1;
            if self.rule == ScoringRule::Guideline && self.combo > 0 {
                points += 50 * self.combo as u64 * self.level as u64;
            }
        }

        self.points += points;
        self.lines += lines;
        let previous_level = self.level;
        self.level = level_for(self.lines, self.start_level);

        let mut action = String::from(action_name(tspin, lines));
        if self.combo > 0 && lines > 0 {
            action.push_str(&format!(" Combo x{}", self.combo));
        }
        if chained {
            action = format!("B2B {}", action);
        }

        ClearResult {
            points,
            lines,
            tspin,
            action,
            back_to_back: chained,
            level_up: self.level > previous_level,
        }
    }

    /// Reset combo (called when piece locks without clearing lines)
    pub fn reset_combo(&mut self) {
        self.combo = -1;
    }

    /// Gravity delay for the current level
    pub fn fall_delay(&self) -> Duration {
        fall_delay(self.level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_clear() {
        let mut score = Score::new(1, ScoringRule::Classic);
        let result = score.add_clear(TSpin::None, 1);
        assert_eq!(result.points, 100);
        assert_eq!(score.points, 100);
        assert_eq!(score.lines, 1);
        assert_eq!(result.action, "Single");
    }

    #[test]
    fn test_tetris() {
        let mut score = Score::new(1, ScoringRule::Classic);
        score.add_clear(TSpin::None, 4);
        assert_eq!(score.points, 800);
        assert_eq!(score.lines, 4);
    }

    #[test]
    fn test_base_table() {
        assert_eq!(score_for(TSpin::None, 1, 2), 300);
        assert_eq!(score_for(TSpin::None, 2, 3), 1000);
        assert_eq!(score_for(TSpin::Normal, 1, 0), 400);
        assert_eq!(score_for(TSpin::Normal, 1, 1), 800);
        assert_eq!(score_for(TSpin::Normal, 3, 2), 3600);
        assert_eq!(score_for(TSpin::Normal, 1, 3), 1600);
        assert_eq!(score_for(TSpin::Mini, 1, 1), 100);
        assert_eq!(score_for(TSpin::Mini, 4, 0), 400);
    }

    #[test]
    fn test_classic_ignores_back_to_back() {
        let mut score = Score::new(1, ScoringRule::Classic);
        score.add_clear(TSpin::None, 4);
        let second = score.add_clear(TSpin::None, 4);
        assert_eq!(second.points, 800);
        assert!(second.back_to_back);
        assert_eq!(score.points, 1600);
    }

    #[test]
    fn test_back_to_back() {
        let mut score = Score::new(1, ScoringRule::Guideline);
        // First tetris
        score.add_clear(TSpin::None, 4);
        assert_eq!(score.points, 800);
        // Second tetris (back-to-back = 1.5x, plus combo bonus of 50)
        let second = score.add_clear(TSpin::None, 4);
        assert_eq!(score.points, 800 + 1200 + 50);
        assert_eq!(second.action, "B2B Tetris Combo x1");
    }

    #[test]
    fn test_combo() {
        let mut score = Score::new(1, ScoringRule::Guideline);
        score.add_clear(TSpin::None, 1);
        score.add_clear(TSpin::None, 1);
        assert_eq!(score.points, 100 + 100 + 50);

        score.reset_combo();
        score.add_clear(TSpin::None, 1);
        assert_eq!(score.points, 350);
    }

    #[test]
    fn test_single_breaks_back_to_back() {
        let mut score = Score::new(1, ScoringRule::Guideline);
        score.add_clear(TSpin::None, 4);
        score.add_clear(TSpin::None, 1);
        assert!(!score.back_to_back);
    }

    #[test]
    fn test_zero_line_t_spin_keeps_lines() {
        let mut score = Score::new(1, ScoringRule::Classic);
        let result = score.add_clear(TSpin::Normal, 0);
        assert_eq!(result.points, 400);
        assert_eq!(score.lines, 0);
        assert_eq!(score.combo, -1);
    }

    #[test]
    fn test_mini_action_names() {
        let mut score = Score::new(1, ScoringRule::Classic);
        assert_eq!(score.add_clear(TSpin::Mini, 0).action, "Mini T-Spin");
        score.reset_combo();
        assert_eq!(score.add_clear(TSpin::Mini, 1).action, "Mini T-Spin Single");
        score.reset_combo();
        let double = score.add_clear(TSpin::Mini, 2);
        assert_eq!(double.action, "B2B Mini T-Spin Double");
        assert_eq!(double.points, 100);
    }

    #[test]
    fn test_level_up() {
        let mut score = Score::new(1, ScoringRule::Classic);
        for _ in 0..9 {
            assert!(!score.add_clear(TSpin::None, 1).level_up);
        }
        assert!(score.add_clear(TSpin::None, 1).level_up);
        assert_eq!(score.level, 2);
    }

    #[test]
    fn test_start_level_is_a_floor() {
        assert_eq!(level_for(0, 5), 5);
        assert_eq!(level_for(45, 5), 5);
        assert_eq!(level_for(50, 5), 6);
        assert_eq!(level_for(19, 1), 2);

        let mut score = Score::new(3, ScoringRule::Classic);
        score.add_clear(TSpin::None, 1);
        assert_eq!(score.points, 300);
    }

    #[test]
    fn test_fall_delay_table() {
        assert_eq!(fall_delay(1), Duration::from_millis(1000));
        assert_eq!(fall_delay(2), Duration::from_millis(793));
        assert_eq!(fall_delay(15), Duration::from_millis(7));
        assert_eq!(fall_delay(40), Duration::from_millis(7));
        assert_eq!(fall_delay(0), Duration::from_millis(1000));
        assert!(fall_delay(5) > fall_delay(6));
    }
}
