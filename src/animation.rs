//! Staged row removal and row refill.
//!
//! Both jobs are time-sliced: the phase machine polls them with elapsed
//! time and they apply their next stage to the matrix whenever a step has
//! passed. The matrix must not be mutated by anything else while a job is
//! outstanding.

use crate::matrix::{CLEAR_ORDER, Matrix, RowGap};
use crate::timer::Timer;
use std::task::Poll;
use std::time::Duration;

/// Clears filled rows one column pair at a time, centre outward
#[derive(Debug, Clone)]
pub struct RowClearJob {
    rows: Vec<i32>,
    stage: usize,
    step: Duration,
    wait: Timer,
}

impl RowClearJob {
    pub fn new(rows: Vec<i32>, step: Duration) -> Self {
        let mut wait = Timer::default();
        wait.arm(step);
        Self {
            rows,
            stage: 0,
            step,
            wait,
        }
    }

    /// Advance by `elapsed`. Resolves with the unused time once every
    /// stage has been applied.
    pub fn poll(&mut self, elapsed: Duration, matrix: &mut Matrix) -> Poll<Duration> {
        let mut budget = elapsed;
        while self.stage < CLEAR_ORDER.len() {
            let Some(rest) = self.wait.advance(budget) else {
                return Poll::Pending;
            };
            matrix.clear_row_stage(&self.rows, self.stage);
            self.stage += 1;
            budget = rest;
            if self.stage < CLEAR_ORDER.len() {
                self.wait.arm(self.step);
            }
        }
        Poll::Ready(budget)
    }

    /// Restart the wait for the current stage
    pub fn restart(&mut self) {
        self.wait.rearm();
    }
}

/// Drops floating row bands down to close the gaps under them
#[derive(Debug, Clone)]
pub struct RowFillJob {
    gaps: Vec<RowGap>,
    wait: Timer,
}

impl RowFillJob {
    pub fn new(gaps: Vec<RowGap>, step: Duration) -> Self {
        let mut wait = Timer::default();
        wait.arm(step);
        Self { gaps, wait }
    }

    pub fn poll(&mut self, elapsed: Duration, matrix: &mut Matrix) -> Poll<Duration> {
        match self.wait.advance(elapsed) {
            Some(rest) => {
                matrix.fill_row_gaps(&self.gaps);
                Poll::Ready(rest)
            }
            None => Poll::Pending,
        }
    }

    pub fn restart(&mut self) {
        self.wait.rearm();
    }
}
