//! Streak bounding.
//!
//! A run of consecutive extreme hours is capped to a configured length by
//! keeping the contiguous window that is worst for the consumer: the most
//! expensive window of a HIGH run, the cheapest window of a LOW run. Hours
//! of the run outside the kept window are demoted to NORMAL.
//!
//! Window length is always `min(max, run length)`. Among windows with the
//! same sum the earliest one wins.

use std::ops::Range;

use crate::pricing::{HourPoint, PriceClass};

/// Which way the window sum is optimised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Maximize,
    Minimize,
}

impl Direction {
    /// Direction for a run of the given class; `None` for NORMAL.
    pub fn for_class(class: PriceClass) -> Option<Self> {
        match class {
            PriceClass::High => Some(Direction::Maximize),
            PriceClass::Low => Some(Direction::Minimize),
            PriceClass::Normal => None,
        }
    }

    fn improves(self, candidate: f64, best: f64) -> bool {
        match self {
            Direction::Maximize => candidate > best,
            Direction::Minimize => candidate < best,
        }
    }
}

/// Select the best window of length `min(max_len, values.len())`.
///
/// Each window sum is computed from scratch so equal windows compare
/// exactly equal and the earliest one is kept. Returns an empty range for
/// empty input or a zero `max_len`.
pub fn best_window(values: &[f64], max_len: usize, direction: Direction) -> Range<usize> {
    let len = max_len.min(values.len());
    if len == 0 {
        return 0..0;
    }

    let mut best_start = 0;
    let mut best_sum = values[..len].iter().sum::<f64>();
    for (start, window) in values.windows(len).enumerate().skip(1) {
        let sum = window.iter().sum::<f64>();
        if direction.improves(sum, best_sum) {
            best_start = start;
            best_sum = sum;
        }
    }

    best_start..best_start + len
}

/// Outcome of bounding one run, in run-relative indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundedRun {
    /// Selected window within the run.
    pub window: Range<usize>,
    /// Length of the run the window was selected from.
    pub run_len: usize,
}

impl BoundedRun {
    fn whole(run_len: usize) -> Self {
        Self {
            window: 0..run_len,
            run_len,
        }
    }

    /// Index of the window's first hour.
    pub fn first(&self) -> usize {
        self.window.start
    }

    pub fn is_clipped(&self) -> bool {
        self.window.len() < self.run_len
    }

    /// Run hour that carries the leading re-normalisation marker: the first
    /// hour of the run, present only when hours were clipped before the
    /// window.
    pub fn leading_demotion(&self) -> Option<usize> {
        (self.window.start > 0).then_some(0)
    }

    /// Run hour that carries the trailing re-normalisation marker: the
    /// first hour after the window, present only when hours were clipped
    /// after it.
    pub fn trailing_demotion(&self) -> Option<usize> {
        (self.window.end < self.run_len).then_some(self.window.end)
    }

    /// Every run index outside the window.
    pub fn demoted(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.window.start).chain(self.window.end..self.run_len)
    }
}

/// Bound a run of hours sharing `class` to at most `limit` hours.
///
/// `limit` of `None` leaves the run whole. Hours outside the selected
/// window have their class demoted to NORMAL in place.
pub fn bound_run(run: &mut [HourPoint], class: PriceClass, limit: Option<usize>) -> BoundedRun {
    let (Some(max), Some(direction)) = (limit, Direction::for_class(class)) else {
        return BoundedRun::whole(run.len());
    };
    if run.len() <= max {
        return BoundedRun::whole(run.len());
    }

    let values: Vec<f64> = run.iter().map(|h| h.adjusted_value).collect();
    let bounded = BoundedRun {
        window: best_window(&values, max, direction),
        run_len: run.len(),
    };
    for index in bounded.demoted() {
        run[index].class = PriceClass::Normal;
    }
    bounded
}
