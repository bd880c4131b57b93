// ============================================================
// Layer 5 — One-Cycle Learning Rate Schedule
// ============================================================
// Leslie Smith's 1cycle policy, two-phase variant:
//
//   lr
//   max ┤      ╭──╮
//       │    ╭─╯   ╲
//       │  ╭─╯      ╲___
//  init ┤──╯            ╲______
//   min ┤                      ╲── (end of training)
//       └──────────────────────────── step
//        0   30%                100%
//
//   initial = max_lr / div_factor
//   min     = initial / final_div_factor
//
// Both phases use cosine annealing. Defaults match the widely used
// PyTorch OneCycleLR parameters (pct_start 0.3, div 25, final div 1e4),
// and the optimiser is stepped once per batch, so
// total_steps = epochs * batches_per_epoch.
//
// Reference: Smith & Topin (2017), Super-Convergence

use std::f64::consts::PI;

pub const DEFAULT_PCT_START:        f64 = 0.3;
pub const DEFAULT_DIV_FACTOR:       f64 = 25.0;
pub const DEFAULT_FINAL_DIV_FACTOR: f64 = 1e4;

#[derive(Debug, Clone)]
pub struct OneCycleLr {
    max_lr:       f64,
    initial_lr:   f64,
    min_lr:       f64,
    total_steps:  usize,
    /// Step at which the warm-up phase peaks
    warmup_end:   f64,
    current:      usize,
}

impl OneCycleLr {
    pub fn new(max_lr: f64, epochs: usize, steps_per_epoch: usize) -> Self {
        Self::with_factors(
            max_lr,
            epochs * steps_per_epoch,
            DEFAULT_PCT_START,
            DEFAULT_DIV_FACTOR,
            DEFAULT_FINAL_DIV_FACTOR,
        )
    }

    pub fn with_factors(
        max_lr:           f64,
        total_steps:      usize,
        pct_start:        f64,
        div_factor:       f64,
        final_div_factor: f64,
    ) -> Self {
        let initial_lr = max_lr / div_factor;
        Self {
            max_lr,
            initial_lr,
            min_lr: initial_lr / final_div_factor,
            total_steps,
            warmup_end: pct_start * total_steps as f64 - 1.0,
            current: 0,
        }
    }

    pub fn total_steps(&self) -> usize { self.total_steps }

    /// Learning rate at `step` (0-based). Steps past the end hold the final rate.
    pub fn lr_at(&self, step: usize) -> f64 {
        if self.total_steps == 0 {
            return self.initial_lr;
        }
        let step     = step.min(self.total_steps - 1) as f64;
        let last_end = (self.total_steps - 1) as f64;

        if step <= self.warmup_end {
            let pct = fraction(step, 0.0, self.warmup_end);
            cosine_anneal(self.initial_lr, self.max_lr, pct)
        } else {
            // annealing starts where warm-up ended, even when that is before step 0
            let pct = fraction(step, self.warmup_end, last_end);
            cosine_anneal(self.max_lr, self.min_lr, pct)
        }
    }

    /// Rate for the current iteration; advances the schedule by one step.
    pub fn step(&mut self) -> f64 {
        let lr = self.lr_at(self.current);
        self.current += 1;
        lr
    }

    /// Rate the next call to `step` will return.
    pub fn current_lr(&self) -> f64 {
        self.lr_at(self.current)
    }
}

fn fraction(step: f64, start: f64, end: f64) -> f64 {
    if end <= start {
        1.0
    } else {
        ((step - start) / (end - start)).clamp(0.0, 1.0)
    }
}

/// Cosine interpolation from `start` (pct = 0) to `end` (pct = 1).
fn cosine_anneal(start: f64, end: f64, pct: f64) -> f64 {
    end + (start - end) / 2.0 * ((PI * pct).cos() + 1.0)
}
