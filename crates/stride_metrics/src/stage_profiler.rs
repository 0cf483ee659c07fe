//! Per-stage timing for the fixed tick pipeline

use crate::StageTiming;
use std::collections::BTreeMap;
use std::time::Instant;

pub struct StageProfiler {
    timings: BTreeMap<&'static str, StageTiming>,
}

impl StageProfiler {
    pub fn new() -> Self {
        Self {
            timings: BTreeMap::new(),
        }
    }

    pub fn time_stage<F, R>(&mut self, name: &'static str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();

        let timing = self.timings.entry(name).or_default();
        timing.total += elapsed;
        timing.calls += 1;
        result
    }

    pub fn get_timing(&self, name: &str) -> StageTiming {
        self.timings.get(name).copied().unwrap_or_default()
    }

    pub fn reset(&mut self) {
        self.timings.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, StageTiming)> + '_ {
        self.timings.iter().map(|(name, timing)| (*name, *timing))
    }
}

impl Default for StageProfiler {
    fn default() -> Self {
        Self::new()
    }
}
