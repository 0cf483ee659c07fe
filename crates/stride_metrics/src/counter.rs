//! Named counters for tracking input and recorder events

use std::collections::BTreeMap;

/// Monotonic event counters keyed by static names.
///
/// Ordered storage keeps reports stable between runs.
pub struct Counter {
    counters: BTreeMap<&'static str, u64>,
}

impl Counter {
    pub fn new() -> Self {
        Self {
            counters: BTreeMap::new(),
        }
    }

    pub fn increment(&mut self, name: &'static str, value: u64) {
        *self.counters.entry(name).or_insert(0) += value;
    }

    pub fn get(&self, name: &str) -> u64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    pub fn reset_all(&mut self) {
        self.counters.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, u64)> + '_ {
        self.counters.iter().map(|(name, value)| (*name, *value))
    }
}

impl Default for Counter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_per_name() {
        let mut counter = Counter::new();
        counter.increment("input_started", 1);
        counter.increment("input_started", 2);
        counter.increment("input_ended", 1);

        assert_eq!(counter.get("input_started"), 3);
        assert_eq!(counter.get("input_ended"), 1);
        assert_eq!(counter.get("missing"), 0);

        let names: Vec<_> = counter.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["input_ended", "input_started"]);

        counter.reset_all();
        assert_eq!(counter.get("input_started"), 0);
    }
}
