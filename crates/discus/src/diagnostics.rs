//! Run statistics gathered by each worker and merged at the end

// external crates
use log::{debug, info, warn};

// standard library
use std::collections::BTreeMap;

/// Counters for one unit of work
///
/// Every detector task owns its own instance, and the results are combined
/// with [merge()](Diagnostics::merge) once the parallel loop has finished.
/// Nothing is shared between threads while the simulation runs.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Diagnostics {
    /// Calls to the sample intercept
    pub intercept_calls: u64,
    /// Entry point generation, number of attempts against occurrences
    pub entry_attempts: BTreeMap<usize, u64>,
    /// Paths discarded after missing the sample and simulated again
    pub discarded_paths: u64,
}

impl Diagnostics {
    /// Tally an entry point that took `attempts` tries
    pub fn record_entry(&mut self, attempts: usize) {
        *self.entry_attempts.entry(attempts).or_insert(0) += 1;
    }

    /// Combine the counts from another worker
    pub fn merge(mut self, other: Diagnostics) -> Self {
        self.intercept_calls += other.intercept_calls;
        self.discarded_paths += other.discarded_paths;
        for (attempts, count) in other.entry_attempts {
            *self.entry_attempts.entry(attempts).or_insert(0) += count;
        }
        self
    }

    /// Total number of entry points generated
    pub fn entry_tracks(&self) -> u64 {
        self.entry_attempts.values().sum()
    }

    /// Largest number of attempts any entry point needed
    pub fn max_entry_attempts(&self) -> usize {
        self.entry_attempts.keys().next_back().copied().unwrap_or(0)
    }

    /// Log a summary, warning when entry generation came close to the limit
    pub fn report(&self, max_attempts: usize) {
        info!("Sample intercept calls: {}", self.intercept_calls);
        info!("Discarded paths: {}", self.discarded_paths);

        let multiple = self
            .entry_attempts
            .iter()
            .filter(|(attempts, _)| **attempts > 1)
            .map(|(_, count)| count)
            .sum::<u64>();
        debug!(
            "Entry tracks needing more than one attempt: {multiple}/{}",
            self.entry_tracks()
        );
        for (attempts, count) in &self.entry_attempts {
            debug!("  {attempts:>6} attempts: {count}");
        }

        if 2 * self.max_entry_attempts() > max_attempts {
            warn!(
                "Generating an entry point into the sample took up to {} attempts (limit {max_attempts})",
                self.max_entry_attempts()
            );
            warn!("  - Check the sample shape fills its bounding box reasonably well");
        }
    }
}
