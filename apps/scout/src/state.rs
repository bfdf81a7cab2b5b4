/// Counters that live for the whole process, owned by the scheduler loop and
/// lent to each cycle. Reset only on restart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounters {
    /// Incremented once per scheduler tick, whether or not the cycle completes.
    pub cycle_count: u64,
    /// Sum of candidates returned by all backends across completed fetch stages.
    pub total_candidates_fetched: u64,
}

impl RunCounters {
    /// Starts a new cycle and returns its 1-based number.
    pub fn begin_cycle(&mut self) -> u64 {
        self.cycle_count += 1;
        self.cycle_count
    }

    pub fn record_fetched(&mut self, count: usize) {
        self.total_candidates_fetched += count as u64;
    }
}
