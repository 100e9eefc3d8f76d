//! Kempe meet move statistics.
//!
//! Histograms of the number of meet moves (steps) and alternation rounds
//! (phases) made by successful Kempe meet moves.

/// Step and phase histograms of successful Kempe meet moves.
///
/// # Example
///
/// ```
/// use khe_solver::stats::KempeStats;
///
/// let mut stats = KempeStats::default();
/// stats.record(1, 1);
/// stats.record(3, 2);
/// stats.record(3, 2);
///
/// assert_eq!(stats.step_histo_max(), 3);
/// assert_eq!(stats.step_histo_frequency(3), 2);
/// assert_eq!(stats.step_histo_total(), 3);
/// assert_eq!(stats.phase_histo_average(), 5.0 / 3.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KempeStats {
    step_histo: Vec<usize>,
    phase_histo: Vec<usize>,
}

fn bump(histo: &mut Vec<usize>, count: usize) {
    assert!(count >= 1, "KempeStats: count < 1");
    if histo.len() < count {
        histo.resize(count, 0);
    }
    histo[count - 1] += 1;
}

fn frequency(histo: &[usize], count: usize) -> usize {
    assert!(
        (1..=histo.len()).contains(&count),
        "KempeStats: count {} out of range 1..={}",
        count,
        histo.len()
    );
    histo[count - 1]
}

fn average(histo: &[usize]) -> f64 {
    let total: usize = histo.iter().sum();
    assert!(total > 0, "KempeStats: no entries");
    let weighted: usize = histo.iter().enumerate().map(|(i, n)| n * (i + 1)).sum();
    weighted as f64 / total as f64
}

impl KempeStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one successful move of `steps` meet moves in `phases` phases.
    pub fn record(&mut self, steps: usize, phases: usize) {
        bump(&mut self.step_histo, steps);
        bump(&mut self.phase_histo, phases);
    }

    /// The largest step count recorded, or 0.
    pub fn step_histo_max(&self) -> usize {
        self.step_histo.len()
    }

    /// How many moves had exactly `steps` steps.
    ///
    /// # Panics
    ///
    /// Panics unless `1 <= steps <= step_histo_max()`.
    pub fn step_histo_frequency(&self, steps: usize) -> usize {
        frequency(&self.step_histo, steps)
    }

    /// Number of moves recorded.
    pub fn step_histo_total(&self) -> usize {
        self.step_histo.iter().sum()
    }

    /// Mean step count; panics when nothing was recorded.
    pub fn step_histo_average(&self) -> f64 {
        average(&self.step_histo)
    }

    pub fn phase_histo_max(&self) -> usize {
        self.phase_histo.len()
    }

    pub fn phase_histo_frequency(&self, phases: usize) -> usize {
        frequency(&self.phase_histo, phases)
    }

    pub fn phase_histo_total(&self) -> usize {
        self.phase_histo.iter().sum()
    }

    pub fn phase_histo_average(&self) -> f64 {
        average(&self.phase_histo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_stats() {
        let stats = KempeStats::new();
        assert_eq!(stats.step_histo_max(), 0);
        assert_eq!(stats.step_histo_total(), 0);
        assert_eq!(stats.phase_histo_total(), 0);
    }

    #[test]
    fn test_record_fills_gaps() {
        let mut stats = KempeStats::new();
        stats.record(4, 2);
        assert_eq!(stats.step_histo_max(), 4);
        assert_eq!(stats.step_histo_frequency(1), 0);
        assert_eq!(stats.step_histo_frequency(4), 1);
        assert_eq!(stats.phase_histo_max(), 2);
        assert_eq!(stats.phase_histo_frequency(2), 1);
        assert_eq!(stats.step_histo_average(), 4.0);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_frequency_out_of_range() {
        let mut stats = KempeStats::new();
        stats.record(1, 1);
        stats.step_histo_frequency(2);
    }

    #[test]
    #[should_panic(expected = "no entries")]
    fn test_average_of_nothing() {
        KempeStats::new().phase_histo_average();
    }
}
