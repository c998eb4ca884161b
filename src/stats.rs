//! Generation statistics
//!
//! One record per evaluated generation, plus an in-memory leaderboard of the
//! best ones for the end-of-run summary.

use crate::sim::SessionReport;

/// Maximum number of generations to keep on the leaderboard
pub const MAX_BEST_GENERATIONS: usize = 10;

/// Summary of one generation's session
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationStats {
    pub generation: u32,
    pub population: usize,
    pub score: u64,
    pub best_fitness: f64,
    pub mean_fitness: f64,
    pub ticks: u64,
    /// Controllers that faulted at least once
    pub faulted: usize,
}

impl GenerationStats {
    pub fn from_report(report: &SessionReport) -> Self {
        Self {
            generation: report.generation,
            population: report.outcomes.len(),
            score: report.score,
            best_fitness: report.best_fitness().unwrap_or(0.0),
            mean_fitness: report.mean_fitness().unwrap_or(0.0),
            ticks: report.ticks,
            faulted: report.outcomes.iter().filter(|o| o.faulted).count(),
        }
    }

    /// Ordering key: score first, then best fitness
    fn beats(&self, other: &GenerationStats) -> bool {
        self.score > other.score
            || (self.score == other.score && self.best_fitness > other.best_fitness)
    }
}

/// Best generations, sorted best first
#[derive(Debug, Clone, Default)]
pub struct StatsLog {
    pub entries: Vec<GenerationStats>,
}

impl StatsLog {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Check if a generation would make the leaderboard
    pub fn qualifies(&self, stats: &GenerationStats) -> bool {
        if self.entries.len() < MAX_BEST_GENERATIONS {
            return true;
        }
        self.entries.last().map(|e| stats.beats(e)).unwrap_or(true)
    }

    /// Insert a generation; returns its rank (1-indexed) if it made the board
    pub fn record(&mut self, stats: GenerationStats) -> Option<usize> {
        log::info!(
            "Generation {}: score {}, best fitness {:.1}, mean {:.2}, {} ticks",
            stats.generation,
            stats.score,
            stats.best_fitness,
            stats.mean_fitness,
            stats.ticks
        );
        if !self.qualifies(&stats) {
            return None;
        }

        let pos = self.entries.iter().position(|e| stats.beats(e));
        let rank = match pos {
            Some(i) => {
                self.entries.insert(i, stats);
                i + 1
            }
            None => {
                self.entries.push(stats);
                self.entries.len()
            }
        };
        self.entries.truncate(MAX_BEST_GENERATIONS);
        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Best generation so far
    pub fn best(&self) -> Option<&GenerationStats> {
        self.entries.first()
    }
}
