//! Runtime counters and per-phase latency tracking.
//!
//! Counters are lock-free `AtomicU64`s incremented on the hot path. Latency
//! samples live in small ring buffers behind a `parking_lot::Mutex`, read
//! rarely (end-of-run summaries, dashboards).

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::Mutex;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Counters (lock-free)
// ---------------------------------------------------------------------------

/// Event counters for one agent.
#[derive(Debug)]
pub struct AgentCounters {
    /// Ticks processed.
    pub ticks: AtomicU64,
    /// Routing passes run.
    pub scoring_passes: AtomicU64,
    /// Candidates scored across all passes.
    pub candidates_scored: AtomicU64,
    /// Perception passes run.
    pub perception_passes: AtomicU64,
    /// Entity memories forgotten.
    pub entities_forgotten: AtomicU64,
    /// Path memories expired.
    pub paths_forgotten: AtomicU64,
    /// Detours entered.
    pub detours_entered: AtomicU64,
}

impl AgentCounters {
    /// Zeroed counters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ticks: AtomicU64::new(0),
            scoring_passes: AtomicU64::new(0),
            candidates_scored: AtomicU64::new(0),
            perception_passes: AtomicU64::new(0),
            entities_forgotten: AtomicU64::new(0),
            paths_forgotten: AtomicU64::new(0),
            detours_entered: AtomicU64::new(0),
        }
    }

    /// Add `n` to a counter.
    pub fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    /// Snapshot every counter.
    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            scoring_passes: self.scoring_passes.load(Ordering::Relaxed),
            candidates_scored: self.candidates_scored.load(Ordering::Relaxed),
            perception_passes: self.perception_passes.load(Ordering::Relaxed),
            entities_forgotten: self.entities_forgotten.load(Ordering::Relaxed),
            paths_forgotten: self.paths_forgotten.load(Ordering::Relaxed),
            detours_entered: self.detours_entered.load(Ordering::Relaxed),
        }
    }
}

impl Default for AgentCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Counter values at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CounterSnapshot {
    /// Ticks processed.
    pub ticks: u64,
    /// Routing passes run.
    pub scoring_passes: u64,
    /// Candidates scored.
    pub candidates_scored: u64,
    /// Perception passes run.
    pub perception_passes: u64,
    /// Entity memories forgotten.
    pub entities_forgotten: u64,
    /// Path memories expired.
    pub paths_forgotten: u64,
    /// Detours entered.
    pub detours_entered: u64,
}

impl CounterSnapshot {
    /// Prometheus text exposition.
    #[must_use]
    pub fn to_prometheus(&self) -> String {
        let rows = [
            ("wayfarer_ticks_total", "Ticks processed", self.ticks),
            ("wayfarer_scoring_passes_total", "Routing passes", self.scoring_passes),
            ("wayfarer_candidates_scored_total", "Candidates scored", self.candidates_scored),
            ("wayfarer_perception_passes_total", "Perception passes", self.perception_passes),
            ("wayfarer_entities_forgotten_total", "Entity memories forgotten", self.entities_forgotten),
            ("wayfarer_paths_forgotten_total", "Path memories expired", self.paths_forgotten),
            ("wayfarer_detours_entered_total", "Detours entered", self.detours_entered),
        ];
        let mut out = String::new();
        for (name, help, value) in rows {
            out.push_str(&format!("# HELP {name} {help}\n# TYPE {name} counter\n{name} {value}\n"));
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Phase latency
// ---------------------------------------------------------------------------

/// Timed phases of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Whole tick.
    Tick,
    /// Perception pass.
    Perception,
    /// Routing (scoring) pass.
    Scoring,
    /// Memory decay pass.
    Decay,
}

impl Phase {
    const COUNT: usize = 4;

    fn index(self) -> usize {
        self as usize
    }
}

const WINDOW: usize = 256;

#[derive(Debug)]
struct Window {
    samples: Vec<f64>,
    write_idx: usize,
    count: u64,
}

impl Window {
    fn new() -> Self {
        Self {
            samples: vec![0.0; WINDOW],
            write_idx: 0,
            count: 0,
        }
    }

    fn record(&mut self, ms: f64) {
        self.samples[self.write_idx] = ms;
        self.write_idx = (self.write_idx + 1) % WINDOW;
        self.count += 1;
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    fn percentiles(&self) -> LatencyPercentiles {
        let n = usize::try_from(self.count).unwrap_or(usize::MAX).min(WINDOW);
        if n == 0 {
            return LatencyPercentiles::default();
        }
        let mut sorted = self.samples[..n].to_vec();
        sorted.sort_by(f64::total_cmp);
        LatencyPercentiles {
            samples: self.count,
            p50: sorted[n / 2],
            p99: sorted[((n as f64 * 0.99) as usize).min(n - 1)],
            max: sorted[n - 1],
        }
    }
}

/// Latency statistics in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LatencyPercentiles {
    /// Samples recorded over the whole run.
    pub samples: u64,
    /// Median of the recent window.
    pub p50: f64,
    /// 99th percentile of the recent window.
    pub p99: f64,
    /// Maximum of the recent window.
    pub max: f64,
}

/// Bounded latency windows, one per [`Phase`].
#[derive(Debug)]
pub struct PhaseTimings {
    windows: Mutex<[Window; Phase::COUNT]>,
}

impl PhaseTimings {
    /// Empty windows.
    #[must_use]
    pub fn new() -> Self {
        Self {
            windows: Mutex::new(std::array::from_fn(|_| Window::new())),
        }
    }

    /// Start timing `phase`; the sample is recorded when the guard drops.
    #[must_use]
    pub fn start(&self, phase: Phase) -> PhaseGuard<'_> {
        PhaseGuard {
            timings: self,
            phase,
            start: Instant::now(),
        }
    }

    /// Record a sample manually.
    pub fn record(&self, phase: Phase, ms: f64) {
        self.windows.lock()[phase.index()].record(ms);
    }

    /// Percentiles for `phase`.
    #[must_use]
    pub fn percentiles(&self, phase: Phase) -> LatencyPercentiles {
        self.windows.lock()[phase.index()].percentiles()
    }
}

impl Default for PhaseTimings {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard that records elapsed time when dropped.
pub struct PhaseGuard<'a> {
    timings: &'a PhaseTimings,
    phase: Phase,
    start: Instant,
}

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        let ms = self.start.elapsed().as_secs_f64() * 1000.0;
        self.timings.record(self.phase, ms);
    }
}

/// Counters plus latency windows.
#[derive(Debug, Default)]
pub struct AgentMetrics {
    /// Event counters.
    pub counters: AgentCounters,
    /// Per-phase latency.
    pub timings: PhaseTimings,
}

/// Serializable view of [`AgentMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    /// Counter values.
    pub counters: CounterSnapshot,
    /// Whole-tick latency.
    pub tick: LatencyPercentiles,
    /// Perception latency.
    pub perception: LatencyPercentiles,
    /// Scoring latency.
    pub scoring: LatencyPercentiles,
    /// Decay latency.
    pub decay: LatencyPercentiles,
}

impl AgentMetrics {
    /// Snapshot counters and percentiles.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            counters: self.counters.snapshot(),
            tick: self.timings.percentiles(Phase::Tick),
            perception: self.timings.percentiles(Phase::Perception),
            scoring: self.timings.percentiles(Phase::Scoring),
            decay: self.timings.percentiles(Phase::Decay),
        }
    }
}

// ---------------------------------------------------------------------------
// Span names
// ---------------------------------------------------------------------------

/// Span names used with `tracing::span!`.
pub mod spans {
    /// One agent tick.
    pub const TICK: &str = "wayfarer::tick";
    /// Perception pass.
    pub const PERCEPTION: &str = "wayfarer::perception";
    /// Routing pass.
    pub const SCORING: &str = "wayfarer::scoring";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_snapshot() {
        let c = AgentCounters::new();
        AgentCounters::add(&c.ticks, 3);
        AgentCounters::add(&c.detours_entered, 1);
        let s = c.snapshot();
        assert_eq!(s.ticks, 3);
        assert_eq!(s.detours_entered, 1);
        let text = s.to_prometheus();
        assert!(text.contains("wayfarer_ticks_total 3"));
        assert!(text.contains("# TYPE wayfarer_detours_entered_total counter"));
    }

    #[test]
    fn percentiles_over_window() {
        let t = PhaseTimings::new();
        assert_eq!(t.percentiles(Phase::Scoring).samples, 0);
        for i in 1..=100 {
            t.record(Phase::Scoring, f64::from(i));
        }
        let p = t.percentiles(Phase::Scoring);
        assert_eq!(p.samples, 100);
        assert!((p.p50 - 51.0).abs() < 1e-9);
        assert!((p.max - 100.0).abs() < 1e-9);
        assert_eq!(t.percentiles(Phase::Tick).samples, 0);
    }

    #[test]
    fn window_wraps() {
        let t = PhaseTimings::new();
        for _ in 0..(WINDOW + 10) {
            t.record(Phase::Tick, 1.0);
        }
        let p = t.percentiles(Phase::Tick);
        assert_eq!(p.samples, (WINDOW + 10) as u64);
        assert!((p.p99 - 1.0).abs() < 1e-9);
    }

    #[test]
    fn guard_records_on_drop() {
        let t = PhaseTimings::new();
        {
            let _guard = t.start(Phase::Decay);
        }
        assert_eq!(t.percentiles(Phase::Decay).samples, 1);
    }
}
