use serde::{Deserialize, Serialize};

/// Per-call lookup parameters. Replaces the original's process-wide mutable
/// configuration (beam, n_best, cutoff, unique, output format) with an explicit
/// value passed into every `lookup` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupOptions {
    /// Keep only the `n_best` lowest-weight analyses. `None` means unlimited.
    pub n_best: Option<usize>,
    /// Keep only analyses with weight <= (min_weight + beam). `None` means no beam.
    pub beam: Option<f32>,
    /// Select the unique collector (dedup by analysis string) instead of the
    /// plain one.
    pub unique: bool,
    /// Soft wall-clock budget for one lookup call. `0.0` (the default) disables
    /// the cutoff.
    pub time_cutoff_seconds: f64,
}

impl Default for LookupOptions {
    fn default() -> LookupOptions {
        LookupOptions { n_best: None, beam: None, unique: false, time_cutoff_seconds: 0.0 }
    }
}
