use serde::{Deserialize, Serialize};

use crate::locale::Lang;

/// Tunables for the dashboard controllers.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DashboardConfig {
    pub lang: Lang,
    /// Period of the cosmetic progress ticker.
    pub progress_tick_ms: u32,
    /// Percentage shown as soon as an evaluation starts.
    pub progress_start_pct: f64,
    /// The ticker never moves past this percentage.
    pub progress_ceiling_pct: f64,
    /// Largest single increment of the ticker.
    pub progress_max_step_pct: f64,
    /// Delay between a successful evaluation and revealing the results section.
    pub results_reveal_delay_ms: u32,
    pub progress_seed: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            lang: Lang::default(),
            progress_tick_ms: 500,
            progress_start_pct: 10.0,
            progress_ceiling_pct: 90.0,
            progress_max_step_pct: 5.0,
            results_reveal_delay_ms: 500,
            progress_seed: 0x5eed,
        }
    }
}
