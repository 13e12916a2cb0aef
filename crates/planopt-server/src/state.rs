//! Shared application state.

use planopt_core::config::OptimizerConfig;
use planopt_core::engine::Optimizer;
use planopt_rules::default_rules;

/// State shared by all request handlers. The optimizer is stateless per run,
/// so a single instance serves concurrent requests.
pub struct AppState {
    pub optimizer: Optimizer,
}

impl AppState {
    pub fn new() -> Self {
        AppState {
            optimizer: Optimizer::new(OptimizerConfig::default(), default_rules()),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        AppState::new()
    }
}
