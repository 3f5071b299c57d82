use probe_config::{Limits, ServiceConfig};
use probe_shaping::delivery::DripBounds;
use std::sync::Arc;

/// Read-only state shared by every handler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub limits: Limits,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    #[must_use]
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self {
            limits: config.limits.clone(),
        }
    }

    #[must_use]
    pub fn shared(self) -> SharedState {
        Arc::new(self)
    }

    /// Drip clamps with the configured ceilings; the 0.1s minimum duration is fixed.
    #[must_use]
    pub fn drip_bounds(&self) -> DripBounds {
        DripBounds {
            max_delay_secs: self.limits.max_delay_secs,
            max_duration_secs: self.limits.max_stream_duration_secs,
            max_bytes: self.limits.max_drip_bytes,
            ..DripBounds::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits_match_default_drip_bounds() {
        let state = AppState::from_config(&ServiceConfig::default());
        assert_eq!(state.drip_bounds(), DripBounds::default());
    }
}
