use async_trait::async_trait;
use std::sync::Arc;

use super::Capability;
use crate::config::AppConfig;
use crate::types::Coordinates;

#[derive(Debug, thiserror::Error)]
pub enum GeoError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("position unavailable: {0}")]
    PositionUnavailable(String),

    #[error("timed out waiting for a position fix")]
    Timeout,
}

#[async_trait]
pub trait GeoLocator: Send + Sync {
    /// One-shot position fix.
    async fn current_position(&self) -> Result<Coordinates, GeoError>;
}

/// Reports a position supplied through configuration.
pub struct FixedLocator {
    coordinates: Coordinates,
}

impl FixedLocator {
    pub fn new(coordinates: Coordinates) -> Self {
        Self { coordinates }
    }

    pub fn from_config(config: &AppConfig) -> Capability<dyn GeoLocator> {
        match config.fixed_location {
            Some(coordinates) => {
                let locator: Arc<dyn GeoLocator> = Arc::new(Self::new(coordinates));
                Capability::Available(locator)
            }
            None => Capability::Unavailable,
        }
    }
}

#[async_trait]
impl GeoLocator for FixedLocator {
    async fn current_position(&self) -> Result<Coordinates, GeoError> {
        Ok(self.coordinates)
    }
}
