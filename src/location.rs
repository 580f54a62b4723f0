//! Delivery location capture for the shopping helper.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::capability::{Capability, GeoLocator, Notice, Notifier};
use crate::types::Location;

pub const CURRENT_LOCATION_LABEL: &str = "Current Location";

pub const LOCATION_SHARED: &str = "Location shared successfully";
pub const LOCATION_FAILED: &str = "Couldn't get your location. Please enter manually.";
pub const LOCATION_UNSUPPORTED: &str = "Geolocation is not supported on this device";
pub const ADDRESS_SAVED: &str = "Address saved successfully";
pub const ADDRESS_INVALID: &str = "Please enter a valid address";

type ConfirmCallback = Arc<dyn Fn(Location) + Send + Sync>;

/// What happened to one attempt at capturing a location.
#[derive(Clone, Debug, PartialEq)]
pub enum CaptureResult {
    Confirmed(Location),
    /// The attempt failed; the dialog stays open for manual entry.
    Failed,
    /// A device lookup is already running.
    AlreadyLocating,
}

/// Lowers the locating flag when a lookup finishes or its future is dropped.
struct LocatingGuard<'a>(&'a AtomicBool);

impl Drop for LocatingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Both ways of supplying a location end in the same `confirm` callback.
/// Opening and closing is up to the host.
pub struct LocationDialog {
    locator: Capability<dyn GeoLocator>,
    notifier: Arc<dyn Notifier>,
    on_confirm: ConfirmCallback,
    manual_address: Mutex<String>,
    locating: AtomicBool,
}

impl LocationDialog {
    pub fn new(
        locator: Capability<dyn GeoLocator>,
        notifier: Arc<dyn Notifier>,
        on_confirm: impl Fn(Location) + Send + Sync + 'static,
    ) -> Self {
        Self {
            locator,
            notifier,
            on_confirm: Arc::new(on_confirm),
            manual_address: Mutex::new(String::new()),
            locating: AtomicBool::new(false),
        }
    }

    pub fn is_locating(&self) -> bool {
        self.locating.load(Ordering::SeqCst)
    }

    pub fn manual_address(&self) -> String {
        self.manual_address
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_manual_address(&self, address: impl Into<String>) {
        *self
            .manual_address
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = address.into();
    }

    /// Asks the device for a one-shot fix.
    pub async fn share_current_location(&self) -> CaptureResult {
        let locator = match &self.locator {
            Capability::Available(locator) => Arc::clone(locator),
            Capability::Unavailable => {
                self.notifier.notify(Notice::error(LOCATION_UNSUPPORTED));
                return CaptureResult::Failed;
            }
            Capability::Denied => {
                tracing::warn!("location permission denied");
                self.notifier.notify(Notice::error(LOCATION_FAILED));
                return CaptureResult::Failed;
            }
        };

        if self.locating.swap(true, Ordering::SeqCst) {
            return CaptureResult::AlreadyLocating;
        }
        let position = {
            let _locating = LocatingGuard(&self.locating);
            locator.current_position().await
        };

        match position {
            Ok(coordinates) => {
                let location = Location {
                    address: CURRENT_LOCATION_LABEL.to_string(),
                    coordinates: Some(coordinates),
                };
                (self.on_confirm)(location.clone());
                self.notifier.notify(Notice::success(LOCATION_SHARED));
                CaptureResult::Confirmed(location)
            }
            Err(err) => {
                tracing::warn!("error getting location: {}", err);
                self.notifier.notify(Notice::error(LOCATION_FAILED));
                CaptureResult::Failed
            }
        }
    }

    /// Confirms whatever is in the address field, unless it is blank.
    pub fn submit_manual(&self) -> CaptureResult {
        let address = self.manual_address();
        if address.trim().is_empty() {
            self.notifier.notify(Notice::error(ADDRESS_INVALID));
            return CaptureResult::Failed;
        }
        let location = Location {
            address,
            coordinates: None,
        };
        (self.on_confirm)(location.clone());
        self.notifier.notify(Notice::success(ADDRESS_SAVED));
        CaptureResult::Confirmed(location)
    }
}
