//! Integration tests for the delivery location dialog

mod common;

use common::*;
use async_trait::async_trait;
use sahayak::capability::{Capability, GeoError, GeoLocator, Notice};
use sahayak::location::{
    ADDRESS_INVALID, ADDRESS_SAVED, CURRENT_LOCATION_LABEL, CaptureResult, LOCATION_FAILED,
    LOCATION_SHARED, LOCATION_UNSUPPORTED, LocationDialog,
};
use sahayak::types::{Coordinates, Location};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

struct Harness {
    dialog: LocationDialog,
    confirmed: Arc<Mutex<Vec<Location>>>,
    notifier: Arc<RecordingNotifier>,
}

fn harness(locator: Capability<dyn GeoLocator>) -> Harness {
    let confirmed = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&confirmed);
    let notifier = Arc::new(RecordingNotifier::default());
    let dialog = LocationDialog::new(locator, notifier.clone(), move |location| {
        sink.lock().unwrap().push(location);
    });
    Harness {
        dialog,
        confirmed,
        notifier,
    }
}

impl Harness {
    fn confirmed(&self) -> Vec<Location> {
        self.confirmed.lock().unwrap().clone()
    }
}

mod manual_entry_tests {
    use super::*;

    #[test]
    fn test_blank_address_is_refused() {
        let h = harness(Capability::Unavailable);

        for blank in ["", "   ", "\t\n"] {
            h.dialog.set_manual_address(blank);
            assert_eq!(h.dialog.submit_manual(), CaptureResult::Failed);
        }
        assert!(h.confirmed().is_empty());
        assert_eq!(
            h.notifier.notices(),
            vec![Notice::error(ADDRESS_INVALID); 3]
        );
    }

    #[test]
    fn test_typed_address_is_confirmed_verbatim() {
        let h = harness(Capability::Unavailable);
        h.dialog.set_manual_address("12 MG Road, Pune ");
        assert_eq!(h.dialog.manual_address(), "12 MG Road, Pune ");

        let expected = Location {
            address: "12 MG Road, Pune ".to_string(),
            coordinates: None,
        };
        assert_eq!(h.dialog.submit_manual(), CaptureResult::Confirmed(expected.clone()));
        assert_eq!(h.confirmed(), vec![expected]);
        assert_eq!(h.notifier.notices(), vec![Notice::success(ADDRESS_SAVED)]);
    }
}

mod device_location_tests {
    use super::*;

    #[tokio::test]
    async fn test_fix_is_confirmed_with_exact_coordinates() {
        let coordinates = Coordinates {
            latitude: 19.0760,
            longitude: 72.8777,
        };
        let h = harness(locator_capability(FakeLocator::At(coordinates)));

        let result = h.dialog.share_current_location().await;
        let expected = Location {
            address: CURRENT_LOCATION_LABEL.to_string(),
            coordinates: Some(coordinates),
        };
        assert_eq!(result, CaptureResult::Confirmed(expected.clone()));
        assert_eq!(h.confirmed(), vec![expected]);
        assert_eq!(h.notifier.notices(), vec![Notice::success(LOCATION_SHARED)]);
        assert!(!h.dialog.is_locating());
    }

    #[tokio::test]
    async fn test_refused_fix_leaves_manual_entry_open() {
        let h = harness(locator_capability(FakeLocator::Refused));

        assert_eq!(h.dialog.share_current_location().await, CaptureResult::Failed);
        assert!(h.confirmed().is_empty());
        assert_eq!(h.notifier.notices(), vec![Notice::error(LOCATION_FAILED)]);
        assert!(!h.dialog.is_locating());

        h.dialog.set_manual_address("Near the temple");
        assert!(matches!(h.dialog.submit_manual(), CaptureResult::Confirmed(_)));
    }

    #[tokio::test]
    async fn test_denied_permission_reports_failure() {
        let h = harness(Capability::Denied);
        assert_eq!(h.dialog.share_current_location().await, CaptureResult::Failed);
        assert_eq!(h.notifier.notices(), vec![Notice::error(LOCATION_FAILED)]);
    }

    #[tokio::test]
    async fn test_missing_geolocation_reports_unsupported() {
        let h = harness(Capability::Unavailable);
        assert_eq!(h.dialog.share_current_location().await, CaptureResult::Failed);
        assert!(h.confirmed().is_empty());
        assert_eq!(h.notifier.notices(), vec![Notice::error(LOCATION_UNSUPPORTED)]);
    }

    /// Holds the fix until released.
    struct SlowLocator {
        release: Arc<Notify>,
    }

    #[async_trait]
    impl GeoLocator for SlowLocator {
        async fn current_position(&self) -> Result<Coordinates, GeoError> {
            self.release.notified().await;
            Ok(Coordinates {
                latitude: 1.0,
                longitude: 2.0,
            })
        }
    }

    #[tokio::test]
    async fn test_second_request_while_locating_is_ignored() {
        let release = Arc::new(Notify::new());
        let locator: Arc<dyn GeoLocator> = Arc::new(SlowLocator {
            release: Arc::clone(&release),
        });
        let h = Arc::new(harness(Capability::Available(locator)));

        let first = {
            let h = Arc::clone(&h);
            tokio::spawn(async move { h.dialog.share_current_location().await })
        };
        while !h.dialog.is_locating() {
            tokio::task::yield_now().await;
        }

        assert_eq!(
            h.dialog.share_current_location().await,
            CaptureResult::AlreadyLocating
        );

        release.notify_one();
        assert!(matches!(first.await.unwrap(), CaptureResult::Confirmed(_)));
        assert_eq!(h.confirmed().len(), 1);
        assert!(!h.dialog.is_locating());
    }

    #[tokio::test]
    async fn test_abandoned_lookup_does_not_block_the_next_one() {
        let release = Arc::new(Notify::new());
        let locator: Arc<dyn GeoLocator> = Arc::new(SlowLocator {
            release: Arc::clone(&release),
        });
        let h = Arc::new(harness(Capability::Available(locator)));

        let abandoned = {
            let h = Arc::clone(&h);
            tokio::spawn(async move { h.dialog.share_current_location().await })
        };
        while !h.dialog.is_locating() {
            tokio::task::yield_now().await;
        }
        abandoned.abort();
        assert!(abandoned.await.unwrap_err().is_cancelled());
        assert!(!h.dialog.is_locating());

        release.notify_one();
        assert!(matches!(
            h.dialog.share_current_location().await,
            CaptureResult::Confirmed(_)
        ));
        assert_eq!(h.notifier.notices(), vec![Notice::success(LOCATION_SHARED)]);
    }
}
