//! Integration tests for the settings store
//!
//! Exercises the on-disk store and the typed accessors layered on top of it.

use sahayak::storage::{
    self, API_KEY_KEY, FileStore, KeyValueStore, USE_SPEECH_KEY, load_api_key, load_use_speech,
    save_api_key, save_use_speech,
};
use tempfile::TempDir;

fn temp_store() -> (TempDir, FileStore) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let store = FileStore::new(dir.path().join("storage"));
    (dir, store)
}

mod file_store_tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let (_dir, store) = temp_store();

        store.set("greeting", "namaste").expect("Failed to set");
        assert_eq!(store.get("greeting"), Some("namaste".to_string()));
    }

    #[test]
    fn test_get_nonexistent() {
        let (_dir, store) = temp_store();
        assert_eq!(store.get("nonexistent_key"), None);
    }

    #[test]
    fn test_overwrite() {
        let (_dir, store) = temp_store();

        store.set("k", "first").expect("Failed to set");
        store.set("k", "second").expect("Failed to overwrite");
        assert_eq!(store.get("k").as_deref(), Some("second"));
    }

    #[test]
    fn test_remove() {
        let (_dir, store) = temp_store();

        store.set("to_delete", "value").expect("Failed to set");
        assert!(store.get("to_delete").is_some());

        store.remove("to_delete").expect("Failed to delete");
        assert!(store.get("to_delete").is_none());

        // Removing again is not an error
        store.remove("to_delete").expect("Second delete failed");
    }

    #[test]
    fn test_keys_with_separators_stay_inside_the_directory() {
        let (dir, store) = temp_store();

        store.set("../escape/attempt", "v").expect("Failed to set");
        assert_eq!(store.get("../escape/attempt").as_deref(), Some("v"));
        assert!(dir.path().join("storage").join("___escape_attempt.txt").exists());
    }

    #[test]
    fn test_values_survive_a_new_instance() {
        let (dir, store) = temp_store();
        store.set("persisted", "yes").expect("Failed to set");
        drop(store);

        let reopened = FileStore::new(dir.path().join("storage"));
        assert_eq!(reopened.get("persisted").as_deref(), Some("yes"));
    }
}

mod settings_tests {
    use super::*;

    #[test]
    fn test_api_key_round_trip_on_disk() {
        let (_dir, store) = temp_store();

        assert_eq!(load_api_key(&store), None);
        save_api_key(&store, "AIza-test").expect("Failed to save key");
        assert_eq!(load_api_key(&store).as_deref(), Some("AIza-test"));
        assert_eq!(store.get(API_KEY_KEY).as_deref(), Some("AIza-test"));
    }

    #[test]
    fn test_speech_preference_on_disk() {
        let (_dir, store) = temp_store();

        assert!(load_use_speech(&store), "speech defaults to on");
        save_use_speech(&store, false).expect("Failed to save preference");
        assert_eq!(store.get(USE_SPEECH_KEY).as_deref(), Some("false"));
        assert!(!load_use_speech(&store));
    }

    #[test]
    fn test_unrecognized_speech_value_means_on() {
        let (_dir, store) = temp_store();
        store.set(USE_SPEECH_KEY, "maybe").expect("Failed to set");
        assert!(storage::load_use_speech(&store));
    }
}
