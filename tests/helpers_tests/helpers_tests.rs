//! Tests for the Store helper operations
//!
//! These tests verify:
//! - get/put round trips and not-found signalling
//! - Argument validation before any transaction runs
//! - query / query_and_update / query_and_update_prefix semantics
//! - each / each_prefix ordering and early stop
//! - count / count_prefix

use bucketkv::{BucketKvError, Store};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_store() -> (TempDir, Store) {
    let temp_dir = TempDir::new().unwrap();
    let store = Store::open(temp_dir.path().join("helpers.db"), ["items", "other"]).unwrap();
    (temp_dir, store)
}

fn setup_prefix_store() -> (TempDir, Store) {
    let (temp, store) = setup_temp_store();
    for key in ["a", "ab", "abc", "abd", "b"] {
        store
            .put(b"items", key.as_bytes(), format!("v_{}", key).as_bytes())
            .unwrap();
    }
    (temp, store)
}

// =============================================================================
// Get / Put Tests
// =============================================================================

#[test]
fn test_put_get_round_trip() {
    let (_temp, store) = setup_temp_store();

    store.put(b"items", b"key", b"value").unwrap();

    assert_eq!(store.get(b"items", b"key").unwrap(), b"value");
}

#[test]
fn test_put_overwrite() {
    let (_temp, store) = setup_temp_store();

    store.put(b"items", b"key", b"value1").unwrap();
    store.put(b"items", b"key", b"value2").unwrap();

    assert_eq!(store.get(b"items", b"key").unwrap(), b"value2");
    assert_eq!(store.count(b"items").unwrap(), 1);
}

#[test]
fn test_put_binary_data() {
    let (_temp, store) = setup_temp_store();
    let key = b"\x00\x01\x02\xFF\xFE";
    let value = b"\xFF\x00\xAB\xCD\x00";

    store.put(b"items", key, value).unwrap();

    assert_eq!(store.get(b"items", key).unwrap(), value.to_vec());
}

#[test]
fn test_put_large_value() {
    let (_temp, store) = setup_temp_store();
    let large_value = vec![0xAB; 100_000];

    store.put(b"items", b"large", &large_value).unwrap();

    assert_eq!(store.get(b"items", b"large").unwrap(), large_value);
}

#[test]
fn test_get_returns_independent_copy() {
    let (_temp, store) = setup_temp_store();
    store.put(b"items", b"key", b"value").unwrap();

    let mut copy = store.get(b"items", b"key").unwrap();
    copy[0] = b'X';

    assert_eq!(store.get(b"items", b"key").unwrap(), b"value");
}

#[test]
fn test_get_missing_bucket() {
    let (_temp, store) = setup_temp_store();

    let result = store.get(b"missing", b"key");

    assert!(matches!(result, Err(BucketKvError::BucketNotFound(name)) if name == "missing"));
}

#[test]
fn test_get_missing_key() {
    let (_temp, store) = setup_temp_store();

    assert!(matches!(store.get(b"items", b"nope"), Err(BucketKvError::KeyNotFound)));
}

#[test]
fn test_put_missing_bucket() {
    let (_temp, store) = setup_temp_store();

    let result = store.put(b"missing", b"key", b"value");

    assert!(matches!(result, Err(BucketKvError::BucketNotFound(_))));
}

#[test]
fn test_get_or_none_swallows_lookup_failures() {
    let (_temp, store) = setup_temp_store();
    store.put(b"items", b"key", b"value").unwrap();

    assert_eq!(store.get_or_none(b"items", b"key"), Some(b"value".to_vec()));
    assert_eq!(store.get_or_none(b"items", b"nope"), None);
    assert_eq!(store.get_or_none(b"missing", b"key"), None);
    assert_eq!(store.get_or_none(b"", b"key"), None);
}

#[test]
#[cfg(debug_assertions)]
#[should_panic(expected = "get_or_none called inside a transaction")]
fn test_get_or_none_inside_transaction_panics_in_debug() {
    let (_temp, store) = setup_temp_store();
    store.put(b"items", b"key", b"value").unwrap();

    let _ = store.update(|_tx| Ok::<_, BucketKvError>(store.get_or_none(b"items", b"key")));
}

#[test]
#[cfg(not(debug_assertions))]
fn test_get_or_none_inside_transaction_reads_as_none() {
    let (_temp, store) = setup_temp_store();
    store.put(b"items", b"key", b"value").unwrap();

    let inner = store
        .update(|_tx| Ok::<_, BucketKvError>(store.get_or_none(b"items", b"key")))
        .unwrap();

    assert_eq!(inner, None);
}

// =============================================================================
// Validation Tests
// =============================================================================

#[test]
fn test_empty_arguments_are_invalid() {
    let (_temp, store) = setup_temp_store();
    let generation = store.generation();

    assert!(matches!(store.get(b"", b"k"), Err(BucketKvError::InvalidArgument(_))));
    assert!(matches!(store.get(b"items", b""), Err(BucketKvError::InvalidArgument(_))));
    assert!(matches!(store.put(b"", b"k", b"v"), Err(BucketKvError::InvalidArgument(_))));
    assert!(matches!(store.put(b"items", b"", b"v"), Err(BucketKvError::InvalidArgument(_))));
    assert!(matches!(store.put(b"items", b"k", b""), Err(BucketKvError::InvalidArgument(_))));
    assert!(matches!(store.count(b""), Err(BucketKvError::InvalidArgument(_))));
    assert!(matches!(store.count_prefix(b"items", b""), Err(BucketKvError::InvalidArgument(_))));
    assert!(matches!(
        store.each_prefix(b"items", b"", |_, _| Ok::<_, BucketKvError>(())),
        Err(BucketKvError::InvalidArgument(_))
    ));
    assert!(matches!(
        store.query_and_update_prefix(b"items", b"", |_, _| Ok::<_, BucketKvError>(None)),
        Err(BucketKvError::InvalidArgument(_))
    ));

    assert_eq!(store.generation(), generation);
}

#[test]
fn test_validation_runs_before_transaction() {
    let (_temp, store) = setup_temp_store();

    // Inside a write transaction any helper that reached the engine would
    // report reentrancy; invalid arguments are rejected first.
    let result = store.update(|_tx| {
        assert!(matches!(store.get(b"", b"k"), Err(BucketKvError::InvalidArgument(_))));
        assert!(matches!(store.put(b"items", b"k", b""), Err(BucketKvError::InvalidArgument(_))));
        Ok::<_, BucketKvError>(())
    });

    assert!(result.is_ok());
}

// =============================================================================
// Query Tests
// =============================================================================

#[test]
fn test_query_passes_stored_value() {
    let (_temp, store) = setup_temp_store();
    store.put(b"items", b"key", b"hello").unwrap();

    let len = store
        .query(b"items", b"key", |value| Ok::<_, BucketKvError>(value.len()))
        .unwrap();

    assert_eq!(len, 5);
}

#[test]
fn test_query_missing_key_skips_callback() {
    let (_temp, store) = setup_temp_store();
    let mut called = false;

    let result = store.query(b"items", b"nope", |_| {
        called = true;
        Ok::<_, BucketKvError>(())
    });

    assert!(matches!(result, Err(BucketKvError::KeyNotFound)));
    assert!(!called);
}

// =============================================================================
// Query And Update Tests
// =============================================================================

#[test]
fn test_query_and_update_replaces_value() {
    let (_temp, store) = setup_temp_store();
    store.put(b"items", b"key", b"1").unwrap();

    store
        .query_and_update(b"items", b"key", |value| {
            assert_eq!(value, b"1");
            Ok::<_, BucketKvError>(Some(b"2".to_vec()))
        })
        .unwrap();

    assert_eq!(store.get(b"items", b"key").unwrap(), b"2");
}

#[test]
fn test_query_and_update_none_leaves_value_and_commits() {
    let (_temp, store) = setup_temp_store();
    store.put(b"items", b"key", b"1").unwrap();
    let generation = store.generation();

    store
        .query_and_update(b"items", b"key", |_| Ok::<_, BucketKvError>(None))
        .unwrap();

    assert_eq!(store.get(b"items", b"key").unwrap(), b"1");
    assert_eq!(store.generation(), generation);
}

#[test]
fn test_query_and_update_missing_key() {
    let (_temp, store) = setup_temp_store();

    let result = store.query_and_update(b"items", b"nope", |_| Ok::<_, BucketKvError>(Some(b"x".to_vec())));

    assert!(matches!(result, Err(BucketKvError::KeyNotFound)));
    assert!(store.get_or_none(b"items", b"nope").is_none());
}

#[test]
fn test_query_and_update_missing_bucket() {
    let (_temp, store) = setup_temp_store();

    let result = store.query_and_update(b"missing", b"key", |_| Ok::<_, BucketKvError>(None));

    assert!(matches!(result, Err(BucketKvError::BucketNotFound(_))));
}

#[test]
fn test_query_and_update_error_rolls_back() {
    let (_temp, store) = setup_temp_store();
    store.put(b"items", b"key", b"1").unwrap();

    let result = store.query_and_update(b"items", b"key", |_| {
        Err::<Option<Vec<u8>>, _>(BucketKvError::InvalidArgument("rejected".into()))
    });

    assert!(matches!(result, Err(BucketKvError::InvalidArgument(msg)) if msg == "rejected"));
    assert_eq!(store.get(b"items", b"key").unwrap(), b"1");
}

#[test]
fn test_query_and_update_rejects_empty_replacement() {
    let (_temp, store) = setup_temp_store();
    store.put(b"items", b"key", b"1").unwrap();

    let result = store.query_and_update(b"items", b"key", |_| Ok::<_, BucketKvError>(Some(Vec::new())));

    assert!(matches!(result, Err(BucketKvError::InvalidArgument(_))));
    assert_eq!(store.get(b"items", b"key").unwrap(), b"1");
}

// =============================================================================
// Query And Update Prefix Tests
// =============================================================================

#[test]
fn test_query_and_update_prefix_visits_matches_in_order() {
    let (_temp, store) = setup_prefix_store();
    let mut seen = Vec::new();

    let replaced = store
        .query_and_update_prefix(b"items", b"ab", |key, value| {
            seen.push(key.to_vec());
            let mut next = value.to_vec();
            next.extend_from_slice(b"!");
            Ok::<_, BucketKvError>(Some(next))
        })
        .unwrap();

    assert_eq!(replaced, 3);
    assert_eq!(seen, vec![b"ab".to_vec(), b"abc".to_vec(), b"abd".to_vec()]);
    assert_eq!(store.get(b"items", b"ab").unwrap(), b"v_ab!");
    assert_eq!(store.get(b"items", b"abc").unwrap(), b"v_abc!");
    assert_eq!(store.get(b"items", b"abd").unwrap(), b"v_abd!");
    assert_eq!(store.get(b"items", b"a").unwrap(), b"v_a");
    assert_eq!(store.get(b"items", b"b").unwrap(), b"v_b");
}

#[test]
fn test_query_and_update_prefix_partial_replacement() {
    let (_temp, store) = setup_prefix_store();

    let replaced = store
        .query_and_update_prefix(b"items", b"ab", |key, _| {
            if key == b"abc" {
                Ok::<_, BucketKvError>(Some(b"changed".to_vec()))
            } else {
                Ok(None)
            }
        })
        .unwrap();

    assert_eq!(replaced, 1);
    assert_eq!(store.get(b"items", b"abc").unwrap(), b"changed");
    assert_eq!(store.get(b"items", b"abd").unwrap(), b"v_abd");
}

#[test]
fn test_query_and_update_prefix_error_rolls_back_whole_batch() {
    let (_temp, store) = setup_prefix_store();
    let generation = store.generation();

    let result = store.query_and_update_prefix(b"items", b"ab", |key, _| {
        if key == b"abd" {
            return Err(BucketKvError::InvalidArgument("stop".into()));
        }
        Ok(Some(b"changed".to_vec()))
    });

    assert!(matches!(result, Err(BucketKvError::InvalidArgument(_))));
    assert_eq!(store.get(b"items", b"ab").unwrap(), b"v_ab");
    assert_eq!(store.get(b"items", b"abc").unwrap(), b"v_abc");
    assert_eq!(store.generation(), generation);
}

#[test]
fn test_query_and_update_prefix_no_matches() {
    let (_temp, store) = setup_prefix_store();

    let replaced = store
        .query_and_update_prefix(b"items", b"zzz", |_, _| Ok::<_, BucketKvError>(Some(b"x".to_vec())))
        .unwrap();

    assert_eq!(replaced, 0);
}

// =============================================================================
// Iteration Tests
// =============================================================================

#[test]
fn test_each_visits_all_in_ascending_order() {
    let (_temp, store) = setup_temp_store();
    for key in ["cherry", "apple", "banana"] {
        store.put(b"items", key.as_bytes(), b"fruit").unwrap();
    }

    let mut keys = Vec::new();
    store
        .each(b"items", |key, value| {
            assert_eq!(value, b"fruit");
            keys.push(String::from_utf8(key.to_vec()).unwrap());
            Ok::<_, BucketKvError>(())
        })
        .unwrap();

    assert_eq!(keys, vec!["apple", "banana", "cherry"]);
}

#[test]
fn test_each_stops_at_first_error() {
    let (_temp, store) = setup_prefix_store();
    let mut visited = 0;

    let result = store.each(b"items", |key, _| {
        visited += 1;
        if key == b"abc" {
            return Err(BucketKvError::KeyNotFound);
        }
        Ok(())
    });

    assert!(matches!(result, Err(BucketKvError::KeyNotFound)));
    assert_eq!(visited, 3);
}

#[test]
fn test_each_empty_bucket() {
    let (_temp, store) = setup_temp_store();
    let mut visited = 0;

    store
        .each(b"items", |_, _| {
            visited += 1;
            Ok::<_, BucketKvError>(())
        })
        .unwrap();

    assert_eq!(visited, 0);
}

#[test]
fn test_each_missing_bucket() {
    let (_temp, store) = setup_temp_store();

    let result = store.each(b"missing", |_, _| Ok::<_, BucketKvError>(()));

    assert!(matches!(result, Err(BucketKvError::BucketNotFound(_))));
}

#[test]
fn test_each_prefix_visits_exact_matches() {
    let (_temp, store) = setup_prefix_store();
    let mut keys = Vec::new();

    store
        .each_prefix(b"items", b"ab", |key, _| {
            keys.push(key.to_vec());
            Ok::<_, BucketKvError>(())
        })
        .unwrap();

    assert_eq!(keys, vec![b"ab".to_vec(), b"abc".to_vec(), b"abd".to_vec()]);
}

#[test]
fn test_each_prefix_no_matches() {
    let (_temp, store) = setup_prefix_store();
    let mut visited = 0;

    store
        .each_prefix(b"items", b"c", |_, _| {
            visited += 1;
            Ok::<_, BucketKvError>(())
        })
        .unwrap();

    assert_eq!(visited, 0);
}

// =============================================================================
// Count Tests
// =============================================================================

#[test]
fn test_count_tracks_distinct_keys() {
    let (_temp, store) = setup_temp_store();

    for i in 0..10 {
        store
            .put(b"items", format!("key{}", i).as_bytes(), b"v1")
            .unwrap();
    }
    for i in 0..5 {
        store
            .put(b"items", format!("key{}", i).as_bytes(), b"v2")
            .unwrap();
    }
    store
        .update_bucket(b"items", |bucket| {
            bucket.delete(b"key9");
            Ok::<_, BucketKvError>(())
        })
        .unwrap();

    assert_eq!(store.count(b"items").unwrap(), 9);

    let mut distinct = 0;
    store
        .each(b"items", |_, _| {
            distinct += 1;
            Ok::<_, BucketKvError>(())
        })
        .unwrap();
    assert_eq!(distinct, 9);
}

#[test]
fn test_count_prefix() {
    let (_temp, store) = setup_prefix_store();

    assert_eq!(store.count_prefix(b"items", b"a").unwrap(), 4);
    assert_eq!(store.count_prefix(b"items", b"ab").unwrap(), 3);
    assert_eq!(store.count_prefix(b"items", b"abc").unwrap(), 1);
    assert_eq!(store.count_prefix(b"items", b"z").unwrap(), 0);
}

#[test]
fn test_count_empty_and_missing_bucket() {
    let (_temp, store) = setup_temp_store();

    assert_eq!(store.count(b"other").unwrap(), 0);
    assert!(matches!(store.count(b"missing"), Err(BucketKvError::BucketNotFound(_))));
    assert!(matches!(
        store.count_prefix(b"missing", b"a"),
        Err(BucketKvError::BucketNotFound(_))
    ));
}

// =============================================================================
// Whole-Bucket Scope Tests
// =============================================================================

#[test]
fn test_with_bucket_reads_consistent_view() {
    let (_temp, store) = setup_prefix_store();

    let (len, first) = store
        .with_bucket(b"items", |bucket| {
            let first = bucket.iter().next().map(|(k, _)| k.to_vec());
            Ok::<_, BucketKvError>((bucket.len(), first))
        })
        .unwrap();

    assert_eq!(len, 5);
    assert_eq!(first, Some(b"a".to_vec()));
}

#[test]
fn test_update_bucket_applies_batch_atomically() {
    let (_temp, store) = setup_temp_store();

    let result = store.update_bucket(b"items", |bucket| {
        bucket.put(b"x", b"1")?;
        bucket.put(b"y", b"2")?;
        Err::<(), _>(BucketKvError::KeyNotFound)
    });
    assert!(result.is_err());
    assert_eq!(store.count(b"items").unwrap(), 0);

    store
        .update_bucket(b"items", |bucket| {
            bucket.put(b"x", b"1")?;
            bucket.put(b"y", b"2")
        })
        .unwrap();
    assert_eq!(store.count(b"items").unwrap(), 2);
}

#[test]
fn test_update_bucket_missing_bucket() {
    let (_temp, store) = setup_temp_store();

    let result = store.update_bucket(b"missing", |_| Ok::<_, BucketKvError>(()));

    assert!(matches!(result, Err(BucketKvError::BucketNotFound(_))));
}
