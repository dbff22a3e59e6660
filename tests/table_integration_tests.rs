//! Integration Tests for the public cache API
//!
//! Drives tables and items the way an application would: through the
//! crate's public exports only.

use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use ttlcache::cache::CacheStats;
use ttlcache::{spawn_sweeper_task, CacheError, CacheItem, CacheTable, Config};

// == Helper Functions ==

fn create_test_table() -> CacheTable<String, i64> {
    CacheTable::new("integration")
}

fn key(s: &str) -> String {
    s.to_string()
}

// == Item Scenarios ==

#[test]
fn test_item_scenario_basic_accessors() {
    let item = CacheItem::new("a", Duration::from_secs(5), 42);

    assert_eq!(*item.key(), "a");
    assert_eq!(*item.data(), 42);
    assert_eq!(item.access_count(), 0);
    assert_eq!(item.life_span(), Duration::from_secs(5));

    let before = item.accessed_on();
    thread::sleep(Duration::from_millis(2));
    item.keep_alive();

    assert_eq!(item.access_count(), 1);
    assert!(item.accessed_on() > before);
}

#[test]
fn test_item_scenario_set_discards_added() {
    let fired = Arc::new(Mutex::new(Vec::new()));
    let item = CacheItem::new(key("a"), Duration::from_secs(5), 42);

    let log = fired.clone();
    item.add_about_to_expire_callback(move |k: &String| log.lock().push(format!("cb:{}", k)));
    let log = fired.clone();
    item.set_about_to_expire_callback(move |k: &String| log.lock().push(format!("cb2:{}", k)));

    assert_eq!(item.about_to_expire_callbacks().len(), 1);
    item.notify_about_to_expire();
    assert_eq!(*fired.lock(), vec!["cb2:a".to_string()]);
}

#[test]
fn test_item_shared_across_threads() {
    let item = Arc::new(CacheItem::new(key("hot"), Duration::from_secs(60), 0i64));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let item = item.clone();
            thread::spawn(move || {
                item.keep_alive();
                assert!(item.created_on() <= item.accessed_on());
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(item.access_count(), 16);
}

// == Table Lookups ==

#[test]
fn test_table_lookup_keeps_alive() {
    let table = create_test_table();
    table.add(key("a"), Duration::from_secs(60), 1);

    for _ in 0..3 {
        table.value(&key("a")).unwrap();
    }

    assert_eq!(table.value(&key("a")).unwrap().access_count(), 4);
}

#[test]
fn test_table_missing_key_without_loader() {
    let table = create_test_table();

    let err = table.value(&key("nope")).unwrap_err();

    assert_eq!(err, CacheError::KeyNotFound("\"nope\"".to_string()));
}

#[test]
fn test_table_missing_key_with_failing_loader() {
    let table = create_test_table();
    table.set_data_loader(|k: &String| {
        k.parse::<i64>()
            .ok()
            .map(|n| CacheItem::new(k.clone(), Duration::ZERO, n * 2))
    });

    assert_eq!(*table.value(&key("21")).unwrap().data(), 42);
    assert!(matches!(
        table.value(&key("not-a-number")),
        Err(CacheError::KeyNotFoundOrLoadable(_))
    ));

    let stats = table.stats();
    assert_eq!(stats.loads, 1);
    assert_eq!(stats.misses, 2);
    assert_eq!(stats.total_entries, 1);
}

#[test]
fn test_table_delete_returns_item() {
    let table = create_test_table();
    table.add(key("a"), Duration::ZERO, 9);

    let removed = table.delete(&key("a")).unwrap();

    assert_eq!(*removed.data(), 9);
    assert!(matches!(
        table.delete(&key("a")),
        Err(CacheError::KeyNotFound(_))
    ));
}

#[test]
fn test_item_outlives_eviction() {
    let table = create_test_table();
    let item = table.add(key("a"), Duration::ZERO, 5);

    table.delete(&key("a")).unwrap();

    assert_eq!(*item.key(), "a");
    assert_eq!(*item.data(), 5);
}

// == Expiration ==

#[test]
fn test_expiration_is_sliding() {
    let table = create_test_table();
    table.add(key("touched"), Duration::from_millis(150), 1);
    table.add(key("idle"), Duration::from_millis(150), 2);

    thread::sleep(Duration::from_millis(100));
    table.value(&key("touched")).unwrap();
    thread::sleep(Duration::from_millis(100));
    table.expiration_check();

    assert!(table.exists(&key("touched")));
    assert!(!table.exists(&key("idle")));
}

#[test]
fn test_expiration_callbacks_order() {
    let table = create_test_table();
    let fired = Arc::new(Mutex::new(Vec::new()));

    let log = fired.clone();
    table.add_about_to_delete_item_callback(move |item| {
        log.lock().push(format!("table:{}", item.key()));
    });

    let item = table.add(key("x"), Duration::from_millis(10), 0);
    for tag in ["f1", "f2"] {
        let log = fired.clone();
        item.add_about_to_expire_callback(move |k: &String| log.lock().push(format!("{}:{}", tag, k)));
    }

    thread::sleep(Duration::from_millis(30));
    assert_eq!(table.expiration_check().removed, 1);

    assert_eq!(*fired.lock(), vec!["table:x", "f1:x", "f2:x"]);
}

#[tokio::test]
async fn test_sweeper_with_config() {
    let config = Config {
        table_name: key("swept"),
        default_life_span: 0,
        sweep_interval: 1,
    };
    let table: Arc<CacheTable<String, i64>> = Arc::new(CacheTable::from_config(&config));
    table.add(key("short"), Duration::from_millis(100), 1);
    table.add(key("pinned"), config.default_life_span(), 2);

    let handle = spawn_sweeper_task(table.clone(), config.sweep_interval);
    tokio::time::sleep(Duration::from_millis(1500)).await;
    handle.abort();

    assert_eq!(table.name(), "swept");
    assert!(!table.exists(&key("short")));
    assert!(table.exists(&key("pinned")));
    assert_eq!(
        table.stats(),
        CacheStats {
            hits: 0,
            misses: 0,
            loads: 0,
            expirations: 1,
            total_entries: 1,
        }
    );
}
