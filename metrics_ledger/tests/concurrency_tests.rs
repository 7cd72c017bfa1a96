use std::sync::{Arc, Barrier};
use std::thread;

use metrics_ledger::{LedgerStore, MetricValue, Metrics, CANONICAL_METRICS};
use tempfile::TempDir;

#[test]
fn concurrent_disjoint_upserts_on_one_test_lose_nothing() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().to_path_buf();
    let barrier = Arc::new(Barrier::new(CANONICAL_METRICS.len()));

    // One writer per canonical metric, each with its own store value so only
    // the shared lock registry keeps them apart.
    let handles: Vec<_> = CANONICAL_METRICS
        .iter()
        .enumerate()
        .map(|(idx, metric)| {
            let root = root.clone();
            let barrier = Arc::clone(&barrier);
            let name = metric.as_str().to_string();
            thread::spawn(move || {
                let store = LedgerStore::open(root);
                let metrics = Metrics::from([(name, MetricValue::Integer(idx as i64 + 1))]);
                barrier.wait();
                store
                    .upsert(Some("2024.3"), "testConcurrent", &metrics)
                    .expect("upsert");
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("writer thread");
    }

    let store = LedgerStore::open(&root);
    let table = store.load(Some("2024.3")).unwrap().unwrap();
    assert_eq!(table.len(), 1);
    for (idx, metric) in CANONICAL_METRICS.iter().enumerate() {
        assert_eq!(
            table.cell("testConcurrent", metric.as_str()),
            Some((idx + 1).to_string().as_str()),
            "{} lost",
            metric
        );
    }
}

#[test]
fn concurrent_writes_to_different_partitions_stay_separate() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().to_path_buf();

    let handles: Vec<_> = ["2024.3", "2025.1", "2025.2"]
        .into_iter()
        .map(|label| {
            let root = root.clone();
            thread::spawn(move || {
                let store = LedgerStore::open(root);
                for i in 0..10i64 {
                    let metrics = Metrics::from([(
                        "ExecutionTimeMs".to_string(),
                        MetricValue::Integer(i),
                    )]);
                    store
                        .upsert(Some(label), &format!("test{}", i), &metrics)
                        .expect("upsert");
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("writer thread");
    }

    let store = LedgerStore::open(&root);
    assert_eq!(store.partitions().unwrap(), vec!["2024.3", "2025.1", "2025.2"]);
    for label in ["2024.3", "2025.1", "2025.2"] {
        assert_eq!(store.load(Some(label)).unwrap().unwrap().len(), 10);
    }
}
