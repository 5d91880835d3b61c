use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::hash::Hash;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use analysis_core::AnalysisError;
use futures_util::FutureExt;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Concurrent jobs per fan-out unless configured otherwise
pub const DEFAULT_POOL_WIDTH: usize = 10;

/// Run `job` once per key with at most `width` jobs in flight.
///
/// Every distinct key gets exactly one entry in the result. A job that errors
/// or panics only poisons its own entry; the call itself never fails.
/// A width of zero is treated as one.
pub async fn fan_out<K, T, F, Fut>(
    keys: impl IntoIterator<Item = K>,
    width: usize,
    job: F,
) -> HashMap<K, Result<T, AnalysisError>>
where
    K: Eq + Hash + Clone + Send + 'static,
    T: Send + 'static,
    F: Fn(K) -> Fut,
    Fut: Future<Output = Result<T, AnalysisError>> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(width.max(1)));
    let mut tasks = JoinSet::new();
    let mut requested: Vec<K> = Vec::new();
    let mut seen: HashSet<K> = HashSet::new();

    for key in keys {
        if !seen.insert(key.clone()) {
            continue;
        }
        requested.push(key.clone());

        let semaphore = Arc::clone(&semaphore);
        let fut = job(key.clone());
        tasks.spawn(async move {
            let result = match semaphore.acquire_owned().await {
                Ok(_permit) => match AssertUnwindSafe(fut).catch_unwind().await {
                    Ok(result) => result,
                    Err(panic) => Err(AnalysisError::Unknown(format!(
                        "job panicked: {}",
                        panic_message(panic.as_ref())
                    ))),
                },
                Err(e) => Err(AnalysisError::Unknown(e.to_string())),
            };
            (key, result)
        });
    }

    let mut results = HashMap::with_capacity(requested.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((key, result)) => {
                if let Err(e) = &result {
                    tracing::debug!("fan-out job failed: {}", e);
                }
                results.insert(key, result);
            }
            Err(e) => tracing::warn!("fan-out task did not complete: {}", e),
        }
    }

    for key in requested {
        results
            .entry(key)
            .or_insert_with(|| Err(AnalysisError::Unknown("job did not complete".to_string())));
    }
    results
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_every_key_gets_one_entry() {
        let keys: Vec<String> = (0..12).map(|i| format!("SYM{}", i)).collect();
        let results = fan_out(keys.clone(), 4, |key: String| async move {
            if key.ends_with('3') || key.ends_with('7') {
                Err(AnalysisError::ProviderError(format!("{} failed", key)))
            } else {
                Ok(key.len())
            }
        })
        .await;

        assert_eq!(results.len(), 12);
        let failed: Vec<&String> = results
            .iter()
            .filter(|(_, r)| r.is_err())
            .map(|(k, _)| k)
            .collect();
        assert_eq!(failed.len(), 2);
        assert!(results["SYM3"].is_err());
        assert!(results["SYM0"].is_ok());
    }

    #[tokio::test]
    async fn test_panic_is_contained() {
        let results = fan_out(vec![1u32, 2, 3], 2, |n| async move {
            if n == 2 {
                panic!("boom");
            }
            Ok(n * 10)
        })
        .await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[&1].as_ref().ok(), Some(&10));
        assert!(matches!(&results[&2], Err(AnalysisError::Unknown(msg)) if msg.contains("boom")));
        assert_eq!(results[&3].as_ref().ok(), Some(&30));
    }

    #[tokio::test]
    async fn test_width_bounds_concurrency() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let results = fan_out(0..20u32, 3, |n| {
            let in_flight = Arc::clone(&in_flight);
            let peak = Arc::clone(&peak);
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok(n)
            }
        })
        .await;

        assert_eq!(results.len(), 20);
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_zero_width_and_duplicates() {
        let results = fan_out(vec!["A", "B", "A"], 0, |k| async move { Ok(k.to_lowercase()) }).await;
        assert_eq!(results.len(), 2);
        assert_eq!(results["A"].as_ref().ok().map(String::as_str), Some("a"));
    }

    #[tokio::test]
    async fn test_large_repeated_key_list_runs_each_key_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let keys: Vec<usize> = (0..20_000).map(|i| i % 100).collect();

        let results = fan_out(keys, 10, |k| {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(k * 2)
            }
        })
        .await;

        assert_eq!(results.len(), 100);
        assert_eq!(calls.load(Ordering::SeqCst), 100);
        assert_eq!(results[&42].as_ref().ok(), Some(&84));
    }

    #[tokio::test]
    async fn test_empty_keys() {
        let results = fan_out(Vec::<String>::new(), 10, |_k| async { Ok(()) }).await;
        assert!(results.is_empty());
    }
}
