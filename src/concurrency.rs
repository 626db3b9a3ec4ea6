//! Bounded fan-out for outbound calls (push delivery, CDN uploads).
//!
//! A fixed window of `limit` tasks is kept in flight with a semaphore; the
//! batch-and-drain shape this replaces could stall on stragglers and returned
//! results in completion order. Results here come back in input order, and the
//! first failure aborts the rest of the batch.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub async fn run_limited<T, E, F, Fut>(limit: usize, thunks: Vec<F>) -> Result<Vec<T>, E>
where
    T: Send + 'static,
    E: Send + 'static,
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    let total = thunks.len();
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));
    let mut set = JoinSet::new();

    for (index, thunk) in thunks.into_iter().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        set.spawn(async move {
            // A closed semaphore means the batch was aborted before this
            // task got a slot.
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return Err(None);
            };
            match thunk().await {
                Ok(value) => Ok((index, value)),
                Err(err) => Err(Some(err)),
            }
        });
    }

    let mut slots: Vec<Option<T>> = Vec::with_capacity(total);
    slots.resize_with(total, || None);
    let mut first_error: Option<E> = None;

    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(Ok((index, value))) => {
                slots[index] = Some(value);
            }
            Ok(Err(Some(err))) => {
                if first_error.is_none() {
                    first_error = Some(err);
                    semaphore.close();
                }
            }
            // Err(None): task never started because the batch aborted.
            Ok(Err(None)) => {}
            Err(join_err) => {
                if join_err.is_panic() {
                    std::panic::resume_unwind(join_err.into_panic());
                }
            }
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(slots.into_iter().flatten().collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn results_come_back_in_input_order() {
        let thunks: Vec<_> = (0..8u64)
            .map(|i| {
                move || async move {
                    // Later inputs finish earlier.
                    tokio::time::sleep(Duration::from_millis(80 - i * 10)).await;
                    Ok::<u64, ()>(i)
                }
            })
            .collect();

        let results = run_limited(4, thunks).await.unwrap();
        assert_eq!(results, (0..8).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn never_exceeds_the_window() {
        static IN_FLIGHT: AtomicUsize = AtomicUsize::new(0);
        static PEAK: AtomicUsize = AtomicUsize::new(0);

        let thunks: Vec<_> = (0..20)
            .map(|_| {
                move || async move {
                    let now = IN_FLIGHT.fetch_add(1, Ordering::SeqCst) + 1;
                    PEAK.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    IN_FLIGHT.fetch_sub(1, Ordering::SeqCst);
                    Ok::<(), ()>(())
                }
            })
            .collect();

        run_limited(3, thunks).await.unwrap();
        assert!(PEAK.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn error_aborts_the_batch() {
        let thunks: Vec<_> = (0..6)
            .map(|i| {
                move || async move {
                    if i == 2 {
                        Err("boom")
                    } else {
                        tokio::time::sleep(Duration::from_millis(5)).await;
                        Ok(i)
                    }
                }
            })
            .collect();

        let result = run_limited(2, thunks).await;
        assert_eq!(result.unwrap_err(), "boom");
    }

    #[tokio::test]
    async fn empty_input_is_fine() {
        let thunks: Vec<fn() -> std::future::Ready<Result<(), ()>>> = Vec::new();
        assert_eq!(run_limited(4, thunks).await.unwrap().len(), 0);
    }
}
