//! Closure transaction API
//!
//! `transaction(f)` runs `f` against a fresh snapshot, then commits the
//! buffered writes if `f` returned `Ok`. Any error from `f` or from commit
//! aborts the transaction and nothing is applied. A panic in `f` unwinds
//! through the engine and also applies nothing. There is no automatic retry.

use std::time::Duration;

use tracing::debug;

use seatbook_concurrency::TransactionContext;
use seatbook_core::Error;

use super::Engine;

impl Engine {
    /// Execute a transaction with the configured commit timeout
    ///
    /// # Example
    /// ```text
    /// let previous = engine.transaction(|txn| {
    ///     let val = txn.get(&key)?;
    ///     txn.put(key, new_value)?;
    ///     Ok::<_, Error>(val)
    /// })?;
    /// ```
    ///
    /// # Errors
    /// - whatever `f` returns
    /// - `Error::EngineConflict` if data read by `f` changed before commit
    /// - `Error::EngineTimeout` if the commit lock wait exceeds the timeout
    /// - `Error::EngineClosed` if the engine is closed
    pub fn transaction<F, T, E>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut TransactionContext) -> std::result::Result<T, E>,
        E: From<Error>,
    {
        self.transaction_with_timeout(self.config.commit_timeout(), f)
    }

    /// Execute a transaction with an explicit bound on the commit-lock wait
    pub fn transaction_with_timeout<F, T, E>(
        &self,
        timeout: Duration,
        f: F,
    ) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut TransactionContext) -> std::result::Result<T, E>,
        E: From<Error>,
    {
        self.check_accepting()?;
        let (mut txn, in_flight) = self.coordinator.start_transaction(&self.storage);

        match f(&mut txn) {
            Ok(value) => {
                if let Err(e) = self.check_accepting() {
                    let _ = txn.mark_aborted("Engine closed before commit".to_string());
                    return Err(e.into());
                }
                in_flight.commit(&mut txn, &self.storage, timeout)?;
                Ok(value)
            }
            Err(e) => {
                let _ = txn.mark_aborted("Closure error".to_string());
                debug!(target: "seatbook::txn", txn_id = txn.txn_id, "Transaction rolled back by caller");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seatbook_core::{Key, SnapshotView};

    fn key(s: &str) -> Key {
        Key::from(s)
    }

    #[test]
    fn test_commit_makes_writes_visible() {
        let engine = Engine::open().unwrap();
        engine
            .transaction(|txn| {
                txn.put(key("a"), b"1".to_vec())?;
                txn.put(key("b"), b"2".to_vec())
            })
            .unwrap();

        let snapshot = engine.snapshot().unwrap();
        assert_eq!(snapshot.get(&key("a")).unwrap().unwrap().value, b"1".to_vec());
        assert_eq!(snapshot.get(&key("b")).unwrap().unwrap().version, 1);
        assert_eq!(engine.metrics().total_committed, 1);
    }

    #[test]
    fn test_closure_error_applies_nothing() {
        let engine = Engine::open().unwrap();
        let result: Result<(), Error> = engine.transaction(|txn| {
            txn.put(key("a"), b"1".to_vec())?;
            Err(Error::invalid_input("caller gave up"))
        });

        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert!(engine.snapshot().unwrap().get(&key("a")).unwrap().is_none());
        assert_eq!(engine.metrics().total_aborted, 1);
        assert_eq!(engine.current_version(), 0);
    }

    #[test]
    fn test_returns_closure_value() {
        let engine = Engine::open().unwrap();
        engine
            .transaction(|txn| txn.put(key("n"), b"7".to_vec()))
            .unwrap();

        let read = engine
            .transaction(|txn| txn.get(&key("n")))
            .unwrap();
        assert_eq!(read, Some(b"7".to_vec()));
    }

    #[test]
    fn test_custom_error_type() {
        #[derive(Debug)]
        enum AppError {
            Engine(Error),
            Rejected,
        }
        impl From<Error> for AppError {
            fn from(e: Error) -> Self {
                AppError::Engine(e)
            }
        }

        let engine = Engine::open().unwrap();
        let result: Result<(), AppError> = engine.transaction(|txn| {
            txn.put(key("x"), vec![1])?;
            Err(AppError::Rejected)
        });
        assert!(matches!(result, Err(AppError::Rejected)));

        engine.close();
        let result: Result<(), AppError> = engine.transaction(|_| Ok(()));
        assert!(matches!(result, Err(AppError::Engine(Error::EngineClosed))));
    }

    #[test]
    fn test_timeout_applies_nothing() {
        let engine = Engine::open().unwrap();
        let guard = engine.pause_commits();

        let result = engine.transaction_with_timeout(Duration::from_millis(20), |txn| {
            txn.put(key("late"), vec![1])
        });
        drop(guard);

        assert!(matches!(result, Err(Error::EngineTimeout(_))));
        assert!(engine.snapshot().unwrap().get(&key("late")).unwrap().is_none());
    }

    #[test]
    fn test_scan_prefix_inside_transaction() {
        let engine = Engine::open().unwrap();
        engine
            .transaction(|txn| {
                txn.put(key("seats/1/A1"), vec![])?;
                txn.put(key("seats/1/B1"), vec![])?;
                txn.put(key("seats/10/A1"), vec![])
            })
            .unwrap();

        let keys = engine
            .transaction(|txn| {
                txn.put(key("seats/1/C1"), vec![])?;
                txn.scan_prefix(&key("seats/1/"))
            })
            .unwrap()
            .into_iter()
            .map(|(k, _)| k.to_string())
            .collect::<Vec<_>>();
        assert_eq!(keys, vec!["seats/1/A1", "seats/1/B1", "seats/1/C1"]);
    }

    #[test]
    fn test_panicking_closure_settles_transaction() {
        let engine = Engine::open_with_config(
            crate::EngineConfig::default().with_commit_timeout(Duration::from_secs(30)),
        )
        .unwrap();

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _: Result<(), Error> = engine.transaction(|txn| {
                txn.put(key("half"), vec![1])?;
                panic!("closure blew up");
            });
        }));
        assert!(outcome.is_err());

        let metrics = engine.metrics();
        assert_eq!(metrics.active_count, 0);
        assert_eq!(metrics.total_aborted, 1);
        assert!(engine.snapshot().unwrap().get(&key("half")).unwrap().is_none());

        let started = std::time::Instant::now();
        engine.close();
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_transaction_after_close() {
        let engine = Engine::open().unwrap();
        engine.close();
        let err = engine
            .transaction(|txn| txn.put(key("a"), vec![]))
            .unwrap_err();
        assert!(err.is_closed());
    }
}
