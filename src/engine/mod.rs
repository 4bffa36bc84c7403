//! The interval-overlay engine.
//!
//! [`RangeDb`] owns a [`RangeStore`] and maintains the boundary invariants:
//! walked from `-inf` to `+inf`, stored boundaries strictly alternate
//! between starting and ending an interval (a double counts as both), no two
//! boundaries share an address, and the two endpoints of an interval carry
//! the same reason. Every mutation reads a bounded neighbourhood of the
//! touched range and commits one atomic write batch.

mod insert;
mod lookup;
mod remove;
mod vicinity;

use std::net::Ipv4Addr;

use tokio::sync::RwLock;
use tracing::debug;

use crate::boundary::{Boundary, Point};
use crate::config::Config;
use crate::error::{Result, RiprError};
use crate::store::{RangeQuery, RangeStore, RedisStore, WriteBatch};

/// One stored interval, as reported by [`RangeDb::intervals`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeEntry {
    pub start: Ipv4Addr,
    pub end: Ipv4Addr,
    pub reason: String,
}

/// A reason-tagged IPv4 range database.
///
/// All operations of one `RangeDb` are serialised by an internal
/// reader-writer lock: lookups share the read side, mutations take the write
/// side and hold it across their store round trips. Multiple processes
/// writing to the same store are not coordinated; deploy a single writer.
pub struct RangeDb {
    store: Box<dyn RangeStore>,
    lock: RwLock<()>,
}

impl RangeDb {
    /// Connect to Redis with the given configuration and open the database.
    pub async fn connect(config: &Config) -> Result<Self> {
        let store = RedisStore::connect(config).await?;
        Self::open(Box::new(store)).await
    }

    /// Open the database over an already-constructed store, idempotently
    /// (re)creating the sentinel boundaries.
    pub async fn open(store: Box<dyn RangeStore>) -> Result<Self> {
        let db = Self {
            store,
            lock: RwLock::new(()),
        };
        db.init()
            .await
            .map_err(|e| RiprError::DatabaseInit(Box::new(e)))?;
        Ok(db)
    }

    /// Write the sentinel entries. Idempotent: the sentinels always carry
    /// the same scores, flags, and reasons.
    async fn init(&self) -> Result<()> {
        let mut batch = WriteBatch::new();
        Boundary::neg_inf().queue_insert(&mut batch);
        Boundary::pos_inf().queue_insert(&mut batch);
        self.store.apply(batch).await
    }

    /// Delete all stored content, then recreate the sentinels.
    pub async fn reset(&self) -> Result<()> {
        let _guard = self.lock.write().await;
        self.store.flush_all().await?;
        self.init().await
    }

    /// Delete all stored content, sentinels included. The database is
    /// unusable afterwards until [`RangeDb::reset`] runs.
    pub async fn flush(&self) -> Result<()> {
        let _guard = self.lock.write().await;
        self.store.flush_all().await
    }

    /// Enumerate all stored intervals in ascending order.
    ///
    /// Walking the boundaries validates the alternation and reason-pairing
    /// invariants; a violation surfaces as
    /// [`RiprError::DatabaseInconsistent`].
    pub async fn intervals(&self) -> Result<Vec<RangeEntry>> {
        let _guard = self.lock.read().await;

        let queries = [RangeQuery::Asc {
            min: Point::NegInf,
            max: Point::PosInf,
            limit: None,
        }];
        let mut replies = self.store.range_scores(&queries).await?;
        let entries = replies.pop().unwrap_or_default();

        let ids: Vec<String> = entries.iter().map(|e| e.id.clone()).collect();
        let attrs = self.store.get_attrs(&ids).await?;
        if attrs.len() != entries.len() {
            return Err(RiprError::DatabaseInconsistent(format!(
                "hydrated {} of {} boundaries",
                attrs.len(),
                entries.len()
            )));
        }

        let boundaries: Vec<Boundary> = entries
            .iter()
            .zip(attrs.iter())
            .map(|(entry, attrs)| Boundary::decode(entry.point, attrs))
            .collect();
        debug!(count = boundaries.len(), "walking stored boundaries");

        pair_intervals(&boundaries)
    }
}

/// Pair a sorted boundary walk into intervals, enforcing alternation and
/// reason agreement along the way.
fn pair_intervals(boundaries: &[Boundary]) -> Result<Vec<RangeEntry>> {
    let mut intervals = Vec::new();
    let mut open: Option<&Boundary> = None;

    for b in boundaries {
        let Some(addr) = b.point.addr() else {
            // sentinels pin the walk but never delimit real intervals
            continue;
        };

        match open {
            None => {
                if b.is_double() {
                    intervals.push(RangeEntry {
                        start: addr,
                        end: addr,
                        reason: b.reason.clone(),
                    });
                } else if b.is_lower() {
                    open = Some(b);
                } else if b.is_upper() {
                    return Err(RiprError::DatabaseInconsistent(format!(
                        "interval end {b} without a start"
                    )));
                } else {
                    return Err(RiprError::DatabaseInconsistent(format!(
                        "boundary {b} has no flags set"
                    )));
                }
            }
            Some(start) => {
                if b.is_upper() {
                    if start.reason != b.reason {
                        return Err(RiprError::DatabaseInconsistent(format!(
                            "reason mismatch between {start} and {b}"
                        )));
                    }
                    let Some(start_addr) = start.point.addr() else {
                        return Err(RiprError::DatabaseInconsistent(
                            "interval opened by a sentinel".to_string(),
                        ));
                    };
                    intervals.push(RangeEntry {
                        start: start_addr,
                        end: addr,
                        reason: b.reason.clone(),
                    });
                    open = None;
                } else {
                    return Err(RiprError::DatabaseInconsistent(format!(
                        "two interval starts in a row: {start} then {b}"
                    )));
                }
            }
        }
    }

    if let Some(start) = open {
        return Err(RiprError::DatabaseInconsistent(format!(
            "interval starting at {start} never ends"
        )));
    }
    Ok(intervals)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(ip: u32, lower: bool, upper: bool, reason: &str) -> Boundary {
        Boundary::new(Point::Ip(ip), reason, lower, upper)
    }

    #[test]
    fn test_pair_intervals_simple() {
        let walk = vec![
            Boundary::neg_inf(),
            b(10, true, false, "a"),
            b(20, false, true, "a"),
            b(21, true, true, "b"),
            Boundary::pos_inf(),
        ];
        let intervals = pair_intervals(&walk).unwrap();
        assert_eq!(intervals.len(), 2);
        assert_eq!(intervals[0].reason, "a");
        assert_eq!(intervals[1].start, intervals[1].end);
        assert_eq!(intervals[1].reason, "b");
    }

    #[test]
    fn test_pair_intervals_rejects_double_start() {
        let walk = vec![b(10, true, false, "a"), b(20, true, false, "a")];
        assert!(matches!(
            pair_intervals(&walk),
            Err(RiprError::DatabaseInconsistent(_))
        ));
    }

    #[test]
    fn test_pair_intervals_rejects_unmatched_end() {
        let walk = vec![b(20, false, true, "a")];
        assert!(matches!(
            pair_intervals(&walk),
            Err(RiprError::DatabaseInconsistent(_))
        ));
    }

    #[test]
    fn test_pair_intervals_rejects_reason_mismatch() {
        let walk = vec![b(10, true, false, "a"), b(20, false, true, "z")];
        assert!(matches!(
            pair_intervals(&walk),
            Err(RiprError::DatabaseInconsistent(_))
        ));
    }

    #[test]
    fn test_pair_intervals_rejects_dangling_start() {
        let walk = vec![b(10, true, false, "a")];
        assert!(matches!(
            pair_intervals(&walk),
            Err(RiprError::DatabaseInconsistent(_))
        ));
    }

    mod store_failures {
        use super::*;
        use crate::store::MockRangeStore;

        fn io_err() -> redis::RedisError {
            redis::RedisError::from((redis::ErrorKind::IoError, "connection lost"))
        }

        fn mock_with_init() -> MockRangeStore {
            let mut mock = MockRangeStore::new();
            mock.expect_apply().times(1).returning(|_| Ok(()));
            mock
        }

        #[tokio::test]
        async fn test_open_wraps_init_failure() {
            let mut mock = MockRangeStore::new();
            mock.expect_apply()
                .times(1)
                .returning(|_| Err(RiprError::Store(io_err())));

            let result = RangeDb::open(Box::new(mock)).await;
            assert!(matches!(result, Err(RiprError::DatabaseInit(_))));
        }

        #[tokio::test]
        async fn test_insert_propagates_read_failure() {
            let mut mock = mock_with_init();
            mock.expect_range_scores()
                .times(1)
                .returning(|_| Err(RiprError::NoResult(io_err())));

            let db = RangeDb::open(Box::new(mock)).await.unwrap();
            let result = db.insert("10.0.0.0/24", "x").await;
            assert!(matches!(result, Err(RiprError::NoResult(_))));
        }

        #[tokio::test]
        async fn test_parse_error_surfaces_before_any_store_call() {
            // only the init batch is expected; a range_scores call would
            // fail the mock
            let mock = mock_with_init();
            let db = RangeDb::open(Box::new(mock)).await.unwrap();

            let result = db.insert("not a range", "x").await;
            assert!(matches!(result, Err(RiprError::InvalidRange)));
        }

        #[tokio::test]
        async fn test_missing_sentinels_detected() {
            let mut mock = mock_with_init();
            mock.expect_range_scores()
                .times(1)
                .returning(|_| Ok(vec![Vec::new(), Vec::new(), Vec::new()]));
            mock.expect_get_attrs().returning(|_| Ok(Vec::new()));

            let db = RangeDb::open(Box::new(mock)).await.unwrap();
            let result = db.insert("10.0.0.0/24", "x").await;
            assert!(matches!(result, Err(RiprError::DatabaseInconsistent(_))));
        }
    }
}
