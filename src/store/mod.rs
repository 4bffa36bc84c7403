//! Backing-store abstraction.
//!
//! The engine sees the store as two structures: an ordered map from score
//! (the integer form of an address, or one of the infinities) to boundary id,
//! and one small field map per id holding the `low`/`high` flags and the
//! reason. Reads are batched range queries plus a bulk hydration; writes are
//! queued into a [`WriteBatch`] and executed atomically.

mod memory;
mod redis;

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use crate::boundary::Point;
use crate::error::Result;

pub use memory::MemoryStore;
pub use self::redis::RedisStore;

/// Name of the ordered-map key holding all boundary scores, unless
/// overridden at construction time. The literal matches what existing
/// deployments already have on disk.
pub const DEFAULT_RANGES_KEY: &str = "________________IP_RANGES________________";

/// One `(score, member)` entry returned by an ordered-map range query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreEntry {
    pub point: Point,
    pub id: String,
}

/// Raw, undecoded attribute fields for one boundary id.
///
/// `None` means the field (or the whole record) is absent. Decoding the
/// string forms is the boundary codec's job, not the store's.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawAttrs {
    pub lower: Option<String>,
    pub upper: Option<String>,
    pub reason: Option<String>,
}

/// An ordered-map range query. Bounds are inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeQuery {
    /// Entries with `min <= score <= max`, ascending, at most `limit`.
    Asc {
        min: Point,
        max: Point,
        limit: Option<usize>,
    },
    /// Entries with `min <= score <= max`, descending from `max`, at most
    /// `limit`.
    Desc {
        min: Point,
        max: Point,
        limit: Option<usize>,
    },
}

/// A single queued write command.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    AddScore { id: String, point: Point },
    RemoveScore { id: String },
    SetAttrs {
        id: String,
        lower: bool,
        upper: bool,
        reason: String,
    },
    DeleteAttrs { id: String },
}

/// An ordered batch of write commands, executed atomically by the store.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: WriteOp) {
        self.ops.push(op);
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }
}

/// The store operations the engine consumes.
///
/// Implementations must make [`RangeStore::apply`] atomic: either every
/// queued command takes effect or none does. The engine's consistency
/// invariants depend on it.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RangeStore: Send + Sync {
    /// Execute the given range queries in one transactional batch and return
    /// one result list per query, in query order.
    async fn range_scores(&self, queries: &[RangeQuery]) -> Result<Vec<Vec<ScoreEntry>>>;

    /// Bulk-fetch the attribute maps for the given ids in one batch,
    /// returning one [`RawAttrs`] per id, in id order.
    async fn get_attrs(&self, ids: &[String]) -> Result<Vec<RawAttrs>>;

    /// Apply all queued writes atomically.
    async fn apply(&self, batch: WriteBatch) -> Result<()>;

    /// Drop every key the store holds, sentinels included.
    async fn flush_all(&self) -> Result<()>;
}
