//! In-memory store implementation.
//!
//! Backs the test suite and the benchmark, and works as an embedded store
//! for callers that do not want a server. Observable behavior matches the
//! Redis implementation: same ordering, same limits, same atomicity of a
//! write batch (trivially, under one lock).

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::boundary::Point;
use crate::error::Result;

use super::{RangeQuery, RangeStore, RawAttrs, ScoreEntry, WriteBatch, WriteOp};

#[derive(Default)]
struct Inner {
    scores: BTreeMap<Point, String>,
    attrs: HashMap<String, RawAttrs>,
}

/// A [`RangeStore`] kept entirely in process memory.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn flag_str(v: bool) -> String {
    if v { "1".to_string() } else { "0".to_string() }
}

#[async_trait]
impl RangeStore for MemoryStore {
    async fn range_scores(&self, queries: &[RangeQuery]) -> Result<Vec<Vec<ScoreEntry>>> {
        let inner = self.inner.lock().unwrap();
        let mut results = Vec::with_capacity(queries.len());

        for query in queries {
            let (min, max, limit, descending) = match query {
                RangeQuery::Asc { min, max, limit } => (*min, *max, *limit, false),
                RangeQuery::Desc { min, max, limit } => (*min, *max, *limit, true),
            };
            if min > max {
                results.push(Vec::new());
                continue;
            }

            let matched = inner.scores.range(min..=max).map(|(point, id)| ScoreEntry {
                point: *point,
                id: id.clone(),
            });
            let entries: Vec<ScoreEntry> = if descending {
                let mut entries: Vec<ScoreEntry> = matched.rev().collect();
                if let Some(n) = limit {
                    entries.truncate(n);
                }
                entries
            } else {
                let mut entries: Vec<ScoreEntry> = matched.collect();
                if let Some(n) = limit {
                    entries.truncate(n);
                }
                entries
            };
            results.push(entries);
        }

        Ok(results)
    }

    async fn get_attrs(&self, ids: &[String]) -> Result<Vec<RawAttrs>> {
        let inner = self.inner.lock().unwrap();
        Ok(ids
            .iter()
            .map(|id| inner.attrs.get(id).cloned().unwrap_or_default())
            .collect())
    }

    async fn apply(&self, batch: WriteBatch) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        for op in batch.ops() {
            match op {
                WriteOp::AddScore { id, point } => {
                    inner.scores.insert(*point, id.clone());
                }
                WriteOp::RemoveScore { id } => {
                    inner.scores.retain(|_, member| member != id);
                }
                WriteOp::SetAttrs {
                    id,
                    lower,
                    upper,
                    reason,
                } => {
                    inner.attrs.insert(
                        id.clone(),
                        RawAttrs {
                            lower: Some(flag_str(*lower)),
                            upper: Some(flag_str(*upper)),
                            reason: Some(reason.clone()),
                        },
                    );
                }
                WriteOp::DeleteAttrs { id } => {
                    inner.attrs.remove(id);
                }
            }
        }
        Ok(())
    }

    async fn flush_all(&self) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.scores.clear();
        inner.attrs.clear();
        Ok(())
    }
}
