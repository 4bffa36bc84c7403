//! The vicinity query, the engine's single read primitive.

use crate::boundary::{Boundary, Point};
use crate::error::{Result, RiprError};
use crate::store::RangeQuery;

use super::RangeDb;

/// The hydrated neighbourhood of a candidate range.
#[derive(Debug)]
pub(crate) struct Vicinity {
    /// Nearest boundaries strictly below the range, ascending.
    pub below: Vec<Boundary>,
    /// All boundaries inside the range, ascending.
    pub inside: Vec<Boundary>,
    /// Nearest boundaries strictly above the range, ascending.
    pub above: Vec<Boundary>,
}

impl RangeDb {
    /// Fetch the `n` nearest boundaries strictly below `low`, every boundary
    /// in `[low, high]`, and the `n` nearest strictly above `high`, fully
    /// hydrated. Exactly two store round trips: one batch of three range
    /// queries, one batch hydrating the returned ids.
    pub(crate) async fn vicinity(&self, low: Point, high: Point, n: usize) -> Result<Vicinity> {
        let queries = [
            RangeQuery::Desc {
                min: Point::NegInf,
                max: low.below(),
                limit: Some(n),
            },
            RangeQuery::Asc {
                min: low,
                max: high,
                limit: None,
            },
            RangeQuery::Asc {
                min: high.above(),
                max: Point::PosInf,
                limit: Some(n),
            },
        ];

        let mut replies = self.store.range_scores(&queries).await?;
        let mut above_entries = replies.pop().unwrap_or_default();
        let mut inside_entries = replies.pop().unwrap_or_default();
        let mut below_entries = replies.pop().unwrap_or_default();

        // the below query answers nearest-first; everything is handed out
        // ascending
        below_entries.sort_by_key(|e| e.point);
        inside_entries.sort_by_key(|e| e.point);
        above_entries.sort_by_key(|e| e.point);

        let ids: Vec<String> = below_entries
            .iter()
            .chain(inside_entries.iter())
            .chain(above_entries.iter())
            .map(|e| e.id.clone())
            .collect();
        let attrs = self.store.get_attrs(&ids).await?;
        if attrs.len() != ids.len() {
            return Err(RiprError::DatabaseInconsistent(format!(
                "hydrated {} of {} boundaries",
                attrs.len(),
                ids.len()
            )));
        }

        let mut hydrated = below_entries
            .iter()
            .chain(inside_entries.iter())
            .chain(above_entries.iter())
            .zip(attrs.iter())
            .map(|(entry, attrs)| Boundary::decode(entry.point, attrs));

        let below: Vec<Boundary> = hydrated.by_ref().take(below_entries.len()).collect();
        let inside: Vec<Boundary> = hydrated.by_ref().take(inside_entries.len()).collect();
        let above: Vec<Boundary> = hydrated.collect();

        Ok(Vicinity {
            below,
            inside,
            above,
        })
    }
}
