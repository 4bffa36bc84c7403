//! The Remove planner.
//!
//! Structurally an insert without a reason: every boundary inside the range
//! is deleted outright, and an interval the range cuts into is ended one
//! address before it and restarted one address after it.

use tracing::debug;

use crate::boundary::{Boundary, Point};
use crate::error::{Result, RiprError};
use crate::range;
use crate::store::WriteBatch;

use super::RangeDb;

impl RangeDb {
    /// Remove a range.
    ///
    /// Intervals fully inside the range vanish; an interval reaching into
    /// the range from either side keeps its outside part, same reason.
    /// Removing addresses that are not stored is a successful no-op.
    pub async fn remove(&self, range: &str) -> Result<()> {
        let (start, end) = range::parse_range(range)?;
        let _guard = self.lock.write().await;

        let low = Point::from(start);
        let high = Point::from(end);
        let v = self.vicinity(low, high, 1).await?;

        let Some(mut below_nearest) = v.below.last().cloned() else {
            return Err(RiprError::DatabaseInconsistent(
                "no boundary below the range; sentinels missing".to_string(),
            ));
        };
        let Some(mut above_nearest) = v.above.first().cloned() else {
            return Err(RiprError::DatabaseInconsistent(
                "no boundary above the range; sentinels missing".to_string(),
            ));
        };

        let mut batch = WriteBatch::new();
        for b in &v.inside {
            b.queue_remove(&mut batch);
        }

        if below_nearest.is_lower() {
            // the range cuts into an interval reaching in from below; end it
            // one address before the range
            let below_cut = Boundary::new(low.below(), &below_nearest.reason, false, true);
            if !below_nearest.same_ip(&below_cut) {
                below_cut.queue_insert(&mut batch);
            } else {
                // the surviving head is exactly one address
                below_nearest.set_double();
                below_nearest.queue_insert(&mut batch);
            }
        }

        if above_nearest.is_upper() {
            // the range cuts into an interval reaching out above; restart it
            // one address after the range
            let above_cut = Boundary::new(high.above(), &above_nearest.reason, true, false);
            if !above_nearest.same_ip(&above_cut) {
                above_cut.queue_insert(&mut batch);
            } else {
                // the surviving tail is exactly one address
                above_nearest.set_double();
                above_nearest.queue_insert(&mut batch);
            }
        }

        debug!(range = %range, ops = batch.len(), "applying remove batch");
        self.store.apply(batch).await
    }
}
