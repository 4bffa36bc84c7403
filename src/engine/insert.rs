//! The Insert planner.
//!
//! One vicinity query bounds the work: the only boundaries an insert can
//! affect are those inside the new range (all subsumed) and the single
//! nearest neighbour on each side, which decides whether the range merges
//! with, cuts into, or stays clear of an existing interval.

use tracing::debug;

use crate::boundary::{Boundary, Point};
use crate::error::{Result, RiprError};
use crate::range;
use crate::store::WriteBatch;

use super::RangeDb;

impl RangeDb {
    /// Insert a range with an associated reason.
    ///
    /// `range` accepts the forms of [`crate::range::parse_range`]. The new
    /// range may overlap, abut, or subsume existing intervals in any
    /// combination; the stored set stays disjoint and consistently tagged,
    /// and a later insert wins over whatever it overlaps. Inserting the same
    /// range and reason twice is a no-op.
    pub async fn insert(&self, range: &str, reason: &str) -> Result<()> {
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

        // everything inside the new range is subsumed or about to be
        // re-expressed by the cuts below
        for b in &v.inside {
            b.queue_remove(&mut batch);
        }

        let new_lower = Boundary::new(low, reason, true, false);
        let new_upper = Boundary::new(high, reason, false, true);

        // candidate cuts one address outside the range, carrying the
        // neighbour's reason
        let mut below_cut = new_lower.below();
        below_cut.set_upper();
        below_cut.reason = below_nearest.reason.clone();

        let mut above_cut = new_upper.above();
        above_cut.set_lower();
        above_cut.reason = above_nearest.reason.clone();

        let mut insert_lower = true;
        let mut insert_upper = true;

        if below_nearest.is_lower() {
            // the new range starts inside an open interval
            if !below_nearest.same_ip(&below_cut) {
                if !below_nearest.same_reason(&new_lower) {
                    // close the open interval one address before the range
                    below_cut.queue_insert(&mut batch);
                } else {
                    // same reason: the new range extends the interval leftward
                    insert_lower = false;
                }
            } else {
                // the open interval starts exactly one address before the
                // range, no room for a cut
                if !below_nearest.same_reason(&new_lower) {
                    below_nearest.set_double();
                    below_nearest.queue_insert(&mut batch);
                } else {
                    insert_lower = false;
                }
            }
        } else if below_nearest.is_double()
            && below_nearest.same_ip(&below_cut)
            && below_nearest.same_reason(&new_lower)
        {
            // adjacent one-address interval with the same reason becomes the
            // start of the merged interval
            below_nearest.set_lower();
            below_nearest.queue_insert(&mut batch);
            insert_lower = false;
        }

        if above_nearest.is_upper() {
            // the new range ends inside an open interval
            if !above_nearest.same_ip(&above_cut) {
                if !above_nearest.same_reason(&new_upper) {
                    // restart the surviving tail one address after the range
                    above_cut.queue_insert(&mut batch);
                } else {
                    insert_upper = false;
                }
            } else {
                if !above_nearest.same_reason(&new_upper) {
                    above_nearest.set_double();
                    above_nearest.queue_insert(&mut batch);
                } else {
                    insert_upper = false;
                }
            }
        } else if above_nearest.is_double()
            && above_nearest.same_ip(&above_cut)
            && above_nearest.same_reason(&new_upper)
        {
            above_nearest.set_upper();
            above_nearest.queue_insert(&mut batch);
            insert_upper = false;
        }

        match (insert_lower, insert_upper) {
            (true, true) if low == high => {
                let mut double = new_lower;
                double.set_double();
                double.queue_insert(&mut batch);
            }
            (true, true) => {
                new_lower.queue_insert(&mut batch);
                new_upper.queue_insert(&mut batch);
            }
            (true, false) => new_lower.queue_insert(&mut batch),
            (false, true) => new_upper.queue_insert(&mut batch),
            (false, false) => {}
        }

        debug!(range = %range, reason = %reason, ops = batch.len(), "applying insert batch");
        self.store.apply(batch).await
    }
}
