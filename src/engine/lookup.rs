//! Find and UpdateReasonOf.

use crate::boundary::Point;
use crate::error::{Result, RiprError};
use crate::range;
use crate::store::WriteBatch;

use super::RangeDb;

impl RangeDb {
    /// Look up the reason applying to a single address.
    ///
    /// Returns [`RiprError::IpNotFound`] when no stored interval contains
    /// the address, and [`RiprError::DatabaseInconsistent`] when the stored
    /// boundaries around it contradict each other.
    pub async fn find(&self, ip: &str) -> Result<String> {
        let addr = range::parse_ip(ip)?;
        let _guard = self.lock.read().await;

        let point = Point::from(addr);
        let v = self.vicinity(point, point, 1).await?;

        // an exact boundary hit means the address is the first or last of an
        // interval, one-address intervals included
        if let [hit] = v.inside.as_slice() {
            if hit.lower || hit.upper {
                return Ok(hit.reason.clone());
            }
            return Err(RiprError::DatabaseInconsistent(format!(
                "boundary {hit} has no flags set"
            )));
        }
        if v.inside.len() > 1 {
            return Err(RiprError::DatabaseInconsistent(
                "multiple boundaries share one address".to_string(),
            ));
        }

        let (Some(below_nearest), Some(above_nearest)) = (v.below.last(), v.above.first()) else {
            return Err(RiprError::DatabaseInconsistent(
                "sentinel boundaries missing".to_string(),
            ));
        };

        if below_nearest.is_lower() && above_nearest.is_upper() {
            if below_nearest.same_reason(above_nearest) {
                return Ok(below_nearest.reason.clone());
            }
            return Err(RiprError::DatabaseInconsistent(format!(
                "reasons disagree between {below_nearest} and {above_nearest}"
            )));
        }

        Err(RiprError::IpNotFound)
    }

    /// Rewrite the reason of the interval containing `ip`.
    ///
    /// The closure receives the interval's current reason and returns the
    /// new one; both endpoints are rewritten in one atomic batch. Fails with
    /// [`RiprError::IpNotFound`] when no interval contains the address.
    pub async fn update_reason_of<F>(&self, ip: &str, update: F) -> Result<()>
    where
        F: FnOnce(&str) -> String + Send,
    {
        let addr = range::parse_ip(ip)?;
        let _guard = self.lock.write().await;

        let point = Point::from(addr);
        let v = self.vicinity(point, point, 1).await?;

        let (Some(below_nearest), Some(above_nearest)) = (v.below.last(), v.above.first()) else {
            return Err(RiprError::DatabaseInconsistent(
                "sentinel boundaries missing".to_string(),
            ));
        };

        let mut batch = WriteBatch::new();

        match v.inside.as_slice() {
            // one-address interval: a single record carries both endpoints
            [hit] if hit.is_double() => {
                let new_reason = update(&hit.reason);
                let mut hit = hit.clone();
                hit.reason = new_reason;
                hit.queue_update(&mut batch);
            }
            // the address is the first of an interval; its end is the next
            // boundary above
            [hit] if hit.is_lower() => {
                if !above_nearest.is_upper() {
                    return Err(RiprError::DatabaseInconsistent(format!(
                        "two interval starts in a row: {hit} then {above_nearest}"
                    )));
                }
                let new_reason = update(&hit.reason);
                let mut start = hit.clone();
                start.reason = new_reason.clone();
                start.queue_update(&mut batch);
                let mut end = above_nearest.clone();
                end.reason = new_reason;
                end.queue_update(&mut batch);
            }
            // the address is the last of an interval; its start is the next
            // boundary below
            [hit] if hit.is_upper() => {
                if !below_nearest.is_lower() {
                    return Err(RiprError::DatabaseInconsistent(format!(
                        "two interval ends in a row: {below_nearest} then {hit}"
                    )));
                }
                let new_reason = update(&hit.reason);
                let mut start = below_nearest.clone();
                start.reason = new_reason.clone();
                start.queue_update(&mut batch);
                let mut end = hit.clone();
                end.reason = new_reason;
                end.queue_update(&mut batch);
            }
            [hit] => {
                return Err(RiprError::DatabaseInconsistent(format!(
                    "boundary {hit} has no flags set"
                )));
            }
            // no hit: the address is either strictly inside an interval or
            // in a gap
            [] => {
                if below_nearest.is_lower() && above_nearest.is_upper() {
                    if !below_nearest.same_reason(above_nearest) {
                        return Err(RiprError::DatabaseInconsistent(format!(
                            "reasons disagree between {below_nearest} and {above_nearest}"
                        )));
                    }
                    let new_reason = update(&below_nearest.reason);
                    let mut start = below_nearest.clone();
                    start.reason = new_reason.clone();
                    start.queue_update(&mut batch);
                    let mut end = above_nearest.clone();
                    end.reason = new_reason;
                    end.queue_update(&mut batch);
                } else {
                    return Err(RiprError::IpNotFound);
                }
            }
            _ => {
                return Err(RiprError::DatabaseInconsistent(
                    "multiple boundaries share one address".to_string(),
                ));
            }
        }

        self.store.apply(batch).await
    }
}
