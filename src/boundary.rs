//! Boundary records: the marked points on the IPv4 number line.
//!
//! Every interval is stored as its two endpoints. A boundary carries the
//! point itself, a `lower` flag ("first address of an interval"), an `upper`
//! flag ("last address of an interval"), and the reason string of the
//! interval it delimits. Two immortal sentinels pin the line so that every
//! real point has a neighbour on both sides.

use std::fmt;
use std::net::Ipv4Addr;

use crate::store::{RawAttrs, WriteBatch, WriteOp};

/// A point on the number line: a real IPv4 address or one of the sentinels.
///
/// The derived ordering places `NegInf` below every address and `PosInf`
/// above every address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Point {
    NegInf,
    Ip(u32),
    PosInf,
}

impl Point {
    /// One address below, saturating into the lower sentinel.
    ///
    /// Saturation is what lets the planner ask for a cut at `L - 1` without
    /// special-casing `L == 0`: the resulting sentinel point never matches a
    /// stored boundary and never qualifies for insertion.
    pub fn below(self) -> Point {
        match self {
            Point::Ip(0) => Point::NegInf,
            Point::Ip(v) => Point::Ip(v - 1),
            other => other,
        }
    }

    /// One address above, saturating into the upper sentinel.
    pub fn above(self) -> Point {
        match self {
            Point::Ip(u32::MAX) => Point::PosInf,
            Point::Ip(v) => Point::Ip(v + 1),
            other => other,
        }
    }

    /// The stable store identity of this point.
    pub fn id(self) -> String {
        match self {
            Point::NegInf => "-inf".to_string(),
            Point::PosInf => "+inf".to_string(),
            Point::Ip(v) => Ipv4Addr::from(v).to_string(),
        }
    }

    /// The ordered-map score of this point.
    pub fn score(self) -> f64 {
        match self {
            Point::NegInf => f64::NEG_INFINITY,
            Point::PosInf => f64::INFINITY,
            Point::Ip(v) => v as f64,
        }
    }

    /// Recover a point from an ordered-map score.
    pub fn from_score(score: f64) -> Point {
        if score == f64::NEG_INFINITY {
            Point::NegInf
        } else if score == f64::INFINITY {
            Point::PosInf
        } else {
            Point::Ip(score as u32)
        }
    }

    pub fn is_sentinel(self) -> bool {
        !matches!(self, Point::Ip(_))
    }

    pub fn addr(self) -> Option<Ipv4Addr> {
        match self {
            Point::Ip(v) => Some(Ipv4Addr::from(v)),
            _ => None,
        }
    }
}

impl From<Ipv4Addr> for Point {
    fn from(ip: Ipv4Addr) -> Self {
        Point::Ip(u32::from(ip))
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id())
    }
}

/// One stored boundary: a point plus its flags and reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Boundary {
    pub point: Point,
    pub lower: bool,
    pub upper: bool,
    pub reason: String,
}

impl Boundary {
    pub fn new(point: Point, reason: &str, lower: bool, upper: bool) -> Self {
        Self {
            point,
            lower,
            upper,
            reason: reason.to_string(),
        }
    }

    /// The lower sentinel: closes the imaginary interval reaching up from
    /// negative infinity, so every real address has an upper bound below it
    /// or none at all.
    pub fn neg_inf() -> Self {
        Self::new(Point::NegInf, "-inf", false, true)
    }

    /// The upper sentinel, mirror of [`Boundary::neg_inf`].
    pub fn pos_inf() -> Self {
        Self::new(Point::PosInf, "+inf", true, false)
    }

    pub fn id(&self) -> String {
        self.point.id()
    }

    /// A new un-flagged boundary one address below, copying the reason.
    pub fn below(&self) -> Boundary {
        Boundary::new(self.point.below(), &self.reason, false, false)
    }

    /// A new un-flagged boundary one address above, copying the reason.
    pub fn above(&self) -> Boundary {
        Boundary::new(self.point.above(), &self.reason, false, false)
    }

    /// Exactly one of the two flags is set.
    pub fn is_single(&self) -> bool {
        self.lower != self.upper
    }

    /// A single boundary that starts an interval.
    pub fn is_lower(&self) -> bool {
        self.lower && !self.upper
    }

    /// A single boundary that ends an interval.
    pub fn is_upper(&self) -> bool {
        self.upper && !self.lower
    }

    /// Both flags set: a one-address interval.
    pub fn is_double(&self) -> bool {
        self.lower && self.upper
    }

    pub fn set_lower(&mut self) {
        self.lower = true;
        self.upper = false;
    }

    pub fn set_upper(&mut self) {
        self.lower = false;
        self.upper = true;
    }

    pub fn set_double(&mut self) {
        self.lower = true;
        self.upper = true;
    }

    pub fn same_ip(&self, other: &Boundary) -> bool {
        self.point == other.point
    }

    pub fn has_reason(&self) -> bool {
        !self.reason.is_empty()
    }

    /// True only if both reasons are non-empty and equal. Empty-vs-empty is
    /// false: "no reason recorded" never merges with anything.
    pub fn same_reason(&self, other: &Boundary) -> bool {
        self.has_reason() && other.has_reason() && self.reason == other.reason
    }

    /// Rebuild a boundary from its point and the raw attribute fields.
    ///
    /// The canonical flag encoding is `"1"`/`"0"`; `true`/`false` and other
    /// integer forms written by earlier clients decode too. Missing fields
    /// decode as unset.
    pub fn decode(point: Point, attrs: &RawAttrs) -> Boundary {
        Boundary {
            point,
            lower: decode_flag(attrs.lower.as_deref()),
            upper: decode_flag(attrs.upper.as_deref()),
            reason: attrs.reason.clone().unwrap_or_default(),
        }
    }

    /// Queue the commands that store this boundary.
    pub(crate) fn queue_insert(&self, batch: &mut WriteBatch) {
        batch.push(WriteOp::AddScore {
            id: self.id(),
            point: self.point,
        });
        self.queue_update(batch);
    }

    /// Queue an attribute rewrite for an already-scored boundary.
    pub(crate) fn queue_update(&self, batch: &mut WriteBatch) {
        batch.push(WriteOp::SetAttrs {
            id: self.id(),
            lower: self.lower,
            upper: self.upper,
            reason: self.reason.clone(),
        });
    }

    /// Queue the commands that delete this boundary.
    pub(crate) fn queue_remove(&self, batch: &mut WriteBatch) {
        batch.push(WriteOp::RemoveScore { id: self.id() });
        batch.push(WriteOp::DeleteAttrs { id: self.id() });
    }
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let role = match (self.lower, self.upper) {
            (true, true) => "double",
            (true, false) => "lower",
            (false, true) => "upper",
            (false, false) => "unset",
        };
        write!(f, "{} ({role}, reason={:?})", self.point, self.reason)
    }
}

fn decode_flag(raw: Option<&str>) -> bool {
    match raw {
        None => false,
        Some(s) => match s.trim() {
            "1" | "true" => true,
            "0" | "false" | "" => false,
            other => other.parse::<i64>().map(|v| v != 0).unwrap_or(false),
        },
    }
}
