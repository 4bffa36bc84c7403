//! # ripr - Reason-tagged IPv4 range storage over Redis
//!
//! Maps arbitrary IPv4 ranges to opaque "reason" strings and answers one hot
//! question: given an address, which reason applies? Tens of thousands of
//! CIDR entries expanded to individual addresses would cost gigabytes;
//! storing only the interval boundaries costs megabytes. Typical use is
//! blocklist and allowlist lookup for network services.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                         ripr                              │
//! ├───────────────────────────────────────────────────────────┤
//! │  RangeDb (engine)                                         │
//! │    ├── planners: Insert / Remove / Find / UpdateReasonOf  │
//! │    └── vicinity query: bounded neighbourhood reads        │
//! ├───────────────────────────────────────────────────────────┤
//! │  Boundary model                                           │
//! │    └── marked points + sentinels on the IPv4 number line  │
//! ├───────────────────────────────────────────────────────────┤
//! │  RangeStore (trait)                                       │
//! │    ├── RedisStore (sorted set + hashes, MULTI/EXEC)       │
//! │    └── MemoryStore (tests, demos, embedded use)           │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! Every stored record is a *boundary*: one IPv4 point flagged as the start,
//! the end, or both of an interval, tagged with the interval's reason. Each
//! mutation fetches the bounded neighbourhood of the touched range, plans a
//! small transactional batch covering every overlap and adjacency case, and
//! submits it atomically. Two immortal sentinels pin the number line so
//! every real address has a neighbour on both sides.
//!
//! ## Example
//!
//! ```no_run
//! use ripr::{Config, RangeDb};
//!
//! #[tokio::main]
//! async fn main() -> ripr::Result<()> {
//!     let db = RangeDb::connect(&Config::default()).await?;
//!
//!     db.insert("203.0.113.0/24", "scanner").await?;
//!     db.insert("198.51.100.1 - 198.51.100.99", "botnet").await?;
//!
//!     match db.find("203.0.113.77").await {
//!         Ok(reason) => println!("blocked: {reason}"),
//!         Err(e) if e.is_not_found() => println!("clean"),
//!         Err(e) => return Err(e),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Concurrency
//!
//! A `RangeDb` serialises its own operations with a reader-writer lock:
//! lookups run concurrently, mutations run exclusively and hold the lock
//! across their store round trips. Multiple processes writing to one store
//! are not coordinated; deploy a single writer.
//!
//! ## Modules
//!
//! - [`boundary`] - boundary records and point arithmetic
//! - [`cli`] - command-line interface definitions
//! - [`config`] - store connection configuration
//! - [`engine`] - the interval-overlay engine
//! - [`error`] - the error taxonomy
//! - [`range`] - range-string parsing
//! - [`store`] - the backing-store abstraction and its implementations

pub mod boundary;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod range;
pub mod store;

pub use config::Config;
pub use engine::{RangeDb, RangeEntry};
pub use error::{Result, RiprError};
pub use store::{MemoryStore, RangeStore, RedisStore};
