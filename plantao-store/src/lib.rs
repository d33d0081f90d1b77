//! SQLite persistence for Plantão.
//!
//! Three concerns live here, all operating on the same single-file store:
//!
//! - [`Store`]: a scoped connection handle exposing natural-key
//!   upsert/delete/query operations for the attendance base, the two
//!   catalogs and the surgery table, plus schema bootstrap.
//! - [`checkpoint`]: folds the write-ahead log into the main file so its
//!   raw bytes can be transmitted, releasing every handle it takes.
//! - [`reconcile`]: merges two divergent copies of the store row by row,
//!   per-table policy, into a third file that only appears on full success.
//!
//! The sync layer composes these; it never issues row-level SQL itself.

mod checkpoint;
mod error;
mod maintenance;
mod reconcile;
mod store;

pub use checkpoint::checkpoint;
pub use error::{StoreError, StoreResult};
pub use maintenance::{hard_reset, vacuum};
pub use reconcile::reconcile;
pub use store::{CirurgiaFilter, Store};
