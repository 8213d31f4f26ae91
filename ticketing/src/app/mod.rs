//! Application layer.
//!
//! [`BoxOffice`] wraps the store in async request/reply operations and
//! read-only queries. [`HoldSweeper`] releases expired seat holds in the
//! background.

mod facade;
mod sweeper;

pub use facade::{BoxOffice, BoxOfficeStore};
pub use sweeper::{HoldSweeper, SweeperHandle};
