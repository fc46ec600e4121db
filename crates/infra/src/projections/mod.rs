//! Read-side projections computed from the ledger on demand.
//!
//! Nothing here writes. Every call recomputes from the current ledger, so the
//! results double as an independent check on the incrementally maintained
//! counters.

pub mod consistency;
pub mod history;
pub mod warehouse;

pub use consistency::check_allocation;
pub use history::movement_history;
pub use warehouse::{WarehouseSummary, net_quantities, summarize, summarize_all};
