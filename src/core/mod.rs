//! Deck geometry, scroll bookkeeping and catalog data.
//!
//! Nothing in this module depends on any TUI or rendering crate.  Offsets and
//! heights are fractional terminal rows throughout, so the whole layer is
//! exercised by plain unit tests.

pub mod controller;
pub mod dismiss;
pub mod ledger;
pub mod pager;
pub mod rec;
pub mod resolver;
pub mod store;
pub mod tracker;
