//! Application orchestration — mutable state, the event pump, and input
//! handling for every view.

pub mod event;
pub mod handler;
pub mod settings;
pub mod state;
pub mod store_runtime;
