//! UI / rendering layer — everything that touches Ratatui widgets.
//!
//! This layer takes the *core* data structures and turns them into cells on
//! the terminal.  No store I/O happens here.

pub mod animate;
pub mod deck_widget;
pub mod layout;
pub mod popup;
pub mod saved;
pub mod spinner;
pub mod theme;
