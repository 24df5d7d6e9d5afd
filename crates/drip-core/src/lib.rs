//! Drip release scheduling engine.
//!
//! Splits an ordered list of activities into fixed-size sessions, computes
//! each session's calendar window, encodes windows as availability rules,
//! and keeps track of which activities a schedule manages.

pub mod calendar;
pub mod config;
pub mod error;
pub mod io;
pub mod paths;
pub mod release;
pub mod rows;
pub mod rule;
pub mod selection;
pub mod store;
pub mod types;
pub mod unselected;
pub mod window;

pub use calendar::Calendar;
pub use error::{DripError, Result};
pub use release::{ApplyReport, DripRelease};
