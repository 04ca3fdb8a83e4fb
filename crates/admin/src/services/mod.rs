//! Workflows that span several repositories and outside services.
//!
//! - [`courier`]: Steadfast dispatch, cancellation and status sync

pub mod courier;
