//! Command-line command handlers for slowburn.
//!
//! One-shot commands that evaluate the configuration and exit live here; the
//! daemon itself is started through [`crate::Slowburn`].

pub mod preview;
