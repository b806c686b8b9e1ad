//! Client progressive loader.
//!
//! [`ProgressiveLoader`] is the explicit state machine for one displayed
//! media element; [`drive`] runs it against a [`MediaElement`] with tokio
//! timers.

pub mod driver;
pub mod machine;

pub use driver::{drive, HttpElement, MediaElement};
pub use machine::{
    ClientMediaState, LoadPlan, LoaderEffect, LoaderEvent, LoaderOutcome, ProgressiveLoader,
};
