#![forbid(unsafe_code)]

//! Scrollspy core: track which of a list of targets is visible and publish
//! its index as reactive state.
//!
//! This crate has no JS/WASM types. The browser binding lives in
//! `scrollspy-web`, which plugs a `web_sys::IntersectionObserver` in through
//! [`ObserverFactory`]. Native hosts and tests use [`headless`].
//!
//! - [`Scrollspy`]: owns exactly one observer, resubscribes when the target
//!   list or options change by identity, and disconnects on teardown.
//! - [`Observable`]: the reactive cell holding the active index.
//! - [`ScrollspyOptions`]: optional root and top offset.

pub mod error;
pub mod headless;
pub mod observer;
pub mod options;
pub mod reactive;
pub mod tracker;

pub use error::{ObserverError, OptionsError};
pub use observer::{
    BatchCallback, IntersectionEntry, ObserverConfig, ObserverFactory, VisibilityObserver,
};
pub use options::{Offset, RootMargin, ScrollspyOptions};
pub use reactive::{Observable, Subscription};
pub use tracker::{NO_TARGET, Scrollspy, SharedOptions, Targets, select_first_intersecting};
