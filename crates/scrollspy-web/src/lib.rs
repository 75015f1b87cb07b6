#![forbid(unsafe_code)]

//! Browser binding for the scrollspy tracker.
//!
//! On `wasm32` this crate provides:
//!
//! - [`DomObserverFactory`]: a `scrollspy_core::ObserverFactory` backed by
//!   `IntersectionObserver`.
//! - `Scrollspy` (exported to JS as a class): `sync(elements, options?)`,
//!   `currentIndex()`, `onChange(fn)`, `destroy()`.
//!
//! JavaScript callers pass plain arrays and option objects. Their identity
//! (`Object.is`) decides whether the tracker resubscribes, the same way a
//! hook dependency list would.

#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::{DomObserver, DomObserverFactory, ScrollspyBinding};

// Used by the wasm module and by native tests.
#[cfg(any(target_arch = "wasm32", test))]
mod identity;
