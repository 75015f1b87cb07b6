#![forbid(unsafe_code)]

//! Seam between the tracker and the platform's visibility-observation
//! capability.
//!
//! A backend provides an [`ObserverFactory`] that builds one
//! [`VisibilityObserver`] per tracker (re)initialization. The browser backend
//! lives in `scrollspy-web`; [`crate::headless`] provides an in-memory one.

use std::rc::Rc;

use crate::error::ObserverError;
use crate::options::RootMargin;

/// One visibility report for a single target.
#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionEntry<T> {
    pub target: T,
    /// Fraction of the target inside the (margin-adjusted) root, `0.0..=1.0`.
    pub intersection_ratio: f64,
}

impl<T> IntersectionEntry<T> {
    pub fn new(target: T, intersection_ratio: f64) -> Self {
        Self {
            target,
            intersection_ratio,
        }
    }

    /// Any overlap at all. Edge-adjacent targets report `0.0` and do not count.
    #[inline]
    #[must_use]
    pub fn is_intersecting(&self) -> bool {
        self.intersection_ratio > 0.0
    }
}

/// Callback invoked with each batch of entries, in platform delivery order.
pub type BatchCallback<T> = Rc<dyn Fn(&[IntersectionEntry<T>])>;

/// Parameters handed to [`ObserverFactory::create`].
///
/// `R` is the factory's root handle, which need not be a target type: a
/// browser root may be a document as well as an element.
#[derive(Debug, Clone, PartialEq)]
pub struct ObserverConfig<R> {
    /// `None` observes against the viewport.
    pub root: Option<R>,
    pub root_margin: RootMargin,
}

/// A live observation subscription.
///
/// Implementations must stop delivering batches once [`disconnect`] returns.
/// Dropping an observer should disconnect it as well.
///
/// [`disconnect`]: VisibilityObserver::disconnect
pub trait VisibilityObserver<T> {
    fn observe(&mut self, target: &T) -> Result<(), ObserverError>;

    fn disconnect(&mut self);
}

/// Creates observers for a particular platform.
pub trait ObserverFactory<T> {
    /// Handle accepted as the intersection root.
    type Root: Clone;
    type Observer: VisibilityObserver<T>;

    fn create(
        &mut self,
        config: &ObserverConfig<Self::Root>,
        callback: BatchCallback<T>,
    ) -> Result<Self::Observer, ObserverError>;
}
