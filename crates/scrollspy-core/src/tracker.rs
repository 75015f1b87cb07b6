#![forbid(unsafe_code)]

//! The scrollspy tracker: which of a list of targets is currently visible.
//!
//! # Lifecycle
//!
//! [`Scrollspy::sync`] is meant to be called on every render with the
//! current target list and options. The tracker compares both by `Rc`
//! identity against the inputs it last subscribed with:
//!
//! - same identity: nothing happens;
//! - different identity: the live observer is disconnected, a new one is
//!   created with the new root and margin, and every present target is
//!   registered in list order. The last published index stays in place
//!   until the new observer delivers its first batch.
//!
//! Options are never compared by value, so a fresh `Rc` with identical
//! contents still resubscribes. Callers that rebuild options every render
//! should hoist them.
//!
//! # Invariants
//!
//! 1. At most one observer is connected at any time.
//! 2. The previous observer is disconnected before its replacement is created.
//! 3. A batch from a superseded or torn-down observer never touches state,
//!    even if the platform delivers it late.
//! 4. The active index is written only by batches from the current observer,
//!    never by `sync` itself.

use std::cell::Cell;
use std::rc::{Rc, Weak};

use crate::error::ObserverError;
use crate::observer::{
    BatchCallback, IntersectionEntry, ObserverConfig, ObserverFactory, VisibilityObserver,
};
use crate::options::{RootMargin, ScrollspyOptions};
use crate::reactive::{Observable, Subscription};

/// Index reported when no target intersects.
pub const NO_TARGET: i32 = -1;

/// Ordered target handles. `None` entries are kept for position but skipped.
pub type Targets<T> = Rc<[Option<T>]>;

/// Options shared by reference so identity can be compared across renders.
pub type SharedOptions<T> = Rc<ScrollspyOptions<T>>;

/// Position in `targets` of the first entry in `batch` with a positive
/// intersection ratio.
///
/// Entries are scanned in delivery order; later intersecting entries in the
/// same batch lose. Entries whose target is not in the list are skipped. A
/// handle listed twice resolves to its first position.
#[must_use]
pub fn select_first_intersecting<T: PartialEq>(
    targets: &[Option<T>],
    batch: &[IntersectionEntry<T>],
) -> Option<usize> {
    batch
        .iter()
        .filter(|entry| entry.is_intersecting())
        .find_map(|entry| {
            targets
                .iter()
                .position(|t| t.as_ref() == Some(&entry.target))
        })
}

struct Inputs<T, R> {
    targets: Targets<T>,
    options: Option<SharedOptions<R>>,
}

impl<T, R> Inputs<T, R> {
    fn is_same(&self, targets: &Targets<T>, options: Option<&SharedOptions<R>>) -> bool {
        let options_same = match (&self.options, options) {
            (None, None) => true,
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            _ => false,
        };
        Rc::ptr_eq(&self.targets, targets) && options_same
    }
}

/// Tracks the first intersecting target and publishes its index.
///
/// `F` supplies the platform observer. The tracker owns it exclusively and
/// disconnects it on reinitialization, [`teardown`](Self::teardown), and drop.
/// Options carry `F::Root`, so the root may be a different type than the
/// targets.
pub struct Scrollspy<T, F: ObserverFactory<T>> {
    factory: F,
    active: Observable<Option<usize>>,
    /// Bumped whenever the current observer is released. Callbacks compare
    /// against the value captured at creation.
    generation: Rc<Cell<u64>>,
    observer: Option<F::Observer>,
    inputs: Option<Inputs<T, F::Root>>,
}

impl<T, F: ObserverFactory<T>> std::fmt::Debug for Scrollspy<T, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scrollspy")
            .field("generation", &self.generation.get())
            .field("observing", &self.observer.is_some())
            .finish_non_exhaustive()
    }
}

impl<T, F> Scrollspy<T, F>
where
    T: Clone + PartialEq + 'static,
    F: ObserverFactory<T>,
{
    /// Create an idle tracker. Nothing is observed until the first
    /// [`sync`](Self::sync).
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            active: Observable::new(None),
            generation: Rc::new(Cell::new(0)),
            observer: None,
            inputs: None,
        }
    }

    /// Bring the subscription in line with `targets` and `options`.
    ///
    /// Returns `Ok(true)` when the tracker resubscribed and `Ok(false)` when
    /// both inputs were the same `Rc` as last time. On error the old
    /// observer is already gone and the tracker is idle; the next call
    /// retries regardless of identity.
    pub fn sync(
        &mut self,
        targets: &Targets<T>,
        options: Option<&SharedOptions<F::Root>>,
    ) -> Result<bool, ObserverError> {
        if self
            .inputs
            .as_ref()
            .is_some_and(|inputs| inputs.is_same(targets, options))
        {
            return Ok(false);
        }

        // The published index is left alone: it only ever changes from a
        // batch, so resubscribing cannot feed back into the caller.
        self.release();
        self.inputs = None;

        if let Some(Err(err)) = options.map(|o| o.validate()) {
            tracing::warn!(%err, "scrollspy offset passed through unvalidated");
        }

        let config = ObserverConfig {
            root: options.and_then(|o| o.root.clone()),
            root_margin: options
                .map_or_else(|| RootMargin::top_inset(0.0), |o| o.root_margin()),
        };
        let callback = self.batch_callback(Rc::clone(targets));
        let mut observer = self.factory.create(&config, callback)?;

        let mut registered = 0usize;
        for target in targets.iter().flatten() {
            if let Err(err) = observer.observe(target) {
                observer.disconnect();
                self.generation.set(self.generation.get() + 1);
                return Err(err);
            }
            registered += 1;
        }

        tracing::debug!(
            generation = self.generation.get(),
            targets = targets.len(),
            registered,
            root_margin = %config.root_margin,
            custom_root = config.root.is_some(),
            "scrollspy observer installed"
        );

        self.observer = Some(observer);
        self.inputs = Some(Inputs {
            targets: Rc::clone(targets),
            options: options.map(Rc::clone),
        });
        Ok(true)
    }

    /// Active index with [`NO_TARGET`] standing in for "none".
    #[must_use]
    pub fn current_index(&self) -> i32 {
        self.active
            .get()
            .map_or(NO_TARGET, |i| i32::try_from(i).unwrap_or(i32::MAX))
    }

    /// Active index as a position in the current target list, `None` when
    /// nothing intersects or no batch has arrived yet.
    #[must_use]
    pub fn active_index(&self) -> Option<usize> {
        self.active.get()
    }

    /// Shared handle to the reactive index.
    #[must_use]
    pub fn state(&self) -> Observable<Option<usize>> {
        self.active.clone()
    }

    /// Run `listener` whenever the active index changes.
    pub fn subscribe(&self, listener: impl Fn(&Option<usize>) + 'static) -> Subscription {
        self.active.subscribe(listener)
    }

    fn batch_callback(&self, targets: Targets<T>) -> BatchCallback<T> {
        let generation = self.generation.get();
        let live: Weak<Cell<u64>> = Rc::downgrade(&self.generation);
        let active = self.active.clone();
        Rc::new(move |batch: &[IntersectionEntry<T>]| {
            if live.upgrade().is_none_or(|g| g.get() != generation) {
                tracing::trace!(generation, "ignoring batch from released observer");
                return;
            }
            let next = select_first_intersecting(&targets, batch);
            tracing::trace!(generation, entries = batch.len(), ?next, "scrollspy batch");
            active.set(next);
        })
    }
}

impl<T, F: ObserverFactory<T>> Scrollspy<T, F> {
    /// Whether an observer is currently connected.
    #[must_use]
    pub fn is_observing(&self) -> bool {
        self.observer.is_some()
    }

    /// Disconnect for good. The last published index is left as is.
    ///
    /// A later [`sync`](Scrollspy::sync) starts a fresh subscription.
    pub fn teardown(&mut self) {
        if self.release() {
            tracing::debug!("scrollspy torn down");
        }
        self.inputs = None;
    }

    fn release(&mut self) -> bool {
        self.generation.set(self.generation.get() + 1);
        match self.observer.take() {
            Some(mut observer) => {
                observer.disconnect();
                true
            }
            None => false,
        }
    }
}

impl<T, F: ObserverFactory<T>> Drop for Scrollspy<T, F> {
    fn drop(&mut self) {
        self.teardown();
    }
}
