#![forbid(unsafe_code)]

//! Shared, change-notifying state cell used to publish the active index.
//!
//! # Design
//!
//! [`Observable<T>`] keeps its value in `Rc<RefCell<..>>` so the tracker and
//! every UI consumer hold handles to the same cell. Writes that do not change
//! the value (by `PartialEq`) are dropped silently; a real change bumps the
//! version and runs every live listener in registration order.
//!
//! Listeners are held weakly. The strong side lives inside the returned
//! [`Subscription`], so dropping the guard is all it takes to stop receiving
//! updates. Dead entries are swept on the next notification.
//!
//! # Failure Modes
//!
//! - **Write from a listener**: calling [`Observable::set`] while a listener
//!   is running on the same cell is allowed (the borrow is released before
//!   listeners run), but the nested write notifies immediately, so listeners
//!   may observe values out of order. Avoid it.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

type Listener<T> = Rc<dyn Fn(&T)>;
type WeakListener<T> = Weak<dyn Fn(&T)>;

struct Slot<T> {
    value: T,
    version: u64,
    listeners: Vec<WeakListener<T>>,
}

/// A version-tracked value with change listeners.
///
/// Clones share the value, the version counter, and the listener list.
pub struct Observable<T> {
    cell: Rc<RefCell<Slot<T>>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Rc::clone(&self.cell),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cell = self.cell.borrow();
        f.debug_struct("Observable")
            .field("value", &cell.value)
            .field("version", &cell.version)
            .field("listeners", &cell.listeners.len())
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    /// Create a cell holding `value` at version 0.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            cell: Rc::new(RefCell::new(Slot {
                value,
                version: 0,
                listeners: Vec::new(),
            })),
        }
    }

    #[must_use]
    pub fn get(&self) -> T {
        self.cell.borrow().value.clone()
    }

    /// Borrow the current value for the duration of `f`.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.cell.borrow().value)
    }

    /// Store `value`. Returns `true` when it differed from the previous value,
    /// in which case the version is bumped and listeners are notified.
    pub fn set(&self, value: T) -> bool {
        {
            let mut cell = self.cell.borrow_mut();
            if cell.value == value {
                return false;
            }
            cell.value = value;
            cell.version += 1;
        }
        self.notify();
        true
    }

    /// Register `listener` to run after every value change.
    ///
    /// The listener stays registered for as long as the returned
    /// [`Subscription`] is alive.
    pub fn subscribe(&self, listener: impl Fn(&T) + 'static) -> Subscription {
        let strong: Listener<T> = Rc::new(listener);
        self.cell
            .borrow_mut()
            .listeners
            .push(Rc::downgrade(&strong));
        Subscription {
            _keepalive: Box::new(strong),
        }
    }

    /// Number of value changes since creation.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.cell.borrow().version
    }

    /// Registered listeners, including dropped ones not yet swept.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.cell.borrow().listeners.len()
    }

    fn notify(&self) {
        let (live, value) = {
            let mut cell = self.cell.borrow_mut();
            cell.listeners.retain(|w| w.strong_count() > 0);
            let live: Vec<Listener<T>> =
                cell.listeners.iter().filter_map(Weak::upgrade).collect();
            (live, cell.value.clone())
        };
        for listener in &live {
            listener(&value);
        }
    }
}

/// Keeps a listener registered; dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    // `Rc<dyn Fn(&T)>` erased so the guard is not generic over `T`.
    _keepalive: Box<dyn std::any::Any>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}
