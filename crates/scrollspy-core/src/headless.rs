#![forbid(unsafe_code)]

//! In-memory observer backend for tests and non-browser hosts.
//!
//! `HeadlessObservers` records every observer the tracker creates, what it
//! was configured with, which targets it registered, and whether it is still
//! connected. Tests drive the tracker by delivering batches by hand.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use scrollspy_core::headless::HeadlessObservers;
//! use scrollspy_core::{IntersectionEntry, Scrollspy};
//!
//! let backend = HeadlessObservers::new();
//! let mut spy = Scrollspy::new(backend.clone());
//! let targets: Rc<[Option<&str>]> = Rc::from(vec![Some("intro"), Some("usage")]);
//!
//! spy.sync(&targets, None).unwrap();
//! let id = backend.latest().unwrap();
//! backend.deliver(id, vec![
//!     IntersectionEntry::new("intro", 0.0),
//!     IntersectionEntry::new("usage", 0.4),
//! ]);
//! assert_eq!(spy.current_index(), 1);
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::ObserverError;
use crate::observer::{
    BatchCallback, IntersectionEntry, ObserverConfig, ObserverFactory, VisibilityObserver,
};

struct Record<T> {
    config: ObserverConfig<T>,
    callback: BatchCallback<T>,
    observed: Vec<T>,
    connected: bool,
}

struct Registry<T> {
    records: Vec<Record<T>>,
    fail_next: Option<ObserverError>,
}

/// Shared handle to the headless backend. Clones see the same registry.
pub struct HeadlessObservers<T> {
    registry: Rc<RefCell<Registry<T>>>,
}

impl<T> Clone for HeadlessObservers<T> {
    fn clone(&self) -> Self {
        Self {
            registry: Rc::clone(&self.registry),
        }
    }
}

impl<T> Default for HeadlessObservers<T> {
    fn default() -> Self {
        Self {
            registry: Rc::new(RefCell::new(Registry {
                records: Vec::new(),
                fail_next: None,
            })),
        }
    }
}

impl<T> std::fmt::Debug for HeadlessObservers<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.registry.borrow();
        f.debug_struct("HeadlessObservers")
            .field("created", &registry.records.len())
            .field(
                "live",
                &registry.records.iter().filter(|r| r.connected).count(),
            )
            .finish()
    }
}

impl<T: Clone + 'static> HeadlessObservers<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `create` call fail with `err`.
    pub fn fail_next_create(&self, err: ObserverError) {
        self.registry.borrow_mut().fail_next = Some(err);
    }

    /// Total observers ever created.
    #[must_use]
    pub fn created(&self) -> usize {
        self.registry.borrow().records.len()
    }

    /// Observers that have not been disconnected.
    #[must_use]
    pub fn live(&self) -> usize {
        self.registry
            .borrow()
            .records
            .iter()
            .filter(|r| r.connected)
            .count()
    }

    /// Id of the most recently created observer.
    #[must_use]
    pub fn latest(&self) -> Option<usize> {
        self.created().checked_sub(1)
    }

    #[must_use]
    pub fn config(&self, id: usize) -> Option<ObserverConfig<T>> {
        self.registry
            .borrow()
            .records
            .get(id)
            .map(|r| r.config.clone())
    }

    /// Targets registered with observer `id`, in registration order.
    #[must_use]
    pub fn observed(&self, id: usize) -> Vec<T> {
        self.registry
            .borrow()
            .records
            .get(id)
            .map(|r| r.observed.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn is_connected(&self, id: usize) -> bool {
        self.registry
            .borrow()
            .records
            .get(id)
            .is_some_and(|r| r.connected)
    }

    /// Deliver a batch the way a browser would: only to connected observers.
    ///
    /// Returns whether the callback ran.
    pub fn deliver(&self, id: usize, batch: Vec<IntersectionEntry<T>>) -> bool {
        let callback = {
            let registry = self.registry.borrow();
            match registry.records.get(id) {
                Some(record) if record.connected => Rc::clone(&record.callback),
                _ => return false,
            }
        };
        callback(&batch);
        true
    }

    /// Deliver a batch even if observer `id` was disconnected, simulating a
    /// notification that was already queued when the observer was replaced.
    pub fn deliver_stale(&self, id: usize, batch: Vec<IntersectionEntry<T>>) -> bool {
        let callback = {
            let registry = self.registry.borrow();
            match registry.records.get(id) {
                Some(record) => Rc::clone(&record.callback),
                None => return false,
            }
        };
        callback(&batch);
        true
    }
}

impl<T: Clone + 'static> ObserverFactory<T> for HeadlessObservers<T> {
    type Root = T;
    type Observer = HeadlessObserver<T>;

    fn create(
        &mut self,
        config: &ObserverConfig<T>,
        callback: BatchCallback<T>,
    ) -> Result<Self::Observer, ObserverError> {
        let mut registry = self.registry.borrow_mut();
        if let Some(err) = registry.fail_next.take() {
            return Err(err);
        }
        registry.records.push(Record {
            config: config.clone(),
            callback,
            observed: Vec::new(),
            connected: true,
        });
        Ok(HeadlessObserver {
            id: registry.records.len() - 1,
            registry: Rc::clone(&self.registry),
        })
    }
}

/// Observer handed out by [`HeadlessObservers`]. Disconnects on drop.
pub struct HeadlessObserver<T> {
    id: usize,
    registry: Rc<RefCell<Registry<T>>>,
}

impl<T> HeadlessObserver<T> {
    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }
}

impl<T> std::fmt::Debug for HeadlessObserver<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeadlessObserver")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl<T: Clone> VisibilityObserver<T> for HeadlessObserver<T> {
    fn observe(&mut self, target: &T) -> Result<(), ObserverError> {
        let mut registry = self.registry.borrow_mut();
        match registry.records.get_mut(self.id) {
            Some(record) if record.connected => {
                record.observed.push(target.clone());
                Ok(())
            }
            _ => Err(ObserverError::Observe("observer is disconnected".into())),
        }
    }

    fn disconnect(&mut self) {
        if let Some(record) = self.registry.borrow_mut().records.get_mut(self.id) {
            record.connected = false;
        }
    }
}

impl<T> Drop for HeadlessObserver<T> {
    fn drop(&mut self) {
        if let Some(record) = self.registry.borrow_mut().records.get_mut(self.id) {
            record.connected = false;
        }
    }
}
