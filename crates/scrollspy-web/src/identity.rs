#![forbid(unsafe_code)]

//! Map host values to stable `Rc`s by identity.
//!
//! The tracker compares inputs with `Rc::ptr_eq`. JS hands us a fresh
//! `JsValue` wrapper on every call, so this memo keeps the last handle and
//! the `Rc` built from it, and returns the same `Rc` while the host keeps
//! passing the same object.

use std::rc::Rc;

pub(crate) struct IdentityMemo<H, V: ?Sized> {
    last: Option<(H, Rc<V>)>,
}

impl<H, V: ?Sized> Default for IdentityMemo<H, V> {
    fn default() -> Self {
        Self { last: None }
    }
}

impl<H, V: ?Sized> IdentityMemo<H, V> {
    /// Return the cached `Rc` if `same(previous, &handle)`, else build and
    /// cache a new one.
    pub(crate) fn resolve(
        &mut self,
        handle: H,
        same: impl Fn(&H, &H) -> bool,
        build: impl FnOnce(&H) -> Rc<V>,
    ) -> Rc<V> {
        if let Some((prev, value)) = &self.last {
            if same(prev, &handle) {
                return Rc::clone(value);
            }
        }
        let value = build(&handle);
        self.last = Some((handle, Rc::clone(&value)));
        value
    }

    pub(crate) fn clear(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;

    #[test]
    fn same_handle_reuses_rc() {
        let builds = Cell::new(0);
        let mut memo: IdentityMemo<u32, [u32]> = IdentityMemo::default();
        let build = |h: &u32| -> Rc<[u32]> {
            builds.set(builds.get() + 1);
            Rc::from(vec![*h])
        };

        let a = memo.resolve(7, |x, y| x == y, build);
        let b = memo.resolve(7, |x, y| x == y, build);
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(builds.get(), 1);
    }

    #[test]
    fn new_handle_rebuilds() {
        let mut memo: IdentityMemo<u32, str> = IdentityMemo::default();
        let a = memo.resolve(1, |x, y| x == y, |_| Rc::from("one"));
        let b = memo.resolve(2, |x, y| x == y, |_| Rc::from("two"));
        assert!(!Rc::ptr_eq(&a, &b));
        assert_eq!(&*b, "two");
    }

    #[test]
    fn clear_forgets_last_handle() {
        let mut memo: IdentityMemo<u32, str> = IdentityMemo::default();
        let a = memo.resolve(1, |x, y| x == y, |_| Rc::from("one"));
        memo.clear();
        let b = memo.resolve(1, |x, y| x == y, |_| Rc::from("one"));
        assert!(!Rc::ptr_eq(&a, &b));
    }
}
