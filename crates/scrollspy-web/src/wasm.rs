#![forbid(unsafe_code)]

//! `IntersectionObserver` backend and the `wasm-bindgen` exports.
//!
//! Only compiled on `wasm32` targets.

use std::rc::Rc;

use js_sys::{Array, Function, Object, Reflect};
use scrollspy_core::{
    BatchCallback, IntersectionEntry, NO_TARGET, ObserverConfig, ObserverError, ObserverFactory,
    Offset, Scrollspy, ScrollspyOptions, Subscription, VisibilityObserver,
};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Element, IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit};

use crate::identity::IdentityMemo;

type EntriesClosure = Closure<dyn FnMut(Array, IntersectionObserver)>;

fn console_error(msg: &str) {
    let global = js_sys::global();
    let Ok(console) = Reflect::get(&global, &"console".into()) else {
        return;
    };
    let Ok(error) = Reflect::get(&console, &"error".into()) else {
        return;
    };
    let Ok(error_fn) = error.dyn_into::<Function>() else {
        return;
    };
    let _ = error_fn.call1(&console, &JsValue::from_str(msg));
}

fn install_panic_hook() {
    use std::sync::Once;

    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        std::panic::set_hook(Box::new(|info| {
            let msg = match info.location() {
                Some(loc) => format!(
                    "scrollspy panic at {}:{}:{}: {info}",
                    loc.file(),
                    loc.line(),
                    loc.column()
                ),
                None => format!("scrollspy panic: {info}"),
            };
            console_error(&msg);
        }));
    });
}

#[wasm_bindgen(start)]
pub fn wasm_start() {
    install_panic_hook();
}

fn describe_js_error(err: &JsValue) -> String {
    err.as_string().unwrap_or_else(|| format!("{err:?}"))
}

/// Builds [`DomObserver`]s on top of the browser `IntersectionObserver`.
///
/// The root is kept as a raw `JsValue` so a `Document` root works as well as
/// an `Element`; the browser does the type check.
#[derive(Debug, Default, Clone, Copy)]
pub struct DomObserverFactory;

impl ObserverFactory<Element> for DomObserverFactory {
    type Root = JsValue;
    type Observer = DomObserver;

    fn create(
        &mut self,
        config: &ObserverConfig<JsValue>,
        callback: BatchCallback<Element>,
    ) -> Result<DomObserver, ObserverError> {
        let closure: EntriesClosure = Closure::new(move |entries: Array, _: IntersectionObserver| {
            let batch: Vec<IntersectionEntry<Element>> = entries
                .iter()
                .filter_map(|value| value.dyn_into::<IntersectionObserverEntry>().ok())
                .map(|entry| IntersectionEntry::new(entry.target(), entry.intersection_ratio()))
                .collect();
            callback(&batch);
        });

        let init = IntersectionObserverInit::new();
        init.set_root_margin(&config.root_margin.to_string());
        if let Some(root) = &config.root {
            Reflect::set(&init, &"root".into(), root)
                .map_err(|err| ObserverError::Create(describe_js_error(&err)))?;
        }

        let observer =
            IntersectionObserver::new_with_options(closure.as_ref().unchecked_ref(), &init)
                .map_err(|err| ObserverError::Create(describe_js_error(&err)))?;

        Ok(DomObserver {
            observer,
            _closure: closure,
        })
    }
}

/// A live `IntersectionObserver` plus the closure it calls into.
///
/// The closure must outlive the observer; both are dropped together, and
/// drop disconnects first.
pub struct DomObserver {
    observer: IntersectionObserver,
    _closure: EntriesClosure,
}

impl DomObserver {
    /// Margin as normalized by the browser.
    #[must_use]
    pub fn root_margin(&self) -> String {
        self.observer.root_margin()
    }
}

impl std::fmt::Debug for DomObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomObserver").finish_non_exhaustive()
    }
}

impl VisibilityObserver<Element> for DomObserver {
    fn observe(&mut self, target: &Element) -> Result<(), ObserverError> {
        self.observer.observe(target);
        Ok(())
    }

    fn disconnect(&mut self) {
        self.observer.disconnect();
    }
}

impl Drop for DomObserver {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}

fn same_object(a: &JsValue, b: &JsValue) -> bool {
    Object::is(a, b)
}

fn parse_targets(elements: &Array) -> Rc<[Option<Element>]> {
    elements
        .iter()
        .map(|value| value.dyn_into::<Element>().ok())
        .collect::<Vec<_>>()
        .into()
}

/// Falsy values mean "not given", the way `offset || 0` reads in JS.
fn read_field(options: &JsValue, key: &str) -> Option<JsValue> {
    Reflect::get(options, &JsValue::from_str(key))
        .ok()
        .filter(|v| v.is_truthy())
}

/// Numbers stay numbers. Anything else is spliced into the margin as its JS
/// string form and left for the browser to accept or reject.
fn parse_offset(value: &JsValue) -> Offset {
    if let Some(px) = value.as_f64() {
        return Offset::Px(px);
    }
    match value.as_string() {
        Some(text) => Offset::Raw(text),
        None => Offset::Raw(String::from(value.unchecked_ref::<Object>().to_string())),
    }
}

fn parse_options(options: &JsValue) -> Rc<ScrollspyOptions<JsValue>> {
    let root = read_field(options, "root");
    let offset = read_field(options, "offset")
        .map(|v| parse_offset(&v))
        .unwrap_or_default();
    Rc::new(ScrollspyOptions { root, offset })
}

/// Scrollspy for JavaScript hosts.
///
/// Call `sync` on every render with the current element array and options
/// object. Passing the same array and options object again is a no-op;
/// passing new ones resubscribes.
#[wasm_bindgen(js_name = Scrollspy)]
pub struct ScrollspyBinding {
    inner: Scrollspy<Element, DomObserverFactory>,
    targets: IdentityMemo<JsValue, [Option<Element>]>,
    options: IdentityMemo<JsValue, ScrollspyOptions<JsValue>>,
    listener: Option<Subscription>,
}

impl Default for ScrollspyBinding {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen(js_class = Scrollspy)]
impl ScrollspyBinding {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        install_panic_hook();
        Self {
            inner: Scrollspy::new(DomObserverFactory),
            targets: IdentityMemo::default(),
            options: IdentityMemo::default(),
            listener: None,
        }
    }

    /// Observe `elements` (non-Element entries are skipped) with optional
    /// `{ root, offset }`. Returns `true` if the observer was replaced.
    ///
    /// `root` and `offset` go to the browser as given. Throws if it rejects
    /// them, e.g. a root that is neither an Element nor a Document, or an
    /// offset that does not form a valid margin.
    pub fn sync(&mut self, elements: &Array, options: JsValue) -> Result<bool, JsValue> {
        let handle: JsValue = elements.clone().into();
        let targets = self
            .targets
            .resolve(handle, same_object, |_| parse_targets(elements));

        let options = if options.is_undefined() || options.is_null() {
            self.options.clear();
            None
        } else {
            Some(self.options.resolve(options, same_object, parse_options))
        };

        self.inner
            .sync(&targets, options.as_ref())
            .map_err(|err| JsValue::from_str(&err.to_string()))
    }

    /// Index of the first visible element, or -1.
    #[wasm_bindgen(js_name = currentIndex)]
    pub fn current_index(&self) -> i32 {
        self.inner.current_index()
    }

    /// Call `callback(index)` whenever the index changes. Replaces any
    /// previously registered callback.
    #[wasm_bindgen(js_name = onChange)]
    pub fn on_change(&mut self, callback: Function) {
        self.listener = Some(self.inner.subscribe(move |active| {
            let index = active.map_or(NO_TARGET, |i| i32::try_from(i).unwrap_or(i32::MAX));
            if let Err(err) = callback.call1(&JsValue::NULL, &JsValue::from(index)) {
                tracing::warn!(error = %describe_js_error(&err), "scrollspy onChange callback threw");
            }
        }));
    }

    /// Disconnect the observer and drop the change callback.
    pub fn destroy(&mut self) {
        self.listener = None;
        self.inner.teardown();
        self.targets.clear();
        self.options.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn options(key: &str, value: &JsValue) -> JsValue {
        let opts = Object::new();
        Reflect::set(&opts, &key.into(), value).unwrap();
        opts.into()
    }

    #[wasm_bindgen_test]
    fn numeric_offset_is_kept() {
        let parsed = parse_options(&options("offset", &JsValue::from_f64(50.0)));
        assert_eq!(parsed.offset, Offset::Px(50.0));
        assert_eq!(parsed.root_margin().to_string(), "-50px 0px 0px 0px");
    }

    #[wasm_bindgen_test]
    fn string_offset_passes_through() {
        let parsed = parse_options(&options("offset", &JsValue::from_str("50")));
        assert_eq!(parsed.offset, Offset::Raw("50".into()));
        assert_eq!(parsed.root_margin().to_string(), "-50px 0px 0px 0px");
    }

    #[wasm_bindgen_test]
    fn falsy_offset_reads_as_zero() {
        for value in [
            JsValue::UNDEFINED,
            JsValue::NULL,
            JsValue::FALSE,
            JsValue::from_str(""),
            JsValue::from_f64(f64::NAN),
        ] {
            let parsed = parse_options(&options("offset", &value));
            assert_eq!(parsed.offset, Offset::Px(0.0));
        }
    }

    #[wasm_bindgen_test]
    fn document_root_is_not_dropped() {
        let document: JsValue = web_sys::window().unwrap().document().unwrap().into();
        let parsed = parse_options(&options("root", &document));
        assert!(parsed.root.as_ref().is_some_and(|r| Object::is(r, &document)));
    }

    #[wasm_bindgen_test]
    fn browser_sees_margin_and_root() {
        let document: JsValue = web_sys::window().unwrap().document().unwrap().into();
        let config = ObserverConfig {
            root: Some(document),
            root_margin: scrollspy_core::RootMargin::top_inset(50.0),
        };
        let observer = DomObserverFactory
            .create(&config, Rc::new(|_: &[IntersectionEntry<Element>]| {}))
            .unwrap();
        assert_eq!(observer.root_margin(), "-50px 0px 0px 0px");
    }

    #[wasm_bindgen_test]
    fn non_node_root_is_rejected_by_browser() {
        let config = ObserverConfig {
            root: Some(JsValue::from_str("main")),
            root_margin: scrollspy_core::RootMargin::top_inset(0.0),
        };
        let created =
            DomObserverFactory.create(&config, Rc::new(|_: &[IntersectionEntry<Element>]| {}));
        assert!(matches!(created, Err(ObserverError::Create(_))));
    }
}
