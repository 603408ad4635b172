//! Symbol interning and the namespace registry.
//!
//! Symbols are interned per name (so `eq` on symbol values reduces to a
//! pointer compare); namespaces form a process-global registry, each owning
//! a binding table from symbol name to `Value`. Resolution order is
//! current namespace, then the `clojure.core` cache, then the registry in
//! insertion order — see DESIGN.md for why this order was chosen.
//!
//! The first lookup of `clojure.core` installs a cached pointer to it
//! (`Registry::core_cache`), so every later core lookup is a direct pointer
//! read instead of a linear scan of the namespace registry.

use crate::heap::{self, HeapData, SymbolObj};
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;

/// A namespace: a name and a binding table. Namespaces are never freed —
/// they live for the process lifetime, so a `Symbol`'s back-pointer to its
/// owning namespace is a raw, unretained pointer (see `heap::SymbolObj`).
pub struct Namespace {
    pub name: Box<str>,
    bindings: RefCell<HashMap<Box<str>, Value>>,
}

impl Namespace {
    fn new(name: &str) -> Box<Namespace> {
        Box::new(Namespace {
            name: name.into(),
            bindings: RefCell::new(HashMap::new()),
        })
    }

    pub fn define(&self, name: &str, value: Value) {
        let mut bindings = self.bindings.borrow_mut();
        if let Some(old) = bindings.insert(name.into(), crate::memory::retain(value)) {
            crate::memory::release(old);
        }
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.bindings.borrow().get(name).copied()
    }
}

struct Registry {
    /// Interned symbol name -> heap pointer, so repeated `intern` calls on
    /// the same name return the same symbol object.
    symbols: HashMap<Box<str>, *mut heap::HeapObject>,
    /// Namespace name -> owned namespace, in creation order.
    namespaces: Vec<(Box<str>, *const Namespace)>,
    current: Option<Box<str>>,
    /// Set on the first lookup of `clojure.core`, so later core lookups
    /// skip the linear scan over `namespaces` entirely.
    core_cache: Option<*const Namespace>,
}

thread_local! {
    static REGISTRY: RefCell<Registry> = RefCell::new(Registry {
        symbols: HashMap::new(),
        namespaces: Vec::new(),
        current: None,
        core_cache: None,
    });
}

const CORE_NAMESPACE: &str = "clojure.core";

/// Look up a namespace by name, creating and registering it if absent.
/// `clojure.core` lookups are O(1) via `core_cache`; every other name is a
/// linear scan of the registry.
pub fn namespace_of_or_create(name: &str) -> *const Namespace {
    REGISTRY.with(|r| {
        let mut reg = r.borrow_mut();
        if name == CORE_NAMESPACE {
            if let Some(ns) = reg.core_cache {
                return ns;
            }
        } else if let Some((_, ns)) = reg.namespaces.iter().find(|(n, _)| &**n == name) {
            return *ns;
        }
        let ns = Box::into_raw(Namespace::new(name)) as *const Namespace;
        reg.namespaces.push((name.into(), ns));
        if name == CORE_NAMESPACE {
            reg.core_cache = Some(ns);
        }
        ns
    })
}

/// The `clojure.core` namespace, consulting the cached pointer directly
/// rather than going through `namespace_of_or_create`'s name compare.
fn core_namespace() -> *const Namespace {
    let cached = REGISTRY.with(|r| r.borrow().core_cache);
    match cached {
        Some(ns) => ns,
        None => namespace_of_or_create(CORE_NAMESPACE),
    }
}

/// Number of registered namespaces, for diagnostics.
pub fn namespace_count() -> usize {
    REGISTRY.with(|r| r.borrow().namespaces.len())
}

/// Set the current namespace (creating it if needed), per `ns`/`in-ns`.
pub fn set_current_namespace(name: &str) {
    namespace_of_or_create(name);
    REGISTRY.with(|r| r.borrow_mut().current = Some(name.into()));
}

/// The current namespace, defaulting to and creating `clojure.core` if none
/// has been set yet.
pub fn current_namespace() -> *const Namespace {
    let name = REGISTRY.with(|r| r.borrow().current.clone());
    match name {
        Some(n) => namespace_of_or_create(&n),
        None => {
            set_current_namespace(CORE_NAMESPACE);
            core_namespace()
        }
    }
}

/// Intern a symbol by name, returning a retained `Value` handle to the
/// shared symbol object. `namespace` is the symbol's own namespace
/// qualifier (e.g. the `foo` in `foo/bar`), not where it resolves from.
pub fn intern(name: &str, namespace: Option<&str>) -> Value {
    let key: Box<str> = match namespace {
        Some(ns) => format!("{ns}/{name}").into_boxed_str(),
        None => name.into(),
    };
    REGISTRY.with(|r| {
        let mut reg = r.borrow_mut();
        if let Some(ptr) = reg.symbols.get(&key) {
            return crate::memory::retain(Value::from_heap_ptr(*ptr));
        }
        let ns_ptr = namespace
            .map(namespace_of_or_create)
            .unwrap_or(std::ptr::null());
        let ptr = heap::alloc(HeapData::Symbol(SymbolObj {
            name: key.clone(),
            namespace: ns_ptr,
        }));
        reg.symbols.insert(key, ptr);
        Value::from_heap_ptr(ptr)
    })
}

/// The (possibly namespace-qualified) name a symbol was interned under.
pub fn name_of(sym: Value) -> &'static str {
    debug_assert!(sym.is_heap(), "expected a symbol value");
    // Safety: caller guarantees `sym` is a live symbol heap value.
    match unsafe { &(*sym.as_heap_ptr()).data } {
        HeapData::Symbol(s) => &s.name,
        _ => panic!("expected a symbol value"),
    }
}

/// Define `name` to `value` in `ns`.
pub fn define(ns: *const Namespace, name: &str, value: Value) {
    // Safety: namespaces are never freed once registered.
    unsafe { (*ns).define(name, value) }
}

/// Resolve `name`, searching the current namespace, then the
/// `clojure.core` cache, then every other registered namespace in
/// registration order. Returns `None` if unbound anywhere.
pub fn resolve(name: &str) -> Option<Value> {
    // Safety: namespaces are never freed once registered.
    unsafe {
        if let Some(v) = (*current_namespace()).get(name) {
            return Some(v);
        }
        let core = core_namespace();
        if let Some(v) = (*core).get(name) {
            return Some(v);
        }
        let others = REGISTRY.with(|r| r.borrow().namespaces.clone());
        for (_, ns) in others {
            if ns == core {
                continue;
            }
            if let Some(v) = (*ns).get(name) {
                return Some(v);
            }
        }
        None
    }
}
