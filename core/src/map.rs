//! Persistent and transient array-maps.
//!
//! A flat `Vec<(Value, Value)>` behind the same `mutable`-flag convention
//! as `vector`. Lookup is linear scan with structural-equality key compare
//! (see `equality::equal`) — appropriate for the small maps this runtime
//! targets (per-form locals, `def` metadata), not a hash table.

use crate::equality;
use crate::exception;
use crate::heap::{self, HeapData, MapObj};
use crate::memory;
use crate::value::Value;
use std::cell::{Cell, RefCell};

fn as_map(v: Value) -> &'static MapObj {
    debug_assert!(v.is_heap(), "expected a map value");
    // Safety: caller guarantees `v` is a live map heap value.
    match unsafe { &(*v.as_heap_ptr()).data } {
        HeapData::Map(m) => m,
        _ => panic!("expected a map value"),
    }
}

fn alloc_map(pairs: Vec<(Value, Value)>, mutable: bool) -> Value {
    let ptr = heap::alloc(HeapData::Map(MapObj {
        pairs: RefCell::new(pairs),
        mutable: Cell::new(mutable),
    }));
    Value::from_heap_ptr(ptr)
}

thread_local! {
    static EMPTY: Value = Value::from_heap_ptr(heap::alloc_immortal(HeapData::Map(MapObj {
        pairs: RefCell::new(Vec::new()),
        mutable: Cell::new(false),
    })));
}

/// The shared empty persistent map: a process-wide singleton, never counted
/// and never freed. `memory::retain`/`release` are no-ops on it, so a
/// caller may release it like any other owned handle without ever driving
/// it to zero.
pub fn empty() -> Value {
    EMPTY.with(|v| *v)
}

pub fn make_map(capacity: usize, mutable: bool) -> Value {
    alloc_map(Vec::with_capacity(capacity), mutable)
}

pub fn count(v: Value) -> usize {
    as_map(v).pairs.borrow().len()
}

pub fn is_mutable(v: Value) -> bool {
    as_map(v).mutable.get()
}

fn find(pairs: &[(Value, Value)], key: Value) -> Option<usize> {
    pairs.iter().position(|(k, _)| equality::equal(*k, key))
}

/// Borrowed lookup: the value's own reference still belongs to the map.
pub fn get(v: Value, key: Value) -> Option<Value> {
    let pairs = as_map(v).pairs.borrow();
    find(&pairs, key).map(|i| pairs[i].1)
}

pub fn contains_key(v: Value, key: Value) -> bool {
    get(v, key).is_some()
}

/// Persistent insert-or-update: returns a new map, leaving `v` unchanged.
pub fn assoc(v: Value, key: Value, value: Value) -> Value {
    let src = as_map(v).pairs.borrow();
    let mut pairs = Vec::with_capacity(src.len() + 1);
    let mut replaced = false;
    for &(k, val) in src.iter() {
        if equality::equal(k, key) {
            pairs.push((memory::retain(key), memory::retain(value)));
            replaced = true;
        } else {
            pairs.push((memory::retain(k), memory::retain(val)));
        }
    }
    if !replaced {
        pairs.push((memory::retain(key), memory::retain(value)));
    }
    alloc_map(pairs, false)
}

/// Persistent removal: returns a new map without `key`, leaving `v`
/// unchanged. A no-op copy if `key` was absent.
pub fn dissoc(v: Value, key: Value) -> Value {
    let src = as_map(v).pairs.borrow();
    let pairs = src
        .iter()
        .filter(|(k, _)| !equality::equal(*k, key))
        .map(|&(k, val)| (memory::retain(k), memory::retain(val)))
        .collect();
    alloc_map(pairs, false)
}

/// In-place insert-or-update on a transient map.
///
/// Diverges via `IllegalArgumentException` if `v` is not transient.
pub fn assoc_mut(v: Value, key: Value, value: Value) {
    let map = as_map(v);
    if !map.mutable.get() {
        exception::raise("IllegalArgumentException", "assoc! requires a transient map".to_string());
    }
    let mut pairs = map.pairs.borrow_mut();
    if let Some(i) = find(&pairs, key) {
        let (old_k, old_v) = pairs[i];
        pairs[i] = (old_k, memory::retain(value));
        drop(pairs);
        memory::release(old_v);
    } else {
        pairs.push((memory::retain(key), memory::retain(value)));
    }
}

/// In-place removal on a transient map.
///
/// Diverges via `IllegalArgumentException` if `v` is not transient.
pub fn dissoc_mut(v: Value, key: Value) {
    let map = as_map(v);
    if !map.mutable.get() {
        exception::raise("IllegalArgumentException", "dissoc! requires a transient map".to_string());
    }
    let mut pairs = map.pairs.borrow_mut();
    if let Some(i) = find(&pairs, key) {
        let (old_k, old_v) = pairs.remove(i);
        drop(pairs);
        memory::release(old_k);
        memory::release(old_v);
    }
}

pub fn transient(v: Value) -> Value {
    let src = as_map(v).pairs.borrow();
    let pairs = src
        .iter()
        .map(|&(k, val)| (memory::retain(k), memory::retain(val)))
        .collect();
    alloc_map(pairs, true)
}

/// Diverges via `IllegalArgumentException` if `v` is not currently
/// transient.
pub fn persistent_(v: Value) -> Value {
    let map = as_map(v);
    if !map.mutable.get() {
        exception::raise("IllegalArgumentException", "persistent! requires a transient map".to_string());
    }
    map.mutable.set(false);
    v
}

/// Keys, in insertion order. Each returned value is borrowed.
pub fn keys(v: Value) -> Vec<Value> {
    as_map(v).pairs.borrow().iter().map(|(k, _)| *k).collect()
}

/// Values, in insertion order. Each returned value is borrowed.
pub fn vals(v: Value) -> Vec<Value> {
    as_map(v).pairs.borrow().iter().map(|(_, val)| *val).collect()
}
