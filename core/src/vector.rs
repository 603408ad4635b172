//! Persistent and transient vectors.
//!
//! A vector is a heap-allocated, contiguous `Vec<Value>` behind a
//! `mutable` flag (see `heap::VectorObj`). Persistent operations
//! (`conj`, `assoc`) always copy-on-write and return a new vector, leaving
//! the receiver untouched; transient operations (`conj_mut`, `assoc_mut`)
//! require `mutable` to be set and edit in place. `transient`/`persistent_`
//! move between the two without changing a vector's backing storage
//! identity once frozen.

use crate::exception;
use crate::heap::{self, HeapData, VectorObj};
use crate::memory;
use crate::value::Value;
use std::cell::{Cell, RefCell};

fn as_vector(v: Value) -> &'static VectorObj {
    debug_assert!(v.is_heap(), "expected a vector value");
    // Safety: caller guarantees `v` is a live vector heap value.
    match unsafe { &(*v.as_heap_ptr()).data } {
        HeapData::Vector(vec) => vec,
        _ => panic!("expected a vector value"),
    }
}

fn alloc_vector(slots: Vec<Value>, mutable: bool) -> Value {
    let ptr = heap::alloc(HeapData::Vector(VectorObj {
        slots: RefCell::new(slots),
        mutable: Cell::new(mutable),
    }));
    Value::from_heap_ptr(ptr)
}

thread_local! {
    static EMPTY: Value = Value::from_heap_ptr(heap::alloc_immortal(HeapData::Vector(VectorObj {
        slots: RefCell::new(Vec::new()),
        mutable: Cell::new(false),
    })));
}

/// The shared empty persistent vector: a process-wide singleton, never
/// counted and never freed. `memory::retain`/`release` are no-ops on it, so
/// a caller may treat the result exactly like any other owned handle
/// (including releasing it) without ever driving it to zero.
pub fn empty() -> Value {
    EMPTY.with(|v| *v)
}

/// Allocate a fresh vector with `capacity` reserved slots, empty of
/// elements, either persistent (`mutable = false`) or transient.
pub fn make_vector(capacity: usize, mutable: bool) -> Value {
    alloc_vector(Vec::with_capacity(capacity), mutable)
}

/// Build a persistent vector from an owned slice of already-retained
/// values (ownership of each element's reference transfers to the vector).
pub fn from_values(values: Vec<Value>) -> Value {
    alloc_vector(values, false)
}

pub fn count(v: Value) -> usize {
    as_vector(v).slots.borrow().len()
}

pub fn is_mutable(v: Value) -> bool {
    as_vector(v).mutable.get()
}

/// Element at `index`, or `None` if out of bounds. Borrowed: the caller
/// does not own an extra reference and must retain if keeping it beyond
/// the vector's own lifetime.
pub fn nth(v: Value, index: usize) -> Option<Value> {
    as_vector(v).slots.borrow().get(index).copied()
}

/// Persistent append: returns a new vector with `value` appended, leaving
/// `v` unchanged.
pub fn conj(v: Value, value: Value) -> Value {
    let src = as_vector(v).slots.borrow();
    let mut slots = Vec::with_capacity(src.len() + 1);
    for &s in src.iter() {
        slots.push(memory::retain(s));
    }
    slots.push(memory::retain(value));
    alloc_vector(slots, false)
}

/// Persistent update: returns a new vector with `index` set to `value`,
/// leaving `v` unchanged. `index == count(v)` behaves like `conj`
/// (Clojure's `assoc` grows a vector by exactly one past its end).
///
/// Diverges via `IllegalArgumentException` if `index > count(v)`.
pub fn assoc(v: Value, index: usize, value: Value) -> Value {
    let src = as_vector(v).slots.borrow();
    if index > src.len() {
        exception::raise(
            "IllegalArgumentException",
            format!("index {index} out of bounds for vector of length {}", src.len()),
        );
    }
    if index == src.len() {
        let mut slots = Vec::with_capacity(src.len() + 1);
        for &s in src.iter() {
            slots.push(memory::retain(s));
        }
        slots.push(memory::retain(value));
        return alloc_vector(slots, false);
    }
    let mut slots = Vec::with_capacity(src.len());
    for (i, &s) in src.iter().enumerate() {
        slots.push(if i == index {
            memory::retain(value)
        } else {
            memory::retain(s)
        });
    }
    alloc_vector(slots, false)
}

/// In-place append on a transient vector.
///
/// Diverges via `IllegalArgumentException` if `v` is not (or is no
/// longer) transient — including a handle already frozen by
/// `persistent!`.
pub fn conj_mut(v: Value, value: Value) {
    let vec = as_vector(v);
    if !vec.mutable.get() {
        exception::raise("IllegalArgumentException", "conj! requires a transient vector".to_string());
    }
    vec.slots.borrow_mut().push(memory::retain(value));
}

/// In-place update on a transient vector.
///
/// Diverges via `IllegalArgumentException` if `v` is not transient or if
/// `index >= count(v)`.
pub fn assoc_mut(v: Value, index: usize, value: Value) {
    let vec = as_vector(v);
    if !vec.mutable.get() {
        exception::raise("IllegalArgumentException", "assoc! requires a transient vector".to_string());
    }
    let mut slots = vec.slots.borrow_mut();
    if index >= slots.len() {
        let len = slots.len();
        drop(slots);
        exception::raise(
            "IllegalArgumentException",
            format!("index {index} out of bounds for vector of length {len}"),
        );
    }
    let old = slots[index];
    slots[index] = memory::retain(value);
    drop(slots);
    memory::release(old);
}

/// Produce a new transient vector seeded with `v`'s current contents,
/// leaving `v` itself untouched.
pub fn transient(v: Value) -> Value {
    let src = as_vector(v).slots.borrow();
    let slots = src.iter().map(|&s| memory::retain(s)).collect();
    alloc_vector(slots, true)
}

/// Freeze a transient vector in place: flips its `mutable` flag so future
/// `conj!`/`assoc!` calls on it raise. Reuses the same storage and the
/// same `Value` handle.
///
/// Diverges via `IllegalArgumentException` if `v` is not currently
/// transient.
pub fn persistent_(v: Value) -> Value {
    let vec = as_vector(v);
    if !vec.mutable.get() {
        exception::raise("IllegalArgumentException", "persistent! requires a transient vector".to_string());
    }
    vec.mutable.set(false);
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_vector_has_zero_count() {
        let e = empty();
        assert_eq!(count(e), 0);
        memory::release(e);
    }

    #[test]
    fn empty_vector_survives_arbitrary_retain_release() {
        for _ in 0..500 {
            let e = empty();
            memory::retain(e);
            memory::release(e);
            memory::release(e);
            memory::release(e);
        }
        assert_eq!(count(empty()), 0);
    }

    #[test]
    fn conj_is_persistent() {
        let e = empty();
        let v1 = conj(e, Value::fixnum(1));
        let v2 = conj(v1, Value::fixnum(2));
        assert_eq!(count(e), 0);
        assert_eq!(count(v1), 1);
        assert_eq!(count(v2), 2);
        assert_eq!(nth(v2, 0).unwrap().as_fixnum(), 1);
        assert_eq!(nth(v2, 1).unwrap().as_fixnum(), 2);
        memory::release(e);
        memory::release(v1);
        memory::release(v2);
    }

    #[test]
    fn assoc_does_not_mutate_source() {
        let v0 = conj(conj(empty(), Value::fixnum(1)), Value::fixnum(2));
        let v1 = assoc(v0, 0, Value::fixnum(99));
        assert_eq!(nth(v0, 0).unwrap().as_fixnum(), 1);
        assert_eq!(nth(v1, 0).unwrap().as_fixnum(), 99);
        memory::release(v0);
        memory::release(v1);
    }

    #[test]
    fn transient_roundtrip() {
        let p = conj(empty(), Value::fixnum(1));
        let t = transient(p);
        assert!(is_mutable(t));
        conj_mut(t, Value::fixnum(2));
        assoc_mut(t, 0, Value::fixnum(10));
        let frozen = persistent_(t);
        assert!(!is_mutable(frozen));
        assert_eq!(count(frozen), 2);
        assert_eq!(nth(frozen, 0).unwrap().as_fixnum(), 10);
        assert_eq!(nth(frozen, 1).unwrap().as_fixnum(), 2);
        assert_eq!(count(p), 1);
        memory::release(p);
        memory::release(frozen);
    }

    #[test]
    fn conj_mut_on_persistent_raises_illegal_argument() {
        let p = empty();
        let result = crate::exception::try_catch(|| {
            conj_mut(p, Value::fixnum(1));
            Value::NIL
        });
        let exc = result.expect_err("conj! on a persistent vector should raise");
        assert_eq!(crate::exception::exception_type(exc), "IllegalArgumentException");
        memory::release(exc);
        memory::release(p);
    }

    #[test]
    fn conj_mut_on_frozen_transient_raises_illegal_argument() {
        let t = transient(empty());
        let frozen = persistent_(t);
        let result = crate::exception::try_catch(|| {
            conj_mut(frozen, Value::fixnum(1));
            Value::NIL
        });
        let exc = result.expect_err("conj! on a frozen transient should raise");
        assert_eq!(crate::exception::exception_type(exc), "IllegalArgumentException");
        memory::release(exc);
        memory::release(frozen);
    }

    #[test]
    fn assoc_at_count_grows_by_one() {
        let v0 = conj(empty(), Value::fixnum(1));
        let v1 = assoc(v0, 1, Value::fixnum(2));
        assert_eq!(count(v1), 2);
        assert_eq!(nth(v1, 1).unwrap().as_fixnum(), 2);
        memory::release(v0);
        memory::release(v1);
    }

    #[test]
    fn assoc_past_count_raises_illegal_argument() {
        let v0 = empty();
        let result = crate::exception::try_catch(|| assoc(v0, 5, Value::fixnum(1)));
        let exc = result.expect_err("assoc past the end should raise");
        assert_eq!(crate::exception::exception_type(exc), "IllegalArgumentException");
        memory::release(exc);
        memory::release(v0);
    }
}
