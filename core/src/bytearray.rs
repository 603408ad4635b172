//! Mutable byte arrays (`byte-array`, `aget`, `aset`, `alength`, `aclone`).
//!
//! Unlike `String`, a `ByteArray` is mutated in place through any handle
//! that shares the allocation — there is no persistent/transient split for
//! this type, matching spec Section 6.5's treatment of it as a plain
//! mutable buffer rather than a collection with copy-on-write semantics.

use crate::exception;
use crate::heap::{self, ByteArrayObj, HeapData};
use crate::value::Value;

fn as_obj(v: Value) -> &'static ByteArrayObj {
    debug_assert!(v.is_heap(), "expected a byte-array value");
    // Safety: caller guarantees `v` is a live byte-array heap value.
    match unsafe { &(*v.as_heap_ptr()).data } {
        HeapData::ByteArray(b) => b,
        _ => panic!("expected a byte-array value"),
    }
}

pub fn make(len: usize) -> Value {
    let ptr = heap::alloc(HeapData::ByteArray(ByteArrayObj {
        bytes: std::cell::RefCell::new(vec![0u8; len]),
    }));
    Value::from_heap_ptr(ptr)
}

pub fn from_bytes(bytes: &[u8]) -> Value {
    let ptr = heap::alloc(HeapData::ByteArray(ByteArrayObj {
        bytes: std::cell::RefCell::new(bytes.to_vec()),
    }));
    Value::from_heap_ptr(ptr)
}

pub fn alength(v: Value) -> usize {
    as_obj(v).bytes.borrow().len()
}

/// Diverges via `ArrayIndexOutOfBoundsException` if `index` is out of range.
pub fn aget(v: Value, index: usize) -> u8 {
    let bytes = as_obj(v).bytes.borrow();
    match bytes.get(index) {
        Some(&b) => b,
        None => exception::raise(
            "ArrayIndexOutOfBoundsException",
            format!("index {index} out of bounds for length {}", bytes.len()),
        ),
    }
}

/// Diverges via `ArrayIndexOutOfBoundsException` if `index` is out of range.
pub fn aset(v: Value, index: usize, value: u8) {
    let mut bytes = as_obj(v).bytes.borrow_mut();
    let len = bytes.len();
    match bytes.get_mut(index) {
        Some(slot) => *slot = value,
        None => exception::raise(
            "ArrayIndexOutOfBoundsException",
            format!("index {index} out of bounds for length {len}"),
        ),
    }
}

pub fn aclone(v: Value) -> Value {
    from_bytes(&as_obj(v).bytes.borrow())
}
