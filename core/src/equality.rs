//! Structural equality.
//!
//! Sequential collections (list, vector, seq) compare element-wise against
//! one another regardless of concrete variant, matching ordinary Lisp
//! usage where `(= '(1 2) [1 2])` holds. Maps compare as an unordered set
//! of key/value pairs and only ever equal another map. Numbers compare
//! equal only within the same immediate kind (fixnum-to-fixnum,
//! fixed-point-to-fixed-point) — see DESIGN.md for why cross-kind numeric
//! equality was not implemented. Callables and exceptions compare by
//! identity: two closures are `equal` only if they're the same heap object.

use crate::heap::HeapData;
use crate::list;
use crate::value::{Value, ValueType};

fn is_sequential(t: ValueType) -> bool {
    matches!(t, ValueType::List | ValueType::Vector | ValueType::TransientVector | ValueType::Seq)
}

fn sequential_equal(a: Value, b: Value) -> bool {
    let mut ia = list::iter_of(a);
    let mut ib = list::iter_of(b);
    loop {
        match (ia.next(), ib.next()) {
            (None, None) => return true,
            (Some((x, ia2)), Some((y, ib2))) => {
                if !equal(x, y) {
                    return false;
                }
                ia = ia2;
                ib = ib2;
            }
            _ => return false,
        }
    }
}

fn map_equal(a: Value, b: Value) -> bool {
    if crate::map::count(a) != crate::map::count(b) {
        return false;
    }
    crate::map::keys(a).into_iter().all(|k| match crate::map::get(b, k) {
        Some(bv) => equal(crate::map::get(a, k).unwrap(), bv),
        None => false,
    })
}

fn string_bytes(v: Value) -> &'static [u8] {
    // Safety: caller guarantees `v` is a live string heap value.
    match unsafe { &(*v.as_heap_ptr()).data } {
        HeapData::String(s) => &s.bytes,
        _ => panic!("expected a string value"),
    }
}

fn bytearray_bytes(v: Value) -> Vec<u8> {
    // Safety: caller guarantees `v` is a live byte-array heap value.
    match unsafe { &(*v.as_heap_ptr()).data } {
        HeapData::ByteArray(b) => b.bytes.borrow().clone(),
        _ => panic!("expected a byte-array value"),
    }
}

/// Structural equality between two values.
pub fn equal(a: Value, b: Value) -> bool {
    if a.0 == b.0 {
        return true;
    }
    if a.is_nil() || b.is_nil() {
        return false;
    }
    if a.is_fixnum() && b.is_fixnum() {
        return a.as_fixnum() == b.as_fixnum();
    }
    if a.is_char() && b.is_char() {
        return a.as_char() == b.as_char();
    }
    if a.is_fixed() && b.is_fixed() {
        return a.as_fixed_raw() == b.as_fixed_raw();
    }
    if a.is_special() && b.is_special() {
        return a.as_bool() == b.as_bool();
    }
    if !a.is_heap() || !b.is_heap() {
        return false;
    }
    let ta = a.type_of();
    let tb = b.type_of();
    if is_sequential(ta) && is_sequential(tb) {
        return sequential_equal(a, b);
    }
    match (ta, tb) {
        (ValueType::String, ValueType::String) => string_bytes(a) == string_bytes(b),
        (ValueType::ByteArray, ValueType::ByteArray) => bytearray_bytes(a) == bytearray_bytes(b),
        (ValueType::Map, ValueType::Map) => map_equal(a, b),
        (ValueType::Symbol, ValueType::Symbol) => a.0 == b.0,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory;

    #[test]
    fn fixnum_equality() {
        assert!(equal(Value::fixnum(5), Value::fixnum(5)));
        assert!(!equal(Value::fixnum(5), Value::fixnum(6)));
    }

    #[test]
    fn nil_equals_only_nil() {
        assert!(equal(Value::NIL, Value::NIL));
        assert!(!equal(Value::NIL, Value::fixnum(0)));
    }

    #[test]
    fn list_equals_vector_with_same_elements() {
        let l = list::make_list(&[Value::fixnum(1), Value::fixnum(2)]);
        let v = crate::vector::conj(crate::vector::conj(crate::vector::empty(), Value::fixnum(1)), Value::fixnum(2));
        assert!(equal(l, v));
        memory::release(l);
        memory::release(v);
    }

    #[test]
    fn maps_compare_order_independent() {
        let m1 = crate::map::assoc(crate::map::assoc(crate::map::empty(), Value::fixnum(1), Value::fixnum(10)), Value::fixnum(2), Value::fixnum(20));
        let m2 = crate::map::assoc(crate::map::assoc(crate::map::empty(), Value::fixnum(2), Value::fixnum(20)), Value::fixnum(1), Value::fixnum(10));
        assert!(equal(m1, m2));
        memory::release(m1);
        memory::release(m2);
    }

    #[test]
    fn map_never_equals_vector() {
        let m = crate::map::assoc(crate::map::empty(), Value::fixnum(1), Value::fixnum(10));
        let v = crate::vector::conj(crate::vector::empty(), Value::fixnum(1));
        assert!(!equal(m, v));
        memory::release(m);
        memory::release(v);
    }
}
