//! Fixnum and fixed-point arithmetic with overflow promotion.
//!
//! `+`, `-`, and `*` stay in fixnum arithmetic as long as both operands are
//! fixnums and the result fits; otherwise (mixed operand kinds, or a
//! fixnum result that overflows) the computation is redone in Q16.13
//! fixed-point. `/` always produces a fixed-point result, even for two
//! fixnums — there is no ratio type, so integer division would silently
//! truncate. A value that cannot be represented at all (a fixnum too
//! large to promote, or a fixed-point result past the saturation bound)
//! raises `ArithmeticException`; dividing by zero raises
//! `DivisionByZeroError`. See DESIGN.md for why these particular
//! promotion rules were chosen.

use crate::exception;
use crate::value::{Value, FIXED_FRAC_BITS, FIXED_RAW_MAX, FIXED_RAW_MIN, FIXNUM_MAX, FIXNUM_MIN};

fn promote_to_fixed_raw(v: Value) -> i64 {
    if v.is_fixnum() {
        let i = v.as_fixnum();
        let raw = (i as i128) << FIXED_FRAC_BITS;
        if raw > FIXED_RAW_MAX as i128 || raw < FIXED_RAW_MIN as i128 {
            exception::raise(
                "ArithmeticException",
                format!("{i} cannot be represented as a fixed-point value"),
            );
        }
        raw as i64
    } else if v.is_fixed() {
        v.as_fixed_raw()
    } else {
        exception::raise("ArithmeticException", "expected a number".to_string());
    }
}

fn fixed_from_i128(raw: i128) -> Value {
    if raw > FIXED_RAW_MAX as i128 || raw < FIXED_RAW_MIN as i128 {
        exception::raise("ArithmeticException", "fixed-point result out of range".to_string());
    }
    Value::fixed_raw(raw as i64)
}

fn both_fixnum(a: Value, b: Value) -> bool {
    a.is_fixnum() && b.is_fixnum()
}

pub fn add(a: Value, b: Value) -> Value {
    if both_fixnum(a, b) {
        if let Some(sum) = a.as_fixnum().checked_add(b.as_fixnum()) {
            if (FIXNUM_MIN..=FIXNUM_MAX).contains(&sum) {
                return Value::fixnum(sum);
            }
        }
    }
    let ra = promote_to_fixed_raw(a);
    let rb = promote_to_fixed_raw(b);
    fixed_from_i128(ra as i128 + rb as i128)
}

pub fn sub(a: Value, b: Value) -> Value {
    if both_fixnum(a, b) {
        if let Some(diff) = a.as_fixnum().checked_sub(b.as_fixnum()) {
            if (FIXNUM_MIN..=FIXNUM_MAX).contains(&diff) {
                return Value::fixnum(diff);
            }
        }
    }
    let ra = promote_to_fixed_raw(a);
    let rb = promote_to_fixed_raw(b);
    fixed_from_i128(ra as i128 - rb as i128)
}

pub fn mul(a: Value, b: Value) -> Value {
    if both_fixnum(a, b) {
        if let Some(prod) = a.as_fixnum().checked_mul(b.as_fixnum()) {
            if (FIXNUM_MIN..=FIXNUM_MAX).contains(&prod) {
                return Value::fixnum(prod);
            }
        }
    }
    let ra = promote_to_fixed_raw(a);
    let rb = promote_to_fixed_raw(b);
    let product = (ra as i128 * rb as i128) >> FIXED_FRAC_BITS;
    fixed_from_i128(product)
}

/// Always returns a fixed-point value: fixnum/fixnum division has no
/// exact integer result in general, so it is never attempted.
///
/// # Panics (via `exception::raise`, not a Rust panic)
/// Diverges through the exception mechanism if `b` is zero.
pub fn div(a: Value, b: Value) -> Value {
    let rb = promote_to_fixed_raw(b);
    if rb == 0 {
        exception::raise("DivisionByZeroError", "division by zero".to_string());
    }
    let ra = promote_to_fixed_raw(a);
    let numerator = (ra as i128) << FIXED_FRAC_BITS;
    fixed_from_i128(numerator / rb as i128)
}

/// Unary `/`: the reciprocal of `a`. Always fixed-point, unless the
/// reciprocal is exactly representable as an integer (`(/ 1)` => `1`,
/// `(/ -1)` => `-1`).
pub fn recip(a: Value) -> Value {
    if a.is_fixnum() {
        let i = a.as_fixnum();
        if i == 1 || i == -1 {
            return Value::fixnum(i);
        }
    }
    div(Value::fixnum(1), a)
}

pub fn neg(a: Value) -> Value {
    sub(Value::fixnum(0), a)
}

fn as_f64(v: Value) -> f64 {
    if v.is_fixnum() {
        v.as_fixnum() as f64
    } else {
        v.as_fixed_f64()
    }
}

pub fn compare(a: Value, b: Value) -> std::cmp::Ordering {
    if both_fixnum(a, b) {
        return a.as_fixnum().cmp(&b.as_fixnum());
    }
    as_f64(a).partial_cmp(&as_f64(b)).expect("NaN is not representable in this numeric tower")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixnum_add_stays_fixnum() {
        let r = add(Value::fixnum(2), Value::fixnum(3));
        assert!(r.is_fixnum());
        assert_eq!(r.as_fixnum(), 5);
    }

    #[test]
    fn fixnum_overflow_promotes_to_fixed() {
        let r = add(Value::fixnum(FIXNUM_MAX), Value::fixnum(1));
        assert!(r.is_fixed());
        assert_eq!(r.as_fixed_f64(), (FIXNUM_MAX as f64) + 1.0);
    }

    #[test]
    fn mixed_kind_promotes_to_fixed() {
        let r = add(Value::fixnum(1), Value::fixed_raw(1 << FIXED_FRAC_BITS));
        assert!(r.is_fixed());
        assert!((r.as_fixed_f64() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn division_always_yields_fixed() {
        let r = div(Value::fixnum(1), Value::fixnum(4));
        assert!(r.is_fixed());
        assert!((r.as_fixed_f64() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn division_by_zero_raises() {
        let result = crate::exception::try_catch(|| div(Value::fixnum(1), Value::fixnum(0)));
        let exc = result.expect_err("division by zero should raise");
        assert_eq!(crate::exception::exception_type(exc), "DivisionByZeroError");
        crate::memory::release(exc);
    }

    #[test]
    fn unary_recip_of_non_unit_is_fixed() {
        let r = recip(Value::fixnum(4));
        assert!((r.as_fixed_f64() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn unary_recip_of_unit_fixnums_stays_fixnum() {
        let r1 = recip(Value::fixnum(1));
        assert!(r1.is_fixnum());
        assert_eq!(r1.as_fixnum(), 1);
        let rm1 = recip(Value::fixnum(-1));
        assert!(rm1.is_fixnum());
        assert_eq!(rm1.as_fixnum(), -1);
    }

    #[test]
    fn compare_mixed_kinds() {
        assert_eq!(
            compare(Value::fixnum(1), Value::fixed_raw(1 << FIXED_FRAC_BITS)),
            std::cmp::Ordering::Equal
        );
        assert_eq!(compare(Value::fixnum(1), Value::fixnum(2)), std::cmp::Ordering::Less);
    }
}
