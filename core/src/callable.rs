//! Dispatch glue for callables: construction, arity checking, and the
//! NativeFn/Closure invocation contract.
//!
//! This crate has no evaluator (spec Section 1 excludes it), so a closure
//! call can't be carried out here — `prepare_call` does everything that
//! doesn't require evaluating Lisp code: arity checking and binding
//! parameters into a fresh environment frame, then hands the body and
//! that environment back to the caller (the host's `Evaluator`, see
//! `tiny-clj-runtime`) to actually run. A native fn call needs no such
//! handoff and is fully resolved by `prepare_call`.

use crate::env;
use crate::exception;
use crate::heap::{self, ClosureObj, HeapData, NativeFnObj, NativeFnPtr};
use crate::map;
use crate::memory;
use crate::value::{Value, ValueType};

pub fn make_native(name: Option<&str>, func: NativeFnPtr) -> Value {
    let ptr = heap::alloc(HeapData::NativeFn(NativeFnObj {
        name: name.map(Into::into),
        func,
    }));
    Value::from_heap_ptr(ptr)
}

/// Build a closure. Retains `params`' elements, `body`, and `env`.
pub fn make_closure(params: &[Value], body: Value, captured_env: Value, name: Option<&str>) -> Value {
    let params: Box<[Value]> = params.iter().map(|&p| memory::retain(p)).collect();
    let ptr = heap::alloc(HeapData::Closure(ClosureObj {
        params,
        body: memory::retain(body),
        env: memory::retain(captured_env),
        name: name.map(Into::into),
    }));
    Value::from_heap_ptr(ptr)
}

pub fn is_callable(v: Value) -> bool {
    matches!(v.type_of(), ValueType::NativeFn | ValueType::Closure)
}

fn native_fn_ptr(v: Value) -> NativeFnPtr {
    // Safety: caller guarantees `v` is a live NativeFn heap value.
    match unsafe { &(*v.as_heap_ptr()).data } {
        HeapData::NativeFn(f) => f.func,
        _ => panic!("expected a native fn value"),
    }
}

fn closure_parts(v: Value) -> (&'static [Value], Value, Value) {
    // Safety: caller guarantees `v` is a live Closure heap value.
    match unsafe { &(*v.as_heap_ptr()).data } {
        HeapData::Closure(c) => (&c.params, c.body, c.env),
        _ => panic!("expected a closure value"),
    }
}

pub fn arity(v: Value) -> usize {
    closure_parts(v).0.len()
}

/// Outcome of `prepare_call`: either the call is already done (native fn)
/// or the host must evaluate `body` in `call_env` to produce the result.
pub enum Invocation {
    Done(Value),
    Eval { body: Value, call_env: Value },
}

/// Check arity (for closures) and set up the call. Diverges via
/// `exception::raise` on arity mismatch or an uncallable value.
pub fn prepare_call(callee: Value, args: &[Value]) -> Invocation {
    match callee.type_of() {
        ValueType::NativeFn => Invocation::Done((native_fn_ptr(callee))(args)),
        ValueType::Closure => {
            let (params, body, captured_env) = closure_parts(callee);
            if params.len() != args.len() {
                exception::raise(
                    "ArityException",
                    format!("expected {} argument(s), got {}", params.len(), args.len()),
                );
            }
            let mut bindings = map::empty();
            for (&p, &a) in params.iter().zip(args.iter()) {
                let next = map::assoc(bindings, p, a);
                memory::release(bindings);
                bindings = next;
            }
            let call_env = env::env_extend(captured_env, bindings);
            memory::release(bindings);
            Invocation::Eval { body, call_env }
        }
        _ => exception::raise("NotCallableException", "value is not callable".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn double(args: &[Value]) -> Value {
        Value::fixnum(args[0].as_fixnum() * 2)
    }

    #[test]
    fn native_fn_call_is_done_immediately() {
        let f = make_native(Some("double"), double);
        match prepare_call(f, &[Value::fixnum(21)]) {
            Invocation::Done(v) => assert_eq!(v.as_fixnum(), 42),
            Invocation::Eval { .. } => panic!("native fn should not defer to eval"),
        }
        memory::release(f);
    }

    #[test]
    fn closure_call_binds_params_and_defers_eval() {
        let p = crate::symbol::intern("x", None);
        let body = Value::fixnum(0);
        let c = make_closure(&[p], body, env::empty_env(), Some("identity-ish"));
        assert_eq!(arity(c), 1);
        match prepare_call(c, &[Value::fixnum(7)]) {
            Invocation::Eval { call_env, .. } => {
                assert_eq!(env::env_lookup(call_env, p).unwrap().as_fixnum(), 7);
                memory::release(call_env);
            }
            Invocation::Done(_) => panic!("closure call should defer to eval"),
        }
        memory::release(c);
        memory::release(p);
    }

    #[test]
    fn arity_mismatch_raises() {
        let p = crate::symbol::intern("x", None);
        let c = make_closure(&[p], Value::fixnum(0), env::empty_env(), None);
        let result = exception::try_catch(|| match prepare_call(c, &[]) {
            Invocation::Done(v) => v,
            Invocation::Eval { .. } => Value::NIL,
        });
        let exc = result.expect_err("arity mismatch should raise");
        assert_eq!(exception::exception_type(exc), "ArityException");
        memory::release(exc);
        memory::release(c);
        memory::release(p);
    }
}
