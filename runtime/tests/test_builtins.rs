//! Integration tests exercising builtins the way a host would: resolve a
//! symbol out of `clojure.core`, then drive it through `callable::prepare_call`.

use tiny_clj_core::value::Value;
use tiny_clj_core::{callable, exception, memory, symbol, vector};
use tiny_clj_runtime::builtins;

fn call(name: &str, args: &[Value]) -> Value {
    let f = symbol::resolve(name).unwrap_or_else(|| panic!("{name} not registered"));
    match callable::prepare_call(f, args) {
        callable::Invocation::Done(v) => v,
        callable::Invocation::Eval { .. } => panic!("{name} is native and should resolve immediately"),
    }
}

#[test]
fn runtime_init_registers_arithmetic_and_is_idempotent() {
    builtins::runtime_init();
    builtins::runtime_init();
    assert_eq!(call("+", &[Value::fixnum(2), Value::fixnum(2)]).as_fixnum(), 4);
}

#[test]
fn transient_vector_roundtrip_through_builtins() {
    builtins::runtime_init();
    let p = vector::empty();
    let t = call("transient", &[p]);
    let t = call("conj!", &[t, Value::fixnum(1)]);
    let t = call("conj!", &[t, Value::fixnum(2)]);
    let frozen = call("persistent!", &[t]);
    assert_eq!(call("count", &[frozen]).as_fixnum(), 2);
    memory::release(p);
    memory::release(frozen);
}

#[test]
fn conj_bang_on_frozen_handle_raises_through_builtin() {
    builtins::runtime_init();
    let p = vector::empty();
    let t = call("transient", &[p]);
    let frozen = call("persistent!", &[t]);
    let result = exception::try_catch(|| call("conj!", &[frozen, Value::fixnum(1)]));
    let exc = result.expect_err("conj! on a frozen transient should raise");
    assert_eq!(exception::exception_type(exc), "IllegalArgumentException");
    memory::release(exc);
    memory::release(p);
    memory::release(frozen);
}

#[test]
fn def_and_ns_round_trip_through_a_fresh_namespace() {
    builtins::ns("test.integration.defns");
    let sym = symbol::intern("greeting", None);
    let s = tiny_clj_core::string::make_string("hello");
    builtins::def(sym, s);
    let looked_up = symbol::resolve("greeting").expect("def should make the symbol resolvable");
    assert_eq!(tiny_clj_core::string::as_str(looked_up), "hello");
    memory::release(sym);
    memory::release(s);
}

#[test]
fn nth_out_of_bounds_yields_nil_in_user_code() {
    builtins::runtime_init();
    let v = vector::empty();
    assert!(call("nth", &[v, Value::fixnum(0)]).is_nil());
    memory::release(v);
}

#[test]
fn bytearray_out_of_bounds_is_catchable() {
    builtins::runtime_init();
    let b = call("byte-array", &[Value::fixnum(2)]);
    let result = exception::try_catch(|| call("aget", &[b, Value::fixnum(5)]));
    let exc = result.expect_err("aget past the end should raise");
    assert_eq!(exception::exception_type(exc), "ArrayIndexOutOfBoundsException");
    memory::release(exc);
    memory::release(b);
}
