//! Lexical environments.
//!
//! An environment is a cons-list of frames, innermost first, where each
//! frame is a persistent map from symbol to value — reusing `list` and
//! `map` rather than inventing a parallel structure. The call stack and
//! source position a host tracks during evaluation are not process-global
//! state here: they belong to the evaluation state a host threads through
//! its own evaluator (see `tiny-clj-runtime`'s `EvalState`), not to this
//! crate.

use crate::list;
use crate::map;
use crate::memory;
use crate::value::Value;

/// The empty environment: no bound frames.
pub fn empty_env() -> Value {
    Value::NIL
}

/// Push a new frame of `bindings` (a map) in front of `parent`.
pub fn env_extend(parent: Value, bindings: Value) -> Value {
    list::cons(memory::retain(bindings), memory::retain(parent))
}

/// Search frames innermost-first for `sym`. Borrowed.
pub fn env_lookup(env: Value, sym: Value) -> Option<Value> {
    let mut frame = env;
    while !frame.is_nil() {
        let bindings = list::first_of(frame).expect("non-nil env frame always has bindings");
        if let Some(v) = map::get(bindings, sym) {
            return Some(v);
        }
        frame = list::rest_of(frame);
    }
    None
}
