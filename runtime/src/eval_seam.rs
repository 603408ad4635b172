//! Trait seams for the reader and evaluator.
//!
//! Neither a reader nor a tree-walking evaluator is implemented here —
//! both are out of scope for this crate. `Reader` and `Evaluator` exist so
//! `eval_string`/`eval_expr` are real, testable plumbing (a test double
//! that just looks up symbols can exercise the whole call path) rather
//! than prose: a host application supplies the real implementations.

use tiny_clj_core::exception;
use tiny_clj_core::memory;
use tiny_clj_core::value::Value;

/// Parses one form of source text into a `Value`. A real implementation
/// lives in a host application or a separate reader crate; this is the
/// seam it plugs into.
pub trait Reader {
    fn read(&mut self, src: &str) -> Value;
}

/// One entry in the call stack, pushed on entry to a callable and popped on
/// return (normal or exceptional).
pub struct CallFrame {
    pub name: Option<Box<str>>,
    pub file: Box<str>,
    pub line: u32,
    pub column: u32,
}

/// Per-evaluation state threaded through `eval_expr` calls: the current
/// lexical environment frame chain (see `tiny_clj_core::env`), the
/// evaluation call stack, and the current source position — bundled here
/// rather than scattered across free-standing process-wide thread-locals,
/// since a host's evaluator is the only thing that actually needs them and
/// already carries this struct through every call.
pub struct EvalState {
    pub env: Value,
    call_stack: Vec<CallFrame>,
    source_file: Box<str>,
    source_line: u32,
    source_column: u32,
}

impl EvalState {
    pub fn new() -> EvalState {
        EvalState {
            env: tiny_clj_core::env::empty_env(),
            call_stack: Vec::new(),
            source_file: Box::from(""),
            source_line: 0,
            source_column: 0,
        }
    }

    pub fn push_call_frame(&mut self, frame: CallFrame) {
        self.call_stack.push(frame);
    }

    pub fn pop_call_frame(&mut self) {
        self.call_stack
            .pop()
            .expect("pop_call_frame called on an empty call stack");
    }

    pub fn call_depth(&self) -> usize {
        self.call_stack.len()
    }

    /// Innermost-first snapshot of call-frame names, for stack traces.
    pub fn call_stack_names(&self) -> Vec<Option<Box<str>>> {
        self.call_stack.iter().rev().map(|f| f.name.clone()).collect()
    }

    pub fn set_source_position(&mut self, file: &str, line: u32, column: u32) {
        self.source_file = file.into();
        self.source_line = line;
        self.source_column = column;
    }

    pub fn source_position(&self) -> (&str, u32, u32) {
        (self.source_file.as_ref(), self.source_line, self.source_column)
    }

    /// Raise `ty`/`message` attributed to this state's current source
    /// position, the way a host evaluator should in preference to bare
    /// `tiny_clj_core::exception::raise` (which carries no position).
    pub fn raise(&self, ty: &str, message: impl Into<String>) -> ! {
        let (file, line, column) = self.source_position();
        exception::raise_at(ty, message, file, line, column)
    }
}

impl Default for EvalState {
    fn default() -> Self {
        EvalState::new()
    }
}

/// Evaluates a single expression `Value` (special forms like `if`/`do`,
/// function application, symbol resolution) against `state`. The real
/// tree-walking evaluator lives outside this crate.
pub trait Evaluator {
    fn eval_expr(&mut self, expr: Value, state: &mut EvalState) -> Value;
}

/// Read and evaluate one form of `src`. Autoreleases its result into
/// whatever autorelease pool the caller currently has active — the
/// caller must `memory::pool_push()` before calling and either retain the
/// result or let `memory::pool_pop()` release it.
pub fn eval_string(reader: &mut dyn Reader, evaluator: &mut dyn Evaluator, src: &str, state: &mut EvalState) -> Value {
    let expr = reader.read(src);
    let result = eval_expr(evaluator, expr, state);
    memory::release(expr);
    result
}

/// Evaluate an already-parsed expression. Autoreleases its result the
/// same way `eval_string` does.
pub fn eval_expr(evaluator: &mut dyn Evaluator, expr: Value, state: &mut EvalState) -> Value {
    let result = evaluator.eval_expr(expr, state);
    memory::autorelease(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiny_clj_core::symbol;

    struct EchoReader;
    impl Reader for EchoReader {
        fn read(&mut self, _src: &str) -> Value {
            symbol::intern("answer", None)
        }
    }

    struct LookupEvaluator;
    impl Evaluator for LookupEvaluator {
        fn eval_expr(&mut self, expr: Value, state: &mut EvalState) -> Value {
            tiny_clj_core::env::env_lookup(state.env, expr).unwrap_or(Value::NIL)
        }
    }

    #[test]
    fn eval_string_delegates_through_reader_and_evaluator() {
        let mut state = EvalState::new();
        let sym = symbol::intern("answer", None);
        let bindings = tiny_clj_core::map::assoc(tiny_clj_core::map::empty(), sym, Value::fixnum(42));
        state.env = tiny_clj_core::env::env_extend(state.env, bindings);
        memory::release(bindings);

        memory::pool_push();
        let result = eval_string(&mut EchoReader, &mut LookupEvaluator, "answer", &mut state);
        assert_eq!(result.as_fixnum(), 42);
        memory::pool_pop();

        memory::release(state.env);
        memory::release(sym);
    }

    #[test]
    fn call_stack_push_pop_tracks_depth() {
        let mut state = EvalState::new();
        assert_eq!(state.call_depth(), 0);
        state.push_call_frame(CallFrame {
            name: Some("foo".into()),
            file: "test.clj".into(),
            line: 1,
            column: 1,
        });
        assert_eq!(state.call_depth(), 1);
        assert_eq!(state.call_stack_names(), vec![Some("foo".into())]);
        state.pop_call_frame();
        assert_eq!(state.call_depth(), 0);
    }

    #[test]
    fn raise_uses_current_source_position() {
        let mut state = EvalState::new();
        state.set_source_position("test.clj", 7, 3);
        let result = tiny_clj_core::exception::try_catch(|| state.raise("BoomException", "boom"));
        let exc = result.expect_err("raise should produce a catchable exception");
        assert_eq!(tiny_clj_core::exception::exception_type(exc), "BoomException");
        memory::release(exc);
    }
}
