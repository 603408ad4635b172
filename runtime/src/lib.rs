//! Host-facing shell around `tiny-clj-core`: builtin registration plus the
//! `Reader`/`Evaluator` trait seams a host wires up its own reader and
//! tree-walking evaluator through.

pub mod builtins;
pub mod eval_seam;

pub use eval_seam::{eval_expr, eval_string, CallFrame, EvalState, Evaluator, Reader};
