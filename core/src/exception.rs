//! Exception machinery: a thread-local stack of handler frames, non-local
//! unwind via `std::panic`, and the `Exception` heap value.
//!
//! A protected region is a `try_catch` call. It pushes a frame
//! (`Installed` -> `Active`), runs its body under `catch_unwind`, and on
//! an exception drains every autorelease pool opened since the frame was
//! installed before handing control to the caller (`Caught`) — this is
//! a pool-drain-before-handler discipline. A panic that isn't
//! one of our own `ExceptionPanic` payloads is resumed rather than
//! swallowed, so genuine Rust bugs still abort the process instead of
//! masquerading as a Lisp exception.

use crate::heap::{self, ExceptionObj, HeapData};
use crate::memory;
use crate::value::Value;
use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameState {
    Installed,
    Active,
    Caught,
    Retired,
}

struct Frame {
    state: Cell<FrameState>,
    pool_depth_at_install: usize,
}

thread_local! {
    static FRAMES: std::cell::RefCell<Vec<Frame>> = const { std::cell::RefCell::new(Vec::new()) };
}

/// The panic payload used to carry a Lisp exception through `catch_unwind`.
/// Private to this module: `raise`/`raise_object` are the only producers,
/// `try_catch` the only consumer.
struct ExceptionPanic(Value);

pub fn make_exception(ty: &str, message: &str, file: &str, line: u32, column: u32) -> Value {
    let ptr = heap::alloc(HeapData::Exception(ExceptionObj {
        ty: ty.into(),
        message: message.into(),
        file: file.into(),
        line,
        column,
    }));
    Value::from_heap_ptr(ptr)
}

/// Owned, not borrowed: unlike a symbol's name (interned for the life of
/// the process), an `Exception` is an ordinary refcounted heap object that
/// can be freed out from under a borrowed reference, so this copies rather
/// than claiming a `'static` lifetime it can't back up.
pub fn exception_type(v: Value) -> String {
    // Safety: caller guarantees `v` is a live Exception heap value.
    match unsafe { &(*v.as_heap_ptr()).data } {
        HeapData::Exception(e) => e.ty.to_string(),
        _ => panic!("expected an exception value"),
    }
}

pub fn exception_message(v: Value) -> String {
    // Safety: caller guarantees `v` is a live Exception heap value.
    match unsafe { &(*v.as_heap_ptr()).data } {
        HeapData::Exception(e) => e.message.to_string(),
        _ => panic!("expected an exception value"),
    }
}

/// Throw a freshly built exception of kind `ty` with `message`, with no
/// source position attached. Diverges: control never returns to the caller
/// on this path.
///
/// Internal callers in this crate raise through here, since they have no
/// notion of source position — that belongs to a host's evaluation state.
/// A host evaluator that does track source position should call
/// `raise_at` instead, so the exception carries it.
pub fn raise(ty: &str, message: impl Into<String>) -> ! {
    raise_at(ty, message, "", 0, 0)
}

/// Throw a freshly built exception of kind `ty` with `message`, attributing
/// it to `file`/`line`/`column`. Diverges: control never returns to the
/// caller on this path.
pub fn raise_at(ty: &str, message: impl Into<String>, file: &str, line: u32, column: u32) -> ! {
    let exc = make_exception(ty, &message.into(), file, line, column);
    raise_object(exc)
}

/// Throw an already-constructed `Exception` value, taking ownership of its
/// one reference.
pub fn raise_object(exc: Value) -> ! {
    panic::panic_any(ExceptionPanic(exc))
}

/// Run `body` as a protected region. `Ok` on normal completion; `Err` with
/// the caught `Exception` value (owned) if `body` raised one. Any other
/// panic is resumed rather than caught, so it keeps unwinding past this
/// frame.
pub fn try_catch<F>(body: F) -> Result<Value, Value>
where
    F: FnOnce() -> Value,
{
    let frame = Frame {
        state: Cell::new(FrameState::Installed),
        pool_depth_at_install: memory::pool_depth(),
    };
    FRAMES.with(|f| f.borrow_mut().push(frame));
    FRAMES.with(|f| {
        f.borrow()
            .last()
            .expect("frame just pushed")
            .state
            .set(FrameState::Active)
    });

    let result = panic::catch_unwind(AssertUnwindSafe(body));

    match result {
        Ok(v) => {
            FRAMES.with(|f| {
                let frames = f.borrow_mut();
                frames.last().expect("frame still installed").state.set(FrameState::Retired);
            });
            FRAMES.with(|f| f.borrow_mut().pop());
            Ok(v)
        }
        Err(payload) => match payload.downcast::<ExceptionPanic>() {
            Ok(boxed) => {
                let target_depth = FRAMES.with(|f| f.borrow().last().expect("frame still installed").pool_depth_at_install);
                while memory::pool_depth() > target_depth {
                    memory::pool_pop();
                }
                FRAMES.with(|f| {
                    let frames = f.borrow_mut();
                    frames.last().expect("frame still installed").state.set(FrameState::Caught);
                });
                FRAMES.with(|f| f.borrow_mut().pop());
                Err(boxed.0)
            }
            Err(foreign) => {
                FRAMES.with(|f| f.borrow_mut().pop());
                panic::resume_unwind(foreign)
            }
        },
    }
}

/// Number of handler frames currently installed, for diagnostics.
pub fn handler_depth() -> usize {
    FRAMES.with(|f| f.borrow().len())
}
