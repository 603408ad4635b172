//! Registers the builtins `tiny-clj-core` can fully implement on its own —
//! arithmetic, comparisons, predicates, collection operations, printing,
//! and byte arrays — into the `clojure.core` namespace. `def` and `ns` are
//! exposed as plain functions rather than table entries: both need access
//! to an unevaluated symbol, which only the host evaluator can provide
//! before calling them. `if`/`do` and friends are special forms that
//! belong to the evaluator and are not defined here at all.

use tiny_clj_core::value::{Value, ValueType};
use tiny_clj_core::{bytearray, callable, equality, exception, list, map, memory, numeric, print, string, symbol, vector};

fn check_arity(name: &str, args: &[Value], min: usize, max: usize) {
    if args.len() < min || args.len() > max {
        exception::raise(
            "ArityException",
            format!("{name} expects between {min} and {max} argument(s), got {}", args.len()),
        );
    }
}

fn require_at_least(name: &str, args: &[Value], min: usize) {
    if args.len() < min {
        exception::raise("ArityException", format!("{name} expects at least {min} argument(s), got {}", args.len()));
    }
}

// --- arithmetic --------------------------------------------------------

fn fold_numeric(identity: i64, op: fn(Value, Value) -> Value, args: &[Value]) -> Value {
    match args {
        [] => Value::fixnum(identity),
        [a] => *a,
        [first, rest @ ..] => rest.iter().fold(*first, |acc, &x| op(acc, x)),
    }
}

fn plus(args: &[Value]) -> Value {
    fold_numeric(0, numeric::add, args)
}

fn minus(args: &[Value]) -> Value {
    require_at_least("-", args, 1);
    match args {
        [a] => numeric::neg(*a),
        [first, rest @ ..] => rest.iter().fold(*first, |acc, &x| numeric::sub(acc, x)),
        [] => unreachable!("checked above"),
    }
}

fn star(args: &[Value]) -> Value {
    fold_numeric(1, numeric::mul, args)
}

fn slash(args: &[Value]) -> Value {
    require_at_least("/", args, 1);
    match args {
        [a] => numeric::recip(*a),
        [first, rest @ ..] => rest.iter().fold(*first, |acc, &x| numeric::div(acc, x)),
        [] => unreachable!("checked above"),
    }
}

// --- comparisons --------------------------------------------------------

fn compare_chain(args: &[Value], ok: fn(std::cmp::Ordering) -> bool) -> Value {
    require_at_least("comparison", args, 1);
    let holds = args.windows(2).all(|w| ok(numeric::compare(w[0], w[1])));
    Value::bool(holds)
}

fn lt(args: &[Value]) -> Value {
    compare_chain(args, |o| o == std::cmp::Ordering::Less)
}

fn gt(args: &[Value]) -> Value {
    compare_chain(args, |o| o == std::cmp::Ordering::Greater)
}

fn le(args: &[Value]) -> Value {
    compare_chain(args, |o| o != std::cmp::Ordering::Greater)
}

fn ge(args: &[Value]) -> Value {
    compare_chain(args, |o| o != std::cmp::Ordering::Less)
}

fn num_eq(args: &[Value]) -> Value {
    require_at_least("=", args, 1);
    let holds = args.windows(2).all(|w| equality::equal(w[0], w[1]));
    Value::bool(holds)
}

// --- predicates ----------------------------------------------------------

fn nil_q(args: &[Value]) -> Value {
    check_arity("nil?", args, 1, 1);
    Value::bool(args[0].is_nil())
}

fn type_of_fn(args: &[Value]) -> Value {
    check_arity("type", args, 1, 1);
    let name = match args[0].type_of() {
        ValueType::Nil => "nil",
        ValueType::Bool => "bool",
        ValueType::Fixnum => "fixnum",
        ValueType::Character => "character",
        ValueType::Fixed => "fixed",
        ValueType::String => "string",
        ValueType::Symbol => "symbol",
        ValueType::List => "list",
        ValueType::Vector => "vector",
        ValueType::TransientVector => "transient-vector",
        ValueType::Map => "map",
        ValueType::TransientMap => "transient-map",
        ValueType::Seq => "seq",
        ValueType::NativeFn => "native-fn",
        ValueType::Closure => "closure",
        ValueType::Exception => "exception",
        ValueType::ByteArray => "byte-array",
    };
    symbol::intern(name, None)
}

// --- collections: polymorphic dispatch over seqables --------------------

fn count_value(args: &[Value]) -> Value {
    check_arity("count", args, 1, 1);
    let v = args[0];
    let n = match v.type_of() {
        ValueType::Nil => 0,
        ValueType::Vector | ValueType::TransientVector => vector::count(v),
        ValueType::Map | ValueType::TransientMap => map::count(v),
        ValueType::List => list::count(v),
        ValueType::String => string::char_count(v),
        ValueType::Seq => {
            let mut n = 0;
            let mut it = list::iter_of(v);
            while let Some((_, next)) = it.next() {
                n += 1;
                it = next;
            }
            n
        }
        other => exception::raise("IllegalArgumentException", format!("count not supported on {other:?}")),
    };
    Value::fixnum(n as i64)
}

fn first_fn(args: &[Value]) -> Value {
    check_arity("first", args, 1, 1);
    list::first(args[0]).unwrap_or(Value::NIL)
}

fn rest_fn(args: &[Value]) -> Value {
    check_arity("rest", args, 1, 1);
    list::rest(args[0])
}

/// `(cons x coll)`: prepends `x` to `coll`, coercing any seqable into a
/// proper list first — matching `list::cons`'s own improper-list leniency
/// only for the already-a-list fast path.
fn cons_fn(args: &[Value]) -> Value {
    check_arity("cons", args, 2, 2);
    let (x, coll) = (args[0], args[1]);
    if coll.is_nil() || matches!(coll.type_of(), ValueType::List) {
        return list::cons(memory::retain(x), memory::retain(coll));
    }
    let mut items = vec![x];
    let mut it = list::iter_of(coll);
    while let Some((head, next)) = it.next() {
        items.push(head);
        it = next;
    }
    list::make_list(&items)
}

/// Out-of-range access yields `nil` rather than raising: OOB access
/// reaching user code (as opposed to an internal invariant) is not an
/// error here.
fn nth_fn(args: &[Value]) -> Value {
    check_arity("nth", args, 2, 2);
    let (coll, idx) = (args[0], args[1].as_fixnum());
    if idx < 0 {
        return Value::NIL;
    }
    vector::nth(coll, idx as usize).unwrap_or(Value::NIL)
}

fn get_fn(args: &[Value]) -> Value {
    check_arity("get", args, 2, 3);
    let default = args.get(2).copied().unwrap_or(Value::NIL);
    map::get(args[0], args[1]).unwrap_or(default)
}

fn keys_fn(args: &[Value]) -> Value {
    check_arity("keys", args, 1, 1);
    list::make_list(&map::keys(args[0]))
}

fn vals_fn(args: &[Value]) -> Value {
    check_arity("vals", args, 1, 1);
    list::make_list(&map::vals(args[0]))
}

/// `(assoc coll k v)`: vectors grow-or-replace by index, maps insert-or-update.
fn assoc_fn(args: &[Value]) -> Value {
    check_arity("assoc", args, 3, 3);
    let (coll, k, v) = (args[0], args[1], args[2]);
    match coll.type_of() {
        ValueType::Vector => vector::assoc(coll, k.as_fixnum() as usize, v),
        ValueType::Map => map::assoc(coll, k, v),
        other => exception::raise("IllegalArgumentException", format!("assoc not supported on {other:?}")),
    }
}

/// `(conj coll x)`: appends for vectors, prepends for lists (and `nil`,
/// which reads as the empty list) — same split as real Clojure.
fn conj_fn(args: &[Value]) -> Value {
    check_arity("conj", args, 2, 2);
    let (coll, x) = (args[0], args[1]);
    match coll.type_of() {
        ValueType::Vector => vector::conj(coll, x),
        ValueType::TransientVector => {
            vector::conj_mut(coll, x);
            coll
        }
        ValueType::Nil | ValueType::List => list::cons(memory::retain(x), memory::retain(coll)),
        other => exception::raise("IllegalArgumentException", format!("conj not supported on {other:?}")),
    }
}

fn array_map_fn(args: &[Value]) -> Value {
    if args.len() % 2 != 0 {
        exception::raise("ArityException", "array-map requires an even number of arguments".to_string());
    }
    let mut m = map::empty();
    for pair in args.chunks(2) {
        let next = map::assoc(m, pair[0], pair[1]);
        memory::release(m);
        m = next;
    }
    m
}

fn transient_fn(args: &[Value]) -> Value {
    check_arity("transient", args, 1, 1);
    match args[0].type_of() {
        ValueType::Vector => vector::transient(args[0]),
        ValueType::Map => map::transient(args[0]),
        other => exception::raise("IllegalArgumentException", format!("transient not supported on {other:?}")),
    }
}

fn persistent_bang_fn(args: &[Value]) -> Value {
    check_arity("persistent!", args, 1, 1);
    match args[0].type_of() {
        ValueType::TransientVector => vector::persistent_(args[0]),
        ValueType::TransientMap => map::persistent_(args[0]),
        other => exception::raise("IllegalArgumentException", format!("persistent! not supported on {other:?}")),
    }
}

fn conj_bang_fn(args: &[Value]) -> Value {
    check_arity("conj!", args, 2, 2);
    let (coll, x) = (args[0], args[1]);
    match coll.type_of() {
        ValueType::TransientVector => {
            vector::conj_mut(coll, x);
            coll
        }
        other => exception::raise("IllegalArgumentException", format!("conj! not supported on {other:?}")),
    }
}

// --- printing -------------------------------------------------------------

fn str_fn(args: &[Value]) -> Value {
    let mut s = String::new();
    for &a in args {
        if !a.is_nil() {
            s.push_str(&print::to_string(a));
        }
    }
    string::make_string(&s)
}

fn print_fn(args: &[Value]) -> Value {
    let parts: Vec<String> = args.iter().map(|&a| print::to_string(a)).collect();
    print!("{}", parts.join(" "));
    Value::NIL
}

fn println_fn(args: &[Value]) -> Value {
    let parts: Vec<String> = args.iter().map(|&a| print::to_string(a)).collect();
    println!("{}", parts.join(" "));
    Value::NIL
}

fn pr_fn(args: &[Value]) -> Value {
    let parts: Vec<String> = args.iter().map(|&a| print::pr_str(a)).collect();
    print!("{}", parts.join(" "));
    Value::NIL
}

fn prn_fn(args: &[Value]) -> Value {
    let parts: Vec<String> = args.iter().map(|&a| print::pr_str(a)).collect();
    println!("{}", parts.join(" "));
    Value::NIL
}

// --- byte arrays -----------------------------------------------------------

fn byte_array_fn(args: &[Value]) -> Value {
    check_arity("byte-array", args, 1, 1);
    bytearray::make(args[0].as_fixnum() as usize)
}

fn aget_fn(args: &[Value]) -> Value {
    check_arity("aget", args, 2, 2);
    Value::fixnum(bytearray::aget(args[0], args[1].as_fixnum() as usize) as i64)
}

fn aset_fn(args: &[Value]) -> Value {
    check_arity("aset", args, 3, 3);
    bytearray::aset(args[0], args[1].as_fixnum() as usize, args[2].as_fixnum() as u8);
    args[0]
}

fn alength_fn(args: &[Value]) -> Value {
    check_arity("alength", args, 1, 1);
    Value::fixnum(bytearray::alength(args[0]) as i64)
}

fn aclone_fn(args: &[Value]) -> Value {
    check_arity("aclone", args, 1, 1);
    bytearray::aclone(args[0])
}

fn def_into(name: &str, func: tiny_clj_core::heap::NativeFnPtr) {
    let ns = symbol::current_namespace();
    let v = callable::make_native(Some(name), func);
    symbol::define(ns, name, v);
    memory::release(v);
}

/// Populate `clojure.core` with every builtin this crate can fully
/// implement on its own. Idempotent: re-running just redefines each name.
pub fn runtime_init() {
    symbol::set_current_namespace("clojure.core");

    def_into("+", plus);
    def_into("-", minus);
    def_into("*", star);
    def_into("/", slash);

    def_into("<", lt);
    def_into(">", gt);
    def_into("<=", le);
    def_into(">=", ge);
    def_into("=", num_eq);

    def_into("nil?", nil_q);
    def_into("type", type_of_fn);

    def_into("count", count_value);
    def_into("first", first_fn);
    def_into("rest", rest_fn);
    def_into("cons", cons_fn);
    def_into("nth", nth_fn);
    def_into("get", get_fn);
    def_into("keys", keys_fn);
    def_into("vals", vals_fn);
    def_into("assoc", assoc_fn);
    def_into("conj", conj_fn);
    def_into("array-map", array_map_fn);
    def_into("transient", transient_fn);
    def_into("persistent!", persistent_bang_fn);
    def_into("conj!", conj_bang_fn);

    def_into("str", str_fn);
    def_into("print", print_fn);
    def_into("println", println_fn);
    def_into("pr", pr_fn);
    def_into("prn", prn_fn);

    def_into("byte-array", byte_array_fn);
    def_into("aget", aget_fn);
    def_into("aset", aset_fn);
    def_into("alength", alength_fn);
    def_into("aclone", aclone_fn);
}

/// `(def sym value)`: only callable by the host evaluator, which alone has
/// access to the unevaluated symbol form before this is invoked.
pub fn def(sym: Value, value: Value) {
    let ns = symbol::current_namespace();
    symbol::define(ns, symbol::name_of(sym), value);
}

/// `(ns name)`: switches the current namespace, creating it if absent.
pub fn ns(name: &str) {
    symbol::set_current_namespace(name);
}
