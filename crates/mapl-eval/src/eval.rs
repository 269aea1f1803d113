use std::rc::Rc;

use mapl_core::{resolve, Closure, Env, MapData, MaplError, Value};

use crate::builtins;
use crate::prelude::PRELUDE;

pub type EvalResult = Result<Value, MaplError>;

/// Reduce an expression to a value against an environment.
pub fn eval(expr: &Value, env: &Env) -> EvalResult {
    match expr {
        // A map literal re-evaluates every key and value at the point of
        // evaluation, so entries written as names resolve here, not at parse
        // time. Duplicate keys produced by evaluation overwrite.
        Value::Map(map) => {
            let mut result = MapData::new();
            for (k, v) in map.iter() {
                let key = eval(k, env)?;
                let value = eval(v, env)?;
                result.insert(key, value);
            }
            Ok(Value::map(result))
        }

        // A name resolves through the scope chain, then the found value is
        // evaluated again (idempotent for maps, identity for functions).
        Value::Symbol(name) => {
            let found = env
                .lookup(*name)
                .ok_or_else(|| MaplError::Unbound(resolve(*name)))?;
            eval(&found, env)
        }

        Value::Call(items) => {
            let Some((operator, args)) = items.split_first() else {
                // `()` is the no-op application.
                return Ok(Value::empty());
            };
            let callee = eval(operator, env)?;
            apply(&callee, args, env)
        }

        // A function literal closes over the environment it is evaluated in.
        Value::Fn(def) => Ok(Value::Closure(Rc::new(Closure {
            def: def.clone(),
            env: env.clone(),
        }))),

        Value::Closure(_) | Value::Native(_) => Ok(expr.clone()),
    }
}

/// Apply a callee to unevaluated argument expressions. The callee decides
/// which arguments to evaluate; closures and primitives share this call shape,
/// and a mapping in operator position is a key lookup.
pub fn apply(callee: &Value, args: &[Value], caller: &Env) -> EvalResult {
    match callee {
        Value::Closure(closure) => apply_closure(closure, args, caller),
        Value::Native(native) => (native.func)(args, caller),
        Value::Map(map) => {
            if args.len() != 1 {
                let rendered: Vec<String> = args.iter().map(|a| a.to_string()).collect();
                return Err(MaplError::eval(format!(
                    "a map looks up exactly one key (got ({}))",
                    rendered.join(" ")
                )));
            }
            let key = eval(&args[0], caller)?;
            Ok(map.get(&key).cloned().unwrap_or_else(Value::empty))
        }
        other => Err(MaplError::type_error("a callable value", other.type_name())),
    }
}

fn apply_closure(closure: &Closure, args: &[Value], caller: &Env) -> EvalResult {
    let params = &closure.def.params;
    if args.len() != params.len() {
        return Err(MaplError::eval(format!(
            "function called with {} arguments, but expected {}",
            args.len(),
            params.len()
        )));
    }

    // Arguments evaluate in the caller's environment; the body runs in a
    // child of the closure's defining environment (lexical scoping).
    let local = Env::with_parent(Rc::new(closure.env.clone()));
    for (param, arg) in params.iter().zip(args) {
        let value = eval(arg, caller)?;
        local.bind(*param, value);
    }

    let mut result = Value::empty();
    for expr in &closure.def.body {
        result = eval(expr, &local)?;
    }
    Ok(result)
}

/// The interpreter: a root environment with the primitives installed and the
/// bootstrap prelude replayed into it.
pub struct Interpreter {
    pub global_env: Rc<Env>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// A root environment bootstrapped with the built-in prelude.
    pub fn new() -> Self {
        Self::with_prelude(PRELUDE).expect("built-in prelude must load")
    }

    /// A root environment bootstrapped with the given prelude source. The
    /// prelude is parsed once and its forms evaluated in order, after the
    /// primitives are installed and before any user code runs. A prelude
    /// that fails to parse or evaluate fails construction.
    pub fn with_prelude(prelude: &str) -> Result<Interpreter, MaplError> {
        let forms = mapl_reader::read_many(prelude)?;
        let env = Env::new();
        builtins::register_builtins(&env);
        for form in &forms {
            eval(form, &env)?;
        }
        Ok(Interpreter {
            global_env: Rc::new(env),
        })
    }

    pub fn eval(&self, expr: &Value) -> EvalResult {
        eval(expr, &self.global_env)
    }

    /// Parse a program and evaluate its top-level forms in order, returning
    /// the value of the last (Empty for an empty program).
    pub fn eval_str(&self, input: &str) -> EvalResult {
        let exprs = mapl_reader::read_many(input)?;
        let mut result = Value::empty();
        for expr in &exprs {
            result = eval(expr, &self.global_env)?;
        }
        Ok(result)
    }
}
