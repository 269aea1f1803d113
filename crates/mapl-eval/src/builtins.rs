use std::rc::Rc;

use mapl_core::{check_arity, Closure, Env, FnDef, MapData, MaplError, Spur, Value};

use crate::eval::eval;

/// Install the primitive library into an environment. Primitives are ordinary
/// callable values: each receives the caller's environment and the raw
/// argument expressions, enforces its own arity, and evaluates only the
/// arguments it needs.
pub fn register_builtins(env: &Env) {
    register_fn(env, "def", native_def);
    register_fn(env, "fn", native_fn);
    register_fn(env, "=", native_eq);
    register_fn(env, "this", native_this);
    register_fn(env, "next", native_next);
    register_fn(env, "prn", native_prn);
    register_fn(env, "add", native_add);
    register_fn(env, "rem", native_rem);
}

fn register_fn(
    env: &Env,
    name: &str,
    f: impl Fn(&[Value], &Env) -> Result<Value, MaplError> + 'static,
) {
    env.bind_str(name, Value::native(name, f));
}

/// `(def name expr)` binds the evaluated expr under the name and returns it.
/// `(def (name params...) body...)` builds a closure over the caller's
/// environment, binds it under the name, and returns it.
fn native_def(args: &[Value], env: &Env) -> Result<Value, MaplError> {
    match args.first() {
        Some(Value::Symbol(name)) => {
            check_arity!(args, "def", 2);
            let value = eval(&args[1], env)?;
            env.bind(*name, value.clone());
            Ok(value)
        }
        Some(Value::Call(signature)) => {
            check_arity!(args, "def", 2..);
            let (name, params) = split_signature(signature)?;
            let def = Rc::new(FnDef {
                params,
                body: args[1..].to_vec(),
            });
            let closure = Value::Closure(Rc::new(Closure {
                def,
                env: env.clone(),
            }));
            env.bind(name, closure.clone());
            Ok(closure)
        }
        Some(other) => Err(MaplError::eval(format!(
            "def binds a name or a function signature, got {other}"
        ))),
        None => Err(MaplError::arity("def", "2", 0)),
    }
}

fn split_signature(signature: &[Value]) -> Result<(Spur, Vec<Spur>), MaplError> {
    let (head, rest) = signature
        .split_first()
        .ok_or_else(|| MaplError::eval("def: empty function signature"))?;
    let name = head.as_symbol_spur().ok_or_else(|| {
        MaplError::eval(format!("def: function name must be a name, got {head}"))
    })?;
    let params = parameter_names(rest, "def")?;
    Ok((name, params))
}

fn parameter_names(exprs: &[Value], who: &str) -> Result<Vec<Spur>, MaplError> {
    exprs
        .iter()
        .map(|p| {
            p.as_symbol_spur().ok_or_else(|| {
                MaplError::eval(format!("{who}: parameter must be a name, got {p}"))
            })
        })
        .collect()
}

/// `(fn (params...) body...)` returns an anonymous closure over the caller's
/// environment. The parameter application is flattened whole: operator and
/// operands alike are parameter names.
fn native_fn(args: &[Value], env: &Env) -> Result<Value, MaplError> {
    check_arity!(args, "fn", 2..);
    let list = args[0].as_call().ok_or_else(|| {
        MaplError::eval(format!(
            "fn: parameter list must be an application form, got {}",
            args[0]
        ))
    })?;
    let params = parameter_names(list, "fn")?;
    let def = Rc::new(FnDef {
        params,
        body: args[1..].to_vec(),
    });
    Ok(Value::Closure(Rc::new(Closure {
        def,
        env: env.clone(),
    })))
}

/// Structural equality, expressed in the language's own booleans.
fn native_eq(args: &[Value], env: &Env) -> Result<Value, MaplError> {
    check_arity!(args, "=", 2);
    let left = eval(&args[0], env)?;
    let right = eval(&args[1], env)?;
    Ok(Value::truth(left == right))
}

fn native_this(args: &[Value], env: &Env) -> Result<Value, MaplError> {
    check_arity!(args, "this", 1);
    let value = eval(&args[0], env)?;
    let map = value
        .as_map()
        .ok_or_else(|| MaplError::type_error("map", value.type_name()))?;
    Ok(map.this())
}

fn native_next(args: &[Value], env: &Env) -> Result<Value, MaplError> {
    check_arity!(args, "next", 1);
    let value = eval(&args[0], env)?;
    let map = value
        .as_map()
        .ok_or_else(|| MaplError::type_error("map", value.type_name()))?;
    Ok(map.next())
}

/// Print each evaluated argument, space-separated, with a trailing newline.
fn native_prn(args: &[Value], env: &Env) -> Result<Value, MaplError> {
    let mut rendered = Vec::with_capacity(args.len());
    for arg in args {
        rendered.push(eval(arg, env)?.to_string());
    }
    println!("{}", rendered.join(" "));
    Ok(Value::empty())
}

/// Merge the entries of every argument left to right; a later argument's
/// entry overwrites an earlier one with an equal key.
fn native_add(args: &[Value], env: &Env) -> Result<Value, MaplError> {
    let mut result = MapData::new();
    for arg in args {
        let value = eval(arg, env)?;
        let map = value
            .as_map()
            .ok_or_else(|| MaplError::type_error("map", value.type_name()))?;
        result = result.merged(map);
    }
    Ok(Value::map(result))
}

/// A copy of the first argument without the second argument's key; removing
/// an absent key is an error.
fn native_rem(args: &[Value], env: &Env) -> Result<Value, MaplError> {
    check_arity!(args, "rem", 2);
    let value = eval(&args[0], env)?;
    let map = value
        .as_map()
        .ok_or_else(|| MaplError::type_error("map", value.type_name()))?;
    let key = eval(&args[1], env)?;
    let removed = map
        .removed(&key)
        .ok_or_else(|| MaplError::eval(format!("rem: map has no key {key}")))?;
    Ok(Value::map(removed))
}
