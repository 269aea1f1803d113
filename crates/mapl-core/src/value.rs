use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use hashbrown::HashMap as SpurMap;
use lasso::{Rodeo, Spur};

use crate::error::MaplError;

thread_local! {
    static INTERNER: RefCell<Rodeo> = RefCell::new(Rodeo::default());
}

/// Intern a string, returning a Spur key.
pub fn intern(s: &str) -> Spur {
    INTERNER.with(|r| r.borrow_mut().get_or_intern(s))
}

/// Resolve a Spur key back to a String.
pub fn resolve(spur: Spur) -> String {
    INTERNER.with(|r| r.borrow().resolve(&spur).to_string())
}

/// Resolve a Spur and call f with the &str, avoiding allocation.
pub fn with_resolved<F, R>(spur: Spur, f: F) -> R
where
    F: FnOnce(&str) -> R,
{
    INTERNER.with(|r| {
        let interner = r.borrow();
        f(interner.resolve(&spur))
    })
}

/// Backing store for a mapping: entries kept in insertion order, keys unique
/// under structural equality. Equality between two `MapData` ignores entry
/// order; `this`/`next` decomposition does not.
#[derive(Debug, Clone, Default)]
pub struct MapData {
    entries: Vec<(Value, Value)>,
}

impl MapData {
    pub fn new() -> Self {
        MapData {
            entries: Vec::new(),
        }
    }

    /// Build from (key, value) pairs in order; a later duplicate key
    /// overwrites the earlier entry's value in place.
    pub fn from_entries(pairs: impl IntoIterator<Item = (Value, Value)>) -> Self {
        let mut map = MapData::new();
        for (k, v) in pairs {
            map.insert(k, v);
        }
        map
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Value, Value)> {
        self.entries.iter()
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Insert an entry. A key structurally equal to an existing one keeps its
    /// position and has its value replaced; a new key is appended.
    pub fn insert(&mut self, key: Value, value: Value) {
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    /// Left-to-right merge: entries of `other` overwrite equal keys here.
    pub fn merged(&self, other: &MapData) -> MapData {
        let mut result = self.clone();
        for (k, v) in other.iter() {
            result.insert(k.clone(), v.clone());
        }
        result
    }

    /// A copy without `key`'s entry, or None if the key is absent.
    pub fn removed(&self, key: &Value) -> Option<MapData> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        let mut entries = self.entries.clone();
        entries.remove(idx);
        Some(MapData { entries })
    }

    /// The `this` decomposition: Empty for an empty mapping, the sole entry's
    /// key for a singleton, otherwise a one-entry mapping of the first entry.
    pub fn this(&self) -> Value {
        match self.entries.as_slice() {
            [] => Value::empty(),
            [(k, _)] => k.clone(),
            [first, ..] => Value::Map(Rc::new(MapData {
                entries: vec![first.clone()],
            })),
        }
    }

    /// The `next` decomposition: Empty for an empty mapping, the sole entry's
    /// value for a singleton, otherwise a mapping of every entry after the first.
    pub fn next(&self) -> Value {
        match self.entries.as_slice() {
            [] => Value::empty(),
            [(_, v)] => v.clone(),
            [_, rest @ ..] => Value::Map(Rc::new(MapData {
                entries: rest.to_vec(),
            })),
        }
    }
}

impl PartialEq for MapData {
    fn eq(&self, other: &Self) -> bool {
        if self.entries.len() != other.entries.len() {
            return false;
        }
        // Keys are unique on both sides, so same length plus subset is set equality.
        self.entries
            .iter()
            .all(|(k, v)| other.get(k) == Some(v))
    }
}

impl Eq for MapData {}

impl Hash for MapData {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Entry order must not affect the hash, since it does not affect
        // equality. Fold per-entry hashes with a commutative operation.
        let mut acc: u64 = 0;
        for (k, v) in &self.entries {
            let mut entry_hasher = std::collections::hash_map::DefaultHasher::new();
            k.hash(&mut entry_hasher);
            v.hash(&mut entry_hasher);
            acc = acc.wrapping_add(entry_hasher.finish());
        }
        self.entries.len().hash(state);
        acc.hash(state);
    }
}

/// A primitive operation callable from mapl. It receives the raw, unevaluated
/// argument expressions plus the caller's environment, and decides for itself
/// which arguments to evaluate.
pub type NativeFnInner = dyn Fn(&[Value], &Env) -> Result<Value, MaplError>;

pub struct NativeFn {
    pub name: String,
    pub func: Box<NativeFnInner>,
}

impl NativeFn {
    pub fn new(
        name: impl Into<String>,
        f: impl Fn(&[Value], &Env) -> Result<Value, MaplError> + 'static,
    ) -> Self {
        NativeFn {
            name: name.into(),
            func: Box::new(f),
        }
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<primitive {}>", self.name)
    }
}

/// A function literal: parameter names plus a non-empty body expression sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct FnDef {
    pub params: Vec<Spur>,
    pub body: Vec<Value>,
}

/// A function value: a literal paired with the environment it was created in.
#[derive(Debug, Clone)]
pub struct Closure {
    pub def: Rc<FnDef>,
    pub env: Env,
}

/// The single expression/value type.
///
/// `Map`, `Closure`, and `Native` are runtime values; `Symbol`, `Call`, and
/// `Fn` are expression forms that reduce to values under evaluation. A `Map`
/// doubles as both: a map literal holds unevaluated entry expressions until
/// the evaluator rebuilds it.
#[derive(Debug, Clone)]
pub enum Value {
    Map(Rc<MapData>),
    Symbol(Spur),
    Call(Rc<Vec<Value>>),
    Fn(Rc<FnDef>),
    Closure(Rc<Closure>),
    Native(Rc<NativeFn>),
}

impl Value {
    /// The empty mapping: also boolean false and the natural number 0.
    pub fn empty() -> Value {
        Value::Map(Rc::new(MapData::new()))
    }

    /// The canonical truth encodings: `{{}: {}}` for true, `{}` for false.
    pub fn truth(b: bool) -> Value {
        if b {
            Value::Map(Rc::new(MapData {
                entries: vec![(Value::empty(), Value::empty())],
            }))
        } else {
            Value::empty()
        }
    }

    /// The canonical natural n: a mapping whose keys are the naturals 0..n,
    /// each mapped to Empty.
    pub fn natural(n: u64) -> Value {
        let mut entries: Vec<(Value, Value)> = Vec::with_capacity(n as usize);
        for _ in 0..n {
            // The entries built so far are exactly the next key's contents.
            let key = Value::Map(Rc::new(MapData {
                entries: entries.clone(),
            }));
            entries.push((key, Value::empty()));
        }
        Value::Map(Rc::new(MapData { entries }))
    }

    /// An indexed sequence: items keyed by the canonical naturals in order.
    pub fn sequence(items: impl IntoIterator<Item = Value>) -> Value {
        let entries = items
            .into_iter()
            .enumerate()
            .map(|(i, item)| (Value::natural(i as u64), item))
            .collect();
        Value::Map(Rc::new(MapData { entries }))
    }

    pub fn map(data: MapData) -> Value {
        Value::Map(Rc::new(data))
    }

    pub fn symbol(s: &str) -> Value {
        Value::Symbol(intern(s))
    }

    pub fn call(items: Vec<Value>) -> Value {
        Value::Call(Rc::new(items))
    }

    pub fn native(
        name: impl Into<String>,
        f: impl Fn(&[Value], &Env) -> Result<Value, MaplError> + 'static,
    ) -> Value {
        Value::Native(Rc::new(NativeFn::new(name, f)))
    }

    pub fn as_map(&self) -> Option<&Rc<MapData>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_symbol_spur(&self) -> Option<Spur> {
        match self {
            Value::Symbol(s) => Some(*s),
            _ => None,
        }
    }

    pub fn as_call(&self) -> Option<&[Value]> {
        match self {
            Value::Call(items) => Some(items),
            _ => None,
        }
    }

    /// Language-level truth: does the value equal the canonical `{{}: {}}`?
    pub fn is_true(&self) -> bool {
        *self == Value::truth(true)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Map(_) => "map",
            Value::Symbol(_) => "name",
            Value::Call(_) => "application",
            Value::Fn(_) | Value::Closure(_) => "function",
            Value::Native(_) => "primitive",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Map(a), Value::Map(b)) => Rc::ptr_eq(a, b) || a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Call(a), Value::Call(b)) => a == b,
            (Value::Fn(a), Value::Fn(b)) => a == b,
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Map(m) => m.hash(state),
            Value::Symbol(s) => s.hash(state),
            Value::Call(items) => items.hash(state),
            Value::Fn(def) => {
                def.params.hash(state);
                def.body.hash(state);
            }
            // Closures and primitives compare by identity; hash their pointer.
            Value::Closure(c) => (Rc::as_ptr(c) as usize).hash(state),
            Value::Native(n) => (Rc::as_ptr(n) as usize).hash(state),
        }
    }
}

fn write_fn_def(f: &mut fmt::Formatter<'_>, def: &FnDef) -> fmt::Result {
    write!(f, "{{(")?;
    for (i, param) in def.params.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        with_resolved(*param, |name| write!(f, "{name}"))?;
    }
    write!(f, ") ->")?;
    for expr in &def.body {
        write!(f, " {expr}")?;
    }
    write!(f, "}}")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Map(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            Value::Symbol(s) => with_resolved(*s, |name| write!(f, "{name}")),
            Value::Call(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
            Value::Fn(def) => write_fn_def(f, def),
            Value::Closure(c) => write_fn_def(f, &c.def),
            Value::Native(n) => write!(f, "<primitive {}>", n.name),
        }
    }
}

/// A mapl environment: a chain of scopes with bindings.
#[derive(Debug, Clone)]
pub struct Env {
    pub bindings: Rc<RefCell<SpurMap<Spur, Value>>>,
    pub parent: Option<Rc<Env>>,
}

impl Env {
    pub fn new() -> Self {
        Env {
            bindings: Rc::new(RefCell::new(SpurMap::new())),
            parent: None,
        }
    }

    pub fn with_parent(parent: Rc<Env>) -> Self {
        Env {
            bindings: Rc::new(RefCell::new(SpurMap::new())),
            parent: Some(parent),
        }
    }

    /// Look a name up through the scope chain, innermost first.
    pub fn lookup(&self, name: Spur) -> Option<Value> {
        if let Some(val) = self.bindings.borrow().get(&name) {
            Some(val.clone())
        } else if let Some(parent) = &self.parent {
            parent.lookup(name)
        } else {
            None
        }
    }

    pub fn lookup_str(&self, name: &str) -> Option<Value> {
        self.lookup(intern(name))
    }

    /// Bind in the local scope only; shadows, never reaches a parent.
    pub fn bind(&self, name: Spur, val: Value) {
        self.bindings.borrow_mut().insert(name, val);
    }

    pub fn bind_str(&self, name: &str, val: Value) {
        self.bind(intern(name), val);
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}
