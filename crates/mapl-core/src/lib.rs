pub mod error;
pub mod value;

pub use error::{MaplError, Span};
pub use lasso::Spur;
pub use value::{
    intern, resolve, with_resolved, Closure, Env, FnDef, MapData, NativeFn, Value,
};
