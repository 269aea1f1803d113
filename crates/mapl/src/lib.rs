//! mapl: a tiny language whose only value is an associative map.
//!
//! Natural numbers, booleans, sequences, and functions are all encoded as
//! maps or as closures over them. This crate re-exports the embedding API.
//!
//! # Quick start
//!
//! ```
//! use mapl::{Interpreter, Value};
//!
//! let interp = Interpreter::new();
//! let result = interp.eval_str("(= 2 2)").unwrap();
//! assert_eq!(result, Value::truth(true));
//! ```

pub use mapl_core::{Env, MapData, MaplError, Span, Value};
pub use mapl_eval::{EvalResult, Interpreter, PRELUDE};
pub use mapl_reader::{read, read_many};
