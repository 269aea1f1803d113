mod builtins;
mod eval;
mod prelude;

pub use builtins::register_builtins;
pub use eval::{apply, eval, EvalResult, Interpreter};
pub use prelude::PRELUDE;
