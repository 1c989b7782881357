pub mod function;
mod value;

pub use function::{ArgSpec, Function, Lambda, NativeFn, NativeFunction, ReentrantFn};
pub use value::{Value, format_float, repr_str};

pub(crate) use value::dict_insert;
