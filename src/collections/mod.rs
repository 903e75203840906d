//! Typed collections over a prefixed store.

pub mod map;
pub mod value;

pub use map::Map;
pub use value::Value;
