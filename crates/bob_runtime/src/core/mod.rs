//! Values, heap records, the collector and property stores.

pub mod gc;
pub mod heap;
pub(crate) mod property;
pub(crate) mod symbol;
pub mod value;

pub use gc::GcStats;
pub use heap::{Heap, NativeResource};
pub use value::Value;
