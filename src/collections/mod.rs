pub mod hash_map;
pub mod heap;
pub mod list;

pub use hash_map::{dek_hash, HashMap, ValueDestructor};
pub use heap::{heap_sort, Heap};
pub use list::{CursorMut, List};
