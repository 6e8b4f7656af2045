// Fast hash maps using AHash instead of the default SipHash.
// Import with `use crate::types::HashMap`, plus `HashMapExt` when you need
// `::new()` or `::with_capacity()`.
pub type HashMap<K, V> = ahash::HashMap<K, V>;
pub use ahash::HashMapExt;
