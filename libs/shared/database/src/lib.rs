pub mod kv;

pub use kv::{get_json, set_json, FileStore, KeyValueStore, MemoryStore, PersistenceError};
