// logtrawl - app/mod.rs
//
// Application layer: load orchestration on a background thread and the
// engine that owns the entry set, criteria, and visible list.

pub mod engine;
pub mod loader;
