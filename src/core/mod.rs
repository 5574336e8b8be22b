// logtrawl - core/mod.rs
//
// Core layer: data model, line parsing, time-window prescan, filter
// predicate, and series extraction. Pure logic plus the boundary-line
// file reads the prescan needs; no UI, no orchestration.

pub mod filter;
pub mod model;
pub mod parser;
pub mod prescan;
pub mod series;
