// session-client/src/actors/mod.rs

pub mod session_store;
