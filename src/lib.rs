// Allow dead code for items that are part of the public API but only used in tests
#![allow(dead_code)]

pub mod codec;
pub mod config;
pub mod schema;
pub mod store;
pub mod synth;
pub mod writer;
