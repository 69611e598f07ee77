#![doc = include_str!("../readme.md")]

pub mod barrier;
pub mod command;
pub mod counters;
pub mod error;
pub mod machine;
pub mod provider;
pub mod switch;
pub mod trace;
pub mod workload;
