#![doc = include_str!("../readme.md")]

pub mod config;
pub mod error;
pub mod price;
pub mod scheduler;
