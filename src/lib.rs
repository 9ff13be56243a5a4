// src/lib.rs
pub mod config;
pub mod directory;
pub mod domain;
pub mod money;
pub mod notify;
pub mod persistence;
pub mod web;

pub use domain::*;
pub use money::*;
