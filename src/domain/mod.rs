// src/domain/mod.rs
pub mod bids;
pub mod core;
pub mod engine;
pub mod events;
pub mod listings;

pub use self::bids::*;
pub use self::core::*;
pub use self::engine::*;
pub use self::events::*;
pub use self::listings::*;
