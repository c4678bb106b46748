#![deny(missing_docs, clippy::all, clippy::pedantic)]
#![doc = include_str!("../README.md")]

pub mod config;
pub use config::{Config, DefaultConfig, ParkImmediately};

pub mod error;
pub use error::Error;

pub mod guard;
pub use guard::{ReadGuard, WriteGuard};

pub mod lock;
pub use lock::Lock;

mod opcode;
mod state;
mod wait_queue;

#[cfg(test)]
mod tests;
