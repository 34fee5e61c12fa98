//! gadget-tree - USB gadget composition over Linux configfs
//!
//! This crate mirrors the configfs USB gadget hierarchy in memory and
//! mutates it through typed, write-through operations.

pub mod config;
pub mod configfs;
pub mod error;
pub mod gadget;

pub use error::{ErrorKind, GadgetError, Result};
pub use gadget::State;
