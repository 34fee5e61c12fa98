//! USB gadget tree
//!
//! An in-memory mirror of `/sys/kernel/config/usb_gadget` that stays in
//! step with the filesystem: every create, set and bind applies the
//! matching configfs change first and only then updates the model.
//!
//! ```text
//! State
//!     └── Gadget (UDC, descriptors, strings)
//!             ├── Function  <type>.<instance>
//!             └── Config    <name>.<number>
//!                     └── Binding  symlink -> functions/<type>.<instance>
//! ```
//!
//! Entities live in arenas owned by [`State`] and are addressed through
//! the typed handles [`GadgetId`], [`FunctionId`], [`ConfigId`] and
//! [`BindingId`]. Siblings are always kept in ascending name order.

mod compose;
mod config;
mod device;
mod function;
pub mod model;
mod parser;
pub mod snapshot;
pub mod state;
pub mod types;

pub use model::{Binding, BindingId, Config, ConfigId, Function, FunctionId, Gadget, GadgetId};
pub use snapshot::{BindingSnapshot, ConfigSnapshot, FunctionSnapshot, GadgetSnapshot, StateSnapshot};
pub use state::State;
pub use types::{
    ConfigAttrs, ConfigStrings, FunctionAttrs, FunctionFamily, FunctionType, GadgetAttrs,
    GadgetStrings, MacAddr, NetAttrs, PhonetAttrs, SerialAttrs, LANG_US_ENG,
};
