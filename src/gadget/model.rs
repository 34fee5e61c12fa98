//! Arena records for the gadget tree
//!
//! The `State` owns one arena per entity kind. Parents list their
//! children by handle in name order; children point back at their parent
//! by handle. Handles are indices and stay valid for the lifetime of the
//! `State` that issued them.

use std::path::{Path, PathBuf};

use super::types::FunctionType;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) usize);

        impl $name {
            pub(crate) fn index(self) -> usize {
                self.0
            }
        }
    };
}

entity_id!(
    /// Handle to a gadget inside a `State`
    GadgetId
);
entity_id!(
    /// Handle to a function inside a `State`
    FunctionId
);
entity_id!(
    /// Handle to a configuration inside a `State`
    ConfigId
);
entity_id!(
    /// Handle to a binding inside a `State`
    BindingId
);

/// A composite USB device definition
#[derive(Debug, Clone)]
pub struct Gadget {
    pub(crate) name: String,
    pub(crate) path: PathBuf,
    pub(crate) udc: String,
    pub(crate) functions: Vec<FunctionId>,
    pub(crate) configs: Vec<ConfigId>,
}

impl Gadget {
    pub(crate) fn new(name: &str, path: &Path) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_path_buf(),
            udc: String::new(),
            functions: Vec::new(),
            configs: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Directory containing the gadget directory
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The gadget's own configfs directory
    pub fn dir(&self) -> PathBuf {
        self.path.join(&self.name)
    }

    /// Bound controller name, empty when unbound
    pub fn udc(&self) -> &str {
        &self.udc
    }

    pub fn is_bound(&self) -> bool {
        !self.udc.is_empty()
    }
}

/// One function instance of a gadget
#[derive(Debug, Clone)]
pub struct Function {
    pub(crate) name: String,
    pub(crate) path: PathBuf,
    pub(crate) function_type: FunctionType,
    pub(crate) parent: GadgetId,
}

impl Function {
    /// Full name, `<type>.<instance>`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Instance part of the name
    pub fn instance(&self) -> &str {
        self.name.split_once('.').map_or("", |(_, instance)| instance)
    }

    /// The gadget's `functions` directory
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dir(&self) -> PathBuf {
        self.path.join(&self.name)
    }

    pub fn function_type(&self) -> FunctionType {
        self.function_type
    }

    pub fn gadget(&self) -> GadgetId {
        self.parent
    }
}

/// One configuration of a gadget
#[derive(Debug, Clone)]
pub struct Config {
    pub(crate) name: String,
    pub(crate) path: PathBuf,
    pub(crate) parent: GadgetId,
    pub(crate) bindings: Vec<BindingId>,
}

impl Config {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The gadget's `configs` directory
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dir(&self) -> PathBuf {
        self.path.join(&self.name)
    }

    pub fn gadget(&self) -> GadgetId {
        self.parent
    }
}

/// A function linked into a configuration
#[derive(Debug, Clone)]
pub struct Binding {
    pub(crate) name: String,
    pub(crate) path: PathBuf,
    pub(crate) parent: ConfigId,
    pub(crate) target: Option<FunctionId>,
}

impl Binding {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The configuration directory holding the link
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the symlink itself
    pub fn link_path(&self) -> PathBuf {
        self.path.join(&self.name)
    }

    /// Bound function, `None` if the link target was not a known function
    pub fn target(&self) -> Option<FunctionId> {
        self.target
    }

    pub fn config(&self) -> ConfigId {
        self.parent
    }
}

/// Insert `id` into `siblings` keeping them in ascending name order
///
/// The new handle goes before the first sibling whose name is not less
/// than its own, so equal names (which callers reject beforehand) would
/// land in front of the existing one.
pub(crate) fn insert_ordered<I, F>(siblings: &mut Vec<I>, id: I, key: F)
where
    I: Copy,
    F: Fn(I) -> String,
{
    let name = key(id);
    let pos = siblings.partition_point(|&s| key(s) < name);
    siblings.insert(pos, id);
}
