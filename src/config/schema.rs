use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::configfs::{CONFIGFS_PATH, UDC_CLASS_PATH};
use crate::gadget::types::{
    ConfigAttrs, ConfigStrings, FunctionAttrs, FunctionType, GadgetAttrs, GadgetStrings,
};

/// What to do when an attribute write fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WritePolicy {
    /// Return the error to the caller
    #[default]
    Propagate,
    /// Log the error and report success (fire-and-forget)
    LogOnly,
}

/// What to do when one gadget (or configuration) fails to load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadPolicy {
    /// Abort the whole load and return the first error
    #[default]
    Strict,
    /// Drop the failing child with a warning and keep scanning
    SkipInvalid,
}

/// Gadget tree options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Directory holding one subdirectory per gadget
    pub gadget_root: PathBuf,
    /// Directory listing the available device controllers
    pub udc_class_path: PathBuf,
    pub write_policy: WritePolicy,
    pub load_policy: LoadPolicy,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            gadget_root: PathBuf::from(CONFIGFS_PATH),
            udc_class_path: PathBuf::from(UDC_CLASS_PATH),
            write_policy: WritePolicy::default(),
            load_policy: LoadPolicy::default(),
        }
    }
}

impl Options {
    /// Default options rooted at another gadget directory
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            gadget_root: root.into(),
            ..Self::default()
        }
    }
}

/// Declarative description of one gadget
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GadgetLayout {
    pub name: String,
    #[serde(default)]
    pub attrs: Option<GadgetAttrs>,
    #[serde(default)]
    pub strings: Option<GadgetStrings>,
    #[serde(default)]
    pub functions: Vec<FunctionLayout>,
    #[serde(default)]
    pub configs: Vec<ConfigLayout>,
    /// Controller to bind to; implies `enable`
    #[serde(default)]
    pub udc: Option<String>,
    /// Bind to the first available controller once composed
    #[serde(default)]
    pub enable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionLayout {
    #[serde(rename = "type")]
    pub function_type: FunctionType,
    pub instance: String,
    #[serde(default)]
    pub attrs: Option<FunctionAttrs>,
}

impl FunctionLayout {
    /// Resulting function directory name
    pub fn name(&self) -> String {
        format!("{}.{}", self.function_type, self.instance)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigLayout {
    pub name: String,
    #[serde(default)]
    pub attrs: Option<ConfigAttrs>,
    #[serde(default)]
    pub strings: Option<ConfigStrings>,
    #[serde(default)]
    pub bindings: Vec<BindingLayout>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingLayout {
    /// Function name (`<type>.<instance>`)
    pub function: String,
    /// Link name, defaults to the function name
    #[serde(default)]
    pub name: Option<String>,
}

impl BindingLayout {
    pub fn link_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.function)
    }
}
