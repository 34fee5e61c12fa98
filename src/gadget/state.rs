//! Gadget tree root: arena ownership, lookup and ordered traversal

use std::path::Path;
use tracing::error;

use super::model::{
    Binding, BindingId, Config, ConfigId, Function, FunctionId, Gadget, GadgetId,
};
use crate::config::{Options, WritePolicy};
use crate::error::{GadgetError, Result};

/// In-memory mirror of a configfs gadget tree
///
/// Created by [`State::load`]; every handle it hands out is only
/// meaningful for this instance. The backing directory is assumed to be
/// modified by nobody else while the `State` is alive.
#[derive(Debug)]
pub struct State {
    pub(crate) options: Options,
    pub(crate) gadget_order: Vec<GadgetId>,
    pub(crate) gadgets: Vec<Gadget>,
    pub(crate) functions: Vec<Function>,
    pub(crate) configs: Vec<Config>,
    pub(crate) bindings: Vec<Binding>,
}

/// Arena sizes, used to roll back a partially loaded child
#[derive(Debug, Clone, Copy)]
pub(crate) struct ArenaMark {
    gadgets: usize,
    functions: usize,
    configs: usize,
    bindings: usize,
}

fn next_of<I: Copy + PartialEq>(siblings: &[I], current: I) -> Option<I> {
    let pos = siblings.iter().position(|&s| s == current)?;
    siblings.get(pos + 1).copied()
}

impl State {
    pub(crate) fn empty(options: Options) -> Self {
        Self {
            options,
            gadget_order: Vec::new(),
            gadgets: Vec::new(),
            functions: Vec::new(),
            configs: Vec::new(),
            bindings: Vec::new(),
        }
    }

    /// Root directory holding the gadgets
    pub fn configfs_path(&self) -> &Path {
        &self.options.gadget_root
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub(crate) fn mark(&self) -> ArenaMark {
        ArenaMark {
            gadgets: self.gadgets.len(),
            functions: self.functions.len(),
            configs: self.configs.len(),
            bindings: self.bindings.len(),
        }
    }

    /// Drop every record allocated after `mark`
    ///
    /// Only valid while nothing allocated after `mark` is referenced from
    /// an ordering list outside the rolled back subtree.
    pub(crate) fn rollback(&mut self, mark: ArenaMark) {
        self.gadgets.truncate(mark.gadgets);
        self.functions.truncate(mark.functions);
        self.configs.truncate(mark.configs);
        self.bindings.truncate(mark.bindings);
    }

    /// Apply the write policy to the outcome of a backing-store write
    pub(crate) fn commit(&self, result: Result<()>) -> Result<()> {
        match (result, self.options.write_policy) {
            (Err(e), WritePolicy::LogOnly) => {
                error!("Ignoring failed write: {}", e);
                Ok(())
            }
            (result, _) => result,
        }
    }

    // Entity records

    pub fn gadget(&self, id: GadgetId) -> Result<&Gadget> {
        self.gadgets
            .get(id.index())
            .ok_or_else(|| GadgetError::InvalidParam(format!("unknown gadget handle {:?}", id)))
    }

    pub fn function(&self, id: FunctionId) -> Result<&Function> {
        self.functions
            .get(id.index())
            .ok_or_else(|| GadgetError::InvalidParam(format!("unknown function handle {:?}", id)))
    }

    pub fn config(&self, id: ConfigId) -> Result<&Config> {
        self.configs
            .get(id.index())
            .ok_or_else(|| GadgetError::InvalidParam(format!("unknown config handle {:?}", id)))
    }

    pub fn binding(&self, id: BindingId) -> Result<&Binding> {
        self.bindings
            .get(id.index())
            .ok_or_else(|| GadgetError::InvalidParam(format!("unknown binding handle {:?}", id)))
    }

    pub(crate) fn gadget_mut(&mut self, id: GadgetId) -> Result<&mut Gadget> {
        self.gadgets
            .get_mut(id.index())
            .ok_or_else(|| GadgetError::InvalidParam(format!("unknown gadget handle {:?}", id)))
    }

    // Lookup by name

    pub fn get_gadget(&self, name: &str) -> Option<GadgetId> {
        self.gadget_order
            .iter()
            .copied()
            .find(|&g| self.gadgets[g.index()].name == name)
    }

    pub fn get_function(&self, gadget: GadgetId, name: &str) -> Option<FunctionId> {
        self.functions(gadget)
            .find(|&f| self.functions[f.index()].name == name)
    }

    pub fn get_config(&self, gadget: GadgetId, name: &str) -> Option<ConfigId> {
        self.configs(gadget)
            .find(|&c| self.configs[c.index()].name == name)
    }

    pub fn get_binding(&self, config: ConfigId, name: &str) -> Option<BindingId> {
        self.bindings(config)
            .find(|&b| self.bindings[b.index()].name == name)
    }

    /// Binding of `config` that targets `function`, if any
    pub fn get_link_binding(&self, config: ConfigId, function: FunctionId) -> Option<BindingId> {
        self.bindings(config)
            .find(|&b| self.bindings[b.index()].target == Some(function))
    }

    pub fn get_binding_target(&self, binding: BindingId) -> Option<FunctionId> {
        self.bindings.get(binding.index()).and_then(|b| b.target)
    }

    // Ordered traversal

    pub fn gadgets(&self) -> impl Iterator<Item = GadgetId> + '_ {
        self.gadget_order.iter().copied()
    }

    pub fn functions(&self, gadget: GadgetId) -> impl Iterator<Item = FunctionId> + '_ {
        self.gadgets
            .get(gadget.index())
            .map_or(&[][..], |g| g.functions.as_slice())
            .iter()
            .copied()
    }

    pub fn configs(&self, gadget: GadgetId) -> impl Iterator<Item = ConfigId> + '_ {
        self.gadgets
            .get(gadget.index())
            .map_or(&[][..], |g| g.configs.as_slice())
            .iter()
            .copied()
    }

    pub fn bindings(&self, config: ConfigId) -> impl Iterator<Item = BindingId> + '_ {
        self.configs
            .get(config.index())
            .map_or(&[][..], |c| c.bindings.as_slice())
            .iter()
            .copied()
    }

    pub fn first_gadget(&self) -> Option<GadgetId> {
        self.gadget_order.first().copied()
    }

    pub fn next_gadget(&self, gadget: GadgetId) -> Option<GadgetId> {
        next_of(&self.gadget_order, gadget)
    }

    pub fn first_function(&self, gadget: GadgetId) -> Option<FunctionId> {
        self.functions(gadget).next()
    }

    pub fn next_function(&self, function: FunctionId) -> Option<FunctionId> {
        let parent = self.functions.get(function.index())?.parent;
        next_of(&self.gadgets[parent.index()].functions, function)
    }

    pub fn first_config(&self, gadget: GadgetId) -> Option<ConfigId> {
        self.configs(gadget).next()
    }

    pub fn next_config(&self, config: ConfigId) -> Option<ConfigId> {
        let parent = self.configs.get(config.index())?.parent;
        next_of(&self.gadgets[parent.index()].configs, config)
    }

    pub fn first_binding(&self, config: ConfigId) -> Option<BindingId> {
        self.bindings(config).next()
    }

    pub fn next_binding(&self, binding: BindingId) -> Option<BindingId> {
        let parent = self.bindings.get(binding.index())?.parent;
        next_of(&self.configs[parent.index()].bindings, binding)
    }
}
