//! Build a whole gadget from a declarative layout

use tracing::info;

use super::model::GadgetId;
use super::state::State;
use crate::config::GadgetLayout;
use crate::error::{GadgetError, Result};

impl State {
    /// Create the gadget described by `layout`
    ///
    /// Functions are created first, then configurations, then bindings, and
    /// finally the gadget is bound to a controller if the layout asks for
    /// it. The first error stops the run; everything created up to that
    /// point stays in place.
    pub fn apply_layout(&mut self, layout: &GadgetLayout) -> Result<GadgetId> {
        info!("Setting up USB gadget: {}", layout.name);

        let gadget = self.create_gadget(
            &layout.name,
            layout.attrs.as_ref(),
            layout.strings.as_ref(),
        )?;

        for function in &layout.functions {
            self.create_function(
                gadget,
                function.function_type,
                &function.instance,
                function.attrs.as_ref(),
            )?;
        }

        let mut configs = Vec::with_capacity(layout.configs.len());
        for config in &layout.configs {
            let id = self.create_config(
                gadget,
                &config.name,
                config.attrs.as_ref(),
                config.strings.as_ref(),
            )?;
            configs.push((id, config));
        }

        for (config, config_layout) in configs {
            for binding in &config_layout.bindings {
                let function = self.get_function(gadget, &binding.function).ok_or_else(|| {
                    GadgetError::NotFound(format!(
                        "config {} binds unknown function {}",
                        config_layout.name, binding.function
                    ))
                })?;
                self.bind_function(config, binding.link_name(), function)?;
            }
        }

        if layout.udc.is_some() || layout.enable {
            self.enable_gadget(gadget, layout.udc.as_deref())?;
        }

        info!("USB gadget {} setup complete", layout.name);
        Ok(gadget)
    }
}
