//! Configurations and the function bindings linked into them

use std::path::PathBuf;
use tracing::{debug, info};

use super::device::validate_name;
use super::model::{insert_ordered, Binding, BindingId, Config, ConfigId, FunctionId, GadgetId};
use super::state::State;
use super::types::{ConfigAttrs, ConfigStrings, LANG_US_ENG};
use crate::configfs::{
    create_dir, create_symlink, dir_exists, ensure_dir, lang_dir, read_dec, read_hex,
    read_string, write_dec, write_hex8, write_string, CONFIGS_DIR, STRINGS_DIR,
};
use crate::error::{GadgetError, Result};

impl State {
    /// Create a configuration, optionally writing its attributes and US
    /// English strings
    ///
    /// As with gadgets and functions, a failed attribute write leaves the
    /// created configuration in the tree.
    pub fn create_config(
        &mut self,
        gadget: GadgetId,
        name: &str,
        attrs: Option<&ConfigAttrs>,
        strings: Option<&ConfigStrings>,
    ) -> Result<ConfigId> {
        validate_name("config", name)?;
        let cpath = self.gadget(gadget)?.dir().join(CONFIGS_DIR);
        if self.get_config(gadget, name).is_some() {
            return Err(GadgetError::InvalidParam(format!(
                "duplicate config name {}",
                name
            )));
        }

        ensure_dir(&cpath)?;
        create_dir(&cpath.join(name))?;

        let id = ConfigId(self.configs.len());
        self.configs.push(Config {
            name: name.to_string(),
            path: cpath,
            parent: gadget,
            bindings: Vec::new(),
        });
        let configs = &self.configs;
        insert_ordered(&mut self.gadgets[gadget.index()].configs, id, |c| {
            configs[c.index()].name.clone()
        });

        if let Some(attrs) = attrs {
            self.set_config_attrs(id, attrs)?;
        }
        if let Some(strings) = strings {
            self.set_config_strings(id, LANG_US_ENG, strings)?;
        }

        info!("Created config {}", name);
        Ok(id)
    }

    pub fn config_attrs(&self, config: ConfigId) -> Result<ConfigAttrs> {
        let c = self.config(config)?;
        Ok(ConfigAttrs {
            max_power: read_dec(c.path(), c.name(), "MaxPower")? as u16,
            bm_attributes: read_hex(c.path(), c.name(), "bmAttributes")? as u8,
        })
    }

    pub fn set_config_attrs(&mut self, config: ConfigId, attrs: &ConfigAttrs) -> Result<()> {
        let c = self.config(config)?;
        let result = write_dec(c.path(), c.name(), "MaxPower", attrs.max_power.into())
            .and_then(|_| write_hex8(c.path(), c.name(), "bmAttributes", attrs.bm_attributes));
        self.commit(result)
    }

    /// Maximum power draw in mA
    pub fn set_config_max_power(&mut self, config: ConfigId, max_power: u16) -> Result<()> {
        let c = self.config(config)?;
        let result = write_dec(c.path(), c.name(), "MaxPower", max_power.into());
        self.commit(result)
    }

    pub fn set_config_bm_attrs(&mut self, config: ConfigId, bm_attributes: u8) -> Result<()> {
        let c = self.config(config)?;
        let result = write_hex8(c.path(), c.name(), "bmAttributes", bm_attributes);
        self.commit(result)
    }

    fn config_strings_dir(&self, config: ConfigId, lang: u16) -> Result<PathBuf> {
        Ok(self
            .config(config)?
            .dir()
            .join(STRINGS_DIR)
            .join(lang_dir(lang)))
    }

    /// Read the configuration string of one language, `None` if absent
    pub fn config_strings(&self, config: ConfigId, lang: u16) -> Result<Option<ConfigStrings>> {
        let dir = self.config_strings_dir(config, lang)?;
        if !dir_exists(&dir) {
            return Ok(None);
        }
        Ok(Some(ConfigStrings {
            configuration: read_string(&dir, "", "configuration")?,
        }))
    }

    pub fn set_config_strings(
        &mut self,
        config: ConfigId,
        lang: u16,
        strings: &ConfigStrings,
    ) -> Result<()> {
        self.set_config_string(config, lang, &strings.configuration)
    }

    pub fn set_config_string(&mut self, config: ConfigId, lang: u16, configuration: &str) -> Result<()> {
        let dir = self.config_strings_dir(config, lang)?;
        let result =
            ensure_dir(&dir).and_then(|_| write_string(&dir, "", "configuration", configuration));
        self.commit(result)
    }

    /// Link `function` into `config` under `name`
    ///
    /// A configuration holds each function at most once, and only
    /// functions of its own gadget.
    pub fn bind_function(
        &mut self,
        config: ConfigId,
        name: &str,
        function: FunctionId,
    ) -> Result<BindingId> {
        validate_name("binding", name)?;
        let c = self.config(config)?;
        let f = self.function(function)?;

        if f.gadget() != c.gadget() {
            return Err(GadgetError::InvalidParam(format!(
                "function {} belongs to another gadget than config {}",
                f.name(),
                c.name()
            )));
        }
        if self.get_binding(config, name).is_some() {
            return Err(GadgetError::InvalidParam(format!(
                "duplicate binding name {} in config {}",
                name,
                c.name()
            )));
        }
        if self.get_link_binding(config, function).is_some() {
            return Err(GadgetError::InvalidParam(format!(
                "function {} is already bound to config {}",
                f.name(),
                c.name()
            )));
        }

        let bpath = c.dir();
        create_symlink(&f.dir(), &bpath.join(name))?;
        debug!("Linked {} into {}", f.name(), bpath.display());

        let id = BindingId(self.bindings.len());
        self.bindings.push(Binding {
            name: name.to_string(),
            path: bpath,
            parent: config,
            target: Some(function),
        });
        let bindings = &self.bindings;
        insert_ordered(&mut self.configs[config.index()].bindings, id, |b| {
            bindings[b.index()].name.clone()
        });

        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::gadget::types::FunctionType;
    use std::fs;
    use tempfile::TempDir;

    fn binding_names(state: &State, config: ConfigId) -> Vec<String> {
        state
            .bindings(config)
            .map(|b| state.binding(b).unwrap().name().to_string())
            .collect()
    }

    #[test]
    fn test_create_config_sorted() {
        let temp_dir = TempDir::new().unwrap();
        let mut state = State::load(temp_dir.path()).unwrap();
        let g = state.create_gadget("g1", None, None).unwrap();

        for name in ["c.2", "c.1", "b.1"] {
            state.create_config(g, name, None, None).unwrap();
        }
        let names: Vec<_> = state
            .configs(g)
            .map(|c| state.config(c).unwrap().name().to_string())
            .collect();
        assert_eq!(names, vec!["b.1", "c.1", "c.2"]);

        let err = state.create_config(g, "c.1", None, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParam);
        assert_eq!(state.configs(g).count(), 3);
    }

    #[test]
    fn test_config_attrs_and_strings() {
        let temp_dir = TempDir::new().unwrap();
        let mut state = State::load(temp_dir.path()).unwrap();
        let g = state.create_gadget("g1", None, None).unwrap();
        let attrs = ConfigAttrs {
            max_power: 250,
            bm_attributes: 0xc0,
        };
        let strings = ConfigStrings {
            configuration: "CDC ECM".to_string(),
        };
        let c = state
            .create_config(g, "c.1", Some(&attrs), Some(&strings))
            .unwrap();

        let dir = state.config(c).unwrap().dir();
        assert_eq!(fs::read_to_string(dir.join("MaxPower")).unwrap(), "250\n");
        assert_eq!(fs::read_to_string(dir.join("bmAttributes")).unwrap(), "0xc0\n");
        assert_eq!(state.config_attrs(c).unwrap(), attrs);
        assert_eq!(state.config_strings(c, LANG_US_ENG).unwrap(), Some(strings));
        assert_eq!(state.config_strings(c, 0x40c).unwrap(), None);

        state.set_config_max_power(c, 100).unwrap();
        state.set_config_bm_attrs(c, 0x80).unwrap();
        state.set_config_string(c, 0x40c, "Ethernet").unwrap();
        assert_eq!(
            state.config_attrs(c).unwrap(),
            ConfigAttrs {
                max_power: 100,
                bm_attributes: 0x80
            }
        );
        assert_eq!(
            state.config_strings(c, 0x40c).unwrap().unwrap().configuration,
            "Ethernet"
        );
    }

    #[test]
    fn test_max_power_above_255() {
        let temp_dir = TempDir::new().unwrap();
        let mut state = State::load(temp_dir.path()).unwrap();
        let g = state.create_gadget("g1", None, None).unwrap();
        let c = state.create_config(g, "c.1", None, None).unwrap();
        let dir = state.config(c).unwrap().dir();

        // Written the way a hand-built gadget setup script would
        fs::write(dir.join("MaxPower"), "500\n").unwrap();
        fs::write(dir.join("bmAttributes"), "0x80\n").unwrap();
        assert_eq!(state.config_attrs(c).unwrap().max_power, 500);

        state.set_config_max_power(c, 900).unwrap();
        assert_eq!(fs::read_to_string(dir.join("MaxPower")).unwrap(), "900\n");
        assert_eq!(state.config_attrs(c).unwrap().max_power, 900);
    }

    #[test]
    fn test_ecm_gadget_scenario() {
        let temp_dir = TempDir::new().unwrap();
        let mut state = State::load(temp_dir.path()).unwrap();
        let g = state.create_gadget_vid_pid("g1", 0x1d6b, 0x0104).unwrap();
        let f = state.create_function(g, FunctionType::Ecm, "usb0", None).unwrap();
        let c = state.create_config(g, "c.1", None, None).unwrap();
        let b = state.bind_function(c, "ecm.usb0", f).unwrap();

        let link = temp_dir.path().join("g1/configs/c.1/ecm.usb0");
        assert_eq!(
            fs::read_link(&link).unwrap(),
            temp_dir.path().join("g1/functions/ecm.usb0")
        );
        assert_eq!(state.binding(b).unwrap().link_path(), link);
        assert_eq!(state.get_binding_target(b), Some(f));
        assert_eq!(state.get_link_binding(c, f), Some(b));

        // A fresh load resolves the symlink to the same function
        let reloaded = State::load(temp_dir.path()).unwrap();
        let g = reloaded.get_gadget("g1").unwrap();
        let c = reloaded.get_config(g, "c.1").unwrap();
        let b = reloaded.get_binding(c, "ecm.usb0").unwrap();
        let target = reloaded.get_binding_target(b).unwrap();
        assert_eq!(reloaded.function(target).unwrap().name(), "ecm.usb0");
        assert_eq!(
            reloaded.function(target).unwrap().function_type(),
            FunctionType::Ecm
        );
    }

    #[test]
    fn test_duplicate_bindings_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let mut state = State::load(temp_dir.path()).unwrap();
        let g = state.create_gadget("g1", None, None).unwrap();
        let ecm = state.create_function(g, FunctionType::Ecm, "usb0", None).unwrap();
        let acm = state.create_function(g, FunctionType::Acm, "GS0", None).unwrap();
        let c = state.create_config(g, "c.1", None, None).unwrap();
        state.bind_function(c, "net", ecm).unwrap();

        let err = state.bind_function(c, "net2", ecm).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParam);
        let err = state.bind_function(c, "net", acm).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParam);

        assert_eq!(binding_names(&state, c), vec!["net"]);
        assert!(!temp_dir.path().join("g1/configs/c.1/net2").exists());
    }

    #[test]
    fn test_bindings_sorted() {
        let temp_dir = TempDir::new().unwrap();
        let mut state = State::load(temp_dir.path()).unwrap();
        let g = state.create_gadget("g1", None, None).unwrap();
        let c = state.create_config(g, "c.1", None, None).unwrap();
        for (ty, instance, link) in [
            (FunctionType::Rndis, "usb0", "z"),
            (FunctionType::Acm, "GS0", "m"),
            (FunctionType::Ecm, "usb0", "a"),
        ] {
            let f = state.create_function(g, ty, instance, None).unwrap();
            state.bind_function(c, link, f).unwrap();
        }

        assert_eq!(binding_names(&state, c), vec!["a", "m", "z"]);
        let first = state.first_binding(c).unwrap();
        assert_eq!(state.binding(first).unwrap().config(), c);
    }

    #[test]
    fn test_bind_foreign_function_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let mut state = State::load(temp_dir.path()).unwrap();
        let g1 = state.create_gadget("g1", None, None).unwrap();
        let g2 = state.create_gadget("g2", None, None).unwrap();
        let f = state.create_function(g2, FunctionType::Acm, "GS0", None).unwrap();
        let c = state.create_config(g1, "c.1", None, None).unwrap();

        let err = state.bind_function(c, "acm.GS0", f).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParam);
        assert_eq!(state.first_binding(c), None);
    }
}
