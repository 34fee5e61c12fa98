//! Serializable view of the cached tree

use serde::{Deserialize, Serialize};

use super::model::ConfigId;
use super::state::State;
use super::types::FunctionType;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub gadgets: Vec<GadgetSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GadgetSnapshot {
    pub name: String,
    /// Bound controller, empty when unbound
    pub udc: String,
    pub functions: Vec<FunctionSnapshot>,
    pub configs: Vec<ConfigSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSnapshot {
    pub name: String,
    #[serde(rename = "type")]
    pub function_type: FunctionType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    pub name: String,
    pub bindings: Vec<BindingSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingSnapshot {
    pub name: String,
    /// Name of the bound function, `None` if the link did not resolve
    pub function: Option<String>,
}

impl State {
    /// Copy of the cached model in traversal order
    ///
    /// Only what the tree caches is included; attributes stay in configfs.
    pub fn snapshot(&self) -> StateSnapshot {
        let gadgets = self
            .gadgets()
            .map(|g| {
                let gadget = &self.gadgets[g.index()];
                GadgetSnapshot {
                    name: gadget.name.clone(),
                    udc: gadget.udc.clone(),
                    functions: self
                        .functions(g)
                        .map(|f| {
                            let function = &self.functions[f.index()];
                            FunctionSnapshot {
                                name: function.name.clone(),
                                function_type: function.function_type,
                            }
                        })
                        .collect(),
                    configs: self.configs(g).map(|c| self.config_snapshot(c)).collect(),
                }
            })
            .collect();

        StateSnapshot { gadgets }
    }

    fn config_snapshot(&self, config: ConfigId) -> ConfigSnapshot {
        let bindings = self
            .bindings(config)
            .map(|b| {
                let binding = &self.bindings[b.index()];
                BindingSnapshot {
                    name: binding.name.clone(),
                    function: binding
                        .target
                        .map(|f| self.functions[f.index()].name.clone()),
                }
            })
            .collect();

        ConfigSnapshot {
            name: self.configs[config.index()].name.clone(),
            bindings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::symlink;
    use tempfile::TempDir;

    #[test]
    fn test_reload_yields_equal_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let mut state = State::load(temp_dir.path()).unwrap();

        // Created out of order on purpose
        let g2 = state.create_gadget("g2", None, None).unwrap();
        let g1 = state.create_gadget("g1", None, None).unwrap();
        let rndis = state.create_function(g1, FunctionType::Rndis, "usb0", None).unwrap();
        let acm = state.create_function(g1, FunctionType::Acm, "GS0", None).unwrap();
        state.create_function(g2, FunctionType::Serial, "gs0", None).unwrap();
        let c2 = state.create_config(g1, "c.2", None, None).unwrap();
        let c1 = state.create_config(g1, "c.1", None, None).unwrap();
        state.bind_function(c1, "rndis.usb0", rndis).unwrap();
        state.bind_function(c1, "acm.GS0", acm).unwrap();
        state.bind_function(c2, "acm.GS0", acm).unwrap();
        state.enable_gadget(g1, Some("udc0")).unwrap();

        let reloaded = State::load(temp_dir.path()).unwrap();
        assert_eq!(reloaded.snapshot(), state.snapshot());

        let snapshot = state.snapshot();
        assert_eq!(snapshot.gadgets[0].name, "g1");
        assert_eq!(snapshot.gadgets[0].udc, "udc0");
        assert_eq!(snapshot.gadgets[0].configs[0].name, "c.1");
        assert_eq!(
            snapshot.gadgets[0].configs[0].bindings[0].function.as_deref(),
            Some("acm.GS0")
        );
    }

    #[test]
    fn test_snapshot_json() {
        let temp_dir = TempDir::new().unwrap();
        let g = temp_dir.path().join("g1");
        fs::create_dir_all(g.join("functions/geth.usb0")).unwrap();
        fs::create_dir_all(g.join("configs/c.1")).unwrap();
        symlink("/elsewhere/ncm.usb9", g.join("configs/c.1/ncm.usb9")).unwrap();

        let state = State::load(temp_dir.path()).unwrap();
        let json = serde_json::to_value(state.snapshot()).unwrap();
        let gadget = &json["gadgets"][0];
        assert_eq!(gadget["functions"][0]["type"], "geth");
        assert_eq!(gadget["configs"][0]["bindings"][0]["name"], "ncm.usb9");
        assert!(gadget["configs"][0]["bindings"][0]["function"].is_null());
    }

    #[test]
    fn test_snapshot_with_unrecognized_function_reads_back() {
        let temp_dir = TempDir::new().unwrap();
        let g = temp_dir.path().join("g1");
        fs::create_dir_all(g.join("functions/hid.usb0")).unwrap();
        fs::create_dir_all(g.join("functions/acm.GS0")).unwrap();

        let snapshot = State::load(temp_dir.path()).unwrap().snapshot();
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains(r#""type":"unrecognized""#));

        let parsed: StateSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, snapshot);
        assert_eq!(
            parsed.gadgets[0].functions[1].function_type,
            FunctionType::Unrecognized
        );
    }
}
