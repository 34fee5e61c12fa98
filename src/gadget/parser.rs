//! Build the in-memory tree from an existing configfs hierarchy

use std::path::Path;
use tracing::{debug, info, warn};

use super::model::{Binding, BindingId, Config, ConfigId, Function, FunctionId, Gadget, GadgetId};
use super::state::State;
use super::types::FunctionType;
use crate::config::{LoadPolicy, Options};
use crate::configfs::{
    dir_exists, list_dir, read_link_target, read_string, EntryFilter, CONFIGS_DIR,
    FUNCTIONS_DIR, GADGET_SUBDIR, UDC_FILE,
};
use crate::error::{ErrorKind, GadgetError, Result};

/// List a fixed gadget subdirectory; absent means empty
///
/// configfs always instantiates `functions/` and `configs/`, so this only
/// matters for plain directory trees.
fn list_subdir(path: &Path) -> Result<Vec<String>> {
    match list_dir(path, EntryFilter::All) {
        Err(e) if e.kind() == ErrorKind::NotFound && !path.exists() => Ok(Vec::new()),
        other => other,
    }
}

impl State {
    /// Load the gadget tree under `root` (e.g. `/sys/kernel/config/usb_gadget`)
    pub fn load(root: impl AsRef<Path>) -> Result<Self> {
        Self::load_with_options(Options::with_root(root.as_ref()))
    }

    /// Load the gadget tree of a configfs mount point (e.g. `/sys/kernel/config`)
    pub fn init(configfs_mount: impl AsRef<Path>) -> Result<Self> {
        Self::load(configfs_mount.as_ref().join(GADGET_SUBDIR))
    }

    /// Load the gadget tree described by `options`
    ///
    /// A relative root is made absolute first; binding symlinks point at
    /// function directories through it.
    pub fn load_with_options(mut options: Options) -> Result<Self> {
        if !dir_exists(&options.gadget_root) {
            return Err(GadgetError::NotFound(format!(
                "gadget root {} is not a directory. Is configfs mounted?",
                options.gadget_root.display()
            )));
        }
        let root = std::path::absolute(&options.gadget_root).map_err(|e| {
            GadgetError::from_io(
                &e,
                format!("Failed to resolve {}", options.gadget_root.display()),
            )
        })?;
        options.gadget_root = root.clone();

        let mut state = State::empty(options);
        state.parse_gadgets(&root)?;

        info!(
            "Loaded {} gadget(s) from {}",
            state.gadget_order.len(),
            root.display()
        );
        Ok(state)
    }

    fn parse_gadgets(&mut self, root: &Path) -> Result<()> {
        for name in list_dir(root, EntryFilter::All)? {
            if !root.join(&name).is_dir() {
                debug!("Skipping non-directory {}", name);
                continue;
            }

            let mark = self.mark();
            match self.parse_gadget(root, &name) {
                Ok(id) => self.gadget_order.push(id),
                Err(e) => {
                    self.rollback(mark);
                    match self.options.load_policy {
                        LoadPolicy::Strict => return Err(e),
                        LoadPolicy::SkipInvalid => warn!("Skipping gadget {}: {}", name, e),
                    }
                }
            }
        }
        Ok(())
    }

    fn parse_gadget(&mut self, root: &Path, name: &str) -> Result<GadgetId> {
        let mut gadget = Gadget::new(name, root);

        // configfs always has UDC; a plain directory without it is unbound
        gadget.udc = match read_string(root, name, UDC_FILE) {
            Ok(udc) => udc,
            Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e),
        };

        let id = GadgetId(self.gadgets.len());
        self.gadgets.push(gadget);

        // Bindings resolve against functions, so functions go first
        self.parse_functions(id)?;
        self.parse_configs(id)?;

        debug!("Parsed gadget {}", name);
        Ok(id)
    }

    fn parse_functions(&mut self, gadget: GadgetId) -> Result<()> {
        let fpath = self.gadgets[gadget.index()].dir().join(FUNCTIONS_DIR);

        for name in list_subdir(&fpath)? {
            let function_type = FunctionType::from_function_name(&name);
            if function_type == FunctionType::Unrecognized {
                debug!("Function {} has an unrecognized type", name);
            }

            let id = FunctionId(self.functions.len());
            self.functions.push(Function {
                name,
                path: fpath.clone(),
                function_type,
                parent: gadget,
            });
            self.gadgets[gadget.index()].functions.push(id);
        }
        Ok(())
    }

    fn parse_configs(&mut self, gadget: GadgetId) -> Result<()> {
        let cpath = self.gadgets[gadget.index()].dir().join(CONFIGS_DIR);

        for name in list_subdir(&cpath)? {
            let mark = self.mark();
            let id = ConfigId(self.configs.len());
            self.configs.push(Config {
                name: name.clone(),
                path: cpath.clone(),
                parent: gadget,
                bindings: Vec::new(),
            });

            match self.parse_bindings(id) {
                Ok(()) => self.gadgets[gadget.index()].configs.push(id),
                Err(e) => {
                    self.rollback(mark);
                    match self.options.load_policy {
                        LoadPolicy::Strict => return Err(e),
                        LoadPolicy::SkipInvalid => warn!("Skipping config {}: {}", name, e),
                    }
                }
            }
        }
        Ok(())
    }

    fn parse_bindings(&mut self, config: ConfigId) -> Result<()> {
        let bpath = self.configs[config.index()].dir();
        let gadget = self.configs[config.index()].parent;

        for name in list_dir(&bpath, EntryFilter::Symlinks)? {
            let target = read_link_target(&bpath.join(&name))?;

            // Only the function directory name matters, not where it lives
            let function = target
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| self.get_function(gadget, n));
            if function.is_none() {
                warn!(
                    "Binding {} points at unknown function {}",
                    name,
                    target.display()
                );
            }

            let id = BindingId(self.bindings.len());
            self.bindings.push(Binding {
                name,
                path: bpath.clone(),
                parent: config,
                target: function,
            });
            self.configs[config.index()].bindings.push(id);
        }
        Ok(())
    }
}
