//! Function instances and their type-specific attributes

use std::path::Path;
use tracing::{debug, info};

use super::device::validate_name;
use super::model::{insert_ordered, Function, FunctionId, GadgetId};
use super::state::State;
use super::types::{
    FunctionAttrs, FunctionFamily, FunctionType, MacAddr, NetAttrs, PhonetAttrs, SerialAttrs,
};
use crate::configfs::{
    create_dir, ensure_dir, read_dec, read_string, write_dec, write_string, FUNCTIONS_DIR,
};
use crate::error::{GadgetError, Result};

/// Read a MAC attribute; text that is not a MAC address reads as all zeros
fn read_mac(dir: &Path, entry: &str, field: &str) -> Result<MacAddr> {
    Ok(read_string(dir, entry, field)?.parse().unwrap_or_default())
}

fn write_function_attrs(dir: &Path, name: &str, attrs: &FunctionAttrs) -> Result<()> {
    match attrs {
        FunctionAttrs::Serial(serial) => write_dec(dir, name, "port_num", serial.port_num.into()),
        FunctionAttrs::Net(net) => {
            write_string(dir, name, "dev_addr", &net.dev_addr.to_string())?;
            write_string(dir, name, "host_addr", &net.host_addr.to_string())?;
            write_string(dir, name, "ifname", &net.ifname)?;
            write_dec(dir, name, "qmult", net.qmult.into())
        }
        FunctionAttrs::Phonet(phonet) => write_string(dir, name, "ifname", &phonet.ifname),
    }
}

impl State {
    /// Create `<type>.<instance>` under the gadget's `functions` directory
    ///
    /// Once the directory exists the function stays in the tree, even if
    /// writing `attrs` fails; [`State::get_function`] finds it.
    pub fn create_function(
        &mut self,
        gadget: GadgetId,
        function_type: FunctionType,
        instance: &str,
        attrs: Option<&FunctionAttrs>,
    ) -> Result<FunctionId> {
        let tag = function_type.tag().ok_or_else(|| {
            GadgetError::InvalidParam("cannot create a function of unrecognized type".to_string())
        })?;
        validate_name("function instance", instance)?;
        if let Some(attrs) = attrs {
            if attrs.family() != function_type.family() {
                return Err(GadgetError::InvalidParam(format!(
                    "{:?} attributes do not apply to {} functions",
                    attrs.family(),
                    tag
                )));
            }
        }

        let name = format!("{}.{}", tag, instance);
        let fpath = self.gadget(gadget)?.dir().join(FUNCTIONS_DIR);
        if self.get_function(gadget, &name).is_some() {
            return Err(GadgetError::InvalidParam(format!(
                "duplicate function name {}",
                name
            )));
        }

        ensure_dir(&fpath)?;
        create_dir(&fpath.join(&name))?;

        let id = FunctionId(self.functions.len());
        self.functions.push(Function {
            name: name.clone(),
            path: fpath,
            function_type,
            parent: gadget,
        });
        let functions = &self.functions;
        insert_ordered(&mut self.gadgets[gadget.index()].functions, id, |f| {
            functions[f.index()].name.clone()
        });

        if let Some(attrs) = attrs {
            self.set_function_attrs(id, attrs)?;
        }

        info!("Created function {}", name);
        Ok(id)
    }

    /// Read the type-specific attributes back from configfs
    pub fn function_attrs(&self, function: FunctionId) -> Result<FunctionAttrs> {
        let f = self.function(function)?;
        let (path, name) = (f.path(), f.name());

        match f.function_type().family() {
            FunctionFamily::Serial => Ok(FunctionAttrs::Serial(SerialAttrs {
                port_num: read_dec(path, name, "port_num")? as i32,
            })),
            FunctionFamily::Net => Ok(FunctionAttrs::Net(NetAttrs {
                dev_addr: read_mac(path, name, "dev_addr")?,
                host_addr: read_mac(path, name, "host_addr")?,
                ifname: read_string(path, name, "ifname")?,
                qmult: read_dec(path, name, "qmult")? as i32,
            })),
            FunctionFamily::Phonet => Ok(FunctionAttrs::Phonet(PhonetAttrs {
                ifname: read_string(path, name, "ifname")?,
            })),
            FunctionFamily::None => Err(GadgetError::InvalidParam(format!(
                "function {} has no known attributes",
                name
            ))),
        }
    }

    /// Write the full attribute set; it must match the function's family
    pub fn set_function_attrs(&mut self, function: FunctionId, attrs: &FunctionAttrs) -> Result<()> {
        let f = self.function(function)?;
        if attrs.family() != f.function_type().family() {
            return Err(GadgetError::InvalidParam(format!(
                "{:?} attributes do not apply to {}",
                attrs.family(),
                f.name()
            )));
        }

        debug!("Writing attributes of function {}", f.name());
        let result = write_function_attrs(f.path(), f.name(), attrs);
        self.commit(result)
    }

    fn function_of_family(&self, function: FunctionId, family: FunctionFamily) -> Result<&Function> {
        let f = self.function(function)?;
        if f.function_type().family() != family {
            return Err(GadgetError::InvalidParam(format!(
                "function {} is not a {:?} function",
                f.name(),
                family
            )));
        }
        Ok(f)
    }

    pub fn set_net_dev_addr(&mut self, function: FunctionId, addr: MacAddr) -> Result<()> {
        let f = self.function_of_family(function, FunctionFamily::Net)?;
        let result = write_string(f.path(), f.name(), "dev_addr", &addr.to_string());
        self.commit(result)
    }

    pub fn set_net_host_addr(&mut self, function: FunctionId, addr: MacAddr) -> Result<()> {
        let f = self.function_of_family(function, FunctionFamily::Net)?;
        let result = write_string(f.path(), f.name(), "host_addr", &addr.to_string());
        self.commit(result)
    }

    pub fn set_net_qmult(&mut self, function: FunctionId, qmult: i32) -> Result<()> {
        let f = self.function_of_family(function, FunctionFamily::Net)?;
        let result = write_dec(f.path(), f.name(), "qmult", qmult.into());
        self.commit(result)
    }

    /// Interface name; applies to both ethernet and phonet functions
    pub fn set_net_ifname(&mut self, function: FunctionId, ifname: &str) -> Result<()> {
        let f = self.function(function)?;
        if !matches!(
            f.function_type().family(),
            FunctionFamily::Net | FunctionFamily::Phonet
        ) {
            return Err(GadgetError::InvalidParam(format!(
                "function {} has no interface name",
                f.name()
            )));
        }
        let result = write_string(f.path(), f.name(), "ifname", ifname);
        self.commit(result)
    }

    pub fn set_serial_port_num(&mut self, function: FunctionId, port_num: i32) -> Result<()> {
        let f = self.function_of_family(function, FunctionFamily::Serial)?;
        let result = write_dec(f.path(), f.name(), "port_num", port_num.into());
        self.commit(result)
    }
}
