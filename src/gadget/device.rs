//! Gadget creation, device descriptors, strings and UDC binding

use std::path::PathBuf;
use tracing::info;

use super::model::{insert_ordered, Gadget, GadgetId};
use super::state::State;
use super::types::{GadgetAttrs, GadgetStrings, LANG_US_ENG};
use crate::configfs::{
    create_dir, dir_exists, ensure_dir, find_udc, lang_dir, read_hex, read_string, write_hex16,
    write_hex8, write_string, STRINGS_DIR, UDC_FILE,
};
use crate::error::{GadgetError, Result};

/// Reject names that cannot be a single configfs directory entry
pub(crate) fn validate_name(kind: &str, name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains('/') {
        return Err(GadgetError::InvalidParam(format!(
            "invalid {} name {:?}",
            kind, name
        )));
    }
    Ok(())
}

impl State {
    /// Create a gadget, optionally writing descriptors and US English strings
    ///
    /// Fails with `InvalidParam` if a gadget of that name already exists.
    /// The gadget is part of the tree as soon as its directory exists, so
    /// a failed attribute write afterwards leaves it in place and
    /// [`State::get_gadget`] returns its handle.
    pub fn create_gadget(
        &mut self,
        name: &str,
        attrs: Option<&GadgetAttrs>,
        strings: Option<&GadgetStrings>,
    ) -> Result<GadgetId> {
        validate_name("gadget", name)?;
        if self.get_gadget(name).is_some() {
            return Err(GadgetError::InvalidParam(format!(
                "duplicate gadget name {}",
                name
            )));
        }

        let root = self.options.gadget_root.clone();
        create_dir(&root.join(name))?;

        let mut gadget = Gadget::new(name, &root);
        // Freshly created gadgets are unbound; read whatever configfs reports
        gadget.udc = read_string(&root, name, UDC_FILE).unwrap_or_default();

        let id = GadgetId(self.gadgets.len());
        self.gadgets.push(gadget);
        let gadgets = &self.gadgets;
        insert_ordered(&mut self.gadget_order, id, |g| gadgets[g.index()].name.clone());

        if let Some(attrs) = attrs {
            self.set_gadget_attrs(id, attrs)?;
        }
        if let Some(strings) = strings {
            self.set_gadget_strings(id, LANG_US_ENG, strings)?;
        }

        info!("Created gadget {}", name);
        Ok(id)
    }

    /// Create a gadget with only vendor and product IDs set
    pub fn create_gadget_vid_pid(
        &mut self,
        name: &str,
        vendor_id: u16,
        product_id: u16,
    ) -> Result<GadgetId> {
        let id = self.create_gadget(name, None, None)?;
        self.set_gadget_vendor_id(id, vendor_id)?;
        self.set_gadget_product_id(id, product_id)?;
        Ok(id)
    }

    /// Read the device descriptor fields back from configfs
    pub fn gadget_attrs(&self, gadget: GadgetId) -> Result<GadgetAttrs> {
        let g = self.gadget(gadget)?;
        let (path, name) = (g.path(), g.name());

        Ok(GadgetAttrs {
            bcd_usb: read_hex(path, name, "bcdUSB")? as u16,
            device_class: read_hex(path, name, "bDeviceClass")? as u8,
            device_subclass: read_hex(path, name, "bDeviceSubClass")? as u8,
            device_protocol: read_hex(path, name, "bDeviceProtocol")? as u8,
            max_packet_size0: read_hex(path, name, "bMaxPacketSize0")? as u8,
            vendor_id: read_hex(path, name, "idVendor")? as u16,
            product_id: read_hex(path, name, "idProduct")? as u16,
            bcd_device: read_hex(path, name, "bcdDevice")? as u16,
        })
    }

    /// Write every device descriptor field
    pub fn set_gadget_attrs(&mut self, gadget: GadgetId, attrs: &GadgetAttrs) -> Result<()> {
        let g = self.gadget(gadget)?;
        let (path, name) = (g.path(), g.name());

        let result = write_hex16(path, name, "bcdUSB", attrs.bcd_usb)
            .and_then(|_| write_hex8(path, name, "bDeviceClass", attrs.device_class))
            .and_then(|_| write_hex8(path, name, "bDeviceSubClass", attrs.device_subclass))
            .and_then(|_| write_hex8(path, name, "bDeviceProtocol", attrs.device_protocol))
            .and_then(|_| write_hex8(path, name, "bMaxPacketSize0", attrs.max_packet_size0))
            .and_then(|_| write_hex16(path, name, "idVendor", attrs.vendor_id))
            .and_then(|_| write_hex16(path, name, "idProduct", attrs.product_id))
            .and_then(|_| write_hex16(path, name, "bcdDevice", attrs.bcd_device));
        self.commit(result)
    }

    fn set_gadget_hex16(&mut self, gadget: GadgetId, field: &str, value: u16) -> Result<()> {
        let g = self.gadget(gadget)?;
        let result = write_hex16(g.path(), g.name(), field, value);
        self.commit(result)
    }

    fn set_gadget_hex8(&mut self, gadget: GadgetId, field: &str, value: u8) -> Result<()> {
        let g = self.gadget(gadget)?;
        let result = write_hex8(g.path(), g.name(), field, value);
        self.commit(result)
    }

    pub fn set_gadget_vendor_id(&mut self, gadget: GadgetId, vendor_id: u16) -> Result<()> {
        self.set_gadget_hex16(gadget, "idVendor", vendor_id)
    }

    pub fn set_gadget_product_id(&mut self, gadget: GadgetId, product_id: u16) -> Result<()> {
        self.set_gadget_hex16(gadget, "idProduct", product_id)
    }

    pub fn set_gadget_device_class(&mut self, gadget: GadgetId, class: u8) -> Result<()> {
        self.set_gadget_hex8(gadget, "bDeviceClass", class)
    }

    pub fn set_gadget_device_subclass(&mut self, gadget: GadgetId, subclass: u8) -> Result<()> {
        self.set_gadget_hex8(gadget, "bDeviceSubClass", subclass)
    }

    pub fn set_gadget_device_protocol(&mut self, gadget: GadgetId, protocol: u8) -> Result<()> {
        self.set_gadget_hex8(gadget, "bDeviceProtocol", protocol)
    }

    pub fn set_gadget_device_max_packet(&mut self, gadget: GadgetId, size: u8) -> Result<()> {
        self.set_gadget_hex8(gadget, "bMaxPacketSize0", size)
    }

    pub fn set_gadget_device_bcd_device(&mut self, gadget: GadgetId, bcd: u16) -> Result<()> {
        self.set_gadget_hex16(gadget, "bcdDevice", bcd)
    }

    pub fn set_gadget_device_bcd_usb(&mut self, gadget: GadgetId, bcd: u16) -> Result<()> {
        self.set_gadget_hex16(gadget, "bcdUSB", bcd)
    }

    fn gadget_strings_dir(&self, gadget: GadgetId, lang: u16) -> Result<PathBuf> {
        Ok(self
            .gadget(gadget)?
            .dir()
            .join(STRINGS_DIR)
            .join(lang_dir(lang)))
    }

    /// Read the strings of one language, `None` if that language is absent
    pub fn gadget_strings(&self, gadget: GadgetId, lang: u16) -> Result<Option<GadgetStrings>> {
        let dir = self.gadget_strings_dir(gadget, lang)?;
        if !dir_exists(&dir) {
            return Ok(None);
        }

        Ok(Some(GadgetStrings {
            serial_number: read_string(&dir, "", "serialnumber")?,
            manufacturer: read_string(&dir, "", "manufacturer")?,
            product: read_string(&dir, "", "product")?,
        }))
    }

    /// Write all strings of one language, creating the language directory
    pub fn set_gadget_strings(
        &mut self,
        gadget: GadgetId,
        lang: u16,
        strings: &GadgetStrings,
    ) -> Result<()> {
        let dir = self.gadget_strings_dir(gadget, lang)?;
        let result = ensure_dir(&dir)
            .and_then(|_| write_string(&dir, "", "serialnumber", &strings.serial_number))
            .and_then(|_| write_string(&dir, "", "manufacturer", &strings.manufacturer))
            .and_then(|_| write_string(&dir, "", "product", &strings.product));
        self.commit(result)
    }

    fn set_gadget_string(
        &mut self,
        gadget: GadgetId,
        lang: u16,
        field: &str,
        value: &str,
    ) -> Result<()> {
        let dir = self.gadget_strings_dir(gadget, lang)?;
        let result = ensure_dir(&dir).and_then(|_| write_string(&dir, "", field, value));
        self.commit(result)
    }

    pub fn set_gadget_serial_number(&mut self, gadget: GadgetId, lang: u16, serial: &str) -> Result<()> {
        self.set_gadget_string(gadget, lang, "serialnumber", serial)
    }

    pub fn set_gadget_manufacturer(&mut self, gadget: GadgetId, lang: u16, manufacturer: &str) -> Result<()> {
        self.set_gadget_string(gadget, lang, "manufacturer", manufacturer)
    }

    pub fn set_gadget_product(&mut self, gadget: GadgetId, lang: u16, product: &str) -> Result<()> {
        self.set_gadget_string(gadget, lang, "product", product)
    }

    /// Bind the gadget to a UDC
    ///
    /// Without an explicit controller the first one in sorted order under
    /// the controller class directory is used.
    pub fn enable_gadget(&mut self, gadget: GadgetId, udc: Option<&str>) -> Result<()> {
        let udc = match udc {
            Some(udc) => udc.to_string(),
            None => find_udc(&self.options.udc_class_path)?,
        };

        let g = self.gadget(gadget)?;
        let result = write_string(g.path(), g.name(), UDC_FILE, &udc);
        self.commit(result)?;

        let g = self.gadget_mut(gadget)?;
        info!("Bound gadget {} to UDC {}", g.name, udc);
        g.udc = udc;
        Ok(())
    }

    /// Unbind the gadget from its UDC
    pub fn disable_gadget(&mut self, gadget: GadgetId) -> Result<()> {
        let g = self.gadget(gadget)?;
        let result = write_string(g.path(), g.name(), UDC_FILE, "");
        self.commit(result)?;

        let g = self.gadget_mut(gadget)?;
        g.udc.clear();
        info!("Unbound gadget {} from UDC", g.name);
        Ok(())
    }
}
