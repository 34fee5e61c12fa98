//! Gadget tree value types: function types, descriptors, strings

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GadgetError;

/// US English language code for USB string descriptors
pub const LANG_US_ENG: u16 = 0x0409;

/// USB Vendor ID (Linux Foundation) - default value
pub const DEFAULT_USB_VENDOR_ID: u16 = 0x1d6b;

/// USB Product ID (Multifunction Composite Gadget) - default value
pub const DEFAULT_USB_PRODUCT_ID: u16 = 0x0104;

/// USB device version - default value
pub const DEFAULT_USB_BCD_DEVICE: u16 = 0x0100;

/// USB spec version (USB 2.0)
pub const USB_BCD_USB: u16 = 0x0200;

/// Composite function type, encoded as the prefix of a function directory
/// name (`<tag>.<instance>`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FunctionType {
    /// Generic serial
    #[serde(rename = "gser")]
    Serial,
    /// CDC ACM serial
    Acm,
    /// OBEX
    Obex,
    /// CDC ECM ethernet
    Ecm,
    /// CDC subset ethernet
    #[serde(rename = "geth")]
    Subset,
    /// CDC NCM ethernet
    Ncm,
    /// CDC EEM ethernet
    Eem,
    /// RNDIS ethernet
    Rndis,
    /// Phonet
    Phonet,
    /// Directory prefix not in the table above
    Unrecognized,
}

/// Which attribute set a function type carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionFamily {
    Serial,
    Net,
    Phonet,
    None,
}

impl FunctionType {
    /// All recognized types, in table order
    pub const ALL: [FunctionType; 9] = [
        FunctionType::Serial,
        FunctionType::Acm,
        FunctionType::Obex,
        FunctionType::Ecm,
        FunctionType::Subset,
        FunctionType::Ncm,
        FunctionType::Eem,
        FunctionType::Rndis,
        FunctionType::Phonet,
    ];

    /// ConfigFS type tag, `None` for `Unrecognized`
    pub fn tag(&self) -> Option<&'static str> {
        match self {
            FunctionType::Serial => Some("gser"),
            FunctionType::Acm => Some("acm"),
            FunctionType::Obex => Some("obex"),
            FunctionType::Ecm => Some("ecm"),
            FunctionType::Subset => Some("geth"),
            FunctionType::Ncm => Some("ncm"),
            FunctionType::Eem => Some("eem"),
            FunctionType::Rndis => Some("rndis"),
            FunctionType::Phonet => Some("phonet"),
            FunctionType::Unrecognized => None,
        }
    }

    /// Map a type tag back to its type; unknown tags are `Unrecognized`
    pub fn from_tag(tag: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|t| t.tag() == Some(tag))
            .unwrap_or(FunctionType::Unrecognized)
    }

    /// Type of a function directory name: the part before the first `.`
    pub fn from_function_name(name: &str) -> Self {
        let tag = name.split('.').next().unwrap_or(name);
        Self::from_tag(tag)
    }

    pub fn family(&self) -> FunctionFamily {
        match self {
            FunctionType::Serial | FunctionType::Acm | FunctionType::Obex => {
                FunctionFamily::Serial
            }
            FunctionType::Ecm
            | FunctionType::Subset
            | FunctionType::Ncm
            | FunctionType::Eem
            | FunctionType::Rndis => FunctionFamily::Net,
            FunctionType::Phonet => FunctionFamily::Phonet,
            FunctionType::Unrecognized => FunctionFamily::None,
        }
    }

    /// Get description
    pub fn description(&self) -> &'static str {
        match self {
            FunctionType::Serial => "Generic Serial",
            FunctionType::Acm => "CDC ACM Serial",
            FunctionType::Obex => "OBEX",
            FunctionType::Ecm => "CDC ECM Ethernet",
            FunctionType::Subset => "CDC Subset Ethernet",
            FunctionType::Ncm => "CDC NCM Ethernet",
            FunctionType::Eem => "CDC EEM Ethernet",
            FunctionType::Rndis => "RNDIS Ethernet",
            FunctionType::Phonet => "Phonet",
            FunctionType::Unrecognized => "Unrecognized",
        }
    }
}

impl fmt::Display for FunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag().unwrap_or("?"))
    }
}

/// USB device descriptor fields exposed by a gadget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GadgetAttrs {
    pub bcd_usb: u16,
    pub device_class: u8,
    pub device_subclass: u8,
    pub device_protocol: u8,
    pub max_packet_size0: u8,
    pub vendor_id: u16,
    pub product_id: u16,
    pub bcd_device: u16,
}

impl Default for GadgetAttrs {
    fn default() -> Self {
        Self {
            bcd_usb: USB_BCD_USB,
            device_class: 0x00, // Composite device
            device_subclass: 0x00,
            device_protocol: 0x00,
            max_packet_size0: 64,
            vendor_id: DEFAULT_USB_VENDOR_ID,
            product_id: DEFAULT_USB_PRODUCT_ID,
            bcd_device: DEFAULT_USB_BCD_DEVICE,
        }
    }
}

/// Gadget string descriptors for one language
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GadgetStrings {
    pub serial_number: String,
    pub manufacturer: String,
    pub product: String,
}

/// Configuration descriptor fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigAttrs {
    /// Maximum power draw in mA
    pub max_power: u16,
    /// bmAttributes bitmask
    pub bm_attributes: u8,
}

impl Default for ConfigAttrs {
    fn default() -> Self {
        Self {
            max_power: 120,
            bm_attributes: 0x80, // bus powered
        }
    }
}

/// Configuration string descriptor for one language
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigStrings {
    pub configuration: String,
}

/// Ethernet MAC address in `aa:bb:cc:dd:ee:ff` form
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddr(pub [u8; 6]);

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}", a, b, c, d, e, g)
    }
}

impl FromStr for MacAddr {
    type Err = GadgetError;

    /// Accepts one or two hex digits per octet, colon separated
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || GadgetError::InvalidParam(format!("invalid MAC address: {:?}", s));

        let mut octets = [0u8; 6];
        let mut parts = s.trim().split(':');
        for octet in octets.iter_mut() {
            let part = parts.next().ok_or_else(invalid)?;
            if part.is_empty() || part.len() > 2 {
                return Err(invalid());
            }
            *octet = u8::from_str_radix(part, 16).map_err(|_| invalid())?;
        }
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(MacAddr(octets))
    }
}

impl TryFrom<String> for MacAddr {
    type Error = GadgetError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<MacAddr> for String {
    fn from(addr: MacAddr) -> Self {
        addr.to_string()
    }
}

/// Serial family attributes (gser, acm, obex)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialAttrs {
    pub port_num: i32,
}

/// Ethernet family attributes (ecm, geth, ncm, eem, rndis)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetAttrs {
    pub dev_addr: MacAddr,
    pub host_addr: MacAddr,
    pub ifname: String,
    pub qmult: i32,
}

impl Default for NetAttrs {
    fn default() -> Self {
        Self {
            dev_addr: MacAddr::default(),
            host_addr: MacAddr::default(),
            ifname: String::new(),
            qmult: 5,
        }
    }
}

/// Phonet attributes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhonetAttrs {
    pub ifname: String,
}

/// Function-type-specific attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FunctionAttrs {
    Serial(SerialAttrs),
    Net(NetAttrs),
    Phonet(PhonetAttrs),
}

impl FunctionAttrs {
    pub fn family(&self) -> FunctionFamily {
        match self {
            FunctionAttrs::Serial(_) => FunctionFamily::Serial,
            FunctionAttrs::Net(_) => FunctionFamily::Net,
            FunctionAttrs::Phonet(_) => FunctionFamily::Phonet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_type_mapping_is_bidirectional() {
        for ty in FunctionType::ALL {
            let tag = ty.tag().unwrap();
            assert_eq!(FunctionType::from_tag(tag), ty);
        }
        assert_eq!(FunctionType::Unrecognized.tag(), None);
        assert_eq!(FunctionType::from_tag("hid"), FunctionType::Unrecognized);
        assert_eq!(FunctionType::from_tag(""), FunctionType::Unrecognized);
    }

    #[test]
    fn test_function_type_from_name() {
        assert_eq!(FunctionType::from_function_name("ecm.usb0"), FunctionType::Ecm);
        assert_eq!(FunctionType::from_function_name("geth.a.b"), FunctionType::Subset);
        assert_eq!(FunctionType::from_function_name("acm"), FunctionType::Acm);
        assert_eq!(
            FunctionType::from_function_name("mass_storage.usb0"),
            FunctionType::Unrecognized
        );
    }

    #[test]
    fn test_function_type_serde_uses_tags() {
        let json = serde_json::to_string(&FunctionType::Serial).unwrap();
        assert_eq!(json, "\"gser\"");
        let ty: FunctionType = serde_json::from_str("\"rndis\"").unwrap();
        assert_eq!(ty, FunctionType::Rndis);
        assert!(serde_json::from_str::<FunctionType>("\"hid\"").is_err());
    }

    #[test]
    fn test_families() {
        assert_eq!(FunctionType::Obex.family(), FunctionFamily::Serial);
        assert_eq!(FunctionType::Subset.family(), FunctionFamily::Net);
        assert_eq!(FunctionType::Phonet.family(), FunctionFamily::Phonet);
        assert_eq!(FunctionType::Unrecognized.family(), FunctionFamily::None);
    }

    #[test]
    fn test_mac_addr_parse() {
        let addr: MacAddr = "2:1f:ab:0:c:ff".parse().unwrap();
        assert_eq!(addr, MacAddr([0x02, 0x1f, 0xab, 0x00, 0x0c, 0xff]));
        assert_eq!(addr.to_string(), "02:1f:ab:00:0c:ff");

        assert!("02:1f:ab:00:0c".parse::<MacAddr>().is_err());
        assert!("02:1f:ab:00:0c:ff:00".parse::<MacAddr>().is_err());
        assert!("02:1f:ab:00:0c:fff".parse::<MacAddr>().is_err());
        assert!("".parse::<MacAddr>().is_err());
    }

    #[test]
    fn test_function_attrs_json() {
        let attrs: FunctionAttrs = serde_json::from_str(
            r#"{"kind": "net", "dev_addr": "02:00:00:00:00:01", "ifname": "usb0"}"#,
        )
        .unwrap();
        match attrs {
            FunctionAttrs::Net(net) => {
                assert_eq!(net.dev_addr, MacAddr([2, 0, 0, 0, 0, 1]));
                assert_eq!(net.host_addr, MacAddr::default());
                assert_eq!(net.ifname, "usb0");
                assert_eq!(net.qmult, 5);
            }
            other => panic!("unexpected attrs {:?}", other),
        }
    }
}
