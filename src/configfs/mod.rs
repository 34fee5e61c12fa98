//! ConfigFS backing store primitives for USB gadgets
//!
//! Everything the gadget tree knows about the kernel goes through this
//! module: scalar attribute files, directories and the symlinks that bind
//! functions into configurations.

mod attr;
mod dir;

pub use attr::{
    parse_int, read_dec, read_hex, read_string, write_dec, write_hex16, write_hex8,
    write_string,
};
pub use dir::{
    create_dir, create_symlink, dir_exists, ensure_dir, list_dir, read_link_target, EntryFilter,
};

use std::path::Path;

use crate::error::{GadgetError, Result};

/// Default ConfigFS mount point
pub const CONFIGFS_MOUNT: &str = "/sys/kernel/config";

/// Gadget subsystem directory below the ConfigFS mount point
pub const GADGET_SUBDIR: &str = "usb_gadget";

/// ConfigFS base path for USB gadgets
pub const CONFIGFS_PATH: &str = "/sys/kernel/config/usb_gadget";

/// Device controller class directory
pub const UDC_CLASS_PATH: &str = "/sys/class/udc";

pub const STRINGS_DIR: &str = "strings";
pub const CONFIGS_DIR: &str = "configs";
pub const FUNCTIONS_DIR: &str = "functions";

/// Bound controller attribute of a gadget
pub const UDC_FILE: &str = "UDC";

/// Check if ConfigFS gadget support is available under a mount point
pub fn is_configfs_available(mount: &Path) -> bool {
    mount.join(GADGET_SUBDIR).is_dir()
}

/// List available UDCs (USB Device Controllers), sorted by name
pub fn list_udcs(class_path: &Path) -> Result<Vec<String>> {
    list_dir(class_path, EntryFilter::All)
}

/// Find the first available UDC in sorted order
pub fn find_udc(class_path: &Path) -> Result<String> {
    list_udcs(class_path)?.into_iter().next().ok_or_else(|| {
        GadgetError::NotFound(format!(
            "no USB Device Controller (UDC) in {}",
            class_path.display()
        ))
    })
}

/// Language directory name under `strings/` (e.g. `0x409`)
pub fn lang_dir(lang: u16) -> String {
    format!("0x{:x}", lang)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_find_udc_sorted() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("musb-hdrc.1")).unwrap();
        fs::create_dir(temp_dir.path().join("fe980000.usb")).unwrap();

        let udcs = list_udcs(temp_dir.path()).unwrap();
        assert_eq!(udcs, vec!["fe980000.usb", "musb-hdrc.1"]);
        assert_eq!(find_udc(temp_dir.path()).unwrap(), "fe980000.usb");
    }

    #[test]
    fn test_find_udc_none() {
        let temp_dir = TempDir::new().unwrap();
        let err = find_udc(temp_dir.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = find_udc(&temp_dir.path().join("absent")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_configfs_available() {
        let temp_dir = TempDir::new().unwrap();
        assert!(!is_configfs_available(temp_dir.path()));

        fs::create_dir(temp_dir.path().join(GADGET_SUBDIR)).unwrap();
        assert!(is_configfs_available(temp_dir.path()));
        assert_eq!(
            Path::new(CONFIGFS_MOUNT).join(GADGET_SUBDIR),
            Path::new(CONFIGFS_PATH)
        );
    }

    #[test]
    fn test_lang_dir() {
        assert_eq!(lang_dir(0x409), "0x409");
        assert_eq!(lang_dir(0x40c), "0x40c");
    }
}
