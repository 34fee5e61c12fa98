use serde::Deserialize;
use std::path::Path;
use tracing::debug;

use super::{GadgetLayout, Options};
use crate::error::{GadgetError, Result};

/// A layout file holds either one gadget or a list of them
#[derive(Deserialize)]
#[serde(untagged)]
enum LayoutFile {
    Many(Vec<GadgetLayout>),
    One(GadgetLayout),
}

fn read_json(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| GadgetError::Config(format!("Failed to read {}: {}", path.display(), e)))
}

/// Load options from a JSON file; missing keys keep their defaults
pub fn load_options(path: &Path) -> Result<Options> {
    let options: Options = serde_json::from_str(&read_json(path)?)?;
    debug!("Loaded options from {}: {:?}", path.display(), options);
    Ok(options)
}

/// Load gadget layouts from a JSON file
pub fn load_layouts(path: &Path) -> Result<Vec<GadgetLayout>> {
    parse_layouts(&read_json(path)?)
}

/// Parse gadget layouts from JSON text
pub fn parse_layouts(json: &str) -> Result<Vec<GadgetLayout>> {
    let layouts = match serde_json::from_str(json)? {
        LayoutFile::Many(layouts) => layouts,
        LayoutFile::One(layout) => vec![layout],
    };
    Ok(layouts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LoadPolicy, WritePolicy};
    use crate::error::ErrorKind;
    use crate::gadget::types::{FunctionAttrs, FunctionType};
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_options_defaults_fill_missing_keys() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("options.json");
        std::fs::write(&path, r#"{"gadget_root": "/tmp/usb_gadget", "write_policy": "log_only"}"#)
            .unwrap();

        let options = load_options(&path).unwrap();
        assert_eq!(options.gadget_root, PathBuf::from("/tmp/usb_gadget"));
        assert_eq!(options.udc_class_path, PathBuf::from("/sys/class/udc"));
        assert_eq!(options.write_policy, WritePolicy::LogOnly);
        assert_eq!(options.load_policy, LoadPolicy::Strict);
    }

    #[test]
    fn test_parse_single_layout() {
        let layouts = parse_layouts(
            r#"{
                "name": "g1",
                "attrs": {"vendor_id": 7531, "product_id": 260},
                "functions": [
                    {"type": "ecm", "instance": "usb0"},
                    {"type": "acm", "instance": "GS0", "attrs": {"kind": "serial", "port_num": 1}}
                ],
                "configs": [
                    {"name": "c.1", "bindings": [{"function": "ecm.usb0"}]}
                ],
                "enable": true
            }"#,
        )
        .unwrap();

        assert_eq!(layouts.len(), 1);
        let layout = &layouts[0];
        assert_eq!(layout.attrs.unwrap().vendor_id, 0x1d6b);
        assert_eq!(layout.functions[0].function_type, FunctionType::Ecm);
        assert_eq!(layout.functions[0].name(), "ecm.usb0");
        assert!(matches!(
            layout.functions[1].attrs,
            Some(FunctionAttrs::Serial(ref s)) if s.port_num == 1
        ));
        assert_eq!(layout.configs[0].bindings[0].link_name(), "ecm.usb0");
        assert!(layout.enable);
        assert!(layout.udc.is_none());
    }

    #[test]
    fn test_parse_layout_list() {
        let layouts = parse_layouts(r#"[{"name": "g1"}, {"name": "g2"}]"#).unwrap();
        let names: Vec<_> = layouts.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["g1", "g2"]);
    }

    #[test]
    fn test_parse_layout_rejects_unknown_type() {
        let err = parse_layouts(r#"{"name": "g1", "functions": [{"type": "hid", "instance": "0"}]}"#)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_missing_file() {
        let err = load_layouts(Path::new("/nonexistent/layout.json")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }
}
