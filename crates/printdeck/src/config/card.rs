use std::collections::HashMap;

use serde::Deserialize;
use serde::Deserializer;
use serde_json::Map;
use serde_json::Value;

use crate::actions::ActionConfig;

/// Where the printer illustrations live unless configured otherwise.
pub const DEFAULT_IMAGES_PATH: &str =
    "https://raw.githubusercontent.com/rathlinus/ha-creality-card/refs/heads/main/assets/";

/// Card options. Everything is optional and only defaulted, never
/// validated.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CardConfig {
    pub title: String,

    /// Only identifiers containing this text take part in discovery
    pub filter_prefix: String,

    /// Substring of the printer key to select first
    pub default_printer: Option<String>,

    /// Base for printer illustrations, always ending in exactly one `/`
    #[serde(deserialize_with = "deserialize_images_path")]
    pub images_path: String,

    /// Reserved for per-entity overrides; carried but not interpreted
    pub entities: Map<String, Value>,

    /// Printer key -> camera entity used instead of the naming convention
    pub cameras: HashMap<String, String>,

    /// Extra or replacement actions, merged over the built-ins
    pub actions: HashMap<String, ActionConfig>,

    pub show_header: bool,
    pub show_stage: bool,
    pub show_webcam: bool,
    pub show_file_preview: bool,
    pub show_progress: bool,
    pub show_controls: bool,
    pub show_temperatures: bool,
    pub show_actions: bool,
    pub show_status: bool,
    pub compact_status: bool,
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            title: "Creality Printer".to_string(),
            filter_prefix: String::new(),
            default_printer: None,
            images_path: DEFAULT_IMAGES_PATH.to_string(),
            entities: Map::new(),
            cameras: HashMap::new(),
            actions: HashMap::new(),
            show_header: true,
            show_stage: true,
            show_webcam: true,
            show_file_preview: true,
            show_progress: true,
            show_controls: true,
            show_temperatures: true,
            show_actions: true,
            show_status: true,
            compact_status: false,
        }
    }
}

impl CardConfig {
    /// Whether any of the left-hand panel sections is shown
    pub fn has_left_panel(&self) -> bool {
        self.show_controls || self.show_temperatures || self.show_actions
    }

    /// Layout height in rows, as reported to the dashboard grid
    pub fn card_size(&self) -> u32 {
        let mut size = 1;
        if self.show_stage {
            size += 3;
        }
        if self.show_progress {
            size += 1;
        }
        if self.has_left_panel() {
            size += 2;
        }
        if self.show_status {
            size += 2;
        }
        size
    }
}

/// Collapse any run of trailing slashes into exactly one.
pub fn normalize_images_path(path: &str) -> String {
    format!("{}/", path.trim_end_matches('/'))
}

fn deserialize_images_path<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let path = String::deserialize(deserializer)?;
    Ok(normalize_images_path(&path))
}
