//! Per-printer status aggregation.
//!
//! Field values are found by fuzzy matching: any sensor whose identifier
//! starts with `sensor.<key>` and mentions the field name somewhere after it
//! counts, first one in snapshot order wins.

use std::collections::HashMap;

use super::status::FieldValue;
use super::status::StatusSnapshot;
use crate::host::Host;
use crate::state::EntityState;
use crate::state::StateSnapshot;


/// Builds [`StatusSnapshot`]s. Holds only borrowed configuration, so the same
/// inputs always give the same output.
pub struct Aggregator<'a> {
    cameras: &'a HashMap<String, String>,
    host: Option<&'a dyn Host>,
}

impl<'a> Aggregator<'a> {
    /// `cameras` maps printer keys to explicit camera entities. Without a
    /// `host` no URLs can be built and the webcam stays unknown.
    pub fn new(cameras: &'a HashMap<String, String>, host: Option<&'a dyn Host>) -> Self {
        Self { cameras, host }
    }

    pub fn aggregate(&self, snapshot: &StateSnapshot, key: &str) -> StatusSnapshot {
        let sensors = PrinterSensors::new(snapshot, key);

        StatusSnapshot {
            model: resolve_model(snapshot, key),
            online: resolve_online(snapshot, key),
            webcam_url: self.resolve_webcam(snapshot, key),
            current_file_image: resolve_file_image(snapshot, key),
            file: sensors.find_truthy(&["file", "current_file_name"]),
            state_text: sensors.find_truthy(&["state_text", "state"]),
            state_code: sensors.find_field("state_code"),
            progress: sensors.find_field("progress"),
            layer: sensors.find_first(&["layer", "current_layer"]),
            total_layers: sensors.find_first(&["total_layers", "total_layer"]),
            elapsed_sec: sensors.find_first(&["job_time", "time_elapsed"]),
            remaining_sec: sensors.find_first(&["time_left", "time_remaining"]),
            nozzle_temp: sensors.find_first(&["nozzle_temp", "tool0_temp"]),
            nozzle_target: sensors.find_first(&["nozzle_target", "tool0_target"]),
            bed_temp: sensors.find_field("bed_temp"),
            bed_target: sensors.find_field("bed_target"),
            chamber_temp: sensors.find_field("chamber_temp"),
        }
    }

    /// Two passes over the camera candidates: a token-signed stream if any
    /// candidate has a token, otherwise a still-image proxy for the first
    /// candidate that exists.
    fn resolve_webcam(&self, snapshot: &StateSnapshot, key: &str) -> Option<String> {
        let host = self.host?;

        let candidates = match self.cameras.get(key).filter(|id| !id.is_empty()) {
            Some(id) => vec![id.clone()],
            None => vec![format!("camera.{key}_webcam"), format!("camera.{key}")],
        };
        let existing: Vec<(&str, &EntityState)> = candidates
            .iter()
            .filter_map(|id| snapshot.get(id).map(|st| (id.as_str(), st)))
            .collect();

        for (id, st) in &existing {
            if let Some(token) = st.attribute_text("access_token") {
                return Some(host.url(&format!("/api/camera_proxy_stream/{id}?token={token}")));
            }
        }

        let (id, st) = existing.first()?;
        let path = match st.attribute_text("access_token") {
            Some(token) => format!("/api/camera_proxy/{id}?token={token}"),
            None => format!("/api/camera_proxy/{id}"),
        };
        Some(host.url(&path))
    }
}

/// Sensors belonging to one printer, narrowed once per aggregation so each
/// field probe only scans the printer's own entities.
struct PrinterSensors<'s> {
    /// Lower-cased identifier tail after `sensor.<key>`, with its record.
    entries: Vec<(String, &'s EntityState)>,
}

impl<'s> PrinterSensors<'s> {
    fn new(snapshot: &'s StateSnapshot, key: &str) -> Self {
        let prefix = format!("sensor.{key}").to_lowercase();
        let entries = snapshot
            .sensors()
            .filter_map(|st| {
                let id = st.entity_id.to_lowercase();
                id.strip_prefix(&prefix).map(|tail| (tail.to_string(), st))
            })
            .collect();
        Self { entries }
    }

    /// First usable value whose identifier mentions `field`. Unavailable and
    /// unknown states are passed over as if they did not match.
    fn find_field(&self, field: &str) -> Option<FieldValue> {
        let field = field.to_lowercase();
        self.entries
            .iter()
            .filter(|(tail, _)| tail.contains(&field))
            .find(|(_, st)| !st.is_unavailable())
            .map(|(_, st)| FieldValue::parse(&st.state))
    }

    /// First field in `fields` that resolves at all.
    fn find_first(&self, fields: &[&str]) -> Option<FieldValue> {
        fields.iter().find_map(|f| self.find_field(f))
    }

    /// Like [`Self::find_first`], but a zero reading also falls through to
    /// the next field. The last field's value is kept as is.
    fn find_truthy(&self, fields: &[&str]) -> Option<FieldValue> {
        let (last, rest) = fields.split_last()?;
        rest.iter()
            .filter_map(|f| self.find_field(f))
            .find(FieldValue::is_truthy)
            .or_else(|| self.find_field(last))
    }
}

fn resolve_online(snapshot: &StateSnapshot, key: &str) -> Option<bool> {
    ["online", "status", "connected"]
        .iter()
        .find_map(|suffix| snapshot.get(&format!("binary_sensor.{key}_{suffix}")))
        .map(EntityState::is_on)
}

fn resolve_file_image(snapshot: &StateSnapshot, key: &str) -> Option<String> {
    let st = [
        format!("image.{key}_current"),
        format!("sensor.{key}_current_file_image"),
    ]
    .iter()
    .find_map(|id| snapshot.get(id))?;

    Some(
        st.attribute_text("entity_picture")
            .unwrap_or_else(|| st.state.clone()),
    )
}

/// The first `sensor.<key>*` entity with a model attribute names the
/// hardware. Without one the key stands in for the model; it is an identity,
/// not a model, but image selection relies on it.
fn resolve_model(snapshot: &StateSnapshot, key: &str) -> String {
    let prefix = format!("sensor.{key}");
    snapshot
        .iter()
        .filter(|st| st.entity_id.starts_with(&prefix))
        .find_map(|st| st.attribute_text("model"))
        .unwrap_or_else(|| key.to_string())
}
