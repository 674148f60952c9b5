//! Control commands sent back to the host.
//!
//! Buttons map to named [`ActionDescriptor`]s; switches map to a [`Control`]
//! whose entity is flipped with `turn_on`/`turn_off`.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use serde_json::json;
use serde_json::Value;
use strum::Display;
use strum::EnumIter;
use strum::EnumString;
use strum::IntoEnumIterator;

use crate::host::Host;
use crate::state::StateSnapshot;

/// Payload builder for a service call.
#[derive(Clone)]
pub enum Payload {
    /// Sent as is for every printer.
    Static(Value),
    /// Computed from the printer key at dispatch time.
    Derived(Arc<dyn Fn(&str) -> Value + Send + Sync>),
}

impl Payload {
    pub fn derived(f: impl Fn(&str) -> Value + Send + Sync + 'static) -> Self {
        Payload::Derived(Arc::new(f))
    }

    /// A payload whose string leaves have every `{key}` replaced by the
    /// printer key.
    pub fn template(template: Value) -> Self {
        Payload::derived(move |key| substitute_key(&template, key))
    }

    pub fn build(&self, key: &str) -> Value {
        match self {
            Payload::Static(value) => value.clone(),
            Payload::Derived(f) => f(key),
        }
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Static(value) => f.debug_tuple("Static").field(value).finish(),
            Payload::Derived(_) => f.debug_tuple("Derived").field(&"<fn>").finish(),
        }
    }
}

fn substitute_key(template: &Value, key: &str) -> Value {
    match template {
        Value::String(s) => Value::String(s.replace("{key}", key)),
        Value::Array(items) => Value::Array(items.iter().map(|v| substitute_key(v, key)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), substitute_key(v, key)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// A named action: which service to call and how to build its data.
#[derive(Debug, Clone)]
pub struct ActionDescriptor {
    pub domain: String,
    pub service: String,
    pub data: Payload,
}

impl ActionDescriptor {
    pub fn new(domain: &str, service: &str, data: Payload) -> Self {
        Self {
            domain: domain.to_string(),
            service: service.to_string(),
            data,
        }
    }

    pub fn command(&self, key: &str) -> ServiceCommand {
        ServiceCommand {
            domain: self.domain.clone(),
            service: self.service.clone(),
            payload: self.data.build(key),
        }
    }
}

/// Action as written in the configuration file. `data_template` wins over
/// `data` when both are given.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionConfig {
    pub domain: String,
    pub service: String,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub data_template: Option<Value>,
}

impl From<ActionConfig> for ActionDescriptor {
    fn from(cfg: ActionConfig) -> Self {
        let data = match (cfg.data_template, cfg.data) {
            (Some(template), _) => Payload::template(template),
            (None, Some(data)) => Payload::Static(data),
            (None, None) => Payload::Static(json!({})),
        };
        Self {
            domain: cfg.domain,
            service: cfg.service,
            data,
        }
    }
}

/// Built-in actions, each replaceable by a configured action of the same
/// name.
pub fn builtin_actions() -> HashMap<String, ActionDescriptor> {
    fn switch_entity(suffix: &'static str) -> Payload {
        Payload::derived(move |key| json!({ "entity_id": format!("switch.{key}_{suffix}") }))
    }

    HashMap::from([
        (
            "auto_home".to_string(),
            ActionDescriptor::new("creality_lan", "get_bed_leveling", Payload::Static(json!({}))),
        ),
        (
            "pause".to_string(),
            ActionDescriptor::new("switch", "turn_on", switch_entity("pause")),
        ),
        (
            "unpause".to_string(),
            ActionDescriptor::new("switch", "turn_off", switch_entity("pause")),
        ),
        (
            "stop".to_string(),
            ActionDescriptor::new("switch", "turn_on", switch_entity("stop")),
        ),
    ])
}

/// Built-ins overlaid with the configured actions.
pub fn merge_actions(
    configured: HashMap<String, ActionConfig>,
) -> HashMap<String, ActionDescriptor> {
    let mut actions = builtin_actions();
    actions.extend(
        configured
            .into_iter()
            .map(|(name, cfg)| (name, ActionDescriptor::from(cfg))),
    );
    actions
}

/// A fully resolved service call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceCommand {
    pub domain: String,
    pub service: String,
    pub payload: Value,
}

impl ServiceCommand {
    pub fn dispatch(self, host: &dyn Host) {
        tracing::info!(
            "Calling {}.{} with {}",
            self.domain,
            self.service,
            self.payload
        );
        host.call_service(&self.domain, &self.service, self.payload);
    }
}

/// On/off switches every printer exposes as `switch.<key>_<control>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Control {
    Light,
    FanModel,
    FanCase,
    FanAux,
}

impl Control {
    pub fn all() -> impl Iterator<Item = Control> {
        Control::iter()
    }

    pub fn entity_id(self, key: &str) -> String {
        format!("switch.{key}_{self}")
    }

    pub fn label(self) -> &'static str {
        match self {
            Control::Light => "Light",
            Control::FanModel => "Model Fan",
            Control::FanCase => "Case Fan",
            Control::FanAux => "Aux Fan",
        }
    }
}

/// Flip an entity: `turn_off` when it is on, `turn_on` otherwise, in the
/// entity's own domain. Entities missing from the snapshot yield nothing.
pub fn toggle_command(snapshot: &StateSnapshot, entity_id: &str) -> Option<ServiceCommand> {
    let st = snapshot.get(entity_id)?;
    let service = if st.is_on() { "turn_off" } else { "turn_on" };
    Some(ServiceCommand {
        domain: st.domain().to_string(),
        service: service.to_string(),
        payload: json!({ "entity_id": entity_id }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::EntityState;

    #[test]
    fn test_builtin_pause_targets_printer_switch() {
        let actions = builtin_actions();
        let cmd = actions["pause"].command("k1_max");
        assert_eq!(
            cmd,
            ServiceCommand {
                domain: "switch".to_string(),
                service: "turn_on".to_string(),
                payload: json!({ "entity_id": "switch.k1_max_pause" }),
            }
        );

        let cmd = actions["unpause"].command("k1");
        assert_eq!(cmd.service, "turn_off");
        assert_eq!(cmd.payload, json!({ "entity_id": "switch.k1_pause" }));

        let cmd = actions["stop"].command("k1");
        assert_eq!(cmd.payload, json!({ "entity_id": "switch.k1_stop" }));

        let cmd = actions["auto_home"].command("k1");
        assert_eq!(cmd.domain, "creality_lan");
        assert_eq!(cmd.service, "get_bed_leveling");
        assert_eq!(cmd.payload, json!({}));
    }

    #[test]
    fn test_configured_actions_override_and_extend() {
        let configured: HashMap<String, ActionConfig> = toml::from_str(
            r#"
            [pause]
            domain = "button"
            service = "press"
            data_template = { entity_id = "button.{key}_pause", tags = ["{key}", 3] }

            [preheat]
            domain = "script"
            service = "preheat"
            data = { temp = 60 }

            [ping]
            domain = "script"
            service = "ping"
            "#,
        )
        .unwrap();

        let actions = merge_actions(configured);
        assert_eq!(actions.len(), 6);

        let cmd = actions["pause"].command("k1");
        assert_eq!(cmd.domain, "button");
        assert_eq!(
            cmd.payload,
            json!({ "entity_id": "button.k1_pause", "tags": ["k1", 3] })
        );

        let cmd = actions["preheat"].command("k1");
        assert_eq!(cmd.payload, json!({ "temp": 60 }));

        assert_eq!(actions["ping"].command("k1").payload, json!({}));
        // Untouched built-ins survive.
        assert_eq!(actions["stop"].command("k1").domain, "switch");
    }

    #[test]
    fn test_toggle_command() {
        let snapshot: StateSnapshot = vec![
            EntityState::new("switch.k1_light", "on"),
            EntityState::new("switch.k1_fan_model", "off"),
        ]
        .into();

        let cmd = toggle_command(&snapshot, "switch.k1_light").unwrap();
        assert_eq!(cmd.domain, "switch");
        assert_eq!(cmd.service, "turn_off");
        assert_eq!(cmd.payload, json!({ "entity_id": "switch.k1_light" }));

        let cmd = toggle_command(&snapshot, "switch.k1_fan_model").unwrap();
        assert_eq!(cmd.service, "turn_on");

        assert_eq!(toggle_command(&snapshot, "switch.k1_fan_aux"), None);
    }

    #[test]
    fn test_control_entities() {
        assert_eq!(Control::FanCase.entity_id("k1"), "switch.k1_fan_case");
        assert_eq!("fan_aux".parse::<Control>().unwrap(), Control::FanAux);
        assert!("fan".parse::<Control>().is_err());
        assert_eq!(Control::all().count(), 4);
    }
}
