use std::collections::HashMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

/// State values Home Assistant reports for entities it cannot currently read.
pub const STATE_UNAVAILABLE: &str = "unavailable";
pub const STATE_UNKNOWN: &str = "unknown";
pub const STATE_ON: &str = "on";

/// One entity record as delivered by the host, in the shape of Home
/// Assistant's `/api/states` entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    pub entity_id: String,
    pub state: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl EntityState {
    pub fn new(entity_id: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            state: state.into(),
            attributes: Map::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Domain part of the identifier (`sensor` for `sensor.k1_progress`).
    pub fn domain(&self) -> &str {
        self.entity_id
            .split_once('.')
            .map(|(domain, _)| domain)
            .unwrap_or(&self.entity_id)
    }

    /// True for the two placeholder states that carry no reading.
    pub fn is_unavailable(&self) -> bool {
        self.state == STATE_UNAVAILABLE || self.state == STATE_UNKNOWN
    }

    pub fn is_on(&self) -> bool {
        self.state == STATE_ON
    }

    /// Attribute rendered as text, treating null, false, zero and the empty
    /// string as missing.
    pub fn attribute_text(&self, key: &str) -> Option<String> {
        match self.attributes.get(key)? {
            Value::Null | Value::Bool(false) => None,
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            Value::Number(n) if n.as_f64() == Some(0.0) => None,
            other => Some(other.to_string()),
        }
    }
}

/// Full host state at one update tick.
///
/// Entities keep the order the host delivered them in; every "first match"
/// lookup in the engine is relative to this order. A repeated identifier
/// replaces the earlier record in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<EntityState>", into = "Vec<EntityState>")]
pub struct StateSnapshot {
    entities: Vec<EntityState>,
    index: HashMap<String, usize>,
}

impl StateSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entity: EntityState) {
        match self.index.get(&entity.entity_id) {
            Some(&pos) => self.entities[pos] = entity,
            None => {
                self.index
                    .insert(entity.entity_id.clone(), self.entities.len());
                self.entities.push(entity);
            }
        }
    }

    pub fn get(&self, entity_id: &str) -> Option<&EntityState> {
        self.index.get(entity_id).map(|&pos| &self.entities[pos])
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityState> {
        self.entities.iter()
    }

    /// Records in the `sensor` domain, in delivery order.
    pub fn sensors(&self) -> impl Iterator<Item = &EntityState> {
        self.entities
            .iter()
            .filter(|e| e.entity_id.starts_with("sensor."))
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl FromIterator<EntityState> for StateSnapshot {
    fn from_iter<I: IntoIterator<Item = EntityState>>(iter: I) -> Self {
        let mut snapshot = StateSnapshot::new();
        for entity in iter {
            snapshot.insert(entity);
        }
        snapshot
    }
}

impl From<Vec<EntityState>> for StateSnapshot {
    fn from(entities: Vec<EntityState>) -> Self {
        entities.into_iter().collect()
    }
}

impl From<StateSnapshot> for Vec<EntityState> {
    fn from(snapshot: StateSnapshot) -> Self {
        snapshot.entities
    }
}
