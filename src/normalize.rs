//! Count Normalization
//!
//! The activity API has shipped two vocabularies for the same client counts:
//!
//! - legacy: `clients`, `distinct_entities`, `non_entity_tokens`
//! - current: `clients`, `entity_clients`, `non_entity_clients`
//!
//! Both are folded into [`ClientCounts`] here, once, at the ingestion boundary. Nothing
//! downstream of [`normalize`] looks at the legacy names again.
//!
//! [`flatten`] lifts the nested `counts` object of a month, namespace or mount into a
//! [`ClientCounts`]; the same detection logic is used at all three levels.

use crate::models::RawCounts;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

pub const CLIENTS: &str = "clients";
pub const ENTITY_CLIENTS: &str = "entity_clients";
pub const NON_ENTITY_CLIENTS: &str = "non_entity_clients";
pub const LEGACY_DISTINCT_ENTITIES: &str = "distinct_entities";
pub const LEGACY_NON_ENTITY_TOKENS: &str = "non_entity_tokens";

/// Normalized client counts.
///
/// The three known fields are optional because partial data is rendered rather than
/// rejected. `other` holds any field of a counts object that matched neither schema
/// (e.g. `secret_syncs`), plus known counts whose value is not an unsigned integer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientCounts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clients: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_clients: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_entity_clients: Option<u64>,
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

impl ClientCounts {
    pub fn new(clients: u64, entity_clients: u64, non_entity_clients: u64) -> Self {
        Self {
            clients: Some(clients),
            entity_clients: Some(entity_clients),
            non_entity_clients: Some(non_entity_clients),
            other: BTreeMap::new(),
        }
    }

    /// True when no field at all is present.
    pub fn is_empty(&self) -> bool {
        self.clients.is_none()
            && self.entity_clients.is_none()
            && self.non_entity_clients.is_none()
            && self.other.is_empty()
    }

    /// Render back into a JSON object, the shape `normalize` accepts.
    pub fn to_map(&self) -> RawCounts {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

/// Fold either count vocabulary into [`ClientCounts`].
///
/// - `entity_clients` present: keep only the three current fields.
/// - `distinct_entities` present: rename the legacy fields.
/// - neither: pass everything through unchanged.
///
/// A known count whose value is not an unsigned integer is kept verbatim in `other`,
/// under its current name, rather than dropped. Applying this twice yields the same result.
pub fn normalize(counts: &RawCounts) -> ClientCounts {
    if counts.contains_key(ENTITY_CLIENTS) {
        let mut normalized = ClientCounts::default();
        carry(counts, CLIENTS, CLIENTS, &mut normalized.clients, &mut normalized.other);
        carry(
            counts,
            ENTITY_CLIENTS,
            ENTITY_CLIENTS,
            &mut normalized.entity_clients,
            &mut normalized.other,
        );
        carry(
            counts,
            NON_ENTITY_CLIENTS,
            NON_ENTITY_CLIENTS,
            &mut normalized.non_entity_clients,
            &mut normalized.other,
        );
        normalized
    } else if counts.contains_key(LEGACY_DISTINCT_ENTITIES) {
        let mut normalized = ClientCounts::default();
        carry(counts, CLIENTS, CLIENTS, &mut normalized.clients, &mut normalized.other);
        carry(
            counts,
            LEGACY_DISTINCT_ENTITIES,
            ENTITY_CLIENTS,
            &mut normalized.entity_clients,
            &mut normalized.other,
        );
        carry(
            counts,
            LEGACY_NON_ENTITY_TOKENS,
            NON_ENTITY_CLIENTS,
            &mut normalized.non_entity_clients,
            &mut normalized.other,
        );
        normalized
    } else {
        let mut normalized = ClientCounts::default();
        for (key, value) in counts {
            match (key.as_str(), value.as_u64()) {
                (CLIENTS, Some(n)) => normalized.clients = Some(n),
                (NON_ENTITY_CLIENTS, Some(n)) => normalized.non_entity_clients = Some(n),
                _ => {
                    normalized.other.insert(key.clone(), value.clone());
                }
            }
        }
        normalized
    }
}

/// Anything carrying an optional nested `counts` object.
pub trait CountsCarrier {
    fn raw_counts(&self) -> Option<&RawCounts>;
}

/// Lift an entity's nested `counts` into a flat, normalized record.
///
/// Entities without counts are already flat and yield an empty record.
pub fn flatten<E: CountsCarrier + ?Sized>(entity: &E) -> ClientCounts {
    entity.raw_counts().map(normalize).unwrap_or_default()
}

/// Move `from` into `slot` when it is an unsigned integer, otherwise keep it in `other`
/// as `to`.
fn carry(
    counts: &RawCounts,
    from: &str,
    to: &str,
    slot: &mut Option<u64>,
    other: &mut BTreeMap<String, Value>,
) {
    if let Some(value) = counts.get(from) {
        match value.as_u64() {
            Some(n) => *slot = Some(n),
            None => {
                debug!(field = from, value = %value, "Keeping non-integer count verbatim");
                other.insert(to.to_string(), value.clone());
            }
        }
    }
}
