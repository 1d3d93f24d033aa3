//! Correction requests for past clock events.

use chrono_tz::Tz;
use serde::Serialize;
use serde_json::Value;

use super::dates::normalize_timestamp;
use super::de::{is_truthy, value_to_string};

/// Fields that may carry the proposed time, in priority order.
const PROPOSED_FIELDS: [&str; 4] = ["valor_nuevo", "fecha_evento", "fecha_creacion", "fecha_nueva"];

/// Fields that may carry the original time, in priority order.
const PREVIOUS_FIELDS: [&str; 4] = [
    "valor_anterior",
    "fecha_anterior",
    "fecha_original",
    "fecha_actual",
];

/// A pending correction in the shape the approval dialog expects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingCorrection {
    pub id: Option<Value>,
    pub tipo: &'static str,
    pub fecha_creacion_iso: Option<Value>,
    pub fecha_anterior_iso: Option<Value>,
    pub observaciones: String,
    pub usuario_nombre: Option<Value>,
}

fn first_present<'a>(item: &'a Value, fields: &[&str]) -> Option<&'a Value> {
    fields
        .iter()
        .filter_map(|field| item.get(*field))
        .find(|v| is_truthy(v))
}

fn text_field(item: &Value, field: &str) -> Option<String> {
    item.get(field)
        .filter(|v| is_truthy(v))
        .and_then(value_to_string)
}

impl PendingCorrection {
    fn from_row(item: &Value, tz: Tz) -> Self {
        let tipo = match item.get("id_tipo").and_then(value_to_string).as_deref() {
            Some("1") => "entrada",
            _ => "salida",
        };

        Self {
            id: item.get("rowid").cloned(),
            tipo,
            fecha_creacion_iso: first_present(item, &PROPOSED_FIELDS)
                .and_then(|v| normalize_timestamp(v, tz)),
            fecha_anterior_iso: first_present(item, &PREVIOUS_FIELDS)
                .and_then(|v| normalize_timestamp(v, tz)),
            observaciones: text_field(item, "motivo")
                .or_else(|| text_field(item, "observaciones"))
                .unwrap_or_else(|| "Sin observaciones".to_string()),
            usuario_nombre: item.get("usuario_nombre").cloned(),
        }
    }
}

/// Map ERP correction rows to pending corrections. Non-arrays give an empty list.
/// Epoch timestamps are rendered in `tz`.
#[must_use]
pub fn normalize_pending(data: &Value, tz: Tz) -> Vec<PendingCorrection> {
    data.as_array()
        .map(|rows| rows.iter().map(|row| PendingCorrection::from_row(row, tz)).collect())
        .unwrap_or_default()
}

fn has_id(row: &Value, id: &str) -> bool {
    ["rowid", "id"]
        .iter()
        .filter_map(|field| row.get(*field))
        .filter_map(value_to_string)
        .any(|value| value == id)
}

/// Owner of correction `id` from a correction listing.
///
/// The ERP listing takes no id filter, so the row is matched on `rowid`.
/// A single object is accepted when its id matches.
#[must_use]
pub fn correction_owner(listing: &Value, id: &str) -> Option<String> {
    let row = match listing {
        Value::Array(rows) => rows.iter().find(|row| has_id(row, id))?,
        row if has_id(row, id) => row,
        _ => return None,
    };
    row.get("fk_user")
        .filter(|v| is_truthy(v))
        .and_then(value_to_string)
}
