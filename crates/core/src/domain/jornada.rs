//! Configured work shifts.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::de;

/// A work shift as stored by the ERP.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Jornada {
    #[serde(default, deserialize_with = "de::opt_string", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string", skip_serializing_if = "Option::is_none")]
    pub fk_user: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string", skip_serializing_if = "Option::is_none")]
    pub tipo_jornada: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string", skip_serializing_if = "Option::is_none")]
    pub tipo_turno: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string", skip_serializing_if = "Option::is_none")]
    pub hora_inicio_jornada: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string", skip_serializing_if = "Option::is_none")]
    pub hora_fin_jornada: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string", skip_serializing_if = "Option::is_none")]
    pub observaciones: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string", skip_serializing_if = "Option::is_none")]
    pub active: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pausas: Option<Value>,
}

/// Parse `HH:MM[:SS]`.
#[must_use]
pub fn parse_shift_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .ok()
}

impl Jornada {
    /// Inactive only when the ERP says so explicitly.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !matches!(self.active.as_deref(), Some("0" | "false"))
    }

    #[must_use]
    pub fn start_time(&self) -> Option<NaiveTime> {
        self.hora_inicio_jornada.as_deref().and_then(parse_shift_time)
    }

    #[must_use]
    pub fn end_time(&self) -> Option<NaiveTime> {
        self.hora_fin_jornada.as_deref().and_then(parse_shift_time)
    }
}
