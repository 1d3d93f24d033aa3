//! Vacation requests.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use super::de;
use super::dates::parse_day;

/// Approval state of a vacation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VacationStatus {
    Pendiente,
    Aprobado,
    Rechazado,
}

/// A vacation request as returned by the ERP.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VacationRequest {
    #[serde(default, deserialize_with = "de::opt_string", skip_serializing_if = "Option::is_none")]
    pub rowid: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string", skip_serializing_if = "Option::is_none")]
    pub fk_user: Option<String>,
    /// Login of the requester.
    #[serde(default, deserialize_with = "de::opt_string", skip_serializing_if = "Option::is_none")]
    pub usuario: Option<String>,
    #[serde(default, deserialize_with = "de::string")]
    pub fecha_inicio: String,
    #[serde(default, deserialize_with = "de::string")]
    pub fecha_fin: String,
    #[serde(default, deserialize_with = "de::opt_string", skip_serializing_if = "Option::is_none")]
    pub tipo: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string", skip_serializing_if = "Option::is_none")]
    pub estado: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string", skip_serializing_if = "Option::is_none")]
    pub comentarios: Option<String>,
}

impl VacationRequest {
    /// Parsed status. Unknown strings are `None`.
    #[must_use]
    pub fn status(&self) -> Option<VacationStatus> {
        match self.estado.as_deref()? {
            "pendiente" => Some(VacationStatus::Pendiente),
            "aprobado" => Some(VacationStatus::Aprobado),
            "rechazado" => Some(VacationStatus::Rechazado),
            _ => None,
        }
    }

    fn range(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((parse_day(&self.fecha_inicio)?, parse_day(&self.fecha_fin)?))
    }
}

/// First non-rejected request whose inclusive range intersects `start..=end`.
///
/// Requests with unparseable dates never conflict.
#[must_use]
pub fn check_overlap(
    start: NaiveDate,
    end: NaiveDate,
    existing: &[VacationRequest],
) -> Option<&VacationRequest> {
    existing
        .iter()
        .filter(|r| r.status() != Some(VacationStatus::Rechazado))
        .find(|r| {
            r.range()
                .is_some_and(|(other_start, other_end)| start <= other_end && end >= other_start)
        })
}

/// Monday to Friday days in `start..=end`.
#[must_use]
pub fn working_days(start: NaiveDate, end: NaiveDate) -> u32 {
    start
        .iter_days()
        .take_while(|day| *day <= end)
        .filter(|day| !matches!(day.weekday(), Weekday::Sat | Weekday::Sun))
        .fold(0, |count, _| count + 1)
}
