//! Shift reminders.
//!
//! A sweep looks at every active shift and reminds the owner when the
//! start or end of the shift falls within the next `window` minutes. With
//! sweeps spaced exactly `window` minutes apart each boundary is hit once.

use chrono::{NaiveTime, Timelike};
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;

use fichajes_common::config::CronConfig;
use fichajes_common::AppResult;

use crate::domain::Jornada;

use super::dolibarr::DolibarrClient;
use super::push_notification::{PushNotificationService, PushPayload};
use super::push_store::NotificationTopic;

const JORNADAS_PATH: &str = "/fichajestrabajadoresapi/jornadas";
const MINUTES_PER_DAY: i64 = 24 * 60;

/// Which shift boundary a reminder is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderKind {
    ClockIn,
    ClockOut,
}

impl ReminderKind {
    fn payload(self, at: NaiveTime) -> PushPayload {
        let hora = at.format("%H:%M");
        let (title, body) = match self {
            Self::ClockIn => (
                "Recordatorio de entrada",
                format!("Tu jornada empieza a las {hora}. No olvides fichar la entrada."),
            ),
            Self::ClockOut => (
                "Recordatorio de salida",
                format!("Tu jornada termina a las {hora}. No olvides fichar la salida."),
            ),
        };
        PushPayload::new(title, body).with_url("/fichajes")
    }
}

/// A reminder that should go out in this sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueReminder {
    pub user_id: String,
    pub kind: ReminderKind,
    pub at: NaiveTime,
}

/// Counts reported by a sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReminderSummary {
    pub checked: usize,
    pub sent: usize,
}

fn minute_of_day(t: NaiveTime) -> i64 {
    i64::from(t.hour()) * 60 + i64::from(t.minute())
}

/// Whether `boundary` falls in `(now, now + window]`, wrapping at midnight.
fn within_window(now: NaiveTime, boundary: NaiveTime, window_minutes: i64) -> bool {
    let ahead = (minute_of_day(boundary) - minute_of_day(now)).rem_euclid(MINUTES_PER_DAY);
    ahead > 0 && ahead <= window_minutes
}

/// Reminders due at local time `now` for the given shifts.
#[must_use]
pub fn due_reminders(jornadas: &[Jornada], now: NaiveTime, window_minutes: i64) -> Vec<DueReminder> {
    let mut due = Vec::new();
    for jornada in jornadas.iter().filter(|j| j.is_active()) {
        let Some(user_id) = jornada.fk_user.as_deref().filter(|u| !u.is_empty()) else {
            continue;
        };
        let boundaries = [
            (ReminderKind::ClockIn, jornada.start_time()),
            (ReminderKind::ClockOut, jornada.end_time()),
        ];
        for (kind, at) in boundaries {
            if let Some(at) = at.filter(|t| within_window(now, *t, window_minutes)) {
                due.push(DueReminder {
                    user_id: user_id.to_string(),
                    kind,
                    at,
                });
            }
        }
    }
    due
}

/// Sends shift reminders.
#[derive(Clone)]
pub struct ReminderService {
    dolibarr: DolibarrClient,
    push: PushNotificationService,
    window_minutes: i64,
}

impl ReminderService {
    #[must_use]
    pub fn new(dolibarr: DolibarrClient, push: PushNotificationService, config: &CronConfig) -> Self {
        Self {
            dolibarr,
            push,
            window_minutes: config.reminder_window_minutes,
        }
    }

    /// Run one sweep against the ERP's current wall-clock time.
    pub async fn sweep(&self) -> AppResult<ReminderSummary> {
        self.sweep_at(self.dolibarr.now().time()).await
    }

    /// Run one sweep as if the local time were `now`.
    pub async fn sweep_at(&self, now: NaiveTime) -> AppResult<ReminderSummary> {
        let api_key = self.dolibarr.require_admin_key()?;
        let response = self.dolibarr.get(JORNADAS_PATH, api_key, &[]).await?;
        // No shifts configured at all.
        let data = if response.status == StatusCode::NOT_FOUND {
            Value::Null
        } else {
            response.ok_json("Error al obtener jornadas")?
        };

        let jornadas: Vec<Jornada> = match data {
            Value::Array(rows) => rows
                .into_iter()
                .filter_map(|row| serde_json::from_value(row).ok())
                .collect(),
            _ => Vec::new(),
        };

        let mut summary = ReminderSummary {
            checked: jornadas.iter().filter(|j| j.is_active()).count(),
            sent: 0,
        };

        for reminder in due_reminders(&jornadas, now, self.window_minutes) {
            let payload = reminder.kind.payload(reminder.at);
            match self
                .push
                .notify_if_enabled(&reminder.user_id, NotificationTopic::Fichajes, &payload)
                .await
            {
                Ok(Some(sent)) => summary.sent += sent.sent,
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(user_id = %reminder.user_id, error = %e, "Failed to send reminder");
                }
            }
        }

        tracing::info!(checked = summary.checked, sent = summary.sent, "Reminder sweep finished");
        Ok(summary)
    }
}
