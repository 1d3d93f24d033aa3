//! Work-cycle reconstruction from a flat list of clock events.
//!
//! Events are grouped per employee, sorted by timestamp and walked once:
//! `entrar` opens a cycle, pauses nest inside it and `salir` closes it.
//! Malformed orderings produce partial cycles rather than errors.

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;

use super::dates::{format_dolibarr_date, parse_dolibarr_date};
use super::fichaje::{Fichaje, FichajeTipo};

/// An open cycle older than this is closed when the next entry arrives.
pub const AUTO_CLOSE_AFTER_MINUTES: i64 = 12 * 60;

/// Observation attached to synthetic exits.
pub const AUTO_CLOSE_NOTE: &str = "Cierre automático > 12h";

/// One pause inside a cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Pausa {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inicio: Option<Fichaje>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fin: Option<Fichaje>,
}

impl Pausa {
    fn minutes(&self) -> i64 {
        match (&self.inicio, &self.fin) {
            (Some(inicio), Some(fin)) => match (event_time(inicio), event_time(fin)) {
                (Some(start), Some(end)) => (end - start).num_minutes(),
                _ => 0,
            },
            _ => 0,
        }
    }

    const fn is_open(&self) -> bool {
        self.inicio.is_some() && self.fin.is_none()
    }
}

/// An entry-to-exit span with its pauses. Durations are in minutes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkCycle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fk_user: Option<String>,
    pub fecha: String,
    pub entrada: Fichaje,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salida: Option<Fichaje>,
    pub pausas: Vec<Pausa>,
    pub duracion_total: i64,
    pub duracion_pausas: i64,
    pub duracion_efectiva: i64,
    #[serde(skip)]
    entered_at: NaiveDateTime,
}

impl WorkCycle {
    fn open(entrada: Fichaje, entered_at: NaiveDateTime) -> Self {
        Self {
            fk_user: entrada.fk_user.clone(),
            fecha: entrada.fecha_creacion.clone().unwrap_or_default(),
            entrada,
            salida: None,
            pausas: Vec::new(),
            duracion_total: 0,
            duracion_pausas: 0,
            duracion_efectiva: 0,
            entered_at,
        }
    }

    /// Entry timestamp.
    #[must_use]
    pub const fn entered_at(&self) -> NaiveDateTime {
        self.entered_at
    }

    /// Whether the cycle has no exit yet.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.salida.is_none()
    }

    /// Whether the most recent pause has not ended.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.pausas.last().is_some_and(Pausa::is_open)
    }

    fn measure_until(&mut self, end: NaiveDateTime) {
        let total = (end - self.entered_at).num_minutes();
        let paused: i64 = self.pausas.iter().map(Pausa::minutes).sum();
        self.duracion_total = total;
        self.duracion_pausas = paused;
        self.duracion_efectiva = total - paused;
    }

    fn auto_close(&mut self) {
        self.salida = Some(Fichaje {
            id: Some("-1".to_string()),
            tipo: Some(FichajeTipo::Salir.as_str().to_string()),
            observaciones: Some(AUTO_CLOSE_NOTE.to_string()),
            ..self.entrada.clone()
        });
    }
}

/// Current clock state of an employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockState {
    /// No open cycle.
    SinIniciar,
    /// Open cycle, not paused.
    Trabajando,
    /// Open cycle with an open pause.
    EnPausa,
}

fn event_time(fichaje: &Fichaje) -> Option<NaiveDateTime> {
    fichaje.fecha_creacion.as_deref().and_then(parse_dolibarr_date)
}

/// Group clock events into work cycles, newest entry first.
///
/// `now` closes the measurement of cycles that are still open.
#[must_use]
pub fn group_into_cycles(events: &[Fichaje], now: NaiveDateTime) -> Vec<WorkCycle> {
    let mut by_user: BTreeMap<&str, Vec<(NaiveDateTime, FichajeTipo, &Fichaje)>> = BTreeMap::new();
    for fichaje in events {
        let (Some(kind), Some(at)) = (fichaje.kind(), event_time(fichaje)) else {
            continue;
        };
        by_user
            .entry(fichaje.owner_key())
            .or_default()
            .push((at, kind, fichaje));
    }

    let mut cycles = Vec::new();
    for mut user_events in by_user.into_values() {
        user_events.sort_by_key(|(at, _, _)| *at);
        cycles.extend(walk_user_events(&user_events, now));
    }

    cycles.sort_by(|a, b| b.entered_at.cmp(&a.entered_at));
    cycles
}

fn walk_user_events(
    events: &[(NaiveDateTime, FichajeTipo, &Fichaje)],
    now: NaiveDateTime,
) -> Vec<WorkCycle> {
    let mut done = Vec::new();
    let mut current: Option<WorkCycle> = None;

    for &(at, kind, fichaje) in events {
        let mut event = fichaje.clone();
        event.tipo = Some(kind.as_str().to_string());

        match kind {
            FichajeTipo::Entrar => {
                let stale = current.as_ref().is_some_and(|open| {
                    at - open.entered_at > Duration::minutes(AUTO_CLOSE_AFTER_MINUTES)
                });
                if stale {
                    if let Some(mut open) = current.take() {
                        open.auto_close();
                        done.push(open);
                    }
                }
                if current.is_none() {
                    current = Some(WorkCycle::open(event, at));
                }
            }
            FichajeTipo::Salir => {
                if let Some(mut cycle) = current.take() {
                    cycle.salida = Some(event);
                    cycle.measure_until(at);
                    done.push(cycle);
                }
            }
            FichajeTipo::IniciarPausa => {
                if let Some(cycle) = current.as_mut() {
                    cycle.pausas.push(Pausa {
                        inicio: Some(event),
                        fin: None,
                    });
                }
            }
            FichajeTipo::TerminarPausa => {
                if let Some(last) = current
                    .as_mut()
                    .and_then(|c| c.pausas.last_mut())
                    .filter(|p| p.fin.is_none())
                {
                    last.fin = Some(event);
                }
            }
        }
    }

    if let Some(mut cycle) = current {
        cycle.measure_until(now);
        done.push(cycle);
    }

    done
}

/// Derive the clock state from cycles as returned by [`group_into_cycles`].
#[must_use]
pub fn clock_state(cycles: &[WorkCycle]) -> ClockState {
    match active_cycle(cycles) {
        None => ClockState::SinIniciar,
        Some(active) if active.is_paused() => ClockState::EnPausa,
        Some(_) => ClockState::Trabajando,
    }
}

/// The cycle currently in progress, if any.
#[must_use]
pub fn active_cycle(cycles: &[WorkCycle]) -> Option<&WorkCycle> {
    cycles.iter().find(|c| c.is_open())
}

/// Kind of a flattened timeline entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineKind {
    Entrada,
    InicioPausa,
    FinPausa,
    Salida,
}

impl TimelineKind {
    const fn label(self) -> &'static str {
        match self {
            Self::Entrada => "Entrada",
            Self::InicioPausa => "Pausa",
            Self::FinPausa => "Regreso",
            Self::Salida => "Salida",
        }
    }

    const fn id_prefix(self) -> &'static str {
        match self {
            Self::Entrada => "entrada",
            Self::InicioPausa => "pausa-start",
            Self::FinPausa => "pausa-end",
            Self::Salida => "salida",
        }
    }
}

/// One point of a day's timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineEvent {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: TimelineKind,
    pub label: &'static str,
    pub time: String,
    pub date: String,
    pub has_location: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lng: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observaciones: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pause_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pause_end: Option<String>,
    pub context_entry: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_exit: Option<String>,
    pub is_next_day: bool,
    #[serde(skip)]
    at: NaiveDateTime,
}

/// Flatten cycles into chronologically sorted timeline events.
#[must_use]
pub fn timeline(cycles: &[WorkCycle]) -> Vec<TimelineEvent> {
    let mut events = Vec::new();

    for cycle in cycles {
        let entry = cycle.entered_at;
        let exit = cycle.salida.as_ref().and_then(event_time);
        let date = entry.date().format("%Y-%m-%d").to_string();

        let make = |kind: TimelineKind,
                    fichaje: &Fichaje,
                    at: NaiveDateTime,
                    pause: Option<(NaiveDateTime, Option<NaiveDateTime>)>| {
            TimelineEvent {
                id: format!("{}-{}", kind.id_prefix(), at.and_utc().timestamp_millis()),
                db_id: fichaje.id.clone(),
                user_id: cycle.fk_user.clone(),
                kind,
                label: kind.label(),
                time: format_dolibarr_date(at),
                date: date.clone(),
                has_location: fichaje.has_valid_coordinates(),
                lat: fichaje.latitud.clone(),
                lng: fichaje.longitud.clone(),
                observaciones: fichaje.observaciones.clone(),
                pause_start: pause.map(|(start, _)| format_dolibarr_date(start)),
                pause_end: pause.and_then(|(_, end)| end).map(format_dolibarr_date),
                context_entry: format_dolibarr_date(entry),
                context_exit: exit.map(format_dolibarr_date),
                is_next_day: at.date() != entry.date(),
                at,
            }
        };

        events.push(make(TimelineKind::Entrada, &cycle.entrada, entry, None));

        for pausa in &cycle.pausas {
            let Some((inicio, start)) = pausa
                .inicio
                .as_ref()
                .and_then(|f| event_time(f).map(|t| (f, t)))
            else {
                continue;
            };
            let end = pausa.fin.as_ref().and_then(|f| event_time(f).map(|t| (f, t)));

            events.push(make(
                TimelineKind::InicioPausa,
                inicio,
                start,
                Some((start, end.map(|(_, t)| t))),
            ));
            if let Some((fin, end_at)) = end {
                events.push(make(
                    TimelineKind::FinPausa,
                    fin,
                    end_at,
                    Some((start, Some(end_at))),
                ));
            }
        }

        if let (Some(salida), Some(exit_at)) = (cycle.salida.as_ref(), exit) {
            events.push(make(TimelineKind::Salida, salida, exit_at, None));
        }
    }

    events.sort_by_key(|e| e.at);
    events
}
