//! CSV export of work cycles.

use fichajes_common::{AppError, AppResult};

use crate::domain::work_cycle::WorkCycle;

/// UTF-8 byte order mark so spreadsheet apps pick the right encoding.
const BOM: &str = "\u{feff}";

const HEADERS: [&str; 8] = [
    "Empleado",
    "Fecha",
    "Entrada",
    "Salida",
    "Pausas (min)",
    "Efectivo (min)",
    "Horas Totales",
    "Observaciones",
];

fn hours(minutes: i64) -> String {
    if minutes == 0 {
        "0".to_string()
    } else {
        let h = minutes as f64 / 60.0;
        format!("{h:.2}")
    }
}

fn time_of(fichaje: Option<&crate::domain::Fichaje>) -> String {
    fichaje
        .and_then(|f| f.fecha_creacion.as_deref())
        .and_then(crate::domain::parse_dolibarr_date)
        .map_or_else(|| "-".to_string(), |t| t.format("%H:%M:%S").to_string())
}

/// Render cycles as CSV, one row per cycle.
pub fn cycles_to_csv(cycles: &[WorkCycle]) -> AppResult<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(HEADERS)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    for cycle in cycles {
        let fecha = cycle.entered_at().format("%Y-%m-%d").to_string();
        wtr.write_record([
            cycle
                .entrada
                .usuario_nombre
                .clone()
                .unwrap_or_else(|| "N/A".to_string()),
            fecha,
            time_of(Some(&cycle.entrada)),
            time_of(cycle.salida.as_ref()),
            cycle.duracion_pausas.to_string(),
            cycle.duracion_efectiva.to_string(),
            hours(cycle.duracion_efectiva),
            cycle.entrada.observaciones.clone().unwrap_or_default(),
        ])
        .map_err(|e| AppError::Internal(e.to_string()))?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| AppError::Internal(e.to_string()))?;
    let body = String::from_utf8(bytes).map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(format!("{BOM}{body}"))
}
