//! Domain model and pure logic.

#![allow(missing_docs)]

pub mod center;
pub mod correction;
pub mod dates;
pub mod de;
pub mod fichaje;
pub mod gesture;
pub mod jornada;
pub mod vacation;
pub mod work_cycle;

pub use center::Center;
pub use correction::{PendingCorrection, correction_owner, normalize_pending};
pub use dates::{normalize_timestamp, parse_day, parse_dolibarr_date};
pub use fichaje::{Fichaje, FichajeTipo, FichajeView};
pub use gesture::{MoveOutcome, PullToRefresh};
pub use jornada::Jornada;
pub use vacation::{VacationRequest, VacationStatus, check_overlap, working_days};
pub use work_cycle::{ClockState, TimelineEvent, WorkCycle, clock_state, group_into_cycles, timeline};
