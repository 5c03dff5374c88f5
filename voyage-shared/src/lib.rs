pub mod models;
pub mod pii;

pub use models::{ReservationEvent, ReservationEventKind};
pub use pii::Masked;
