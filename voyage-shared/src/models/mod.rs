pub mod events;

pub use events::{ReservationEvent, ReservationEventKind};
