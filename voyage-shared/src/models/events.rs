use uuid::Uuid;

/// What happened to a reservation.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationEventKind {
    Created,
    Confirmed,
    Cancelled,
    Completed,
    Deleted,
}

impl ReservationEventKind {
    pub fn topic_suffix(&self) -> &'static str {
        match self {
            ReservationEventKind::Created => "created",
            ReservationEventKind::Confirmed => "confirmed",
            ReservationEventKind::Cancelled => "cancelled",
            ReservationEventKind::Completed => "completed",
            ReservationEventKind::Deleted => "deleted",
        }
    }
}

/// Payload handed to the notification emitter after a committed change.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct ReservationEvent {
    pub reservation_id: Uuid,
    pub tour_id: Uuid,
    /// Linked user id when present, otherwise the contact email.
    pub recipient: String,
    pub kind: ReservationEventKind,
    pub headcount: i32,
    pub timestamp: i64,
}

impl ReservationEvent {
    pub fn new(
        reservation_id: Uuid,
        tour_id: Uuid,
        recipient: String,
        kind: ReservationEventKind,
        headcount: i32,
    ) -> Self {
        Self {
            reservation_id,
            tour_id,
            recipient,
            kind,
            headcount,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}
