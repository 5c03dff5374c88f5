use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use voyage_shared::Masked;

use crate::{CoreError, CoreResult};

/// Reservation lifecycle states.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ReservationState {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl ReservationState {
    pub const ALL: [ReservationState; 4] = [
        ReservationState::Pending,
        ReservationState::Confirmed,
        ReservationState::Completed,
        ReservationState::Cancelled,
    ];

    /// Counts against the tour's `available` counter and can be released.
    pub fn is_seat_holding(&self) -> bool {
        matches!(self, ReservationState::Pending | ReservationState::Confirmed)
    }

    /// Seats taken out of `available`: the holding states plus `completed`,
    /// whose seats were used rather than released.
    pub fn consumes_seats(&self) -> bool {
        !matches!(self, ReservationState::Cancelled)
    }

    pub fn can_transition_to(&self, next: ReservationState) -> bool {
        use ReservationState::*;
        matches!(
            (self, next),
            (Pending, Confirmed) | (Pending, Cancelled) | (Confirmed, Cancelled) | (Confirmed, Completed)
        )
    }

    /// Whether moving to `next` hands the seats back to the ledger.
    pub fn releases_seats_on(&self, next: ReservationState) -> bool {
        self.is_seat_holding() && next == ReservationState::Cancelled
    }

    /// Hard delete is allowed for holding and cancelled records. Completed
    /// records stay because their seats remain consumed.
    pub fn can_delete(&self) -> bool {
        !matches!(self, ReservationState::Completed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationState::Pending => "pending",
            ReservationState::Confirmed => "confirmed",
            ReservationState::Completed => "completed",
            ReservationState::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ReservationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReservationState {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ReservationState::Pending),
            "confirmed" => Ok(ReservationState::Confirmed),
            "completed" => Ok(ReservationState::Completed),
            "cancelled" => Ok(ReservationState::Cancelled),
            other => Err(CoreError::ValidationError(format!("unknown booking state '{}'", other))),
        }
    }
}

/// Free-text contact details. Not validated beyond presence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Contact {
    pub name: String,
    pub email: Masked<String>,
    pub phone: Masked<String>,
    #[serde(default)]
    pub address: String,
}

/// Inbound reservation request, before pricing and the seat hold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationDraft {
    pub tour_id: Uuid,
    pub contact: Contact,
    pub adults: i32,
    #[serde(default)]
    pub children: i32,
    pub departure_date: NaiveDate,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl ReservationDraft {
    pub fn headcount(&self) -> i32 {
        self.adults.saturating_add(self.children)
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.adults < 1 {
            return Err(CoreError::InvalidHeadcount(format!(
                "at least one adult is required, got {}",
                self.adults
            )));
        }
        if self.children < 0 {
            return Err(CoreError::InvalidHeadcount(format!(
                "children must not be negative, got {}",
                self.children
            )));
        }
        if self.adults.checked_add(self.children).is_none() {
            return Err(CoreError::InvalidHeadcount(format!(
                "party of {} adults and {} children is too large",
                self.adults, self.children
            )));
        }
        Ok(())
    }
}

/// A customer's claim against a tour's capacity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reservation {
    pub id: Uuid,
    pub tour_id: Uuid,
    pub contact: Contact,
    pub adults: i32,
    pub children: i32,
    pub departure_date: NaiveDate,
    /// Quote frozen at creation; later tour price edits do not change it.
    pub total_price: i64,
    pub state: ReservationState,
    pub user_id: Option<String>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    pub fn new(draft: ReservationDraft, total_price: i64, state: ReservationState) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tour_id: draft.tour_id,
            contact: draft.contact,
            adults: draft.adults,
            children: draft.children,
            departure_date: draft.departure_date,
            total_price,
            state,
            user_id: draft.user_id,
            note: draft.note,
            created_at: now,
            updated_at: now,
        }
    }

    /// Saturates rather than wraps; drafts with an overflowing sum never
    /// pass validation.
    pub fn headcount(&self) -> i32 {
        self.adults.saturating_add(self.children)
    }

    /// Who the notification emitter should address.
    pub fn recipient(&self) -> String {
        self.user_id
            .clone()
            .unwrap_or_else(|| self.contact.email.expose().clone())
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id.as_deref() == Some(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ReservationState::*;

    #[test]
    fn test_allowed_transitions() {
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Completed));

        assert!(!Pending.can_transition_to(Completed));
        assert!(!Pending.can_transition_to(Pending));
        assert!(!Confirmed.can_transition_to(Pending));
        assert!(!Confirmed.can_transition_to(Confirmed));
    }

    #[test]
    fn test_terminal_states_reject_every_target() {
        for from in [Completed, Cancelled] {
            for to in ReservationState::ALL {
                assert!(!from.can_transition_to(to), "{} -> {} must be rejected", from, to);
            }
        }
    }

    #[test]
    fn test_only_cancellation_releases_seats() {
        assert!(Pending.releases_seats_on(Cancelled));
        assert!(Confirmed.releases_seats_on(Cancelled));
        assert!(!Confirmed.releases_seats_on(Completed));
        assert!(!Pending.releases_seats_on(Confirmed));
        assert!(!Cancelled.releases_seats_on(Cancelled));
    }

    #[test]
    fn test_seat_accounting_flags() {
        assert!(Pending.is_seat_holding() && Confirmed.is_seat_holding());
        assert!(!Completed.is_seat_holding() && !Cancelled.is_seat_holding());
        assert!(Completed.consumes_seats());
        assert!(!Cancelled.consumes_seats());
        assert!(!Completed.can_delete());
        assert!(Cancelled.can_delete());
    }

    #[test]
    fn test_draft_headcount_validation() {
        let mut draft = ReservationDraft {
            tour_id: Uuid::new_v4(),
            contact: Contact {
                name: "Lan".into(),
                email: Masked("lan@example.com".into()),
                phone: Masked("0900000000".into()),
                address: String::new(),
            },
            adults: 2,
            children: 1,
            departure_date: NaiveDate::from_ymd_opt(2026, 12, 1).unwrap(),
            note: None,
            user_id: None,
        };
        assert!(draft.validate().is_ok());
        assert_eq!(draft.headcount(), 3);

        draft.adults = 0;
        assert!(matches!(draft.validate(), Err(CoreError::InvalidHeadcount(_))));

        draft.adults = 1;
        draft.children = -1;
        assert!(matches!(draft.validate(), Err(CoreError::InvalidHeadcount(_))));

        draft.adults = i32::MAX;
        draft.children = 1;
        assert!(matches!(draft.validate(), Err(CoreError::InvalidHeadcount(_))));
    }

    #[test]
    fn test_recipient_prefers_linked_user() {
        let draft = ReservationDraft {
            tour_id: Uuid::new_v4(),
            contact: Contact {
                name: "Minh".into(),
                email: Masked("minh@example.com".into()),
                phone: Masked("0911111111".into()),
                address: "Hue".into(),
            },
            adults: 1,
            children: 0,
            departure_date: NaiveDate::from_ymd_opt(2026, 11, 20).unwrap(),
            note: None,
            user_id: None,
        };
        let anonymous = Reservation::new(draft.clone(), 100, Pending);
        assert_eq!(anonymous.recipient(), "minh@example.com");

        let linked = Reservation::new(ReservationDraft { user_id: Some("user-9".into()), ..draft }, 100, Pending);
        assert_eq!(linked.recipient(), "user-9");
        assert!(linked.is_owned_by("user-9"));
        assert!(!anonymous.is_owned_by("user-9"));
    }
}
