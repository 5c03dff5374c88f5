use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;
use voyage_catalog::{PricingEngine, PricingError};
use voyage_core::{
    CapacityLedger, Caller, CoreError, CoreResult, NotificationEmitter, OfferingStore, Reservation,
    ReservationDraft, ReservationRepository, ReservationState, ReserveOutcome,
};
use voyage_shared::{ReservationEvent, ReservationEventKind};

use crate::retry::RetryPolicy;

/// Result of comparing the ledger counter with what the booking records say
/// it should be.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct LedgerAudit {
    pub offering_id: Uuid,
    pub capacity: i32,
    pub ledger_available: i32,
    pub expected_available: i32,
    /// `ledger_available - expected_available`. Positive means seats leaked
    /// back, negative means seats are held by no booking.
    pub drift: i32,
}

impl LedgerAudit {
    pub fn is_consistent(&self) -> bool {
        self.drift == 0
    }
}

/// Drives bookings through their states and keeps the capacity ledger in
/// step with every transition that changes seat commitment.
pub struct ReservationManager {
    offerings: Arc<dyn OfferingStore>,
    ledger: Arc<dyn CapacityLedger>,
    reservations: Arc<dyn ReservationRepository>,
    notifier: Arc<dyn NotificationEmitter>,
    pricing: PricingEngine,
    release_policy: RetryPolicy,
}

impl ReservationManager {
    pub fn new(
        offerings: Arc<dyn OfferingStore>,
        ledger: Arc<dyn CapacityLedger>,
        reservations: Arc<dyn ReservationRepository>,
        notifier: Arc<dyn NotificationEmitter>,
    ) -> Self {
        Self {
            offerings,
            ledger,
            reservations,
            notifier,
            pricing: PricingEngine::default(),
            release_policy: RetryPolicy::default(),
        }
    }

    pub fn with_pricing(mut self, pricing: PricingEngine) -> Self {
        self.pricing = pricing;
        self
    }

    pub fn with_release_policy(mut self, policy: RetryPolicy) -> Self {
        self.release_policy = policy;
        self
    }

    // ------------------------------------------------------------------
    // Creation
    // ------------------------------------------------------------------

    /// Public reservation request. The booking starts `pending`.
    pub async fn create_pending(&self, draft: ReservationDraft, caller: &Caller) -> CoreResult<Reservation> {
        let (tour_id, headcount) = (draft.tour_id, draft.headcount());
        let result = self.create(draft, ReservationState::Pending, caller).await;
        self.report(&result, "create booking", Some(tour_id), Some(headcount), caller);
        result
    }

    /// Administratively entered booking. Starts `confirmed`.
    pub async fn create_confirmed(&self, draft: ReservationDraft, caller: &Caller) -> CoreResult<Reservation> {
        let (tour_id, headcount) = (draft.tour_id, draft.headcount());
        let result = match require_admin(caller, "enter confirmed bookings") {
            Ok(()) => self.create(draft, ReservationState::Confirmed, caller).await,
            Err(e) => Err(e),
        };
        self.report(&result, "create confirmed booking", Some(tour_id), Some(headcount), caller);
        result
    }

    async fn create(
        &self,
        mut draft: ReservationDraft,
        initial: ReservationState,
        caller: &Caller,
    ) -> CoreResult<Reservation> {
        let offering = self
            .offerings
            .get_offering(draft.tour_id)
            .await?
            .ok_or(CoreError::OfferingNotFound(draft.tour_id))?;

        if !offering.is_sellable() {
            return Err(CoreError::OfferingUnavailable {
                offering_id: offering.id,
                status: offering.status,
            });
        }

        draft.validate()?;
        match caller {
            Caller::Customer(id) => draft.user_id = Some(id.clone()),
            Caller::Anonymous => draft.user_id = None,
            Caller::Admin(_) => {}
        }

        let headcount = draft.headcount();
        let total_price = self
            .pricing
            .quote(draft.adults, draft.children, offering.adult_price, offering.child_price)
            .map_err(|e| match e {
                PricingError::NegativeHeadcount { .. } => CoreError::InvalidHeadcount(e.to_string()),
                PricingError::Overflow => CoreError::ValidationError(e.to_string()),
            })?;

        match self.ledger.try_reserve(offering.id, headcount).await? {
            ReserveOutcome::Reserved { available } => {
                info!("Held {} seats on tour {} ({} left)", headcount, offering.id, available);
            }
            ReserveOutcome::Insufficient { available } => {
                return Err(CoreError::InsufficientCapacity {
                    offering_id: offering.id,
                    requested: headcount,
                    available,
                });
            }
        }

        let reservation = Reservation::new(draft, total_price, initial);

        if let Err(e) = self.reservations.create(&reservation).await {
            error!(
                "Failed to persist booking {} on tour {} (headcount {}, caller {}): {}. Releasing hold",
                reservation.id, offering.id, headcount, caller, e
            );
            self.release_seats(&reservation, caller).await?;
            return Err(CoreError::PersistenceFailure(e.to_string()));
        }

        info!(
            "Booking {} created on tour {} as {} ({} seats, total {})",
            reservation.id, offering.id, initial, headcount, total_price
        );
        self.notify(&reservation, ReservationEventKind::Created).await;
        Ok(reservation)
    }

    // ------------------------------------------------------------------
    // State changes (administrative)
    // ------------------------------------------------------------------

    pub async fn confirm(&self, id: Uuid, caller: &Caller) -> CoreResult<Reservation> {
        self.transition(id, ReservationState::Confirmed, caller).await
    }

    pub async fn cancel(&self, id: Uuid, caller: &Caller) -> CoreResult<Reservation> {
        self.transition(id, ReservationState::Cancelled, caller).await
    }

    pub async fn complete(&self, id: Uuid, caller: &Caller) -> CoreResult<Reservation> {
        self.transition(id, ReservationState::Completed, caller).await
    }

    /// Move a booking to `target`, releasing seats when the move ends a hold.
    pub async fn transition(&self, id: Uuid, target: ReservationState, caller: &Caller) -> CoreResult<Reservation> {
        let mut loaded = None;
        let result = self.apply_transition(id, target, caller, &mut loaded).await;
        let (tour_id, headcount) = loaded.unzip();
        self.report(&result, "change booking state", tour_id, headcount, caller);
        result
    }

    async fn apply_transition(
        &self,
        id: Uuid,
        target: ReservationState,
        caller: &Caller,
        loaded: &mut Option<(Uuid, i32)>,
    ) -> CoreResult<Reservation> {
        require_admin(caller, "change booking state")?;
        let current = self.load(id).await?;
        *loaded = Some((current.tour_id, current.headcount()));

        if !current.state.can_transition_to(target) {
            return Err(CoreError::InvalidTransition {
                from: current.state,
                to: target.to_string(),
            });
        }

        if !self.reservations.update_state(id, current.state, target).await? {
            // Lost a race with another writer; report against what is stored now.
            let latest = self.load(id).await?;
            return Err(CoreError::InvalidTransition {
                from: latest.state,
                to: target.to_string(),
            });
        }

        if current.state.releases_seats_on(target) {
            self.release_seats(&current, caller).await?;
        }

        let from = current.state;
        let mut updated = current;
        updated.state = target;
        updated.updated_at = Utc::now();

        info!("Booking {} moved {} -> {} by {}", id, from, target, caller);
        self.notify(&updated, event_kind(target)).await;
        Ok(updated)
    }

    /// Hard delete. Seats go back to the ledger when the booking still held them.
    pub async fn delete(&self, id: Uuid, caller: &Caller) -> CoreResult<Reservation> {
        let mut loaded = None;
        let result = self.apply_delete(id, caller, &mut loaded).await;
        let (tour_id, headcount) = loaded.unzip();
        self.report(&result, "delete booking", tour_id, headcount, caller);
        result
    }

    async fn apply_delete(
        &self,
        id: Uuid,
        caller: &Caller,
        loaded: &mut Option<(Uuid, i32)>,
    ) -> CoreResult<Reservation> {
        require_admin(caller, "delete bookings")?;
        let current = self.load(id).await?;
        *loaded = Some((current.tour_id, current.headcount()));

        if !current.state.can_delete() {
            return Err(CoreError::InvalidTransition {
                from: current.state,
                to: "deleted".to_string(),
            });
        }

        if !self.reservations.delete(id, current.state).await? {
            let latest = self.load(id).await?;
            return Err(CoreError::InvalidTransition {
                from: latest.state,
                to: "deleted".to_string(),
            });
        }

        if current.state.is_seat_holding() {
            self.release_seats(&current, caller).await?;
        }

        info!("Booking {} ({}) deleted by {}", id, current.state, caller);
        self.notify(&current, ReservationEventKind::Deleted).await;
        Ok(current)
    }

    // ------------------------------------------------------------------
    // Owner operations and reads
    // ------------------------------------------------------------------

    /// Replace the free-text note. Allowed for the linked user and admins;
    /// never touches state or seats.
    pub async fn update_note(&self, id: Uuid, note: Option<String>, caller: &Caller) -> CoreResult<Reservation> {
        let mut current = self.load(id).await?;
        authorize_owner(&current, caller)?;

        if !self.reservations.update_note(id, note.as_deref()).await? {
            return Err(CoreError::ReservationNotFound(id));
        }

        current.note = note;
        current.updated_at = Utc::now();
        Ok(current)
    }

    pub async fn get(&self, id: Uuid, caller: &Caller) -> CoreResult<Reservation> {
        let reservation = self.load(id).await?;
        authorize_owner(&reservation, caller)?;
        Ok(reservation)
    }

    pub async fn list_for_offering(&self, offering_id: Uuid, caller: &Caller) -> CoreResult<Vec<Reservation>> {
        require_admin(caller, "list tour bookings")?;
        Ok(self.reservations.list_by_offering(offering_id).await?)
    }

    pub async fn list_for_caller(&self, caller: &Caller) -> CoreResult<Vec<Reservation>> {
        let user_id = caller
            .user_id()
            .ok_or_else(|| CoreError::NotAuthorized("sign in to list your bookings".into()))?;
        Ok(self.reservations.list_by_user(user_id).await?)
    }

    /// Recompute `capacity - seats consumed by bookings` and compare it with
    /// the ledger's counter.
    pub async fn audit_offering(&self, offering_id: Uuid, caller: &Caller) -> CoreResult<LedgerAudit> {
        require_admin(caller, "audit tours")?;
        let seats = self.ledger.peek(offering_id).await?;
        let consumed: i32 = self
            .reservations
            .list_by_offering(offering_id)
            .await?
            .iter()
            .filter(|r| r.state.consumes_seats())
            .map(Reservation::headcount)
            .fold(0, i32::saturating_add);

        let expected_available = seats.capacity.saturating_sub(consumed);
        let audit = LedgerAudit {
            offering_id,
            capacity: seats.capacity,
            ledger_available: seats.available,
            expected_available,
            drift: seats.available.saturating_sub(expected_available),
        };

        if !audit.is_consistent() {
            error!(
                "Ledger drift on tour {}: ledger says {} available, bookings imply {}",
                offering_id, audit.ledger_available, audit.expected_available
            );
        }
        Ok(audit)
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    async fn load(&self, id: Uuid) -> CoreResult<Reservation> {
        self.reservations
            .find_by_id(id)
            .await?
            .ok_or(CoreError::ReservationNotFound(id))
    }

    /// Hand a booking's seats back, retrying transient ledger faults. Running
    /// out of attempts leaves seats held by nothing, which only an operator
    /// can repair.
    async fn release_seats(&self, reservation: &Reservation, caller: &Caller) -> CoreResult<()> {
        let offering_id = reservation.tour_id;
        let headcount = reservation.headcount();
        let ledger = &self.ledger;

        match self.release_policy.run(|| ledger.release(offering_id, headcount)).await {
            Ok(outcome) => {
                if outcome.clamped > 0 {
                    error!(
                        "FATAL booking {}: release of {} seats on tour {} overflowed capacity by {} (caller {})",
                        reservation.id, headcount, offering_id, outcome.clamped, caller
                    );
                }
                Ok(())
            }
            Err(e) => {
                error!(
                    "FATAL booking {}: could not release {} seats on tour {} after {} attempts (caller {}): {}",
                    reservation.id, headcount, offering_id, self.release_policy.max_attempts, caller, e
                );
                Err(CoreError::FatalInconsistency(format!(
                    "{} seats of booking {} on tour {} are still held: {}",
                    headcount, reservation.id, offering_id, e
                )))
            }
        }
    }

    async fn notify(&self, reservation: &Reservation, kind: ReservationEventKind) {
        let event = ReservationEvent::new(
            reservation.id,
            reservation.tour_id,
            reservation.recipient(),
            kind,
            reservation.headcount(),
        );
        if let Err(e) = self.notifier.emit(&event).await {
            warn!("Notification {:?} for booking {} failed: {}", kind, reservation.id, e);
        }
    }

    fn report<T>(
        &self,
        result: &CoreResult<T>,
        operation: &str,
        offering_id: Option<Uuid>,
        headcount: Option<i32>,
        caller: &Caller,
    ) {
        let Err(e) = result else {
            return;
        };
        let tour = offering_id.map(|id| id.to_string()).unwrap_or_else(|| "-".into());
        let seats = headcount.map(|n| n.to_string()).unwrap_or_else(|| "-".into());

        if e.is_user_facing() {
            warn!("{} rejected (tour {}, headcount {}, caller {}): {}", operation, tour, seats, caller, e);
        } else {
            error!("{} failed (tour {}, headcount {}, caller {}): {}", operation, tour, seats, caller, e);
        }
    }
}

fn require_admin(caller: &Caller, action: &str) -> CoreResult<()> {
    if caller.is_admin() {
        Ok(())
    } else {
        Err(CoreError::NotAuthorized(format!("only administrators may {}", action)))
    }
}

fn authorize_owner(reservation: &Reservation, caller: &Caller) -> CoreResult<()> {
    match caller {
        Caller::Admin(_) => Ok(()),
        Caller::Customer(id) if reservation.is_owned_by(id) => Ok(()),
        _ => Err(CoreError::NotAuthorized(format!(
            "booking {} belongs to another user",
            reservation.id
        ))),
    }
}

fn event_kind(state: ReservationState) -> ReservationEventKind {
    match state {
        ReservationState::Pending => ReservationEventKind::Created,
        ReservationState::Confirmed => ReservationEventKind::Confirmed,
        ReservationState::Cancelled => ReservationEventKind::Cancelled,
        ReservationState::Completed => ReservationEventKind::Completed,
    }
}
