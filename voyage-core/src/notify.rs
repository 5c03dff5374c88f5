use async_trait::async_trait;
use voyage_shared::ReservationEvent;

/// Best-effort outbound notifications. Failures are reported to the caller
/// but never undo the change that triggered them.
#[async_trait]
pub trait NotificationEmitter: Send + Sync {
    async fn emit(&self, event: &ReservationEvent) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Emitter that only writes to the log. Used when no broker is configured.
pub struct LogNotifier;

#[async_trait]
impl NotificationEmitter for LogNotifier {
    async fn emit(&self, event: &ReservationEvent) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        tracing::info!(
            "Notify {} about booking {} on tour {}: {:?}",
            event.recipient,
            event.reservation_id,
            event.tour_id,
            event.kind
        );
        Ok(())
    }
}
