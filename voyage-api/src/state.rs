use std::sync::Arc;
use voyage_booking::{InMemoryReservationRepository, ReservationManager, RetryPolicy};
use voyage_catalog::{InventoryManager, PricingConfig, PricingEngine};
use voyage_core::{CapacityLedger, LogNotifier, NotificationEmitter, OfferingStore, ReservationRepository};
use voyage_store::app_config::BusinessRules;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
}

#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<ReservationManager>,
    pub offerings: Arc<dyn OfferingStore>,
    pub ledger: Arc<dyn CapacityLedger>,
    pub auth: AuthConfig,
}

impl AppState {
    pub fn new(
        offerings: Arc<dyn OfferingStore>,
        ledger: Arc<dyn CapacityLedger>,
        reservations: Arc<dyn ReservationRepository>,
        notifier: Arc<dyn NotificationEmitter>,
        auth: AuthConfig,
        rules: &BusinessRules,
    ) -> Self {
        let pricing = PricingEngine::new(PricingConfig {
            child_rate_percent: rules.child_rate_percent,
        });
        let release_policy = RetryPolicy::new(rules.release_retry_attempts, rules.release_retry_delay());

        let manager = ReservationManager::new(offerings.clone(), ledger.clone(), reservations, notifier)
            .with_pricing(pricing)
            .with_release_policy(release_policy);

        Self {
            manager: Arc::new(manager),
            offerings,
            ledger,
            auth,
        }
    }

    /// Everything in process memory, notifications to the log.
    pub fn in_memory(auth: AuthConfig, rules: &BusinessRules) -> Self {
        let inventory = Arc::new(InventoryManager::new());
        Self::new(
            inventory.clone(),
            inventory,
            Arc::new(InMemoryReservationRepository::new()),
            Arc::new(LogNotifier),
            auth,
            rules,
        )
    }
}
