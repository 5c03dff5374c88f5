pub mod manager;
pub mod repository;
pub mod retry;

pub use manager::{LedgerAudit, ReservationManager};
pub use repository::InMemoryReservationRepository;
pub use retry::RetryPolicy;
