pub mod app_config;
pub mod database;
#[cfg(feature = "kafka")]
pub mod events;
pub mod offering_repo;
pub mod reservation_repo;

pub use app_config::{Config, StorageBackend};
pub use database::DbClient;
#[cfg(feature = "kafka")]
pub use events::EventProducer;
pub use offering_repo::PgOfferingStore;
pub use reservation_repo::PgReservationRepository;
