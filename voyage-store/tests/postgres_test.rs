//! Runs against a real database only when `VOYAGE_TEST_DATABASE_URL` is set.

use chrono::NaiveDate;
use std::sync::Arc;
use uuid::Uuid;
use voyage_core::{
    CapacityLedger, Contact, NewOffering, OfferingStore, OfferingUpdate, Reservation, ReservationDraft,
    ReservationRepository, ReservationState, ReserveOutcome,
};
use voyage_shared::Masked;
use voyage_store::{DbClient, PgOfferingStore, PgReservationRepository};

async fn connect() -> Option<DbClient> {
    let url = std::env::var("VOYAGE_TEST_DATABASE_URL").ok()?;
    let db = DbClient::new(&url, 20).await.expect("database reachable");
    db.migrate().await.expect("migrations apply");
    Some(db)
}

fn tour(capacity: i32) -> NewOffering {
    NewOffering {
        name: format!("Sapa Trek {}", Uuid::new_v4()),
        capacity,
        adult_price: 1_200_000,
        child_price: None,
        status: None,
    }
}

fn booking(tour_id: Uuid, user_id: &str) -> Reservation {
    Reservation::new(
        ReservationDraft {
            tour_id,
            contact: Contact {
                name: "Nguyen Van An".into(),
                email: Masked("an@example.com".into()),
                phone: Masked("0901234567".into()),
                address: String::new(),
            },
            adults: 2,
            children: 0,
            departure_date: NaiveDate::from_ymd_opt(2026, 11, 20).unwrap(),
            note: None,
            user_id: Some(user_id.into()),
        },
        2_400_000,
        ReservationState::Pending,
    )
}

#[tokio::test]
async fn test_ledger_reserve_release_and_clamp() {
    let Some(db) = connect().await else { return };
    let store = PgOfferingStore::new(db.pool.clone());
    let created = store.create_offering(&tour(4)).await.unwrap();

    assert_eq!(store.try_reserve(created.id, 3).await.unwrap(), ReserveOutcome::Reserved { available: 1 });
    assert_eq!(
        store.try_reserve(created.id, 2).await.unwrap(),
        ReserveOutcome::Insufficient { available: 1 }
    );

    let outcome = store.release(created.id, 5).await.unwrap();
    assert_eq!(outcome.available, 4);
    assert_eq!(outcome.clamped, 2);

    assert!(store.peek(Uuid::new_v4()).await.is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_reserves_never_overbook() {
    let Some(db) = connect().await else { return };
    let store = Arc::new(PgOfferingStore::new(db.pool.clone()));
    let created = store.create_offering(&tour(5)).await.unwrap();

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let store = Arc::clone(&store);
            let id = created.id;
            tokio::spawn(async move {
                let outcome = store.try_reserve(id, 1).await.unwrap();
                outcome.is_reserved()
            })
        })
        .collect();

    let mut granted = 0;
    for handle in handles {
        if handle.await.unwrap() {
            granted += 1;
        }
    }

    assert_eq!(granted, 5);
    assert_eq!(store.peek(created.id).await.unwrap().available, 0);
}

#[tokio::test]
async fn test_update_never_touches_counters() {
    let Some(db) = connect().await else { return };
    let store = PgOfferingStore::new(db.pool.clone());
    let created = store.create_offering(&tour(6)).await.unwrap();
    store.try_reserve(created.id, 2).await.unwrap();

    let updated = store
        .update_offering(
            created.id,
            &OfferingUpdate {
                child_price: Some(Some(500_000)),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.child_price, Some(500_000));
    assert_eq!(updated.capacity, 6);
    assert_eq!(updated.available, 4);
}

#[tokio::test]
async fn test_booking_compare_and_set() {
    let Some(db) = connect().await else { return };
    let tours = PgOfferingStore::new(db.pool.clone());
    let repo = PgReservationRepository::new(db.pool.clone());
    let created = tours.create_offering(&tour(10)).await.unwrap();

    let user = Uuid::new_v4().to_string();
    let record = booking(created.id, &user);
    repo.create(&record).await.unwrap();

    let loaded = repo.find_by_id(record.id).await.unwrap().unwrap();
    assert_eq!(loaded.contact.email.expose(), "an@example.com");

    assert!(repo.update_state(record.id, ReservationState::Pending, ReservationState::Confirmed).await.unwrap());
    assert!(!repo.update_state(record.id, ReservationState::Pending, ReservationState::Cancelled).await.unwrap());
    assert!(!repo.delete(record.id, ReservationState::Pending).await.unwrap());

    assert!(repo.update_note(record.id, Some("window seat")).await.unwrap());
    assert_eq!(repo.list_by_user(&user).await.unwrap().len(), 1);
    assert_eq!(repo.list_by_offering(created.id).await.unwrap().len(), 1);

    assert!(repo.delete(record.id, ReservationState::Confirmed).await.unwrap());
    assert!(repo.find_by_id(record.id).await.unwrap().is_none());
}
