//! Change import against an in-memory register.

mod common;

use address_import::{ChangeImportEngine, CheckpointRange, ExternalStatus, ImportError};
use address_register::{AddressStore, EntityIndex, EntityKind, InMemoryAddressStore};
use common::{
    access_address, init_test_logging, post_code, road, tx, unit_address, FailingStore, MockFeed,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn engine(feed: &Arc<MockFeed>, store: &Arc<InMemoryAddressStore>) -> ChangeImportEngine {
    ChangeImportEngine::new(feed.clone(), store.clone())
}

#[tokio::test]
async fn test_redelivered_post_code_is_noop() {
    init_test_logging();
    let feed = Arc::new(
        MockFeed::new(tx(2))
            .with_record(tx(1), post_code("8000", "Aarhus C", ExternalStatus::Active)),
    );
    let store = Arc::new(InMemoryAddressStore::new());
    let engine = engine(&feed, &store);
    let cancel = CancellationToken::new();

    let first = engine
        .run(CheckpointRange::between(tx(0), tx(1)), &cancel)
        .await
        .unwrap();
    assert_eq!(first.counts(EntityKind::PostCode).inserted, 1);

    feed.publish(tx(2), post_code("8000", "Aarhus C", ExternalStatus::Active));
    let second = engine
        .run(CheckpointRange::between(tx(1), tx(2)), &cancel)
        .await
        .unwrap();
    assert_eq!(second.counts(EntityKind::PostCode).no_op, 1);
    assert_eq!(store.event_count(), 1);
}

#[tokio::test]
async fn test_access_address_waits_for_missing_road() {
    let feed = Arc::new(
        MockFeed::new(tx(2))
            .with_record(tx(1), post_code("8000", "Aarhus C", ExternalStatus::Active))
            .with_record(
                tx(1),
                access_address("A1", "R404", "8000", ExternalStatus::Active, 2),
            ),
    );
    let store = Arc::new(InMemoryAddressStore::new());
    let engine = engine(&feed, &store);
    let cancel = CancellationToken::new();

    let first = engine
        .run(CheckpointRange::between(tx(0), tx(1)), &cancel)
        .await
        .unwrap();
    assert_eq!(first.counts(EntityKind::AccessAddress).skipped, 1);
    assert!(!store.contains(EntityKind::AccessAddress, "A1"));

    feed.publish(tx(2), road("R404", "Havnevej", ExternalStatus::Effective, 1));
    feed.publish(
        tx(2),
        access_address("A1", "R404", "8000", ExternalStatus::Active, 2),
    );
    let second = engine
        .run(CheckpointRange::between(tx(1), tx(2)), &cancel)
        .await
        .unwrap();

    assert_eq!(second.counts(EntityKind::Road).inserted, 1);
    assert_eq!(second.counts(EntityKind::AccessAddress).inserted, 1);
    let access_address = store
        .load_access_address(store.access_address_id("A1").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        access_address.fields().road_id,
        store.road_id("R404").unwrap()
    );
}

#[tokio::test]
async fn test_discontinued_road_is_deleted_once() {
    let feed = Arc::new(
        MockFeed::new(tx(3))
            .with_record(tx(1), road("R1", "Vestergade", ExternalStatus::Effective, 1))
            .with_record(
                tx(2),
                road("R1", "Vestergade", ExternalStatus::Discontinued, 5),
            )
            .with_record(
                tx(3),
                road("R1", "Vestergade", ExternalStatus::Discontinued, 6),
            ),
    );
    let store = Arc::new(InMemoryAddressStore::new());
    let engine = engine(&feed, &store);
    let cancel = CancellationToken::new();

    engine
        .run(CheckpointRange::between(tx(0), tx(1)), &cancel)
        .await
        .unwrap();
    let deleted = engine
        .run(CheckpointRange::between(tx(1), tx(2)), &cancel)
        .await
        .unwrap();
    assert_eq!(deleted.counts(EntityKind::Road).deleted, 1);

    let again = engine
        .run(CheckpointRange::between(tx(2), tx(3)), &cancel)
        .await
        .unwrap();
    assert_eq!(again.counts(EntityKind::Road).no_op, 1);

    let road = store
        .load_road(store.road_id("R1").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert!(road.is_deleted());
}

#[tokio::test]
async fn test_tombstone_for_unknown_entity_is_skipped() {
    let feed = Arc::new(MockFeed::new(tx(1)).with_record(
        tx(1),
        road("R9", "Vej", ExternalStatus::Canceled, 1),
    ));
    let store = Arc::new(InMemoryAddressStore::new());

    let statistics = engine(&feed, &store)
        .run(
            CheckpointRange::between(tx(0), tx(1)),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(statistics.counts(EntityKind::Road).skipped, 1);
    assert_eq!(store.event_count(), 0);
}

#[tokio::test]
async fn test_unit_address_under_deleted_parent_is_rejected() {
    let feed = Arc::new(
        MockFeed::new(tx(3))
            .with_record(tx(1), post_code("8000", "Aarhus C", ExternalStatus::Active))
            .with_record(tx(1), road("R1", "Vestergade", ExternalStatus::Effective, 1))
            .with_record(
                tx(1),
                access_address("A1", "R1", "8000", ExternalStatus::Active, 2),
            )
            .with_record(
                tx(2),
                access_address("A1", "R1", "8000", ExternalStatus::Discontinued, 10),
            )
            .with_record(tx(3), unit_address("U1", "A1", ExternalStatus::Active, 20)),
    );
    let store = Arc::new(InMemoryAddressStore::new());

    let statistics = engine(&feed, &store)
        .run(
            CheckpointRange::between(tx(0), tx(3)),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let access_addresses = statistics.counts(EntityKind::AccessAddress);
    assert_eq!(access_addresses.inserted, 1);
    assert_eq!(access_addresses.deleted, 1);
    assert_eq!(statistics.counts(EntityKind::UnitAddress).rejected, 1);
    assert!(!store.contains(EntityKind::UnitAddress, "U1"));
}

#[tokio::test]
async fn test_post_code_applies_before_later_timestamps() {
    let mut late_post_code = post_code("8000", "Aarhus C", ExternalStatus::Active);
    late_post_code.updated = Some(common::at(1_000));
    let feed = Arc::new(
        MockFeed::new(tx(1))
            .with_record(tx(1), road("R1", "Vestergade", ExternalStatus::Effective, 1))
            .with_record(
                tx(1),
                access_address("A1", "R1", "8000", ExternalStatus::Active, 5),
            )
            .with_record(tx(1), late_post_code),
    );
    let store = Arc::new(InMemoryAddressStore::new());

    let statistics = engine(&feed, &store)
        .run(
            CheckpointRange::between(tx(0), tx(1)),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(statistics.counts(EntityKind::AccessAddress).inserted, 1);
    assert!(store.contains(EntityKind::AccessAddress, "A1"));
}

#[tokio::test]
async fn test_status_invalid_for_kind_aborts_run() {
    let feed = Arc::new(MockFeed::new(tx(1)).with_record(
        tx(1),
        road("R1", "Vestergade", ExternalStatus::Active, 1),
    ));
    let store = Arc::new(InMemoryAddressStore::new());

    let result = engine(&feed, &store)
        .run(
            CheckpointRange::between(tx(0), tx(1)),
            &CancellationToken::new(),
        )
        .await;

    assert!(matches!(
        result,
        Err(ImportError::AmbiguousTransition {
            kind: EntityKind::Road,
            ..
        })
    ));
}

#[tokio::test]
async fn test_change_import_stops_when_cancelled() {
    let feed = Arc::new(
        MockFeed::new(tx(1))
            .with_record(tx(1), post_code("8000", "Aarhus C", ExternalStatus::Active)),
    );
    let store = Arc::new(InMemoryAddressStore::new());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = engine(&feed, &store)
        .run(CheckpointRange::between(tx(0), tx(1)), &cancel)
        .await;

    assert!(matches!(result, Err(ImportError::Cancelled)));
    assert_eq!(store.event_count(), 0);
}

#[tokio::test]
async fn test_delete_of_unloadable_target_is_fatal() {
    let feed = Arc::new(
        MockFeed::new(tx(2))
            .with_record(tx(1), road("R1", "Vestergade", ExternalStatus::Effective, 1))
            .with_record(
                tx(2),
                road("R1", "Vestergade", ExternalStatus::Discontinued, 5),
            ),
    );
    let inner = Arc::new(InMemoryAddressStore::new());
    let store = Arc::new(FailingStore::new(inner.clone()));
    let engine = ChangeImportEngine::new(feed.clone(), store.clone());
    let cancel = CancellationToken::new();

    engine
        .run(CheckpointRange::between(tx(0), tx(1)), &cancel)
        .await
        .unwrap();
    store.lose_loads();
    let result = engine
        .run(CheckpointRange::between(tx(1), tx(2)), &cancel)
        .await;

    assert!(matches!(
        result,
        Err(ImportError::UnresolvedTarget {
            kind: EntityKind::Road,
            ..
        })
    ));
}

#[tokio::test]
async fn test_store_outage_aborts_run() {
    let feed = Arc::new(
        MockFeed::new(tx(1))
            .with_record(tx(1), post_code("8000", "Aarhus C", ExternalStatus::Active)),
    );
    let store = Arc::new(FailingStore::new(Arc::new(InMemoryAddressStore::new())));
    store.refuse_writes();

    let result = ChangeImportEngine::new(feed, store)
        .run(
            CheckpointRange::between(tx(0), tx(1)),
            &CancellationToken::new(),
        )
        .await;

    match result {
        Err(err @ ImportError::Store(_)) => assert!(err.is_retryable()),
        other => panic!("expected store error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_update_with_unknown_reference_is_skipped() {
    let mut moved = access_address("A1", "R404", "8000", ExternalStatus::Active, 5);
    moved.house_number = "14".to_string();
    let feed = Arc::new(
        MockFeed::new(tx(2))
            .with_record(tx(1), post_code("8000", "Aarhus C", ExternalStatus::Active))
            .with_record(tx(1), road("R1", "Vestergade", ExternalStatus::Effective, 1))
            .with_record(
                tx(1),
                access_address("A1", "R1", "8000", ExternalStatus::Active, 2),
            )
            .with_record(tx(2), moved)
            .with_record(tx(2), road("R2", "Havnevej", ExternalStatus::Effective, 10)),
    );
    let store = Arc::new(InMemoryAddressStore::new());
    let engine = engine(&feed, &store);
    let cancel = CancellationToken::new();

    engine
        .run(CheckpointRange::between(tx(0), tx(1)), &cancel)
        .await
        .unwrap();
    let events = store.event_count();

    let statistics = engine
        .run(CheckpointRange::between(tx(1), tx(2)), &cancel)
        .await
        .unwrap();

    assert_eq!(statistics.counts(EntityKind::AccessAddress).skipped, 1);
    assert_eq!(statistics.counts(EntityKind::AccessAddress).updated, 0);
    assert_eq!(statistics.counts(EntityKind::Road).inserted, 1);
    assert_eq!(store.event_count(), events + 1);

    let access_address = store
        .load_access_address(store.access_address_id("A1").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(access_address.fields().road_id, store.road_id("R1").unwrap());
    assert_eq!(access_address.fields().house_number, "12");
}
