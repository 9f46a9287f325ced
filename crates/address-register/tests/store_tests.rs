//! Event log and index behaviour of the in-memory store.

use address_register::{
    AccessAddress, AccessAddressFields, AccessAddressId, AddressEntity, AddressStatus,
    AddressStore, EntityIndex, EntityKind, InMemoryAddressStore, PostCode, PostCodeId, Road,
    RoadId, RoadStatus, UnitAddress, UnitAddressFields, UnitAddressId,
};
use chrono::Utc;

async fn seeded_store() -> InMemoryAddressStore {
    let store = InMemoryAddressStore::new();
    let now = Utc::now();

    let post_code = PostCode::create(PostCodeId::new(), "8000", "Aarhus C", None, None).unwrap();
    let post_code_id = post_code.id();
    store.store(post_code.into()).await.unwrap();

    let road = Road::create(
        RoadId::new(),
        "R1",
        "Vestergade",
        RoadStatus::Effective,
        now,
        now,
    )
    .unwrap();
    let road_id = road.id();
    store.store(road.into()).await.unwrap();

    let access_address = AccessAddress::create(
        AccessAddressId::new(),
        "A1",
        AccessAddressFields {
            municipal_code: "0751".to_string(),
            status: AddressStatus::Active,
            road_code: "1234".to_string(),
            house_number: "1".to_string(),
            post_code_id,
            road_id,
            east_coordinate: 575_000.0,
            north_coordinate: 6_224_000.0,
            supplementary_town_name: None,
            plot_id: None,
            pending_official: false,
        },
        now,
        now,
        &store.post_code_ids(),
        &store.road_ids(),
    )
    .unwrap();
    let access_address_id = access_address.id();
    store.store(access_address.into()).await.unwrap();

    let unit_address = UnitAddress::create(
        UnitAddressId::new(),
        "U1",
        UnitAddressFields {
            access_address_id,
            status: AddressStatus::Active,
            floor_name: Some("st".to_string()),
            suite_name: None,
            pending_official: false,
        },
        now,
        now,
        &store.access_address_ids(),
    )
    .unwrap();
    store.store(unit_address.into()).await.unwrap();

    store
}

#[tokio::test]
async fn test_reopened_store_needs_rehydration() {
    let store = seeded_store().await;
    let reopened = InMemoryAddressStore::from_events(store.events()).unwrap();

    assert!(!reopened.contains(EntityKind::Road, "R1"));

    reopened.rehydrate_index().await.unwrap();
    assert_eq!(reopened.index_snapshot(), store.index_snapshot());
    assert_eq!(reopened.road_id("R1"), store.road_id("R1"));
    assert!(reopened.contains(EntityKind::UnitAddress, "U1"));
}

#[tokio::test]
async fn test_reopened_store_loads_latest_state() {
    let store = seeded_store().await;
    let road_id = store.road_id("R1").unwrap();

    let mut road = store.load_road(road_id).await.unwrap().unwrap();
    road.delete(Utc::now()).unwrap();
    store.store(AddressEntity::Road(road)).await.unwrap();

    let reopened = InMemoryAddressStore::from_events(store.events()).unwrap();
    let road = reopened.load_road(road_id).await.unwrap().unwrap();
    assert!(road.is_deleted());
}

#[tokio::test]
async fn test_rehydrate_is_idempotent() {
    let store = seeded_store().await;
    let before = store.index_snapshot();
    store.rehydrate_index().await.unwrap();
    store.rehydrate_index().await.unwrap();
    assert_eq!(store.index_snapshot(), before);
}
