//! The count invariant, exhaustively
//!
//! A save is rejected exactly when `current + creations − deletions`
//! exceeds the configured cap. The plan phase is pure, so the property
//! runs without any store.

use chrono::Utc;
use proptest::prelude::*;
use serde_json::json;
use vitrine_images::prelude::*;
use vitrine_model::{ImageId, ImageRecord, ObjectPath, ProductId, UploadedFile, Visibility};
use vitrine_store::ProductWithImages;
use vitrine_test_utils::{payload, setup_env_with_config, upload};

const MAX: usize = 5;

fn existing_record(product_id: ProductId) -> ImageRecord {
    let id = ImageId::new();
    ImageRecord {
        id,
        product_id,
        name: None,
        description: None,
        original_path: ObjectPath::resolve(Visibility::Public, &product_id, &id, Some("jpg"), false),
        thumbnail_path: ObjectPath::resolve(Visibility::Public, &product_id, &id, Some("jpg"), true),
        active: true,
        main: false,
        deleted_at: None,
    }
}

fn creation(n: usize) -> WorkItem {
    WorkItem::Create(CreateItem {
        file: UploadedFile::new("images", format!("f{n}.jpg"), "image/jpeg", vec![1; 8]),
        name: None,
        description: None,
        main: false,
        active: false,
        delete: false,
    })
}

fn deletion(image_id: ImageId) -> WorkItem {
    WorkItem::Update(UpdateItem {
        image_id,
        name: None,
        description: None,
        main: None,
        active: None,
        delete: Some(true),
    })
}

proptest! {
    #[test]
    fn prop_rejected_iff_projection_exceeds_max(
        existing in 0usize..=8,
        creations in 0usize..=5,
        deletions in 0usize..=8,
    ) {
        prop_assume!(deletions <= existing);

        let product_id = ProductId::new();
        let images: Vec<_> = (0..existing).map(|_| existing_record(product_id)).collect();
        let mut items: Vec<WorkItem> = images
            .iter()
            .take(deletions)
            .map(|r| deletion(r.id))
            .collect();
        items.extend((0..creations).map(creation));

        let product = ProductWithImages { id: product_id, images };
        let config = SaveConfig::default().with_max_images(MAX);
        let result = build_plan(&product, items, &config, Utc::now());

        let projected = existing + creations - deletions;
        if projected > MAX {
            let limit_exceeded = matches!(
                result,
                Err(SaveImagesError::LimitExceeded { projected: p, max: m, .. })
                    if p == projected && m == MAX
            );
            prop_assert!(limit_exceeded);
        } else {
            let plan = result.unwrap();
            prop_assert_eq!(plan.records.len(), existing + creations);
            let live = plan.records.iter().filter(|r| !r.is_deleted()).count();
            prop_assert_eq!(live, projected);
        }
    }
}

#[tokio::test]
async fn full_product_rejects_one_more_with_zero_mutation() {
    let env = setup_env_with_config(SaveConfig::default().with_max_images(5));
    for i in 0..5 {
        env.seed_record(env.product_id, Some(&format!("img-{i}")), true)
            .await;
    }
    let blobs_before = env.blobs.object_count();

    let err = env
        .reconciler
        .bulk_save(
            &env.pid(),
            Some(vec![upload("one-too-many.jpg")]),
            &payload(vec![json!({ "fileIndex": 0 })]),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SaveImagesError::LimitExceeded {
            current: 5,
            projected: 6,
            max: 5
        }
    ));
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(env.blobs.object_count(), blobs_before);
    assert_eq!(env.repository.row_count(), 5);
}

#[tokio::test]
async fn paired_delete_makes_room_for_a_create() {
    let env = setup_env_with_config(SaveConfig::default().with_max_images(2));
    let a = env.seed_record(env.product_id, Some("a"), true).await;
    env.seed_record(env.product_id, Some("b"), true).await;

    let records = env
        .reconciler
        .bulk_save(
            &env.pid(),
            Some(vec![upload("c.jpg")]),
            &payload(vec![
                json!({ "imageId": a.id.to_string(), "delete": true }),
                json!({ "fileIndex": 0, "name": "c" }),
            ]),
        )
        .await
        .unwrap();

    assert_eq!(records.len(), 3);
    let live = records.iter().filter(|r| !r.is_deleted()).count();
    assert_eq!(live, 2);
}

#[tokio::test]
async fn soft_deleted_records_do_not_count_against_the_cap() {
    let env = setup_env_with_config(SaveConfig::default().with_max_images(2));
    let a = env.seed_record(env.product_id, Some("a"), true).await;
    env.seed_record(env.product_id, Some("b"), true).await;

    env.reconciler
        .bulk_save(
            &env.pid(),
            None,
            &payload(vec![json!({ "imageId": a.id.to_string(), "delete": true })]),
        )
        .await
        .unwrap();

    // One live image plus the tombstone; a new create still fits.
    let records = env
        .reconciler
        .bulk_save(
            &env.pid(),
            Some(vec![upload("c.jpg")]),
            &payload(vec![json!({ "fileIndex": 0 })]),
        )
        .await
        .unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records.iter().filter(|r| !r.is_deleted()).count(), 2);
}
