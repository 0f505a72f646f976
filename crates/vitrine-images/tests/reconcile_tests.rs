//! End-to-end reconciliation behavior against the in-memory stores

use pretty_assertions::assert_eq;
use serde_json::json;
use vitrine_images::{ErrorKind, SaveConfig};
use vitrine_test_utils::{payload, setup_env, setup_env_with_config, setup_failing_env, upload};

#[tokio::test]
async fn create_two_images_with_mixed_visibility() {
    let env = setup_env_with_config(SaveConfig::default().with_max_images(5));

    let records = env
        .reconciler
        .bulk_save(
            &env.pid(),
            Some(vec![upload("front.jpg"), upload("back.jpg")]),
            &payload(vec![
                json!({ "fileIndex": 0, "name": "front", "active": false }),
                json!({ "fileIndex": 1, "name": "back", "active": true }),
            ]),
        )
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    let back = records.iter().find(|r| r.name.as_deref() == Some("back")).unwrap();
    let front = records.iter().find(|r| r.name.as_deref() == Some("front")).unwrap();

    assert!(back.original_path.as_str().starts_with("/public/"));
    assert!(back.thumbnail_path.as_str().starts_with("/public/"));
    assert!(front.original_path.as_str().starts_with("/private/"));
    assert!(front.thumbnail_path.as_str().starts_with("/private/"));

    // Original and thumbnail for each image.
    assert_eq!(env.blobs.object_count(), 4);
    for record in &records {
        assert!(env.blobs.contains(&record.original_path));
        assert!(env.blobs.contains(&record.thumbnail_path));
    }
}

#[tokio::test]
async fn thumbnails_are_generated_not_copied() {
    let env = setup_env();

    let records = env
        .reconciler
        .bulk_save(
            &env.pid(),
            Some(vec![upload("front.jpg")]),
            &payload(vec![json!({ "fileIndex": 0 })]),
        )
        .await
        .unwrap();

    let record = &records[0];
    let original = env.blobs.object(&record.original_path).unwrap();
    let thumbnail = env.blobs.object(&record.thumbnail_path).unwrap();
    assert_eq!(original.len(), 64);
    assert!(thumbnail.len() < original.len());
}

#[tokio::test]
async fn unreferenced_file_gets_synthesized_defaults() {
    let env = setup_env();

    let records = env
        .reconciler
        .bulk_save(
            &env.pid(),
            Some(vec![upload("a.jpg"), upload("b.jpg")]),
            &payload(vec![json!({ "fileIndex": 0, "name": "declared" })]),
        )
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    let synthesized = records.iter().find(|r| r.name.is_none()).unwrap();
    assert!(!synthesized.main);
    assert!(!synthesized.active);
    assert!(!synthesized.is_deleted());
    assert!(synthesized.original_path.as_str().starts_with("/private/"));
}

#[tokio::test]
async fn soft_delete_moves_both_paths_under_deleted() {
    let env = setup_env();
    let record = env.seed_record(env.product_id, Some("shot"), true).await;
    let old_original = record.original_path.clone();
    let old_thumbnail = record.thumbnail_path.clone();
    assert!(old_original.as_str().starts_with("/public/"));

    let records = env
        .reconciler
        .bulk_save(
            &env.pid(),
            None,
            &payload(vec![json!({ "imageId": record.id.to_string(), "delete": true })]),
        )
        .await
        .unwrap();

    let updated = records.iter().find(|r| r.id == record.id).unwrap();
    assert!(updated.is_deleted());
    assert!(updated.original_path.as_str().starts_with("/deleted/"));
    assert!(updated.thumbnail_path.as_str().starts_with("/deleted/"));

    // Moved, not duplicated: the old paths left the live set.
    assert!(!env.blobs.contains(&old_original));
    assert!(!env.blobs.contains(&old_thumbnail));
    assert!(env.blobs.contains(&updated.original_path));
    assert!(env.blobs.contains(&updated.thumbnail_path));
    assert_eq!(env.blobs.object_count(), 2);
}

#[tokio::test]
async fn partial_patch_touches_only_declared_fields() {
    let env = setup_env();
    let seeded = env.seed_record(env.product_id, Some("original-name"), true).await;

    let records = env
        .reconciler
        .bulk_save(
            &env.pid(),
            None,
            &payload(vec![json!({
                "imageId": seeded.id.to_string(),
                "description": "a description",
            })]),
        )
        .await
        .unwrap();

    let updated = records.iter().find(|r| r.id == seeded.id).unwrap();
    assert_eq!(updated.description.as_deref(), Some("a description"));
    assert_eq!(updated.name, seeded.name);
    assert_eq!(updated.active, seeded.active);
    assert_eq!(updated.main, seeded.main);
    assert_eq!(updated.deleted_at, None);
    // No visibility change, no relocation.
    assert_eq!(updated.original_path, seeded.original_path);
}

#[tokio::test]
async fn each_mutable_field_patches_independently() {
    let env = setup_env();

    for field in ["name", "description", "main", "active"] {
        let seeded = env.seed_record(env.product_id, Some("base"), false).await;
        let item = match field {
            "name" => json!({ "imageId": seeded.id.to_string(), "name": "renamed" }),
            "description" => json!({ "imageId": seeded.id.to_string(), "description": "d" }),
            "main" => json!({ "imageId": seeded.id.to_string(), "main": true }),
            _ => json!({ "imageId": seeded.id.to_string(), "active": true }),
        };

        env.reconciler
            .bulk_save(&env.pid(), None, &payload(vec![item]))
            .await
            .unwrap();

        let updated = env.repository.get(&seeded.id).unwrap();
        assert_eq!(updated.name.as_deref() != seeded.name.as_deref(), field == "name");
        assert_eq!(updated.description.is_some(), field == "description");
        assert_eq!(updated.main != seeded.main, field == "main");
        assert_eq!(updated.active != seeded.active, field == "active");
    }
}

#[tokio::test]
async fn mixed_create_and_update_in_one_call() {
    let env = setup_env();
    let seeded = env.seed_record(env.product_id, Some("old"), false).await;

    let records = env
        .reconciler
        .bulk_save(
            &env.pid(),
            Some(vec![upload("new.png")]),
            &payload(vec![
                json!({ "imageId": seeded.id.to_string(), "active": true }),
                json!({ "fileIndex": 0, "name": "new" }),
            ]),
        )
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    let patched = records.iter().find(|r| r.id == seeded.id).unwrap();
    assert!(patched.active);
    assert!(patched.original_path.as_str().starts_with("/public/"));

    let created = records.iter().find(|r| r.id != seeded.id).unwrap();
    assert_eq!(created.name.as_deref(), Some("new"));
    assert_eq!(created.original_path.extension(), Some("png"));
}

#[tokio::test]
async fn listing_is_ordered_by_name_then_active() {
    let env = setup_env();
    env.seed_record(env.product_id, Some("b"), false).await;
    env.seed_record(env.product_id, Some("a"), true).await;
    env.seed_record(env.product_id, None, false).await;

    let records = env
        .reconciler
        .bulk_save(
            &env.pid(),
            Some(vec![upload("z.jpg")]),
            &payload(vec![json!({ "fileIndex": 0, "name": "a" })]),
        )
        .await
        .unwrap();

    let keys: Vec<_> = records
        .iter()
        .map(|r| (r.name.clone(), r.active))
        .collect();
    assert_eq!(
        keys,
        vec![
            (None, false),
            (Some("a".into()), false),
            (Some("a".into()), true),
            (Some("b".into()), false),
        ]
    );
}

#[tokio::test]
async fn mid_apply_storage_failure_leaves_partial_state() {
    // Budget of two writes: the first creation (original + thumbnail)
    // lands, the second creation's original write fails.
    let env = setup_failing_env(2);

    let err = env
        .reconciler
        .bulk_save(
            &env.product_id.to_string(),
            Some(vec![upload("a.jpg"), upload("b.jpg")]),
            &serde_json::json!({ "items": [] }),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Storage);
    assert!(!err.is_retryable());

    // The first item's blobs were written and are not rolled back; the
    // batch record save never ran.
    assert_eq!(env.blobs.object_count(), 2);
    assert_eq!(env.repository.row_count(), 0);
}
