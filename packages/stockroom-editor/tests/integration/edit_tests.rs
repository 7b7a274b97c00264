//! Optimistic edits confirmed or rolled back by the backend.

use serde_json::json;

use stockroom_client::{Collaborator, RequestContext};
use stockroom_core::{FieldPath, ListQuery};
use stockroom_editor::{EditOutcome, EditorConfig, EditorError, RollbackReason};

use super::helpers::{editor, rest_client, spawn_backend};

#[tokio::test(flavor = "multi_thread")]
async fn test_confirmed_edit_reaches_backend() -> anyhow::Result<()> {
    let base = spawn_backend(None).await?;
    let editor = editor(&base, "inventory", EditorConfig::default());
    let ctx = RequestContext::anonymous();
    editor.refresh(&ctx, &ListQuery::new()).await?;

    // default ordering is newest first
    assert_eq!(editor.row(0)?.pk(), 1);
    let field = editor.field("total_cost")?;
    let outcome = editor.edit_cell(&ctx, 0, &field, json!(25)).await?;
    assert_eq!(outcome, EditOutcome::Committed { pk: 1 });

    let stored = rest_client(&base)
        .list(&ctx, "inventory", &ListQuery::new().filter("serial", "A-1"))
        .await?;
    let path = FieldPath::parse("total_cost")?;
    assert_eq!(stored.results[0].get(&path), Some(&json!(25)));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_relation_edit_round_trip() -> anyhow::Result<()> {
    let base = spawn_backend(None).await?;
    let editor = editor(&base, "inventory", EditorConfig::default());
    let ctx = RequestContext::anonymous();
    editor.refresh(&ctx, &ListQuery::new()).await?;

    let field = editor.field("room")?;
    let outcome = editor.edit_cell(&ctx, 0, &field, json!("Shelf B")).await?;
    assert!(outcome.is_committed());

    let room = FieldPath::parse("room")?;
    assert_eq!(
        editor.row(0)?.get(&room),
        Some(&json!({"pk": 7, "name": "Shelf B"}))
    );
    let stored = rest_client(&base).list(&ctx, "inventory", &ListQuery::new().filter("room", "7")).await?;
    assert_eq!(stored.count, 2);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_ignored_field_rolls_back() -> anyhow::Result<()> {
    let base = spawn_backend(None).await?;
    let editor = editor(&base, "inventory", EditorConfig::default());
    let ctx = RequestContext::anonymous();
    editor.refresh(&ctx, &ListQuery::new()).await?;

    // The backend ignores writes to read-only columns and echoes the stored value
    let field = editor.field("product.sku")?;
    assert!(field.ensure_editable().is_err());
    let outcome = editor.edit_cell(&ctx, 0, &field, json!("XX-9")).await?;

    assert_eq!(
        outcome,
        EditOutcome::RolledBack {
            pk: 1,
            reason: RollbackReason::Mismatch {
                sent: json!("XX-9"),
                echoed: Some(json!("CH-1")),
            },
        }
    );
    let sku = FieldPath::parse("product.sku")?;
    assert_eq!(editor.row(0)?.get(&sku), Some(&json!("CH-1")));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_edit_of_deleted_record_rolls_back() -> anyhow::Result<()> {
    let base = spawn_backend(None).await?;
    let editor = editor(&base, "inventory", EditorConfig::default());
    let ctx = RequestContext::anonymous();
    editor.refresh(&ctx, &ListQuery::new()).await?;
    let before = editor.row(1)?;

    assert_eq!(rest_client(&base).delete(&ctx, "inventory", 2).await?, 204);
    let field = editor.field("sold")?;
    let outcome = editor.edit_cell(&ctx, 1, &field, json!(true)).await?;

    assert!(matches!(
        outcome,
        EditOutcome::RolledBack {
            pk: 2,
            reason: RollbackReason::Failed(ref e),
        } if e.status() == Some(404)
    ));
    assert_eq!(editor.row(1)?, before);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unknown_room_is_not_sent() -> anyhow::Result<()> {
    let base = spawn_backend(None).await?;
    let editor = editor(&base, "inventory", EditorConfig::default());
    let ctx = RequestContext::anonymous();
    editor.refresh(&ctx, &ListQuery::new()).await?;
    let before = editor.rows();

    let field = editor.field("room")?;
    let err = editor
        .edit_cell(&ctx, 0, &field, json!("Attic"))
        .await
        .unwrap_err();
    assert!(matches!(err, EditorError::Grid(_)));
    assert_eq!(editor.rows(), before);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_room_is_created() -> anyhow::Result<()> {
    let base = spawn_backend(None).await?;
    let config = EditorConfig {
        create_missing_references: true,
        ..Default::default()
    };
    let editor = editor(&base, "inventory", config);
    let ctx = RequestContext::anonymous();
    editor.refresh(&ctx, &ListQuery::new()).await?;

    let field = editor.field("room")?;
    let outcome = editor.edit_cell(&ctx, 0, &field, json!("Attic")).await?;
    assert!(outcome.is_committed());

    let rooms = rest_client(&base)
        .list(&ctx, "rooms", &ListQuery::new().search("attic"))
        .await?;
    assert_eq!(rooms.count, 1);
    let room = FieldPath::parse("room.name")?;
    assert_eq!(editor.row(0)?.get(&room), Some(&json!("Attic")));
    Ok(())
}
