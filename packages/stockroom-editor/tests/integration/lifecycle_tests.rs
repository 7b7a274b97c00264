//! Refresh, create and delete against the backend.

use std::sync::Arc;

use serde_json::{json, Map};

use stockroom_client::{ClientError, LoadingCounter, RequestContext};
use stockroom_core::{ListQuery, Row, SortKey};
use stockroom_editor::{CreateOutcome, DeleteOutcome, EditorConfig, EditorError};

use super::helpers::{editor, spawn_backend};

#[tokio::test(flavor = "multi_thread")]
async fn test_refresh_loads_rows_and_references() -> anyhow::Result<()> {
    let base = spawn_backend(None).await?;
    let editor = editor(&base, "inventory", EditorConfig::default());
    let counter = Arc::new(LoadingCounter::new());
    let ctx = RequestContext::anonymous().with_loading(counter.clone());

    let count = editor.refresh(&ctx, &ListQuery::new()).await?;

    assert_eq!(count, 2);
    assert_eq!(editor.len(), 2);
    assert_eq!(editor.reference("rooms").map(|list| list.len()), Some(2));
    assert_eq!(editor.reference("item-ratings").map(|list| list.len()), Some(2));
    // the inventory page plus one list per related resource
    assert_eq!(counter.completed(), 3);
    assert!(!counter.is_loading());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_refresh_with_query() -> anyhow::Result<()> {
    let base = spawn_backend(None).await?;
    let editor = editor(&base, "inventory", EditorConfig::default());
    let ctx = RequestContext::anonymous();

    let query = ListQuery::new().search("oak").order_by(SortKey::asc("serial"));
    assert_eq!(editor.refresh(&ctx, &query).await?, 1);
    assert_eq!(editor.row(0)?.pk(), 2);

    let epoch = editor.rows().epoch();
    editor.refresh(&ctx, &ListQuery::new().page(1, 1)).await?;
    assert_eq!(editor.len(), 1);
    assert!(editor.rows().epoch() > epoch);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_create_and_delete_rows() -> anyhow::Result<()> {
    let base = spawn_backend(None).await?;
    let editor = editor(&base, "rooms", EditorConfig::default());
    let ctx = RequestContext::anonymous();
    editor.refresh(&ctx, &ListQuery::new()).await?;

    let mut values = Map::new();
    values.insert("name".to_string(), json!("Cellar"));
    let CreateOutcome::Created(created) = editor.create_row(&ctx, values).await? else {
        panic!("expected the room to be created");
    };
    assert_eq!(created.pk(), 8);
    assert_eq!(editor.len(), 3);
    assert_eq!(editor.row(0)?, created);

    let outcome = editor
        .delete_row(&ctx, 0, &|row: &Row| row.pk() == 8)
        .await?;
    assert_eq!(outcome, DeleteOutcome::Deleted { pk: 8 });
    assert_eq!(editor.len(), 2);

    editor.refresh(&ctx, &ListQuery::new()).await?;
    assert_eq!(editor.len(), 2);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_declined_delete_keeps_record() -> anyhow::Result<()> {
    let base = spawn_backend(None).await?;
    let editor = editor(&base, "rooms", EditorConfig::default());
    let ctx = RequestContext::anonymous();
    editor.refresh(&ctx, &ListQuery::new()).await?;

    let outcome = editor.delete_row(&ctx, 0, &|_: &Row| false).await?;
    assert_eq!(outcome, DeleteOutcome::Cancelled);

    editor.refresh(&ctx, &ListQuery::new()).await?;
    assert_eq!(editor.len(), 2);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_token_is_forwarded() -> anyhow::Result<()> {
    let base = spawn_backend(Some("s3cret")).await?;
    let editor = editor(&base, "rooms", EditorConfig::default());

    let err = editor
        .refresh(&RequestContext::anonymous(), &ListQuery::new())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EditorError::Client(ClientError::Unauthorized(_))
    ));
    assert!(editor.is_empty());

    editor
        .refresh(&RequestContext::with_token("s3cret"), &ListQuery::new())
        .await?;
    assert_eq!(editor.len(), 2);
    Ok(())
}
