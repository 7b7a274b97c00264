use super::*;
use std::collections::VecDeque;

use async_trait::async_trait;
use serde_json::json;
use stockroom_client::Result as ClientResult;
use stockroom_core::schema::register_builtin_schemas;
use stockroom_core::{Page, SchemaRegistry, SortKey};

enum Reply {
    Echo,
    Value(Value),
    Fail(ClientError),
    Hang,
}

/// Collaborator answering from a script and recording every request.
#[derive(Default)]
struct Scripted {
    lists: Mutex<HashMap<String, Vec<Row>>>,
    patch_replies: Mutex<VecDeque<Reply>>,
    create_reply: Mutex<Option<Value>>,
    delete_status: Mutex<Option<u16>>,
    queries: Mutex<Vec<(String, ListQuery)>>,
    patches: Mutex<Vec<(String, Pk, Map<String, Value>)>>,
    creates: Mutex<Vec<(String, Map<String, Value>)>>,
    deletes: Mutex<Vec<(String, Pk)>>,
}

impl Scripted {
    fn with_list(self, resource: &str, rows: Vec<Value>) -> Self {
        let rows = rows.into_iter().map(row).collect();
        self.lists.lock().insert(resource.to_string(), rows);
        self
    }

    fn reply(&self, reply: Reply) {
        self.patch_replies.lock().push_back(reply);
    }

    fn patch_count(&self) -> usize {
        self.patches.lock().len()
    }
}

#[async_trait]
impl Collaborator for Scripted {
    async fn list(&self, _ctx: &RequestContext, resource: &str, query: &ListQuery) -> ClientResult<Page> {
        self.queries.lock().push((resource.to_string(), query.clone()));
        let results = self.lists.lock().get(resource).cloned().unwrap_or_default();
        Ok(Page {
            count: results.len() as u64,
            results,
        })
    }

    async fn create(&self, _ctx: &RequestContext, resource: &str, body: &Map<String, Value>) -> ClientResult<Value> {
        let created = {
            let mut creates = self.creates.lock();
            creates.push((resource.to_string(), body.clone()));
            creates.len() as u64
        };
        let scripted = self.create_reply.lock().take();
        Ok(scripted.unwrap_or_else(|| {
            let mut echo = body.clone();
            echo.insert("pk".to_string(), json!(99 + created));
            Value::Object(echo)
        }))
    }

    async fn patch(&self, _ctx: &RequestContext, resource: &str, pk: Pk, body: &Map<String, Value>) -> ClientResult<Value> {
        self.patches.lock().push((resource.to_string(), pk, body.clone()));
        let reply = self.patch_replies.lock().pop_front().unwrap_or(Reply::Echo);
        match reply {
            Reply::Echo => {
                let mut echo = body.clone();
                echo.insert("pk".to_string(), json!(pk));
                Ok(Value::Object(echo))
            }
            Reply::Value(value) => Ok(value),
            Reply::Fail(e) => Err(e),
            Reply::Hang => std::future::pending().await,
        }
    }

    async fn delete(&self, _ctx: &RequestContext, resource: &str, pk: Pk) -> ClientResult<u16> {
        self.deletes.lock().push((resource.to_string(), pk));
        Ok(self.delete_status.lock().unwrap_or(204))
    }
}

fn row(value: Value) -> Row {
    Row::from_value(value).unwrap()
}

fn schema(resource: &str) -> Arc<ResourceSchema> {
    let registry = SchemaRegistry::new();
    register_builtin_schemas(&registry).unwrap();
    registry.get(resource).unwrap()
}

fn test_config() -> EditorConfig {
    EditorConfig {
        response_timeout: Some(Duration::from_millis(500)),
        ..Default::default()
    }
}

fn inventory_rows() -> Vec<Value> {
    vec![
        json!({"pk": 1, "serial": "A-1", "total_cost": 10, "room": {"pk": 3, "name": "Shelf A"}}),
        json!({"pk": 2, "serial": "A-2", "total_cost": 20, "room": null}),
    ]
}

fn rooms() -> Vec<Value> {
    vec![
        json!({"pk": 3, "name": "Shelf A"}),
        json!({"pk": 7, "name": "Shelf B"}),
    ]
}

/// Editor over the inventory view, refreshed from the scripted lists.
async fn inventory_editor(scripted: Scripted, config: EditorConfig) -> (CellEditor, Arc<Scripted>) {
    let scripted = Arc::new(
        scripted
            .with_list("inventory", inventory_rows())
            .with_list("rooms", rooms()),
    );
    let editor = CellEditor::new(schema("inventory"), scripted.clone(), config).unwrap();
    editor
        .refresh(&RequestContext::anonymous(), &ListQuery::new())
        .await
        .unwrap();
    (editor, scripted)
}

fn cost(editor: &CellEditor, index: usize) -> Option<Value> {
    let path = FieldPath::parse("total_cost").unwrap();
    editor.row(index).unwrap().get(&path).cloned()
}

#[tokio::test]
async fn test_confirmed_edit_is_kept() {
    let (editor, scripted) = inventory_editor(Scripted::default(), test_config()).await;
    let field = editor.field("total_cost").unwrap();

    let outcome = editor
        .edit_cell(&RequestContext::anonymous(), 0, &field, json!(25))
        .await
        .unwrap();

    assert_eq!(outcome, EditOutcome::Committed { pk: 1 });
    assert_eq!(cost(&editor, 0), Some(json!(25)));
    let patches = scripted.patches.lock();
    assert_eq!(patches.len(), 1);
    assert_eq!(patches[0].0, "inventory");
    assert_eq!(patches[0].1, 1);
    assert_eq!(Value::Object(patches[0].2.clone()), json!({"total_cost": 25}));
}

#[tokio::test]
async fn test_failed_edit_restores_value() {
    let (editor, scripted) = inventory_editor(Scripted::default(), test_config()).await;
    scripted.reply(Reply::Fail(ClientError::Status {
        status: 400,
        body: "{}".to_string(),
    }));
    let field = editor.field("total_cost").unwrap();

    let outcome = editor
        .edit_cell(&RequestContext::anonymous(), 0, &field, json!(25))
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        EditOutcome::RolledBack {
            pk: 1,
            reason: RollbackReason::Failed(ClientError::Status { status: 400, .. })
        }
    ));
    assert_eq!(cost(&editor, 0), Some(json!(10)));
    assert_eq!(editor.pending_edits(), 0);
}

#[tokio::test]
async fn test_mismatched_echo_restores_value() {
    let (editor, scripted) = inventory_editor(Scripted::default(), test_config()).await;
    scripted.reply(Reply::Value(json!({"pk": 1, "total_cost": "10.00"})));
    let field = editor.field("total_cost").unwrap();

    let outcome = editor
        .edit_cell(&RequestContext::anonymous(), 0, &field, json!(25))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        EditOutcome::RolledBack {
            pk: 1,
            reason: RollbackReason::Mismatch {
                sent: json!(25),
                echoed: Some(json!("10.00")),
            },
        }
    );
    assert_eq!(cost(&editor, 0), Some(json!(10)));
}

#[tokio::test]
async fn test_numeric_string_echo_confirms() {
    let (editor, scripted) = inventory_editor(Scripted::default(), test_config()).await;
    scripted.reply(Reply::Value(json!({"pk": 1, "total_cost": "25.00"})));
    let field = editor.field("total_cost").unwrap();

    let outcome = editor
        .edit_cell(&RequestContext::anonymous(), 0, &field, json!(25))
        .await
        .unwrap();

    assert!(outcome.is_committed());
    assert_eq!(cost(&editor, 0), Some(json!(25)));
}

#[tokio::test]
async fn test_non_object_response_is_malformed() {
    let (editor, scripted) = inventory_editor(Scripted::default(), test_config()).await;
    scripted.reply(Reply::Value(json!("ok")));
    let field = editor.field("total_cost").unwrap();

    let outcome = editor
        .edit_cell(&RequestContext::anonymous(), 0, &field, json!(25))
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        EditOutcome::RolledBack {
            reason: RollbackReason::Malformed(_),
            ..
        }
    ));
    assert_eq!(cost(&editor, 0), Some(json!(10)));
}

#[tokio::test]
async fn test_relation_edit_sends_identifier_and_displays_record() {
    let (editor, scripted) = inventory_editor(Scripted::default(), test_config()).await;
    let field = editor.field("room").unwrap();

    let outcome = editor
        .edit_cell(&RequestContext::anonymous(), 0, &field, json!("Shelf B"))
        .await
        .unwrap();

    assert_eq!(outcome, EditOutcome::Committed { pk: 1 });
    assert_eq!(
        Value::Object(scripted.patches.lock()[0].2.clone()),
        json!({"room": 7})
    );
    let room = FieldPath::parse("room").unwrap();
    assert_eq!(
        editor.row(0).unwrap().get(&room),
        Some(&json!({"pk": 7, "name": "Shelf B"}))
    );
}

#[tokio::test]
async fn test_relation_rollback_restores_record() {
    let (editor, scripted) = inventory_editor(Scripted::default(), test_config()).await;
    scripted.reply(Reply::Value(json!({"pk": 1, "room": {"pk": 3, "name": "Shelf A"}})));
    let field = editor.field("room").unwrap();

    let outcome = editor
        .edit_cell(&RequestContext::anonymous(), 0, &field, json!("Shelf B"))
        .await
        .unwrap();

    assert!(!outcome.is_committed());
    let room = FieldPath::parse("room").unwrap();
    assert_eq!(
        editor.row(0).unwrap().get(&room),
        Some(&json!({"pk": 3, "name": "Shelf A"}))
    );
}

#[tokio::test]
async fn test_unknown_reference_is_refused_before_sending() {
    let (editor, scripted) = inventory_editor(Scripted::default(), test_config()).await;
    let field = editor.field("room").unwrap();
    let before = editor.rows();

    let err = editor
        .edit_cell(&RequestContext::anonymous(), 0, &field, json!("Attic"))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        EditorError::Grid(GridError::UnknownReference {
            resource: "rooms".to_string(),
            name: "Attic".to_string(),
        })
    );
    assert_eq!(scripted.patch_count(), 0);
    assert_eq!(editor.rows(), before);
}

#[tokio::test]
async fn test_missing_reference_is_created_when_enabled() {
    let config = EditorConfig {
        create_missing_references: true,
        ..test_config()
    };
    let (editor, scripted) = inventory_editor(Scripted::default(), config).await;
    let field = editor.field("room").unwrap();

    let outcome = editor
        .edit_cell(&RequestContext::anonymous(), 1, &field, json!("Attic"))
        .await
        .unwrap();

    assert_eq!(outcome, EditOutcome::Committed { pk: 2 });
    {
        let creates = scripted.creates.lock();
        assert_eq!(creates.len(), 1);
        assert_eq!(creates[0].0, "rooms");
        assert_eq!(Value::Object(creates[0].1.clone()), json!({"name": "Attic"}));
    }
    assert_eq!(
        Value::Object(scripted.patches.lock()[0].2.clone()),
        json!({"room": 100})
    );
    assert!(editor.reference("rooms").unwrap().find("Attic").is_some());
}

#[tokio::test]
async fn test_invalid_edits_leave_rows_untouched() {
    let (editor, scripted) = inventory_editor(Scripted::default(), test_config()).await;
    let field = editor.field("total_cost").unwrap();
    let before = editor.rows();

    let err = editor
        .edit_cell(&RequestContext::anonymous(), 0, &field, json!("lots"))
        .await
        .unwrap_err();
    assert!(matches!(err, EditorError::Grid(GridError::TypeMismatch { .. })));

    let err = editor
        .edit_cell(&RequestContext::anonymous(), 5, &field, json!(1))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EditorError::Grid(GridError::RowOutOfRange { index: 5, len: 2 })
    );

    let foreign = schema("purchases").field("note").unwrap();
    assert!(editor.begin_edit(0, &foreign, json!("x")).is_err());

    assert_eq!(scripted.patch_count(), 0);
    assert_eq!(editor.rows(), before);
}

#[tokio::test]
async fn test_response_timeout_rolls_back() {
    let config = EditorConfig {
        response_timeout: Some(Duration::from_millis(50)),
        ..Default::default()
    };
    let (editor, scripted) = inventory_editor(Scripted::default(), config).await;
    scripted.reply(Reply::Hang);
    let field = editor.field("total_cost").unwrap();

    let outcome = editor
        .edit_cell(&RequestContext::anonymous(), 0, &field, json!(25))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        EditOutcome::RolledBack {
            pk: 1,
            reason: RollbackReason::TimedOut,
        }
    );
    assert_eq!(cost(&editor, 0), Some(json!(10)));
    assert_eq!(editor.pending_edits(), 0);
}

#[tokio::test]
async fn test_stale_failure_does_not_undo_newer_edit() {
    let (editor, _) = inventory_editor(Scripted::default(), test_config()).await;
    let field = editor.field("total_cost").unwrap();

    let first = editor.begin_edit(0, &field, json!(25)).unwrap();
    let second = editor.begin_edit(0, &field, json!(30)).unwrap();
    assert_eq!(editor.pending_edits(), 2);

    let outcome = editor.reconcile(first, Err(ClientError::Timeout));
    assert!(!outcome.is_committed());
    assert_eq!(cost(&editor, 0), Some(json!(30)));

    let outcome = editor.reconcile(second, Ok(json!({"pk": 1, "total_cost": 30})));
    assert!(outcome.is_committed());
    assert_eq!(cost(&editor, 0), Some(json!(30)));
    assert_eq!(editor.pending_edits(), 0);
}

#[tokio::test]
async fn test_failure_after_confirmed_edit_restores_confirmed_value() {
    let (editor, _) = inventory_editor(Scripted::default(), test_config()).await;
    let field = editor.field("total_cost").unwrap();

    let first = editor.begin_edit(0, &field, json!(25)).unwrap();
    let second = editor.begin_edit(0, &field, json!(30)).unwrap();

    editor.reconcile(first, Ok(json!({"pk": 1, "total_cost": 25})));
    assert_eq!(cost(&editor, 0), Some(json!(30)));

    editor.reconcile(second, Err(ClientError::NetworkError("reset".to_string())));
    assert_eq!(cost(&editor, 0), Some(json!(25)));
}

#[tokio::test]
async fn test_response_after_refresh_is_discarded() {
    let (editor, _) = inventory_editor(Scripted::default(), test_config()).await;
    let field = editor.field("total_cost").unwrap();

    let pending = editor.begin_edit(0, &field, json!(25)).unwrap();
    editor
        .refresh(&RequestContext::anonymous(), &ListQuery::new())
        .await
        .unwrap();
    assert_eq!(cost(&editor, 0), Some(json!(10)));

    let outcome = editor.reconcile(pending, Ok(json!({"pk": 1, "total_cost": 25})));
    assert_eq!(outcome, EditOutcome::Discarded { pk: 1 });
    assert_eq!(cost(&editor, 0), Some(json!(10)));
}

#[tokio::test]
async fn test_rollback_follows_row_after_prepend() {
    let (editor, _) = inventory_editor(Scripted::default(), test_config()).await;
    let field = editor.field("total_cost").unwrap();

    let pending = editor.begin_edit(0, &field, json!(25)).unwrap();
    let mut values = Map::new();
    values.insert("serial".to_string(), json!("B-1"));
    values.insert("total_cost".to_string(), json!(99));
    editor
        .create_row(&RequestContext::anonymous(), values)
        .await
        .unwrap();

    editor.reconcile(pending, Err(ClientError::Timeout));

    assert_eq!(editor.row(0).unwrap().pk(), 100);
    assert_eq!(cost(&editor, 0), Some(json!(99)));
    assert_eq!(editor.row(1).unwrap().pk(), 1);
    assert_eq!(cost(&editor, 1), Some(json!(10)));
}

#[tokio::test]
async fn test_write_back_copies_computed_fields() {
    let scripted = Arc::new(Scripted::default().with_list(
        "purchases",
        vec![json!({"pk": 5, "paid": false, "buying": "0.00", "note": ""})],
    ));
    let config = EditorConfig {
        write_back: vec![FieldPath::parse("buying").unwrap()],
        ..test_config()
    };
    let editor = CellEditor::new(schema("purchases"), scripted.clone(), config).unwrap();
    editor
        .refresh(&RequestContext::anonymous(), &ListQuery::new())
        .await
        .unwrap();
    scripted.reply(Reply::Value(
        json!({"pk": 5, "paid": true, "buying": "120.50", "note": ""}),
    ));
    let field = editor.field("paid").unwrap();

    let outcome = editor
        .edit_cell(&RequestContext::anonymous(), 0, &field, json!(true))
        .await
        .unwrap();

    assert!(outcome.is_committed());
    let buying = FieldPath::parse("buying").unwrap();
    assert_eq!(editor.row(0).unwrap().get(&buying), Some(&json!("120.50")));
}

#[tokio::test]
async fn test_refresh_applies_default_ordering_and_page_size() {
    let (editor, scripted) = inventory_editor(Scripted::default(), test_config()).await;

    let queries = scripted.queries.lock();
    let (_, query) = queries
        .iter()
        .find(|(resource, _)| resource == "inventory")
        .unwrap();
    assert_eq!(query.limit, Some(25));
    assert_eq!(
        query.ordering,
        vec![SortKey::desc("received"), SortKey::asc("serial")]
    );
    assert!(queries.iter().any(|(resource, _)| resource == "rooms"));
    assert!(queries.iter().any(|(resource, _)| resource == "item-ratings"));
    assert_eq!(editor.len(), 2);
}

#[tokio::test]
async fn test_create_without_pk_leaves_rows_unchanged() {
    let (editor, scripted) = inventory_editor(Scripted::default(), test_config()).await;
    *scripted.create_reply.lock() = Some(json!({"serial": ["This field is required."]}));

    let outcome = editor
        .create_row(&RequestContext::anonymous(), Map::new())
        .await
        .unwrap();

    assert!(matches!(outcome, CreateOutcome::Rejected { .. }));
    assert_eq!(editor.len(), 2);
}

#[tokio::test]
async fn test_create_prepends_new_row() {
    let (editor, _) = inventory_editor(Scripted::default(), test_config()).await;
    let mut values = Map::new();
    values.insert("serial".to_string(), json!("C-9"));

    let outcome = editor
        .create_row(&RequestContext::anonymous(), values)
        .await
        .unwrap();

    let CreateOutcome::Created(created) = outcome else {
        panic!("expected a created row");
    };
    assert_eq!(created.pk(), 100);
    assert_eq!(editor.len(), 3);
    assert_eq!(editor.row(0).unwrap(), created);
}

#[tokio::test]
async fn test_create_refuses_pk_and_unknown_fields() {
    let (editor, scripted) = inventory_editor(Scripted::default(), test_config()).await;

    let mut values = Map::new();
    values.insert("pk".to_string(), json!(5));
    let err = editor
        .create_row(&RequestContext::anonymous(), values)
        .await
        .unwrap_err();
    assert!(matches!(err, EditorError::Grid(GridError::FieldReadOnly { .. })));

    let mut values = Map::new();
    values.insert("colour".to_string(), json!("red"));
    let err = editor
        .create_row(&RequestContext::anonymous(), values)
        .await
        .unwrap_err();
    assert!(matches!(err, EditorError::Grid(GridError::FieldNotFound { .. })));
    assert!(scripted.creates.lock().is_empty());
}

#[tokio::test]
async fn test_declined_delete_sends_nothing() {
    let (editor, scripted) = inventory_editor(Scripted::default(), test_config()).await;

    let outcome = editor
        .delete_row(&RequestContext::anonymous(), 0, &|_: &Row| false)
        .await
        .unwrap();

    assert_eq!(outcome, DeleteOutcome::Cancelled);
    assert!(scripted.deletes.lock().is_empty());
    assert_eq!(editor.len(), 2);
}

#[tokio::test]
async fn test_delete_removes_row_only_on_no_content() {
    let (editor, scripted) = inventory_editor(Scripted::default(), test_config()).await;

    *scripted.delete_status.lock() = Some(200);
    let outcome = editor
        .delete_row(&RequestContext::anonymous(), 0, &|_: &Row| true)
        .await
        .unwrap();
    assert_eq!(outcome, DeleteOutcome::Rejected { pk: 1, status: 200 });
    assert_eq!(editor.len(), 2);

    *scripted.delete_status.lock() = Some(204);
    let outcome = editor
        .delete_row(&RequestContext::anonymous(), 0, &|row: &Row| row.pk() == 1)
        .await
        .unwrap();
    assert_eq!(outcome, DeleteOutcome::Deleted { pk: 1 });
    assert_eq!(editor.len(), 1);
    assert_eq!(editor.row(0).unwrap().pk(), 2);
}

#[tokio::test]
async fn test_response_for_deleted_row_is_discarded() {
    let (editor, _) = inventory_editor(Scripted::default(), test_config()).await;
    let field = editor.field("total_cost").unwrap();

    let pending = editor.begin_edit(0, &field, json!(25)).unwrap();
    editor
        .delete_row(&RequestContext::anonymous(), 0, &|_: &Row| true)
        .await
        .unwrap();

    let outcome = editor.reconcile(pending, Err(ClientError::Timeout));
    assert_eq!(outcome, EditOutcome::Discarded { pk: 1 });
    assert_eq!(editor.len(), 1);
}

fn displayed(editor: &CellEditor) -> Vec<Value> {
    editor.rows().iter().map(|row| row.clone().into_value()).collect()
}

#[tokio::test]
async fn test_rollback_restores_whole_collection() {
    let (editor, _scripted) = inventory_editor(Scripted::default(), test_config()).await;
    let before = editor.rows();
    let field = editor.field("total_cost").unwrap();

    let pending = editor.begin_edit(0, &field, json!(25)).unwrap();
    assert_eq!(
        displayed(&editor),
        vec![
            json!({"pk": 1, "serial": "A-1", "total_cost": 25, "room": {"pk": 3, "name": "Shelf A"}}),
            json!({"pk": 2, "serial": "A-2", "total_cost": 20, "room": null}),
        ]
    );

    let outcome = editor.reconcile(pending, Ok(json!({"pk": 1, "total_cost": 10})));
    assert!(matches!(
        outcome,
        EditOutcome::RolledBack {
            pk: 1,
            reason: RollbackReason::Mismatch { .. }
        }
    ));
    assert_eq!(editor.rows(), before);
}

#[tokio::test]
async fn test_commit_changes_only_the_edited_cell() {
    let (editor, _scripted) = inventory_editor(Scripted::default(), test_config()).await;
    let mut expected = displayed(&editor);
    expected[0]["total_cost"] = json!(25);
    let field = editor.field("total_cost").unwrap();

    let pending = editor.begin_edit(0, &field, json!(25)).unwrap();
    assert_eq!(displayed(&editor), expected);

    let outcome = editor.reconcile(pending, Ok(json!({"pk": 1, "total_cost": "25.00", "serial": "A-1"})));
    assert_eq!(outcome, EditOutcome::Committed { pk: 1 });
    assert_eq!(displayed(&editor), expected);
}

#[tokio::test]
async fn test_nested_rollback_restores_parent() {
    let scripted = Arc::new(
        Scripted::default()
            .with_list(
                "inventory",
                vec![
                    json!({"pk": 1, "serial": "A-1", "product": null}),
                    json!({"pk": 2, "serial": "A-2"}),
                    json!({"pk": 3, "serial": "A-3", "product": {"name": "Chair"}}),
                ],
            )
            .with_list("rooms", rooms()),
    );
    let ctx = RequestContext::anonymous();
    let editor = CellEditor::new(schema("inventory"), scripted.clone(), test_config()).unwrap();
    editor.refresh(&ctx, &ListQuery::new()).await.unwrap();
    let before = editor.rows();
    let field = editor.field("product.sku").unwrap();

    for index in 0..3 {
        scripted.reply(Reply::Value(json!({"pk": index + 1, "product": {"name": "Chair"}})));
        let outcome = editor
            .edit_cell(&ctx, index, &field, json!("SKU-9"))
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            EditOutcome::RolledBack {
                reason: RollbackReason::Mismatch { echoed: None, .. },
                ..
            }
        ));
    }
    assert_eq!(editor.rows(), before);
    assert_eq!(editor.pending_edits(), 0);
}

#[tokio::test]
async fn test_nested_rollback_keeps_sibling_edit() {
    let scripted = Arc::new(
        Scripted::default()
            .with_list("inventory", vec![json!({"pk": 1, "serial": "A-1", "product": null})])
            .with_list("rooms", rooms()),
    );
    let ctx = RequestContext::anonymous();
    let editor = CellEditor::new(schema("inventory"), scripted, test_config()).unwrap();
    editor.refresh(&ctx, &ListQuery::new()).await.unwrap();
    let sku = editor.field("product.sku").unwrap();
    let name = editor.field("product.name").unwrap();

    let sku_edit = editor.begin_edit(0, &sku, json!("SKU-9")).unwrap();
    let name_edit = editor.begin_edit(0, &name, json!("Chair")).unwrap();
    editor.reconcile(name_edit, Ok(json!({"pk": 1, "product": {"name": "Chair"}})));
    editor.reconcile(sku_edit, Ok(json!({"pk": 1, "product": {"name": "Chair"}})));

    assert_eq!(
        editor.row(0).unwrap().get_key("product"),
        Some(&json!({"name": "Chair"}))
    );
}

/// Confirms any response that reports the edited field.
struct AnyEcho;

impl ReconcilePredicate for AnyEcho {
    fn accepts(&self, _field: &FieldRef, _sent: &Value, echoed: Option<&Value>) -> bool {
        echoed.is_some()
    }
}

#[tokio::test]
async fn test_installed_predicate_decides_commit() {
    let scripted = Arc::new(
        Scripted::default()
            .with_list("inventory", inventory_rows())
            .with_list("rooms", rooms()),
    );
    let ctx = RequestContext::anonymous();
    let editor = CellEditor::new(schema("inventory"), scripted.clone(), test_config())
        .unwrap()
        .with_predicate(Box::new(AnyEcho));
    editor.refresh(&ctx, &ListQuery::new()).await.unwrap();
    let field = editor.field("total_cost").unwrap();

    // The default predicate would roll this back
    scripted.reply(Reply::Value(json!({"pk": 1, "total_cost": "11.00"})));
    let outcome = editor.edit_cell(&ctx, 0, &field, json!(25)).await.unwrap();
    assert_eq!(outcome, EditOutcome::Committed { pk: 1 });
    assert_eq!(cost(&editor, 0), Some(json!(25)));

    scripted.reply(Reply::Value(json!({"pk": 1})));
    let outcome = editor.edit_cell(&ctx, 0, &field, json!(30)).await.unwrap();
    assert!(matches!(outcome, EditOutcome::RolledBack { pk: 1, .. }));
    assert_eq!(cost(&editor, 0), Some(json!(25)));
}
