//! The optimistic cell editor.
//!
//! Edit protocol:
//! 1. `begin_edit` writes the new value into the displayed row and records
//!    the pre-edit value as the cell's baseline.
//! 2. The changed field alone is sent as a partial update keyed by `pk`.
//! 3. `reconcile` keeps the value if the response echoes it, otherwise it
//!    restores the baseline. No retry.
//!
//! Bookkeeping is keyed by `(pk, field path)`. Responses that belong to an
//! older fetch of the view (a different epoch) are discarded.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use parking_lot::Mutex;
use serde_json::{Map, Value};

use stockroom_client::{ClientError, Collaborator, RequestContext};
use stockroom_core::config::ClientConfig;
use stockroom_core::value::PK_FIELD;
use stockroom_core::{
    FieldPath, FieldRef, GridError, ListQuery, Pk, ResourceSchema, Row, RowCollection,
};

use crate::confirm::Confirmation;
use crate::error::{EditorError, Result};
use crate::outcome::{CreateOutcome, DeleteOutcome, EditOutcome, RollbackReason};
use crate::reconcile::{EchoMatches, ReconcilePredicate};
use crate::reference::ReferenceList;
use crate::tracking::{CellTrack, EditToken};

/// Cell editor configuration.
#[derive(Debug, Clone)]
pub struct EditorConfig {
    /// How long an edit waits for its response before rolling back
    /// (`None` waits forever)
    pub response_timeout: Option<Duration>,
    /// Create related records named in relation cells that are not in the
    /// reference list yet
    pub create_missing_references: bool,
    /// Rows requested when a refresh query sets no limit
    pub page_size: usize,
    /// Fields copied from a confirming response into the row (e.g. a
    /// computed total)
    pub write_back: Vec<FieldPath>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self::from(&ClientConfig::default())
    }
}

impl From<&ClientConfig> for EditorConfig {
    fn from(config: &ClientConfig) -> Self {
        Self {
            response_timeout: Some(Duration::from_millis(config.response_timeout_ms)),
            create_missing_references: config.create_missing_references,
            page_size: config.page_size,
            write_back: Vec::new(),
        }
    }
}

/// An edit applied locally and awaiting its response.
#[derive(Debug, Clone)]
pub struct PendingEdit {
    token: EditToken,
    epoch: u64,
    pk: Pk,
    field: FieldRef,
    payload: Map<String, Value>,
    sent: Value,
}

impl PendingEdit {
    pub fn token(&self) -> EditToken {
        self.token
    }

    pub fn pk(&self) -> Pk {
        self.pk
    }

    pub fn field(&self) -> &FieldRef {
        &self.field
    }

    /// Partial update body, e.g. `{"room": 7}`.
    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    /// Value sent for the field (identifier for relation fields).
    pub fn sent(&self) -> &Value {
        &self.sent
    }
}

#[derive(Debug, Default)]
struct EditorState {
    rows: RowCollection,
    cells: HashMap<(Pk, FieldPath), CellTrack>,
    next_token: u64,
}

/// Owns the rows of one table view and edits them optimistically.
pub struct CellEditor {
    schema: Arc<ResourceSchema>,
    collaborator: Arc<dyn Collaborator>,
    config: EditorConfig,
    predicate: Box<dyn ReconcilePredicate>,
    references: HashMap<String, Arc<ReferenceList>>,
    state: Mutex<EditorState>,
}

impl CellEditor {
    /// Creates an editor with an empty row collection.
    ///
    /// One reference list is created per related resource named by the
    /// schema's relation fields.
    pub fn new(
        schema: Arc<ResourceSchema>,
        collaborator: Arc<dyn Collaborator>,
        config: EditorConfig,
    ) -> Result<Self> {
        let mut references = HashMap::new();
        for field in schema.relations() {
            if let Some((resource, display)) = field.relation() {
                if !references.contains_key(resource) {
                    let list = ReferenceList::new(resource, display)?;
                    references.insert(resource.to_string(), Arc::new(list));
                }
            }
        }

        Ok(Self {
            schema,
            collaborator,
            config,
            predicate: Box::new(EchoMatches),
            references,
            state: Mutex::new(EditorState::default()),
        })
    }

    /// Replaces the reconciliation predicate.
    pub fn with_predicate(mut self, predicate: Box<dyn ReconcilePredicate>) -> Self {
        self.predicate = predicate;
        self
    }

    pub fn schema(&self) -> &Arc<ResourceSchema> {
        &self.schema
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Resolves a field path of this editor's resource.
    pub fn field(&self, path: &str) -> Result<FieldRef> {
        Ok(self.schema.field(path)?)
    }

    /// Reference list of a related resource.
    pub fn reference(&self, resource: &str) -> Option<Arc<ReferenceList>> {
        self.references.get(resource).cloned()
    }

    /// Snapshot of the displayed rows.
    pub fn rows(&self) -> RowCollection {
        self.state.lock().rows.clone()
    }

    /// Displayed row at an index.
    pub fn row(&self, index: usize) -> Result<Row> {
        Ok(self.state.lock().rows.get(index)?.clone())
    }

    pub fn len(&self) -> usize {
        self.state.lock().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Edits still waiting for a response.
    pub fn pending_edits(&self) -> usize {
        self.state
            .lock()
            .cells
            .values()
            .map(CellTrack::outstanding)
            .sum()
    }

    /// Installs rows fetched elsewhere, starting a new epoch.
    ///
    /// Responses to edits made before the replacement are discarded.
    pub fn replace_rows(&self, rows: Vec<Row>) -> u64 {
        let mut state = self.state.lock();
        state.cells.clear();
        state.rows.replace(rows)
    }

    /// Fetches one page and every reference list concurrently, then replaces
    /// the displayed rows with the page.
    ///
    /// A query without ordering uses the schema's default ordering; one
    /// without a limit uses the configured page size. Reference lists that
    /// fail to load keep their previous entries.
    ///
    /// # Returns
    /// The total number of matching records reported by the collaborator.
    pub async fn refresh(&self, ctx: &RequestContext, query: &ListQuery) -> Result<u64> {
        let mut query = query.clone();
        if query.ordering.is_empty() {
            query.ordering = self.schema.default_ordering.clone();
        }
        if query.limit.is_none() {
            query.limit = Some(self.config.page_size);
        }

        let (page, _) = tokio::join!(
            self.collaborator.list(ctx, &self.schema.name, &query),
            self.load_references(ctx)
        );
        let page = page?;

        let epoch = self.replace_rows(page.results);
        tracing::debug!(resource = %self.schema.name, epoch, count = page.count, "view refreshed");
        Ok(page.count)
    }

    /// Loads every reference list concurrently.
    ///
    /// # Returns
    /// The number of lists that loaded; failures are logged and skipped.
    pub async fn load_references(&self, ctx: &RequestContext) -> usize {
        let loads = self.references.values().map(|list| async move {
            let result = self
                .collaborator
                .list(ctx, list.resource(), &ListQuery::new())
                .await;
            match result {
                Ok(page) => {
                    list.replace(page.results);
                    true
                }
                Err(e) => {
                    tracing::warn!(resource = %list.resource(), error = %e, "reference list failed to load");
                    false
                }
            }
        });
        join_all(loads).await.into_iter().filter(|ok| *ok).count()
    }

    /// Applies an edit to the displayed rows without waiting for the
    /// collaborator.
    ///
    /// # Arguments
    /// * `row_index` - Display index of the row
    /// * `field` - Field of this editor's resource
    /// * `value` - New cell value; relation fields take the display name
    ///
    /// # Returns
    /// The pending edit to send and later reconcile, or an error if the row,
    /// field, value or referenced record cannot be resolved. On error the
    /// rows are untouched.
    pub fn begin_edit(&self, row_index: usize, field: &FieldRef, value: Value) -> Result<PendingEdit> {
        if field.resource() != self.schema.name {
            return Err(GridError::FieldNotFound {
                resource: self.schema.name.clone(),
                field: field.path().to_string(),
            }
            .into());
        }
        field.check_value(&value)?;
        let (sent, display) = self.resolve(field, value)?;

        let mut state = self.state.lock();
        let epoch = state.rows.epoch();
        let row = state.rows.get(row_index)?;
        let pk = row.pk();
        let previous = row.get(field.path()).cloned();
        let parent = row.get_key(field.path().root());
        let replaced_parent = (field.path().is_nested() && !parent.is_some_and(Value::is_object))
            .then(|| parent.cloned());

        state.next_token += 1;
        let token = EditToken(state.next_token);
        state
            .cells
            .entry((pk, field.path().clone()))
            .or_insert_with(|| match replaced_parent {
                Some(parent) => CellTrack::new(previous).with_replaced_parent(parent),
                None => CellTrack::new(previous),
            })
            .push(token, display.clone());
        if let Some(row) = state.rows.get_by_pk_mut(pk) {
            row.set(field.path(), display);
        }

        let mut payload = Map::new();
        field.path().set(&mut payload, sent.clone());

        tracing::debug!(resource = %self.schema.name, pk, field = %field.path(), token = token.value(), "optimistic edit applied");
        Ok(PendingEdit {
            token,
            epoch,
            pk,
            field: field.clone(),
            payload,
            sent,
        })
    }

    /// Settles a pending edit with the collaborator's response.
    ///
    /// A confirming response keeps the displayed value and copies the
    /// configured write-back fields from the response. Anything else restores
    /// the value the cell had before its outstanding edits, unless a newer
    /// edit of the same cell is still waiting.
    pub fn reconcile(&self, pending: PendingEdit, response: std::result::Result<Value, ClientError>) -> EditOutcome {
        let PendingEdit {
            token,
            epoch,
            pk,
            field,
            sent,
            ..
        } = pending;

        let (echo, rollback) = match response {
            Err(ClientError::Timeout) => (None, Some(RollbackReason::TimedOut)),
            Err(e) => (None, Some(RollbackReason::Failed(e))),
            Ok(Value::Object(echo)) => {
                let echoed = field.path().get(&echo);
                if self.predicate.accepts(&field, &sent, echoed) {
                    (Some(echo), None)
                } else {
                    let reason = RollbackReason::Mismatch {
                        sent: sent.clone(),
                        echoed: echoed.cloned(),
                    };
                    (None, Some(reason))
                }
            }
            Ok(other) => (
                None,
                Some(RollbackReason::Malformed(format!(
                    "expected an object, got {}",
                    other
                ))),
            ),
        };

        let mut state = self.state.lock();
        if state.rows.epoch() != epoch {
            tracing::debug!(pk, field = %field.path(), "response for a replaced view discarded");
            return EditOutcome::Discarded { pk };
        }

        let key = (pk, field.path().clone());
        let Some(track) = state.cells.get_mut(&key) else {
            return EditOutcome::Discarded { pk };
        };
        if !track.settle(token, rollback.is_none()) {
            return EditOutcome::Discarded { pk };
        }
        let displayed = track.displayed();
        let replaced_parent = track.replaced_parent().cloned();
        if track.is_settled() {
            state.cells.remove(&key);
        }

        let Some(row) = state.rows.get_by_pk_mut(pk) else {
            return EditOutcome::Discarded { pk };
        };
        if row.get(field.path()) != displayed.as_ref() {
            match displayed {
                Some(value) => {
                    row.set(field.path(), value);
                }
                None => {
                    row.unset(field.path());
                    // Put back a parent the edit turned into an object
                    let root = field.path().root();
                    let emptied = row
                        .get_key(root)
                        .and_then(Value::as_object)
                        .is_some_and(Map::is_empty);
                    if let (Some(parent), true) = (replaced_parent, emptied) {
                        row.replace_key(root, parent);
                    }
                }
            }
        }

        match rollback {
            None => {
                if let Some(echo) = echo {
                    for path in &self.config.write_back {
                        if let Some(value) = path.get(&echo) {
                            row.set(path, value.clone());
                        }
                    }
                }
                tracing::info!(resource = %self.schema.name, pk, field = %field.path(), "edit committed");
                EditOutcome::Committed { pk }
            }
            Some(reason) => {
                tracing::warn!(resource = %self.schema.name, pk, field = %field.path(), ?reason, "edit rolled back");
                EditOutcome::RolledBack { pk, reason }
            }
        }
    }

    /// Edits one cell: applies it locally, sends the partial update and
    /// reconciles with the response.
    ///
    /// When missing references may be created, a relation value naming an
    /// unknown record first creates that record.
    ///
    /// # Returns
    /// The reconciliation outcome. Request failures and timeouts are reported
    /// as rollbacks, not errors.
    pub async fn edit_cell(
        &self,
        ctx: &RequestContext,
        row_index: usize,
        field: &FieldRef,
        value: Value,
    ) -> Result<EditOutcome> {
        if let (Some((resource, _)), Some(name)) = (field.relation(), value.as_str()) {
            if self.config.create_missing_references {
                self.ensure_reference(ctx, resource, name).await?;
            }
        }

        let pending = self.begin_edit(row_index, field, value)?;
        let request = self
            .collaborator
            .patch(ctx, &self.schema.name, pending.pk, &pending.payload);
        let response = match self.config.response_timeout {
            Some(limit) => match tokio::time::timeout(limit, request).await {
                Ok(response) => response,
                Err(_) => Err(ClientError::Timeout),
            },
            None => request.await,
        };

        Ok(self.reconcile(pending, response))
    }

    /// Creates a record and prepends it once the collaborator assigns a `pk`.
    ///
    /// # Arguments
    /// * `values` - Field values keyed by top-level field name
    ///
    /// # Returns
    /// `Created` with the stored record, or `Rejected` when the response has
    /// no `pk`. Unknown fields and `pk` itself are refused before sending.
    pub async fn create_row(&self, ctx: &RequestContext, values: Map<String, Value>) -> Result<CreateOutcome> {
        for key in values.keys() {
            if key == PK_FIELD {
                return Err(GridError::FieldReadOnly {
                    resource: self.schema.name.clone(),
                    field: key.clone(),
                }
                .into());
            }
            if !self.schema.has_root(key) {
                return Err(GridError::FieldNotFound {
                    resource: self.schema.name.clone(),
                    field: key.clone(),
                }
                .into());
            }
        }

        let response = self
            .collaborator
            .create(ctx, &self.schema.name, &values)
            .await?;
        match Row::from_value(response.clone()) {
            Ok(row) => {
                tracing::info!(resource = %self.schema.name, pk = row.pk(), "row created");
                self.state.lock().rows.prepend(row.clone());
                Ok(CreateOutcome::Created(row))
            }
            Err(_) => {
                tracing::warn!(resource = %self.schema.name, "create response carried no pk");
                Ok(CreateOutcome::Rejected { response })
            }
        }
    }

    /// Deletes a row after confirmation.
    ///
    /// # Returns
    /// `Cancelled` without sending anything when `confirm` declines,
    /// `Deleted` when the collaborator answers 204, `Rejected` for any
    /// other success status.
    pub async fn delete_row(
        &self,
        ctx: &RequestContext,
        row_index: usize,
        confirm: &dyn Confirmation,
    ) -> Result<DeleteOutcome> {
        let row = self.row(row_index)?;
        if !confirm.confirm(&row) {
            return Ok(DeleteOutcome::Cancelled);
        }

        let pk = row.pk();
        let status = self.collaborator.delete(ctx, &self.schema.name, pk).await?;
        if status != 204 {
            return Ok(DeleteOutcome::Rejected { pk, status });
        }

        let mut state = self.state.lock();
        state.cells.retain(|(cell_pk, _), _| *cell_pk != pk);
        // The row may already be gone after a concurrent refresh
        let _ = state.rows.remove(pk);
        tracing::info!(resource = %self.schema.name, pk, "row deleted");
        Ok(DeleteOutcome::Deleted { pk })
    }

    /// Resolves an edit value into the sent value and the displayed value.
    fn resolve(&self, field: &FieldRef, value: Value) -> Result<(Value, Value)> {
        let Some((resource, _)) = field.relation() else {
            return Ok((value.clone(), value));
        };
        let Value::String(name) = value else {
            // Clearing a relation
            return Ok((Value::Null, Value::Null));
        };
        let list = self.references.get(resource).ok_or_else(|| GridError::UnknownReference {
            resource: resource.to_string(),
            name: name.clone(),
        })?;
        let target = list.find(&name).ok_or_else(|| GridError::UnknownReference {
            resource: resource.to_string(),
            name: name.clone(),
        })?;
        Ok((Value::from(target.pk()), target.into_value()))
    }

    /// Creates a related record named `name` unless the reference list
    /// already holds one.
    async fn ensure_reference(&self, ctx: &RequestContext, resource: &str, name: &str) -> Result<()> {
        let Some(list) = self.references.get(resource) else {
            return Ok(());
        };
        if list.find(name).is_some() {
            return Ok(());
        }

        let mut body = Map::new();
        list.display().set(&mut body, Value::from(name));
        let response = self.collaborator.create(ctx, resource, &body).await?;
        let created = Row::from_value(response).map_err(|e| EditorError::InvalidResponse {
            operation: "create reference",
            message: e.to_string(),
        })?;
        tracing::info!(resource, pk = created.pk(), name, "related record created");
        list.push(created);
        Ok(())
    }
}
