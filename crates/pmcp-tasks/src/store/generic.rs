//! Generic task store with all domain logic delegating to a [`StorageBackend`].
//!
//! [`GenericTaskStore`] implements every domain operation (state machine
//! transitions, owner isolation, variable merge with null-deletion, size
//! limit enforcement, TTL validation, CAS-based mutations, canonical JSON
//! serialization) on top of any [`StorageBackend`] implementation.
//!
//! Backends remain dumb key-value stores; all intelligence lives here.
//!
//! # Construction
//!
//! Use the builder pattern:
//!
//! ```rust,no_run
//! # use pmcp_tasks::store::generic::GenericTaskStore;
//! # use pmcp_tasks::store::StoreConfig;
//! # use pmcp_tasks::security::TaskSecurityConfig;
//! // Assuming `backend` implements StorageBackend:
//! // let store = GenericTaskStore::new(backend)
//! //     .with_config(StoreConfig::default())
//! //     .with_security(TaskSecurityConfig::default())
//! //     .with_poll_interval(1000);
//! ```
//!
//! # CAS Semantics
//!
//! All mutation operations (except `create`) use
//! [`StorageBackend::put_if_version`] for optimistic concurrency. A version
//! mismatch surfaces as [`TaskError::ConcurrentModification`].
//!
//! # Owner Isolation
//!
//! Owner mismatch on any operation returns [`TaskError::NotFound`] -- the
//! store never reveals that a task exists for a different owner.

use std::collections::HashMap;

use serde_json::Value;

use crate::domain::record::{validate_variables, TaskRecord};
use crate::error::TaskError;
use crate::security::{TaskSecurityConfig, DEFAULT_LOCAL_OWNER};
use crate::store::backend::{make_key, make_prefix, StorageBackend, StorageError};
use crate::store::{ListTasksOptions, StoreConfig, TaskPage};
use crate::types::task::TaskStatus;

/// Generic task store that delegates all storage to a [`StorageBackend`].
///
/// All domain logic lives here: state machine validation, owner isolation,
/// variable merge with null-deletion, size/depth/string-length enforcement,
/// TTL validation with hard reject, CAS-based mutations, and canonical
/// JSON serialization at the storage boundary.
///
/// # Type Parameters
///
/// * `B` - A [`StorageBackend`] implementation (in-memory, `DynamoDB`, Redis, etc.)
#[derive(Debug)]
pub struct GenericTaskStore<B: StorageBackend> {
    backend: B,
    config: StoreConfig,
    security: TaskSecurityConfig,
    default_poll_interval: u64,
}

impl<B: StorageBackend> GenericTaskStore<B> {
    /// Creates a new generic task store backed by the given backend.
    ///
    /// Uses default configuration:
    /// - `StoreConfig::default()` (1 MB variables, 1h default TTL, 24h max TTL)
    /// - `TaskSecurityConfig::default()` (100 tasks/owner, no anonymous access)
    /// - Poll interval: 500ms
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            config: StoreConfig::default(),
            security: TaskSecurityConfig::default(),
            default_poll_interval: 500,
        }
    }

    /// Sets the storage configuration.
    pub fn with_config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the security configuration.
    pub fn with_security(mut self, security: TaskSecurityConfig) -> Self {
        self.security = security;
        self
    }

    /// Sets the default poll interval in milliseconds.
    pub fn with_poll_interval(mut self, ms: u64) -> Self {
        self.default_poll_interval = ms;
        self
    }

    // ---- Serialization helpers (private) ----

    fn serialize_record(record: &TaskRecord) -> Result<Vec<u8>, TaskError> {
        serde_json::to_vec(record)
            .map_err(|e| TaskError::StoreError(format!("failed to serialize TaskRecord: {e}")))
    }

    fn deserialize_record(data: &[u8]) -> Result<TaskRecord, TaskError> {
        serde_json::from_slice(data)
            .map_err(|e| TaskError::StoreError(format!("failed to deserialize TaskRecord: {e}")))
    }

    fn map_storage_error(err: StorageError, task_id: &str) -> TaskError {
        match err {
            StorageError::NotFound { .. } => TaskError::NotFound {
                task_id: task_id.to_string(),
            },
            StorageError::VersionConflict {
                expected, actual, ..
            } => TaskError::ConcurrentModification {
                task_id: task_id.to_string(),
                expected_version: expected,
                actual_version: actual,
            },
            StorageError::CapacityExceeded { message } => TaskError::StorageFull { message },
            StorageError::Backend { message, .. } => TaskError::StoreError(message),
        }
    }

    /// Checks if the given owner ID represents anonymous/local access.
    fn is_anonymous_owner(owner_id: &str) -> bool {
        owner_id.is_empty() || owner_id == DEFAULT_LOCAL_OWNER
    }

    /// Validates that the owner has permission to create tasks.
    fn check_anonymous_access(&self, owner_id: &str) -> Result<(), TaskError> {
        if !self.security.allow_anonymous && Self::is_anonymous_owner(owner_id) {
            return Err(TaskError::StoreError(
                "anonymous access is not allowed; configure OAuth or enable allow_anonymous"
                    .to_string(),
            ));
        }
        Ok(())
    }

    // ---- Domain operations (public) ----

    /// Creates a new task in the `Working` state.
    ///
    /// Enforces anonymous access check, max tasks per owner, TTL maximum
    /// (hard reject, no silent clamping), and default TTL application.
    pub async fn create(
        &self,
        owner_id: &str,
        request_method: &str,
        ttl: Option<u64>,
    ) -> Result<TaskRecord, TaskError> {
        // Check anonymous access
        self.check_anonymous_access(owner_id)?;

        // Count owner tasks via list_by_prefix
        let prefix = make_prefix(owner_id);
        let owner_records = self
            .backend
            .list_by_prefix(&prefix)
            .await
            .map_err(|e| Self::map_storage_error(e, ""))?;
        if owner_records.len() >= self.security.max_tasks_per_owner {
            return Err(TaskError::ResourceExhausted {
                suggested_action: Some("Cancel or wait for existing tasks to expire".to_string()),
            });
        }

        // Validate TTL against maximum (hard reject, no clamping)
        if let (Some(requested_ttl), Some(max_ttl)) = (ttl, self.config.max_ttl_ms) {
            if requested_ttl > max_ttl {
                return Err(TaskError::StoreError(format!(
                    "TTL {requested_ttl}ms exceeds maximum allowed {max_ttl}ms"
                )));
            }
        }

        // Apply default TTL if none provided
        let effective_ttl = ttl.or(self.config.default_ttl_ms);

        // Create the task record
        let mut record = TaskRecord::new(
            owner_id.to_string(),
            request_method.to_string(),
            effective_ttl,
        );
        record.task.poll_interval = Some(self.default_poll_interval);

        // Serialize to canonical JSON and store
        let key = make_key(owner_id, &record.task.task_id);
        let bytes = Self::serialize_record(&record)?;
        let version = self
            .backend
            .put(&key, &bytes)
            .await
            .map_err(|e| Self::map_storage_error(e, &record.task.task_id))?;
        record.version = version;

        Ok(record)
    }

    /// Retrieves a task by ID, scoped to the given owner.
    ///
    /// Returns the task even if expired (callers check `is_expired()`).
    /// Owner mismatch returns `NotFound` for security.
    pub async fn get(&self, task_id: &str, owner_id: &str) -> Result<TaskRecord, TaskError> {
        let key = make_key(owner_id, task_id);
        let versioned = self
            .backend
            .get(&key)
            .await
            .map_err(|e| Self::map_storage_error(e, task_id))?;

        let mut record = Self::deserialize_record(&versioned.data)?;
        record.version = versioned.version;

        // Defense in depth: verify owner_id even though key is scoped
        if record.owner_id != owner_id {
            tracing::warn!(
                task_id = task_id,
                expected_owner = owner_id,
                actual_owner = record.owner_id,
                "owner mismatch on task get (returning NotFound)"
            );
            return Err(TaskError::NotFound {
                task_id: task_id.to_string(),
            });
        }

        Ok(record)
    }

    /// Transitions a task to a new status with CAS-based atomicity.
    ///
    /// Validates owner, expiry, and state machine transition. Uses
    /// `put_if_version` so concurrent modifications are detected.
    pub async fn update_status(
        &self,
        task_id: &str,
        owner_id: &str,
        new_status: TaskStatus,
        status_message: Option<String>,
    ) -> Result<TaskRecord, TaskError> {
        let key = make_key(owner_id, task_id);
        let versioned = self
            .backend
            .get(&key)
            .await
            .map_err(|e| Self::map_storage_error(e, task_id))?;

        let mut record = Self::deserialize_record(&versioned.data)?;
        record.version = versioned.version;

        // Owner isolation
        if record.owner_id != owner_id {
            tracing::warn!(
                task_id = task_id,
                expected_owner = owner_id,
                actual_owner = record.owner_id,
                "owner mismatch on task update_status (returning NotFound)"
            );
            return Err(TaskError::NotFound {
                task_id: task_id.to_string(),
            });
        }

        // Reject mutations on expired tasks
        if record.is_expired() {
            return Err(TaskError::Expired {
                task_id: task_id.to_string(),
                expired_at: record.expires_at.map(|e| e.to_rfc3339()),
            });
        }

        // Validate state machine transition
        record
            .task
            .status
            .validate_transition(task_id, &new_status)?;

        // Apply transition
        record.task.status = new_status;
        record.task.status_message = status_message;
        record.task.last_updated_at =
            chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

        // CAS write
        let bytes = Self::serialize_record(&record)?;
        let new_version = self
            .backend
            .put_if_version(&key, &bytes, versioned.version)
            .await
            .map_err(|e| Self::map_storage_error(e, task_id))?;
        record.version = new_version;

        Ok(record)
    }

    /// Merges variables with null-deletion semantics and size/schema validation.
    ///
    /// Uses a clone-check-commit pattern: merges on a clone first, validates
    /// depth/string-length/total-size, and only commits if within limits.
    pub async fn set_variables(
        &self,
        task_id: &str,
        owner_id: &str,
        variables: HashMap<String, Value>,
    ) -> Result<TaskRecord, TaskError> {
        let key = make_key(owner_id, task_id);
        let versioned = self
            .backend
            .get(&key)
            .await
            .map_err(|e| Self::map_storage_error(e, task_id))?;

        let mut record = Self::deserialize_record(&versioned.data)?;
        record.version = versioned.version;

        // Owner isolation
        if record.owner_id != owner_id {
            tracing::warn!(
                task_id = task_id,
                expected_owner = owner_id,
                actual_owner = record.owner_id,
                "owner mismatch on task set_variables (returning NotFound)"
            );
            return Err(TaskError::NotFound {
                task_id: task_id.to_string(),
            });
        }

        // Reject mutations on expired tasks
        if record.is_expired() {
            return Err(TaskError::Expired {
                task_id: task_id.to_string(),
                expired_at: record.expires_at.map(|e| e.to_rfc3339()),
            });
        }

        // Validate incoming variables for depth bombs and long strings
        validate_variables(
            &variables,
            self.config.max_variable_depth,
            self.config.max_string_length,
        )
        .map_err(|e| TaskError::StoreError(format!("variable validation failed: {e}")))?;

        // Clone-check-commit: merge on a clone first, validate size, then commit
        let mut merged = record.variables.clone();
        for (key_name, value) in &variables {
            if value.is_null() {
                merged.remove(key_name);
            } else {
                merged.insert(key_name.clone(), value.clone());
            }
        }

        // Check merged size against limit
        let serialized = serde_json::to_vec(&merged)
            .map_err(|e| TaskError::StoreError(format!("failed to serialize variables: {e}")))?;

        if serialized.len() > self.config.max_variable_size_bytes {
            return Err(TaskError::VariableSizeExceeded {
                limit_bytes: self.config.max_variable_size_bytes,
                actual_bytes: serialized.len(),
            });
        }

        // Commit the merged variables
        record.variables = merged;
        record.task.last_updated_at =
            chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

        // CAS write
        let bytes = Self::serialize_record(&record)?;
        let new_version = self
            .backend
            .put_if_version(&key, &bytes, versioned.version)
            .await
            .map_err(|e| Self::map_storage_error(e, task_id))?;
        record.version = new_version;

        Ok(record)
    }

    /// Stores the operation result for a task.
    pub async fn set_result(
        &self,
        task_id: &str,
        owner_id: &str,
        result: Value,
    ) -> Result<(), TaskError> {
        let key = make_key(owner_id, task_id);
        let versioned = self
            .backend
            .get(&key)
            .await
            .map_err(|e| Self::map_storage_error(e, task_id))?;

        let mut record = Self::deserialize_record(&versioned.data)?;
        record.version = versioned.version;

        // Owner isolation
        if record.owner_id != owner_id {
            tracing::warn!(
                task_id = task_id,
                expected_owner = owner_id,
                actual_owner = record.owner_id,
                "owner mismatch on task set_result (returning NotFound)"
            );
            return Err(TaskError::NotFound {
                task_id: task_id.to_string(),
            });
        }

        // Reject mutations on expired tasks
        if record.is_expired() {
            return Err(TaskError::Expired {
                task_id: task_id.to_string(),
                expired_at: record.expires_at.map(|e| e.to_rfc3339()),
            });
        }

        record.result = Some(result);
        record.task.last_updated_at =
            chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

        // CAS write
        let bytes = Self::serialize_record(&record)?;
        self.backend
            .put_if_version(&key, &bytes, versioned.version)
            .await
            .map_err(|e| Self::map_storage_error(e, task_id))?;

        Ok(())
    }

    /// Retrieves the stored result for a completed task.
    ///
    /// Returns `NotReady` if the task has not reached a terminal state.
    pub async fn get_result(&self, task_id: &str, owner_id: &str) -> Result<Value, TaskError> {
        let record = self.get(task_id, owner_id).await?;

        // Must be in a terminal state to retrieve result
        if !record.task.status.is_terminal() {
            return Err(TaskError::NotReady {
                task_id: task_id.to_string(),
                current_status: record.task.status,
            });
        }

        record.result.ok_or_else(|| TaskError::NotReady {
            task_id: task_id.to_string(),
            current_status: record.task.status,
        })
    }

    /// Atomically transitions to a terminal status AND stores the result.
    ///
    /// Both the status transition and result storage are applied in a single
    /// CAS write via `put_if_version`, guaranteeing atomicity.
    pub async fn complete_with_result(
        &self,
        task_id: &str,
        owner_id: &str,
        status: TaskStatus,
        status_message: Option<String>,
        result: Value,
    ) -> Result<TaskRecord, TaskError> {
        let key = make_key(owner_id, task_id);
        let versioned = self
            .backend
            .get(&key)
            .await
            .map_err(|e| Self::map_storage_error(e, task_id))?;

        let mut record = Self::deserialize_record(&versioned.data)?;
        record.version = versioned.version;

        // Owner isolation
        if record.owner_id != owner_id {
            tracing::warn!(
                task_id = task_id,
                expected_owner = owner_id,
                actual_owner = record.owner_id,
                "owner mismatch on task complete_with_result (returning NotFound)"
            );
            return Err(TaskError::NotFound {
                task_id: task_id.to_string(),
            });
        }

        // Reject mutations on expired tasks
        if record.is_expired() {
            return Err(TaskError::Expired {
                task_id: task_id.to_string(),
                expired_at: record.expires_at.map(|e| e.to_rfc3339()),
            });
        }

        // Validate state machine transition
        record.task.status.validate_transition(task_id, &status)?;

        // Apply atomically: status + result in a single CAS write
        record.task.status = status;
        record.task.status_message = status_message;
        record.result = Some(result);
        record.task.last_updated_at =
            chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

        // CAS write
        let bytes = Self::serialize_record(&record)?;
        let new_version = self
            .backend
            .put_if_version(&key, &bytes, versioned.version)
            .await
            .map_err(|e| Self::map_storage_error(e, task_id))?;
        record.version = new_version;

        Ok(record)
    }

    /// Lists tasks for an owner with cursor-based pagination.
    ///
    /// Results are sorted by creation time (newest first). The cursor is
    /// the task ID of the last item in the previous page.
    pub async fn list(&self, options: ListTasksOptions) -> Result<TaskPage, TaskError> {
        let prefix = make_prefix(&options.owner_id);
        let entries = self
            .backend
            .list_by_prefix(&prefix)
            .await
            .map_err(|e| Self::map_storage_error(e, ""))?;

        // Deserialize all records
        let mut tasks: Vec<TaskRecord> = entries
            .iter()
            .filter_map(|(_, versioned)| {
                let mut record = Self::deserialize_record(&versioned.data).ok()?;
                record.version = versioned.version;
                Some(record)
            })
            .collect();

        // Sort by creation time, newest first
        tasks.sort_by(|a, b| b.task.created_at.cmp(&a.task.created_at));

        // Cursor-based pagination: cursor = task_id of last item in previous page
        let start_idx = if let Some(ref cursor) = options.cursor {
            tasks
                .iter()
                .position(|t| t.task.task_id == *cursor)
                .map_or(0, |i| i + 1)
        } else {
            0
        };

        let limit = options.limit.unwrap_or(50);
        let page_tasks: Vec<TaskRecord> = tasks
            .get(start_idx..)
            .unwrap_or(&[])
            .iter()
            .take(limit)
            .cloned()
            .collect();

        let next_cursor = if start_idx + limit < tasks.len() {
            page_tasks.last().map(|t| t.task.task_id.clone())
        } else {
            None
        };

        Ok(TaskPage {
            tasks: page_tasks,
            next_cursor,
        })
    }

    /// Cancels a non-terminal task.
    ///
    /// Delegates to [`update_status`](Self::update_status) with
    /// `TaskStatus::Cancelled`.
    pub async fn cancel(&self, task_id: &str, owner_id: &str) -> Result<TaskRecord, TaskError> {
        self.update_status(task_id, owner_id, TaskStatus::Cancelled, None)
            .await
    }

    /// Removes expired tasks from storage.
    ///
    /// Delegates to [`StorageBackend::cleanup_expired`].
    pub async fn cleanup_expired(&self) -> Result<usize, TaskError> {
        self.backend
            .cleanup_expired()
            .await
            .map_err(|e| Self::map_storage_error(e, ""))
    }

    /// Returns a reference to the store's configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Returns a reference to the underlying storage backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }
}
