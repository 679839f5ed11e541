//! Task record -- the store's internal representation of a task.
//!
//! [`TaskRecord`] wraps the wire-format [`Task`] with additional fields
//! needed for storage, ownership, variables, and TTL expiration.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::types::task::{Task, TaskStatus};

/// Internal storage representation of a task.
///
/// A `TaskRecord` holds the wire-format [`Task`] along with domain-specific
/// fields that are not part of the MCP wire protocol: `owner_id` for access
/// control, `variables` for shared state, `result` for the operation outcome,
/// `request_method` for auditing, and `expires_at` for efficient TTL checks.
///
/// All fields are public so that store implementors have full access.
///
/// # Construction
///
/// Use [`TaskRecord::new`] to create a new record with a generated UUID task
/// ID and computed expiry:
///
/// ```
/// use pmcp_tasks::domain::TaskRecord;
///
/// let record = TaskRecord::new(
///     "session-abc".to_string(),
///     "tools/call".to_string(),
///     Some(60_000),
/// );
/// assert!(!record.task.task_id.is_empty());
/// assert_eq!(record.owner_id, "session-abc");
/// assert!(record.expires_at.is_some());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    /// The wire-format task (serialized as-is for MCP responses).
    pub task: Task,

    /// Identifier of the session or client that owns this task.
    pub owner_id: String,

    /// Shared variable store for this task. Both client and server can
    /// read and write variables. Variables are injected into the wire
    /// task's `_meta` field at the serialization boundary.
    pub variables: HashMap<String, Value>,

    /// The operation result, set when the task reaches a terminal state.
    pub result: Option<Value>,

    /// The MCP method that created this task (e.g., `"tools/call"`).
    pub request_method: String,

    /// Computed absolute expiry time based on TTL. `None` means the task
    /// does not expire (unlimited TTL). Serialized as ISO 8601 via
    /// chrono's serde support.
    pub expires_at: Option<DateTime<Utc>>,

    /// Monotonic version for CAS operations. Not part of the serialized
    /// record -- managed by the storage backend.
    #[serde(skip)]
    pub version: u64,
}

impl TaskRecord {
    /// Creates a new task record in the `Working` state.
    ///
    /// Generates a `UUIDv4` task ID, sets timestamps to the current UTC time,
    /// and computes `expires_at` from `ttl` (milliseconds from now). If `ttl`
    /// is `None`, the task does not expire.
    ///
    /// # Arguments
    ///
    /// * `owner_id` - The session or client identifier that owns this task.
    /// * `request_method` - The MCP method name that created this task.
    /// * `ttl` - Time-to-live in milliseconds, or `None` for unlimited.
    ///
    /// # Examples
    ///
    /// ```
    /// use pmcp_tasks::domain::TaskRecord;
    ///
    /// let record = TaskRecord::new(
    ///     "session-1".to_string(),
    ///     "tools/call".to_string(),
    ///     Some(30_000),
    /// );
    ///
    /// assert_eq!(record.task.status, pmcp_tasks::TaskStatus::Working);
    /// assert_eq!(record.owner_id, "session-1");
    /// assert_eq!(record.request_method, "tools/call");
    /// assert!(record.variables.is_empty());
    /// assert!(record.result.is_none());
    /// assert!(record.expires_at.is_some());
    /// ```
    pub fn new(owner_id: String, request_method: String, ttl: Option<u64>) -> Self {
        let now = Utc::now();
        let now_str = now.to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

        // Use checked arithmetic to avoid panics on extremely large TTL values.
        // If the TTL overflows i64 milliseconds or the resulting DateTime overflows,
        // we treat it as "never expires" (None).
        let expires_at = ttl.and_then(|ms| {
            let ms_i64 = i64::try_from(ms).ok()?;
            let duration = Duration::try_milliseconds(ms_i64)?;
            now.checked_add_signed(duration)
        });

        let task = Task {
            task_id: Uuid::new_v4().to_string(),
            status: TaskStatus::Working,
            status_message: None,
            created_at: now_str.clone(),
            last_updated_at: now_str,
            ttl,
            poll_interval: None,
            _meta: None,
        };

        Self {
            task,
            owner_id,
            variables: HashMap::new(),
            result: None,
            request_method,
            expires_at,
            version: 0,
        }
    }

    /// Returns `true` if the task has expired based on its TTL.
    ///
    /// A task with no `expires_at` (unlimited TTL) never expires.
    ///
    /// # Examples
    ///
    /// ```
    /// use pmcp_tasks::domain::TaskRecord;
    ///
    /// // Task with no TTL never expires
    /// let record = TaskRecord::new(
    ///     "owner".to_string(),
    ///     "tools/call".to_string(),
    ///     None,
    /// );
    /// assert!(!record.is_expired());
    /// ```
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expiry) => Utc::now() > expiry,
            None => false,
        }
    }

    /// Returns a clone of the wire-format task without variable injection.
    ///
    /// Use this when you need the raw task without PMCP extensions.
    pub fn to_wire_task(&self) -> Task {
        self.task.clone()
    }

    /// Returns a clone of the wire-format task with variables injected
    /// into the `_meta` field.
    ///
    /// Variables are placed at the top level of `_meta` (not nested under
    /// a PMCP-specific key), per the locked design decision. If the task
    /// already has `_meta` entries, variables are merged in (variables take
    /// precedence on key conflict).
    ///
    /// If the variables map is empty, the existing `_meta` is returned
    /// unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use pmcp_tasks::domain::TaskRecord;
    /// use serde_json::json;
    ///
    /// let mut record = TaskRecord::new(
    ///     "owner".to_string(),
    ///     "tools/call".to_string(),
    ///     None,
    /// );
    /// record.variables.insert("progress".to_string(), json!(42));
    ///
    /// let wire = record.to_wire_task_with_variables();
    /// let meta = wire._meta.expect("_meta should be present");
    /// assert_eq!(meta["progress"], json!(42));
    /// ```
    pub fn to_wire_task_with_variables(&self) -> Task {
        let mut task = self.task.clone();

        if self.variables.is_empty() {
            return task;
        }

        let meta = task._meta.get_or_insert_with(serde_json::Map::new);
        for (key, value) in &self.variables {
            meta.insert(key.clone(), value.clone());
        }

        task
    }
}

/// Validates that a JSON value does not exceed the maximum nesting depth.
///
/// Recursively walks the value. Arrays and objects increment the current
/// depth. Returns an error string if the depth exceeds `max_depth`.
///
/// # Arguments
///
/// * `value` - The JSON value to validate.
/// * `max_depth` - Maximum allowed nesting depth (e.g., 10).
///
/// # Examples
///
/// ```
/// use pmcp_tasks::domain::record::validate_variable_depth;
/// use serde_json::json;
///
/// assert!(validate_variable_depth(&json!(42), 10).is_ok());
/// assert!(validate_variable_depth(&json!({"a": {"b": 1}}), 10).is_ok());
/// ```
pub fn validate_variable_depth(value: &Value, max_depth: usize) -> Result<(), String> {
    check_depth(value, 0, max_depth)
}

fn check_depth(value: &Value, current_depth: usize, max_depth: usize) -> Result<(), String> {
    if current_depth > max_depth {
        return Err(format!(
            "variable nesting depth {current_depth} exceeds maximum {max_depth}"
        ));
    }
    match value {
        Value::Array(arr) => {
            for item in arr {
                check_depth(item, current_depth + 1, max_depth)?;
            }
        },
        Value::Object(map) => {
            for v in map.values() {
                check_depth(v, current_depth + 1, max_depth)?;
            }
        },
        _ => {},
    }
    Ok(())
}

/// Validates that no string value within a JSON structure exceeds the
/// maximum byte length.
///
/// Recursively walks the value. Returns an error string if any string
/// value exceeds `max_length` bytes.
///
/// # Arguments
///
/// * `value` - The JSON value to validate.
/// * `max_length` - Maximum allowed string length in bytes (e.g., 65536).
///
/// # Examples
///
/// ```
/// use pmcp_tasks::domain::record::validate_variable_string_lengths;
/// use serde_json::json;
///
/// assert!(validate_variable_string_lengths(&json!("short"), 65536).is_ok());
/// ```
pub fn validate_variable_string_lengths(value: &Value, max_length: usize) -> Result<(), String> {
    match value {
        Value::String(s) if s.len() > max_length => Err(format!(
            "string value length {} bytes exceeds maximum {max_length} bytes",
            s.len()
        )),
        Value::Array(arr) => {
            for item in arr {
                validate_variable_string_lengths(item, max_length)?;
            }
            Ok(())
        },
        Value::Object(map) => {
            for v in map.values() {
                validate_variable_string_lengths(v, max_length)?;
            }
            Ok(())
        },
        _ => Ok(()),
    }
}

/// Validates all variable values for safety against depth bombs and
/// excessively long strings.
///
/// Iterates over each value in the `variables` map and applies both
/// [`validate_variable_depth`] and [`validate_variable_string_lengths`].
///
/// # Arguments
///
/// * `variables` - The variable map to validate.
/// * `max_depth` - Maximum allowed JSON nesting depth.
/// * `max_string_length` - Maximum allowed string value length in bytes.
///
/// # Examples
///
/// ```
/// use pmcp_tasks::domain::record::validate_variables;
/// use serde_json::json;
/// use std::collections::HashMap;
///
/// let mut vars = HashMap::new();
/// vars.insert("key".to_string(), json!({"nested": "value"}));
/// assert!(validate_variables(&vars, 10, 65536).is_ok());
/// ```
pub fn validate_variables(
    variables: &HashMap<String, Value>,
    max_depth: usize,
    max_string_length: usize,
) -> Result<(), String> {
    for (key, value) in variables {
        validate_variable_depth(value, max_depth).map_err(|e| format!("variable '{key}': {e}"))?;
        validate_variable_string_lengths(value, max_string_length)
            .map_err(|e| format!("variable '{key}': {e}"))?;
    }
    Ok(())
}
