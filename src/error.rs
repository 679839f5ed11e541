//! Engine-level error and warning taxonomy.
//!
//! `EngineError` covers programmer errors — the kind that indicate a bug in
//! the calling code rather than a failed remote call. Conditions that are
//! recoverable but still worth surfacing (a dependency cycle, a controller
//! outliving its store) go through [`crate::warning::WarningReporter`]
//! instead of this enum, mirroring the split between a hard error return and
//! a logged diagnostic that the teacher's task store draws between
//! `TaskError` and its tracing output.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("OperationPath index out of range")]
    PathIndexOutOfRange,

    #[error("cyclic task dependency detected among tasks {0:?}")]
    CyclicTaskDependency(Vec<String>),

    #[error("mutation task ran without an entry in the mutation history")]
    MutationRunWithoutHistory,

    #[error("controller used after its store was dropped")]
    ControllerAfterDrop,

    #[error("page id {0} was not found in the existing page list")]
    UnknownPageId(String),

    #[error("attempted to seed a store with a value whose type does not match the operation")]
    StoreSeedTypeMismatch,

    #[error("store cache reached its configured capacity of {0} with no unsubscribed store to evict")]
    StoreCapacityExceeded(usize),
}
