//! A generic asynchronous operation execution engine.
//!
//! Operations ([`operation::Query`], [`operation::PaginatedQuery`],
//! [`operation::Mutation`]) are identified by a [`path::Path`] and run
//! through a per-path [`store`] that owns their cached state, deduplicates
//! concurrent invocations via [`task::Task`], retries and backs off
//! failures, and fans updates out to subscribers. A [`client::Client`]
//! is the path-indexed directory of stores application code holds onto;
//! [`controller::Controller`] gives external code a weak, reactive handle
//! onto a single store without keeping it alive on its own.

pub mod clock;
pub mod client;
pub mod context;
pub mod continuation;
pub mod controller;
pub mod error;
pub mod keys;
pub mod modifiers;
pub mod operation;
pub mod path;
pub mod run_spec;
pub mod state;
pub mod store;
pub mod subscription;
pub mod task;
pub mod warning;

pub use client::Client;
pub use context::{Context, ContextKey};
pub use continuation::Continuation;
pub use controller::{Controller, Controls};
pub use error::EngineError;
pub use operation::{Mutation, PaginatedQuery, Query};
pub use path::{Path, PathToken};
pub use run_spec::RunSpecification;
pub use state::OperationStatus;
pub use subscription::Subscription;
pub use task::{RunOutcome, Task, TaskId};
pub use warning::WarningReporter;
