//! The three state shapes a [`crate::store::Store`] can own, and their
//! shared derived-status type.

pub mod mutation;
pub mod paginated;
pub mod single;
pub mod status;

pub use mutation::{Attempt, MutationState};
pub use paginated::{Page, PaginatedState, Pages};
pub use single::SingleState;
pub use status::OperationStatus;
