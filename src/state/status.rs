//! Derived status shared by all three state shapes.

#[derive(Debug, Clone)]
pub enum OperationStatus<V, E> {
    Idle,
    Loading,
    Success(V),
    Failure(E),
}

impl<V, E> OperationStatus<V, E> {
    pub fn is_loading(&self) -> bool {
        matches!(self, OperationStatus::Loading)
    }

    pub fn success(&self) -> Option<&V> {
        match self {
            OperationStatus::Success(v) => Some(v),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&E> {
        match self {
            OperationStatus::Failure(e) => Some(e),
            _ => None,
        }
    }
}
