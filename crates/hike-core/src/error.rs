//! Error types for grid construction and route search.

use std::time::Duration;

use thiserror::Error;

use crate::models::{GeoPoint, NodeId};

/// Failure reported by an elevation or terrain provider.
///
/// A batch either resolves completely or fails as a unit.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Http(String),

    #[error("provider returned HTTP {0}")]
    Status(u16),

    #[error("provider payload invalid: {0}")]
    Payload(String),

    #[error("provider returned no sample for {0}")]
    MissingSample(GeoPoint),

    #[error("provider returned non-finite sample {value} for {point}")]
    InvalidSample { point: GeoPoint, value: f64 },

    #[error("provider lookups timed out after {0:?}")]
    Timeout(Duration),

    #[error("provider lookups cancelled")]
    Cancelled,
}

/// Misuse of the [`MinHeap`](crate::heap::MinHeap).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HeapError {
    #[error("heap is empty")]
    Empty,

    #[error("key is not in the heap")]
    UnknownKey,

    #[error("key is already in the heap")]
    DuplicateKey,
}

/// Errors produced while building a grid or planning a route.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("elevation provider failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("grid construction failed: {0}")]
    GridConstruction(String),

    #[error("no grid node found near {0}")]
    NodeResolution(GeoPoint),

    #[error("priority queue exhausted unexpectedly")]
    EmptyQueue,

    #[error("no route from {from} to {to}")]
    RouteNotFound { from: NodeId, to: NodeId },
}

impl From<HeapError> for RouteError {
    fn from(err: HeapError) -> Self {
        match err {
            HeapError::Empty => RouteError::EmptyQueue,
            HeapError::UnknownKey | HeapError::DuplicateKey => RouteError::GridConstruction(
                format!("search state inconsistent with graph: {}", err),
            ),
        }
    }
}

pub type RouteResult<T> = Result<T, RouteError>;
