use hyperheap_graph::GraphError;
use hyperheap_statespace::GenerationError;

use crate::MethodId;

#[derive(Debug, thiserror::Error)]
pub enum ProcedureError {
    /// A call refers to a method that was never declared or has no body.
    #[error("method {0:?} is unknown or has no body")]
    UnknownMethod(MethodId),
    /// Scope extraction did not leave a placeholder edge behind.
    #[error("no placeholder edge left for method `{0}`")]
    MissingPlaceholder(String),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Graph(#[from] GraphError),
}
