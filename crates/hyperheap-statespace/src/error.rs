use crate::ProgramCounter;

/// Failure of a single statement while computing successors.
///
/// Only [`SemanticsError::Aborted`] and the fatal variants stop generation.
/// [`SemanticsError::NotSufficientlyMaterialized`] is logged and the state
/// gets no successors.
#[derive(Debug, thiserror::Error)]
pub enum SemanticsError {
    /// The statement needs structure that materialization did not provide.
    #[error("state at pc {pc} is not sufficiently materialized")]
    NotSufficientlyMaterialized { pc: ProgramCounter },
    /// A nested state space generation, e.g. for a callee, gave up.
    #[error("nested generation aborted: {reason}")]
    Aborted { reason: String },
    #[error(transparent)]
    Graph(#[from] hyperheap_graph::GraphError),
    /// User-defined error.
    #[error(transparent)]
    Custom(Box<dyn std::error::Error + Send + Sync>),
}

impl SemanticsError {
    /// Wrap an arbitrary error as [`SemanticsError::Custom`].
    pub fn custom(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        SemanticsError::Custom(Box::new(error))
    }
}

/// Failure of a whole state space generation.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// The abort strategy stopped a nested generation.
    #[error("state space generation aborted: {reason}")]
    Aborted { reason: String },
    /// A state refers to a program counter without statement.
    #[error("no statement at program counter {0}")]
    MissingStatement(ProgramCounter),
    #[error(transparent)]
    Semantics(SemanticsError),
}

impl From<SemanticsError> for GenerationError {
    fn from(error: SemanticsError) -> Self {
        match error {
            SemanticsError::Aborted { reason } => GenerationError::Aborted { reason },
            other => GenerationError::Semantics(other),
        }
    }
}
