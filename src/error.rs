use thiserror::Error;

use crate::contact::ContactId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// A start arrived for an id that is still live. Points at a bug in the
    /// input source; the engine keeps its previous state.
    #[error("contact {id} is already active")]
    DuplicateContact { id: ContactId },
}
