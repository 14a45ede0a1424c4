//! Built-in verification stages.

pub mod authenticity;
pub mod precondition;
pub mod signature;

pub use authenticity::AuthenticityStage;
pub use precondition::PreconditionStage;
pub use signature::SignatureStage;
