//! Resolution services
//!
//! Each service owns one step of identity resolution. The workflow module
//! wires them together.

pub mod authority;
pub mod classifier;
pub mod entry_builder;
pub mod normalizer;
pub mod review;
pub mod scorer;
pub mod token_resolver;

pub use authority::{AuthorityCard, AuthorityClient, ExternalVerifier, ScryfallClient, VerifierError};
pub use classifier::{Classification, ConfidenceClassifier, ConfirmRule};
pub use entry_builder::{merge_entries, EntryBuilder};
pub use normalizer::KeyNormalizer;
pub use review::{
    BatchSurface, DecisionSurface, ReviewCoordinator, ReviewOutcome, SurfaceError, TerminalSurface,
    TextPromptSurface,
};
pub use scorer::CandidateScorer;
pub use token_resolver::{TokenIdentity, TokenVerdict};
