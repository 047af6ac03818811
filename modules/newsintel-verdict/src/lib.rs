pub mod adapters;
pub mod assembler;
pub mod llm_decision;
pub mod router;
pub mod state;

pub use adapters::*;
pub use assembler::VerdictAssembler;
pub use llm_decision::OpenRouterDecisionAdapter;
pub use router::SubjectRouter;
pub use state::SubjectStateRegistry;
