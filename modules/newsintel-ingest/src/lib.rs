pub mod chunker;
pub mod coordinator;
pub mod driver;

pub use chunker::Chunker;
pub use coordinator::{CommittedBatch, IngestCoordinator};
pub use driver::{ArticleAdmitted, StreamingDriver};
