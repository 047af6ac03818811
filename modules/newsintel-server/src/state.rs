use std::sync::Arc;

use newsintel_common::AppConfig;
use newsintel_hub::PushHub;
use newsintel_ingest::Chunker;
use newsintel_index::HybridRetriever;
use newsintel_verdict::{SubjectRouter, SubjectStateRegistry, VerdictAssembler};

pub struct AppState {
    pub config: AppConfig,
    pub retriever: Arc<HybridRetriever>,
    pub chunker: Chunker,
    pub assembler: Arc<VerdictAssembler>,
    pub router: Arc<SubjectRouter>,
    pub hub: Arc<PushHub>,
    pub subject_state: Arc<SubjectStateRegistry>,
}
