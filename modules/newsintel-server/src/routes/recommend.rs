use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use newsintel_common::Verdict;

use crate::state::AppState;

/// Synchronously assembles and returns the current verdict for `subject`.
/// Does not consult the subject state registry's cached value — callers
/// that want the cheap cached read should subscribe to the stream
/// instead (C12).
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Path(subject): Path<String>,
) -> Json<Verdict> {
    let subject = subject.to_uppercase();
    let verdict = state.assembler.assemble(&subject).await;
    Json(verdict)
}
