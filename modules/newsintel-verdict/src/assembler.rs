//! The verdict assembler (C10): retrieves context for a subject, runs
//! the verdict adapter chain, and assembles the structured response.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use newsintel_common::{
    ArticleRef, Recommendation, RiskLevel, SentimentLabel, SubjectState, Verdict,
};
use newsintel_index::HybridRetriever;

use crate::adapters::{heuristic_fallback, DecisionAdapter, RiskAdapter, SentimentAdapter, TechnicalAdapter};
use crate::adapters::ReportAdapter;
use crate::state::SubjectStateRegistry;

const CONTEXT_K: usize = 5;

pub struct VerdictAssembler {
    retriever: Arc<HybridRetriever>,
    sentiment: Arc<dyn SentimentAdapter>,
    technical: Arc<dyn TechnicalAdapter>,
    risk: Arc<dyn RiskAdapter>,
    decision: Arc<dyn DecisionAdapter>,
    report: Option<Arc<dyn ReportAdapter>>,
    state: Arc<SubjectStateRegistry>,
}

impl VerdictAssembler {
    pub fn new(
        retriever: Arc<HybridRetriever>,
        sentiment: Arc<dyn SentimentAdapter>,
        technical: Arc<dyn TechnicalAdapter>,
        risk: Arc<dyn RiskAdapter>,
        decision: Arc<dyn DecisionAdapter>,
        report: Option<Arc<dyn ReportAdapter>>,
        state: Arc<SubjectStateRegistry>,
    ) -> Self {
        Self {
            retriever,
            sentiment,
            technical,
            risk,
            decision,
            report,
            state,
        }
    }

    pub async fn assemble(&self, subject: &str) -> Verdict {
        let started = Instant::now();
        let query = format!("{subject} stock news");
        let context = self.retriever.retrieve(&query, CONTEXT_K).await;

        let sentiment = match self.sentiment.analyze(subject, &context).await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(subject, error = %e, "sentiment adapter failed, using neutral default");
                crate::adapters::SentimentVerdict {
                    score: 0.0,
                    label: SentimentLabel::Neutral,
                    key_factors: Vec::new(),
                    confidence: 0.0,
                }
            }
        };

        let technical = match self.technical.analyze(subject).await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(subject, error = %e, "technical adapter failed, using neutral default");
                crate::adapters::TechnicalVerdict {
                    signal: Recommendation::Hold,
                    technical_score: 0.0,
                    indicators: Default::default(),
                    key_signals: Vec::new(),
                }
            }
        };

        let risk = match self.risk.analyze(subject, &technical).await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(subject, error = %e, "risk adapter failed, using neutral default");
                crate::adapters::RiskVerdict {
                    risk_level: RiskLevel::Medium,
                    risk_score: 0.5,
                    volatility_daily: 0.0,
                    volatility_annualized: 0.0,
                    suggested_position_size: 0.0,
                    stop_loss_pct: 0.0,
                }
            }
        };

        let decision = match self.decision.decide(subject, &sentiment, &technical, &risk).await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(subject, error = %e, "decision adapter failed, applying heuristic fallback");
                heuristic_fallback(sentiment.score, technical.technical_score)
            }
        };

        let report = if let Some(report_adapter) = &self.report {
            match report_adapter
                .render(subject, &sentiment, &technical, &risk, &decision)
                .await
            {
                Ok(r) => Some(newsintel_common::Report {
                    headline: r.headline,
                    narrative: r.narrative,
                    bullet_points: r.bullet_points,
                }),
                Err(e) => {
                    tracing::warn!(subject, error = %e, "report adapter failed, omitting report");
                    None
                }
            }
        } else {
            None
        };

        let mut key_factors = sentiment.key_factors.clone();
        key_factors.extend(technical.key_signals.clone());
        key_factors.truncate(5);

        let sources: Vec<ArticleRef> = context
            .into_iter()
            .map(|sc| sc.chunk.article)
            .take(5)
            .collect();

        let timestamp = Utc::now();
        self.state.update_if_newer(SubjectState {
            subject: subject.to_string(),
            score: sentiment.score,
            label: sentiment.label,
            last_updated: timestamp,
        });

        Verdict {
            subject: subject.to_string(),
            timestamp,
            recommendation: decision.recommendation,
            confidence: decision.confidence,
            sentiment_score: sentiment.score,
            sentiment_label: sentiment.label,
            technical_score: technical.technical_score,
            risk_score: risk.risk_score,
            risk_level: risk.risk_level,
            key_factors,
            sources,
            reasoning: decision.reasoning,
            primary_driver: decision.primary_driver,
            latency_ms: started.elapsed().as_millis() as u64,
            report,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{HeuristicDecisionAdapter, LexiconSentimentAdapter, SyntheticRiskAdapter, SyntheticTechnicalAdapter};
    use newsintel_index::{HashEmbedder, IndexStore};

    #[tokio::test]
    async fn assemble_returns_a_heuristic_verdict_with_no_configured_llm() {
        let store = Arc::new(IndexStore::new(Box::new(HashEmbedder::new(16))));
        let retriever = Arc::new(HybridRetriever::new(store, None, 60));
        let assembler = VerdictAssembler::new(
            retriever,
            Arc::new(LexiconSentimentAdapter),
            Arc::new(SyntheticTechnicalAdapter),
            Arc::new(SyntheticRiskAdapter),
            Arc::new(HeuristicDecisionAdapter),
            None,
            Arc::new(SubjectStateRegistry::new()),
        );

        let verdict = assembler.assemble("AAPL").await;
        assert_eq!(verdict.subject, "AAPL");
        assert_eq!(verdict.primary_driver, "Heuristic");
    }
}
