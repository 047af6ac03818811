//! Hosted-LLM decision adapter: the one verdict collaborator genuinely
//! backed by a network call when `OPENROUTER_API_KEY` is configured.
//! Everything else in this crate runs standalone (§1).

use ai_client::openai::OpenAi;
use async_trait::async_trait;
use newsintel_common::Recommendation;
use schemars::JsonSchema;
use serde::Deserialize;

use crate::adapters::{DecisionAdapter, DecisionVerdict, RiskVerdict, SentimentVerdict, TechnicalVerdict};

#[derive(Debug, Deserialize, JsonSchema)]
struct LlmDecision {
    recommendation: LlmRecommendation,
    confidence: f64,
    reasoning: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
enum LlmRecommendation {
    Buy,
    Hold,
    Sell,
}

impl From<LlmRecommendation> for Recommendation {
    fn from(value: LlmRecommendation) -> Self {
        match value {
            LlmRecommendation::Buy => Recommendation::Buy,
            LlmRecommendation::Hold => Recommendation::Hold,
            LlmRecommendation::Sell => Recommendation::Sell,
        }
    }
}

/// Sends the sentiment/technical/risk reads to a hosted model over the
/// OpenRouter chat-completions API and asks it to return a structured
/// decision. A malformed or failed response propagates as an error —
/// the assembler (C10) is what applies the heuristic fallback.
pub struct OpenRouterDecisionAdapter {
    client: OpenAi,
}

impl OpenRouterDecisionAdapter {
    pub fn new(api_key: String, base_url: String, model: String) -> Self {
        Self {
            client: OpenAi::new(api_key, model).with_base_url(base_url),
        }
    }
}

#[async_trait]
impl DecisionAdapter for OpenRouterDecisionAdapter {
    async fn decide(
        &self,
        subject: &str,
        sentiment: &SentimentVerdict,
        technical: &TechnicalVerdict,
        risk: &RiskVerdict,
    ) -> anyhow::Result<DecisionVerdict> {
        let system_prompt = "You are a trading desk analyst. Given sentiment, technical, and \
             risk reads for a subject, return a BUY/HOLD/SELL recommendation with a confidence \
             in [0, 1] and one sentence of reasoning.";
        let user_prompt = format!(
            "Subject: {subject}\n\
             Sentiment score: {:.2} ({:?})\n\
             Technical score: {:.2} ({:?} signal)\n\
             Risk: {:?} (score {:.2})",
            sentiment.score, sentiment.label, technical.technical_score, technical.signal,
            risk.risk_level, risk.risk_score,
        );

        let decision: LlmDecision = self
            .client
            .extract(self.client.model(), system_prompt, user_prompt)
            .await?;

        Ok(DecisionVerdict {
            recommendation: decision.recommendation.into(),
            confidence: decision.confidence.clamp(0.0, 1.0),
            reasoning: decision.reasoning,
            primary_driver: "LLM".to_string(),
        })
    }
}
