//! The external verdict collaborators (§6): sentiment, technical, risk,
//! decision, and the optional report renderer, plus the deterministic
//! heuristic fallback used whenever a configured adapter errors.
//!
//! No live price/volatility feed is wired into this repo (out of
//! scope), so the technical and risk adapters shipped here synthesize
//! their inputs deterministically from the subject symbol rather than
//! from real market data — swapping in a live feed means implementing
//! [`TechnicalAdapter`]/[`RiskAdapter`] against it, not touching C10.

use async_trait::async_trait;
use newsintel_common::{Recommendation, RiskLevel, ScoredChunk, SentimentLabel};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct SentimentVerdict {
    pub score: f64,
    pub label: SentimentLabel,
    pub key_factors: Vec<String>,
    pub confidence: f64,
}

#[derive(Debug, Clone)]
pub struct TechnicalVerdict {
    pub signal: Recommendation,
    pub technical_score: f64,
    pub indicators: HashMap<String, f64>,
    pub key_signals: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct RiskVerdict {
    pub risk_level: RiskLevel,
    pub risk_score: f64,
    pub volatility_daily: f64,
    pub volatility_annualized: f64,
    pub suggested_position_size: f64,
    pub stop_loss_pct: f64,
}

#[derive(Debug, Clone)]
pub struct DecisionVerdict {
    pub recommendation: Recommendation,
    pub confidence: f64,
    pub reasoning: String,
    pub primary_driver: String,
}

#[derive(Debug, Clone)]
pub struct ReportVerdict {
    pub headline: String,
    pub narrative: String,
    pub bullet_points: Vec<String>,
}

#[async_trait]
pub trait SentimentAdapter: Send + Sync {
    async fn analyze(&self, subject: &str, chunks: &[ScoredChunk]) -> anyhow::Result<SentimentVerdict>;
}

#[async_trait]
pub trait TechnicalAdapter: Send + Sync {
    async fn analyze(&self, subject: &str) -> anyhow::Result<TechnicalVerdict>;
}

#[async_trait]
pub trait RiskAdapter: Send + Sync {
    async fn analyze(&self, subject: &str, technical: &TechnicalVerdict) -> anyhow::Result<RiskVerdict>;
}

#[async_trait]
pub trait DecisionAdapter: Send + Sync {
    async fn decide(
        &self,
        subject: &str,
        sentiment: &SentimentVerdict,
        technical: &TechnicalVerdict,
        risk: &RiskVerdict,
    ) -> anyhow::Result<DecisionVerdict>;
}

#[async_trait]
pub trait ReportAdapter: Send + Sync {
    async fn render(
        &self,
        subject: &str,
        sentiment: &SentimentVerdict,
        technical: &TechnicalVerdict,
        risk: &RiskVerdict,
        decision: &DecisionVerdict,
    ) -> anyhow::Result<ReportVerdict>;
}

/// The exact degraded-mode formula (§7): `final = 0.6*sentiment + 0.4*technical`,
/// BUY above 0.3, SELL below -0.3, otherwise HOLD, confidence pinned at
/// 0.5, reasoning and primary_driver marked as heuristic.
pub fn heuristic_fallback(sentiment_score: f64, technical_score: f64) -> DecisionVerdict {
    let final_score = sentiment_score * 0.6 + technical_score * 0.4;
    let recommendation = if final_score > 0.3 {
        Recommendation::Buy
    } else if final_score < -0.3 {
        Recommendation::Sell
    } else {
        Recommendation::Hold
    };
    DecisionVerdict {
        recommendation,
        confidence: 0.5,
        reasoning: "Fallback logic used due to agent error.".to_string(),
        primary_driver: "Heuristic".to_string(),
    }
}

/// Counts simple positive/negative lexicon hits across the supplied
/// chunks. Deterministic, network-free; a hosted sentiment model is a
/// drop-in [`SentimentAdapter`] replacement.
pub struct LexiconSentimentAdapter;

const POSITIVE_WORDS: &[&str] = &[
    "beat", "beats", "surge", "surges", "growth", "record", "rally", "gain", "gains", "upgrade",
    "strong", "soar", "soars", "bullish", "outperform",
];
const NEGATIVE_WORDS: &[&str] = &[
    "miss", "misses", "plunge", "plunges", "decline", "loss", "losses", "downgrade", "weak",
    "crash", "bearish", "underperform", "lawsuit", "recall",
];

#[async_trait]
impl SentimentAdapter for LexiconSentimentAdapter {
    async fn analyze(&self, _subject: &str, chunks: &[ScoredChunk]) -> anyhow::Result<SentimentVerdict> {
        let mut positive = 0i64;
        let mut negative = 0i64;
        let mut key_factors = Vec::new();

        for scored in chunks {
            let lower = scored.chunk.text.to_lowercase();
            for word in POSITIVE_WORDS {
                if lower.contains(word) {
                    positive += 1;
                    if key_factors.len() < 5 {
                        key_factors.push(format!("positive signal: \"{word}\""));
                    }
                }
            }
            for word in NEGATIVE_WORDS {
                if lower.contains(word) {
                    negative += 1;
                    if key_factors.len() < 5 {
                        key_factors.push(format!("negative signal: \"{word}\""));
                    }
                }
            }
        }

        let total = (positive + negative).max(1) as f64;
        let score = ((positive - negative) as f64 / total).clamp(-1.0, 1.0);
        let label = if score > 0.15 {
            SentimentLabel::Bullish
        } else if score < -0.15 {
            SentimentLabel::Bearish
        } else {
            SentimentLabel::Neutral
        };
        let confidence = if chunks.is_empty() { 0.3 } else { 0.6 };

        Ok(SentimentVerdict {
            score,
            label,
            key_factors,
            confidence,
        })
    }
}

/// Deterministic stand-in for a technical-analysis feed: hashes the
/// subject into a stable pseudo-score in `[-1, 1]`. No live price
/// series is wired into this repo (out of scope); swap this adapter for
/// one backed by a real feed without touching C10.
pub struct SyntheticTechnicalAdapter;

fn stable_unit_score(seed: &str) -> f64 {
    let mut hasher = Sha256::new();
    hasher.update(seed.as_bytes());
    let digest = hasher.finalize();
    let value = u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]]);
    (value as f64 / u32::MAX as f64) * 2.0 - 1.0
}

#[async_trait]
impl TechnicalAdapter for SyntheticTechnicalAdapter {
    async fn analyze(&self, subject: &str) -> anyhow::Result<TechnicalVerdict> {
        let technical_score = stable_unit_score(&format!("technical:{subject}"));
        let signal = if technical_score > 0.3 {
            Recommendation::Buy
        } else if technical_score < -0.3 {
            Recommendation::Sell
        } else {
            Recommendation::Hold
        };
        let mut indicators = HashMap::new();
        indicators.insert("momentum".to_string(), technical_score);
        indicators.insert(
            "rsi_proxy".to_string(),
            50.0 + technical_score * 25.0,
        );

        Ok(TechnicalVerdict {
            signal,
            technical_score,
            indicators,
            key_signals: vec![format!("synthesized momentum proxy for {subject}")],
        })
    }
}

/// Derives a risk read from the technical adapter's synthesized
/// volatility proxy — same out-of-scope caveat as above.
pub struct SyntheticRiskAdapter;

#[async_trait]
impl RiskAdapter for SyntheticRiskAdapter {
    async fn analyze(&self, subject: &str, technical: &TechnicalVerdict) -> anyhow::Result<RiskVerdict> {
        let volatility_seed = stable_unit_score(&format!("volatility:{subject}")).abs();
        let volatility_daily = 0.005 + volatility_seed * 0.03;
        let volatility_annualized = volatility_daily * (252f64).sqrt();
        let risk_score = (volatility_seed + technical.technical_score.abs() / 2.0).clamp(0.0, 1.0);
        let risk_level = if risk_score > 0.66 {
            RiskLevel::High
        } else if risk_score > 0.33 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        };
        let suggested_position_size = (1.0 - risk_score).clamp(0.1, 1.0) * 0.1;
        let stop_loss_pct = (volatility_daily * 3.0).clamp(0.01, 0.2);

        Ok(RiskVerdict {
            risk_level,
            risk_score,
            volatility_daily,
            volatility_annualized,
            suggested_position_size,
            stop_loss_pct,
        })
    }
}

/// Always applies the deterministic heuristic formula; used when no
/// hosted LLM decision adapter is configured.
pub struct HeuristicDecisionAdapter;

#[async_trait]
impl DecisionAdapter for HeuristicDecisionAdapter {
    async fn decide(
        &self,
        _subject: &str,
        sentiment: &SentimentVerdict,
        technical: &TechnicalVerdict,
        _risk: &RiskVerdict,
    ) -> anyhow::Result<DecisionVerdict> {
        Ok(heuristic_fallback(sentiment.score, technical.technical_score))
    }
}

/// Renders a narrative summary from the four assembled verdict pieces.
/// Supplemental (§4.10): mirrors the original system's report agent.
pub struct TemplateReportAdapter;

#[async_trait]
impl ReportAdapter for TemplateReportAdapter {
    async fn render(
        &self,
        subject: &str,
        sentiment: &SentimentVerdict,
        technical: &TechnicalVerdict,
        risk: &RiskVerdict,
        decision: &DecisionVerdict,
    ) -> anyhow::Result<ReportVerdict> {
        let headline = format!("{subject}: {:?} ({:?} sentiment)", decision.recommendation, sentiment.label);
        let narrative = format!(
            "{subject} shows {:?} sentiment (score {:.2}) with a technical signal of {:?} \
             (score {:.2}) and {:?} risk (score {:.2}). Overall recommendation: {:?} \
             (confidence {:.0}%). {}",
            sentiment.label,
            sentiment.score,
            technical.signal,
            technical.technical_score,
            risk.risk_level,
            risk.risk_score,
            decision.recommendation,
            decision.confidence * 100.0,
            decision.reasoning,
        );
        let mut bullet_points = sentiment.key_factors.clone();
        bullet_points.extend(technical.key_signals.clone());
        bullet_points.truncate(5);

        Ok(ReportVerdict {
            headline,
            narrative,
            bullet_points,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heuristic_fallback_matches_exact_thresholds() {
        let buy = heuristic_fallback(1.0, 1.0);
        assert!(matches!(buy.recommendation, Recommendation::Buy));
        let sell = heuristic_fallback(-1.0, -1.0);
        assert!(matches!(sell.recommendation, Recommendation::Sell));
        let hold = heuristic_fallback(0.0, 0.0);
        assert!(matches!(hold.recommendation, Recommendation::Hold));
        assert_eq!(buy.confidence, 0.5);
        assert_eq!(buy.primary_driver, "Heuristic");
    }

    #[test]
    fn heuristic_fallback_boundary_is_exclusive() {
        // final = 0.6*0.5 = 0.3, not > 0.3, so HOLD.
        let boundary = heuristic_fallback(0.5, 0.0);
        assert!(matches!(boundary.recommendation, Recommendation::Hold));
    }

    #[tokio::test]
    async fn lexicon_sentiment_detects_positive_language() {
        let chunk = newsintel_common::Chunk::new(
            &make_article(),
            0,
            "Company reports record growth and a strong beat on earnings".into(),
            vec![],
        );
        let scored = ScoredChunk { chunk, score: 1.0 };
        let verdict = LexiconSentimentAdapter
            .analyze("AAPL", &[scored])
            .await
            .unwrap();
        assert!(verdict.score > 0.0);
        assert!(matches!(verdict.label, SentimentLabel::Bullish));
    }

    #[tokio::test]
    async fn synthetic_technical_adapter_is_deterministic() {
        let a = SyntheticTechnicalAdapter.analyze("AAPL").await.unwrap();
        let b = SyntheticTechnicalAdapter.analyze("AAPL").await.unwrap();
        assert_eq!(a.technical_score, b.technical_score);
    }

    fn make_article() -> newsintel_common::Article {
        let now = chrono::Utc::now();
        newsintel_common::Article {
            id: "a1".into(),
            title: "t".into(),
            description: "d".into(),
            content: "c".into(),
            source_name: "s".into(),
            canonical_url: "https://x/1".into(),
            published_at: now,
            image_url: None,
            first_seen_at: now,
        }
    }
}
