//! Claim-grounding strategy: local heuristic claim extraction, then one
//! fast grounding call per claim, compiled into a report locally with
//! weighted scoring. No synthesis LLM call.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::{info, warn};

use veracity_common::{AnalysisMode, Stage, VeracityError};

use crate::progress::ProgressSink;
use crate::providers::{ClaimJudgment, GroundingApi, Validity};
use crate::strategies::{heuristics, no_claims_body, Analyzer, RawAnalysis};

const SOURCE_CAP: usize = 15;
const MAX_CLAIMS: usize = 10;
/// Courtesy gap between per-claim calls.
const CALL_PACING: Duration = Duration::from_millis(200);

/// Score weights per verdict. Unverifiable sits well above false:
/// absence of coverage is not evidence of falsehood.
fn weight(validity: Validity) -> f64 {
    match validity {
        Validity::True => 100.0,
        Validity::PartiallyTrue => 60.0,
        Validity::Unverifiable => 40.0,
        Validity::False => 0.0,
    }
}

pub struct ClaimGrounding {
    grounding: Arc<dyn GroundingApi>,
    max_claims: usize,
}

impl ClaimGrounding {
    pub fn new(grounding: Arc<dyn GroundingApi>, max_claims: usize) -> Self {
        Self {
            grounding,
            max_claims: max_claims.min(MAX_CLAIMS),
        }
    }

    /// Fold per-claim judgments into the report shape the normalizer
    /// expects, with the weighted aggregate score.
    fn compile(&self, judged: &[(String, ClaimJudgment)]) -> String {
        let total = judged.len() as f64;
        let score = (judged
            .iter()
            .map(|(_, j)| weight(j.validity))
            .sum::<f64>()
            / total)
            .round() as i64;

        let false_count = judged
            .iter()
            .filter(|(_, j)| j.validity == Validity::False)
            .count();

        let mut issues = Vec::new();
        let mut verified_facts = Vec::new();
        let mut sources = Vec::new();
        for (claim, judgment) in judged {
            sources.extend(judgment.sources.iter().map(|s| {
                json!({"title": s.title, "url": s.url, "credibility": "medium"})
            }));
            match judgment.validity {
                Validity::True => verified_facts.push(json!({
                    "claim": claim,
                    "confidence": confidence_label(judgment.confidence),
                })),
                Validity::False => issues.push(json!({
                    "claim": claim,
                    "type": "Factual Error",
                    "severity": "high",
                    "the_problem": judgment.explanation,
                    "actual_facts": judgment.explanation,
                    "why_it_matters": "The article states this as fact.",
                })),
                Validity::PartiallyTrue => issues.push(json!({
                    "claim": claim,
                    "type": "Misleading",
                    "severity": "medium",
                    "the_problem": judgment.explanation,
                    "actual_facts": "",
                    "why_it_matters": "",
                })),
                Validity::Unverifiable => issues.push(json!({
                    "claim": claim,
                    "type": "Unverified",
                    "severity": "low",
                    "the_problem": judgment.explanation,
                    "actual_facts": "",
                    "why_it_matters": "",
                })),
            }
        }

        let verified = judged
            .iter()
            .filter(|(_, j)| j.validity == Validity::True)
            .count();
        let description = format!(
            "Checked {} claims: {} verified, {} could not be confirmed, {} found false.",
            judged.len(),
            verified,
            judged
                .iter()
                .filter(|(_, j)| j.validity == Validity::Unverifiable)
                .count(),
            false_count,
        );

        let status = veracity_common::ReportStatus::from_score(
            score.clamp(0, 100) as u8,
            false_count * 2 > judged.len(),
        );

        json!({
            "score": score,
            "status": serde_json::to_value(status).unwrap_or(json!("Unknown")),
            "description": description,
            "issues": issues,
            "verified_facts": verified_facts,
            "sources": sources,
        })
        .to_string()
    }
}

fn confidence_label(confidence: f32) -> &'static str {
    if confidence >= 0.8 {
        "high"
    } else if confidence >= 0.5 {
        "medium"
    } else {
        "low"
    }
}

#[async_trait]
impl Analyzer for ClaimGrounding {
    fn mode(&self) -> AnalysisMode {
        AnalysisMode::ClaimGrounding
    }

    async fn analyze(
        &self,
        content: &str,
        progress: &dyn ProgressSink,
    ) -> Result<RawAnalysis, VeracityError> {
        progress
            .update(10, Stage::Extracting, "Extracting factual claims...")
            .await;

        let claims = heuristics::extract_claims(content, self.max_claims);
        if claims.is_empty() {
            info!("No checkable claims extracted");
            return Ok(RawAnalysis::new(no_claims_body(), SOURCE_CAP));
        }

        let total = claims.len();
        let mut judged = Vec::with_capacity(total);
        for (idx, claim) in claims.into_iter().enumerate() {
            let pct = 30 + (((idx + 1) as f64 / total as f64) * 60.0) as u8;
            progress
                .update(
                    pct,
                    Stage::Verifying,
                    format!("Grounding claim {} of {}", idx + 1, total).as_str(),
                )
                .await;

            let judgment = match self.grounding.ground(&claim).await {
                Ok(judgment) => judgment,
                Err(e) => {
                    warn!(claim = %claim, error = %e, "Grounding call failed");
                    ClaimJudgment::unverifiable("The verification service did not respond")
                }
            };
            judged.push((claim, judgment));

            if idx + 1 < total {
                tokio::time::sleep(CALL_PACING).await;
            }
        }

        progress
            .update(95, Stage::Generating, "Compiling results...")
            .await;

        Ok(RawAnalysis::new(self.compile(&judged), SOURCE_CAP))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CountingSink, MockGrounding};
    use veracity_common::Source;

    fn judgment(validity: Validity, confidence: f32) -> ClaimJudgment {
        ClaimJudgment {
            validity,
            confidence,
            explanation: "checked".to_string(),
            sources: vec![Source::new("Ref", "https://ref.example/a")],
        }
    }

    const ARTICLE: &str = "The city reported 300 new housing permits in June. \
        The mayor announced a transit expansion for 2027. \
        Officials confirmed the reservoir is at 40 percent capacity.";

    #[tokio::test]
    async fn weighted_scoring_over_mixed_verdicts() {
        let grounding = Arc::new(
            MockGrounding::new()
                .on_claim_containing("housing permits", judgment(Validity::True, 0.9))
                .on_claim_containing("transit expansion", judgment(Validity::Unverifiable, 0.2))
                .on_claim_containing("reservoir", judgment(Validity::False, 0.9)),
        );
        let strategy = ClaimGrounding::new(grounding.clone(), 10);
        let sink = CountingSink::new();

        let raw = strategy.analyze(ARTICLE, &sink).await.unwrap();
        assert_eq!(grounding.calls(), 3);

        let value: serde_json::Value = serde_json::from_str(&raw.body).unwrap();
        // (100 + 40 + 0) / 3
        assert_eq!(value["score"], 47);
        assert_eq!(value["issues"].as_array().unwrap().len(), 2);
        assert_eq!(value["verified_facts"].as_array().unwrap().len(), 1);
        assert_eq!(value["verified_facts"][0]["confidence"], "high");
    }

    #[tokio::test]
    async fn unverifiable_claims_become_low_severity_unverified_issues() {
        let grounding = Arc::new(
            MockGrounding::new().with_default(judgment(Validity::Unverifiable, 0.1)),
        );
        let strategy = ClaimGrounding::new(grounding, 10);
        let sink = CountingSink::new();

        let raw = strategy.analyze(ARTICLE, &sink).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw.body).unwrap();
        for issue in value["issues"].as_array().unwrap() {
            assert_eq!(issue["type"], "Unverified");
            assert_eq!(issue["severity"], "low");
        }
        // 40-weight verdicts across the board
        assert_eq!(value["score"], 40);
    }

    #[tokio::test]
    async fn grounding_failure_degrades_that_claim_only() {
        let grounding = Arc::new(
            MockGrounding::new()
                .with_default(judgment(Validity::True, 0.9))
                .failing_on("transit expansion"),
        );
        let strategy = ClaimGrounding::new(grounding.clone(), 10);
        let sink = CountingSink::new();

        let raw = strategy.analyze(ARTICLE, &sink).await.unwrap();
        assert_eq!(grounding.calls(), 3);
        let value: serde_json::Value = serde_json::from_str(&raw.body).unwrap();
        // (100 + 40 + 100) / 3
        assert_eq!(value["score"], 80);
        assert_eq!(value["issues"][0]["type"], "Unverified");
    }

    #[tokio::test]
    async fn content_without_claims_needs_no_grounding_calls() {
        let grounding = Arc::new(MockGrounding::new());
        let strategy = ClaimGrounding::new(grounding.clone(), 10);
        let sink = CountingSink::new();

        let raw = strategy.analyze("Lovely weather!", &sink).await.unwrap();
        assert!(raw.body.contains("100"));
        assert_eq!(grounding.calls(), 0);
    }
}
