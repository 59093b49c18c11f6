//! Coerces raw backend output into the canonical [`Report`].
//!
//! Backends are LLMs: output may be fenced, partially structured, or not
//! JSON at all. The normalizer never fails — a completely unparseable
//! body becomes an "Analysis Incomplete" report carrying whatever
//! transport-level sources survived.

use serde_json::Value;
use tracing::warn;

use veracity_common::{
    clamp_score, AnalysisMode, Confidence, Credibility, Issue, IssueType, Report, ReportStatus,
    Severity, Source, VerifiedFact,
};

use crate::strategies::RawAnalysis;

/// Drop markdown code fences (``` / ```json) wrapping a JSON body.
pub fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

/// Best-effort extraction of the outermost JSON object from mixed prose.
fn extract_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

pub fn normalize(raw: &RawAnalysis, mode: AnalysisMode) -> Report {
    let body = strip_fences(&raw.body);
    let parsed = serde_json::from_str::<Value>(body)
        .ok()
        .or_else(|| extract_object(body).and_then(|s| serde_json::from_str(s).ok()));

    let Some(value) = parsed else {
        warn!(%mode, "Backend output was not parseable JSON");
        return Report {
            score: 50,
            status: ReportStatus::AnalysisIncomplete,
            description: "The analysis response could not be parsed. Results may be incomplete."
                .to_string(),
            issues: Vec::new(),
            verified_facts: Vec::new(),
            sources: sanitize_sources(raw.fallback_sources.clone(), raw.source_cap),
            mode,
        };
    };

    let score = coerce_score(value.get("score"));
    let issues = parse_issues(value.get("issues"));
    let verified_facts = parse_verified_facts(
        value
            .get("verified_facts")
            .or_else(|| value.get("verified_claims")),
    );

    let false_count = issues
        .iter()
        .filter(|i| i.issue_type == IssueType::FactualError)
        .count();
    let judged = issues.len() + verified_facts.len();
    let false_majority = judged > 0 && false_count * 2 > judged;

    let status = value
        .get("status")
        .and_then(Value::as_str)
        .and_then(ReportStatus::from_label)
        .unwrap_or_else(|| ReportStatus::from_score(score, false_majority));

    let description = value
        .get("description")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or("No description provided")
        .to_string();

    let body_sources = parse_sources(value.get("sources"));
    let merged = if raw.prepend_sources {
        // Transport citations outrank whatever the model embedded in its
        // body; dedup below keeps the first occurrence of each URL.
        let mut merged = raw.fallback_sources.clone();
        merged.extend(body_sources);
        merged
    } else if body_sources.is_empty() {
        raw.fallback_sources.clone()
    } else {
        body_sources
    };

    Report {
        score,
        status,
        description,
        issues,
        verified_facts,
        sources: sanitize_sources(merged, raw.source_cap),
        mode,
    }
}

/// Non-numeric scores coerce to 0; floats truncate toward zero.
fn coerce_score(value: Option<&Value>) -> u8 {
    let raw = match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().map(|f| f as i64),
        _ => None,
    };
    clamp_score(raw.unwrap_or(0))
}

fn parse_issues(value: Option<&Value>) -> Vec<Issue> {
    let Some(items) = value.and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let claim = str_field(item, "claim")?;
            let issue_type = item
                .get("type")
                .and_then(Value::as_str)
                .and_then(IssueType::from_label)
                .unwrap_or(IssueType::Unverified);
            let mut severity = item
                .get("severity")
                .and_then(Value::as_str)
                .and_then(Severity::from_label)
                .unwrap_or(Severity::Medium);
            // Unverified is not false: it never carries high severity.
            if issue_type == IssueType::Unverified {
                severity = severity.min(Severity::Medium);
            }
            Some(Issue {
                claim,
                issue_type,
                severity,
                the_problem: str_field_or(item, &["the_problem", "description"]),
                actual_facts: str_field_or(item, &["actual_facts", "correct_information"]),
                why_it_matters: str_field_or(item, &["why_it_matters"]),
            })
        })
        .collect()
}

fn parse_verified_facts(value: Option<&Value>) -> Vec<VerifiedFact> {
    let Some(items) = value.and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let claim = str_field(item, "claim")?;
            let confidence = item
                .get("confidence")
                .and_then(Value::as_str)
                .and_then(Confidence::from_label)
                .unwrap_or(Confidence::Medium);
            Some(VerifiedFact { claim, confidence })
        })
        .collect()
}

fn parse_sources(value: Option<&Value>) -> Vec<Source> {
    let Some(items) = value.and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let url = str_field(item, "url")?;
            let title = str_field_or(item, &["title"]);
            let credibility = item
                .get("credibility")
                .and_then(Value::as_str)
                .and_then(Credibility::from_label)
                .unwrap_or(Credibility::Medium);
            Some(Source::new(title, url).with_credibility(credibility))
        })
        .collect()
}

/// Drop non-http(s) URLs, dedup by exact URL keeping first-seen order,
/// cap at the backend's limit.
fn sanitize_sources(sources: Vec<Source>, cap: usize) -> Vec<Source> {
    let mut seen = std::collections::HashSet::new();
    sources
        .into_iter()
        .filter(|s| s.has_valid_url())
        .filter(|s| seen.insert(s.url.clone()))
        .take(cap)
        .collect()
}

fn str_field(item: &Value, key: &str) -> Option<String> {
    item.get(key)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// First non-empty string among aliased keys; empty string when none.
fn str_field_or(item: &Value, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|k| str_field(item, k))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(body: &str) -> RawAnalysis {
        RawAnalysis {
            body: body.to_string(),
            fallback_sources: Vec::new(),
            source_cap: 8,
            prepend_sources: false,
        }
    }

    #[test]
    fn strips_json_fences() {
        assert_eq!(strip_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_fences("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_fences("{\"a\":1}"), "{\"a\":1}");
    }

    #[test]
    fn full_report_passes_through() {
        let body = r#"{
            "score": 92,
            "status": "Mostly Accurate",
            "description": "Largely correct.",
            "issues": [{
                "claim": "GDP grew 8%",
                "type": "Factual Error",
                "severity": "high",
                "the_problem": "Growth was 2.1%",
                "actual_facts": "Official figures show 2.1%",
                "why_it_matters": "Overstates the economy"
            }],
            "verified_facts": [{"claim": "The sky is blue", "confidence": "high"}],
            "sources": [{"title": "BLS", "url": "https://bls.gov", "credibility": "high"}]
        }"#;
        let report = normalize(&raw(body), AnalysisMode::QuickSearch);
        assert_eq!(report.score, 92);
        assert_eq!(report.status, ReportStatus::MostlyAccurate);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].issue_type, IssueType::FactualError);
        assert_eq!(report.verified_facts[0].confidence, Confidence::High);
        assert_eq!(report.sources[0].credibility, Credibility::High);
        assert_eq!(report.mode, AnalysisMode::QuickSearch);
    }

    #[test]
    fn unparseable_body_yields_incomplete_report_with_fallbacks() {
        let mut input = raw("the model wrote prose instead of JSON");
        input.fallback_sources = vec![Source::new("AP", "https://apnews.com/x")];
        let report = normalize(&input, AnalysisMode::Research);
        assert_eq!(report.score, 50);
        assert_eq!(report.status, ReportStatus::AnalysisIncomplete);
        assert!(report.issues.is_empty());
        assert_eq!(report.sources.len(), 1);
    }

    #[test]
    fn object_embedded_in_prose_is_recovered() {
        let body = "Here is my analysis:\n{\"score\": 80, \"description\": \"ok\"}\nHope that helps!";
        let report = normalize(&raw(body), AnalysisMode::QuickSearch);
        assert_eq!(report.score, 80);
        assert_eq!(report.description, "ok");
    }

    #[test]
    fn missing_fields_get_defaults() {
        let report = normalize(&raw("{}"), AnalysisMode::QuickSearch);
        assert_eq!(report.score, 0);
        assert_eq!(report.description, "No description provided");
        assert!(report.issues.is_empty());
        assert!(report.verified_facts.is_empty());
        assert!(report.sources.is_empty());
    }

    #[test]
    fn score_coercion() {
        assert_eq!(normalize(&raw(r#"{"score": 150}"#), AnalysisMode::QuickSearch).score, 100);
        assert_eq!(normalize(&raw(r#"{"score": -3}"#), AnalysisMode::QuickSearch).score, 0);
        assert_eq!(normalize(&raw(r#"{"score": 87.9}"#), AnalysisMode::QuickSearch).score, 87);
        assert_eq!(normalize(&raw(r#"{"score": "63"}"#), AnalysisMode::QuickSearch).score, 63);
        assert_eq!(normalize(&raw(r#"{"score": "high"}"#), AnalysisMode::QuickSearch).score, 0);
    }

    #[test]
    fn status_falls_back_to_score_thresholds() {
        let report = normalize(&raw(r#"{"score": 97, "status": "Superb!!"}"#), AnalysisMode::QuickSearch);
        assert_eq!(report.status, ReportStatus::Verified);
    }

    #[test]
    fn issue_field_aliases_are_honored() {
        let body = r#"{"score": 60, "issues": [{
            "claim": "X happened",
            "type": "Misleading",
            "severity": "medium",
            "description": "Framed without context",
            "correct_information": "Y also happened"
        }]}"#;
        let report = normalize(&raw(body), AnalysisMode::DeepResearch);
        assert_eq!(report.issues[0].the_problem, "Framed without context");
        assert_eq!(report.issues[0].actual_facts, "Y also happened");
        assert_eq!(report.issues[0].why_it_matters, "");
    }

    #[test]
    fn unverified_issues_are_capped_at_medium_severity() {
        let body = r#"{"score": 70, "issues": [{
            "claim": "Recent event",
            "type": "Unverified",
            "severity": "high"
        }]}"#;
        let report = normalize(&raw(body), AnalysisMode::ClaimGrounding);
        assert_eq!(report.issues[0].issue_type, IssueType::Unverified);
        assert_eq!(report.issues[0].severity, Severity::Medium);
    }

    #[test]
    fn unknown_issue_type_defaults_to_unverified_not_factual_error() {
        let body = r#"{"score": 70, "issues": [{"claim": "A", "type": "weird"}]}"#;
        let report = normalize(&raw(body), AnalysisMode::QuickSearch);
        assert_eq!(report.issues[0].issue_type, IssueType::Unverified);
    }

    #[test]
    fn sources_deduped_validated_and_capped() {
        let body = r#"{"score": 90, "sources": [
            {"title": "A", "url": "https://a.example"},
            {"title": "A again", "url": "https://a.example"},
            {"title": "Bad", "url": "ftp://nope"},
            {"title": "B", "url": "https://b.example"},
            {"title": "C", "url": "https://c.example"}
        ]}"#;
        let mut input = raw(body);
        input.source_cap = 2;
        let report = normalize(&input, AnalysisMode::QuickSearch);
        assert_eq!(report.sources.len(), 2);
        assert_eq!(report.sources[0].url, "https://a.example");
        assert_eq!(report.sources[0].title, "A");
        assert_eq!(report.sources[1].url, "https://b.example");
    }

    #[test]
    fn fallback_sources_substitute_when_body_has_none() {
        let mut input = raw(r#"{"score": 90}"#);
        input.fallback_sources = vec![Source::new("Reuters", "https://reuters.com/a")];
        let report = normalize(&input, AnalysisMode::QuickSearch);
        assert_eq!(report.sources.len(), 1);
        assert_eq!(report.sources[0].title, "Reuters");
    }

    #[test]
    fn prepend_puts_transport_citations_first() {
        let body = r#"{"score": 90, "sources": [
            {"title": "Body", "url": "https://body.example"},
            {"title": "Cited dup", "url": "https://cite.example"}
        ]}"#;
        let mut input = raw(body);
        input.prepend_sources = true;
        input.fallback_sources = vec![Source::new("Citation", "https://cite.example")];
        let report = normalize(&input, AnalysisMode::Research);
        assert_eq!(report.sources[0].title, "Citation");
        assert_eq!(report.sources[1].title, "Body");
        assert_eq!(report.sources.len(), 2);
    }

    #[test]
    fn verified_claims_alias() {
        let body = r#"{"score": 95, "verified_claims": [{"claim": "B", "confidence": "low"}]}"#;
        let report = normalize(&raw(body), AnalysisMode::Research);
        assert_eq!(report.verified_facts.len(), 1);
        assert_eq!(report.verified_facts[0].confidence, Confidence::Low);
    }

    #[test]
    fn false_majority_selects_false_status() {
        let body = r#"{"score": 20, "issues": [
            {"claim": "A", "type": "Factual Error", "severity": "high"},
            {"claim": "B", "type": "Factual Error", "severity": "high"},
            {"claim": "C", "type": "Factual Error", "severity": "high"}
        ], "verified_facts": [{"claim": "D", "confidence": "high"}]}"#;
        let report = normalize(&raw(body), AnalysisMode::DeepResearch);
        assert_eq!(report.status, ReportStatus::False);
    }
}
