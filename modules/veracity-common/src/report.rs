use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// --- Backend mode ---

/// Which backend strategy produced a report. Selected by the `mode`
/// configuration string and carried on every report for audit/display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    /// Single OpenRouter call with the model's own web search.
    QuickSearch,
    /// Extract claims, search-and-scrape each one, verify, synthesize.
    DeepResearch,
    /// Local claim heuristics plus a fast grounding call per claim.
    ClaimGrounding,
    /// Single Perplexity call with citation-returning web search.
    Research,
}

impl AnalysisMode {
    /// Parse the configuration-store identifier for a mode.
    pub fn from_identifier(s: &str) -> Option<Self> {
        match s {
            "openrouter" => Some(AnalysisMode::QuickSearch),
            "firecrawl" => Some(AnalysisMode::DeepResearch),
            "jina" => Some(AnalysisMode::ClaimGrounding),
            "perplexity" => Some(AnalysisMode::Research),
            _ => None,
        }
    }

    /// Stable identifier used in cache keys and config.
    pub fn identifier(&self) -> &'static str {
        match self {
            AnalysisMode::QuickSearch => "openrouter",
            AnalysisMode::DeepResearch => "firecrawl",
            AnalysisMode::ClaimGrounding => "jina",
            AnalysisMode::Research => "perplexity",
        }
    }
}

impl std::fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.identifier())
    }
}

// --- Report vocabulary ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportStatus {
    Verified,
    #[serde(rename = "Mostly Accurate")]
    MostlyAccurate,
    #[serde(rename = "Needs Review")]
    NeedsReview,
    #[serde(rename = "Mixed Accuracy")]
    MixedAccuracy,
    #[serde(rename = "Multiple Errors")]
    MultipleErrors,
    False,
    Satire,
    Unknown,
    #[serde(rename = "Analysis Incomplete")]
    AnalysisIncomplete,
    Error,
}

impl ReportStatus {
    /// Map a score onto the status vocabulary. `false_majority` selects
    /// between False and MultipleErrors at the bottom of the scale.
    pub fn from_score(score: u8, false_majority: bool) -> Self {
        match score {
            95..=100 => ReportStatus::Verified,
            85..=94 => ReportStatus::MostlyAccurate,
            70..=84 => ReportStatus::NeedsReview,
            50..=69 => ReportStatus::MixedAccuracy,
            _ if false_majority => ReportStatus::False,
            _ => ReportStatus::MultipleErrors,
        }
    }

    /// Best-effort mapping of a free-form backend status string.
    /// Unrecognized strings return None; callers fall back to `from_score`.
    pub fn from_label(label: &str) -> Option<Self> {
        let l = label.trim().to_lowercase();
        match l.as_str() {
            "verified" | "accurate" => Some(ReportStatus::Verified),
            "mostly accurate" => Some(ReportStatus::MostlyAccurate),
            "needs review" | "partially accurate" => Some(ReportStatus::NeedsReview),
            "mixed accuracy" | "mixed" => Some(ReportStatus::MixedAccuracy),
            "multiple errors" | "mostly inaccurate" => Some(ReportStatus::MultipleErrors),
            "false" => Some(ReportStatus::False),
            "unknown" => Some(ReportStatus::Unknown),
            "analysis incomplete" => Some(ReportStatus::AnalysisIncomplete),
            "error" => Some(ReportStatus::Error),
            _ if l.contains("satire") || l.contains("parody") => Some(ReportStatus::Satire),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueType {
    #[serde(rename = "Factual Error")]
    FactualError,
    Outdated,
    Misleading,
    Unverified,
    #[serde(rename = "Missing Context")]
    MissingContext,
}

impl IssueType {
    pub fn from_label(label: &str) -> Option<Self> {
        let l = label.trim().to_lowercase();
        match l.as_str() {
            "factual error" => Some(IssueType::FactualError),
            "outdated" | "outdated information" => Some(IssueType::Outdated),
            "misleading" => Some(IssueType::Misleading),
            "unverified" => Some(IssueType::Unverified),
            "missing context" => Some(IssueType::MissingContext),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "low" => Some(Severity::Low),
            "medium" => Some(Severity::Medium),
            "high" => Some(Severity::High),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "low" => Some(Confidence::Low),
            "medium" => Some(Confidence::Medium),
            "high" => Some(Confidence::High),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Credibility {
    Low,
    Medium,
    High,
}

impl Credibility {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "low" => Some(Credibility::Low),
            "medium" => Some(Credibility::Medium),
            "high" => Some(Credibility::High),
            _ => None,
        }
    }
}

// --- Report records ---

/// A problem found in the analyzed content. Free-text fields are empty
/// strings rather than None when the backend omitted them, so consumers
/// never handle nulls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub claim: String,
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub severity: Severity,
    pub the_problem: String,
    pub actual_facts: String,
    pub why_it_matters: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiedFact {
    pub claim: String,
    pub confidence: Confidence,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub url: String,
    pub credibility: Credibility,
}

impl Source {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            credibility: Credibility::Medium,
        }
    }

    pub fn with_credibility(mut self, credibility: Credibility) -> Self {
        self.credibility = credibility;
        self
    }

    /// Only http(s) URLs count as citable sources.
    pub fn has_valid_url(&self) -> bool {
        self.url.starts_with("http://") || self.url.starts_with("https://")
    }
}

/// The canonical fact-check report. Constructed once per completed
/// analysis by the normalizer; immutable after it is written to cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub score: u8,
    pub status: ReportStatus,
    pub description: String,
    pub issues: Vec<Issue>,
    pub verified_facts: Vec<VerifiedFact>,
    pub sources: Vec<Source>,
    pub mode: AnalysisMode,
}

impl Report {
    /// Report for content classified as satire: perfect score, no issues,
    /// no sources, no verification calls behind it.
    pub fn satire(mode: AnalysisMode) -> Self {
        Report {
            score: 100,
            status: ReportStatus::Satire,
            description: "This is satirical content meant for entertainment.".to_string(),
            issues: Vec::new(),
            verified_facts: Vec::new(),
            sources: Vec::new(),
            mode,
        }
    }
}

/// Clamp an arbitrary numeric score into the report range.
pub fn clamp_score(raw: i64) -> u8 {
    raw.clamp(0, 100) as u8
}

// --- Content identity ---

/// Cache key: hex SHA-256 of the raw article text concatenated with the
/// mode identifier. Same content + same mode always hashes identically.
pub fn content_hash(text: &str, mode: AnalysisMode) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hasher.update(mode.identifier().as_bytes());
    hex::encode(hasher.finalize())
}
