//! Prompt builders for the backend strategies.
//!
//! Every prompt pins the current date (models default to their training
//! cutoff otherwise) and instructs the model to favor "Unverified" over
//! "Factual Error" when sources cannot be found, particularly for recent
//! events.

use chrono::Utc;

fn today() -> String {
    Utc::now().format("%B %d, %Y").to_string()
}

const SCORING_RUBRIC: &str = r#"Scoring rubric:
- 95-100: all claims verified accurate ("Verified")
- 85-94: minor issues only ("Mostly Accurate")
- 70-84: some problems worth flagging ("Needs Review")
- 50-69: significant accuracy problems ("Mixed Accuracy")
- 0-49: mostly or entirely false ("Multiple Errors" or "False")

Issue types: "Factual Error", "Outdated", "Misleading", "Unverified",
"Missing Context". A claim you cannot confirm is NOT a factual error:
use type "Unverified" with severity "low" or "medium", and do not
penalize it as heavily as a confirmed falsehood. This matters most for
events from the last few weeks, which your sources may not cover."#;

const REPORT_SHAPE: &str = r#"Return ONLY a JSON object, no prose, no markdown fences:
{
  "score": <integer 0-100>,
  "status": "<Verified|Mostly Accurate|Needs Review|Mixed Accuracy|Multiple Errors|False|Satire>",
  "description": "<2-3 sentence summary of your findings>",
  "issues": [{
    "claim": "<quoted text from the article>",
    "type": "<issue type>",
    "severity": "<high|medium|low>",
    "the_problem": "<what is wrong>",
    "actual_facts": "<what sources actually say>",
    "why_it_matters": "<impact on the reader>"
  }],
  "verified_facts": [{"claim": "<quoted text>", "confidence": "<high|medium|low>"}],
  "sources": [{"title": "<name>", "url": "<https url>", "credibility": "<high|medium|low>"}]
}"#;

/// Single-shot prompt: identify and judge claims in one pass using the
/// model's own web search.
pub fn quick_search(content: &str) -> String {
    format!(
        "Today's date is {date}. You are a fact-checker. Use web search to \
verify the factual claims in the article below. First decide whether the \
article is satire; if so return score 100 and status \"Satire\" with no \
issues.\n\n{rubric}\n\n{shape}\n\nArticle:\n{content}",
        date = today(),
        rubric = SCORING_RUBRIC,
        shape = REPORT_SHAPE,
    )
}

/// Phase-1 extraction: classify the content, then list verifiable claims
/// with a search query each.
pub fn extract_claims(content: &str, max_claims: usize) -> String {
    format!(
        "Today's date is {date}. Read the article below and respond with \
ONLY a JSON object:\n{{\n  \"content_type\": \"<news|opinion|satire>\",\n  \
\"claims\": [{{\"claim\": \"<verbatim factual claim>\", \"search_query\": \
\"<short web search to verify it>\", \"importance\": \"<high|medium|low>\"}}]\n}}\n\
Classify satire carefully before extracting anything. List at most \
{max_claims} claims, most important first. Skip opinions and predictions.\n\n\
Article:\n{content}",
        date = today(),
    )
}

/// Phase-2 verification: judge one claim against scraped evidence.
pub fn verify_claim(claim: &str, evidence: &str) -> String {
    format!(
        "Today's date is {date}. Judge the claim below strictly against the \
provided source material. If the material does not settle it, say \
\"unverified\" rather than guessing. Respond with ONLY a JSON object:\n\
{{\"is_accurate\": \"<true|false|partially_true|unverified>\", \
\"confidence\": \"<high|medium|low>\", \"correction\": \"<what the sources \
actually say, or empty>\", \"explanation\": \"<one sentence>\"}}\n\n\
Claim: {claim}\n\nSource material:\n{evidence}",
        date = today(),
    )
}

/// Phase-3 synthesis: fold per-claim judgments into the final report.
pub fn synthesize(content: &str, judgments: &str) -> String {
    format!(
        "Today's date is {date}. Below is an article and a list of per-claim \
verification judgments gathered from web sources. Produce the final \
fact-check report. Claims judged \"unverified\" must appear as type \
\"Unverified\" issues (severity at most medium), never as factual errors.\n\n\
{rubric}\n\n{shape}\n\nArticle:\n{content}\n\nJudgments:\n{judgments}",
        date = today(),
        rubric = SCORING_RUBRIC,
        shape = REPORT_SHAPE,
    )
}

/// One-call deep research prompt for the citation-returning backend.
pub fn research(content: &str) -> String {
    format!(
        "Today's date is {date}. Fact-check the article below. Search for \
current, authoritative coverage of each factual claim, then produce the \
report.\n\n{rubric}\n\n{shape}\n\nArticle:\n{content}",
        date = today(),
        rubric = SCORING_RUBRIC,
        shape = REPORT_SHAPE,
    )
}

/// Per-claim grounding prompt (structured output enforces the shape).
pub fn grounding_prompt(claim: &str) -> String {
    format!(
        "Today's date is {date}. Verify this claim against reliable web \
sources: \"{claim}\". Mark it \"unverifiable\" if you cannot find \
sources that settle it; do not treat absence of coverage as falsehood.",
        date = today(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompts_pin_the_current_date() {
        let year = Utc::now().format("%Y").to_string();
        assert!(quick_search("text").contains(&year));
        assert!(research("text").contains(&year));
        assert!(verify_claim("c", "e").contains(&year));
    }

    #[test]
    fn extraction_prompt_carries_the_claim_budget() {
        let prompt = extract_claims("text", 7);
        assert!(prompt.contains("at most 7 claims"));
    }

    #[test]
    fn report_shape_mentions_unverified_type() {
        assert!(SCORING_RUBRIC.contains("Unverified"));
        assert!(synthesize("a", "b").contains("never as factual errors"));
    }
}
