//! Local text heuristics: satire markers and cheap claim extraction.
//!
//! Both run before any network call. Satire detection is a keyword
//! pre-check; claim extraction is the no-LLM path used by the
//! claim-grounding strategy.

use std::sync::LazyLock;

use regex::Regex;

static SATIRE_WORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(satire|satirical|parody|joke|humor|humorous|comedy|comedic|onion|babylonbee)\b")
        .unwrap()
});

static SATIRE_PHRASE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(not to be taken seriously|for entertainment purposes|fictional account)")
        .unwrap()
});

static OPINION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(i think|i believe|in my opinion|believe|seems|appears|might|maybe|perhaps|probably|should|feel|felt|hopefully)\b")
        .unwrap()
});

static FACTUAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(is|are|was|were|has|have|had|will|according to|reported|announced|confirmed|study|studies|data|survey|percent|million|billion|found|shows|showed)\b")
        .unwrap()
});

/// Sentence boundary: terminator followed by whitespace, so decimals
/// like "3.9" survive.
static SENTENCE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]\s+").unwrap());

const MIN_CLAIM_CHARS: usize = 20;
const MAX_CLAIM_CHARS: usize = 250;

pub fn is_satire(content: &str) -> bool {
    SATIRE_WORD_RE.is_match(content) || SATIRE_PHRASE_RE.is_match(content)
}

/// Sentence-level claim extraction. Keeps declarative sentences of
/// plausible length that carry a factual indicator and no opinion
/// marker. Questions never qualify.
pub fn extract_claims(content: &str, max_claims: usize) -> Vec<String> {
    let mut claims = Vec::new();
    for raw in SENTENCE_RE.split(content) {
        if claims.len() >= max_claims {
            break;
        }
        let sentence = raw.trim().trim_end_matches(['.', '!']).trim();
        if sentence.len() < MIN_CLAIM_CHARS || sentence.len() > MAX_CLAIM_CHARS {
            continue;
        }
        if sentence.contains('?') {
            continue;
        }
        if OPINION_RE.is_match(sentence) {
            continue;
        }
        if !FACTUAL_RE.is_match(sentence) {
            continue;
        }
        claims.push(sentence.to_string());
    }
    claims
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn satire_keywords_match() {
        assert!(is_satire("This absurd onion-style joke went viral"));
        assert!(is_satire("A SATIRICAL take on city politics"));
        assert!(is_satire("This story is for entertainment purposes only"));
        assert!(!is_satire("The city council approved the budget on Tuesday"));
    }

    #[test]
    fn extracts_factual_declarative_sentences() {
        let content = "The unemployment rate was 3.9 percent in July. \
            I think the economy feels shaky. \
            Is this sustainable? \
            According to the census, the city has 420,000 residents.";
        let claims = extract_claims(content, 10);
        assert_eq!(claims.len(), 2);
        assert!(claims[0].contains("unemployment rate"));
        assert!(claims[1].contains("census"));
    }

    #[test]
    fn short_and_overlong_sentences_are_skipped() {
        let short = "It is hot."; // under the length floor
        let long = format!("The report shows that {}.", "x".repeat(300));
        let content = format!("{short} {long}");
        assert!(extract_claims(&content, 10).is_empty());
    }

    #[test]
    fn claim_count_is_capped() {
        let content = "The station reported record rainfall in March. ".repeat(20);
        assert_eq!(extract_claims(&content, 8).len(), 8);
    }
}
