// Quality metrics over a generated post

use crate::models::BusinessProfile;
use crate::utils::stripped_char_count;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Default maximum allowed character deviation from the source.
pub const DEFAULT_MAX_CHAR_DEVIATION: usize = 200;
/// Default inclusive bounds for total keyword occurrences.
pub const DEFAULT_KEYWORD_MIN: usize = 5;
pub const DEFAULT_KEYWORD_MAX: usize = 10;
/// Sentences at or below this length are ignored by repetition detection.
const REPETITION_MIN_CHARS: usize = 20;

fn sentence_split_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.!?]+\s*").unwrap())
}

/// Metrics computed over one generated post.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    /// Generated length, whitespace-stripped.
    pub char_count: usize,
    /// Absolute difference from the source length.
    pub char_deviation: usize,
    pub length_ok: bool,
    /// Occurrence count per keyword, in keyword priority order.
    pub keyword_counts: Vec<(String, usize)>,
    pub keyword_total: usize,
    pub keyword_ok: bool,
    pub repeated_sentences: Vec<String>,
    pub has_repetition: bool,
}

/// Computes quality metrics for generated text. Pure; thresholds are
/// configurable defaults, not hard invariants.
#[derive(Debug, Clone)]
pub struct ResultValidator {
    pub max_char_deviation: usize,
    pub keyword_min: usize,
    pub keyword_max: usize,
}

impl Default for ResultValidator {
    fn default() -> Self {
        Self {
            max_char_deviation: DEFAULT_MAX_CHAR_DEVIATION,
            keyword_min: DEFAULT_KEYWORD_MIN,
            keyword_max: DEFAULT_KEYWORD_MAX,
        }
    }
}

impl ResultValidator {
    pub fn validate(
        &self,
        generated: &str,
        source: &str,
        profile: &BusinessProfile,
    ) -> ValidationReport {
        let char_count = stripped_char_count(generated);
        let source_count = stripped_char_count(source);
        let char_deviation = char_count.abs_diff(source_count);
        let length_ok = char_deviation < self.max_char_deviation;

        // Case-sensitive substring counts, no stemming
        let keyword_counts: Vec<(String, usize)> = profile
            .keywords
            .iter()
            .map(|keyword| (keyword.clone(), generated.matches(keyword.as_str()).count()))
            .collect();
        let keyword_total: usize = keyword_counts.iter().map(|(_, n)| n).sum();
        let keyword_ok = keyword_total >= self.keyword_min && keyword_total <= self.keyword_max;

        let mut seen = HashSet::new();
        let mut repeated_sentences = Vec::new();
        for sentence in sentence_split_re().split(generated) {
            let sentence = sentence.trim();
            if sentence.chars().count() <= REPETITION_MIN_CHARS {
                continue;
            }
            if !seen.insert(sentence.to_string()) {
                repeated_sentences.push(sentence.to_string());
            }
        }
        let has_repetition = !repeated_sentences.is_empty();

        ValidationReport {
            char_count,
            char_deviation,
            length_ok,
            keyword_counts,
            keyword_total,
            keyword_ok,
            repeated_sentences,
            has_repetition,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MenuItem;

    fn profile_with_keywords(keywords: Vec<&str>) -> BusinessProfile {
        BusinessProfile {
            name: "대종칼국수".to_string(),
            address: "일산동구".to_string(),
            keywords: keywords.into_iter().map(str::to_string).collect(),
            ordered_items: vec![MenuItem::new("칼국수")],
            features: vec!["육수".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_keyword_counts_and_range() {
        let profile = profile_with_keywords(vec!["일산 맛집", "칼국수"]);
        let generated = "일산 맛집 ".repeat(6);
        let source = generated.clone();
        let report = ResultValidator::default().validate(&generated, &source, &profile);

        assert_eq!(report.keyword_counts[0], ("일산 맛집".to_string(), 6));
        assert_eq!(report.keyword_counts[1], ("칼국수".to_string(), 0));
        assert_eq!(report.keyword_total, 6);
        assert!(report.keyword_ok);
        assert!(report.length_ok);
    }

    #[test]
    fn test_keyword_total_outside_range() {
        let profile = profile_with_keywords(vec!["맛집"]);
        let report = ResultValidator::default().validate("맛집 맛집", "원본", &profile);
        assert_eq!(report.keyword_total, 2);
        assert!(!report.keyword_ok);

        let saturated = "맛집 ".repeat(11);
        let report = ResultValidator::default().validate(&saturated, "원본", &profile);
        assert!(!report.keyword_ok);
    }

    #[test]
    fn test_length_deviation() {
        let profile = profile_with_keywords(vec![]);
        let source = "가".repeat(500);
        let generated = "나".repeat(350);
        let report = ResultValidator::default().validate(&generated, &source, &profile);
        assert_eq!(report.char_count, 350);
        assert_eq!(report.char_deviation, 150);
        assert!(report.length_ok);

        let generated = "나".repeat(290);
        let report = ResultValidator::default().validate(&generated, &source, &profile);
        assert_eq!(report.char_deviation, 210);
        assert!(!report.length_ok);
    }

    #[test]
    fn test_char_count_strips_whitespace() {
        let profile = profile_with_keywords(vec![]);
        let report = ResultValidator::default().validate("a b\nc", "a b\nc", &profile);
        assert_eq!(report.char_count, 3);
        assert_eq!(report.char_deviation, 0);
    }

    #[test]
    fn test_repetition_detected_for_long_sentences() {
        let profile = profile_with_keywords(vec![]);
        let long_sentence = "여기 국물이 정말 진하고 깊은 맛이 나더라구요";
        let generated = format!("{}. 짧은 문장. {}. 다른 이야기.", long_sentence, long_sentence);
        let report = ResultValidator::default().validate(&generated, "원본", &profile);
        assert!(report.has_repetition);
        assert_eq!(report.repeated_sentences, vec![long_sentence.to_string()]);
    }

    #[test]
    fn test_short_duplicates_ignored() {
        let profile = profile_with_keywords(vec![]);
        let generated = "맛있어요. 맛있어요. 맛있어요.";
        let report = ResultValidator::default().validate(generated, "원본", &profile);
        assert!(!report.has_repetition);
    }

    #[test]
    fn test_custom_thresholds() {
        let validator = ResultValidator {
            max_char_deviation: 50,
            keyword_min: 1,
            keyword_max: 2,
        };
        let profile = profile_with_keywords(vec!["맛집"]);
        let report = validator.validate("맛집", "맛집", &profile);
        assert!(report.keyword_ok);
        assert!(report.length_ok);
    }
}
