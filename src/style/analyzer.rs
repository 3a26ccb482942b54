// Heuristic style analysis over a source blog post

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// How many top sentence endings the fingerprint keeps.
const ENDINGS_KEPT: usize = 15;
/// How many matches a single expression pattern may contribute.
const MATCHES_PER_EXPRESSION: usize = 5;
/// How many top emotion tokens the fingerprint keeps.
const EMOTIONS_KEPT: usize = 10;
/// How many frequent line openers the auxiliary pass reports.
const OPENERS_KEPT: usize = 5;

/// The two embed markers a post may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    /// `(지도)`, where the map embed goes.
    Map,
    /// `(동영상)`, where the video embed goes.
    Video,
}

impl MarkerKind {
    /// The exact marker token.
    pub fn token(&self) -> &'static str {
        match self {
            MarkerKind::Map => "(지도)",
            MarkerKind::Video => "(동영상)",
        }
    }

    /// Opening prefix used to detect the token and its misspelled variants,
    /// e.g. `(지도삽입)`.
    pub fn prefix(&self) -> &'static str {
        match self {
            MarkerKind::Map => "(지도",
            MarkerKind::Video => "(동영상",
        }
    }
}

/// One occurrence of a marker in the source text.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerOccurrence {
    /// Zero-based line index.
    pub line_index: usize,
    /// Position as a fraction of the total line count, in `[0, 1]`.
    pub relative_position: f64,
    /// The previous, current, and next line joined by newlines.
    pub context: String,
}

/// Marker presence and positions found in the source text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkerInfo {
    pub has_map: bool,
    pub has_video: bool,
    pub map_positions: Vec<MarkerOccurrence>,
    pub video_positions: Vec<MarkerOccurrence>,
}

impl MarkerInfo {
    pub fn any(&self) -> bool {
        self.has_map || self.has_video
    }

    /// First occurrence of the given kind, if the source had one.
    pub fn first(&self, kind: MarkerKind) -> Option<&MarkerOccurrence> {
        match kind {
            MarkerKind::Map => self.map_positions.first(),
            MarkerKind::Video => self.video_positions.first(),
        }
    }
}

/// Extracted stylistic signature of a source text.
///
/// Computed once at the start of a conversion, consumed by the prompt builder
/// and the marker processor, and discarded with the conversion.
#[derive(Debug, Clone, Default)]
pub struct StyleFingerprint {
    /// Top sentence-final suffixes, most frequent first.
    pub endings: Vec<String>,
    /// Characteristic phrase fragments, deduplicated in first-seen order.
    pub expressions: Vec<String>,
    /// Emotion-bearing tokens ranked by frequency.
    pub emotions: Vec<String>,
    /// Human-readable auxiliary descriptions (frequent openers, average
    /// sentence length). Not used for marker placement.
    pub patterns: Vec<String>,
    pub markers: MarkerInfo,
}

impl StyleFingerprint {
    pub fn is_empty(&self) -> bool {
        self.endings.is_empty()
            && self.expressions.is_empty()
            && self.emotions.is_empty()
            && !self.markers.any()
    }

    /// Render the fingerprint for embedding into the conversion prompt.
    pub fn to_prompt_description(&self) -> String {
        let mut desc = Vec::new();

        if !self.endings.is_empty() {
            desc.push(format!("종결어미: {}", join_capped(&self.endings, 10)));
        }
        if !self.expressions.is_empty() {
            desc.push(format!("특징 표현: {}", join_capped(&self.expressions, 10)));
        }
        if !self.emotions.is_empty() {
            desc.push(format!("감정 표현: {}", join_capped(&self.emotions, 8)));
        }

        desc.join("\n")
    }
}

fn join_capped(items: &[String], cap: usize) -> String {
    items
        .iter()
        .take(cap)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ")
}

fn sentence_split_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.!?]+\s*").unwrap())
}

fn expression_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"\w+해서\s+\w+",
            r"\w+하고\s+\w+",
            r"\w+으니까?\s+\w+",
            r"\w+어도\s+\w+",
            r"정말\s+\w+",
            r"너무\s+\w+",
            r"\w+더라구요",
            r"\w+네요",
            r"\w+어요",
        ]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
    })
}

fn emotion_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"만족\w*",
            r"감동\w*",
            r"좋\w*",
            r"맛있\w*",
            r"최고\w*",
            r"추천\w*",
            r"인상\s*깊\w*",
            r"끝내\w*",
            r"훌륭\w*",
            r"즐겁\w*",
            r"행복\w*",
            r"놀라\w*",
            r"신선\w*",
            r"푸짐\w*",
            r"든든\w*",
            r"뿌듯\w*",
        ]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
    })
}

/// Characters that disqualify an ending or opener candidate (brackets and the
/// zero-width space that blog editors leave behind).
fn contains_noise_char(s: &str) -> bool {
    s.chars()
        .any(|c| matches!(c, '(' | ')' | '[' | ']' | '\u{200b}'))
}

/// Count occurrences and rank by descending frequency, breaking ties by
/// first-seen order.
fn rank_by_frequency(tokens: impl IntoIterator<Item = String>, keep: usize) -> Vec<String> {
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    for (seen_at, token) in tokens.into_iter().enumerate() {
        let entry = counts.entry(token).or_insert((0, seen_at));
        entry.0 += 1;
    }

    let mut ranked: Vec<(String, usize, usize)> = counts
        .into_iter()
        .map(|(token, (count, first))| (token, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked.into_iter().take(keep).map(|(t, _, _)| t).collect()
}

fn last_chars(s: &str, n: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    chars[chars.len().saturating_sub(n)..].iter().collect()
}

fn first_chars(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

/// Extracts the style fingerprint of a source text.
///
/// Pure and deterministic; pathological input produces an empty fingerprint
/// rather than an error.
pub struct StyleAnalyzer;

impl StyleAnalyzer {
    pub fn analyze(text: &str) -> StyleFingerprint {
        let mut fingerprint = StyleFingerprint::default();

        Self::extract_endings(text, &mut fingerprint);
        Self::extract_expressions(text, &mut fingerprint);
        Self::extract_emotions(text, &mut fingerprint);
        Self::analyze_patterns(text, &mut fingerprint);
        Self::analyze_markers(text, &mut fingerprint);

        fingerprint
    }

    fn extract_endings(text: &str, fingerprint: &mut StyleFingerprint) {
        let mut candidates = Vec::new();

        for sentence in sentence_split_re().split(text) {
            let sentence = sentence.trim();
            if sentence.chars().count() <= 5 {
                continue;
            }
            let ending = last_chars(sentence, 4);
            let ending = ending.trim();
            if !ending.is_empty() && !contains_noise_char(ending) {
                candidates.push(ending.to_string());
            }
        }

        fingerprint.endings = rank_by_frequency(candidates, ENDINGS_KEPT);
    }

    fn extract_expressions(text: &str, fingerprint: &mut StyleFingerprint) {
        let mut expressions = Vec::new();
        for pattern in expression_patterns() {
            for m in pattern.find_iter(text).take(MATCHES_PER_EXPRESSION) {
                expressions.push(m.as_str().to_string());
            }
        }

        // Deduplicate while preserving first-seen order
        let mut seen = std::collections::HashSet::new();
        fingerprint.expressions = expressions
            .into_iter()
            .filter(|e| seen.insert(e.clone()))
            .collect();
    }

    fn extract_emotions(text: &str, fingerprint: &mut StyleFingerprint) {
        let mut emotions = Vec::new();
        for pattern in emotion_patterns() {
            for m in pattern.find_iter(text) {
                emotions.push(m.as_str().to_string());
            }
        }

        fingerprint.emotions = rank_by_frequency(emotions, EMOTIONS_KEPT);
    }

    fn analyze_patterns(text: &str, fingerprint: &mut StyleFingerprint) {
        let mut patterns = Vec::new();

        // Frequent line openers
        let mut openers = Vec::new();
        for line in text.lines() {
            let line = line.trim();
            if line.chars().count() > 10 {
                let opener = first_chars(line, 7);
                let opener = opener.trim();
                if !opener.is_empty() && !contains_noise_char(opener) {
                    openers.push(opener.to_string());
                }
            }
        }

        let mut counts: HashMap<&String, usize> = HashMap::new();
        for opener in &openers {
            *counts.entry(opener).or_insert(0) += 1;
        }
        let repeated: Vec<String> = rank_by_frequency(
            openers
                .iter()
                .filter(|o| counts.get(o).copied().unwrap_or(0) > 1)
                .cloned(),
            OPENERS_KEPT,
        );
        if !repeated.is_empty() {
            patterns.push(format!("자주 시작하는 패턴: {}", repeated.join(", ")));
        }

        // Average sentence length
        let lengths: Vec<usize> = sentence_split_re()
            .split(text)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.chars().count())
            .collect();
        if !lengths.is_empty() {
            let avg = lengths.iter().sum::<usize>() / lengths.len();
            patterns.push(format!("평균 문장 길이: 약 {}자", avg));
        }

        fingerprint.patterns = patterns;
    }

    fn analyze_markers(text: &str, fingerprint: &mut StyleFingerprint) {
        let lines: Vec<&str> = text.lines().collect();
        if lines.is_empty() {
            return;
        }

        let mut info = MarkerInfo::default();
        for (i, line) in lines.iter().enumerate() {
            for kind in [MarkerKind::Map, MarkerKind::Video] {
                if !line.contains(kind.token()) {
                    continue;
                }
                let context = lines[i.saturating_sub(1)..(i + 2).min(lines.len())].join("\n");
                let occurrence = MarkerOccurrence {
                    line_index: i,
                    relative_position: i as f64 / lines.len() as f64,
                    context,
                };
                match kind {
                    MarkerKind::Map => {
                        info.has_map = true;
                        info.map_positions.push(occurrence);
                    }
                    MarkerKind::Video => {
                        info.has_video = true;
                        info.video_positions.push(occurrence);
                    }
                }
            }
        }

        fingerprint.markers = info;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "오늘은 일산에서 유명한 칼국수 집에 다녀왔어요. \
정말 맛있더라구요! 국물이 진해서 좋았어요. \
사장님도 친절하고 분위기도 좋았어요. 정말 맛있더라구요!\n\
가게 위치는 일산동구 중앙로에 있어요.\n\
(지도)\n\
다음에 또 방문하고 싶네요.";

    #[test]
    fn test_empty_input_yields_empty_fingerprint() {
        let fingerprint = StyleAnalyzer::analyze("");
        assert!(fingerprint.is_empty());
        assert!(fingerprint.patterns.is_empty());
    }

    #[test]
    fn test_endings_ranked_by_frequency() {
        let fingerprint = StyleAnalyzer::analyze(SAMPLE);
        assert!(!fingerprint.endings.is_empty());
        // "맛있더라구요!" appears twice, so its suffix must rank first
        assert_eq!(fingerprint.endings[0], "더라구요");
    }

    #[test]
    fn test_endings_skip_short_sentences_and_brackets() {
        let fingerprint = StyleAnalyzer::analyze("좋아요. (지도) 그리고 또 봐요.");
        assert!(fingerprint
            .endings
            .iter()
            .all(|e| !e.contains('(') && !e.contains(')')));
    }

    #[test]
    fn test_expressions_deduplicated_in_order() {
        let fingerprint = StyleAnalyzer::analyze(SAMPLE);
        let mut seen = std::collections::HashSet::new();
        for expr in &fingerprint.expressions {
            assert!(seen.insert(expr.clone()), "duplicate expression: {}", expr);
        }
        assert!(fingerprint
            .expressions
            .iter()
            .any(|e| e.starts_with("정말")));
    }

    #[test]
    fn test_emotions_found() {
        let fingerprint = StyleAnalyzer::analyze(SAMPLE);
        assert!(fingerprint.emotions.iter().any(|e| e.starts_with("맛있")));
        assert!(fingerprint.emotions.len() <= 10);
    }

    #[test]
    fn test_map_marker_position_and_context() {
        let fingerprint = StyleAnalyzer::analyze(SAMPLE);
        assert!(fingerprint.markers.has_map);
        assert!(!fingerprint.markers.has_video);
        let occurrence = fingerprint.markers.first(MarkerKind::Map).unwrap();
        assert_eq!(occurrence.line_index, 2);
        assert!(occurrence.relative_position > 0.0 && occurrence.relative_position < 1.0);
        assert!(occurrence.context.contains("(지도)"));
        assert!(occurrence.context.contains("중앙로"));
    }

    #[test]
    fn test_video_marker_detected() {
        let text = "메뉴가 다양해요.\n(동영상)\n끝.";
        let fingerprint = StyleAnalyzer::analyze(text);
        assert!(fingerprint.markers.has_video);
        assert_eq!(fingerprint.markers.video_positions.len(), 1);
    }

    #[test]
    fn test_prompt_description_sections() {
        let fingerprint = StyleAnalyzer::analyze(SAMPLE);
        let desc = fingerprint.to_prompt_description();
        assert!(desc.contains("종결어미:"));
        assert!(desc.contains("감정 표현:"));
    }

    #[test]
    fn test_analyze_is_deterministic() {
        let a = StyleAnalyzer::analyze(SAMPLE);
        let b = StyleAnalyzer::analyze(SAMPLE);
        assert_eq!(a.endings, b.endings);
        assert_eq!(a.expressions, b.expressions);
        assert_eq!(a.emotions, b.emotions);
    }
}
