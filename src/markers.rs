// Post-generation repair pass that guarantees embed markers are present

use crate::models::BusinessProfile;
use crate::style::{MarkerKind, StyleFingerprint};

/// Sentence-terminal characters, including the native terminal particles a
/// colloquial post ends sentences with.
const TERMINAL_CHARS: &[char] = &['.', '!', '?', '다', '요', '죠'];

/// Lines matching these substrings anchor the map marker.
const MAP_TRIGGERS: &[&str] = &["위치", "주소"];

/// Lines matching these substrings anchor the video marker.
const VIDEO_TRIGGERS: &[&str] = &["메뉴", "분위기", "인테리어", "맛있"];

/// Ensures both embed markers appear in the generated text.
///
/// Markers the model already produced (in exact or misspelled-variant form)
/// are left alone; missing ones are inserted at a plausible anchor. The map
/// marker is applied first and the video pass works on the already-modified
/// text, so the two insertions cannot interfere. Applying the processor twice
/// is a no-op.
pub struct MarkerProcessor;

impl MarkerProcessor {
    pub fn ensure_markers(
        text: &str,
        fingerprint: &StyleFingerprint,
        profile: &BusinessProfile,
    ) -> String {
        let mut result = text.to_string();

        for kind in [MarkerKind::Map, MarkerKind::Video] {
            // Any variant spelling counts as present; the prompt already
            // forbids variants, so a variant here is better left visible than
            // doubled up
            if result.contains(kind.prefix()) {
                continue;
            }
            log::debug!(
                "[Markers] {} missing from generated text (source had it: {}), inserting",
                kind.token(),
                match kind {
                    MarkerKind::Map => fingerprint.markers.has_map,
                    MarkerKind::Video => fingerprint.markers.has_video,
                }
            );
            result = Self::insert_marker(&result, kind, profile);
        }

        result
    }

    fn insert_marker(text: &str, kind: MarkerKind, profile: &BusinessProfile) -> String {
        let mut lines: Vec<String> = text.lines().map(str::to_string).collect();

        let address_head: String = profile.address.chars().take(10).collect();
        let mut triggers: Vec<&str> = match kind {
            MarkerKind::Map => MAP_TRIGGERS.to_vec(),
            MarkerKind::Video => VIDEO_TRIGGERS.to_vec(),
        };
        if kind == MarkerKind::Map && !address_head.is_empty() {
            triggers.push(&address_head);
        }

        let position = Self::find_insert_position(&lines, &triggers)
            .unwrap_or_else(|| Self::position_before_trailing_blanks(&lines));

        lines.insert(position, String::new());
        lines.insert(position + 1, kind.token().to_string());
        lines.insert(position + 2, String::new());

        lines.join("\n")
    }

    /// Find the first line containing any trigger and return the insertion
    /// index after it: directly after the line when it ends a sentence,
    /// otherwise at the next blank line.
    fn find_insert_position(lines: &[String], triggers: &[&str]) -> Option<usize> {
        for (i, line) in lines.iter().enumerate() {
            if !triggers.iter().any(|t| line.contains(t)) {
                continue;
            }
            let trimmed = line.trim();
            let ends_sentence = trimmed
                .chars()
                .last()
                .map(|c| TERMINAL_CHARS.contains(&c))
                .unwrap_or(false);
            let mut position = i + 1;
            if !ends_sentence {
                while position < lines.len() && !lines[position].trim().is_empty() {
                    position += 1;
                }
            }
            return Some(position);
        }
        None
    }

    /// Insertion index at the end of the document, before trailing blank
    /// lines.
    fn position_before_trailing_blanks(lines: &[String]) -> usize {
        let mut position = lines.len();
        while position > 0 && lines[position - 1].trim().is_empty() {
            position -= 1;
        }
        position
    }
}
