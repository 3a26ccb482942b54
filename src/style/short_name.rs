// Title-friendly short name derivation for business names

use regex::Regex;
use std::sync::OnceLock;

/// Well-known franchise names and their canonical short forms. A hit here
/// wins over every other rule.
const FRANCHISE_TABLE: &[(&str, &str)] = &[
    ("스타벅스", "스타벅스"),
    ("맥도날드", "맥도날드"),
    ("버거킹", "버거킹"),
    ("이디야", "이디야"),
    ("투썸플레이스", "투썸"),
    ("파리바게뜨", "파바"),
    ("뚜레쥬르", "뚜레쥬르"),
];

/// Suffixes that mark a trailing token as a branch designator. Longer
/// designators are listed first so `호점` is not shadowed by `점`.
const BRANCH_DESIGNATORS: &[&str] = &["DT점", "호점", "역점", "점포", "매장", "지점", "점"];

/// Menu or food-type words. When the first two words of a long name contain
/// one of these, only the first word survives ("예향한정식 목포보리굴비" →
/// "예향한정식").
const MENU_KEYWORDS: &[&str] = &[
    "굴비", "갈비", "삼겹살", "치킨", "피자", "커피", "베이커리", "국수", "칼국수", "냉면",
    "곰탕", "설렁탕", "해물", "회",
];

/// Maximum character length before the name is reduced to its first word.
const MAX_SHORT_NAME_CHARS: usize = 10;

fn paren_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\([^)]*\)").unwrap())
}

/// Derive a title-friendly short form of a business name.
///
/// Only used as a default when the stored short name is empty; callers may
/// always override the result.
pub fn derive_short_name(full_name: &str) -> String {
    // Franchise hits short-circuit everything else
    for (franchise, short) in FRANCHISE_TABLE {
        if full_name.contains(franchise) {
            return (*short).to_string();
        }
    }

    // Drop parenthesized segments, e.g. "한옥집 (본점)"
    let cleaned = paren_re().replace_all(full_name, "");
    let cleaned = cleaned.trim();

    // Drop a trailing branch-designator token, e.g. "대종칼국수 강남점"
    let mut words: Vec<&str> = cleaned.split_whitespace().collect();
    if words.len() > 1 {
        if let Some(last) = words.last() {
            if BRANCH_DESIGNATORS.iter().any(|d| last.ends_with(d)) {
                words.pop();
            }
        }
    }
    let cleaned = words.join(" ");

    let words: Vec<&str> = cleaned.split_whitespace().collect();
    if words.len() > 2 {
        let candidate = words[..2].join(" ");
        if MENU_KEYWORDS.iter().any(|k| candidate.contains(k)) {
            return words[0].to_string();
        }
        return candidate;
    }

    if cleaned.chars().count() > MAX_SHORT_NAME_CHARS {
        if let Some(first) = cleaned.split_whitespace().next() {
            return first.to_string();
        }
    }

    cleaned
}
