// Parser for free-form business-info documents
//
// Operators keep business details in loosely structured text files with
// `**섹션**` headers. This parser turns one of those documents into a
// BusinessProfile; malformed input is a recoverable typed error, never a
// crash.

use crate::models::{BusinessProfile, MenuItem};
use crate::style::derive_short_name;
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("no section headers found; expected '**섹션**' delimited sections")]
    NoSections,

    #[error("required section '{0}' is missing or empty")]
    MissingSection(&'static str),
}

fn price_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+,?\d*원").unwrap())
}

/// Parse a `- 메뉴명 12,000원` style row into a menu item. Rows without a
/// recognizable price are kept price-less.
fn parse_menu_row(row: &str) -> Option<MenuItem> {
    let row = row.strip_prefix('-')?.trim();
    if row.is_empty() {
        return None;
    }
    match price_re().find(row) {
        Some(m) => {
            let name = row[..m.start()].trim();
            if name.is_empty() {
                None
            } else {
                Some(MenuItem::with_price(name, m.as_str()))
            }
        }
        None => Some(MenuItem::new(row)),
    }
}

fn section_header(line: &str) -> Option<String> {
    let line = line.trim();
    if line.starts_with("**") && line.ends_with("**") && line.len() > 4 {
        Some(
            line.trim_matches('*')
                .trim_end_matches(':')
                .trim()
                .to_string(),
        )
    } else {
        None
    }
}

/// Parse a business-info document into a profile.
///
/// Unknown sections are ignored; the business name is the only section that
/// must be present.
pub fn parse_business_document(content: &str) -> Result<BusinessProfile, DocumentError> {
    let mut profile = BusinessProfile::default();
    let mut current_section = String::new();
    let mut saw_section = false;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(section) = section_header(line) {
            current_section = section;
            saw_section = true;
            continue;
        }

        match current_section.as_str() {
            "업체명" => {
                if profile.name.is_empty() {
                    profile.name = line.to_string();
                }
            }
            "SEO 키워드" => {
                profile.keywords.extend(
                    line.split(',')
                        .map(str::trim)
                        .filter(|k| !k.is_empty())
                        .map(str::to_string),
                );
            }
            "주소" => {
                // First line only, with trailing directions stripped
                if profile.address.is_empty() {
                    profile.address = line.split('-').next().unwrap_or(line).trim().to_string();
                }
            }
            "운영시간" => {
                if profile.hours.is_empty() {
                    profile.hours = line.to_string();
                } else {
                    profile.hours = format!("{}, {}", profile.hours, line);
                }
            }
            "전화번호" => {
                if profile.phone.is_empty() {
                    profile.phone = line.to_string();
                }
            }
            "전체메뉴" | "대표메뉴" => {
                if let Some(item) = parse_menu_row(line) {
                    profile.menu_items.push(item);
                }
            }
            "식사메뉴" => {
                if let Some(item) = parse_menu_row(line) {
                    profile.ordered_items.push(item);
                }
            }
            "분위기" => {
                if profile.atmosphere.is_empty() {
                    profile.atmosphere = line.to_string();
                }
            }
            "타겟 고객" => {
                if profile.target_customer.is_empty() {
                    profile.target_customer = line.to_string();
                }
            }
            "주차정보" => {
                if profile.parking_info.is_empty() {
                    profile.parking_info = line.to_string();
                } else {
                    profile.parking_info = format!("{}\n{}", profile.parking_info, line);
                }
            }
            "주요특징" => {
                if let Some(feature) = line.strip_prefix('-') {
                    let feature = feature.trim();
                    if !feature.is_empty() {
                        profile.features.push(feature.to_string());
                    }
                }
            }
            _ => {}
        }
    }

    if !saw_section {
        return Err(DocumentError::NoSections);
    }
    if profile.name.is_empty() {
        return Err(DocumentError::MissingSection("업체명"));
    }

    if profile.short_name.is_empty() {
        profile.short_name = derive_short_name(&profile.name);
    }

    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_DOC: &str = "\
**업체명**
예향한정식 목포보리굴비

**SEO 키워드**
목포 맛집, 보리굴비

**주소**
전남 목포시 평화로 12 - 2층 입구

**운영시간**
평일 10:00-21:00
주말 10:00-22:00

**전체메뉴**
- 보리굴비정식 15,000원
- 떡갈비정식 18,000원
- 계절반찬

**식사메뉴**
- 보리굴비정식 15,000원

**분위기**
한옥 느낌의 단정한 분위기

**타겟 고객**
가족 모임

**주차정보**
건물 뒤 공영주차장
30분 무료

**주요특징**
- [필수] 목포산 보리굴비
- 직접 담근 장아찌
";

    #[test]
    fn test_full_document_parsed() {
        let profile = parse_business_document(SAMPLE_DOC).unwrap();
        assert_eq!(profile.name, "예향한정식 목포보리굴비");
        assert_eq!(profile.short_name, "예향한정식");
        assert_eq!(profile.keywords, vec!["목포 맛집", "보리굴비"]);
        assert_eq!(profile.address, "전남 목포시 평화로 12");
        assert_eq!(profile.hours, "평일 10:00-21:00, 주말 10:00-22:00");
        assert_eq!(profile.menu_items.len(), 3);
        assert_eq!(profile.menu_items[0].name, "보리굴비정식");
        assert_eq!(profile.menu_items[0].price.as_deref(), Some("15,000원"));
        assert_eq!(profile.menu_items[2].name, "계절반찬");
        assert_eq!(profile.menu_items[2].price, None);
        assert_eq!(profile.ordered_items.len(), 1);
        assert_eq!(profile.atmosphere, "한옥 느낌의 단정한 분위기");
        assert_eq!(profile.parking_info, "건물 뒤 공영주차장\n30분 무료");
        assert_eq!(
            profile.features,
            vec!["[필수] 목포산 보리굴비", "직접 담근 장아찌"]
        );
        assert!(profile.validate().is_ok());
    }

    #[test]
    fn test_document_without_sections_rejected() {
        let err = parse_business_document("그냥 자유로운 메모입니다.\n섹션이 없어요.").unwrap_err();
        assert_eq!(err, DocumentError::NoSections);
    }

    #[test]
    fn test_document_without_name_rejected() {
        let doc = "**주소**\n서울 어딘가";
        let err = parse_business_document(doc).unwrap_err();
        assert_eq!(err, DocumentError::MissingSection("업체명"));
    }

    #[test]
    fn test_unknown_sections_ignored() {
        let doc = "**업체명**\n바다식당\n\n**웹사이트**\nhttps://example.com";
        let profile = parse_business_document(doc).unwrap();
        assert_eq!(profile.name, "바다식당");
    }

    #[test]
    fn test_section_header_with_colon() {
        let doc = "**업체명:**\n바다식당";
        let profile = parse_business_document(doc).unwrap();
        assert_eq!(profile.name, "바다식당");
    }

    #[test]
    fn test_menu_row_without_dash_ignored() {
        let doc = "**업체명**\n바다식당\n\n**전체메뉴**\n설명 문장입니다\n- 회덮밥 12,000원";
        let profile = parse_business_document(doc).unwrap();
        assert_eq!(profile.menu_items.len(), 1);
        assert_eq!(profile.menu_items[0].name, "회덮밥");
    }
}
