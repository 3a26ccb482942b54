// Prompt assembly for body generation and title generation

use crate::features::FeatureSelector;
use crate::models::{BusinessProfile, MenuItem};
use crate::style::{MarkerKind, StyleFingerprint};
use rand::rngs::StdRng;

/// Fallback relative positions (percent of the document) used when the
/// source carried no markers.
const FALLBACK_MAP_PERCENT: u32 = 80;
const FALLBACK_VIDEO_PERCENT: u32 = 60;

fn render_menu(items: &[MenuItem]) -> String {
    items
        .iter()
        .map(MenuItem::render)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Assembles the conversion prompt and the title prompt.
///
/// Deterministic given the state of the random generator threaded through
/// feature selection.
pub struct PromptBuilder {
    selector: FeatureSelector,
}

impl PromptBuilder {
    pub fn new(selector: FeatureSelector) -> Self {
        Self { selector }
    }

    /// Build the prompt that asks the model to rewrite the source post for a
    /// new business while keeping its voice.
    pub fn build_conversion_prompt(
        &self,
        source_text: &str,
        fingerprint: &StyleFingerprint,
        profile: &BusinessProfile,
        rng: &mut StdRng,
    ) -> String {
        let location = profile.location_name();
        let all_menu = render_menu(&profile.menu_items);
        let ordered_menu = render_menu(&profile.ordered_items);
        let selected_features = self.selector.select(&profile.features, rng);

        let menu_line = if all_menu.is_empty() {
            selected_features.first().cloned().unwrap_or_default()
        } else {
            all_menu.clone()
        };
        let ordered_line = if ordered_menu.is_empty() {
            "메뉴 정보 없음".to_string()
        } else {
            ordered_menu.clone()
        };
        let keyword_line = profile
            .keywords
            .iter()
            .take(5)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");

        let mut prompt = format!(
            r#"다음 블로그를 정확히 분석하고, 동일한 말투와 감성으로 새로운 업체를 소개해주세요.

[원본 블로그]
{source}

[원본의 말투 특징]
{style}

[새로운 업체 정보]
업체명: {name}
위치: {location} ({address})
전체 메뉴: {menu}
실제 주문한 메뉴: {ordered}
운영시간: {hours}
전화번호: {phone}
특징: {features}
분위기: {atmosphere}
타겟 고객: {target}
주차 정보: {parking}
SEO 키워드: {keywords}

[변환 규칙]
1. 원본과 100% 동일한 말투 유지 (종결어미, 감탄사, 구어체 표현)
2. 원본과 동일한 감정 표현과 감성 유지
3. 원본과 비슷한 문장 길이와 리듬 유지
4. 원본의 특징적인 표현들을 그대로 활용
5. 글자수: 1,350자 (±150자) - 반드시 1,200-1,500자 사이로 작성
6. SEO 키워드를 자연스럽게 5-7회 분산
7. 제목은 작성하지 말고 본문만 작성하세요 (제목은 별도로 생성됩니다)
8. 원본이 길더라도 핵심 내용을 압축하여 지정된 글자수를 준수하세요"#,
            source = source_text,
            style = fingerprint.to_prompt_description(),
            name = profile.name,
            location = location,
            address = profile.address,
            menu = menu_line,
            ordered = ordered_line,
            hours = profile.hours,
            phone = profile.phone,
            features = selected_features.join(", "),
            atmosphere = profile.atmosphere,
            target = profile.target_customer,
            parking = profile.parking_info,
            keywords = keyword_line,
        );

        if !profile.ordered_items.is_empty() {
            prompt.push_str(&format!(
                r#"
9. 메뉴 작성 방법:
   - 처음에 전체 메뉴를 보고 다양함에 놀란 반응 표현
   - "메뉴가 정말 다양하더라구요", "메뉴판 보니 놀랍더라구여" 등
   - 고민 끝에 실제 주문한 메뉴({ordered})를 선택했다고 작성
   - 주문한 메뉴들에 대해서만 맛과 특징을 상세히 설명
   - 먹지 않은 메뉴는 "다음에 먹어보고 싶다" 정도로만 언급"#,
                ordered = ordered_menu,
            ));
        }

        if fingerprint.markers.any() {
            prompt.push_str("\n10. 원본의 (지도), (동영상) 마커를 비슷한 위치에 포함하세요:");
            prompt.push_str(
                "\n   **중요: 정확히 (지도), (동영상) 형식으로만 작성하고, (지도삽입) 등의 변형은 사용하지 마세요**",
            );
            if let Some(occurrence) = fingerprint.markers.first(MarkerKind::Map) {
                prompt.push_str(&format!(
                    "\n   - (지도) 마커: 원본의 약 {}% 위치",
                    (occurrence.relative_position * 100.0) as u32
                ));
            }
            if let Some(occurrence) = fingerprint.markers.first(MarkerKind::Video) {
                prompt.push_str(&format!(
                    "\n   - (동영상) 마커: 원본의 약 {}% 위치",
                    (occurrence.relative_position * 100.0) as u32
                ));
            }
        } else {
            prompt.push_str(&format!(
                r#"
10. 다음 위치에 (지도), (동영상) 마커를 포함하세요:
   - (지도) 마커: 주소나 위치 정보 언급 후 또는 전체의 약 {map}% 지점
   - (동영상) 마커: 메뉴나 분위기 설명 후 또는 전체의 약 {video}% 지점
   **중요: 정확히 (지도), (동영상) 형식으로만 작성하고, (지도삽입) 등의 변형은 사용하지 마세요**"#,
                map = FALLBACK_MAP_PERCENT,
                video = FALLBACK_VIDEO_PERCENT,
            ));
        }

        prompt.push_str(&format!(
            r#"

원본의 스타일을 완벽하게 모방하여 '{name}'을 소개하는 블로그를 작성하세요.
지역명은 '{location}'으로 통일하세요."#,
            name = profile.name,
            location = location,
        ));

        prompt
    }

    /// Build the prompt that asks the model for a post title.
    pub fn build_title_prompt(&self, keyword: &str, profile: &BusinessProfile) -> String {
        let name_to_use = profile.effective_short_name();

        let key_features: Vec<String> = profile.features.iter().take(2).cloned().collect();
        let features_line = if key_features.is_empty() {
            "특별한 맛집".to_string()
        } else {
            key_features.join(", ")
        };

        let main_menu = profile
            .ordered_items
            .first()
            .or_else(|| profile.menu_items.first())
            .map(|item| item.name.clone())
            .unwrap_or_default();
        let menu_line = if main_menu.is_empty() {
            "다양한 메뉴".to_string()
        } else {
            main_menu.clone()
        };
        let menu_example = if main_menu.is_empty() {
            "특별한 메뉴".to_string()
        } else {
            main_menu
        };

        format!(
            r#"블로그 제목을 생성해주세요.

정보:
- SEO 키워드: {keyword}
- 업체명: {name}
- 주요 특징: {features}
- 대표 메뉴: {menu}

요구사항:
1. 20-40자 이내로 작성
2. 키워드를 자연스럽게 포함
3. 업체명을 포함
4. 실제 방문 후기 느낌으로
5. 클릭하고 싶은 매력적인 제목
6. 제목 부호나 특수문자 사용하지 않기

예시:
- {keyword} {name}에서 든든한 한끼 식사
- {name} 방문기 {keyword} 추천
- {keyword} {name}의 {menu_example}

제목만 출력하세요 (한 줄에 하나, 번호 없이):"#,
            keyword = keyword,
            name = name_to_use,
            features = features_line,
            menu = menu_line,
            menu_example = menu_example,
        )
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(FeatureSelector::default())
    }
}
