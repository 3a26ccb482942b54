// One end-to-end conversion: analyze → prompt → generate → repair → validate → title

use crate::client::{GenerationClient, GenerationParams};
use crate::config::Config;
use crate::features::FeatureSelector;
use crate::markers::MarkerProcessor;
use crate::models::BusinessProfile;
use crate::prompt::PromptBuilder;
use crate::style::StyleAnalyzer;
use crate::validator::{ResultValidator, ValidationReport};
use rand::rngs::StdRng;
use rand::Rng;
use std::collections::HashSet;
use std::time::Duration;

/// Defensive deadline for body generation; the title call uses the much
/// shorter configured timeout.
const BODY_TIMEOUT_SECS: u64 = 120;

/// Accepted title length bounds, in characters.
const TITLE_MIN_CHARS: usize = 20;
const TITLE_MAX_CHARS: usize = 40;

/// Where a conversion currently is. Transitions are strictly sequential;
/// any failure aborts the conversion from whatever stage it was in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionStage {
    Idle,
    Analyzing,
    BuildingPrompt,
    Generating,
    RepairingMarkers,
    Validating,
    GeneratingTitle,
    Done,
}

impl std::fmt::Display for ConversionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ConversionStage::Idle => "idle",
            ConversionStage::Analyzing => "analyzing",
            ConversionStage::BuildingPrompt => "building_prompt",
            ConversionStage::Generating => "generating",
            ConversionStage::RepairingMarkers => "repairing_markers",
            ConversionStage::Validating => "validating",
            ConversionStage::GeneratingTitle => "generating_title",
            ConversionStage::Done => "done",
        };
        write!(f, "{}", s)
    }
}

/// The product of one successful conversion.
#[derive(Debug, Clone)]
pub struct ConversionOutcome {
    /// Generated title; absent when the profile carried no keywords.
    pub title: Option<String>,
    /// Generated body with markers guaranteed present.
    pub body: String,
    pub validation: ValidationReport,
}

impl ConversionOutcome {
    /// The document form written to output files: title line, blank line,
    /// body.
    pub fn document(&self) -> String {
        match &self.title {
            Some(title) => format!("제목:{}\n\n{}", title, self.body),
            None => self.body.clone(),
        }
    }
}

/// Drives one conversion end to end against a completion client.
///
/// The engine owns the run-wide set of already-issued titles, so one engine
/// instance should live for a whole batch run; constructing a new engine
/// resets title-uniqueness tracking.
pub struct ConversionEngine {
    config: Config,
    prompt_builder: PromptBuilder,
    validator: ResultValidator,
    client: Box<dyn GenerationClient>,
    issued_titles: HashSet<String>,
    rng: StdRng,
}

impl ConversionEngine {
    pub fn new(config: Config, client: Box<dyn GenerationClient>) -> Self {
        let selector = FeatureSelector::new(config.feature_select_min, config.feature_select_max);
        let validator = ResultValidator {
            max_char_deviation: config.max_char_deviation,
            keyword_min: config.keyword_min,
            keyword_max: config.keyword_max,
        };
        let rng = FeatureSelector::rng(config.feature_seed);
        Self {
            prompt_builder: PromptBuilder::new(selector),
            validator,
            client,
            issued_titles: HashSet::new(),
            rng,
            config,
        }
    }

    /// Run the full pipeline for one source text and business profile.
    ///
    /// There is no partial-result return: any error from the completion
    /// service or the filesystem aborts the conversion and surfaces as the
    /// failed outcome.
    pub fn convert(
        &mut self,
        source_text: &str,
        profile: &BusinessProfile,
    ) -> Result<ConversionOutcome, String> {
        profile
            .validate()
            .map_err(|e| format!("invalid business profile: {}", e))?;

        let mut stage = ConversionStage::Analyzing;
        log::debug!("[Engine] stage: {}", stage);
        let fingerprint = StyleAnalyzer::analyze(source_text);
        if fingerprint.is_empty() {
            log::warn!("[Engine] source text produced an empty style fingerprint");
        }

        stage = ConversionStage::BuildingPrompt;
        log::debug!("[Engine] stage: {}", stage);
        let prompt = self.prompt_builder.build_conversion_prompt(
            source_text,
            &fingerprint,
            profile,
            &mut self.rng,
        );

        stage = ConversionStage::Generating;
        log::debug!("[Engine] stage: {}", stage);
        let params = GenerationParams {
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            timeout: Some(Duration::from_secs(BODY_TIMEOUT_SECS)),
        };
        let body = self.client.complete(&prompt, &params)?;

        stage = ConversionStage::RepairingMarkers;
        log::debug!("[Engine] stage: {}", stage);
        let body = MarkerProcessor::ensure_markers(&body, &fingerprint, profile);

        stage = ConversionStage::Validating;
        log::debug!("[Engine] stage: {}", stage);
        let validation = self.validator.validate(&body, source_text, profile);
        if !validation.length_ok {
            log::warn!(
                "[Engine] generated length deviates by {} chars from the source",
                validation.char_deviation
            );
        }
        if validation.has_repetition {
            log::warn!(
                "[Engine] generated text repeats {} sentence(s)",
                validation.repeated_sentences.len()
            );
        }

        stage = ConversionStage::GeneratingTitle;
        log::debug!("[Engine] stage: {}", stage);
        let title = profile
            .keywords
            .first()
            .cloned()
            .map(|keyword| self.generate_title(&keyword, profile));

        stage = ConversionStage::Done;
        log::debug!("[Engine] stage: {}", stage);

        Ok(ConversionOutcome {
            title,
            body,
            validation,
        })
    }

    /// Generate a title via the completion service, with one retry and a
    /// deterministic template fallback.
    ///
    /// This path never fails: a dead or slow title endpoint degrades to the
    /// template titles.
    fn generate_title(&mut self, keyword: &str, profile: &BusinessProfile) -> String {
        let prompt = self.prompt_builder.build_title_prompt(keyword, profile);
        let params = GenerationParams {
            model: self.config.title_model().to_string(),
            max_tokens: self.config.title_max_tokens,
            temperature: self.config.title_temperature,
            timeout: Some(Duration::from_secs(self.config.title_timeout_secs)),
        };

        // First attempt: full acceptance checks
        if let Some(candidate) = self.request_title(&prompt, &params) {
            let length = candidate.chars().count();
            if (TITLE_MIN_CHARS..=TITLE_MAX_CHARS).contains(&length)
                && candidate.contains(keyword)
                && !self.issued_titles.contains(&candidate)
            {
                self.issued_titles.insert(candidate.clone());
                return candidate;
            }
            log::debug!("[Engine] title candidate rejected: {}", candidate);
        }

        // One retry: accept on length alone
        if let Some(candidate) = self.request_title(&prompt, &params) {
            let length = candidate.chars().count();
            if (TITLE_MIN_CHARS..=TITLE_MAX_CHARS).contains(&length) {
                self.issued_titles.insert(candidate.clone());
                return candidate;
            }
            log::debug!("[Engine] retry title candidate rejected: {}", candidate);
        }

        self.fallback_title(keyword, profile)
    }

    /// One title call; errors and timeouts degrade to `None`.
    fn request_title(&self, prompt: &str, params: &GenerationParams) -> Option<String> {
        match self.client.complete(prompt, params) {
            Ok(raw) => raw
                .lines()
                .map(str::trim)
                .find(|line| !line.is_empty())
                .map(str::to_string),
            Err(e) => {
                log::warn!("[Engine] title generation failed: {}", e);
                None
            }
        }
    }

    /// Template-based title used when the completion service cannot produce
    /// an acceptable one.
    fn fallback_title(&mut self, keyword: &str, profile: &BusinessProfile) -> String {
        let name = profile.effective_short_name();
        let templates = [
            format!("{} {}에서 든든한 한끼 식사", keyword, name),
            format!("{} {} 방문 후기", keyword, name),
            format!("{} 맛집 탐방 {} 추천", name, keyword),
            format!("{} {}의 특별한 메뉴", keyword, name),
            format!("{}에서 만난 {}의 맛", name, keyword),
        ];

        let choice = self.rng.gen_range(0..templates.len());
        let title = templates[choice].clone();

        if title.chars().count() > TITLE_MAX_CHARS {
            return format!("{} {} 방문기", keyword, name);
        }
        title
    }
}
