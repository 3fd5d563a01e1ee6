// Each capability has a rule-based and an AI-backed variant, picked once
// when the `Analyzers` bundle is built.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

use crate::ai::{self, AiProvider};
use crate::config::Config;
use crate::error::Result;
use crate::matcher;
use crate::models::{
    CandidateProfile, CompanyIntel, CultureMatch, CultureType, MissionTarget, Pace, Severity,
    Structure, WorkStyle,
};
use crate::prompts::{CV_ANALYSIS_TEMPLATE, REALITY_CHECK_TEMPLATE, VACANCY_ANALYSIS_TEMPLATE};

const MAX_TOKENS: u32 = 2048;

// --- Traits ---

// Turns raw CV text into a candidate profile.
#[async_trait]
pub trait ProfileAnalyzer: Send + Sync {
    async fn analyze(&self, cv_text: &str) -> Result<CandidateProfile>;
}

// Compares a candidate with a company.
#[async_trait]
pub trait MatchAnalyzer: Send + Sync {
    async fn analyze(
        &self,
        candidate: &CandidateProfile,
        company: &CompanyIntel,
        target: &MissionTarget,
    ) -> Result<CultureMatch>;
}

// What a vacancy text reveals about the company behind it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VacancyInsights {
    pub sector: Option<String>,
    pub structure_type: Structure,
    pub work_pace: Pace,
    pub culture_indicators: Vec<String>,
    pub role_type: Option<WorkStyle>,
}

#[async_trait]
pub trait VacancyAnalyzer: Send + Sync {
    async fn analyze(&self, vacancy_text: &str) -> Result<VacancyInsights>;
}

// --- Rule-based variants ---

// Without enrichment the CV cannot be classified; the default profile is used.
pub struct DefaultProfileAnalyzer;

#[async_trait]
impl ProfileAnalyzer for DefaultProfileAnalyzer {
    async fn analyze(&self, cv_text: &str) -> Result<CandidateProfile> {
        debug!(chars = cv_text.len(), "building default profile");
        Ok(CandidateProfile {
            rationale: "No AI enrichment configured: default corporate profile assumed."
                .to_string(),
            ..Default::default()
        })
    }
}

pub struct RuleBasedMatchAnalyzer;

#[async_trait]
impl MatchAnalyzer for RuleBasedMatchAnalyzer {
    async fn analyze(
        &self,
        candidate: &CandidateProfile,
        company: &CompanyIntel,
        _target: &MissionTarget,
    ) -> Result<CultureMatch> {
        Ok(matcher::score(candidate, company))
    }
}

pub struct KeywordVacancyAnalyzer;

#[async_trait]
impl VacancyAnalyzer for KeywordVacancyAnalyzer {
    async fn analyze(&self, vacancy_text: &str) -> Result<VacancyInsights> {
        Ok(keyword_insights(vacancy_text))
    }
}

// Indicator groups, checked in this order.
const INDICATOR_GROUPS: [(&str, &[&str]); 6] = [
    (
        "flat",
        &[
            "plat",
            "platte organisatie",
            "geen managers",
            "zelfsturend",
            "holacracy",
            "flat organization",
            "flat hierarchy",
            "no managers",
            "self-managing",
        ],
    ),
    (
        "startup",
        &[
            "startup",
            "start-up",
            "scale-up",
            "snelgroeiend",
            "dynamisch",
            "fast-growing",
            "fast-paced",
        ],
    ),
    ("agile", &["agile", "scrum", "squads", "tribes", "spotify model"]),
    ("matrix", &["matrix", "business units", "divisies", "divisions", "corporate"]),
    (
        "hierarchical",
        &[
            "hiërarchie",
            "hiërarchisch",
            "hierarchy",
            "hierarchical",
            "afdelingen",
            "departments",
            "directie",
            "management layers",
        ],
    ),
    ("beheer", &["beheer", "maintenance", "administration", "legacy systems"]),
];

// True when `term` occurs in `haystack` at word boundaries, so "plat"
// does not match inside "platform".
fn contains_term(haystack: &str, term: &str) -> bool {
    haystack.match_indices(term).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + term.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

// Returns the names of all indicator groups with at least one hit.
pub fn detect_indicators(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    INDICATOR_GROUPS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|kw| contains_term(&lower, kw)))
        .map(|(group, _)| group.to_string())
        .collect()
}

pub fn infer_structure(indicators: &[String]) -> (Structure, Pace) {
    let has = |group: &str| indicators.iter().any(|i| i == group);
    if has("flat") || has("startup") {
        (Structure::Flat, Pace::Fast)
    } else if has("agile") {
        // agile inside a larger company usually means matrix
        (Structure::Matrix, Pace::Moderate)
    } else if has("matrix") {
        (Structure::Matrix, Pace::Slow)
    } else if has("hierarchical") {
        (Structure::Hierarchical, Pace::Slow)
    } else {
        (Structure::Unknown, Pace::Unknown)
    }
}

pub fn keyword_insights(vacancy_text: &str) -> VacancyInsights {
    let culture_indicators = detect_indicators(vacancy_text);
    let (structure_type, work_pace) = infer_structure(&culture_indicators);
    VacancyInsights {
        sector: None,
        structure_type,
        work_pace,
        culture_indicators,
        role_type: None,
    }
}

// --- AI-backed variants ---

fn to_score(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}

fn to_tolerance(value: f64) -> u8 {
    value.round().clamp(1.0, 10.0) as u8
}

#[derive(Debug, Deserialize)]
struct ProfileResponse {
    #[serde(default)]
    name: String,
    #[serde(default)]
    skills: Vec<String>,
    #[serde(default)]
    experience_years: f64,
    culture_type: CultureType,
    work_pace: Pace,
    structure_preference: Structure,
    builder_vs_maintainer: WorkStyle,
    chaos_tolerance: f64,
    autonomy_need: f64,
    #[serde(default)]
    reasoning: String,
}

pub struct AiProfileAnalyzer {
    provider: Arc<dyn AiProvider>,
}

impl AiProfileAnalyzer {
    pub fn new(provider: Arc<dyn AiProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl ProfileAnalyzer for AiProfileAnalyzer {
    async fn analyze(&self, cv_text: &str) -> Result<CandidateProfile> {
        let prompt = CV_ANALYSIS_TEMPLATE.replace("{cv_text}", cv_text);
        let response = self.provider.complete(&prompt, MAX_TOKENS).await?;
        let parsed: ProfileResponse = ai::parse_json_response(&response)?;

        let name = if parsed.name.trim().is_empty() {
            "Unknown".to_string()
        } else {
            parsed.name
        };

        Ok(CandidateProfile {
            name,
            skills: parsed.skills,
            experience_years: parsed.experience_years.max(0.0).round() as u32,
            culture_type: parsed.culture_type,
            work_pace: parsed.work_pace,
            structure_preference: parsed.structure_preference,
            builder_vs_maintainer: parsed.builder_vs_maintainer,
            chaos_tolerance: to_tolerance(parsed.chaos_tolerance),
            autonomy_need: to_tolerance(parsed.autonomy_need),
            rationale: parsed.reasoning,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WarningEntry {
    Text(String),
    Detailed { message: String },
}

#[derive(Debug, Deserialize)]
struct MatchResponse {
    fit_score: f64,
    structure_match: f64,
    pace_match: f64,
    #[serde(default)]
    autonomy_match: Option<f64>,
    #[serde(default)]
    warnings: Vec<WarningEntry>,
    #[serde(default)]
    deal_breakers: Vec<String>,
}

pub struct AiMatchAnalyzer {
    provider: Arc<dyn AiProvider>,
}

impl AiMatchAnalyzer {
    pub fn new(provider: Arc<dyn AiProvider>) -> Self {
        Self { provider }
    }
}

fn render_json(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

#[async_trait]
impl MatchAnalyzer for AiMatchAnalyzer {
    async fn analyze(
        &self,
        candidate: &CandidateProfile,
        company: &CompanyIntel,
        target: &MissionTarget,
    ) -> Result<CultureMatch> {
        let candidate_json = json!({
            "name": candidate.name,
            "culture_type": candidate.culture_type,
            "work_pace": candidate.work_pace,
            "structure_preference": candidate.structure_preference,
            "builder_vs_maintainer": candidate.builder_vs_maintainer,
            "chaos_tolerance": candidate.chaos_tolerance,
            "autonomy_need": candidate.autonomy_need,
        });
        let company_json = json!({
            "name": company.name,
            "sector": company.sector,
            "structure_type": company.structure_type,
            "work_pace": company.work_pace,
            "culture_indicators": company.culture_indicators,
        });

        let prompt = REALITY_CHECK_TEMPLATE
            .replace("{candidate_profile}", &render_json(&candidate_json))
            .replace("{company_intel}", &render_json(&company_json))
            .replace("{company_name}", &company.name)
            .replace("{job_title}", &target.job_title)
            .replace("{vacancy_url}", &target.vacancy_url);

        let response = self.provider.complete(&prompt, MAX_TOKENS).await?;
        let parsed: MatchResponse = ai::parse_json_response(&response)?;

        // Red-flag penalties and deal-breakers follow the rule-based path.
        let fit_score = matcher::apply_flag_penalty(
            to_score(parsed.fit_score),
            company.count_severity(Severity::High),
            company.count_severity(Severity::Medium),
        );
        let warnings = merge_unique(
            matcher::warnings(candidate, company),
            parsed.warnings.into_iter().map(|w| match w {
                WarningEntry::Text(message) | WarningEntry::Detailed { message } => message,
            }),
        );
        let deal_breakers = merge_unique(
            matcher::deal_breakers(candidate, company),
            parsed.deal_breakers,
        );

        Ok(CultureMatch {
            fit_score,
            warnings,
            structure_match: to_score(parsed.structure_match),
            pace_match: to_score(parsed.pace_match),
            autonomy_match: parsed
                .autonomy_match
                .map(to_score)
                .unwrap_or(matcher::NEUTRAL_SCORE),
            risk_level: matcher::risk_level(fit_score, deal_breakers.len()),
            deal_breakers,
        })
    }
}

// Appends non-blank `extra` entries that `base` does not already contain.
fn merge_unique(mut base: Vec<String>, extra: impl IntoIterator<Item = String>) -> Vec<String> {
    for item in extra {
        if !item.trim().is_empty() && !base.contains(&item) {
            base.push(item);
        }
    }
    base
}

#[derive(Debug, Deserialize)]
struct VacancyResponse {
    #[serde(default)]
    sector: Option<String>,
    structure_type: Structure,
    work_pace: Pace,
    #[serde(default)]
    culture_indicators: Vec<String>,
    #[serde(default)]
    role_type: Option<WorkStyle>,
}

pub struct AiVacancyAnalyzer {
    provider: Arc<dyn AiProvider>,
}

impl AiVacancyAnalyzer {
    pub fn new(provider: Arc<dyn AiProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl VacancyAnalyzer for AiVacancyAnalyzer {
    async fn analyze(&self, vacancy_text: &str) -> Result<VacancyInsights> {
        let prompt = VACANCY_ANALYSIS_TEMPLATE.replace("{vacancy_text}", vacancy_text);
        let response = self.provider.complete(&prompt, MAX_TOKENS).await?;
        let parsed: VacancyResponse = ai::parse_json_response(&response)?;

        Ok(VacancyInsights {
            sector: parsed.sector.filter(|s| !s.trim().is_empty()),
            structure_type: parsed.structure_type,
            work_pace: parsed.work_pace,
            culture_indicators: parsed.culture_indicators,
            role_type: parsed.role_type,
        })
    }
}

// --- Bundle ---

// The analysis strategy for one mission, fixed at construction.
#[derive(Clone)]
pub struct Analyzers {
    pub profile: Arc<dyn ProfileAnalyzer>,
    pub matching: Arc<dyn MatchAnalyzer>,
    pub vacancy: Arc<dyn VacancyAnalyzer>,
    backend: String,
}

impl Analyzers {
    pub fn rule_based() -> Self {
        Self {
            profile: Arc::new(DefaultProfileAnalyzer),
            matching: Arc::new(RuleBasedMatchAnalyzer),
            vacancy: Arc::new(KeywordVacancyAnalyzer),
            backend: "rule-based".to_string(),
        }
    }

    pub fn ai(provider: Arc<dyn AiProvider>) -> Self {
        Self {
            backend: provider.model_name().to_string(),
            profile: Arc::new(AiProfileAnalyzer::new(Arc::clone(&provider))),
            matching: Arc::new(AiMatchAnalyzer::new(Arc::clone(&provider))),
            vacancy: Arc::new(AiVacancyAnalyzer::new(provider)),
        }
    }

    // Uses the configured model when its API key is present. A missing key
    // is not an error: it selects the rule-based variants.
    pub fn from_config(config: &Config) -> Result<Self> {
        let spec = ai::resolve_model(&config.model)?;
        match config.api_key_for(&spec.provider) {
            Some(key) => {
                let provider = ai::create_provider(&spec, key, config.api_timeout)?;
                info!(model = %spec.model_id, "using AI-backed analysis");
                Ok(Self::ai(provider))
            }
            None => {
                info!(
                    "{} not set; using rule-based analysis",
                    spec.provider.api_key_var()
                );
                Ok(Self::rule_based())
            }
        }
    }

    pub fn backend(&self) -> &str {
        &self.backend
    }
}

impl std::fmt::Debug for Analyzers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzers").field("backend", &self.backend).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::tests::StubProvider;
    use crate::error::{SpyError, Stage};
    use crate::models::{RedFlag, RedFlagCategory, RiskLevel, Severity};

    fn target() -> MissionTarget {
        MissionTarget {
            company_name: "Acme".to_string(),
            job_title: "Engineer".to_string(),
            vacancy_url: "https://acme.example/jobs/1".to_string(),
        }
    }

    #[test]
    fn test_contains_term_respects_word_boundaries() {
        assert!(contains_term("een plat team", "plat"));
        assert!(!contains_term("our platform team", "plat"));
        assert!(contains_term("agile, scrum", "scrum"));
        assert!(contains_term("scale-up vibes", "scale-up"));
    }

    #[test]
    fn test_detect_indicators_in_group_order() {
        let found = detect_indicators("We work in Agile squads inside a fast-growing scale-up.");
        assert_eq!(found, vec!["startup".to_string(), "agile".to_string()]);
    }

    #[test]
    fn test_infer_structure_mapping() {
        let groups = |names: &[&str]| names.iter().map(|n| n.to_string()).collect::<Vec<_>>();
        assert_eq!(infer_structure(&groups(&["startup"])), (Structure::Flat, Pace::Fast));
        assert_eq!(
            infer_structure(&groups(&["agile", "matrix"])),
            (Structure::Matrix, Pace::Moderate)
        );
        assert_eq!(infer_structure(&groups(&["matrix"])), (Structure::Matrix, Pace::Slow));
        assert_eq!(
            infer_structure(&groups(&["hierarchical"])),
            (Structure::Hierarchical, Pace::Slow)
        );
        assert_eq!(infer_structure(&[]), (Structure::Unknown, Pace::Unknown));
    }

    #[test]
    fn test_keyword_insights_marks_maintenance_roles() {
        let insights =
            keyword_insights("Je bent verantwoordelijk voor het beheer van onze afdelingen.");
        assert!(insights.culture_indicators.contains(&"beheer".to_string()));
        assert_eq!(insights.structure_type, Structure::Hierarchical);
    }

    #[tokio::test]
    async fn test_default_profile_analyzer() {
        let profile = DefaultProfileAnalyzer.analyze("Jane Doe\nEngineer").await.unwrap();
        assert_eq!(profile.culture_type, CultureType::Corporate);
        assert_eq!(profile.chaos_tolerance, 5);
        assert!(!profile.rationale.is_empty());
    }

    #[tokio::test]
    async fn test_ai_profile_analyzer_parses_fenced_json() {
        let stub = Arc::new(StubProvider::replying(
            "```json\n{\"name\": \"Jane Doe\", \"skills\": [\"Rust\"], \"experience_years\": 7, \
             \"culture_type\": \"scale-up\", \"work_pace\": \"fast\", \
             \"structure_preference\": \"flat\", \"builder_vs_maintainer\": \"builder\", \
             \"chaos_tolerance\": 12, \"autonomy_need\": 8, \"reasoning\": \"Short tenures\"}\n```",
        ));
        let analyzer = AiProfileAnalyzer::new(stub.clone());

        let profile = analyzer.analyze("CV text here").await.unwrap();

        assert_eq!(profile.name, "Jane Doe");
        assert_eq!(profile.culture_type, CultureType::ScaleUp);
        assert_eq!(profile.structure_preference, Structure::Flat);
        assert_eq!(profile.chaos_tolerance, 10);
        assert_eq!(profile.autonomy_need, 8);
        assert_eq!(profile.experience_years, 7);
        assert!(stub.prompts.lock().unwrap()[0].contains("CV text here"));
    }

    #[tokio::test]
    async fn test_ai_profile_missing_field_is_malformed() {
        let stub = Arc::new(StubProvider::replying(r#"{"name": "Jane", "work_pace": "fast"}"#));
        let err = AiProfileAnalyzer::new(stub).analyze("cv").await.unwrap_err();
        assert!(matches!(err, SpyError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn test_ai_failure_is_surfaced_not_swallowed() {
        let stub = Arc::new(StubProvider::new(vec![Err(SpyError::acquisition(
            Stage::Enrichment,
            "connection refused",
        ))]));
        let err = AiProfileAnalyzer::new(stub).analyze("cv").await.unwrap_err();
        assert!(matches!(err, SpyError::Acquisition { stage: Stage::Enrichment, .. }));
    }

    #[tokio::test]
    async fn test_ai_match_analyzer_clamps_and_derives_risk() {
        let stub = Arc::new(StubProvider::replying(
            r#"{"fit_score": 140, "risk_level": "high", "structure_match": 80.4,
                "pace_match": -5, "warnings": ["plain", {"type": "pace_mismatch",
                "severity": "high", "message": "detailed"}], "deal_breakers": []}"#,
        ));
        let analyzer = AiMatchAnalyzer::new(stub.clone());
        let company = CompanyIntel {
            name: "Acme".to_string(),
            red_flags: vec![RedFlag {
                category: RedFlagCategory::Layoffs,
                severity: Severity::High,
                headline: "Cuts".to_string(),
                source: String::new(),
                date: None,
                url: None,
            }],
            ..Default::default()
        };

        let result = analyzer
            .analyze(&CandidateProfile::default(), &company, &target())
            .await
            .unwrap();

        // 140 clamps to 100, then one high flag costs 15.
        assert_eq!(result.fit_score, 85);
        assert_eq!(result.structure_match, 80);
        assert_eq!(result.pace_match, 0);
        assert_eq!(result.autonomy_match, 50);
        assert_eq!(result.warnings, vec!["plain".to_string(), "detailed".to_string()]);
        assert_eq!(result.risk_level, RiskLevel::Low);

        let prompt = stub.prompts.lock().unwrap()[0].clone();
        assert!(!prompt.contains("red_flags_count"));
        assert!(prompt.contains("https://acme.example/jobs/1"));
    }

    #[tokio::test]
    async fn test_ai_match_analyzer_applies_red_flag_rules() {
        let stub = Arc::new(StubProvider::replying(
            r#"{"fit_score": 90, "structure_match": 90, "pace_match": 90,
                "warnings": [], "deal_breakers": []}"#,
        ));
        let flag = |category| RedFlag {
            category,
            severity: Severity::High,
            headline: "Bad news".to_string(),
            source: String::new(),
            date: None,
            url: None,
        };
        let company = CompanyIntel {
            name: "Acme".to_string(),
            red_flags: vec![
                flag(RedFlagCategory::Layoffs),
                flag(RedFlagCategory::Lawsuit),
                flag(RedFlagCategory::Financial),
            ],
            ..Default::default()
        };

        let result = AiMatchAnalyzer::new(stub)
            .analyze(&CandidateProfile::default(), &company, &target())
            .await
            .unwrap();

        assert_eq!(result.fit_score, 45);
        assert!(
            result
                .deal_breakers
                .contains(&"Multiple serious red flags found (3x)".to_string())
        );
        assert_eq!(result.risk_level, RiskLevel::High);
    }

    #[test]
    fn test_merge_unique_skips_blank_and_duplicates() {
        let merged = merge_unique(
            vec!["a".to_string()],
            vec!["a".to_string(), " ".to_string(), "b".to_string()],
        );
        assert_eq!(merged, vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn test_ai_vacancy_analyzer() {
        let stub = Arc::new(StubProvider::replying(
            r#"{"sector": "ICT", "structure_type": "matrix", "work_pace": "moderate",
                "culture_indicators": ["squads"], "role_type": "maintainer"}"#,
        ));
        let insights = AiVacancyAnalyzer::new(stub).analyze("vacancy").await.unwrap();
        assert_eq!(insights.sector.as_deref(), Some("ICT"));
        assert_eq!(insights.structure_type, Structure::Matrix);
        assert_eq!(insights.role_type, Some(WorkStyle::Maintainer));
    }

    #[test]
    fn test_from_config_without_key_is_rule_based() {
        let config = Config::default();
        let analyzers = Analyzers::from_config(&config).unwrap();
        assert_eq!(analyzers.backend(), "rule-based");
    }

    #[test]
    fn test_from_config_with_key_is_ai() {
        let config = Config {
            anthropic_api_key: Some("test-key".to_string()),
            model: "api-sonnet".to_string(),
            ..Default::default()
        };
        let analyzers = Analyzers::from_config(&config).unwrap();
        assert_eq!(analyzers.backend(), "claude-sonnet-4-5-20250929");
    }

    #[test]
    fn test_from_config_unknown_model_is_error() {
        let config = Config {
            model: "nonexistent".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            Analyzers::from_config(&config),
            Err(SpyError::Config { .. })
        ));
    }
}
