use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

// --- Enumerations ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CultureType {
    Startup,
    #[serde(rename = "scale-up")]
    ScaleUp,
    #[default]
    Corporate,
    Agency,
    Nonprofit,
}

// Organizational structure. Candidates state a preference, companies are
// observed; only the company side is expected to be `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Structure {
    Flat,
    Matrix,
    Hierarchical,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pace {
    Fast,
    Moderate,
    Slow,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkStyle {
    Builder,
    #[default]
    Optimizer,
    Maintainer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedFlagCategory {
    Layoffs,
    ToxicCulture,
    Lawsuit,
    Financial,
    Reorganization,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalaryPeriod {
    #[default]
    Month,
    Year,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketPosition {
    BelowMarket,
    #[default]
    AtMarket,
    AboveMarket,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Green,
    Yellow,
    Red,
}

impl Structure {
    pub fn as_str(&self) -> &'static str {
        match self {
            Structure::Flat => "flat",
            Structure::Matrix => "matrix",
            Structure::Hierarchical => "hierarchical",
            Structure::Unknown => "unknown",
        }
    }
}

impl Pace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pace::Fast => "fast",
            Pace::Moderate => "moderate",
            Pace::Slow => "slow",
            Pace::Unknown => "unknown",
        }
    }
}

impl CultureType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CultureType::Startup => "startup",
            CultureType::ScaleUp => "scale-up",
            CultureType::Corporate => "corporate",
            CultureType::Agency => "agency",
            CultureType::Nonprofit => "nonprofit",
        }
    }
}

impl WorkStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkStyle::Builder => "builder",
            WorkStyle::Optimizer => "optimizer",
            WorkStyle::Maintainer => "maintainer",
        }
    }
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl RedFlagCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedFlagCategory::Layoffs => "layoffs",
            RedFlagCategory::ToxicCulture => "toxic_culture",
            RedFlagCategory::Lawsuit => "lawsuit",
            RedFlagCategory::Financial => "financial",
            RedFlagCategory::Reorganization => "reorganization",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RedFlagCategory::Layoffs => "Layoffs",
            RedFlagCategory::ToxicCulture => "Toxic Culture",
            RedFlagCategory::Lawsuit => "Lawsuit",
            RedFlagCategory::Financial => "Financial",
            RedFlagCategory::Reorganization => "Reorganization",
        }
    }
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Green => "green",
            Verdict::Yellow => "yellow",
            Verdict::Red => "red",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Candidate ---

pub const MIN_TOLERANCE: u8 = 1;
pub const MAX_TOLERANCE: u8 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateProfile {
    pub name: String,
    pub skills: Vec<String>,
    pub experience_years: u32,
    pub culture_type: CultureType,
    pub work_pace: Pace,
    pub structure_preference: Structure,
    pub builder_vs_maintainer: WorkStyle,
    pub chaos_tolerance: u8, // 1-10
    pub autonomy_need: u8,   // 1-10
    pub rationale: String,
}

impl Default for CandidateProfile {
    fn default() -> Self {
        Self {
            name: String::new(),
            skills: Vec::new(),
            experience_years: 0,
            culture_type: CultureType::Corporate,
            work_pace: Pace::Moderate,
            structure_preference: Structure::Hierarchical,
            builder_vs_maintainer: WorkStyle::Optimizer,
            chaos_tolerance: 5,
            autonomy_need: 5,
            rationale: String::new(),
        }
    }
}

impl CandidateProfile {
    // Pulls both tolerances back into `MIN_TOLERANCE..=MAX_TOLERANCE`.
    pub fn normalized(mut self) -> Self {
        self.chaos_tolerance = self.chaos_tolerance.clamp(MIN_TOLERANCE, MAX_TOLERANCE);
        self.autonomy_need = self.autonomy_need.clamp(MIN_TOLERANCE, MAX_TOLERANCE);
        self
    }
}

// --- Company ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedFlag {
    pub category: RedFlagCategory,
    pub severity: Severity,
    pub headline: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalarySample {
    pub source: String,
    pub min: u32,
    pub max: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SalaryData {
    pub min_salary: u32,
    pub max_salary: u32,
    pub currency: String,
    pub period: SalaryPeriod,
    pub external_ranges: Vec<SalarySample>,
    pub labor_agreement: Option<String>, // collective labor agreement (CAO), if any
    pub market_position: MarketPosition,
    pub confidence: u8, // 0-100
}

impl Default for SalaryData {
    fn default() -> Self {
        Self {
            min_salary: 0,
            max_salary: 0,
            currency: "EUR".to_string(),
            period: SalaryPeriod::Month,
            external_ranges: Vec::new(),
            labor_agreement: None,
            market_position: MarketPosition::AtMarket,
            confidence: 50,
        }
    }
}

impl SalaryData {
    // A zero lower bound means "no data", never a genuine zero salary.
    pub fn is_known(&self) -> bool {
        self.min_salary > 0
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyIntel {
    pub name: String,
    pub sector: String,
    pub employee_count: Option<u32>,
    pub structure_type: Structure,
    pub work_pace: Pace,
    pub culture_indicators: Vec<String>,
    pub role_type: Option<WorkStyle>,
    pub salary_data: SalaryData,
    pub red_flags: Vec<RedFlag>, // discovery order
    pub reviews_summary: String,
    pub external_rating: Option<f32>,
}

impl CompanyIntel {
    pub fn count_severity(&self, severity: Severity) -> usize {
        count_severity(&self.red_flags, severity)
    }
}

pub fn count_severity(flags: &[RedFlag], severity: Severity) -> usize {
    flags.iter().filter(|f| f.severity == severity).count()
}

// --- Analysis output ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CultureMatch {
    pub fit_score: u8, // 0-100
    pub warnings: Vec<String>,
    pub structure_match: u8,
    pub pace_match: u8,
    pub autonomy_match: u8,
    pub risk_level: RiskLevel,
    pub deal_breakers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewQuestion {
    pub question: String,
    pub reasoning: String,
    pub what_to_listen_for: String,
}

// Who and what a mission is about.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MissionTarget {
    pub company_name: String,
    pub job_title: String,
    pub vacancy_url: String,
}

// --- Report ---

// The finished, immutable artifact of one mission.
#[derive(Debug, Clone, Serialize)]
pub struct MissionReport {
    company_name: String,
    job_title: String,
    vacancy_url: String,
    candidate_profile: CandidateProfile,
    company_intel: CompanyIntel,
    culture_match: CultureMatch,
    salary_prediction: SalaryData,
    red_flags: Vec<RedFlag>,
    interview_questions: Vec<InterviewQuestion>,
    generated_at: DateTime<Local>,
}

impl MissionReport {
    pub fn new(
        candidate_profile: CandidateProfile,
        company_intel: CompanyIntel,
        culture_match: CultureMatch,
        interview_questions: Vec<InterviewQuestion>,
        target: &MissionTarget,
        generated_at: DateTime<Local>,
    ) -> Self {
        // The intel name wins: reconnaissance may have corrected the spelling.
        let company_name = if company_intel.name.trim().is_empty() {
            target.company_name.clone()
        } else {
            company_intel.name.clone()
        };

        Self {
            company_name,
            job_title: target.job_title.clone(),
            vacancy_url: target.vacancy_url.clone(),
            salary_prediction: company_intel.salary_data.clone(),
            red_flags: company_intel.red_flags.clone(),
            candidate_profile,
            company_intel,
            culture_match,
            interview_questions,
            generated_at,
        }
    }

    pub fn company_name(&self) -> &str {
        &self.company_name
    }

    pub fn job_title(&self) -> &str {
        &self.job_title
    }

    pub fn vacancy_url(&self) -> &str {
        &self.vacancy_url
    }

    pub fn candidate_profile(&self) -> &CandidateProfile {
        &self.candidate_profile
    }

    pub fn company_intel(&self) -> &CompanyIntel {
        &self.company_intel
    }

    pub fn culture_match(&self) -> &CultureMatch {
        &self.culture_match
    }

    pub fn salary_prediction(&self) -> &SalaryData {
        &self.salary_prediction
    }

    pub fn red_flags(&self) -> &[RedFlag] {
        &self.red_flags
    }

    pub fn interview_questions(&self) -> &[InterviewQuestion] {
        &self.interview_questions
    }

    pub fn generated_at(&self) -> DateTime<Local> {
        self.generated_at
    }

    // Recomputed on every call from the fit score and red flags.
    pub fn overall_verdict(&self) -> Verdict {
        crate::report::overall_verdict(self.culture_match.fit_score, &self.red_flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_profile_defaults() {
        let profile = CandidateProfile::default();
        assert_eq!(profile.culture_type, CultureType::Corporate);
        assert_eq!(profile.work_pace, Pace::Moderate);
        assert_eq!(profile.structure_preference, Structure::Hierarchical);
        assert_eq!(profile.builder_vs_maintainer, WorkStyle::Optimizer);
        assert_eq!(profile.chaos_tolerance, 5);
        assert_eq!(profile.autonomy_need, 5);
    }

    #[test]
    fn test_normalized_clamps_tolerances() {
        let profile = CandidateProfile {
            chaos_tolerance: 0,
            autonomy_need: 42,
            ..Default::default()
        }
        .normalized();
        assert_eq!(profile.chaos_tolerance, 1);
        assert_eq!(profile.autonomy_need, 10);
    }

    #[test]
    fn test_salary_default_is_unknown() {
        let salary = SalaryData::default();
        assert!(!salary.is_known());
        assert_eq!(salary.currency, "EUR");

        let known = SalaryData {
            min_salary: 3500,
            max_salary: 4500,
            ..Default::default()
        };
        assert!(known.is_known());
    }

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(serde_json::to_string(&CultureType::ScaleUp).unwrap(), "\"scale-up\"");
        assert_eq!(
            serde_json::to_string(&RedFlagCategory::ToxicCulture).unwrap(),
            "\"toxic_culture\""
        );
        assert_eq!(
            serde_json::to_string(&MarketPosition::BelowMarket).unwrap(),
            "\"below_market\""
        );
        let pace: Pace = serde_json::from_str("\"unknown\"").unwrap();
        assert_eq!(pace, Pace::Unknown);
    }

    #[test]
    fn test_red_flag_category_as_str_matches_wire_name() {
        for category in [
            RedFlagCategory::Layoffs,
            RedFlagCategory::ToxicCulture,
            RedFlagCategory::Lawsuit,
            RedFlagCategory::Financial,
            RedFlagCategory::Reorganization,
        ] {
            let wire = serde_json::to_string(&category).unwrap();
            assert_eq!(wire, format!("\"{}\"", category.as_str()));
        }
    }

    #[test]
    fn test_company_intel_partial_json_uses_defaults() {
        let intel: CompanyIntel = serde_json::from_str(
            r#"{"name": "Acme", "structure_type": "flat", "red_flags": [
                {"category": "layoffs", "severity": "high", "headline": "Acme cuts 200 jobs"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(intel.structure_type, Structure::Flat);
        assert_eq!(intel.work_pace, Pace::Unknown);
        assert!(!intel.salary_data.is_known());
        assert_eq!(intel.count_severity(Severity::High), 1);
        assert_eq!(intel.red_flags[0].url, None);
    }

    #[test]
    fn test_mission_report_copies_salary_and_flags() {
        let intel = CompanyIntel {
            name: "Acme BV".to_string(),
            salary_data: SalaryData {
                min_salary: 4000,
                max_salary: 5000,
                ..Default::default()
            },
            red_flags: vec![RedFlag {
                category: RedFlagCategory::Lawsuit,
                severity: Severity::Medium,
                headline: "Acme in court".to_string(),
                source: "news".to_string(),
                date: None,
                url: None,
            }],
            ..Default::default()
        };
        let culture_match = CultureMatch {
            fit_score: 80,
            warnings: vec![],
            structure_match: 100,
            pace_match: 100,
            autonomy_match: 50,
            risk_level: RiskLevel::Low,
            deal_breakers: vec![],
        };
        let target = MissionTarget {
            company_name: "acme".to_string(),
            job_title: "Engineer".to_string(),
            vacancy_url: "https://acme.example/jobs/1".to_string(),
        };

        let report = MissionReport::new(
            CandidateProfile::default(),
            intel.clone(),
            culture_match,
            vec![],
            &target,
            Local::now(),
        );

        assert_eq!(report.company_name(), "Acme BV");
        assert_eq!(report.job_title(), "Engineer");
        assert_eq!(report.salary_prediction(), &intel.salary_data);
        assert_eq!(report.red_flags(), intel.red_flags.as_slice());
    }

    #[test]
    fn test_mission_report_falls_back_to_target_name() {
        let culture_match = CultureMatch {
            fit_score: 50,
            warnings: vec![],
            structure_match: 50,
            pace_match: 50,
            autonomy_match: 50,
            risk_level: RiskLevel::Medium,
            deal_breakers: vec![],
        };
        let target = MissionTarget {
            company_name: "Target Co".to_string(),
            ..Default::default()
        };
        let report = MissionReport::new(
            CandidateProfile::default(),
            CompanyIntel::default(),
            culture_match,
            vec![],
            &target,
            Local::now(),
        );
        assert_eq!(report.company_name(), "Target Co");
    }
}
