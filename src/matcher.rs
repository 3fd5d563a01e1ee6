// Rule-based culture matching between a candidate profile and company intel.
//
// Deterministic and side-effect free:
// 1. structure and pace sub-scores come from static lookup tables
// 2. fit = round(structure * 0.4 + pace * 0.4 + 50 * 0.2)
// 3. minus 15 per high-severity and 5 per medium-severity red flag, floored at 0
// 4. warnings and deal-breakers fire independently, in rule order
// 5. risk level follows from fit score and deal-breaker count

use tracing::debug;

use crate::models::{
    CandidateProfile, CompanyIntel, CultureMatch, Pace, RiskLevel, Severity, Structure, WorkStyle,
};

// Score for any pair a lookup table does not list, including `Unknown`.
pub const NEUTRAL_SCORE: u8 = 50;

const STRUCTURE_WEIGHT: f64 = 0.4;
const PACE_WEIGHT: f64 = 0.4;
const BASELINE_WEIGHT: f64 = 0.2;

const HIGH_FLAG_PENALTY: u32 = 15;
const MEDIUM_FLAG_PENALTY: u32 = 5;

const HIGH_AUTONOMY_NEED: u8 = 7;
const LOW_CHAOS_TOLERANCE: u8 = 4;
const HIGH_CHAOS_TOLERANCE: u8 = 8;
const CRITICAL_FLAG_THRESHOLD: usize = 2;

// Culture indicators that mark a role as maintenance/administration work.
pub const MAINTENANCE_MARKERS: [&str; 3] = ["beheer", "maintenance", "administration"];

// (candidate preference, company structure) -> score.
// Moving towards more rigid structures costs more than moving towards looser ones.
static STRUCTURE_SCORES: [((Structure, Structure), u8); 9] = [
    ((Structure::Flat, Structure::Flat), 100),
    ((Structure::Flat, Structure::Matrix), 50),
    ((Structure::Flat, Structure::Hierarchical), 30),
    ((Structure::Matrix, Structure::Flat), 60),
    ((Structure::Matrix, Structure::Matrix), 100),
    ((Structure::Matrix, Structure::Hierarchical), 70),
    ((Structure::Hierarchical, Structure::Flat), 40),
    ((Structure::Hierarchical, Structure::Matrix), 60),
    ((Structure::Hierarchical, Structure::Hierarchical), 100),
];

// (candidate pace, company pace) -> score. Fast into slow is the worst cell.
static PACE_SCORES: [((Pace, Pace), u8); 9] = [
    ((Pace::Fast, Pace::Fast), 100),
    ((Pace::Fast, Pace::Moderate), 70),
    ((Pace::Fast, Pace::Slow), 20),
    ((Pace::Moderate, Pace::Fast), 60),
    ((Pace::Moderate, Pace::Moderate), 100),
    ((Pace::Moderate, Pace::Slow), 70),
    ((Pace::Slow, Pace::Fast), 30),
    ((Pace::Slow, Pace::Moderate), 60),
    ((Pace::Slow, Pace::Slow), 100),
];

fn lookup<K: PartialEq + Copy>(table: &[(K, u8)], key: K) -> u8 {
    table
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, score)| *score)
        .unwrap_or(NEUTRAL_SCORE)
}

pub fn structure_match(candidate: Structure, company: Structure) -> u8 {
    lookup(&STRUCTURE_SCORES, (candidate, company))
}

pub fn pace_match(candidate: Pace, company: Pace) -> u8 {
    lookup(&PACE_SCORES, (candidate, company))
}

pub fn base_fit_score(structure: u8, pace: u8) -> u8 {
    let weighted = f64::from(structure) * STRUCTURE_WEIGHT
        + f64::from(pace) * PACE_WEIGHT
        + f64::from(NEUTRAL_SCORE) * BASELINE_WEIGHT;
    weighted.round().clamp(0.0, 100.0) as u8
}

// Applies the red-flag penalty and floors the result at 0.
pub fn apply_flag_penalty(base: u8, high_flags: usize, medium_flags: usize) -> u8 {
    let penalty = (high_flags as u32)
        .saturating_mul(HIGH_FLAG_PENALTY)
        .saturating_add((medium_flags as u32).saturating_mul(MEDIUM_FLAG_PENALTY));
    u32::from(base).saturating_sub(penalty) as u8
}

// Low is checked first, then medium; anything else is high.
pub fn risk_level(fit_score: u8, deal_breakers: usize) -> RiskLevel {
    if fit_score >= 70 && deal_breakers == 0 {
        RiskLevel::Low
    } else if fit_score >= 40 && deal_breakers <= 1 {
        RiskLevel::Medium
    } else {
        RiskLevel::High
    }
}

fn is_maintenance_role(company: &CompanyIntel) -> bool {
    if company.role_type == Some(WorkStyle::Maintainer) {
        return true;
    }
    company.culture_indicators.iter().any(|indicator| {
        let lower = indicator.to_lowercase();
        MAINTENANCE_MARKERS.iter().any(|marker| lower.contains(marker))
    })
}

pub fn warnings(candidate: &CandidateProfile, company: &CompanyIntel) -> Vec<String> {
    let mut warnings = Vec::new();

    if candidate.structure_preference == Structure::Flat
        && company.structure_type == Structure::Hierarchical
    {
        warnings.push(
            "STRUCTURE CLASH: You come from a flat organization, but this is a hierarchical \
             structure. Expect longer decision chains and less autonomy."
                .to_string(),
        );
    }

    if candidate.structure_preference == Structure::Flat
        && company.structure_type == Structure::Matrix
    {
        warnings.push(
            "MATRIX ALERT: Matrix organizations have multiple reporting lines. If you are used \
             to fast, direct decision-making this can be frustrating."
                .to_string(),
        );
    }

    if candidate.work_pace == Pace::Fast && company.work_pace == Pace::Slow {
        warnings.push(
            "PACE MISMATCH: You are used to a high pace, but this looks like a slower \
             organization. Processes and approvals take more time."
                .to_string(),
        );
    }

    if candidate.autonomy_need >= HIGH_AUTONOMY_NEED
        && company.structure_type == Structure::Hierarchical
    {
        warnings.push(format!(
            "AUTONOMY RISK: You have a high need for freedom (score: {}/10), but hierarchical \
             organizations often leave less room for your own initiative.",
            candidate.autonomy_need
        ));
    }

    if candidate.builder_vs_maintainer == WorkStyle::Builder && is_maintenance_role(company) {
        warnings.push(
            "TYPE MISMATCH: You are a builder who likes to create new things, but this role \
             looks mostly maintenance-oriented."
                .to_string(),
        );
    }

    if candidate.chaos_tolerance <= LOW_CHAOS_TOLERANCE && company.structure_type == Structure::Flat
    {
        warnings.push(format!(
            "CHAOS WARNING: Flat organizations often have less structure and more ambiguity. \
             Your chaos tolerance ({}/10) is low.",
            candidate.chaos_tolerance
        ));
    }

    warnings
}

pub fn deal_breakers(candidate: &CandidateProfile, company: &CompanyIntel) -> Vec<String> {
    let mut deal_breakers = Vec::new();

    let critical = company.count_severity(Severity::High);
    if critical >= CRITICAL_FLAG_THRESHOLD {
        deal_breakers.push(format!("Multiple serious red flags found ({}x)", critical));
    }

    if candidate.work_pace == Pace::Fast
        && company.work_pace == Pace::Slow
        && candidate.chaos_tolerance >= HIGH_CHAOS_TOLERANCE
    {
        deal_breakers
            .push("Extreme pace mismatch for someone who thrives on dynamism".to_string());
    }

    deal_breakers
}

pub fn score(candidate: &CandidateProfile, company: &CompanyIntel) -> CultureMatch {
    let structure = structure_match(candidate.structure_preference, company.structure_type);
    let pace = pace_match(candidate.work_pace, company.work_pace);

    let base = base_fit_score(structure, pace);
    let fit_score = apply_flag_penalty(
        base,
        company.count_severity(Severity::High),
        company.count_severity(Severity::Medium),
    );

    let warnings = warnings(candidate, company);
    let deal_breakers = deal_breakers(candidate, company);
    let risk_level = risk_level(fit_score, deal_breakers.len());

    debug!(
        structure,
        pace,
        base,
        fit_score,
        warnings = warnings.len(),
        deal_breakers = deal_breakers.len(),
        risk = %risk_level,
        "scored culture match"
    );

    CultureMatch {
        fit_score,
        warnings,
        structure_match: structure,
        pace_match: pace,
        // No company-side autonomy signal yet.
        autonomy_match: NEUTRAL_SCORE,
        risk_level,
        deal_breakers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RedFlag, RedFlagCategory};

    const STRUCTURES: [Structure; 4] = [
        Structure::Flat,
        Structure::Matrix,
        Structure::Hierarchical,
        Structure::Unknown,
    ];
    const PACES: [Pace; 4] = [Pace::Fast, Pace::Moderate, Pace::Slow, Pace::Unknown];

    fn flag(severity: Severity) -> RedFlag {
        RedFlag {
            category: RedFlagCategory::Layoffs,
            severity,
            headline: "Headline".to_string(),
            source: "news".to_string(),
            date: None,
            url: None,
        }
    }

    fn candidate(structure: Structure, pace: Pace) -> CandidateProfile {
        CandidateProfile {
            structure_preference: structure,
            work_pace: pace,
            ..Default::default()
        }
    }

    fn company(structure: Structure, pace: Pace, flags: Vec<RedFlag>) -> CompanyIntel {
        CompanyIntel {
            name: "Acme".to_string(),
            structure_type: structure,
            work_pace: pace,
            red_flags: flags,
            ..Default::default()
        }
    }

    #[test]
    fn test_structure_table_values() {
        assert_eq!(structure_match(Structure::Flat, Structure::Matrix), 50);
        assert_eq!(structure_match(Structure::Flat, Structure::Hierarchical), 30);
        assert_eq!(structure_match(Structure::Matrix, Structure::Flat), 60);
        assert_eq!(structure_match(Structure::Matrix, Structure::Hierarchical), 70);
        assert_eq!(structure_match(Structure::Hierarchical, Structure::Flat), 40);
        assert_eq!(structure_match(Structure::Hierarchical, Structure::Matrix), 60);
    }

    #[test]
    fn test_identical_categories_score_100_and_unknown_is_neutral() {
        for s in [Structure::Flat, Structure::Matrix, Structure::Hierarchical] {
            assert_eq!(structure_match(s, s), 100);
            assert_eq!(structure_match(s, Structure::Unknown), NEUTRAL_SCORE);
            assert_eq!(structure_match(Structure::Unknown, s), NEUTRAL_SCORE);
        }
        for p in [Pace::Fast, Pace::Moderate, Pace::Slow] {
            assert_eq!(pace_match(p, p), 100);
            assert_eq!(pace_match(p, Pace::Unknown), NEUTRAL_SCORE);
        }
        assert_eq!(structure_match(Structure::Unknown, Structure::Unknown), NEUTRAL_SCORE);
        assert_eq!(pace_match(Pace::Unknown, Pace::Unknown), NEUTRAL_SCORE);
    }

    #[test]
    fn test_fast_into_slow_is_lowest_pace_cell() {
        let worst = pace_match(Pace::Fast, Pace::Slow);
        assert_eq!(worst, 20);
        for c in PACES {
            for p in PACES {
                assert!(pace_match(c, p) >= worst);
            }
        }
    }

    #[test]
    fn test_scenario_flat_fast_vs_hierarchical_slow() {
        let result = score(
            &candidate(Structure::Flat, Pace::Fast),
            &company(Structure::Hierarchical, Pace::Slow, vec![]),
        );
        assert_eq!(result.structure_match, 30);
        assert_eq!(result.pace_match, 20);
        assert_eq!(result.fit_score, 30);
        assert!(result.deal_breakers.is_empty());
        // fit < 40 fails the medium threshold even with zero deal-breakers
        assert_eq!(result.risk_level, RiskLevel::High);
    }

    #[test]
    fn test_scenario_two_high_flags() {
        let result = score(
            &candidate(Structure::Flat, Pace::Fast),
            &company(
                Structure::Hierarchical,
                Pace::Slow,
                vec![flag(Severity::High), flag(Severity::High)],
            ),
        );
        assert_eq!(result.fit_score, 0);
        assert_eq!(result.deal_breakers.len(), 1);
        assert!(result.deal_breakers[0].contains("2x"));
        assert_eq!(result.risk_level, RiskLevel::High);
    }

    #[test]
    fn test_scenario_exact_match() {
        let result = score(
            &candidate(Structure::Matrix, Pace::Moderate),
            &company(Structure::Matrix, Pace::Moderate, vec![]),
        );
        assert_eq!(result.fit_score, 90);
        assert_eq!(result.autonomy_match, 50);
        assert_eq!(result.risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_penalty_ignores_low_flags_and_counts_medium() {
        let c = candidate(Structure::Hierarchical, Pace::Moderate);
        let clean = score(&c, &company(Structure::Hierarchical, Pace::Moderate, vec![]));
        let flagged = score(
            &c,
            &company(
                Structure::Hierarchical,
                Pace::Moderate,
                vec![flag(Severity::Low), flag(Severity::Medium), flag(Severity::High)],
            ),
        );
        assert_eq!(clean.fit_score, 90);
        assert_eq!(flagged.fit_score, 90 - 5 - 15);
    }

    #[test]
    fn test_fit_score_is_clamped() {
        assert_eq!(apply_flag_penalty(30, 10, 10), 0);
        assert_eq!(apply_flag_penalty(100, 0, 0), 100);
        assert_eq!(apply_flag_penalty(10, usize::MAX, usize::MAX), 0);

        for s in STRUCTURES {
            for p in PACES {
                for highs in 0..4 {
                    let flags = vec![flag(Severity::High); highs];
                    let result = score(&candidate(s, p), &company(s, p, flags));
                    assert!(result.fit_score <= 100);
                }
            }
        }
    }

    #[test]
    fn test_low_risk_iff_high_fit_and_no_deal_breakers() {
        for fit in 0..=100u8 {
            for breakers in 0..4 {
                let low = risk_level(fit, breakers) == RiskLevel::Low;
                assert_eq!(low, fit >= 70 && breakers == 0, "fit={} breakers={}", fit, breakers);
            }
        }
        assert_eq!(risk_level(40, 1), RiskLevel::Medium);
        assert_eq!(risk_level(39, 0), RiskLevel::High);
        assert_eq!(risk_level(90, 2), RiskLevel::High);
    }

    #[test]
    fn test_warnings_fire_in_rule_order() {
        let c = CandidateProfile {
            structure_preference: Structure::Flat,
            work_pace: Pace::Fast,
            autonomy_need: 9,
            builder_vs_maintainer: WorkStyle::Builder,
            ..Default::default()
        };
        let mut co = company(Structure::Hierarchical, Pace::Slow, vec![]);
        co.culture_indicators = vec!["Applicatiebeheer".to_string()];

        let found = warnings(&c, &co);
        assert_eq!(found.len(), 4);
        assert!(found[0].starts_with("STRUCTURE CLASH"));
        assert!(found[1].starts_with("PACE MISMATCH"));
        assert!(found[2].starts_with("AUTONOMY RISK"));
        assert!(found[2].contains("9/10"));
        assert!(found[3].starts_with("TYPE MISMATCH"));
    }

    #[test]
    fn test_matrix_and_chaos_warnings() {
        let c = CandidateProfile {
            structure_preference: Structure::Flat,
            chaos_tolerance: 3,
            ..Default::default()
        };
        let matrix = warnings(&c, &company(Structure::Matrix, Pace::Moderate, vec![]));
        assert_eq!(matrix.len(), 1);
        assert!(matrix[0].starts_with("MATRIX ALERT"));

        let flat = warnings(&c, &company(Structure::Flat, Pace::Moderate, vec![]));
        assert_eq!(flat.len(), 1);
        assert!(flat[0].contains("(3/10)"));
    }

    #[test]
    fn test_builder_warning_needs_marker_or_role_type() {
        let c = CandidateProfile {
            builder_vs_maintainer: WorkStyle::Builder,
            ..Default::default()
        };
        let mut co = company(Structure::Unknown, Pace::Unknown, vec![]);
        co.culture_indicators = vec!["agile".to_string(), "startup".to_string()];
        assert!(warnings(&c, &co).is_empty());

        co.role_type = Some(WorkStyle::Maintainer);
        assert_eq!(warnings(&c, &co).len(), 1);

        let optimizer = CandidateProfile::default();
        assert!(warnings(&optimizer, &co).is_empty());
    }

    #[test]
    fn test_pace_deal_breaker_requires_high_chaos_tolerance() {
        let mut c = candidate(Structure::Flat, Pace::Fast);
        let co = company(Structure::Flat, Pace::Slow, vec![]);
        assert!(deal_breakers(&c, &co).is_empty());

        c.chaos_tolerance = 8;
        let found = deal_breakers(&c, &co);
        assert_eq!(found.len(), 1);
        assert!(found[0].contains("pace mismatch"));
    }

    #[test]
    fn test_single_high_flag_is_not_a_deal_breaker() {
        let c = CandidateProfile::default();
        let co = company(Structure::Hierarchical, Pace::Moderate, vec![flag(Severity::High)]);
        assert!(deal_breakers(&c, &co).is_empty());
    }
}
