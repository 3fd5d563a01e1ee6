// A new profile or new intel discards everything computed from the old one.

use chrono::Local;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::analysis::Analyzers;
use crate::cv;
use crate::error::{Result, SpyError};
use crate::models::{CandidateProfile, CompanyIntel, CultureMatch, MissionReport, MissionTarget};
use crate::questions;
use crate::recon::Reconnaissance;
use crate::report;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissionStage {
    Empty,
    HasProfile,
    HasProfileAndIntel,
    HasMatch,
    Reported,
}

impl fmt::Display for MissionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MissionStage::Empty => "empty",
            MissionStage::HasProfile => "has_profile",
            MissionStage::HasProfileAndIntel => "has_profile_and_intel",
            MissionStage::HasMatch => "has_match",
            MissionStage::Reported => "reported",
        })
    }
}

#[derive(Debug)]
enum MissionState {
    Empty,
    HasProfile(CandidateProfile),
    HasProfileAndIntel(CandidateProfile, CompanyIntel),
    HasMatch(CandidateProfile, CompanyIntel, CultureMatch),
    Reported {
        profile: CandidateProfile,
        intel: CompanyIntel,
        report: Box<MissionReport>,
        artifact: PathBuf,
    },
}

#[derive(Debug)]
pub struct Mission {
    target: MissionTarget,
    analyzers: Analyzers,
    output_dir: PathBuf,
    state: MissionState,
}

impl Mission {
    pub fn new(
        target: MissionTarget,
        analyzers: Analyzers,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            target,
            analyzers,
            output_dir: output_dir.into(),
            state: MissionState::Empty,
        }
    }

    pub fn target(&self) -> &MissionTarget {
        &self.target
    }

    pub fn stage(&self) -> MissionStage {
        match self.state {
            MissionState::Empty => MissionStage::Empty,
            MissionState::HasProfile(..) => MissionStage::HasProfile,
            MissionState::HasProfileAndIntel(..) => MissionStage::HasProfileAndIntel,
            MissionState::HasMatch(..) => MissionStage::HasMatch,
            MissionState::Reported { .. } => MissionStage::Reported,
        }
    }

    pub fn candidate_profile(&self) -> Option<&CandidateProfile> {
        match &self.state {
            MissionState::Empty => None,
            MissionState::HasProfile(profile)
            | MissionState::HasProfileAndIntel(profile, _)
            | MissionState::HasMatch(profile, _, _)
            | MissionState::Reported { profile, .. } => Some(profile),
        }
    }

    pub fn company_intel(&self) -> Option<&CompanyIntel> {
        match &self.state {
            MissionState::Empty | MissionState::HasProfile(_) => None,
            MissionState::HasProfileAndIntel(_, intel)
            | MissionState::HasMatch(_, intel, _)
            | MissionState::Reported { intel, .. } => Some(intel),
        }
    }

    pub fn culture_match(&self) -> Option<&CultureMatch> {
        match &self.state {
            MissionState::HasMatch(_, _, culture_match) => Some(culture_match),
            MissionState::Reported { report, .. } => Some(report.culture_match()),
            _ => None,
        }
    }

    pub fn report(&self) -> Option<&MissionReport> {
        match &self.state {
            MissionState::Reported { report, .. } => Some(report.as_ref()),
            _ => None,
        }
    }

    pub fn artifact_path(&self) -> Option<&Path> {
        match &self.state {
            MissionState::Reported { artifact, .. } => Some(artifact.as_path()),
            _ => None,
        }
    }

    fn require_profile(&self) -> Result<&CandidateProfile> {
        self.candidate_profile().ok_or_else(|| {
            SpyError::missing("no candidate profile; analyze a CV or supply a profile first")
        })
    }

    fn require_inputs(&self) -> Result<(&CandidateProfile, &CompanyIntel)> {
        let profile = self.require_profile()?;
        let intel = self.company_intel().ok_or_else(|| {
            SpyError::missing("no company intel; run reconnaissance or supply intel first")
        })?;
        Ok((profile, intel))
    }

    fn advance(&mut self, state: MissionState) {
        self.state = state;
        info!(stage = %self.stage(), company = %self.target.company_name, "mission advanced");
    }

    // Step 1: extracts the CV text and turns it into a profile.
    pub async fn analyze_cv(&mut self, cv_path: &Path) -> Result<()> {
        info!(path = %cv_path.display(), backend = self.analyzers.backend(), "analyzing CV");
        let text = cv::extract_text(cv_path)?;
        let profile = self.analyzers.profile.analyze(&text).await?;
        self.set_candidate_profile(profile);
        Ok(())
    }

    pub fn set_candidate_profile(&mut self, profile: CandidateProfile) {
        self.advance(MissionState::HasProfile(profile.normalized()));
    }

    // Step 2: gathers intel about the target company.
    pub async fn deep_reconnaissance(&mut self, recon: &dyn Reconnaissance) -> Result<()> {
        self.require_profile()?;
        let intel = recon.gather(&self.target).await?;
        self.set_company_intel(intel)
    }

    pub fn set_company_intel(&mut self, intel: CompanyIntel) -> Result<()> {
        let profile = self.require_profile()?.clone();
        self.advance(MissionState::HasProfileAndIntel(profile, intel));
        Ok(())
    }

    async fn compute_match(&self) -> Result<CultureMatch> {
        let (profile, intel) = self.require_inputs()?;
        self.analyzers
            .matching
            .analyze(profile, intel, &self.target)
            .await
    }

    // Step 3: scores the match without writing anything.
    pub async fn analyze_match(&mut self) -> Result<()> {
        let culture_match = self.compute_match().await?;
        let (profile, intel) = self.require_inputs()?;
        let state = MissionState::HasMatch(profile.clone(), intel.clone(), culture_match);
        self.advance(state);
        Ok(())
    }

    // Step 4: selects questions, compiles and saves the report.
    //
    // Reuses the match from `analyze_match` when there is one; otherwise
    // scores first. Safe to call again: each call writes a new artifact.
    // On failure the mission keeps its previous state.
    pub async fn generate_report(&mut self) -> Result<PathBuf> {
        let culture_match = match &self.state {
            MissionState::HasMatch(_, _, culture_match) => culture_match.clone(),
            _ => self.compute_match().await?,
        };
        let (profile, intel) = self.require_inputs()?;

        let questions = questions::select(profile, intel, &culture_match);
        let report = MissionReport::new(
            profile.clone(),
            intel.clone(),
            culture_match,
            questions,
            &self.target,
            Local::now(),
        );
        let artifact = report::save(&report, &self.output_dir)?;

        info!(
            verdict = %report.overall_verdict(),
            fit = report.culture_match().fit_score,
            path = %artifact.display(),
            "mission report generated"
        );

        let state = MissionState::Reported {
            profile: profile.clone(),
            intel: intel.clone(),
            report: Box::new(report),
            artifact: artifact.clone(),
        };
        self.advance(state);
        Ok(artifact)
    }

    // Runs CV analysis, reconnaissance and reporting in order.
    pub async fn run_full_mission(
        &mut self,
        cv_path: &Path,
        recon: &dyn Reconnaissance,
    ) -> Result<PathBuf> {
        self.analyze_cv(cv_path).await?;
        self.deep_reconnaissance(recon).await?;
        self.generate_report().await
    }
}
