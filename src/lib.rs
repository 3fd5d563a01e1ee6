pub mod ai;
pub mod analysis;
pub mod browser;
pub mod config;
pub mod cv;
pub mod error;
pub mod logging;
pub mod matcher;
pub mod mission;
pub mod models;
pub mod prompts;
pub mod questions;
pub mod recon;
pub mod report;

pub use analysis::Analyzers;
pub use config::Config;
pub use error::{Result, SpyError, Stage};
pub use mission::{Mission, MissionStage};
pub use models::{CandidateProfile, CompanyIntel, CultureMatch, MissionReport, MissionTarget};
