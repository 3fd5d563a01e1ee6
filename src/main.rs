use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use career_spy::ai::{self, MODEL_NAMES};
use career_spy::analysis::{Analyzers, VacancyAnalyzer};
use career_spy::browser::BrowserFetcher;
use career_spy::config::{Config, DEFAULT_MODEL};
use career_spy::models::{CompanyIntel, MissionReport, MissionTarget};
use career_spy::recon::{IntelFile, PageSource, Reconnaissance, WebRecon};
use career_spy::{cv, logging, matcher, questions, report, Mission};

#[derive(Parser)]
#[command(name = "career-spy")]
#[command(about = "Culture-fit reconnaissance before you apply")]
struct Cli {
    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct TargetArgs {
    /// Company name
    #[arg(long)]
    company: String,

    /// Job title
    #[arg(long)]
    title: String,

    /// Vacancy URL
    #[arg(long)]
    url: String,
}

impl TargetArgs {
    fn into_target(self) -> MissionTarget {
        MissionTarget {
            company_name: self.company,
            job_title: self.title,
            vacancy_url: self.url,
        }
    }
}

#[derive(Args)]
struct ReconArgs {
    /// Extra page to scan for red flags (repeatable)
    #[arg(long = "source")]
    sources: Vec<String>,

    /// Render pages through WebDriver instead of plain HTTP
    #[arg(long)]
    browser: bool,
}

#[derive(Args)]
struct AnalysisArgs {
    /// Model short name (see `career-spy models`)
    #[arg(long)]
    model: Option<String>,

    /// Skip AI enrichment even when an API key is set
    #[arg(long)]
    no_ai: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full mission and write the report
    Mission {
        /// CV to analyze (PDF, text or markdown)
        #[arg(long, required_unless_present = "profile", conflicts_with = "profile")]
        cv: Option<PathBuf>,

        /// Previously saved candidate profile (JSON)
        #[arg(long)]
        profile: Option<PathBuf>,

        #[command(flatten)]
        target: TargetArgs,

        /// Company intel (JSON); skips web reconnaissance
        #[arg(long)]
        intel: Option<PathBuf>,

        #[command(flatten)]
        recon: ReconArgs,

        /// Directory for the report
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        analysis: AnalysisArgs,
    },

    /// Analyze a CV and print the profile as JSON
    Profile {
        #[arg(long)]
        cv: PathBuf,

        #[command(flatten)]
        analysis: AnalysisArgs,
    },

    /// Gather company intel and print it as JSON
    Recon {
        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        recon: ReconArgs,

        #[command(flatten)]
        analysis: AnalysisArgs,
    },

    /// Score a saved profile against saved intel without writing a report
    Score {
        #[arg(long)]
        profile: PathBuf,

        #[arg(long)]
        intel: PathBuf,
    },

    /// List available models
    Models,
}

fn build_analyzers(config: &mut Config, analysis: AnalysisArgs) -> Result<Analyzers> {
    if analysis.no_ai {
        return Ok(Analyzers::rule_based());
    }
    if let Some(model) = analysis.model {
        config.model = model;
    }
    Ok(Analyzers::from_config(config)?)
}

fn build_recon(
    config: &Config,
    recon: ReconArgs,
    vacancy: Arc<dyn VacancyAnalyzer>,
) -> Result<WebRecon> {
    let pages = if recon.browser {
        PageSource::Browser(BrowserFetcher::new(&config.webdriver_url, config.browser_timeout))
    } else {
        PageSource::http(config.browser_timeout)?
    };
    Ok(WebRecon::new(pages, vacancy)
        .with_sources(recon.sources)
        .with_max_red_flags(config.max_red_flags))
}

fn print_summary(report: &MissionReport) {
    let verdict = report.overall_verdict();
    let culture_match = report.culture_match();
    println!("Company:    {}", report.company_name());
    println!("Role:       {}", report.job_title());
    println!("Fit score:  {}", report::match_bar(culture_match.fit_score));
    println!("Risk level: {}", culture_match.risk_level);
    println!(
        "Verdict:    {} {} ({})",
        report::verdict_emoji(verdict),
        report::verdict_text(verdict),
        verdict
    );
    if !report.red_flags().is_empty() {
        println!("Red flags:");
        for flag in report.red_flags() {
            println!("  [{}] {}", flag.severity.as_str(), truncate(&flag.headline, 70));
        }
    }
}

fn print_wrapped_list(heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!("\n{}:", heading);
    let options = textwrap::Options::new(78)
        .initial_indent("  - ")
        .subsequent_indent("    ");
    for item in items {
        println!("{}", textwrap::fill(item, &options));
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logger(cli.verbose);
    let mut config = Config::from_env()?;

    match cli.command {
        Commands::Mission {
            cv,
            profile,
            target,
            intel,
            recon,
            output,
            analysis,
        } => {
            let analyzers = build_analyzers(&mut config, analysis)?;
            let output_dir = output.unwrap_or_else(|| config.output_dir.clone());
            let mut mission = Mission::new(target.into_target(), analyzers.clone(), output_dir);

            match (cv, profile) {
                (_, Some(path)) => mission.set_candidate_profile(cv::load_profile(&path)?),
                (Some(path), None) => mission.analyze_cv(&path).await?,
                (None, None) => bail!("either --cv or --profile is required"),
            }

            match intel {
                Some(path) => mission.deep_reconnaissance(&IntelFile::new(path)).await?,
                None => {
                    let web = build_recon(&config, recon, Arc::clone(&analyzers.vacancy))?;
                    mission.deep_reconnaissance(&web).await?;
                }
            }

            let path = mission.generate_report().await?;
            if let Some(report) = mission.report() {
                print_summary(report);
            }
            println!("\nReport saved to {}", path.display());
        }

        Commands::Profile { cv, analysis } => {
            let analyzers = build_analyzers(&mut config, analysis)?;
            let text = cv::extract_text(&cv)?;
            let profile = analyzers.profile.analyze(&text).await?.normalized();
            println!("{}", serde_json::to_string_pretty(&profile)?);
        }

        Commands::Recon {
            target,
            recon,
            analysis,
        } => {
            let analyzers = build_analyzers(&mut config, analysis)?;
            let web = build_recon(&config, recon, Arc::clone(&analyzers.vacancy))?;
            let intel = web.gather(&target.into_target()).await?;
            println!("{}", serde_json::to_string_pretty(&intel)?);
        }

        Commands::Score { profile, intel } => {
            let candidate = cv::load_profile(&profile)?;
            let company: CompanyIntel = IntelFile::new(&intel)
                .gather(&MissionTarget::default())
                .await
                .with_context(|| format!("Failed to load intel from {}", intel.display()))?;

            let culture_match = matcher::score(&candidate, &company);
            let verdict = report::overall_verdict(culture_match.fit_score, &company.red_flags);

            println!("Fit score:       {}", report::match_bar(culture_match.fit_score));
            println!("Structure match: {}", report::match_bar(culture_match.structure_match));
            println!("Pace match:      {}", report::match_bar(culture_match.pace_match));
            println!("Risk level:      {}", culture_match.risk_level);
            println!(
                "Verdict:         {} {}",
                report::verdict_emoji(verdict),
                report::verdict_text(verdict)
            );

            print_wrapped_list("Warnings", &culture_match.warnings);
            print_wrapped_list("Deal breakers", &culture_match.deal_breakers);

            let picked: Vec<String> = questions::select(&candidate, &company, &culture_match)
                .into_iter()
                .map(|q| q.question)
                .collect();
            print_wrapped_list("Interview questions", &picked);
        }

        Commands::Models => {
            println!("{:<16} {:<34} {}", "MODEL", "MODEL ID", "API KEY");
            println!("{}", "-".repeat(70));
            for name in MODEL_NAMES {
                let spec = ai::resolve_model(name)?;
                let marker = if name == DEFAULT_MODEL { " (default)" } else { "" };
                println!(
                    "{:<16} {:<34} {}{}",
                    name,
                    truncate(&spec.model_id, 32),
                    spec.provider.api_key_var(),
                    marker
                );
            }
        }
    }

    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
