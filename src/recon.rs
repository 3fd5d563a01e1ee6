use async_trait::async_trait;
use regex::Regex;
use reqwest::Url;
use scraper::{Html, Selector};
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::analysis::VacancyAnalyzer;
use crate::browser::BrowserFetcher;
use crate::error::{Result, SpyError, Stage};
use crate::models::{
    CompanyIntel, MissionTarget, RedFlag, RedFlagCategory, SalaryData, SalaryPeriod, SalarySample,
    Severity,
};

pub const DEFAULT_MAX_RED_FLAGS: usize = 10;

#[async_trait]
pub trait Reconnaissance: Send + Sync {
    async fn gather(&self, target: &MissionTarget) -> Result<CompanyIntel>;
}

// A fetched page reduced to its title and visible text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Page {
    pub title: String,
    pub text: String,
}

// --- Intel file ---

pub struct IntelFile {
    path: PathBuf,
}

impl IntelFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Reconnaissance for IntelFile {
    async fn gather(&self, target: &MissionTarget) -> Result<CompanyIntel> {
        let raw = fs::read_to_string(&self.path).map_err(|e| {
            SpyError::acquisition(
                Stage::Reconnaissance,
                format!("Failed to read intel {}: {}", self.path.display(), e),
            )
        })?;
        let mut intel: CompanyIntel = serde_json::from_str(&raw).map_err(|e| {
            SpyError::malformed(
                Stage::Reconnaissance,
                format!("Invalid intel JSON in {}: {}", self.path.display(), e),
            )
        })?;
        if intel.name.trim().is_empty() {
            intel.name = target.company_name.clone();
        }
        info!(path = %self.path.display(), flags = intel.red_flags.len(), "loaded company intel");
        Ok(intel)
    }
}

// --- Page fetching ---

pub enum PageSource {
    Http(reqwest::Client),
    Browser(BrowserFetcher),
}

impl PageSource {
    pub fn http(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("career-spy/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SpyError::config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(PageSource::Http(client))
    }

    pub async fn fetch(&self, url: &str) -> Result<Page> {
        match self {
            PageSource::Http(client) => fetch_http(client, url).await,
            PageSource::Browser(fetcher) => fetcher.fetch(url).await,
        }
    }
}

fn fetch_error(url: &str, err: impl std::fmt::Display) -> SpyError {
    SpyError::acquisition(Stage::Reconnaissance, format!("Failed to fetch {}: {}", url, err))
}

async fn fetch_http(client: &reqwest::Client, url: &str) -> Result<Page> {
    debug!(url, "fetching page over HTTP");
    let response = client
        .get(url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| fetch_error(url, e))?;
    let body = response.text().await.map_err(|e| fetch_error(url, e))?;

    let page = parse_html(&body);
    if page.text.trim().is_empty() {
        return Err(fetch_error(url, "page has no readable text"));
    }
    Ok(page)
}

// Extracts the title and the visible text, skipping scripts and styles.
pub fn parse_html(body: &str) -> Page {
    let document = Html::parse_document(body);

    let title = Selector::parse("title")
        .ok()
        .and_then(|selector| {
            document
                .select(&selector)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
        })
        .unwrap_or_default();

    let mut parts = Vec::new();
    for node in document.root_element().descendants() {
        if let Some(text) = node.value().as_text() {
            let hidden = node
                .parent()
                .and_then(|parent| parent.value().as_element().map(|el| el.name().to_string()))
                .is_some_and(|name| {
                    matches!(name.as_str(), "script" | "style" | "noscript" | "title")
                });
            let trimmed = text.trim();
            if !hidden && !trimmed.is_empty() {
                parts.push(trimmed.to_string());
            }
        }
    }

    Page {
        title,
        text: parts.join(" "),
    }
}

// --- Salary hints ---

const AMOUNT: &str = r"(\d{1,3}(?:[.,]\d{3})+|\d+)\s*(k\b)?";
const CURRENCY: &str = r"(?:€|\beuro?\b)";
const RANGE_SEPARATOR: &str = r"(?:,-)?\s*(?:-|–|tot en met|tot|to|t/m)\s*";
const MIN_PLAUSIBLE_SALARY: u32 = 1000;
// Amounts above this are annual figures even when the text doesn't say so.
const MONTHLY_CEILING: u32 = 20_000;

static SALARY_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i){currency}\s*{amount}{separator}{currency}?\s*{amount}",
        currency = CURRENCY,
        amount = AMOUNT,
        separator = RANGE_SEPARATOR
    ))
    .expect("Invalid salary range pattern")
});

static SALARY_SINGLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i){}\s*{}", CURRENCY, AMOUNT)).expect("Invalid salary pattern")
});

static CAO_MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bcao\b").expect("Invalid CAO pattern"));

static CAO_NAMED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i:\bcao\b)[\s-]+([A-Z][A-Za-z&]+)").expect("Invalid named CAO pattern")
});

const YEAR_MARKERS: [&str; 7] = [
    "per jaar",
    "per year",
    "jaarsalaris",
    "annual",
    "p.j.",
    "/year",
    "/jaar",
];

fn parse_amount(digits: &str, thousands: bool) -> Option<u32> {
    let cleaned: String = digits.chars().filter(char::is_ascii_digit).collect();
    let value: u32 = cleaned.parse().ok()?;
    Some(if thousands { value.saturating_mul(1000) } else { value })
}

fn salary_range(text: &str) -> Option<(u32, u32)> {
    if let Some(caps) = SALARY_RANGE.captures(text) {
        let low = parse_amount(caps.get(1)?.as_str(), caps.get(2).is_some())?;
        let high = parse_amount(caps.get(3)?.as_str(), caps.get(4).is_some())?;
        let (low, high) = if low <= high { (low, high) } else { (high, low) };
        if low >= MIN_PLAUSIBLE_SALARY {
            return Some((low, high));
        }
    }

    SALARY_SINGLE.captures_iter(text).find_map(|caps| {
        let amount = parse_amount(caps.get(1)?.as_str(), caps.get(2).is_some())?;
        (amount >= MIN_PLAUSIBLE_SALARY).then_some((amount, amount))
    })
}

fn labor_agreement(text: &str) -> Option<String> {
    if !CAO_MENTION.is_match(text) {
        return None;
    }
    let agreement = match CAO_NAMED.captures(text).and_then(|caps| caps.get(1)) {
        Some(name) => format!("CAO {}", name.as_str()),
        None => "CAO".to_string(),
    };
    Some(agreement)
}

// Reads salary hints out of vacancy text. Returns an unknown salary when no
// plausible euro amount is present.
pub fn extract_salary(text: &str) -> SalaryData {
    let mut salary = SalaryData {
        labor_agreement: labor_agreement(text),
        ..Default::default()
    };

    if let Some((min, max)) = salary_range(text) {
        let lower = text.to_lowercase();
        salary.period = if YEAR_MARKERS.iter().any(|m| lower.contains(m)) || max > MONTHLY_CEILING
        {
            SalaryPeriod::Year
        } else {
            SalaryPeriod::Month
        };
        salary.min_salary = min;
        salary.max_salary = max;
        salary.external_ranges.push(SalarySample {
            source: "vacancy".to_string(),
            min,
            max,
        });
        salary.confidence = 60;
    }

    salary
}

// Maps a company name to a likely sector for CAO lookups.
pub fn guess_sector(company_name: &str) -> Option<&'static str> {
    let name = company_name.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| name.contains(w));
    if has(&["zorg", "care", "health", "hospital", "ziekenhuis"]) {
        Some("Healthcare")
    } else if has(&["bank", "finance", "verzeker", "insurance"]) {
        Some("Finance")
    } else if has(&["tech", "software", "digital", "data"]) {
        Some("ICT")
    } else if has(&["bouw", "construct"]) {
        Some("Construction")
    } else {
        None
    }
}

// --- Red flags ---

// Checked in order; the first category with a hit wins.
const RED_FLAG_RULES: [(RedFlagCategory, Severity, &[&str]); 5] = [
    (
        RedFlagCategory::Layoffs,
        Severity::Medium,
        &["ontslag", "afvloei", "banenverlies", "layoff", "laid off", "job cuts"],
    ),
    (
        RedFlagCategory::ToxicCulture,
        Severity::High,
        &["toxic", "pestgedrag", "discriminatie", "burnout", "harassment", "bullying"],
    ),
    (
        RedFlagCategory::Lawsuit,
        Severity::High,
        &["rechtszaak", "rechter", "boete", "fraud", "lawsuit", "sued by"],
    ),
    (
        RedFlagCategory::Financial,
        Severity::High,
        &["faillissement", "schulden", "verlies", "surseance", "bankrupt", "insolven"],
    ),
    (
        RedFlagCategory::Reorganization,
        Severity::Medium,
        &[
            "reorganisatie",
            "herstructurering",
            "fusie",
            "overname",
            "restructur",
            "reorganization",
            "reorganisation",
            "merger",
        ],
    ),
];

pub fn categorize_red_flag(headline: &str, snippet: &str) -> Option<RedFlag> {
    let text = format!("{} {}", headline, snippet).to_lowercase();
    RED_FLAG_RULES
        .iter()
        .find(|(_, _, keywords)| keywords.iter().any(|kw| text.contains(kw)))
        .map(|(category, severity, _)| RedFlag {
            category: *category,
            severity: *severity,
            headline: headline.to_string(),
            source: String::new(),
            date: None,
            url: None,
        })
}

fn source_name(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
        .unwrap_or_else(|| url.to_string())
}

// --- Web reconnaissance ---

pub struct WebRecon {
    pages: PageSource,
    vacancy: Arc<dyn VacancyAnalyzer>,
    sources: Vec<String>,
    max_red_flags: usize,
}

impl WebRecon {
    pub fn new(pages: PageSource, vacancy: Arc<dyn VacancyAnalyzer>) -> Self {
        Self {
            pages,
            vacancy,
            sources: Vec::new(),
            max_red_flags: DEFAULT_MAX_RED_FLAGS,
        }
    }

    pub fn with_sources(mut self, sources: Vec<String>) -> Self {
        self.sources = sources;
        self
    }

    pub fn with_max_red_flags(mut self, max: usize) -> Self {
        self.max_red_flags = max;
        self
    }

    async fn scan_sources(&self) -> Vec<RedFlag> {
        let mut flags = Vec::new();
        for url in &self.sources {
            if flags.len() >= self.max_red_flags {
                debug!(max = self.max_red_flags, "red flag cap reached");
                break;
            }
            let page = match self.pages.fetch(url).await {
                Ok(page) => page,
                Err(e) => {
                    warn!("skipping intel source: {}", e);
                    continue;
                }
            };
            let headline = if page.title.is_empty() { url.as_str() } else { page.title.as_str() };
            match categorize_red_flag(headline, &page.text) {
                Some(mut flag) => {
                    flag.source = source_name(url);
                    flag.url = Some(url.clone());
                    info!(
                        category = flag.category.as_str(),
                        source = %flag.source,
                        "red flag found"
                    );
                    flags.push(flag);
                }
                None => debug!(url = %url, "no red flag in source"),
            }
        }
        flags
    }
}

#[async_trait]
impl Reconnaissance for WebRecon {
    async fn gather(&self, target: &MissionTarget) -> Result<CompanyIntel> {
        info!(company = %target.company_name, url = %target.vacancy_url, "starting reconnaissance");

        let page = self.pages.fetch(&target.vacancy_url).await?;
        let salary_data = extract_salary(&page.text);
        let insights = self.vacancy.analyze(&page.text).await?;
        debug!(
            structure = insights.structure_type.as_str(),
            pace = insights.work_pace.as_str(),
            "vacancy analyzed"
        );

        let sector = insights
            .sector
            .or_else(|| guess_sector(&target.company_name).map(str::to_string))
            .unwrap_or_default();

        Ok(CompanyIntel {
            name: target.company_name.clone(),
            sector,
            structure_type: insights.structure_type,
            work_pace: insights.work_pace,
            culture_indicators: insights.culture_indicators,
            role_type: insights.role_type,
            salary_data,
            red_flags: self.scan_sources().await,
            ..Default::default()
        })
    }
}
