// Mission report rendering and persistence.
//
// Section order is fixed and downstream tooling may rely on it:
// header, executive summary, financial intelligence, culture shock,
// spy report, interview ammo, footer.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{Result, SpyError};
use crate::models::{
    MarketPosition, MissionReport, RedFlag, SalaryData, SalaryPeriod, Severity, Verdict,
    count_severity,
};

const MAX_FILENAME_COMPANY_LEN: usize = 30;
const SECTION_RULE: &str = "---\n\n";

// Green needs a strong fit and a clean record. Yellow is granted for a
// reasonable fit OR the absence of high-severity flags, so a very low fit
// with only minor flags still lands on yellow.
pub fn overall_verdict(fit_score: u8, red_flags: &[RedFlag]) -> Verdict {
    if fit_score >= 70 && red_flags.is_empty() {
        Verdict::Green
    } else if fit_score >= 40 || count_severity(red_flags, Severity::High) == 0 {
        Verdict::Yellow
    } else {
        Verdict::Red
    }
}

pub fn verdict_emoji(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Green => "🟢",
        Verdict::Yellow => "🟡",
        Verdict::Red => "🔴",
    }
}

pub fn verdict_text(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Green => "Likely a good match",
        Verdict::Yellow => "Cautiously optimistic - mind the warnings",
        Verdict::Red => "High risks - consider alternatives",
    }
}

fn score_emoji(score: u8) -> &'static str {
    match score {
        80..=u8::MAX => "🎯",
        60..=79 => "✅",
        40..=59 => "⚠️",
        _ => "🚨",
    }
}

fn severity_emoji(severity: Severity) -> &'static str {
    match severity {
        Severity::Low => "🟡",
        Severity::Medium => "🟠",
        Severity::High => "🔴",
    }
}

// Ten-cell proportional bar followed by the percentage.
pub fn match_bar(score: u8) -> String {
    let filled = usize::from(score.min(100) / 10);
    format!("{}{} {}%", "█".repeat(filled), "░".repeat(10 - filled), score)
}

fn currency_symbol(currency: &str) -> String {
    match currency.to_uppercase().as_str() {
        "EUR" => "€".to_string(),
        "USD" => "$".to_string(),
        "GBP" => "£".to_string(),
        other => format!("{} ", other),
    }
}

fn thousands(amount: u32) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn format_salary(amount: u32, salary: &SalaryData) -> String {
    let period = match salary.period {
        SalaryPeriod::Month => "month",
        SalaryPeriod::Year => "year",
    };
    format!("{}{}/{}", currency_symbol(&salary.currency), thousands(amount), period)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn header_section(report: &MissionReport) -> String {
    let verdict = report.overall_verdict();
    let culture_match = report.culture_match();

    format!(
        "# 🕵️ THE CAREER SPY\n\
         ## Mission Report\n\n\
         **Target:** {}\n\
         **Role:** {}\n\
         **URL:** {}\n\n\
         ---\n\n\
         ## 📊 Executive Summary\n\n\
         **Overall Verdict:** {} {} ({})\n\n\
         | Metric | Score |\n\
         |--------|-------|\n\
         | Culture Fit | {}% |\n\
         | Risk Level | {} |\n\
         | Red Flags | {} |\n\n",
        report.company_name(),
        report.job_title(),
        report.vacancy_url(),
        verdict_emoji(verdict),
        verdict_text(verdict),
        verdict.as_str().to_uppercase(),
        culture_match.fit_score,
        culture_match.risk_level.as_str().to_uppercase(),
        report.red_flags().len(),
    )
}

fn financial_section(report: &MissionReport) -> String {
    let salary = report.salary_prediction();
    let mut section = String::from("## 💰 Financial Intelligence\n\n");

    if salary.is_known() {
        let _ = write!(
            section,
            "**Estimated Salary:** {} - {}\n**Confidence:** {}%\n\n",
            format_salary(salary.min_salary, salary),
            format_salary(salary.max_salary, salary),
            salary.confidence
        );
        for sample in &salary.external_ranges {
            let _ = writeln!(
                section,
                "- {}: {} - {}",
                sample.source,
                format_salary(sample.min, salary),
                format_salary(sample.max, salary)
            );
        }
        if !salary.external_ranges.is_empty() {
            section.push('\n');
        }
    } else {
        section.push_str(
            "**Salary:** Unknown - no data found\n\n\
             > 💡 **Tip:** Ask for the salary band in the first conversation.\n\
             > \"What range do you use for this position?\"\n\n",
        );
    }

    match &salary.labor_agreement {
        Some(agreement) => {
            let _ = write!(
                section,
                "**Labor Agreement (CAO):** ✅ Yes - {}\n\
                 > A collective agreement sets minimum pay, holidays and pension.\n\n",
                agreement
            );
        }
        None => section.push_str(
            "**Labor Agreement (CAO):** ❌ None found\n\
             > ⚠️ Without a collective agreement everything is negotiable. \
             Be sharp on secondary conditions!\n\n",
        ),
    }

    match salary.market_position {
        MarketPosition::BelowMarket => section.push_str(
            "**Market Position:** 📉 Below market average\n\
             > This salary looks below average for comparable positions.\n\n",
        ),
        MarketPosition::AboveMarket => section.push_str(
            "**Market Position:** 📈 Above market average\n\
             > Good news: this looks like a competitive salary.\n\n",
        ),
        MarketPosition::AtMarket => {}
    }

    section
}

fn culture_section(report: &MissionReport) -> String {
    let culture_match = report.culture_match();
    let candidate = report.candidate_profile();
    let company = report.company_intel();

    let mut section = format!(
        "## ⚠️ Culture Shock Warning\n\n\
         **Fit Score:** {} {}%\n\n\
         {}\n\n\
         ### Your Profile vs. This Company\n\n\
         | Aspect | 👤 You | 🏢 Company | Match |\n\
         |--------|--------|-----------|-------|\n\
         | Structure | {} | {} | {} |\n\
         | Pace | {} | {} | {} |\n\
         | Autonomy | {}/10 | - | {} |\n\
         | Type | {} | {} | - |\n\n",
        score_emoji(culture_match.fit_score),
        culture_match.fit_score,
        match_bar(culture_match.fit_score),
        capitalize(candidate.structure_preference.as_str()),
        capitalize(company.structure_type.as_str()),
        match_bar(culture_match.structure_match),
        capitalize(candidate.work_pace.as_str()),
        capitalize(company.work_pace.as_str()),
        match_bar(culture_match.pace_match),
        candidate.autonomy_need,
        match_bar(culture_match.autonomy_match),
        capitalize(candidate.builder_vs_maintainer.as_str()),
        company
            .role_type
            .map(|r| capitalize(r.as_str()))
            .unwrap_or_else(|| "-".to_string()),
    );

    let _ = write!(
        section,
        "### 🧬 Your Cultural DNA\n\
         - **Culture Type:** {}\n\
         - **Chaos Tolerance:** {} ({}/10)\n\
         - **Autonomy Need:** {} ({}/10)\n\n",
        candidate.culture_type.as_str().to_uppercase(),
        "🔥".repeat(usize::from(candidate.chaos_tolerance.min(10))),
        candidate.chaos_tolerance,
        "⭐".repeat(usize::from(candidate.autonomy_need.min(10))),
        candidate.autonomy_need,
    );

    if !culture_match.warnings.is_empty() {
        section.push_str("### ⚡ Critical Warnings\n\n");
        for warning in &culture_match.warnings {
            let _ = write!(section, "{}\n\n", warning);
        }
    }

    if !culture_match.deal_breakers.is_empty() {
        section.push_str("### 🛑 Potential Deal Breakers\n\n");
        for deal_breaker in &culture_match.deal_breakers {
            let _ = writeln!(section, "- **{}**", deal_breaker);
        }
        section.push('\n');
    }

    section
}

fn spy_section(report: &MissionReport) -> String {
    let red_flags = report.red_flags();
    let mut section = String::from("## 🕵️‍♂️ The Spy Report\n\n");

    if red_flags.is_empty() {
        section.push_str(
            "### ✅ No major red flags found\n\n\
             The search for negative news, reorganizations and employee complaints\n\
             turned up nothing worrying.\n\n\
             > **Note:** This does not mean there are no problems - only that they are\n\
             > not publicly visible. Always ask critical questions.\n\n",
        );
        return section;
    }

    let _ = write!(section, "### 🚩 {} Red Flag(s) Found\n\n", red_flags.len());
    for flag in red_flags {
        let source = if flag.source.trim().is_empty() {
            "Search result"
        } else {
            flag.source.as_str()
        };
        let _ = write!(
            section,
            "#### {} {}\n\
             - **Category:** {}\n\
             - **Severity:** {}\n\
             - **Source:** {}\n",
            severity_emoji(flag.severity),
            flag.headline,
            flag.category.label(),
            flag.severity.as_str().to_uppercase(),
            source,
        );
        if let Some(date) = &flag.date {
            let _ = writeln!(section, "- **Date:** {}", date);
        }
        if let Some(url) = &flag.url {
            let _ = writeln!(section, "- **Link:** {}", url);
        }
        section.push('\n');
    }

    section
}

fn interview_section(report: &MissionReport) -> String {
    let mut section =
        String::from("## 🎯 Interview Ammo\n\nAsk these questions to test the culture:\n\n");

    for (i, q) in report.interview_questions().iter().enumerate() {
        let _ = write!(
            section,
            "### Question {}\n\
             > **\"{}\"**\n\n\
             **Why ask:** {}\n\n\
             **Listen for:** {}\n\n\
             ---\n\n",
            i + 1,
            q.question,
            q.reasoning,
            q.what_to_listen_for,
        );
    }

    section
}

fn footer(report: &MissionReport) -> String {
    format!(
        "---\n\n\
         *Generated by The Career Spy*\n\
         *{}*\n\n\
         > 🔒 This report is confidential and intended for you only.\n\
         > Use your own judgement to make the final decision.\n",
        report.generated_at().format("%Y-%m-%d %H:%M")
    )
}

// Renders the full Markdown artifact.
pub fn compile(report: &MissionReport) -> String {
    let mut markdown = header_section(report);
    markdown.push_str(SECTION_RULE);
    markdown.push_str(&financial_section(report));
    markdown.push_str(SECTION_RULE);
    markdown.push_str(&culture_section(report));
    markdown.push_str(SECTION_RULE);
    markdown.push_str(&spy_section(report));
    markdown.push_str(SECTION_RULE);
    markdown.push_str(&interview_section(report));
    markdown.push_str(&footer(report));
    markdown
}

// Keeps alphanumerics, space, hyphen and underscore, capped at 30 chars.
pub fn sanitize_company_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .take(MAX_FILENAME_COMPANY_LEN)
        .collect()
}

pub fn artifact_file_name(report: &MissionReport) -> String {
    format!(
        "career_spy_report_{}_{}.md",
        sanitize_company_name(report.company_name()),
        report.generated_at().format("%Y%m%d_%H%M")
    )
}

// Compiles the report and writes it under `output_dir`, returning the path.
pub fn save(report: &MissionReport, output_dir: &Path) -> Result<PathBuf> {
    let markdown = compile(report);
    let path = output_dir.join(artifact_file_name(report));

    std::fs::create_dir_all(output_dir).map_err(|source| SpyError::Persist {
        path: output_dir.to_path_buf(),
        source,
    })?;
    std::fs::write(&path, markdown).map_err(|source| SpyError::Persist {
        path: path.clone(),
        source,
    })?;

    info!(path = %path.display(), verdict = %report.overall_verdict(), "mission report saved");
    Ok(path)
}
