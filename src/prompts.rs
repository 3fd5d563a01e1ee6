// Prompt templates for the AI-backed analyzers.
// Placeholders in `{braces}` are substituted with `str::replace` before sending.

// CV analysis. Replace `{cv_text}`.
pub const CV_ANALYSIS_TEMPLATE: &str = r#"You are a senior HR psychologist specialised in organisational culture and career matching.

Analyse the CV below and build an organisational profile of the candidate.

## CV TEXT:
{cv_text}

## INSTRUCTIONS

1. CULTURE TYPE: which kind of organisation fits this candidate best, judging by their work history?
   - "startup": small teams, chaos, speed, lots of ownership, few processes
   - "scale-up": growing company, building processes, dynamic but structured
   - "corporate": large organisation, matrix, politics, stability, slow decisions
   - "agency": client work, deadlines, varied projects
   - "nonprofit": mission driven, consensus, often slow decisions
   Signals: company names, job titles ("owner of" vs "part of team"), tenure (1-2 years = startup minded, 5+ = corporate minded), sector.

2. PACE AND STRUCTURE
   - "work_pace": "fast" | "moderate" | "slow"
   - "structure_preference": "flat" | "matrix" | "hierarchical"

3. WORK STYLE ("builder_vs_maintainer")
   - "builder": creates new things, starts projects
   - "optimizer": improves existing processes
   - "maintainer": keeps systems running, stability

4. TOLERANCES (integers 1-10)
   - "chaos_tolerance": copes with ambiguity and change
   - "autonomy_need": how much freedom they need

## OUTPUT FORMAT (JSON only, no other text):
{
    "name": "Candidate name",
    "skills": ["skill1", "skill2"],
    "experience_years": 5,
    "culture_type": "startup|scale-up|corporate|agency|nonprofit",
    "work_pace": "fast|moderate|slow",
    "structure_preference": "flat|matrix|hierarchical",
    "builder_vs_maintainer": "builder|optimizer|maintainer",
    "chaos_tolerance": 7,
    "autonomy_need": 8,
    "reasoning": "Short explanation of the classification"
}"#;

// Culture match analysis. Replace `{candidate_profile}`, `{company_intel}`,
// `{company_name}`, `{job_title}` and `{vacancy_url}`.
pub const REALITY_CHECK_TEMPLATE: &str = r#"You are a career intelligence analyst who protects candidates from bad job matches.

## CANDIDATE PROFILE:
{candidate_profile}

## COMPANY INTELLIGENCE:
{company_intel}

## VACANCY:
Company: {company_name}
Role: {job_title}
URL: {vacancy_url}

## TASK

A. Compare the candidate's structure preference and pace with the company's. Score each 0-100.
B. List specific warnings for risky mismatches, e.g. "You come from a flat startup; this is a matrix organisation where decisions pass several layers."
C. List absolute deal breakers, if any.

## OUTPUT FORMAT (JSON only, no other text):
{
    "fit_score": 65,
    "structure_match": 70,
    "pace_match": 50,
    "autonomy_match": 60,
    "warnings": [
        {"type": "culture_clash|pace_mismatch|autonomy_conflict|growth_concern", "severity": "low|medium|high", "message": "Detailed warning"}
    ],
    "deal_breakers": ["Absolute no-gos, if any"],
    "overall_assessment": "Two or three sentence summary"
}"#;

// Vacancy page analysis. Replace `{vacancy_text}`.
pub const VACANCY_ANALYSIS_TEMPLATE: &str = r#"Analyse the following vacancy text and company information.

## VACANCY TEXT:
{vacancy_text}

## TASK
1. "sector": which sector does the company operate in?
2. "structure_type": "flat" (few layers), "matrix" (multiple reporting lines), "hierarchical" (traditional), or "unknown".
   Hints: "agile", "squads", "tribes" point to modern/flat; "departments", "business units", "matrix" point to corporate.
3. "work_pace": "fast" (startup-like), "moderate", "slow" (large organisation, lots of consultation), or "unknown".
4. "culture_indicators": words or phrases that hint at the culture.
5. "role_type": is this a "builder", "optimizer" or "maintainer" role?

## OUTPUT FORMAT (JSON only):
{
    "sector": "Sector",
    "structure_type": "flat|matrix|hierarchical|unknown",
    "work_pace": "fast|moderate|slow|unknown",
    "culture_indicators": ["indicator1", "indicator2"],
    "role_type": "builder|optimizer|maintainer",
    "reasoning": "Explanation"
}"#;
