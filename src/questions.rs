use crate::models::{CandidateProfile, CompanyIntel, CultureMatch, InterviewQuestion};

pub const MAX_QUESTIONS: usize = 3;

const STRUCTURE_ASK_BELOW: u8 = 70;
const PACE_ASK_BELOW: u8 = 70;
const AUTONOMY_ASK_FROM: u8 = 6;

fn question(question: &str, reasoning: &str, what_to_listen_for: &str) -> InterviewQuestion {
    InterviewQuestion {
        question: question.to_string(),
        reasoning: reasoning.to_string(),
        what_to_listen_for: what_to_listen_for.to_string(),
    }
}

// Picks up to three questions in priority order: structure, autonomy,
// turnover, pace, red flags. Later rules are dropped once the quota is full.
pub fn select(
    candidate: &CandidateProfile,
    company: &CompanyIntel,
    culture_match: &CultureMatch,
) -> Vec<InterviewQuestion> {
    let mut questions = Vec::new();

    if culture_match.structure_match < STRUCTURE_ASK_BELOW {
        questions.push(question(
            "Can you walk me through how an important decision was made recently? \
             Who was involved and how long did it take?",
            "This reveals the real decision-making structure and speed.",
            "If it took weeks and involved many layers, that confirms a slow, hierarchical \
             culture.",
        ));
    }

    if candidate.autonomy_need >= AUTONOMY_ASK_FROM {
        questions.push(question(
            "How much room would I have to make decisions about my own work? \
             Can you give a concrete example?",
            "Tests whether the role offers enough autonomy.",
            "Vague answers or 'that depends on...' suggest limited freedom.",
        ));
    }

    questions.push(question(
        "What has turnover in this team looked like over the past year? Why did people leave?",
        "High turnover is a red flag for culture problems.",
        "Evasive answers or 'career moves' without details are suspect.",
    ));

    if culture_match.pace_match < PACE_ASK_BELOW {
        questions.push(question(
            "How would you describe the pace and dynamics of this team? \
             How quickly do priorities change?",
            "Validates whether the pace fits your expectations.",
            "Compare their description with your ideal working rhythm.",
        ));
    }

    if !company.red_flags.is_empty() {
        questions.push(question(
            "I read about [recent change/reorganization]. How has that affected the team?",
            "Tests transparency and honesty about difficult periods.",
            "Defensive reactions or downplaying are a warning sign.",
        ));
    }

    questions.truncate(MAX_QUESTIONS);
    questions
}
