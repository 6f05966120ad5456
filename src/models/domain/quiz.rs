use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Marker the prompt asks the model to append to the correct answer.
pub const CORRECT_ANSWER_MARKER: &str = "(o)";

static QUESTION_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:\d+[.)]\s*)?question(?:\s*\d+)?\s*:\s*(.+?)\s*$")
        .expect("QUESTION_LINE is a valid regex pattern")
});

static ANSWERS_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*answers?\s*:\s*(.+?)\s*$").expect("ANSWERS_LINE is a valid regex pattern")
});

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuizAnswer {
    pub text: String,
    pub correct: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuizQuestion {
    pub question: String,
    pub answers: Vec<QuizAnswer>,
}

impl QuizQuestion {
    pub fn correct_answers(&self) -> impl Iterator<Item = &QuizAnswer> {
        self.answers.iter().filter(|a| a.correct)
    }
}

/// Best-effort structured view of the model output.
///
/// Nothing here is enforced: the raw text is always kept, and lines that do not
/// follow the `Question:` / `Answers:` convention are ignored.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ParsedQuiz {
    pub raw: String,
    pub questions: Vec<QuizQuestion>,
}

impl ParsedQuiz {
    pub fn parse(raw: &str) -> Self {
        let mut questions = Vec::new();
        let mut pending: Option<String> = None;

        for line in raw.lines() {
            if let Some(caps) = QUESTION_LINE.captures(line) {
                pending = Some(caps[1].to_string());
            } else if let Some(caps) = ANSWERS_LINE.captures(line) {
                let Some(question) = pending.take() else {
                    continue;
                };
                questions.push(QuizQuestion {
                    question,
                    answers: parse_answers(&caps[1]),
                });
            }
        }

        Self {
            raw: raw.to_string(),
            questions,
        }
    }
}

fn parse_answers(line: &str) -> Vec<QuizAnswer> {
    line.split('|')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(|a| {
            let correct = a.contains(CORRECT_ANSWER_MARKER);
            QuizAnswer {
                text: a.replace(CORRECT_ANSWER_MARKER, "").trim().to_string(),
                correct,
            }
        })
        .collect()
}
