use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("grade must be between 1 and 6, got {0}")]
    InvalidGrade(u8),

    #[error("question text is empty")]
    EmptyText,

    #[error("achievement standard is empty")]
    EmptyAchievement,
}

/// Raised when a label does not name any variant of a curriculum enum.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown {kind}: {raw:?}")]
pub struct ParseEnumError {
    kind: &'static str,
    raw: String,
}

//
// ─── CURRICULUM ENUMS ─────────────────────────────────────────────────────────
//

// Each variant carries its persisted Korean label plus an ASCII alias for CLI input.
macro_rules! labeled_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $label:literal | $alias:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $label)] $variant, )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Korean label used in persisted data and generated prompts.
            #[must_use]
            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }

            /// ASCII alias accepted on the command line.
            #[must_use]
            pub fn alias(self) -> &'static str {
                match self {
                    $($name::$variant => $alias,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.label() == s || v.alias().eq_ignore_ascii_case(s))
                    .ok_or_else(|| ParseEnumError {
                        kind: $kind,
                        raw: s.to_string(),
                    })
            }
        }
    };
}

labeled_enum! {
    /// School subject a question belongs to.
    Subject, "subject" {
        Math => "수학" | "math",
        Science => "과학" | "science",
        Korean => "국어" | "korean",
        /// Only reachable through remote generation; no built-in seeds exist.
        Social => "사회" | "social",
    }
}

labeled_enum! {
    /// Cognitive level in the revised Bloom taxonomy.
    CognitiveLevel, "cognitive level" {
        Recognition => "기억" | "recognition",
        Understanding => "이해" | "understanding",
        Application => "적용" | "application",
        Analysis => "분석" | "analysis",
        Evaluation => "평가" | "evaluation",
        Creation => "창의" | "creation",
    }
}

labeled_enum! {
    Difficulty, "difficulty" {
        Low => "하" | "low",
        Medium => "중" | "medium",
        High => "상" | "high",
    }
}

labeled_enum! {
    QuestionType, "question type" {
        MultipleChoice => "객관식" | "multiple-choice",
        ShortAnswer => "단답형" | "short-answer",
        Descriptive => "서술형" | "descriptive",
        ProblemSolving => "문제해결" | "problem-solving",
        Exploration => "탐구형" | "exploration",
    }
}

impl Subject {
    /// Achievement standards taught for this subject.
    #[must_use]
    pub fn achievements(self) -> &'static [&'static str] {
        match self {
            Subject::Math => &["수 개념 이해", "사칙연산", "도형의 성질", "자료 해석", "문제 해결"],
            Subject::Science => &["관찰", "분류", "실험", "자연 현상 이해", "과학적 탐구"],
            Subject::Korean => &["읽기 이해", "어휘", "문법", "쓰기", "의사소통"],
            Subject::Social => &[],
        }
    }
}

//
// ─── GRADE ────────────────────────────────────────────────────────────────────
//

/// Elementary school grade, 1 through 6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Grade(u8);

impl Grade {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 6;

    /// # Errors
    ///
    /// Returns `QuestionError::InvalidGrade` outside 1..=6.
    pub fn new(value: u8) -> Result<Self, QuestionError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(QuestionError::InvalidGrade(value))
        }
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    pub fn all() -> impl Iterator<Item = Grade> {
        (Self::MIN..=Self::MAX).map(Grade)
    }
}

impl TryFrom<u8> for Grade {
    type Error = QuestionError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Grade> for u8 {
    fn from(grade: Grade) -> Self {
        grade.0
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//
// ─── LIFECYCLE ────────────────────────────────────────────────────────────────
//

/// Answer state of a question. `Correct` and `Incorrect` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionStatus {
    #[default]
    Pending,
    Correct,
    Incorrect,
}

impl QuestionStatus {
    #[must_use]
    pub fn is_pending(self) -> bool {
        matches!(self, QuestionStatus::Pending)
    }

    #[must_use]
    pub fn from_verdict(is_correct: bool) -> Self {
        if is_correct {
            QuestionStatus::Correct
        } else {
            QuestionStatus::Incorrect
        }
    }
}

impl fmt::Display for QuestionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            QuestionStatus::Pending => "pending",
            QuestionStatus::Correct => "correct",
            QuestionStatus::Incorrect => "incorrect",
        })
    }
}

/// Result of applying a verdict to a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Transition {
    /// The question left `Pending` and now holds this status.
    Applied(QuestionStatus),
    /// The question was already answered; nothing changed.
    Ignored(QuestionStatus),
}

impl Transition {
    #[must_use]
    pub fn is_applied(self) -> bool {
        matches!(self, Transition::Applied(_))
    }
}

//
// ─── QUESTION ─────────────────────────────────────────────────────────────────
//

/// Unvalidated question content, as produced by a generator or seed table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
    pub subject: Subject,
    pub grade: Grade,
    pub achievement: String,
    pub cognitive_level: CognitiveLevel,
    pub difficulty: Difficulty,
    pub kind: QuestionType,
    pub text: String,
    pub explanation: Option<String>,
    pub answer_key: Option<String>,
}

impl QuestionDraft {
    /// Validate the draft and turn it into a pending question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyText` or `QuestionError::EmptyAchievement`
    /// when the respective field is blank.
    pub fn validate(
        self,
        id: QuestionId,
        created_at: DateTime<Utc>,
    ) -> Result<Question, QuestionError> {
        let text = self.text.trim().to_string();
        if text.is_empty() {
            return Err(QuestionError::EmptyText);
        }
        let achievement = self.achievement.trim().to_string();
        if achievement.is_empty() {
            return Err(QuestionError::EmptyAchievement);
        }

        Ok(Question {
            id,
            subject: self.subject,
            grade: self.grade,
            achievement,
            cognitive_level: self.cognitive_level,
            difficulty: self.difficulty,
            kind: self.kind,
            text,
            explanation: normalize_optional(self.explanation),
            answer_key: normalize_optional(self.answer_key),
            user_answer: None,
            status: QuestionStatus::Pending,
            created_at,
        })
    }
}

/// A practice question and its answer state.
///
/// The serialized shape is the persisted pool format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    subject: Subject,
    grade: Grade,
    achievement: String,
    cognitive_level: CognitiveLevel,
    difficulty: Difficulty,
    #[serde(rename = "type")]
    kind: QuestionType,
    #[serde(rename = "question")]
    text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    answer_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_answer: Option<String>,
    #[serde(default)]
    status: QuestionStatus,
    #[serde(rename = "timestamp", with = "chrono::serde::ts_milliseconds")]
    created_at: DateTime<Utc>,
}

impl Question {
    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn subject(&self) -> Subject {
        self.subject
    }

    #[must_use]
    pub fn grade(&self) -> Grade {
        self.grade
    }

    #[must_use]
    pub fn achievement(&self) -> &str {
        &self.achievement
    }

    #[must_use]
    pub fn cognitive_level(&self) -> CognitiveLevel {
        self.cognitive_level
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn kind(&self) -> QuestionType {
        self.kind
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    #[must_use]
    pub fn answer_key(&self) -> Option<&str> {
        self.answer_key.as_deref()
    }

    #[must_use]
    pub fn user_answer(&self) -> Option<&str> {
        self.user_answer.as_deref()
    }

    #[must_use]
    pub fn status(&self) -> QuestionStatus {
        self.status
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status.is_pending()
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Record the validator's verdict for `user_answer`.
    ///
    /// Only a pending question transitions; answered questions keep their
    /// status and stored answer.
    pub fn apply_verdict(&mut self, user_answer: impl Into<String>, is_correct: bool) -> Transition {
        if !self.status.is_pending() {
            return Transition::Ignored(self.status);
        }
        self.status = QuestionStatus::from_verdict(is_correct);
        self.user_answer = Some(user_answer.into());
        Transition::Applied(self.status)
    }

    /// Copy of this question with new identity and text, reset to pending.
    #[must_use]
    pub(crate) fn derive(&self, id: QuestionId, text: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            text,
            created_at,
            user_answer: None,
            status: QuestionStatus::Pending,
            ..self.clone()
        }
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
