//! Hand-authored seed templates that divergent variants are derived from.

use chrono::{DateTime, Utc};

use crate::model::{
    CognitiveLevel, Difficulty, Grade, Question, QuestionDraft, QuestionError, QuestionId,
    QuestionType, Subject,
};

struct SeedRow {
    id: &'static str,
    subject: Subject,
    grade: u8,
    achievement: &'static str,
    cognitive_level: CognitiveLevel,
    difficulty: Difficulty,
    kind: QuestionType,
    text: &'static str,
    answer_key: &'static str,
    explanation: &'static str,
}

const BUILTIN: &[SeedRow] = &[
    SeedRow {
        id: "seed-math-3-shapes",
        subject: Subject::Math,
        grade: 3,
        achievement: "도형의 성질",
        cognitive_level: CognitiveLevel::Creation,
        difficulty: Difficulty::High,
        kind: QuestionType::ProblemSolving,
        text: "피카츄가 전기 공격을 직선으로 발사하여 삼각형 모양의 경기장을 만들려고 해. 세 변의 길이가 각각 5m, 12m, 13m인 삼각형을 만들었을 때, 이 삼각형의 가장 큰 각은 예각, 직각, 둔각 중 무엇일까? 그 이유를 설명해봐!",
        answer_key: "직각",
        explanation: "피타고라스 정리에 의해 5^2 + 12^2 = 25 + 144 = 169이며, 이는 13^2(169)과 같습니다. 따라서 이 삼각형은 직각삼각형입니다.",
    },
    SeedRow {
        id: "seed-math-4-arithmetic",
        subject: Subject::Math,
        grade: 4,
        achievement: "사칙연산",
        cognitive_level: CognitiveLevel::Analysis,
        difficulty: Difficulty::Medium,
        kind: QuestionType::MultipleChoice,
        text: "지우가 몬스터볼 48개를 6명에게 똑같이 나누어 주었어. 그런데 이슬이가 나타나서 자기 몫의 절반을 다시 웅이에게 주었대. 웅이가 최종적으로 가지게 된 몬스터볼은 몇 개일까?",
        answer_key: "12개",
        explanation: "48 / 6 = 8개씩 나눴고, 이슬이가 가진 8개의 절반인 4개를 웅이(8개)에게 줬으니 8 + 4 = 12개입니다.",
    },
    SeedRow {
        id: "seed-science-5-observation",
        subject: Subject::Science,
        grade: 5,
        achievement: "관찰",
        cognitive_level: CognitiveLevel::Evaluation,
        difficulty: Difficulty::High,
        kind: QuestionType::Exploration,
        text: "번개 타입 포켓몬이 비 오는 날 더 강력한 공격을 할 수 있는 이유를 '물의 전도성'과 관련지어 과학적으로 추론해본다면?",
        answer_key: "이온 성분이 포함된 물이 전기를 더 잘 전달하기 때문",
        explanation: "순수한 물은 전기가 통하지 않지만, 빗물에 녹아있는 여러 이온 성분들이 전하를 운반하는 역할을 하여 전도성이 높아집니다.",
    },
    SeedRow {
        id: "seed-korean-6-communication",
        subject: Subject::Korean,
        grade: 6,
        achievement: "의사소통",
        cognitive_level: CognitiveLevel::Creation,
        difficulty: Difficulty::Medium,
        kind: QuestionType::Descriptive,
        text: "로켓단이 '우리가 나쁜 짓을 하는 건 세계 평화를 위해서다'라고 주장한다면, 이 주장의 논리적 모순점을 국어의 '논증 방식'을 사용하여 비판해봐.",
        answer_key: "목적과 수단의 비일관성",
        explanation: "세계 평화라는 긍정적 목적을 위해 나쁜 짓(부정적 수단)을 사용하는 것은 전제와 결론이 일치하지 않는 논리적 오류를 범하고 있습니다.",
    },
];

impl SeedRow {
    fn to_question(&self) -> Result<Question, QuestionError> {
        QuestionDraft {
            subject: self.subject,
            grade: Grade::new(self.grade)?,
            achievement: self.achievement.to_string(),
            cognitive_level: self.cognitive_level,
            difficulty: self.difficulty,
            kind: self.kind,
            text: self.text.to_string(),
            explanation: Some(self.explanation.to_string()),
            answer_key: Some(self.answer_key.to_string()),
        }
        .validate(QuestionId::new(self.id), DateTime::<Utc>::UNIX_EPOCH)
    }
}

/// Ordered collection of seed templates.
///
/// The first template doubles as the default seed used when remote generation fails.
#[derive(Debug, Clone, Default)]
pub struct SeedCatalog {
    seeds: Vec<Question>,
}

impl SeedCatalog {
    /// The built-in templates shipped with the app.
    #[must_use]
    pub fn builtin() -> Self {
        // Rows are static and covered by tests; a bad row is skipped rather than fatal.
        let seeds = BUILTIN.iter().filter_map(|row| row.to_question().ok()).collect();
        Self { seeds }
    }

    #[must_use]
    pub fn from_questions(seeds: Vec<Question>) -> Self {
        Self { seeds }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.seeds.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seeds.is_empty()
    }

    #[must_use]
    pub fn all(&self) -> &[Question] {
        &self.seeds
    }

    /// Templates for one subject and grade, in catalog order.
    #[must_use]
    pub fn matching(&self, subject: Subject, grade: Grade) -> Vec<&Question> {
        self.seeds
            .iter()
            .filter(|seed| seed.subject() == subject && seed.grade() == grade)
            .collect()
    }

    #[must_use]
    pub fn default_seed(&self) -> Option<&Question> {
        self.seeds.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_rows_are_all_valid() {
        for row in BUILTIN {
            row.to_question().unwrap();
        }
        assert_eq!(SeedCatalog::builtin().len(), BUILTIN.len());
    }

    #[test]
    fn matching_filters_by_subject_and_grade() {
        let catalog = SeedCatalog::builtin();
        let grade3 = Grade::new(3).unwrap();

        let math3 = catalog.matching(Subject::Math, grade3);
        assert_eq!(math3.len(), 1);
        assert_eq!(math3[0].answer_key(), Some("직각"));

        assert!(catalog.matching(Subject::Science, grade3).is_empty());
        assert!(catalog.matching(Subject::Social, Grade::new(5).unwrap()).is_empty());
    }

    #[test]
    fn default_seed_is_first_template() {
        let catalog = SeedCatalog::builtin();
        assert_eq!(
            catalog.default_seed().map(|q| q.id().as_str()),
            Some("seed-math-3-shapes")
        );
        assert!(SeedCatalog::default().default_seed().is_none());
    }
}
