//! Per-user quiz session: Setup → Active → Completed.
//!
//! The session is an explicit value owned by the front-end and handed to every
//! handler. Each state carries only the data valid for it.

use std::fmt;
use std::mem;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::core::LowLevelClient;
use crate::error::{QuizError, SessionError};
use crate::generator::{GenerationForm, QuizGenerator};
use crate::prompt::QuizRequest;
use crate::question::{OptionId, Question};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Score {
    pub correct: usize,
    pub total: usize,
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.correct, self.total)
    }
}

/// Count the selections that exactly match each question's correct option.
pub fn score_answers(questions: &[Question], answers: &[Option<OptionId>]) -> Score {
    let correct = questions
        .iter()
        .enumerate()
        .filter(|(i, q)| q.is_correct(answers.get(*i).copied().flatten()))
        .count();
    Score { correct, total: questions.len() }
}

#[derive(Debug, Clone, Default)]
pub enum QuizSession {
    #[default]
    Setup,
    Active {
        request: QuizRequest,
        questions: Vec<Question>,
        answers: Vec<Option<OptionId>>,
        started_at: DateTime<Utc>,
    },
    Completed {
        request: QuizRequest,
        questions: Vec<Question>,
        answers: Vec<Option<OptionId>>,
        score: Score,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    },
}

impl QuizSession {
    pub fn new() -> Self {
        Self::Setup
    }

    /// Run one generation attempt and, on success, move Setup → Active.
    /// Any failure leaves the session exactly as it was.
    #[instrument(target = "mcq_forge::session", skip_all)]
    pub async fn generate<C: LowLevelClient>(
        &mut self,
        generator: &QuizGenerator<C>,
        form: &GenerationForm,
    ) -> Result<usize, QuizError> {
        if !self.is_setup() {
            return Err(SessionError::AlreadyStarted.into());
        }
        let questions = generator.generate(form).await?;
        self.start(form.request.clone(), questions)?;
        Ok(self.questions().len())
    }

    /// Move Setup → Active with every answer unset.
    pub fn start(&mut self, request: QuizRequest, questions: Vec<Question>) -> Result<(), SessionError> {
        if !self.is_setup() {
            return Err(SessionError::AlreadyStarted);
        }
        if questions.is_empty() {
            return Err(SessionError::EmptyQuiz);
        }
        info!(target = "mcq_forge::session", count = questions.len(), "quiz started");
        let answers = vec![None; questions.len()];
        *self = Self::Active { request, questions, answers, started_at: Utc::now() };
        Ok(())
    }

    /// Record the selection for question `index`, replacing any earlier one.
    ///
    /// Returns `Ok(false)` once the quiz is completed; selections are frozen.
    pub fn select(&mut self, index: usize, option: OptionId) -> Result<bool, SessionError> {
        match self {
            Self::Setup => Err(SessionError::NoActiveQuiz),
            Self::Active { answers, .. } => {
                let total = answers.len();
                let slot = answers
                    .get_mut(index)
                    .ok_or(SessionError::QuestionOutOfRange { index, total })?;
                *slot = Some(option);
                debug!(target = "mcq_forge::session", index, %option, "answer selected");
                Ok(true)
            }
            Self::Completed { questions, .. } => {
                if index >= questions.len() {
                    return Err(SessionError::QuestionOutOfRange { index, total: questions.len() });
                }
                Ok(false)
            }
        }
    }

    /// Move Active → Completed and compute the score. Finishing an already
    /// completed quiz returns the stored score.
    pub fn finish(&mut self) -> Result<Score, SessionError> {
        match mem::take(self) {
            Self::Setup => Err(SessionError::NoActiveQuiz),
            Self::Active { request, questions, answers, started_at } => {
                let score = score_answers(&questions, &answers);
                info!(target = "mcq_forge::session", %score, "quiz finished");
                *self = Self::Completed {
                    request,
                    questions,
                    answers,
                    score,
                    started_at,
                    finished_at: Utc::now(),
                };
                Ok(score)
            }
            completed @ Self::Completed { .. } => {
                let score = completed.score();
                *self = completed;
                score.ok_or(SessionError::NoActiveQuiz)
            }
        }
    }

    pub fn is_setup(&self) -> bool {
        matches!(self, Self::Setup)
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    pub fn request(&self) -> Option<&QuizRequest> {
        match self {
            Self::Setup => None,
            Self::Active { request, .. } | Self::Completed { request, .. } => Some(request),
        }
    }

    pub fn questions(&self) -> &[Question] {
        match self {
            Self::Setup => &[],
            Self::Active { questions, .. } | Self::Completed { questions, .. } => questions,
        }
    }

    pub fn answers(&self) -> &[Option<OptionId>] {
        match self {
            Self::Setup => &[],
            Self::Active { answers, .. } | Self::Completed { answers, .. } => answers,
        }
    }

    pub fn answer(&self, index: usize) -> Option<OptionId> {
        self.answers().get(index).copied().flatten()
    }

    pub fn answered_count(&self) -> usize {
        self.answers().iter().filter(|a| a.is_some()).count()
    }

    pub fn score(&self) -> Option<Score> {
        match self {
            Self::Completed { score, .. } => Some(*score),
            _ => None,
        }
    }

    /// Time spent on the quiz so far, or in total once completed.
    pub fn elapsed(&self) -> Option<Duration> {
        match self {
            Self::Setup => None,
            Self::Active { started_at, .. } => Some(Utc::now() - *started_at),
            Self::Completed { started_at, finished_at, .. } => Some(*finished_at - *started_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Subject;
    use crate::prompt::{Difficulty, QuestionCount};

    fn question(correct: OptionId) -> Question {
        Question {
            question: "Q".into(),
            options: ["A".into(), "B".into(), "C".into(), "D".into()],
            solution: None,
            hints: None,
            correct_answer: correct,
        }
    }

    fn request() -> QuizRequest {
        QuizRequest::new(Subject::Chemistry, "Solutions", QuestionCount::new(2).unwrap(), Difficulty::Easy).unwrap()
    }

    fn active() -> QuizSession {
        let mut session = QuizSession::new();
        session
            .start(request(), vec![question(OptionId::Option1), question(OptionId::Option3)])
            .unwrap();
        session
    }

    #[test]
    fn setup_rejects_selection_and_finish() {
        let mut session = QuizSession::new();
        assert_eq!(session.select(0, OptionId::Option1), Err(SessionError::NoActiveQuiz));
        assert_eq!(session.finish(), Err(SessionError::NoActiveQuiz));
        assert!(session.is_setup());
    }

    #[test]
    fn start_requires_questions() {
        let mut session = QuizSession::new();
        assert_eq!(session.start(request(), vec![]), Err(SessionError::EmptyQuiz));
        assert!(session.is_setup());
    }

    #[test]
    fn reselecting_overwrites() {
        let mut session = active();
        assert_eq!(session.select(1, OptionId::Option2), Ok(true));
        assert_eq!(session.select(1, OptionId::Option3), Ok(true));
        assert_eq!(session.answer(1), Some(OptionId::Option3));
        assert_eq!(session.answered_count(), 1);
    }

    #[test]
    fn out_of_range_selection_is_an_error() {
        let mut session = active();
        assert_eq!(
            session.select(2, OptionId::Option1),
            Err(SessionError::QuestionOutOfRange { index: 2, total: 2 })
        );
    }

    #[test]
    fn completed_session_is_frozen() {
        let mut session = active();
        session.select(0, OptionId::Option1).unwrap();
        let score = session.finish().unwrap();
        assert_eq!(score, Score { correct: 1, total: 2 });

        assert_eq!(session.select(0, OptionId::Option2), Ok(false));
        assert_eq!(session.answer(0), Some(OptionId::Option1));
        assert_eq!(session.finish(), Ok(score));
        assert!(session.is_completed());
        assert!(session.elapsed().is_some());
    }

    #[test]
    fn start_is_only_allowed_from_setup() {
        let mut session = active();
        assert_eq!(
            session.start(request(), vec![question(OptionId::Option1)]),
            Err(SessionError::AlreadyStarted)
        );
        assert_eq!(session.questions().len(), 2);
    }

    #[test]
    fn score_display() {
        assert_eq!(Score { correct: 2, total: 3 }.to_string(), "2 / 3");
    }
}
