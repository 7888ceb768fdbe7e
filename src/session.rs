use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use crate::error::{QuizError, Result};
use crate::question::{AnswerRecord, Question};
use crate::timer::Countdown;
use crate::view::QuizView;

pub const DEFAULT_PENALTY_SECS: u32 = 10;
pub const DEFAULT_FADE_MS: u64 = 150;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    Incorrect,
}

/// Why a session reached `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// Every question was answered.
    Exhausted,
    /// The countdown ran out first.
    Expired,
    /// The player navigated away mid-quiz.
    Abandoned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NotStarted,
    InProgress,
    Completed(EndReason),
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub penalty_secs: u32,
    pub fade: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            penalty_secs: DEFAULT_PENALTY_SECS,
            fade: Duration::from_millis(DEFAULT_FADE_MS),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fade {
    Out,
    In,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Then {
    NextQuestion,
    Reveal,
}

/// A card fade in flight. While one exists, answers are refused.
#[derive(Debug, Clone, Copy)]
struct Transition {
    fade: Fade,
    elapsed: Duration,
    then: Then,
}

impl Transition {
    fn out(then: Then) -> Self {
        Self {
            fade: Fade::Out,
            elapsed: Duration::ZERO,
            then,
        }
    }
}

/// Ordered run through a set of questions against a countdown.
#[derive(Debug)]
pub struct QuizSession {
    records: Vec<AnswerRecord>,
    position: usize,
    state: SessionState,
    timer: Countdown,
    config: SessionConfig,
    transition: Option<Transition>,
    expired: Rc<Cell<bool>>,
    end_hook_installed: bool,
    end_revealed: bool,
}

impl QuizSession {
    pub fn new(timer: Countdown, config: SessionConfig) -> Self {
        Self {
            records: Vec::new(),
            position: 0,
            state: SessionState::NotStarted,
            timer,
            config,
            transition: None,
            expired: Rc::new(Cell::new(false)),
            end_hook_installed: false,
            end_revealed: false,
        }
    }

    pub fn with_questions(
        questions: impl IntoIterator<Item = Question>,
        timer: Countdown,
        config: SessionConfig,
    ) -> Self {
        let mut session = Self::new(timer, config);
        session.records = questions.into_iter().map(AnswerRecord::new).collect();
        session
    }

    pub fn add_question(&mut self, question: Question) -> Result<&mut Self> {
        if self.state != SessionState::NotStarted {
            return Err(QuizError::InvalidState(
                "questions can only be added before the session starts",
            ));
        }
        self.records.push(AnswerRecord::new(question));
        Ok(self)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[AnswerRecord] {
        &self.records
    }

    pub fn current(&self) -> Option<&AnswerRecord> {
        self.records.get(self.position)
    }

    pub fn timer(&self) -> &Countdown {
        &self.timer
    }

    /// Registers an extra observer for the countdown starting.
    pub fn on_timer_start(&mut self, handler: impl FnMut(u32) + 'static) {
        self.timer.on_start(handler);
    }

    /// Registers an extra observer for the countdown ending, whatever the
    /// reason.
    pub fn on_timer_end(&mut self, handler: impl FnMut(u32) + 'static) {
        self.timer.on_end(handler);
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.state, SessionState::Completed(_))
    }

    pub fn end_revealed(&self) -> bool {
        self.end_revealed
    }

    pub fn correct_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_correct()).count()
    }

    /// Percentage of correct answers over all questions, rounded. Unanswered
    /// questions count against the score.
    pub fn score(&self) -> u8 {
        percentage(self.correct_count(), self.records.len())
    }

    pub fn start(&mut self, view: &mut impl QuizView) -> Result<()> {
        if self.records.is_empty() {
            return Err(QuizError::InvalidState("cannot start a quiz without questions"));
        }
        if self.state == SessionState::InProgress {
            return Err(QuizError::InvalidState("session already in progress"));
        }

        for record in &mut self.records {
            record.reset();
        }
        self.position = 0;
        self.transition = None;
        self.end_revealed = false;
        self.expired.set(false);

        if !self.end_hook_installed {
            let expired = Rc::clone(&self.expired);
            self.timer.on_end(move |_| expired.set(true));
            self.end_hook_installed = true;
        }

        self.state = SessionState::InProgress;
        self.show_current(view);
        self.timer.start();
        view.show_timer(self.timer.remaining());
        log::info!(
            "quiz started: {} questions, {}s on the clock",
            self.records.len(),
            self.timer.remaining()
        );
        Ok(())
    }

    pub fn answer(&mut self, index: usize, view: &mut impl QuizView) -> Result<Verdict> {
        if self.state != SessionState::InProgress {
            return Err(QuizError::InvalidState("no quiz in progress"));
        }
        if self.transition.is_some() {
            return Err(QuizError::InvalidState(
                "previous answer is still transitioning",
            ));
        }
        let penalty = self.config.penalty_secs;
        let record = self
            .records
            .get_mut(self.position)
            .ok_or(QuizError::InvalidState("no current question"))?;

        record.submit(index)?;
        let verdict = if record.is_correct() {
            Verdict::Correct
        } else {
            self.timer.penalize(penalty);
            view.show_timer(self.timer.remaining());
            Verdict::Incorrect
        };
        log::debug!(
            "question {} answered with option {index}: {verdict:?}",
            self.position + 1
        );

        self.position += 1;
        let then = if self.position == self.records.len() {
            self.state = SessionState::Completed(EndReason::Exhausted);
            log::info!("quiz completed, score {}", self.score());
            Then::Reveal
        } else {
            Then::NextQuestion
        };

        view.hide_card();
        self.transition = Some(Transition::out(then));
        Ok(verdict)
    }

    /// Drives the countdown and any pending fade by `elapsed` wall time.
    pub fn advance(&mut self, elapsed: Duration, view: &mut impl QuizView) {
        if self.timer.advance(elapsed).is_some() {
            view.show_timer(self.timer.remaining());
        }
        // a fade opened by expiry starts from zero on the next call
        if !self.consume_expiry(view) {
            self.advance_transition(elapsed, view);
        }
    }

    /// Completes any pending fade immediately, without touching the clock.
    pub fn skip_transition(&mut self, view: &mut impl QuizView) {
        while self.transition.is_some() {
            self.advance_transition(self.config.fade, view);
        }
    }

    /// Tears a running quiz down without revealing the end card. The
    /// countdown is stopped so no further ticks reach this session. A
    /// completed run is left alone, including one still fading toward its
    /// end card.
    pub fn abandon(&mut self) {
        if self.state != SessionState::InProgress {
            return;
        }
        self.state = SessionState::Completed(EndReason::Abandoned);
        log::info!("quiz abandoned at question {}", self.position + 1);
        self.transition = None;
        self.timer.stop();
        self.expired.set(false);
    }

    /// Forces completion if the countdown ended mid-quiz. Returns true when
    /// this opened a new fade.
    fn consume_expiry(&mut self, view: &mut impl QuizView) -> bool {
        if !self.expired.replace(false) || self.state != SessionState::InProgress {
            return false;
        }

        self.state = SessionState::Completed(EndReason::Expired);
        log::info!(
            "time ran out at question {}, score {}",
            self.position + 1,
            self.score()
        );
        match &mut self.transition {
            Some(t) if t.fade == Fade::Out => {
                t.then = Then::Reveal;
                false
            }
            _ => {
                view.hide_card();
                self.transition = Some(Transition::out(Then::Reveal));
                true
            }
        }
    }

    fn advance_transition(&mut self, elapsed: Duration, view: &mut impl QuizView) {
        let Some(mut t) = self.transition.take() else {
            return;
        };
        t.elapsed += elapsed;
        if t.elapsed < self.config.fade {
            self.transition = Some(t);
            return;
        }

        match (t.fade, t.then) {
            (Fade::Out, Then::NextQuestion) => {
                self.show_current(view);
                self.transition = Some(Transition {
                    fade: Fade::In,
                    elapsed: Duration::ZERO,
                    then: Then::NextQuestion,
                });
            }
            (Fade::Out, Then::Reveal) => self.reveal_end(view),
            (Fade::In, _) => {}
        }
    }

    fn show_current(&self, view: &mut impl QuizView) {
        if let Some(record) = self.current() {
            let question = record.question();
            view.show_question(&question.prompt, &question.options);
        }
    }

    fn reveal_end(&mut self, view: &mut impl QuizView) {
        if self.end_revealed {
            return;
        }
        self.end_revealed = true;
        self.timer.stop();
        self.expired.set(false);
        view.show_score(self.score());
        view.show_end_state();
    }
}

pub fn percentage(correct: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((correct as f64 / total as f64) * 100.0).round() as u8
}
