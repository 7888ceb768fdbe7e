use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::Duration;

use crate::config::Config;
use crate::error::{QuizError, Result};
use crate::ledger::Ledger;
use crate::question::{self, Question};
use crate::session::{QuizSession, Verdict};
use crate::store::KvStore;
use crate::view::{Card, TimerTone, ViewModel};

/// What the event loop should do after handling an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Composition root: wires the quiz session, the ledger and the view, and
/// maps input onto them.
#[derive(Debug)]
pub struct App<S: KvStore> {
    config: Config,
    questions: Vec<Question>,
    view: ViewModel,
    ledger: Ledger<S>,
    session: Option<QuizSession>,
}

impl<S: KvStore> App<S> {
    pub fn new(config: Config, questions: Vec<Question>, store: S) -> Result<Self> {
        let mut view = ViewModel::new(config.toast_ttl());
        let mut ledger = Ledger::new(store);
        ledger.load(&mut view)?;

        Ok(Self {
            config,
            questions,
            view,
            ledger,
            session: None,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn view(&self) -> &ViewModel {
        &self.view
    }

    pub fn ledger(&self) -> &Ledger<S> {
        &self.ledger
    }

    pub fn session(&self) -> Option<&QuizSession> {
        self.session.as_ref()
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// Builds a fresh session (and countdown) and starts it.
    pub fn start_quiz(&mut self) -> Result<()> {
        if let Some(previous) = self.session.as_mut() {
            previous.abandon();
        }

        let mut questions = self.questions.clone();
        if self.config.shuffle {
            question::shuffle(&mut questions);
        }
        let mut session = QuizSession::with_questions(
            questions,
            self.config.countdown(),
            self.config.session_config(),
        );

        let tone = self.view.tone_handle();
        session.on_timer_start(move |_| tone.set(TimerTone::Running));
        let tone = self.view.tone_handle();
        session.on_timer_end(move |_| tone.set(TimerTone::Ended));

        session.start(&mut self.view)?;
        self.session = Some(session);
        Ok(())
    }

    pub fn answer(&mut self, index: usize) -> Result<Verdict> {
        let session = self
            .session
            .as_mut()
            .ok_or(QuizError::InvalidState("no quiz in progress"))?;
        let verdict = session.answer(index, &mut self.view)?;
        self.view.push_toast(verdict);
        Ok(verdict)
    }

    /// Leaves a running quiz for the start card. The countdown is stopped
    /// so nothing fires against the discarded session. Once the last answer
    /// is in, the run is finished and its end card still comes up.
    pub fn abandon(&mut self) {
        if let Some(session) = self.session.as_mut() {
            if session.is_completed() {
                return;
            }
            session.abandon();
        }
        self.view.show_start();
    }

    /// Records the typed name against the last score. An empty name keeps
    /// the end card up with the inline indicator set.
    pub fn submit_score(&mut self) -> Result<()> {
        let score = self.session.as_ref().map_or(0, QuizSession::score);
        let name = self.view.name_input.clone();
        match self.ledger.record(&name, score, &mut self.view) {
            Ok(_) => {
                self.view.show_start();
                Ok(())
            }
            Err(QuizError::InvalidInput(reason)) => {
                log::debug!("score submission rejected: {reason}");
                self.view.name_error = true;
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    pub fn cancel_score(&mut self) {
        self.view.show_start();
    }

    pub fn clear_scores(&mut self) -> Result<()> {
        self.ledger.clear(&mut self.view)
    }

    pub fn on_tick(&mut self, elapsed: Duration) {
        if let Some(session) = self.session.as_mut() {
            session.advance(elapsed, &mut self.view);
        }
        self.view.advance(elapsed);
    }

    pub fn on_key(&mut self, key: KeyEvent) -> Flow {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.abandon();
            return Flow::Quit;
        }

        let outcome = match self.view.card() {
            Card::Start => match key.code {
                KeyCode::Esc | KeyCode::Char('q') => return Flow::Quit,
                KeyCode::Enter | KeyCode::Char('s') => self.start_quiz(),
                KeyCode::Char('c') => self.clear_scores(),
                _ => Ok(()),
            },
            Card::Question => match key.code {
                KeyCode::Esc => {
                    self.abandon();
                    Ok(())
                }
                KeyCode::Char(c) if c.is_ascii_digit() => self.answer_key(c),
                _ => Ok(()),
            },
            Card::End => match key.code {
                KeyCode::Esc => {
                    self.cancel_score();
                    Ok(())
                }
                KeyCode::Enter => self.submit_score(),
                KeyCode::Backspace => {
                    self.view.name_input.pop();
                    Ok(())
                }
                KeyCode::Char(c) if !c.is_control() => {
                    self.view.name_input.push(c);
                    self.view.name_error = false;
                    Ok(())
                }
                _ => Ok(()),
            },
        };

        match outcome {
            Ok(()) => {}
            Err(err @ QuizError::InvalidInput(_)) => log::debug!("ignored input: {err}"),
            Err(err) if err.is_invalid_state() => {
                log::error!("input reached the quiz in the wrong state: {err}")
            }
            Err(err) => log::error!("{err}"),
        }
        Flow::Continue
    }

    fn answer_key(&mut self, c: char) -> Result<()> {
        // input stays closed while a card is fading
        if self.session.as_ref().is_some_and(|s| s.is_transitioning()) || !self.view.is_visible() {
            return Ok(());
        }
        let index = question::parse_choice(&c.to_string())?
            .checked_sub(1)
            .ok_or_else(|| QuizError::invalid_input("options are numbered from 1"))?;
        self.answer(index).map(|_| ())
    }
}
