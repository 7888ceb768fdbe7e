use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use crate::session::Verdict;

pub const DISPLAY_SLOTS: usize = 5;
pub const EMPTY_NAME: &str = "EMPTY";
pub const EMPTY_SCORE: &str = "00";
pub const DEFAULT_TOAST_MS: u64 = 3300;

/// Display surface the quiz core drives. Implementations may redraw a
/// terminal, record calls for tests, or anything else.
pub trait QuizView {
    fn show_question(&mut self, prompt: &str, options: &[String]);
    /// Fade the current card out ahead of a content change.
    fn hide_card(&mut self);
    fn show_score(&mut self, percent: u8);
    fn show_end_state(&mut self);
    fn show_timer(&mut self, remaining_secs: u32);
    fn reset_high_score_display(&mut self);
    /// `rank` is 1-based.
    fn set_high_score_row(&mut self, rank: usize, name: &str, score: u8);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Card {
    Start,
    Question,
    End,
}

/// Color cue for the clock: green while counting, red once it ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimerTone {
    #[default]
    Idle,
    Running,
    Ended,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreRow {
    pub name: String,
    pub score: String,
}

impl ScoreRow {
    pub fn placeholder() -> Self {
        Self {
            name: EMPTY_NAME.to_string(),
            score: EMPTY_SCORE.to_string(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.name == EMPTY_NAME && self.score == EMPTY_SCORE
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub verdict: Verdict,
    pub remaining: Duration,
}

impl Toast {
    pub fn label(&self) -> &'static str {
        match self.verdict {
            Verdict::Correct => "Correct",
            Verdict::Incorrect => "Incorrect",
        }
    }
}

/// Everything the terminal renderer needs, updated through [`QuizView`].
#[derive(Debug)]
pub struct ViewModel {
    card: Card,
    visible: bool,
    prompt: String,
    options: Vec<String>,
    timer: Option<u32>,
    tone: Rc<Cell<TimerTone>>,
    score: Option<u8>,
    rows: Vec<ScoreRow>,
    toasts: Vec<Toast>,
    toast_ttl: Duration,
    pub name_input: String,
    pub name_error: bool,
}

impl Default for ViewModel {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_TOAST_MS))
    }
}

impl ViewModel {
    pub fn new(toast_ttl: Duration) -> Self {
        Self {
            card: Card::Start,
            visible: true,
            prompt: String::new(),
            options: Vec::new(),
            timer: None,
            tone: Rc::new(Cell::new(TimerTone::Idle)),
            score: None,
            rows: vec![ScoreRow::placeholder(); DISPLAY_SLOTS],
            toasts: Vec::new(),
            toast_ttl,
            name_input: String::new(),
            name_error: false,
        }
    }

    pub fn card(&self) -> Card {
        self.card
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn timer(&self) -> Option<u32> {
        self.timer
    }

    pub fn tone(&self) -> TimerTone {
        self.tone.get()
    }

    /// Shared cell for countdown observers to paint the timer tone.
    pub fn tone_handle(&self) -> Rc<Cell<TimerTone>> {
        Rc::clone(&self.tone)
    }

    pub fn score(&self) -> Option<u8> {
        self.score
    }

    pub fn high_score_rows(&self) -> &[ScoreRow] {
        &self.rows
    }

    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    /// Back to the start card, e.g. after submitting or cancelling a score.
    pub fn show_start(&mut self) {
        self.card = Card::Start;
        self.visible = true;
        self.name_input.clear();
        self.name_error = false;
    }

    pub fn push_toast(&mut self, verdict: Verdict) {
        self.toasts.push(Toast {
            verdict,
            remaining: self.toast_ttl,
        });
    }

    /// Ages toasts and drops expired ones.
    pub fn advance(&mut self, elapsed: Duration) {
        for toast in &mut self.toasts {
            toast.remaining = toast.remaining.saturating_sub(elapsed);
        }
        self.toasts.retain(|t| !t.remaining.is_zero());
    }
}

impl QuizView for ViewModel {
    fn show_question(&mut self, prompt: &str, options: &[String]) {
        self.card = Card::Question;
        self.visible = true;
        self.prompt = prompt.to_string();
        self.options = options.to_vec();
    }

    fn hide_card(&mut self) {
        self.visible = false;
    }

    fn show_score(&mut self, percent: u8) {
        self.score = Some(percent);
    }

    fn show_end_state(&mut self) {
        self.card = Card::End;
        self.visible = true;
        self.name_input.clear();
        self.name_error = false;
    }

    fn show_timer(&mut self, remaining_secs: u32) {
        self.timer = Some(remaining_secs);
    }

    fn reset_high_score_display(&mut self) {
        self.rows = vec![ScoreRow::placeholder(); DISPLAY_SLOTS];
    }

    fn set_high_score_row(&mut self, rank: usize, name: &str, score: u8) {
        if let Some(row) = rank.checked_sub(1).and_then(|i| self.rows.get_mut(i)) {
            *row = ScoreRow {
                name: name.to_string(),
                score: score.to_string(),
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_view_shows_start_with_placeholders() {
        let view = ViewModel::default();
        assert_eq!(view.card(), Card::Start);
        assert!(view.is_visible());
        assert_eq!(view.high_score_rows().len(), DISPLAY_SLOTS);
        assert!(view.high_score_rows().iter().all(ScoreRow::is_placeholder));
        assert_eq!(view.tone(), TimerTone::Idle);
    }

    #[test]
    fn test_show_question_then_hide() {
        let mut view = ViewModel::default();
        let options: Vec<String> = ["a", "b", "c", "d"].map(String::from).to_vec();
        view.show_question("why?", &options);
        assert_eq!(view.card(), Card::Question);
        assert_eq!(view.prompt(), "why?");
        assert_eq!(view.options(), options.as_slice());

        view.hide_card();
        assert!(!view.is_visible());
        assert_eq!(view.card(), Card::Question);
    }

    #[test]
    fn test_set_high_score_row_bounds() {
        let mut view = ViewModel::default();
        view.set_high_score_row(1, "ada", 100);
        view.set_high_score_row(0, "ignored", 1);
        view.set_high_score_row(6, "ignored", 1);

        let rows = view.high_score_rows();
        assert_eq!(rows[0].name, "ada");
        assert_eq!(rows[0].score, "100");
        assert!(rows[1..].iter().all(ScoreRow::is_placeholder));

        view.reset_high_score_display();
        assert!(view.high_score_rows().iter().all(ScoreRow::is_placeholder));
    }

    #[test]
    fn test_toasts_expire() {
        let mut view = ViewModel::new(Duration::from_millis(100));
        view.push_toast(Verdict::Correct);
        view.advance(Duration::from_millis(60));
        view.push_toast(Verdict::Incorrect);
        assert_eq!(view.toasts().len(), 2);

        view.advance(Duration::from_millis(40));
        assert_eq!(view.toasts().len(), 1);
        assert_eq!(view.toasts()[0].label(), "Incorrect");

        view.advance(Duration::from_millis(100));
        assert!(view.toasts().is_empty());
    }

    #[test]
    fn test_end_state_clears_name_entry() {
        let mut view = ViewModel::default();
        view.name_input.push_str("bob");
        view.name_error = true;
        view.show_score(60);
        view.show_end_state();
        assert_eq!(view.card(), Card::End);
        assert_eq!(view.score(), Some(60));
        assert!(view.name_input.is_empty());
        assert!(!view.name_error);
    }

    #[test]
    fn test_tone_handle_is_shared() {
        let view = ViewModel::default();
        view.tone_handle().set(TimerTone::Running);
        assert_eq!(view.tone(), TimerTone::Running);
    }
}
