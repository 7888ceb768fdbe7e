use ratatui::{buffer::Buffer, layout::Rect};

use crate::app::App;
use crate::store::KvStore;
use crate::ui::{render_end, render_question, render_start};
use crate::view::Card;

/// A UI Screen boundary: one per card the quiz can show
pub trait Screen<S: KvStore> {
    fn render(&self, app: &App<S>, area: Rect, buf: &mut Buffer);
}

/// Start screen - title, high-score table and legend
pub struct StartScreen;

impl<S: KvStore> Screen<S> for StartScreen {
    fn render(&self, app: &App<S>, area: Rect, buf: &mut Buffer) {
        render_start(app, area, buf);
    }
}

/// Question screen - clock, prompt, numbered options and answer toasts
pub struct QuestionScreen;

impl<S: KvStore> Screen<S> for QuestionScreen {
    fn render(&self, app: &App<S>, area: Rect, buf: &mut Buffer) {
        render_question(app, area, buf);
    }
}

/// End screen - final score and name entry
pub struct EndScreen;

impl<S: KvStore> Screen<S> for EndScreen {
    fn render(&self, app: &App<S>, area: Rect, buf: &mut Buffer) {
        render_end(app, area, buf);
    }
}

/// Helper to construct the appropriate screen for the current card
pub fn current_screen<S: KvStore>(card: Card) -> Box<dyn Screen<S>> {
    match card {
        Card::Start => Box::new(StartScreen),
        Card::Question => Box::new(QuestionScreen),
        Card::End => Box::new(EndScreen),
    }
}
