pub mod screen;

use chrono::{DateTime, Utc};
use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};
use time_humanize::{Accuracy, HumanTime, Tense};
use unicode_width::UnicodeWidthStr;

use crate::app::App;
use crate::ledger::HighScore;
use crate::session::Verdict;
use crate::store::KvStore;
use crate::view::{TimerTone, DISPLAY_SLOTS};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;
/// Longest name shown in the entry field before it scrolls.
const NAME_FIELD_WIDTH: usize = 24;

impl<S: KvStore> Widget for &App<S> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        screen::current_screen::<S>(self.view().card()).render(self, area, buf);
    }
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim_bold() -> Style {
    bold().add_modifier(Modifier::DIM)
}

fn legend(text: &str) -> Paragraph<'_> {
    Paragraph::new(Span::styled(
        text,
        Style::default().add_modifier(Modifier::ITALIC),
    ))
}

pub(crate) fn render_start<S: KvStore>(app: &App<S>, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(2),
            Constraint::Length(DISPLAY_SLOTS as u16 + 1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    Paragraph::new(Span::styled(
        "Coding Quiz Challenge",
        bold().fg(Color::Magenta),
    ))
    .alignment(Alignment::Center)
    .render(chunks[0], buf);

    let cfg = app.config();
    Paragraph::new(Span::styled(
        format!(
            "{} questions from the {} bank, {}s on the clock, {}s off per wrong answer",
            app.question_count(),
            cfg.bank,
            cfg.time_secs,
            cfg.penalty_secs
        ),
        dim_bold(),
    ))
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .render(chunks[1], buf);

    let now = Utc::now();
    let entries = app.ledger().top_n(DISPLAY_SLOTS);
    let mut lines = vec![Line::from(Span::styled("High scores", bold()))];
    lines.extend(
        app.view()
            .high_score_rows()
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let when = entries
                    .get(i)
                    .map(|e| recorded_ago(e, now))
                    .unwrap_or_default();
                let style = if row.is_placeholder() {
                    dim_bold()
                } else {
                    bold()
                };
                Line::from(vec![
                    Span::styled(format!("{}. {:<16} {:>3}", i + 1, row.name, row.score), style),
                    Span::styled(format!("  {when}"), Style::default().fg(Color::Gray)),
                ])
            }),
    );
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

    legend("(enter) start / (c)lear scores / (esc)ape").render(chunks[4], buf);
}

pub(crate) fn render_question<S: KvStore>(app: &App<S>, area: Rect, buf: &mut Buffer) {
    let view = app.view();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(3),
            Constraint::Length(view.options().len() as u16 + 1),
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

    let tone = match view.tone() {
        TimerTone::Idle => dim_bold(),
        TimerTone::Running => bold().fg(Color::Green),
        TimerTone::Ended => bold().fg(Color::Red),
    };
    Paragraph::new(Span::styled(
        format!("Time: {}", view.timer().unwrap_or_default()),
        tone,
    ))
    .alignment(Alignment::Right)
    .render(chunks[0], buf);

    // a fading card keeps its layout but drops to dim
    let card_style = if view.is_visible() { bold() } else { dim_bold() };

    Paragraph::new(Span::styled(view.prompt(), card_style))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[1], buf);

    let options = view
        .options()
        .iter()
        .enumerate()
        .map(|(i, option)| Line::from(Span::styled(format!("{}. {option}", i + 1), card_style)))
        .collect_vec();
    Paragraph::new(options)
        .wrap(Wrap { trim: false })
        .render(chunks[2], buf);

    let toasts = Itertools::intersperse(
        view.toasts().iter().map(|t| {
            let color = match t.verdict {
                Verdict::Correct => Color::Green,
                Verdict::Incorrect => Color::Red,
            };
            Span::styled(t.label(), bold().fg(color))
        }),
        Span::raw("  "),
    )
    .collect_vec();
    Paragraph::new(Line::from(toasts))
        .alignment(Alignment::Center)
        .render(chunks[4], buf);

    legend("(1-4) answer / (esc) back to start").render(chunks[5], buf);
}

pub(crate) fn render_end<S: KvStore>(app: &App<S>, area: Rect, buf: &mut Buffer) {
    let view = app.view();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(2),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    Paragraph::new(Span::styled("All done!", bold().fg(Color::Magenta)))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    Paragraph::new(Span::styled(
        format!("Your final score is {}", view.score().unwrap_or_default()),
        bold(),
    ))
    .alignment(Alignment::Center)
    .render(chunks[1], buf);

    Paragraph::new(Line::from(vec![
        Span::styled("Enter initials: ", dim_bold()),
        Span::styled(
            name_field(&view.name_input, NAME_FIELD_WIDTH),
            bold().add_modifier(Modifier::UNDERLINED),
        ),
    ]))
    .alignment(Alignment::Center)
    .render(chunks[2], buf);

    if view.name_error {
        Paragraph::new(Span::styled(
            "a name is required",
            Style::default().fg(Color::Red).add_modifier(Modifier::ITALIC),
        ))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);
    }

    legend("(enter) submit / (esc) skip").render(chunks[5], buf);
}

/// Tail of the typed name that fits in `width` columns, padded to it.
fn name_field(input: &str, width: usize) -> String {
    let mut shown = input;
    while shown.width() > width {
        let mut chars = shown.chars();
        chars.next();
        shown = chars.as_str();
    }
    let pad = width.saturating_sub(shown.width());
    format!("{shown}{}", " ".repeat(pad))
}

fn recorded_ago(entry: &HighScore, now: DateTime<Utc>) -> String {
    let secs = (now - entry.recorded_at).num_seconds().max(0);
    HumanTime::from_seconds(secs).to_text_en(Accuracy::Rough, Tense::Past)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::question::Question;
    use crate::store::SqliteStore;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use std::time::Duration;

    fn create_test_app() -> App<SqliteStore> {
        let config = Config {
            fade_ms: 0,
            ..Config::default()
        };
        let questions = vec![
            Question::new(
                "Arrays in JavaScript can be used to store ____.",
                ["numbers", "strings", "booleans", "all of the above"],
                3,
            ),
            Question::new("2 + 2?", ["1", "2", "3", "4"], 3),
        ];
        App::new(config, questions, SqliteStore::open_in_memory().unwrap()).unwrap()
    }

    fn press(app: &mut App<SqliteStore>, c: char) {
        app.on_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
    }

    fn rendered(app: &App<SqliteStore>, area: Rect) -> String {
        let mut buffer = Buffer::empty(area);
        app.render(area, &mut buffer);
        buffer.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn test_start_card_lists_placeholders() {
        let app = create_test_app();
        let out = rendered(&app, Rect::new(0, 0, 80, 24));

        assert!(out.contains("Coding Quiz Challenge"));
        assert!(out.contains("High scores"));
        assert_eq!(out.matches("EMPTY").count(), DISPLAY_SLOTS);
        assert!(out.contains("(enter) start"));
    }

    #[test]
    fn test_question_card_shows_prompt_options_and_timer() {
        let mut app = create_test_app();
        press(&mut app, 's');
        let out = rendered(&app, Rect::new(0, 0, 100, 24));

        assert!(out.contains("Arrays in JavaScript"));
        assert!(out.contains("4. all of the above"));
        assert!(out.contains("Time: 75"));
    }

    #[test]
    fn test_timer_painted_by_tone() {
        let mut app = create_test_app();
        press(&mut app, 's');

        let area = Rect::new(0, 0, 80, 24);
        let mut buffer = Buffer::empty(area);
        (&app).render(area, &mut buffer);

        let timer_cell = buffer
            .content()
            .iter()
            .find(|c| c.symbol() == "T" && c.fg == Color::Green);
        assert!(timer_cell.is_some());
    }

    #[test]
    fn test_toast_after_answer() {
        let mut app = create_test_app();
        press(&mut app, 's');
        press(&mut app, '1');
        app.on_tick(Duration::ZERO);
        app.on_tick(Duration::ZERO);

        let out = rendered(&app, Rect::new(0, 0, 80, 24));
        assert!(out.contains("Incorrect"));
        assert!(out.contains("Time: 65"));
        assert!(out.contains("2 + 2?"));
    }

    #[test]
    fn test_end_card_with_name_error() {
        let mut app = create_test_app();
        press(&mut app, 's');
        press(&mut app, '4');
        app.on_tick(Duration::ZERO);
        app.on_tick(Duration::ZERO);
        press(&mut app, '4');
        app.on_tick(Duration::ZERO);
        app.on_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));

        let out = rendered(&app, Rect::new(0, 0, 80, 24));
        assert!(out.contains("Your final score is 100"));
        assert!(out.contains("a name is required"));
    }

    #[test]
    fn test_recorded_score_shows_on_start_card() {
        let mut app = create_test_app();
        press(&mut app, 's');
        press(&mut app, '4');
        app.on_tick(Duration::ZERO);
        app.on_tick(Duration::ZERO);
        press(&mut app, '1');
        app.on_tick(Duration::ZERO);
        for c in "zoe".chars() {
            press(&mut app, c);
        }
        app.on_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));

        let out = rendered(&app, Rect::new(0, 0, 80, 24));
        assert!(out.contains("zoe"));
        assert!(out.contains("50"));
        assert_eq!(out.matches("EMPTY").count(), DISPLAY_SLOTS - 1);
    }

    #[test]
    fn test_name_field_keeps_tail() {
        assert_eq!(name_field("ab", 4), "ab  ");
        assert_eq!(name_field("abcdef", 4), "cdef");
        // wide glyphs count two columns each
        assert_eq!(name_field("日本語", 4), "本語");
    }

    #[test]
    fn test_render_tiny_areas() {
        let mut app = create_test_app();
        for area in [Rect::new(0, 0, 20, 5), Rect::new(0, 0, 200, 5), Rect::new(0, 0, 12, 50)] {
            let mut buffer = Buffer::empty(area);
            (&app).render(area, &mut buffer);
            assert_eq!(*buffer.area(), area);
        }
        press(&mut app, 's');
        let area = Rect::new(0, 0, 20, 5);
        let mut buffer = Buffer::empty(area);
        (&app).render(area, &mut buffer);
        assert_eq!(*buffer.area(), area);
    }

    #[test]
    fn test_ui_constants_consistency() {
        const _: () = assert!(HORIZONTAL_MARGIN * 2 < 80);
        const _: () = assert!(VERTICAL_MARGIN * 2 < 24);
    }
}
