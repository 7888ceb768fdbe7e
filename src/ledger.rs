use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;

use crate::error::{QuizError, Result};
use crate::store::KvStore;
use crate::view::{QuizView, ScoreRow, DISPLAY_SLOTS};

pub const LEDGER_KEY: &str = "high-scores";
pub const MAX_SCORE: u8 = 100;

/// One recorded quiz result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScore {
    pub name: String,
    #[serde(deserialize_with = "bounded_score")]
    pub score: u8,
    #[serde(rename = "date", with = "chrono::serde::ts_milliseconds")]
    pub recorded_at: DateTime<Utc>,
}

/// Stored scores above [`MAX_SCORE`] make the whole table unreadable.
fn bounded_score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let score = u8::deserialize(deserializer)?;
    if score > MAX_SCORE {
        return Err(de::Error::custom(format!(
            "score {score} above {MAX_SCORE}"
        )));
    }
    Ok(score)
}

impl HighScore {
    /// Higher score first; on equal scores the older entry wins.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .cmp(&self.score)
            .then_with(|| self.recorded_at.cmp(&other.recorded_at))
    }
}

/// Ranked high-score table persisted under a single key.
///
/// The load-modify-store sequence in [`Ledger::record`] assumes a single
/// writer; two processes recording at once can lose an entry.
#[derive(Debug)]
pub struct Ledger<S: KvStore> {
    store: S,
    entries: Vec<HighScore>,
}

impl<S: KvStore> Ledger<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            entries: Vec::new(),
        }
    }

    pub fn entries(&self) -> &[HighScore] {
        &self.entries
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reads the persisted table. A missing key is an empty table; data that
    /// does not parse is logged and replaced by an empty table.
    pub fn load(&mut self, view: &mut impl QuizView) -> Result<()> {
        self.entries = match self.read() {
            Ok(entries) => entries,
            Err(err @ QuizError::CorruptData(_)) => {
                log::warn!("discarding unreadable high scores: {err}");
                Vec::new()
            }
            Err(err) => return Err(err),
        };
        self.entries.sort_by(HighScore::rank_cmp);
        self.refresh_display(view);
        Ok(())
    }

    pub fn record(
        &mut self,
        name: &str,
        score: u8,
        view: &mut impl QuizView,
    ) -> Result<&HighScore> {
        self.record_at(name, score, Utc::now(), view)
    }

    pub fn record_at(
        &mut self,
        name: &str,
        score: u8,
        recorded_at: DateTime<Utc>,
        view: &mut impl QuizView,
    ) -> Result<&HighScore> {
        let name = name.trim();
        if name.is_empty() {
            return Err(QuizError::invalid_input("name must not be empty"));
        }
        if score > MAX_SCORE {
            return Err(QuizError::invalid_input(format!(
                "score {score} above {MAX_SCORE}"
            )));
        }

        self.load(view)?;
        let entry = HighScore {
            name: name.to_string(),
            score,
            recorded_at,
        };
        self.entries.push(entry.clone());
        // stable, so identical timestamps keep insertion order
        self.entries.sort_by(HighScore::rank_cmp);
        self.persist()?;
        self.refresh_display(view);
        log::info!("recorded high score {} for {}", score, name);

        self.entries
            .iter()
            .find(|e| **e == entry)
            .ok_or(QuizError::InvalidState("recorded entry missing after sort"))
    }

    /// First `n` ranked entries, or fewer if the table is shorter.
    pub fn top_n(&self, n: usize) -> &[HighScore] {
        &self.entries[..n.min(self.entries.len())]
    }

    pub fn clear(&mut self, view: &mut impl QuizView) -> Result<()> {
        self.entries.clear();
        self.persist()?;
        self.refresh_display(view);
        log::info!("high scores cleared");
        Ok(())
    }

    /// The bounded projection shown on screen, padded with placeholders.
    pub fn display_rows(&self, slots: usize) -> Vec<ScoreRow> {
        let mut rows: Vec<ScoreRow> = self
            .top_n(slots)
            .iter()
            .map(|e| ScoreRow {
                name: e.name.clone(),
                score: e.score.to_string(),
            })
            .collect();
        rows.resize(slots, ScoreRow::placeholder());
        rows
    }

    fn refresh_display(&self, view: &mut impl QuizView) {
        view.reset_high_score_display();
        for (i, entry) in self.top_n(DISPLAY_SLOTS).iter().enumerate() {
            view.set_high_score_row(i + 1, &entry.name, entry.score);
        }
    }

    fn read(&self) -> Result<Vec<HighScore>> {
        match self.store.get(LEDGER_KEY)? {
            Some(raw) => serde_json::from_str(&raw).map_err(QuizError::CorruptData),
            None => Ok(Vec::new()),
        }
    }

    fn persist(&mut self) -> Result<()> {
        let raw = serde_json::to_string(&self.entries)?;
        self.store.set(LEDGER_KEY, &raw)
    }
}
