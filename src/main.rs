use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    path::PathBuf,
};
use time_humanize::{Accuracy, HumanTime, Tense};

use kwiz::{
    app::{App, Flow},
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    ledger::Ledger,
    question::{self, Bank, Question},
    runtime::{CrosstermEventSource, FixedTicker, QuizEvent, Runner},
    store::{KvStore, SqliteStore},
    view::{ViewModel, DISPLAY_SLOTS},
};

/// timed multiple-choice quiz for the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A timed multiple-choice quiz. Wrong answers cost seconds off the clock, and finished runs go into a local high-score table."
)]
pub struct Cli {
    /// seconds on the clock at the start of a quiz
    #[clap(short = 't', long)]
    time: Option<u32>,

    /// seconds deducted for each wrong answer
    #[clap(short = 'p', long)]
    penalty: Option<u32>,

    /// built-in question bank
    #[clap(short = 'b', long, value_enum)]
    bank: Option<Bank>,

    /// JSON file with custom questions (overrides --bank)
    #[clap(short = 'q', long)]
    questions: Option<PathBuf>,

    /// randomize question order (`--shuffle false` turns it back off)
    #[clap(long, num_args = 0..=1, default_missing_value = "true")]
    shuffle: Option<bool>,

    /// high-score database location
    #[clap(long)]
    db: Option<PathBuf>,

    /// wipe the high-score table and exit
    #[clap(long)]
    clear_scores: bool,

    /// print the high-score table and exit
    #[clap(long)]
    scores: bool,
}

impl Cli {
    /// Folds explicit flags over the stored configuration. Returns true if
    /// anything changed.
    fn apply(&self, config: &mut Config) -> bool {
        let before = config.clone();
        if let Some(time) = self.time {
            config.time_secs = time;
        }
        if let Some(penalty) = self.penalty {
            config.penalty_secs = penalty;
        }
        if let Some(bank) = self.bank {
            config.bank = bank;
        }
        if let Some(shuffle) = self.shuffle {
            config.shuffle = shuffle;
        }
        *config != before
    }

    fn db_path(&self) -> PathBuf {
        self.db
            .clone()
            .or_else(AppDirs::db_path)
            .unwrap_or_else(|| PathBuf::from("kwiz.db"))
    }

    fn load_questions(&self, config: &Config) -> kwiz::Result<Vec<Question>> {
        match &self.questions {
            Some(path) => question::load_questions(path),
            None => config.bank.questions(),
        }
    }
}

/// The terminal belongs to the TUI, so log lines go to a file next to the
/// database. Verbosity follows `RUST_LOG`.
fn init_logging() {
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging();

    let config_store = FileConfigStore::new();
    let mut config = config_store.load();
    if cli.apply(&mut config) {
        if let Err(err) = config_store.save(&config) {
            log::warn!("could not save config: {err}");
        }
    }

    let store = SqliteStore::open(cli.db_path())?;

    if cli.clear_scores || cli.scores {
        return run_scores_command(&cli, store);
    }

    let questions = match cli.load_questions(&config) {
        Ok(questions) if questions.is_empty() => {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::InvalidValue, "the question bank is empty")
                .exit();
        }
        Ok(questions) => questions,
        Err(err) => {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::InvalidValue, format!("cannot load questions: {err}"))
                .exit();
        }
    };

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let mut app = App::new(config, questions, store)?;

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let outcome = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    outcome
}

fn run_scores_command<S: KvStore>(cli: &Cli, store: S) -> Result<(), Box<dyn Error>> {
    let mut view = ViewModel::default();
    let mut ledger = Ledger::new(store);
    ledger.load(&mut view)?;

    if cli.clear_scores {
        ledger.clear(&mut view)?;
        println!("high scores cleared");
        return Ok(());
    }

    if ledger.entries().is_empty() {
        println!("no high scores yet");
    }
    let now = chrono::Utc::now();
    for (rank, entry) in ledger.top_n(DISPLAY_SLOTS).iter().enumerate() {
        let secs = (now - entry.recorded_at).num_seconds().max(0);
        println!(
            "{}. {:<16} {:>3}  {}",
            rank + 1,
            entry.name,
            entry.score,
            HumanTime::from_seconds(secs).to_text_en(Accuracy::Rough, Tense::Past)
        );
    }
    Ok(())
}

fn start_tui<B: Backend, S: KvStore>(
    terminal: &mut Terminal<B>,
    app: &mut App<S>,
) -> Result<(), Box<dyn Error>> {
    let mut runner = Runner::new(CrosstermEventSource::new(), FixedTicker::default());
    terminal.draw(|f| f.render_widget(&*app, f.area()))?;

    loop {
        let event = runner.step();
        app.on_tick(runner.lap());

        if let QuizEvent::Key(key) = event {
            if app.on_key(key) == Flow::Quit {
                break;
            }
        }

        terminal.draw(|f| f.render_widget(&*app, f.area()))?;
    }

    Ok(())
}
