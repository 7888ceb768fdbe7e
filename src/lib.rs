// Library surface for headless/integration tests and the binary.
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod error;
pub mod ledger;
pub mod question;
pub mod runtime;
pub mod session;
pub mod store;
pub mod timer;
pub mod ui;
pub mod view;

pub use error::{QuizError, Result};
