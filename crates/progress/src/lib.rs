//! Progress Tracking
//!
//! Roadmap milestone ledgers, study reminders, quiz results and the report
//! formatting built on top of them. All state lives in an injected
//! [`KvStore`](studymate_storage::KvStore).

#![warn(missing_docs)]

pub mod error;
pub mod codec;
pub mod ledger;
pub mod reminders;
pub mod quiz;
pub mod planner;
pub mod formatter;
pub mod service;

pub use error::{ErrorKind, LedgerError, Result, TaggedError};
pub use ledger::ProgressLedger;
pub use reminders::{parse_date, ReminderRegistry};
pub use quiz::QuizLedger;
pub use planner::create_learning_schedule;
pub use formatter::{format_report, render_text, round_to_tenth, ReportView, EMPTY_BUCKET};
pub use service::StudyService;
