//! Weekly deal & partner report.
//!
//! Pulls calendar meetings, meeting notes and email for tracked companies,
//! matches notes to meetings, summarizes each company with a local model and
//! publishes the result as a Google Doc or Markdown file.

pub mod entity;
pub mod error;
pub mod google_api;
pub mod intelligence;
pub mod interview;
pub mod matching;
pub mod notes;
pub mod prepare;
pub mod report;
pub mod state;
pub mod types;
pub mod util;
pub mod workflow;
