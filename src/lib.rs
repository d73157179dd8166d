//! Defendant-company extraction from legal case documents.
//!
//! Each case PDF goes through three stages: text extraction (lopdf with a
//! pdf-extract fallback), a chat-completion call with retry, and parsing of
//! the model's JSON answer into a [`record::CaseRecord`]. Failures at any
//! stage skip the file and are reported; the run itself always completes.

pub mod case_input;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod json_cases;
pub mod output;
pub mod parser;
pub mod pdf;
pub mod pipeline;
pub mod progress;
pub mod prompt;
pub mod record;
