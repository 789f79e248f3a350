//! Incremental reveal of a finished reply

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::session::serialize_timestamp;

const SENTENCE_BOUNDARY: &str = ". ";

/// One step of the reveal: everything shown so far
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevealChunk {
    pub content: String,
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Local>,
}

/// Yields cumulative prefixes of `text`, each ending just after a `". "`
/// boundary. The final item is always the whole text, so text without a
/// boundary yields exactly one chunk.
#[derive(Debug)]
pub struct IncrementalReveal<'a> {
    text: &'a str,
    position: usize,
    finished: bool,
}

impl<'a> IncrementalReveal<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            position: 0,
            finished: false,
        }
    }

    fn chunk(&self, end: usize) -> RevealChunk {
        RevealChunk {
            content: self.text.get(..end).unwrap_or(self.text).to_string(),
            timestamp: Local::now(),
        }
    }
}

impl Iterator for IncrementalReveal<'_> {
    type Item = RevealChunk;

    fn next(&mut self) -> Option<RevealChunk> {
        if self.finished {
            return None;
        }

        let boundary = self
            .text
            .get(self.position..)
            .and_then(|rest| rest.find(SENTENCE_BOUNDARY))
            .map(|offset| self.position + offset + SENTENCE_BOUNDARY.len());

        match boundary {
            Some(end) if end < self.text.len() => {
                self.position = end;
                Some(self.chunk(end))
            }
            _ => {
                self.finished = true;
                Some(self.chunk(self.text.len()))
            }
        }
    }
}

impl std::iter::FusedIterator for IncrementalReveal<'_> {}
