//! Keyword filter: case-insensitive substring match over subject and body

use crate::models::{MatchRow, Message};
use crate::text::{summarize, SUMMARY_LIMIT};

#[derive(Debug, Clone)]
pub struct KeywordFilter {
    keyword: String,
}

impl KeywordFilter {
    /// The keyword is trimmed and lower-cased once here.
    pub fn new(keyword: &str) -> Self {
        Self {
            keyword: keyword.trim().to_lowercase(),
        }
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn matches(&self, message: &Message) -> bool {
        let haystack = format!("{} {}", message.subject(), message.body_content()).to_lowercase();
        haystack.contains(&self.keyword)
    }

    /// Emit a report row for a matching message; the subject is kept as sent.
    pub fn apply(&self, message: &Message) -> Option<MatchRow> {
        if !self.matches(message) {
            return None;
        }
        Some(MatchRow {
            subject: message.subject().to_string(),
            summarized_body: summarize(Some(message.body_content()), SUMMARY_LIMIT),
        })
    }
}
