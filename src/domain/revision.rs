use chrono::{DateTime, Utc};

/// The most recent commit touching the tracked file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionRef {
    pub id: String,
    pub message: String,
    pub author: Option<String>,
    pub authored_at: Option<DateTime<Utc>>,
    pub html_url: Option<String>,
}

impl RevisionRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            message: String::new(),
            author: None,
            authored_at: None,
            html_url: None,
        }
    }

    pub fn short_id(&self) -> &str {
        match self.id.char_indices().nth(7) {
            Some((idx, _)) => &self.id[..idx],
            None => &self.id,
        }
    }
}
