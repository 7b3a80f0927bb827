use serde::Serialize;

/// One released version as parsed from the changelog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionEntry {
    pub version: String,
    pub date: String,
    pub changes: Vec<String>,
    pub revision_id: String,
}

impl VersionEntry {
    pub fn new(version: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            date: date.into(),
            changes: Vec::new(),
            revision_id: String::new(),
        }
    }

    pub fn with_revision(mut self, revision_id: impl Into<String>) -> Self {
        self.revision_id = revision_id.into();
        self
    }
}
