use crate::types::DocumentId;
use bson::Document as BsonDocument;
use chrono::{DateTime, Utc};

/// Store-level bookkeeping carried next to the document body.
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    pub inserted_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Metadata {
    #[must_use]
    pub fn new() -> Self {
        let now = Utc::now();
        Self { inserted_at: now, modified_at: now }
    }
}

impl Default for Metadata {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocumentId,
    pub data: BsonDocument,
    pub metadata: Metadata,
}

impl Document {
    #[must_use]
    pub fn new(data: BsonDocument) -> Self {
        Self::with_id(DocumentId::new(), data)
    }

    #[must_use]
    pub fn with_id(id: DocumentId, data: BsonDocument) -> Self {
        Self { id, data, metadata: Metadata::new() }
    }

    pub fn update(&mut self, new_data: BsonDocument) {
        self.data = new_data;
        self.metadata.modified_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn update_replaces_body_and_bumps_modified() {
        let mut d = Document::new(doc! {"a": 1});
        let before = d.metadata.modified_at;
        d.update(doc! {"a": 2});
        assert_eq!(d.data.get_i32("a").unwrap(), 2);
        assert!(d.metadata.modified_at >= before);
        assert_eq!(d.metadata.inserted_at, before);
    }
}
