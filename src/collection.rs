use crate::document::Document;
use crate::errors::DbError;
use crate::logger;
use crate::types::DocumentId;
use crate::utils::json::document_to_json;
use crate::wal::{OpKind, Wal, WalRecord};
use bson::{Bson, Document as BsonDocument};
use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// In-memory state of a collection. Documents are kept in insertion order so that sorts over
/// equal keys are stable.
#[derive(Debug, Default)]
pub(crate) struct CollectionState {
    docs: BTreeMap<u64, Document>,
    by_id: HashMap<DocumentId, u64>,
    next_seq: u64,
    // field -> value key -> owning document
    unique: HashMap<String, HashMap<String, DocumentId>>,
}

impl CollectionState {
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Document> {
        self.docs.values()
    }

    /// Documents paired with their insertion sequence.
    pub(crate) fn entries(&self) -> impl Iterator<Item = (u64, &Document)> {
        self.docs.iter().map(|(seq, d)| (*seq, d))
    }

    pub(crate) fn get(&self, id: &DocumentId) -> Option<&Document> {
        self.by_id.get(id).and_then(|seq| self.docs.get(seq))
    }

    pub(crate) fn len(&self) -> usize {
        self.docs.len()
    }

    fn check_unique(&self, data: &BsonDocument, owner: Option<&DocumentId>) -> Result<(), DbError> {
        for (field, index) in &self.unique {
            let Some(key) = unique_key(data, field) else { continue };
            if let Some(existing) = index.get(&key)
                && Some(existing) != owner
            {
                return Err(DbError::DuplicateKey { field: field.clone(), value: key });
            }
        }
        Ok(())
    }

    fn index_add(&mut self, id: DocumentId, data: &BsonDocument) {
        for (field, index) in &mut self.unique {
            if let Some(key) = unique_key(data, field) {
                index.insert(key, id);
            }
        }
    }

    fn index_remove(&mut self, id: &DocumentId, data: &BsonDocument) {
        for (field, index) in &mut self.unique {
            if let Some(key) = unique_key(data, field)
                && index.get(&key) == Some(id)
            {
                index.remove(&key);
            }
        }
    }

    fn put(&mut self, doc: Document) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.index_add(doc.id, &doc.data);
        self.by_id.insert(doc.id, seq);
        self.docs.insert(seq, doc);
    }

    fn replace(&mut self, id: &DocumentId, data: BsonDocument) -> bool {
        let Some(seq) = self.by_id.get(id).copied() else { return false };
        let Some(mut doc) = self.docs.remove(&seq) else { return false };
        self.index_remove(id, &doc.data);
        self.index_add(*id, &data);
        doc.update(data);
        self.docs.insert(seq, doc);
        true
    }

    fn remove(&mut self, id: &DocumentId) -> Option<Document> {
        let seq = self.by_id.remove(id)?;
        let doc = self.docs.remove(&seq)?;
        self.index_remove(id, &doc.data);
        Some(doc)
    }
}

fn unique_key(data: &BsonDocument, field: &str) -> Option<String> {
    match crate::query::get_path(data, field)? {
        Bson::Null => None,
        Bson::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

pub struct Collection {
    name: String,
    state: RwLock<CollectionState>,
    wal: Option<Arc<Mutex<Wal>>>,
    open: Arc<AtomicBool>,
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection").field("name", &self.name).finish_non_exhaustive()
    }
}

impl Collection {
    pub(crate) fn new(name: String, wal: Option<Arc<Mutex<Wal>>>, open: Arc<AtomicBool>) -> Self {
        Self { name, state: RwLock::new(CollectionState::default()), wal, open }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn ensure_open(&self) -> Result<(), DbError> {
        if self.open.load(Ordering::Acquire) { Ok(()) } else { Err(DbError::Closed) }
    }

    /// Read access for the query executor. Fails once the owning database is closed.
    pub(crate) fn read(&self) -> Result<RwLockReadGuard<'_, CollectionState>, DbError> {
        self.ensure_open()?;
        Ok(self.state.read())
    }

    fn log(&self, op: OpKind, id: DocumentId, data: Option<&BsonDocument>) -> Result<(), DbError> {
        let Some(wal) = &self.wal else { return Ok(()) };
        let value_json = data.map(|d| serde_json::to_vec(&document_to_json(d))).transpose()?;
        let rec = WalRecord {
            op,
            collection: self.name.clone(),
            id,
            value_json,
            ts_millis: chrono::Utc::now().timestamp_millis(),
        };
        wal.lock().append(&rec)
    }

    /// Declares `field` unique. Documents lacking the field (or holding null) are not indexed.
    ///
    /// # Errors
    /// `DuplicateKey` if existing documents already violate the constraint.
    pub fn ensure_unique_index(&self, field: &str) -> Result<(), DbError> {
        self.ensure_open()?;
        let mut st = self.state.write();
        if st.unique.contains_key(field) {
            return Ok(());
        }
        let mut index = HashMap::new();
        for doc in st.docs.values() {
            if let Some(key) = unique_key(&doc.data, field)
                && index.insert(key.clone(), doc.id).is_some()
            {
                return Err(DbError::DuplicateKey { field: field.to_string(), value: key });
            }
        }
        st.unique.insert(field.to_string(), index);
        log::debug!("unique index on {}.{} ready", self.name, field);
        Ok(())
    }

    /// Inserts a new document. The unique check, the log append and the in-memory apply happen
    /// under one write lock, so two racing inserts cannot both pass the constraint.
    pub fn insert_document(&self, document: Document) -> Result<DocumentId, DbError> {
        self.ensure_open()?;
        let mut st = self.state.write();
        if st.by_id.contains_key(&document.id) {
            return Err(DbError::DuplicateKey {
                field: "_id".into(),
                value: document.id.to_string(),
            });
        }
        st.check_unique(&document.data, None)?;
        self.log(OpKind::Insert, document.id, Some(&document.data))?;
        let id = document.id;
        st.put(document);
        drop(st);
        logger::audit("insert", &self.name, &id);
        Ok(id)
    }

    pub fn find_document(&self, id: &DocumentId) -> Result<Option<Document>, DbError> {
        Ok(self.read()?.get(id).cloned())
    }

    /// Replaces the body of an existing document. Returns `false` when `id` is unknown.
    pub fn update_document(&self, id: &DocumentId, data: BsonDocument) -> Result<bool, DbError> {
        self.ensure_open()?;
        let mut st = self.state.write();
        if !st.by_id.contains_key(id) {
            return Ok(false);
        }
        st.check_unique(&data, Some(id))?;
        self.log(OpKind::Update, *id, Some(&data))?;
        let replaced = st.replace(id, data);
        drop(st);
        logger::audit("update", &self.name, id);
        Ok(replaced)
    }

    /// Removes a document. Returns `false` when `id` is unknown.
    pub fn delete_document(&self, id: &DocumentId) -> Result<bool, DbError> {
        self.ensure_open()?;
        let mut st = self.state.write();
        if !st.by_id.contains_key(id) {
            return Ok(false);
        }
        self.log(OpKind::Delete, *id, None)?;
        st.remove(id);
        drop(st);
        logger::audit("delete", &self.name, id);
        Ok(true)
    }

    pub fn len(&self) -> Result<usize, DbError> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, DbError> {
        Ok(self.len()? == 0)
    }

    /// Applies a logged operation during startup replay. Nothing is written back to the log.
    pub(crate) fn replay(&self, op: OpKind, id: DocumentId, data: Option<BsonDocument>, ts_millis: i64) {
        let mut st = self.state.write();
        match (op, data) {
            (OpKind::Insert, Some(data)) => {
                let mut doc = Document::with_id(id, data);
                if let Some(at) = chrono::DateTime::from_timestamp_millis(ts_millis) {
                    doc.metadata.inserted_at = at;
                    doc.metadata.modified_at = at;
                }
                st.remove(&id);
                st.put(doc);
            }
            (OpKind::Update, Some(data)) => {
                if !st.replace(&id, data) {
                    log::warn!("replay: update for unknown document {id} in {}", self.name);
                }
            }
            (OpKind::Delete, _) => {
                st.remove(&id);
            }
            (op, None) => log::warn!("replay: {op:?} record for {id} carries no body"),
        }
    }
}
