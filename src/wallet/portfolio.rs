//! In-memory portfolio: a named collection of documents with id and name
//! indexes, persisted as a whole-file JSON rewrite.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write as _;
use std::path::Path;

use serde_json::{json, Value};
use tracing::warn;

use crate::document::{Document, DocumentId};

/// A named collection of documents, unique by id and by name.
#[derive(Debug, Clone, Default)]
pub struct Portfolio {
    pub name: String,
    documents: HashMap<DocumentId, Document>,
    name_index: HashMap<String, DocumentId>,
}

/// Errors the pure in-memory store can raise; independent of the wire
/// error taxonomy so [`crate::wallet::server`] can classify them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortfolioStoreError {
    NameAlreadyExists(String),
    DocumentDoesNotExist(DocumentId),
    NameDoesNotExist(String),
}

impl Portfolio {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            documents: HashMap::new(),
            name_index: HashMap::new(),
        }
    }

    pub fn get_by_id(&self, id: &str) -> Option<&Document> {
        self.documents.get(id)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Document> {
        self.name_index.get(name).and_then(|id| self.documents.get(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.documents.values()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Inserts a new document, assigning it `id`. Fails if `name` is
    /// already taken — id and name are each unique within a portfolio.
    pub fn insert(&mut self, mut document: Document, id: DocumentId) -> Result<(), PortfolioStoreError> {
        if self.name_index.contains_key(&document.header.name) {
            return Err(PortfolioStoreError::NameAlreadyExists(document.header.name.clone()));
        }
        document.header.id = id.clone();
        self.name_index.insert(document.header.name.clone(), id.clone());
        self.documents.insert(id, document);
        Ok(())
    }

    /// Replaces the document at `id` with `updated`, keeping `id` fixed.
    /// Rejects a rename that would collide with another document's name.
    pub fn update(&mut self, id: &str, updated: Document) -> Result<Document, PortfolioStoreError> {
        let existing = self
            .documents
            .get(id)
            .ok_or_else(|| PortfolioStoreError::DocumentDoesNotExist(id.to_string()))?;

        if updated.header.name != existing.header.name {
            if let Some(holder) = self.name_index.get(&updated.header.name) {
                if holder != id {
                    return Err(PortfolioStoreError::NameAlreadyExists(updated.header.name.clone()));
                }
            }
        }

        let old = existing.clone();
        self.name_index.remove(&old.header.name);
        let mut updated = updated;
        updated.header.id = id.to_string();
        self.name_index.insert(updated.header.name.clone(), id.to_string());
        self.documents.insert(id.to_string(), updated);
        Ok(old)
    }

    pub fn remove(&mut self, id: &str) -> Result<Document, PortfolioStoreError> {
        let doc = self
            .documents
            .remove(id)
            .ok_or_else(|| PortfolioStoreError::DocumentDoesNotExist(id.to_string()))?;
        self.name_index.remove(&doc.header.name);
        Ok(doc)
    }

    pub fn resolve_name(&self, name: &str) -> Result<&DocumentId, PortfolioStoreError> {
        self.name_index
            .get(name)
            .ok_or_else(|| PortfolioStoreError::NameDoesNotExist(name.to_string()))
    }
}

/// On-disk envelope for the whole wallet database.
#[derive(Debug, Clone, Default)]
pub struct WalletDatabase {
    pub portfolios: Vec<Portfolio>,
}

impl WalletDatabase {
    /// Loads the database file. A document that fails to round-trip
    /// with its secret part is logged and dropped rather than failing
    /// the whole load (see DESIGN.md Open Question).
    pub fn load(path: &Path) -> Result<Self, std::io::Error> {
        let raw = fs::read_to_string(path)?;
        let root: Value = serde_json::from_str(&raw)?;
        let portfolios_json = root
            .get("portfolios")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let mut portfolios = Vec::with_capacity(portfolios_json.len());
        for portfolio_value in portfolios_json {
            let name = portfolio_value
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let mut portfolio = Portfolio::new(name.clone());
            let documents = portfolio_value
                .get("documents")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            for doc_value in documents {
                match Document::from_json(&doc_value) {
                    Ok(doc) if doc.contains_secret() => {
                        let id = doc.header.id.clone();
                        if let Err(e) = portfolio.insert(doc, id) {
                            warn!(portfolio = %name, error = ?e, "dropping duplicate document on load");
                        }
                    }
                    Ok(_) => {
                        warn!(portfolio = %name, "dropping public-only document found in wallet database");
                    }
                    Err(e) => {
                        warn!(portfolio = %name, error = %e, "dropping unparseable document on load");
                    }
                }
            }
            portfolios.push(portfolio);
        }
        Ok(Self { portfolios })
    }

    pub fn portfolio(&self, name: &str) -> Option<&Portfolio> {
        self.portfolios.iter().find(|p| p.name == name)
    }

    pub fn portfolio_mut(&mut self, name: &str) -> Option<&mut Portfolio> {
        self.portfolios.iter_mut().find(|p| p.name == name)
    }

    fn to_json(&self) -> Value {
        json!({
            "version": 1,
            "portfolios": self.portfolios.iter().map(|p| json!({
                "version": 1,
                "name": p.name,
                "documents": p.documents.values().map(Document::to_full_json).collect::<Vec<_>>(),
            })).collect::<Vec<_>>(),
        })
    }

    /// Atomic whole-file rewrite: write to `<path>.tmp`, `fsync`, rename
    /// over `path`.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        let tmp_path = path.with_extension("json.tmp");
        let pretty = serde_json::to_string_pretty(&self.to_json())?;
        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(pretty.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, path)?;
        Ok(())
    }
}
