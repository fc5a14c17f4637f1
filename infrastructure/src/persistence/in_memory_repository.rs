// ./infrastructure/src/persistence/in_memory_repository.rs
use application::{ApplicationError, DocumentRepository};
use dashmap::DashMap;
use domain::{Document, DocumentId, SearchRequest};
use std::sync::Arc;
use tracing::{debug, instrument, trace};

/// Document repository backed by a concurrent map. Searches are a linear scan.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentRepository {
    // Document ID -> Document
    documents: Arc<DashMap<DocumentId, Arc<Document>>>,
}

impl InMemoryDocumentRepository {
    pub fn new() -> Self {
        Self {
            documents: Arc::new(DashMap::new()),
        }
    }
}

impl DocumentRepository for InMemoryDocumentRepository {
    #[instrument(skip(self))]
    fn get(&self, id: &DocumentId) -> Result<Option<Document>, ApplicationError> {
        debug!(doc_id = %id, "Getting document from in-memory store");
        // Get returns a Ref, so we clone the Arc's contents out
        let doc = self.documents.get(id).map(|doc_ref| (**doc_ref).clone());
        Ok(doc)
    }

    fn contains(&self, id: &DocumentId) -> Result<bool, ApplicationError> {
        Ok(self.documents.contains_key(id))
    }

    #[instrument(skip(self, document))]
    fn put(
        &self,
        id: DocumentId,
        document: Document,
    ) -> Result<Option<Document>, ApplicationError> {
        debug!(doc_id = %id, "Saving document to in-memory store");
        let previous = self
            .documents
            .insert(id, Arc::new(document))
            .map(|doc| (*doc).clone());
        Ok(previous)
    }

    #[instrument(skip(self, request))]
    fn search(&self, request: &SearchRequest) -> Result<Vec<Document>, ApplicationError> {
        debug!(stored = self.documents.len(), "Scanning in-memory store");
        let hits: Vec<Document> = self
            .documents
            .iter()
            .filter(|entry| {
                let matched = request.matches(entry.value());
                trace!(doc_id = %entry.key(), matched, "Evaluated search request");
                matched
            })
            .map(|entry| (**entry.value()).clone())
            .collect();
        debug!(hits = hits.len(), "In-memory search finished.");
        Ok(hits)
    }

    fn count(&self) -> Result<usize, ApplicationError> {
        Ok(self.documents.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn put(repo: &InMemoryDocumentRepository, id: &str, title: &str) {
        repo.put(DocumentId::new(id), Document::new(title, "body").with_id(id))
            .unwrap();
    }

    #[test]
    fn put_returns_displaced_record() {
        let repo = InMemoryDocumentRepository::new();
        assert!(
            repo.put(DocumentId::new("a"), Document::new("first", "x"))
                .unwrap()
                .is_none()
        );

        let displaced = repo
            .put(DocumentId::new("a"), Document::new("second", "x"))
            .unwrap()
            .expect("previous record");
        assert_eq!(displaced.title, "first");
        assert_eq!(repo.count().unwrap(), 1);
        assert_eq!(
            repo.get(&DocumentId::new("a")).unwrap().unwrap().title,
            "second"
        );
    }

    #[test]
    fn contains_and_get_agree() {
        let repo = InMemoryDocumentRepository::new();
        put(&repo, "a", "Alpha");

        assert!(repo.contains(&DocumentId::new("a")).unwrap());
        assert!(!repo.contains(&DocumentId::new("b")).unwrap());
        assert!(repo.get(&DocumentId::new("b")).unwrap().is_none());
    }

    #[test]
    fn search_scans_every_document() {
        let repo = InMemoryDocumentRepository::new();
        put(&repo, "a", "Alpha-1");
        put(&repo, "b", "Alpha-2");
        put(&repo, "c", "Beta-1");

        let mut titles: Vec<String> = repo
            .search(&SearchRequest::new().title_prefixes(["Alpha"]))
            .unwrap()
            .into_iter()
            .map(|doc| doc.title)
            .collect();
        titles.sort();
        assert_eq!(titles, vec!["Alpha-1", "Alpha-2"]);

        assert_eq!(repo.search(&SearchRequest::default()).unwrap().len(), 3);
    }

    #[test]
    fn clones_share_storage() {
        let repo = InMemoryDocumentRepository::new();
        let handle = repo.clone();
        put(&handle, "a", "Alpha");
        assert_eq!(repo.count().unwrap(), 1);
    }
}
