use domain::{Document, DocumentId, SearchRequest};
use serde::Deserialize;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

// --- Application Errors ---
#[derive(Error, Debug, PartialEq)]
pub enum ApplicationError {
    #[error("No free document id found after {attempts} attempts")]
    IdSpaceExhausted { attempts: u32 },
    #[error("Invalid store configuration: {0}")]
    InvalidConfig(String),
}

// --- Configuration ---

/// What `save` does when the target id is already stored.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Overwrite the stored record, keeping its original `created` value.
    #[default]
    Replace,
    /// Leave the stored record alone and hand the input back unchanged.
    Reject,
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictPolicy::Replace => f.write_str("replace"),
            ConflictPolicy::Reject => f.write_str("reject"),
        }
    }
}

impl FromStr for ConflictPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "replace" => Ok(ConflictPolicy::Replace),
            "reject" => Ok(ConflictPolicy::Reject),
            other => Err(format!("unknown conflict policy '{}'", other)),
        }
    }
}

pub const ENV_ID_UPPER_BOUND: &str = "DOCSTORE_ID_UPPER_BOUND";
pub const ENV_ID_MAX_ATTEMPTS: &str = "DOCSTORE_ID_MAX_ATTEMPTS";
pub const ENV_CONFLICT_POLICY: &str = "DOCSTORE_CONFLICT_POLICY";

const DEFAULT_ID_UPPER_BOUND: u64 = 1_000_000;
const DEFAULT_MAX_ID_ATTEMPTS: u32 = 32;

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct StoreConfig {
    /// Generated ids are drawn from `0..id_upper_bound`.
    pub id_upper_bound: u64,
    /// How many colliding candidates to tolerate before giving up.
    pub max_id_attempts: u32,
    pub conflict_policy: ConflictPolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            id_upper_bound: DEFAULT_ID_UPPER_BOUND,
            max_id_attempts: DEFAULT_MAX_ID_ATTEMPTS,
            conflict_policy: ConflictPolicy::default(),
        }
    }
}

impl StoreConfig {
    /// Reads the configuration from `DOCSTORE_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup. Missing or
    /// unparsable values fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            id_upper_bound: read_setting(&lookup, ENV_ID_UPPER_BOUND, defaults.id_upper_bound),
            max_id_attempts: read_setting(
                &lookup,
                ENV_ID_MAX_ATTEMPTS,
                defaults.max_id_attempts,
            ),
            conflict_policy: read_setting(
                &lookup,
                ENV_CONFLICT_POLICY,
                defaults.conflict_policy,
            ),
        }
    }

    pub fn validate(&self) -> Result<(), ApplicationError> {
        if self.id_upper_bound == 0 {
            return Err(ApplicationError::InvalidConfig(
                "id_upper_bound must be greater than zero".to_string(),
            ));
        }
        if self.max_id_attempts == 0 {
            return Err(ApplicationError::InvalidConfig(
                "max_id_attempts must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn read_setting<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: FromStr + fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(value) => {
                info!("Using {} = {} from environment.", key, value);
                value
            }
            Err(_) => {
                warn!(
                    "Invalid {} value '{}' in environment. Using default {}.",
                    key, raw, default
                );
                default
            }
        },
        None => {
            debug!("{} not set. Using default {}.", key, default);
            default
        }
    }
}

// --- Infrastructure Interfaces (Traits) ---

/// Interface for storing and retrieving documents.
pub trait DocumentRepository: Send + Sync {
    /// Retrieves a document by its ID.
    fn get(&self, id: &DocumentId) -> Result<Option<Document>, ApplicationError>;
    /// Checks whether a document is stored under `id`.
    fn contains(&self, id: &DocumentId) -> Result<bool, ApplicationError> {
        Ok(self.get(id)?.is_some())
    }
    /// Stores `document` under `id`, returning the record it displaced.
    fn put(&self, id: DocumentId, document: Document)
    -> Result<Option<Document>, ApplicationError>;
    /// Returns every stored document accepted by `request`. Order is unspecified.
    fn search(&self, request: &SearchRequest) -> Result<Vec<Document>, ApplicationError>;
    /// Returns the number of stored documents.
    fn count(&self) -> Result<usize, ApplicationError>;
}

/// Source of candidate ids for documents saved without one.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> DocumentId;
}

// --- Save Outcome ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The id was free; the document was stored as given.
    Inserted,
    /// The id was taken; the record was overwritten and kept its `created`.
    Replaced,
    /// The id was taken and the store is configured to reject; nothing changed.
    Rejected,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SavedDocument {
    pub document: Document,
    pub outcome: SaveOutcome,
}

// --- Document Store ---

/// Holds documents keyed by id and answers point lookups and filtered searches.
pub struct DocumentStore {
    repository: Arc<dyn DocumentRepository>,
    id_generator: Arc<dyn IdGenerator>,
    config: StoreConfig,
}

impl DocumentStore {
    pub fn new(
        repository: Arc<dyn DocumentRepository>,
        id_generator: Arc<dyn IdGenerator>,
        config: StoreConfig,
    ) -> Result<Self, ApplicationError> {
        config.validate()?;
        Ok(Self {
            repository,
            id_generator,
            config,
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Upserts `document`, generating an id when it has none.
    pub fn save(&self, document: Document) -> Result<Document, ApplicationError> {
        self.save_with_outcome(document).map(|saved| saved.document)
    }

    /// Like [`DocumentStore::save`], but also reports what happened to the store.
    #[instrument(skip(self, document), fields(policy = %self.config.conflict_policy))]
    pub fn save_with_outcome(
        &self,
        mut document: Document,
    ) -> Result<SavedDocument, ApplicationError> {
        let id = match document.assigned_id() {
            Some(id) => id.clone(),
            None => self.generate_unique_id()?,
        };
        document.id = Some(id.clone());

        let outcome = match self.repository.get(&id)? {
            None => {
                self.repository.put(id.clone(), document.clone())?;
                SaveOutcome::Inserted
            }
            Some(existing) => match self.config.conflict_policy {
                ConflictPolicy::Replace => {
                    document.created = existing.created;
                    self.repository.put(id.clone(), document.clone())?;
                    SaveOutcome::Replaced
                }
                ConflictPolicy::Reject => {
                    warn!(doc_id = %id, "Document id is already taken; write skipped");
                    SaveOutcome::Rejected
                }
            },
        };
        info!(doc_id = %id, outcome = ?outcome, "Document save finished");

        Ok(SavedDocument { document, outcome })
    }

    fn generate_unique_id(&self) -> Result<DocumentId, ApplicationError> {
        let attempts = self.config.max_id_attempts;
        for attempt in 1..=attempts {
            let candidate = self.id_generator.next_id();
            if candidate.is_empty() {
                debug!(attempt, "Id generator produced an empty id");
                continue;
            }
            if !self.repository.contains(&candidate)? {
                debug!(doc_id = %candidate, attempt, "Generated document id");
                return Ok(candidate);
            }
            debug!(doc_id = %candidate, attempt, "Generated id is already taken");
        }
        warn!(attempts, "Could not generate a free document id");
        Err(ApplicationError::IdSpaceExhausted { attempts })
    }

    /// Returns every stored document matching all specified predicates.
    #[instrument(skip(self, request))]
    pub fn search(&self, request: &SearchRequest) -> Result<Vec<Document>, ApplicationError> {
        let documents = self.repository.search(request)?;
        debug!(
            unconstrained = request.is_unconstrained(),
            hits = documents.len(),
            "Search finished"
        );
        Ok(documents)
    }

    #[instrument(skip(self, id))]
    pub fn find_by_id(
        &self,
        id: impl Into<DocumentId>,
    ) -> Result<Option<Document>, ApplicationError> {
        let id = id.into();
        let document = self.repository.get(&id)?;
        debug!(doc_id = %id, found = document.is_some(), "Looked up document");
        Ok(document)
    }

    pub fn count(&self) -> Result<usize, ApplicationError> {
        self.repository.count()
    }
}
