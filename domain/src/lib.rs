use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// --- Document ID ---
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
    /// An empty id counts as "not assigned" when saving.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
impl From<String> for DocumentId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}
impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}
impl From<DocumentId> for String {
    fn from(doc_id: DocumentId) -> Self {
        doc_id.0
    }
}
impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// --- Author ---

/// The writer of a document. Always embedded in its document.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub id: String,
    pub name: String,
}

impl Author {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

// --- Document ---

/// A stored record. `id` is assigned by the store when absent or empty.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<DocumentId>,
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,
    pub created: DateTime<Utc>,
}

impl Document {
    /// Creates an unsaved document stamped with the current time.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            content: content.into(),
            author: None,
            created: Utc::now(),
        }
    }

    pub fn with_id(mut self, id: impl Into<DocumentId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_author(mut self, author: Author) -> Self {
        self.author = Some(author);
        self
    }

    pub fn with_created(mut self, created: DateTime<Utc>) -> Self {
        self.created = created;
        self
    }

    /// Returns the id only if it is present and non-empty.
    pub fn assigned_id(&self) -> Option<&DocumentId> {
        self.id.as_ref().filter(|id| !id.is_empty())
    }
}

// --- Search Request ---

/// Independent, optional filter predicates. Groups are AND-ed together;
/// the strings inside one group are OR-ed. An absent or empty group places
/// no constraint on the result.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchRequest {
    pub title_prefixes: Option<Vec<String>>,
    pub contains_contents: Option<Vec<String>>,
    pub author_ids: Option<Vec<String>>,
    /// Inclusive lower bound on `created`.
    pub created_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created`.
    pub created_to: Option<DateTime<Utc>>,
}

impl SearchRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.title_prefixes = Some(prefixes.into_iter().map(Into::into).collect());
        self
    }

    pub fn contains_contents<I, S>(mut self, fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.contains_contents = Some(fragments.into_iter().map(Into::into).collect());
        self
    }

    pub fn author_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.author_ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn created_from(mut self, from: DateTime<Utc>) -> Self {
        self.created_from = Some(from);
        self
    }

    pub fn created_to(mut self, to: DateTime<Utc>) -> Self {
        self.created_to = Some(to);
        self
    }

    /// True when no predicate would constrain the result.
    pub fn is_unconstrained(&self) -> bool {
        active(&self.title_prefixes).is_none()
            && active(&self.contains_contents).is_none()
            && active(&self.author_ids).is_none()
            && self.created_from.is_none()
            && self.created_to.is_none()
    }

    /// Evaluates every specified predicate group against `document`.
    pub fn matches(&self, document: &Document) -> bool {
        if let Some(prefixes) = active(&self.title_prefixes) {
            if !prefixes
                .iter()
                .any(|prefix| document.title.starts_with(prefix.as_str()))
            {
                return false;
            }
        }

        if let Some(fragments) = active(&self.contains_contents) {
            if !fragments
                .iter()
                .any(|fragment| document.content.contains(fragment.as_str()))
            {
                return false;
            }
        }

        if let Some(author_ids) = active(&self.author_ids) {
            let author_match = document
                .author
                .as_ref()
                .is_some_and(|author| author_ids.iter().any(|id| *id == author.id));
            if !author_match {
                return false;
            }
        }

        if self.created_from.is_some_and(|from| document.created < from) {
            return false;
        }
        if self.created_to.is_some_and(|to| document.created > to) {
            return false;
        }

        true
    }
}

/// A group only constrains the search when it is present and non-empty.
fn active(group: &Option<Vec<String>>) -> Option<&[String]> {
    group.as_deref().filter(|values| !values.is_empty())
}
