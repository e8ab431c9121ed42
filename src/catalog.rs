use std::cmp::Ordering;

// used to print out readable forms of the catalog rows
use std::fmt;

use chrono::NaiveDate;

use crate::error::Result;

// ------------- Identities -------------
pub type RefbookId = i64;
pub type VersionId = i64;
pub type ElementId = i64;

// ------------- Refbook -------------
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Refbook {
    id: RefbookId,
    code: String,
    name: String,
    description: String,
}

impl Refbook {
    pub fn new(id: RefbookId, code: String, name: String, description: String) -> Self {
        Self {
            id,
            code,
            name,
            description,
        }
    }
    // It's intentional to encapsulate the fields in the struct
    // and only expose them using "getters", because this yields
    // true immutability for objects after creation.
    pub fn id(&self) -> RefbookId {
        self.id
    }
    pub fn code(&self) -> &str {
        &self.code
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn description(&self) -> &str {
        &self.description
    }
}
impl fmt::Display for Refbook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.code, self.id)
    }
}

// ------------- Version -------------
/// A dated snapshot of a refbook's contents. A version is active from
/// its start date up to, but not including, the start date of the next
/// version of the same refbook.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Version {
    id: VersionId,
    refbook: RefbookId,
    label: String,
    start_date: NaiveDate,
}

impl Version {
    pub fn new(id: VersionId, refbook: RefbookId, label: String, start_date: NaiveDate) -> Self {
        Self {
            id,
            refbook,
            label,
            start_date,
        }
    }
    pub fn id(&self) -> VersionId {
        self.id
    }
    pub fn refbook(&self) -> RefbookId {
        self.refbook
    }
    pub fn label(&self) -> &str {
        &self.label
    }
    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }
}
impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.start_date
            .cmp(&other.start_date)
            .then(self.id.cmp(&other.id))
    }
}
impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (from {})", self.label, self.start_date)
    }
}

// ------------- Element -------------
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Element {
    id: ElementId,
    version: VersionId,
    code: String,
    value: String,
}

impl Element {
    pub fn new(id: ElementId, version: VersionId, code: String, value: String) -> Self {
        Self {
            id,
            version,
            code,
            value,
        }
    }
    pub fn id(&self) -> ElementId {
        self.id
    }
    pub fn version(&self) -> VersionId {
        self.version
    }
    pub fn code(&self) -> &str {
        &self.code
    }
    pub fn value(&self) -> &str {
        &self.value
    }
}
impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.code, self.value)
    }
}

// ------------- Version selection -------------
/// Restrictions applied when listing the versions of a refbook.
/// The empty filter matches every version.
#[derive(Debug, Clone, Default)]
pub struct VersionFilter {
    label: Option<String>,
    starts_on_or_before: Option<NaiveDate>,
}

impl VersionFilter {
    pub fn any() -> Self {
        Self::default()
    }
    /// Only versions carrying exactly this label (case sensitive).
    pub fn with_label(label: &str) -> Self {
        Self {
            label: Some(label.to_owned()),
            starts_on_or_before: None,
        }
    }
    /// Only versions that have started on or before the given date.
    pub fn starting_on_or_before(date: NaiveDate) -> Self {
        Self {
            label: None,
            starts_on_or_before: Some(date),
        }
    }
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
    pub fn starts_on_or_before(&self) -> Option<NaiveDate> {
        self.starts_on_or_before
    }
}

// ------------- Catalog store -------------
/// The read surface the lookup engine is wired against. The production
/// implementation is [`crate::persist::SqliteCatalog`]; tests are free
/// to substitute their own.
pub trait CatalogStore: Send + Sync {
    /// All refbooks in identity order. With a date given, only refbooks
    /// having at least one version that started on or before it, each
    /// listed once.
    fn refbooks(&self, having_version_on_or_before: Option<NaiveDate>) -> Result<Vec<Refbook>>;
    /// A single refbook, or `None` when the identity is unknown.
    fn refbook(&self, refbook: RefbookId) -> Result<Option<Refbook>>;
    /// The versions of a refbook matching the filter, ordered by start
    /// date and then identity.
    fn versions(&self, refbook: RefbookId, filter: &VersionFilter) -> Result<Vec<Version>>;
    /// The elements of a version in insertion order.
    fn elements(&self, version: VersionId) -> Result<Vec<Element>>;
    /// Exact, case sensitive membership check for a code/value pair.
    fn element_exists(&self, version: VersionId, code: &str, value: &str) -> Result<bool>;
}
