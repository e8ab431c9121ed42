//! The lookup engine: the three read operations the service exposes,
//! built on top of [`resolve`](crate::resolve) and a [`CatalogStore`].

use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use crate::catalog::{CatalogStore, Element, Refbook, RefbookId};
use crate::error::{Missing, RefbookdError, Result};
use crate::resolve::{self, VersionSelector};

/// Read-only lookups over a shared catalog store. Cloning is cheap and
/// every clone reads from the same store.
#[derive(Clone)]
pub struct LookupService {
    store: Arc<dyn CatalogStore>,
}

impl LookupService {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// List refbooks in identity order. With `as_of` given, only
    /// refbooks that had a version active on that date are listed,
    /// each once.
    pub fn refbooks(&self, as_of: Option<NaiveDate>) -> Result<Vec<Refbook>> {
        self.store.refbooks(as_of)
    }

    /// List the elements of the resolved version of a refbook, in
    /// insertion order. A resolved version without elements is reported
    /// as [`Missing::Elements`], never as an empty list.
    pub fn elements(&self, refbook: RefbookId, version: Option<&str>) -> Result<Vec<Element>> {
        self.require_refbook(refbook)?;
        let version = resolve::resolve(self.store.as_ref(), refbook, selector(version))?;
        let elements = self.store.elements(version.id())?;
        if elements.is_empty() {
            return Err(RefbookdError::NotFound(Missing::Elements));
        }
        Ok(elements)
    }

    /// Validate a code/value pair against the resolved version of a
    /// refbook. Both parts are compared exactly and case sensitively;
    /// an absent pair is an error, a pair that simply is not in the
    /// version yields `Ok(false)`.
    pub fn check_element(
        &self,
        refbook: RefbookId,
        code: Option<&str>,
        value: Option<&str>,
        version: Option<&str>,
    ) -> Result<bool> {
        let (code, value) = match (required(code), required(value)) {
            (Some(code), Some(value)) => (code, value),
            _ => {
                return Err(RefbookdError::BadRequest(
                    "Parameters code and value must be provided".to_owned(),
                ));
            }
        };
        self.require_refbook(refbook)?;
        let version = resolve::resolve(self.store.as_ref(), refbook, selector(version))?;
        self.store.element_exists(version.id(), code, value)
    }

    fn require_refbook(&self, refbook: RefbookId) -> Result<Refbook> {
        self.store
            .refbook(refbook)?
            .ok_or(RefbookdError::NotFound(Missing::Refbook))
    }
}

// An empty parameter counts as an absent one.
fn required(param: Option<&str>) -> Option<&str> {
    param.filter(|p| !p.is_empty())
}

fn selector(version: Option<&str>) -> VersionSelector<'_> {
    match required(version) {
        Some(label) => VersionSelector::Label(label),
        None => VersionSelector::AsOf(today()),
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}
