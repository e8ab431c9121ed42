use chrono::NaiveDate;

use refbookd::catalog::{
    CatalogStore, Element, Refbook, RefbookId, Version, VersionFilter, VersionId,
};
use refbookd::error::{Missing, RefbookdError, Result};
use refbookd::persist::{PersistenceMode, SqliteCatalog};
use refbookd::resolve::{VersionSelector, resolve};

fn date(text: &str) -> NaiveDate {
    text.parse().expect("date")
}

fn setup() -> (SqliteCatalog, RefbookId) {
    let catalog = SqliteCatalog::new(PersistenceMode::InMemory).expect("db");
    let refbook = catalog
        .persist_refbook("ICD-10", "Diagnoses", "")
        .expect("refbook");
    catalog
        .persist_version(refbook, "1.0", date("2020-01-01"))
        .expect("version");
    catalog
        .persist_version(refbook, "2.0", date("2021-01-01"))
        .expect("version");
    catalog
        .persist_version(refbook, "3.0", date("2022-01-01"))
        .expect("version");
    (catalog, refbook)
}

#[test]
fn label_resolution_matches_exactly() {
    let (catalog, refbook) = setup();
    let version = resolve(&catalog, refbook, VersionSelector::Label("2.0")).expect("version");
    assert_eq!(version.label(), "2.0");
    assert_eq!(version.start_date(), date("2021-01-01"));
}

#[test]
fn label_resolution_is_case_sensitive() {
    let (catalog, refbook) = setup();
    catalog
        .persist_version(refbook, "v4", date("2023-01-01"))
        .expect("version");
    let err = resolve(&catalog, refbook, VersionSelector::Label("V4")).unwrap_err();
    assert!(matches!(err, RefbookdError::NotFound(Missing::Version)));
}

#[test]
fn label_resolution_ignores_dates() {
    // A version that only starts far in the future is still reachable by label
    let catalog = SqliteCatalog::new(PersistenceMode::InMemory).expect("db");
    let refbook = catalog
        .persist_refbook("draft", "Draft book", "")
        .expect("refbook");
    catalog
        .persist_version(refbook, "9.0", date("2999-01-01"))
        .expect("version");
    let version = resolve(&catalog, refbook, VersionSelector::Label("9.0")).expect("version");
    assert_eq!(version.start_date(), date("2999-01-01"));
}

#[test]
fn as_of_picks_the_latest_started_version() {
    let (catalog, refbook) = setup();
    let version =
        resolve(&catalog, refbook, VersionSelector::AsOf(date("2021-06-15"))).expect("version");
    assert_eq!(version.label(), "2.0");
}

#[test]
fn as_of_includes_the_start_date_itself() {
    let (catalog, refbook) = setup();
    let version =
        resolve(&catalog, refbook, VersionSelector::AsOf(date("2021-01-01"))).expect("version");
    assert_eq!(version.label(), "2.0");
}

#[test]
fn as_of_before_the_first_version_finds_nothing() {
    let (catalog, refbook) = setup();
    let err = resolve(&catalog, refbook, VersionSelector::AsOf(date("2019-12-31"))).unwrap_err();
    assert!(matches!(err, RefbookdError::NotFound(Missing::Version)));
}

#[test]
fn refbook_without_versions_finds_nothing() {
    let catalog = SqliteCatalog::new(PersistenceMode::InMemory).expect("db");
    let refbook = catalog
        .persist_refbook("empty", "Empty book", "")
        .expect("refbook");
    let err = resolve(&catalog, refbook, VersionSelector::AsOf(date("2022-01-01"))).unwrap_err();
    assert!(matches!(err, RefbookdError::NotFound(Missing::Version)));
}

#[test]
fn resolution_is_monotonic_in_the_as_of_date() {
    let (catalog, refbook) = setup();
    let dates = [
        "2020-01-01",
        "2020-06-01",
        "2021-01-01",
        "2021-12-31",
        "2022-01-01",
        "2030-01-01",
    ];
    let mut previous: Option<NaiveDate> = None;
    for as_of in dates {
        let version =
            resolve(&catalog, refbook, VersionSelector::AsOf(date(as_of))).expect("version");
        if let Some(p) = previous {
            assert!(
                version.start_date() >= p,
                "a later as-of date must not resolve to an earlier version"
            );
        }
        previous = Some(version.start_date());
    }
}

// A store handing back version sets the SQLite schema itself would
// refuse to hold, to exercise the deterministic fault handling.
struct FaultyStore {
    versions: Vec<Version>,
}

impl CatalogStore for FaultyStore {
    fn refbooks(&self, _having_version_on_or_before: Option<NaiveDate>) -> Result<Vec<Refbook>> {
        Ok(Vec::new())
    }
    fn refbook(&self, refbook: RefbookId) -> Result<Option<Refbook>> {
        Ok(Some(Refbook::new(
            refbook,
            "faulty".to_owned(),
            "Faulty".to_owned(),
            String::new(),
        )))
    }
    fn versions(&self, _refbook: RefbookId, filter: &VersionFilter) -> Result<Vec<Version>> {
        let mut found: Vec<Version> = self
            .versions
            .iter()
            .filter(|v| {
                filter.label().is_none_or(|label| v.label() == label)
                    && filter
                        .starts_on_or_before()
                        .is_none_or(|d| v.start_date() <= d)
            })
            .cloned()
            .collect();
        found.sort();
        Ok(found)
    }
    fn elements(&self, _version: VersionId) -> Result<Vec<Element>> {
        Ok(Vec::new())
    }
    fn element_exists(&self, _version: VersionId, _code: &str, _value: &str) -> Result<bool> {
        Ok(false)
    }
}

#[test]
fn shared_start_dates_resolve_to_the_lowest_identity() {
    let store = FaultyStore {
        versions: vec![
            Version::new(9, 1, "2.0b".to_owned(), date("2021-01-01")),
            Version::new(7, 1, "2.0a".to_owned(), date("2021-01-01")),
            Version::new(1, 1, "1.0".to_owned(), date("2020-01-01")),
        ],
    };
    let version = resolve(&store, 1, VersionSelector::AsOf(date("2021-06-01"))).expect("version");
    assert_eq!(
        version.id(),
        7,
        "the lowest identity among tied versions must win"
    );
}

#[test]
fn duplicate_labels_resolve_to_the_latest_start_date() {
    let store = FaultyStore {
        versions: vec![
            Version::new(3, 1, "1.0".to_owned(), date("2020-01-01")),
            Version::new(5, 1, "1.0".to_owned(), date("2021-01-01")),
        ],
    };
    let version = resolve(&store, 1, VersionSelector::Label("1.0")).expect("version");
    assert_eq!(version.id(), 5);
}
