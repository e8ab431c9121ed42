//! Refbookd – a lookup service for versioned reference dictionaries.
//!
//! Refbookd centers on the *refbook* concept: a coded catalog of terms
//! (countries, currencies, diagnoses) whose contents change over time
//! through discrete, dated versions:
//! * A [`catalog::Refbook`] is a dictionary with an identity, a unique code and a name.
//! * A [`catalog::Version`] is a dated snapshot of a refbook, active from its
//!   start date until the next version of the same refbook starts.
//! * A [`catalog::Element`] is a code/value pair belonging to exactly one version.
//!
//! Requests either pin a version by its exact label or name an as-of date,
//! and [`resolve::resolve`] deterministically selects the single applicable
//! version: the one with the latest start date not after the date in
//! question. The [`lookup::LookupService`] builds the three public read
//! operations on top of that rule.
//!
//! ## Modules
//! * [`catalog`] – Domain types and the read-only [`catalog::CatalogStore`] interface.
//! * [`resolve`] – Version resolution by explicit label or as-of date.
//! * [`lookup`] – The lookup operations: list refbooks, list elements, check an element.
//! * [`persist`] – SQLite persistence behind the store interface.
//! * [`seed`] – JSON seed documents loaded at startup.
//! * [`server`] – The HTTP surface (axum router and JSON translation).
//! * [`error`] – The error taxonomy shared across the crate.
//!
//! ## Persistence
//! The [`persist::SqliteCatalog`] encapsulates SQLite schema creation and all
//! queries. The engine only ever reads through [`catalog::CatalogStore`], so
//! tests can substitute any other implementation.
//!
//! ## Quick Start
//! ```
//! use std::sync::Arc;
//! use refbookd::persist::{PersistenceMode, SqliteCatalog};
//! use refbookd::lookup::LookupService;
//! let catalog = SqliteCatalog::new(PersistenceMode::InMemory).unwrap();
//! let refbook = catalog.persist_refbook("ICD-10", "Diagnoses", "").unwrap();
//! let version = catalog.persist_version(refbook, "2024", "2024-01-01".parse().unwrap()).unwrap();
//! catalog.persist_element(version, "A00", "Cholera").unwrap();
//! let lookup = LookupService::new(Arc::new(catalog));
//! assert!(lookup.check_element(refbook, Some("A00"), Some("Cholera"), Some("2024")).unwrap());
//! ```

pub mod catalog;
pub mod error;
pub mod lookup;
pub mod persist;
pub mod resolve;
pub mod seed;
pub mod server;
