// used for persistence
use rusqlite::{Connection, Error, params};

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::NaiveDate;

use crate::catalog::{
    CatalogStore, Element, ElementId, Refbook, RefbookId, Version, VersionFilter, VersionId,
};
use crate::error::{RefbookdError, Result};

/// Where the catalog database lives.
#[derive(Debug, Clone)]
pub enum PersistenceMode {
    /// A durable database file at the given path, created on first use.
    File(PathBuf),
    /// A private in-memory database, gone once dropped. Used by tests
    /// and benchmarks.
    InMemory,
}

// ------------- Persistence -------------
/// SQLite-backed catalog. All access goes through one connection behind
/// a mutex, so the store can be shared across threads.
pub struct SqliteCatalog {
    db: Mutex<Connection>,
}

impl SqliteCatalog {
    pub fn new(mode: PersistenceMode) -> Result<Self> {
        let connection = match mode {
            PersistenceMode::File(path) => Connection::open(path)?,
            PersistenceMode::InMemory => Connection::open_in_memory()?,
        };
        connection.pragma_update(None, "foreign_keys", "ON")?;
        connection.busy_timeout(Duration::from_secs(5))?;
        // The "STRICT" keyword introduced in 3.37.0 breaks JDBC connections, which makes
        // debugging using an external tool like DBeaver impossible
        connection.execute_batch(
            "
            create table if not exists Refbook (
                Refbook_Identity integer not null,
                Code text not null,
                Name text not null,
                Description text not null default '',
                constraint referenceable_Refbook_Identity primary key (
                    Refbook_Identity
                ),
                constraint unique_Refbook unique (
                    Code
                )
            );-- STRICT;
            create table if not exists Version (
                Version_Identity integer not null,
                Refbook_Identity integer not null,
                Version text not null,
                StartDate text not null,
                constraint Version_of_Refbook foreign key (
                    Refbook_Identity
                ) references Refbook(Refbook_Identity) on delete cascade,
                constraint referenceable_Version_Identity primary key (
                    Version_Identity
                ),
                constraint unique_Version unique (
                    Refbook_Identity,
                    Version
                ),
                constraint unique_Version_StartDate unique (
                    Refbook_Identity,
                    StartDate
                )
            );-- STRICT;
            create table if not exists Element (
                Element_Identity integer not null,
                Version_Identity integer not null,
                Code text not null,
                Value text not null,
                constraint Element_of_Version foreign key (
                    Version_Identity
                ) references Version(Version_Identity) on delete cascade,
                constraint referenceable_Element_Identity primary key (
                    Element_Identity
                ),
                constraint unique_Element unique (
                    Version_Identity,
                    Code
                )
            );-- STRICT;
            ",
        )?;
        Ok(Self {
            db: Mutex::new(connection),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.db.lock().map_err(|e| RefbookdError::Lock(e.to_string()))
    }

    /// Insert a refbook, or hand back the identity it is already
    /// stored under. Codes are unique across the catalog.
    pub fn persist_refbook(&self, code: &str, name: &str, description: &str) -> Result<RefbookId> {
        let db = self.lock()?;
        match db
            .prepare_cached(
                "
                select Refbook_Identity
                    from Refbook
                    where Code = ?
            ",
            )?
            .query_row::<RefbookId, _, _>(params![&code], |r| r.get(0))
        {
            Ok(existing) => Ok(existing),
            Err(Error::QueryReturnedNoRows) => {
                db.prepare_cached(
                    "
                insert into Refbook (
                    Code,
                    Name,
                    Description
                ) values (?, ?, ?)
            ",
                )?
                .execute(params![&code, &name, &description])?;
                Ok(db.last_insert_rowid())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Insert a version of a refbook, or hand back the identity it is
    /// already stored under. Labels are unique within a refbook.
    pub fn persist_version(
        &self,
        refbook: RefbookId,
        label: &str,
        start_date: NaiveDate,
    ) -> Result<VersionId> {
        let db = self.lock()?;
        match db
            .prepare_cached(
                "
                select Version_Identity
                    from Version
                    where Refbook_Identity = ?
                    and Version = ?
            ",
            )?
            .query_row::<VersionId, _, _>(params![&refbook, &label], |r| r.get(0))
        {
            Ok(existing) => Ok(existing),
            Err(Error::QueryReturnedNoRows) => {
                db.prepare_cached(
                    "
                insert into Version (
                    Refbook_Identity,
                    Version,
                    StartDate
                ) values (?, ?, ?)
            ",
                )?
                .execute(params![&refbook, &label, &start_date])?;
                Ok(db.last_insert_rowid())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Insert an element of a version, or hand back the identity it is
    /// already stored under. Codes are unique within a version.
    pub fn persist_element(&self, version: VersionId, code: &str, value: &str) -> Result<ElementId> {
        let db = self.lock()?;
        match db
            .prepare_cached(
                "
                select Element_Identity
                    from Element
                    where Version_Identity = ?
                    and Code = ?
            ",
            )?
            .query_row::<ElementId, _, _>(params![&version, &code], |r| r.get(0))
        {
            Ok(existing) => Ok(existing),
            Err(Error::QueryReturnedNoRows) => {
                db.prepare_cached(
                    "
                insert into Element (
                    Version_Identity,
                    Code,
                    Value
                ) values (?, ?, ?)
            ",
                )?
                .execute(params![&version, &code, &value])?;
                Ok(db.last_insert_rowid())
            }
            Err(err) => Err(err.into()),
        }
    }
}

fn read_refbook(row: &rusqlite::Row<'_>) -> rusqlite::Result<Refbook> {
    Ok(Refbook::new(
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
    ))
}

fn read_version(row: &rusqlite::Row<'_>) -> rusqlite::Result<Version> {
    Ok(Version::new(
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
    ))
}

fn read_element(row: &rusqlite::Row<'_>) -> rusqlite::Result<Element> {
    Ok(Element::new(
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
    ))
}

impl CatalogStore for SqliteCatalog {
    fn refbooks(&self, having_version_on_or_before: Option<NaiveDate>) -> Result<Vec<Refbook>> {
        let db = self.lock()?;
        let mut refbooks = Vec::new();
        match having_version_on_or_before {
            Some(date) => {
                let mut stmt = db.prepare_cached(
                    "
                select distinct r.Refbook_Identity, r.Code, r.Name, r.Description
                    from Refbook r
                    join Version v
                    on v.Refbook_Identity = r.Refbook_Identity
                    where v.StartDate <= ?
                    order by r.Refbook_Identity
            ",
                )?;
                let rows = stmt.query_map(params![&date], read_refbook)?;
                for row in rows {
                    refbooks.push(row?);
                }
            }
            None => {
                let mut stmt = db.prepare_cached(
                    "
                select Refbook_Identity, Code, Name, Description
                    from Refbook
                    order by Refbook_Identity
            ",
                )?;
                let rows = stmt.query_map([], read_refbook)?;
                for row in rows {
                    refbooks.push(row?);
                }
            }
        }
        Ok(refbooks)
    }

    fn refbook(&self, refbook: RefbookId) -> Result<Option<Refbook>> {
        let db = self.lock()?;
        match db
            .prepare_cached(
                "
                select Refbook_Identity, Code, Name, Description
                    from Refbook
                    where Refbook_Identity = ?
            ",
            )?
            .query_row(params![&refbook], read_refbook)
        {
            Ok(found) => Ok(Some(found)),
            Err(Error::QueryReturnedNoRows) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn versions(&self, refbook: RefbookId, filter: &VersionFilter) -> Result<Vec<Version>> {
        let db = self.lock()?;
        let mut versions = Vec::new();
        match (filter.label(), filter.starts_on_or_before()) {
            // A label picks an exact version no matter when it started,
            // so a date bound next to it carries no extra restriction.
            (Some(label), _) => {
                let mut stmt = db.prepare_cached(
                    "
                select Version_Identity, Refbook_Identity, Version, StartDate
                    from Version
                    where Refbook_Identity = ?
                    and Version = ?
                    order by StartDate, Version_Identity
            ",
                )?;
                let rows = stmt.query_map(params![&refbook, &label], read_version)?;
                for row in rows {
                    versions.push(row?);
                }
            }
            (None, Some(date)) => {
                let mut stmt = db.prepare_cached(
                    "
                select Version_Identity, Refbook_Identity, Version, StartDate
                    from Version
                    where Refbook_Identity = ?
                    and StartDate <= ?
                    order by StartDate, Version_Identity
            ",
                )?;
                let rows = stmt.query_map(params![&refbook, &date], read_version)?;
                for row in rows {
                    versions.push(row?);
                }
            }
            (None, None) => {
                let mut stmt = db.prepare_cached(
                    "
                select Version_Identity, Refbook_Identity, Version, StartDate
                    from Version
                    where Refbook_Identity = ?
                    order by StartDate, Version_Identity
            ",
                )?;
                let rows = stmt.query_map(params![&refbook], read_version)?;
                for row in rows {
                    versions.push(row?);
                }
            }
        }
        Ok(versions)
    }

    fn elements(&self, version: VersionId) -> Result<Vec<Element>> {
        let db = self.lock()?;
        let mut elements = Vec::new();
        let mut stmt = db.prepare_cached(
            "
                select Element_Identity, Version_Identity, Code, Value
                    from Element
                    where Version_Identity = ?
                    order by Element_Identity
            ",
        )?;
        let rows = stmt.query_map(params![&version], read_element)?;
        for row in rows {
            elements.push(row?);
        }
        Ok(elements)
    }

    fn element_exists(&self, version: VersionId, code: &str, value: &str) -> Result<bool> {
        let db = self.lock()?;
        let found = db
            .prepare_cached(
                "
                select exists (
                    select 1
                        from Element
                        where Version_Identity = ?
                        and Code = ?
                        and Value = ?
                )
            ",
            )?
            .query_row::<bool, _, _>(params![&version, &code, &value], |r| r.get(0))?;
        Ok(found)
    }
}
