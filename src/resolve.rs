//! Version resolution: reducing the versions of a refbook to the single
//! one a request should read from.
//!
//! A request either pins a version by its exact label or names an as-of
//! date. Label resolution is case sensitive and pays no attention to
//! dates, so a version whose start date lies in the future can still be
//! read by naming it. Date resolution picks the latest version that had
//! started on the date in question.

use chrono::NaiveDate;
use tracing::warn;

use crate::catalog::{CatalogStore, RefbookId, Version, VersionFilter};
use crate::error::{Missing, RefbookdError, Result};

/// How the caller wants the version picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionSelector<'a> {
    /// Exact, case sensitive label match.
    Label(&'a str),
    /// The latest version with a start date on or before the given date.
    AsOf(NaiveDate),
}

/// Select the single version of `refbook` that satisfies `selector`,
/// or fail with [`Missing::Version`] when none does.
///
/// Labels and start dates are unique per refbook at the storage level.
/// Should the store ever hand back more than one candidate anyway, the
/// winner is still chosen deterministically (latest start date, then
/// lowest identity) and the fault is logged rather than escalated.
pub fn resolve(
    store: &dyn CatalogStore,
    refbook: RefbookId,
    selector: VersionSelector<'_>,
) -> Result<Version> {
    let candidates = match selector {
        VersionSelector::Label(label) => {
            let found = store.versions(refbook, &VersionFilter::with_label(label))?;
            if found.len() > 1 {
                warn!(
                    refbook,
                    label,
                    count = found.len(),
                    "version label is not unique within the refbook"
                );
            }
            found
        }
        VersionSelector::AsOf(date) => {
            store.versions(refbook, &VersionFilter::starting_on_or_before(date))?
        }
    };
    pick(refbook, candidates).ok_or(RefbookdError::NotFound(Missing::Version))
}

/// Reduce the qualifying versions to the applicable one. The latest
/// start date wins; among versions sharing a start date the lowest
/// identity wins, and the shared date is logged as a fault.
fn pick(refbook: RefbookId, candidates: Vec<Version>) -> Option<Version> {
    let mut winner: Option<Version> = None;
    let mut shared_start = false;
    for candidate in candidates {
        let replace = match &winner {
            None => true,
            Some(best) => {
                if candidate.start_date() == best.start_date() {
                    shared_start = true;
                    candidate.id() < best.id()
                } else {
                    let newer = candidate.start_date() > best.start_date();
                    if newer {
                        shared_start = false;
                    }
                    newer
                }
            }
        };
        if replace {
            winner = Some(candidate);
        }
    }
    if shared_start {
        if let Some(version) = &winner {
            warn!(
                refbook,
                start_date = %version.start_date(),
                picked = version.id(),
                "multiple versions share a start date, picking the lowest identity"
            );
        }
    }
    winner
}
