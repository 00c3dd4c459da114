// crates/gridreg-services/src/search.rs
// ============================================================================
// Module: Search Service
// Description: Read-only regulation search.
// Purpose: Answer keyword and facet queries without transaction state.
// Dependencies: gridreg-core, gridreg-store-sqlite
// ============================================================================

//! ## Overview
//! A thin read-only query component with the same filtering semantics as the
//! regulation service's `list`. It exists separately because it is invoked
//! independently of any mutation lifecycle and owns no transaction state.

// ============================================================================
// SECTION: Imports
// ============================================================================

use gridreg_core::Regulation;
use gridreg_core::ServiceError;
use gridreg_core::ServiceResult;
use gridreg_store_sqlite::RegulationFilter;
use gridreg_store_sqlite::Store;

// ============================================================================
// SECTION: Service
// ============================================================================

/// Read-only regulation search.
#[derive(Clone, Copy)]
pub struct SearchService<'a> {
    /// Backing store.
    store: &'a Store,
}

impl<'a> SearchService<'a> {
    /// Creates the service over the store.
    #[must_use]
    pub const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Searches regulations by keyword with optional facets.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Storage`] on persistence failure.
    pub fn search(
        &self,
        keyword: &str,
        country: Option<&str>,
        category: Option<&str>,
    ) -> ServiceResult<Vec<Regulation>> {
        let filter = RegulationFilter {
            country: country.map(str::to_string),
            category: category.map(str::to_string),
            keyword: if keyword.trim().is_empty() {
                None
            } else {
                Some(keyword.to_string())
            },
            ..RegulationFilter::default()
        };
        self.store
            .list_regulations(&filter)
            .map_err(|err| ServiceError::Storage(err.to_string()))
    }
}
