//! Operator-facing index and metadata-index lifecycle procedures.
//!
//! Thin wrappers over the store client, but with two invariants enforced
//! locally before any mutating remote call: the hard cap of
//! [`METADATA_INDEX_LIMIT`] metadata indexes per physical index, and no
//! duplicate property names. Both require a prior successful listing; if the
//! listing itself fails the operation is aborted rather than attempted
//! optimistically.

use crate::config::Settings;
use crate::error::{AdminError, AdminResult};
use crate::store::IndexAdmin;
use crate::store::types::SimilarityMetric;
use tracing::{info, warn};

/// Hard cap on metadata indexes per physical index.
pub const METADATA_INDEX_LIMIT: usize = 10;

/// Create the physical vector index, refusing if it already exists.
///
/// Dimensionality comes from the configured embedding model and the metric
/// from the search settings, so the index always matches the vectors the
/// engine will send it.
pub fn create_index<C: IndexAdmin>(client: &C, settings: &Settings) -> AdminResult<()> {
    if client.index_exists()? {
        return Err(AdminError::IndexAlreadyExists {
            name: client.index_name().to_string(),
        });
    }

    let dimensions = settings.embedding_model().dimensions();
    let metric = SimilarityMetric::from_name(&settings.search.metric);
    client.create_index(client.index_name(), dimensions, metric)?;
    info!(
        index = client.index_name(),
        dimensions,
        "created vector index"
    );
    Ok(())
}

/// Delete the physical index and everything in it.
pub fn delete_index<C: IndexAdmin>(client: &C) -> AdminResult<()> {
    client.delete_index()?;
    info!(index = client.index_name(), "deleted vector index");
    Ok(())
}

/// Create a metadata index for one property.
///
/// Refused locally, without any mutating remote call, when the listing
/// already reports [`METADATA_INDEX_LIMIT`] entries or already contains the
/// property.
pub fn create_metadata_index<C: IndexAdmin>(
    client: &C,
    property: &str,
    index_type: &str,
) -> AdminResult<()> {
    let existing = client.list_metadata_indexes()?;

    if existing.len() >= METADATA_INDEX_LIMIT {
        return Err(AdminError::MetadataIndexCapReached {
            limit: METADATA_INDEX_LIMIT,
            existing: existing.len(),
        });
    }
    if existing.iter().any(|entry| entry.property_name == property) {
        return Err(AdminError::DuplicateMetadataIndex {
            property: property.to_string(),
        });
    }

    client.create_metadata_index(property, index_type)?;
    info!(property, index_type, "created metadata index");
    Ok(())
}

/// Delete the metadata index for one property.
///
/// `typed_confirmation` must equal the property name exactly; this is the
/// second confirmation the operator re-types, distinct from the yes/no
/// prompt, because the deletion is irreversible.
pub fn delete_metadata_index<C: IndexAdmin>(
    client: &C,
    property: &str,
    typed_confirmation: &str,
) -> AdminResult<()> {
    if typed_confirmation != property {
        return Err(AdminError::ConfirmationMismatch {
            expected: property.to_string(),
        });
    }

    let existing = client.list_metadata_indexes()?;
    if !existing.iter().any(|entry| entry.property_name == property) {
        warn!(property, "property not in metadata index listing");
    }

    client.delete_metadata_index(property)?;
    info!(property, "deleted metadata index");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{StoreError, StoreResult};
    use crate::store::types::{IndexInfo, MetadataIndexEntry};
    use std::cell::RefCell;

    /// Scripted lifecycle client that counts mutating calls.
    struct MockAdmin {
        exists: bool,
        listing: StoreResult<Vec<MetadataIndexEntry>>,
        mutations: RefCell<usize>,
    }

    impl MockAdmin {
        fn with_properties(names: &[&str]) -> Self {
            Self {
                exists: true,
                listing: Ok(names
                    .iter()
                    .map(|name| MetadataIndexEntry {
                        property_name: name.to_string(),
                        index_type: Some("string".to_string()),
                    })
                    .collect()),
                mutations: RefCell::new(0),
            }
        }

        fn with_failed_listing() -> Self {
            Self {
                exists: true,
                listing: Err(StoreError::RemoteCallFailed {
                    operation: "metadata index list",
                    status: 500,
                    message: "listing unavailable".to_string(),
                }),
                mutations: RefCell::new(0),
            }
        }

        fn mutations(&self) -> usize {
            *self.mutations.borrow()
        }
    }

    impl IndexAdmin for MockAdmin {
        fn index_name(&self) -> &str {
            "records"
        }

        fn get_index_info(&self) -> StoreResult<IndexInfo> {
            Ok(IndexInfo {
                vector_count: 0,
                dimension: 768,
                similarity_function: Some("cosine".to_string()),
            })
        }

        fn index_exists(&self) -> StoreResult<bool> {
            Ok(self.exists)
        }

        fn create_index(
            &self,
            _name: &str,
            _dimensions: usize,
            _metric: SimilarityMetric,
        ) -> StoreResult<()> {
            *self.mutations.borrow_mut() += 1;
            Ok(())
        }

        fn delete_index(&self) -> StoreResult<()> {
            *self.mutations.borrow_mut() += 1;
            Ok(())
        }

        fn create_metadata_index(&self, _property: &str, _index_type: &str) -> StoreResult<()> {
            *self.mutations.borrow_mut() += 1;
            Ok(())
        }

        fn delete_metadata_index(&self, _property: &str) -> StoreResult<()> {
            *self.mutations.borrow_mut() += 1;
            Ok(())
        }

        fn list_metadata_indexes(&self) -> StoreResult<Vec<MetadataIndexEntry>> {
            match &self.listing {
                Ok(entries) => Ok(entries.clone()),
                Err(_) => Err(StoreError::RemoteCallFailed {
                    operation: "metadata index list",
                    status: 500,
                    message: "listing unavailable".to_string(),
                }),
            }
        }
    }

    #[test]
    fn creation_refused_at_cap_without_remote_call() {
        let names: Vec<String> = (0..10).map(|i| format!("prop{i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let client = MockAdmin::with_properties(&refs);

        let err = create_metadata_index(&client, "fresh", "string").unwrap_err();
        assert_eq!(err.status_code(), "METADATA_INDEX_CAP");
        assert_eq!(client.mutations(), 0);
    }

    #[test]
    fn creation_refused_for_duplicate_property() {
        let client = MockAdmin::with_properties(&["status"]);

        let err = create_metadata_index(&client, "status", "string").unwrap_err();
        assert_eq!(err.status_code(), "DUPLICATE_METADATA_INDEX");
        assert_eq!(client.mutations(), 0);
    }

    #[test]
    fn creation_proceeds_under_cap() {
        let client = MockAdmin::with_properties(&["status"]);
        create_metadata_index(&client, "category", "string").unwrap();
        assert_eq!(client.mutations(), 1);
    }

    #[test]
    fn listing_failure_aborts_creation() {
        let client = MockAdmin::with_failed_listing();
        let err = create_metadata_index(&client, "status", "string").unwrap_err();
        assert_eq!(err.status_code(), "REMOTE_CALL_FAILED");
        assert_eq!(client.mutations(), 0);
    }

    #[test]
    fn deletion_requires_exact_retyped_property() {
        let client = MockAdmin::with_properties(&["status"]);

        let err = delete_metadata_index(&client, "status", "staus").unwrap_err();
        assert_eq!(err.status_code(), "CONFIRMATION_MISMATCH");
        assert_eq!(client.mutations(), 0);

        delete_metadata_index(&client, "status", "status").unwrap();
        assert_eq!(client.mutations(), 1);
    }

    #[test]
    fn listing_failure_aborts_deletion() {
        let client = MockAdmin::with_failed_listing();
        let err = delete_metadata_index(&client, "status", "status").unwrap_err();
        assert_eq!(err.status_code(), "REMOTE_CALL_FAILED");
        assert_eq!(client.mutations(), 0);
    }

    #[test]
    fn index_creation_refused_when_present() {
        let client = MockAdmin::with_properties(&[]);
        let err = create_index(&client, &Settings::default()).unwrap_err();
        assert_eq!(err.status_code(), "INDEX_EXISTS");
        assert_eq!(client.mutations(), 0);
    }

    #[test]
    fn index_creation_uses_model_dimensions() {
        let mut client = MockAdmin::with_properties(&[]);
        client.exists = false;
        let mut settings = Settings::default();
        settings.embedding.model = "large".to_string();
        create_index(&client, &settings).unwrap();
        assert_eq!(client.mutations(), 1);
    }
}
