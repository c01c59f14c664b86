//! Search engine adapter between searchable records and the remote store.
//!
//! This is the component with the actual control flow: it converts records
//! into embeddable documents, query text into filtered similarity queries,
//! raw matches back into rank-ordered key lists, and implements the
//! query+delete sweep used to empty one collection from a store that has no
//! native delete-by-filter primitive.
//!
//! The engine holds no local cache of document state; the remote store is
//! the sole source of truth. The only mutable state anywhere is the
//! per-invocation deleted-id set inside [`SearchEngine::flush`].

use crate::config::EmbeddingModel;
use crate::error::{EngineError, EngineResult};
use crate::record::{RecordKey, Searchable, flatten_field_map, namespaced_id};
use crate::store::types::{METADATA_KEY, METADATA_MODEL};
use crate::store::{Metadata, MetadataValue, VectorDocument, VectorMatch, VectorStore};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Default result count when a query does not specify a limit.
const DEFAULT_LIMIT: usize = 10;

/// Hard cap on the pagination window; a similarity query is top-K, not an
/// offset cursor, so deep pages are clamped here.
const PAGINATION_WINDOW_CAP: usize = 100;

/// Matches requested per sweep round during a flush.
const SWEEP_PAGE_SIZE: usize = 100;

/// Upper bound on sweep rounds. A store that keeps returning fresh matches
/// past this point is treated as non-converging rather than swept forever.
const MAX_SWEEP_ITERATIONS: usize = 1000;

/// Effective options handed to a search callback: the resolved limit and
/// the fully-built metadata filter.
#[derive(Debug, Clone)]
pub struct QueryOptions {
    pub limit: usize,
    pub filter: Metadata,
}

/// Matches returned by a search, with the total stashed alongside.
///
/// The total is whatever the producing path recorded. The remote store does
/// not report an authoritative match count, so for the non-callback path it
/// always equals the length of the capped page.
#[derive(Debug, Clone, Default)]
pub struct SearchResults {
    pub results: Vec<VectorMatch>,
    pub total: Option<usize>,
}

/// Override procedure that replaces the default search path. Receives the
/// store, the raw query text, and the effective options; its return value
/// is passed through unmodified.
pub type SearchCallback<S> =
    Box<dyn Fn(&S, &str, &QueryOptions) -> EngineResult<SearchResults> + Send + Sync>;

/// A search request against one logical collection.
///
/// `wheres` holds equality constraints passed through verbatim to the
/// store's filter; no operator translation happens here, so equality is the
/// only constraint shape this path supports.
pub struct SearchQuery<S> {
    collection: String,
    text: String,
    wheres: Metadata,
    limit: Option<usize>,
    callback: Option<SearchCallback<S>>,
}

impl<S> std::fmt::Debug for SearchQuery<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchQuery")
            .field("collection", &self.collection)
            .field("text", &self.text)
            .field("wheres", &self.wheres)
            .field("limit", &self.limit)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

impl<S> SearchQuery<S> {
    /// Start a query for `text` against one collection.
    pub fn new(collection: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            text: text.into(),
            wheres: Metadata::new(),
            limit: None,
            callback: None,
        }
    }

    /// Add an equality constraint on one metadata field.
    #[must_use]
    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.wheres.insert(field.into(), value.into());
        self
    }

    /// Cap the number of results.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Replace the default search path with a caller-supplied procedure.
    #[must_use]
    pub fn with_callback(mut self, callback: SearchCallback<S>) -> Self {
        self.callback = Some(callback);
        self
    }
}

/// The adapter implementing the indexing/search contract against a remote
/// vector store.
pub struct SearchEngine<S: VectorStore> {
    store: S,
    embedding_model: EmbeddingModel,
    default_limit: usize,
}

impl<S: VectorStore> std::fmt::Debug for SearchEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchEngine")
            .field("embedding_model", &self.embedding_model)
            .field("default_limit", &self.default_limit)
            .finish_non_exhaustive()
    }
}

impl<S: VectorStore> SearchEngine<S> {
    /// Create an engine over a store client.
    pub fn new(store: S, embedding_model: EmbeddingModel) -> Self {
        Self {
            store,
            embedding_model,
            default_limit: DEFAULT_LIMIT,
        }
    }

    /// Override the default result limit (from configuration).
    #[must_use]
    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit;
        self
    }

    /// Access the underlying store client.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Index a batch of records: one embedding call per document, then one
    /// upsert call for the whole batch.
    ///
    /// Records with an empty field map are dropped silently; they produce
    /// no document and no error. When every record is dropped (or the input
    /// is empty) no remote call is made at all.
    ///
    /// Only `model` and `key` are stored as metadata. Field-map entries feed
    /// the embedding text but are not persisted as filterable metadata;
    /// callers that need additional filter fields must manage metadata
    /// indexes and document metadata themselves.
    pub fn update<R: Searchable>(&self, records: &[R]) -> EngineResult<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut documents = Vec::new();
        for record in records {
            let fields = record.field_map();
            if fields.is_empty() {
                debug!(
                    collection = record.collection(),
                    key = %record.key(),
                    "record has no searchable fields, skipping"
                );
                continue;
            }

            // Precomputed text wins over the flattened field map; the field
            // map still decided the record was indexable at all.
            let text = record
                .searchable_text()
                .unwrap_or_else(|| flatten_field_map(&fields));

            let key = record.key();
            let mut metadata = Metadata::new();
            metadata.insert(METADATA_MODEL.to_string(), record.collection().into());
            metadata.insert(METADATA_KEY.to_string(), metadata_key(&key));

            let values = self.store.generate_embedding(&text)?;
            documents.push(VectorDocument {
                id: namespaced_id(record.collection(), &key),
                values,
                metadata,
            });
        }

        if documents.is_empty() {
            return Ok(());
        }

        info!(count = documents.len(), "upserting documents");
        self.store.insert_vectors(&documents)?;
        Ok(())
    }

    /// Remove a batch of records from the index. No-op on empty input.
    pub fn delete<R: Searchable>(&self, records: &[R]) -> EngineResult<()> {
        if records.is_empty() {
            return Ok(());
        }

        let ids: Vec<String> = records
            .iter()
            .map(|record| namespaced_id(record.collection(), &record.key()))
            .collect();

        info!(count = ids.len(), "deleting documents");
        self.store.delete_vectors(&ids)?;
        Ok(())
    }

    /// Run a similarity search for a query.
    ///
    /// The filter is the query's equality constraints plus an implicit
    /// `model = <collection>` conjunct, so a search against one collection
    /// never returns another collection's vectors from the shared index.
    pub fn search(&self, query: &SearchQuery<S>) -> EngineResult<SearchResults> {
        let limit = query.limit.unwrap_or(self.default_limit);
        self.run_query(query, limit)
    }

    /// Request the window for `page` of `per_page` results.
    ///
    /// A vector store returns only a top-K ranked list, so this requests
    /// `min(per_page * page, 100)` results and returns the whole window;
    /// slicing out the page is left to the caller. Page and per-page values
    /// of zero are not validated here; validate upstream.
    pub fn paginate(
        &self,
        query: &SearchQuery<S>,
        per_page: usize,
        page: usize,
    ) -> EngineResult<SearchResults> {
        let window = (per_page * page).min(PAGINATION_WINDOW_CAP);
        self.run_query(query, window)
    }

    fn run_query(&self, query: &SearchQuery<S>, limit: usize) -> EngineResult<SearchResults> {
        let mut filter = query.wheres.clone();
        filter.insert(
            METADATA_MODEL.to_string(),
            query.collection.as_str().into(),
        );
        let options = QueryOptions { limit, filter };

        // A callback owns the whole search; its output passes through
        // unvalidated and unreshaped.
        if let Some(callback) = &query.callback {
            return callback(&self.store, &query.text, &options);
        }

        let vector = self.store.generate_embedding(&query.text)?;
        let matches = self
            .store
            .query_vectors(&vector, options.limit, Some(&options.filter))?;

        debug!(
            collection = %query.collection,
            matches = matches.len(),
            "similarity query complete"
        );
        Ok(SearchResults {
            total: Some(matches.len()),
            results: matches,
        })
    }

    /// Extract native record keys from matches, preserving rank order.
    ///
    /// Keys are recovered from the `key` metadata field, never by parsing
    /// the composite vector id; matches without a key are dropped. The
    /// output order equals the match order, which [`SearchEngine::map`]
    /// relies on to restore relevance order after an unordered fetch.
    pub fn map_ids(&self, results: &SearchResults) -> Vec<RecordKey> {
        results
            .results
            .iter()
            .filter_map(|m| m.metadata.get(METADATA_KEY))
            .filter_map(record_key)
            .collect()
    }

    /// Map matches back to records via a batched, unordered fetch.
    ///
    /// Zero matches short-circuit to an empty collection without calling
    /// the fetcher. Fetched records whose key was not requested are dropped,
    /// and the survivors are re-sorted strictly by similarity rank, never by
    /// fetch order.
    pub fn map<T, F>(&self, results: &SearchResults, fetch: F, key_of: impl Fn(&T) -> RecordKey) -> Vec<T>
    where
        F: FnOnce(&[RecordKey]) -> Vec<T>,
    {
        let keys = self.map_ids(results);
        if keys.is_empty() {
            return Vec::new();
        }

        let positions: HashMap<&RecordKey, usize> =
            keys.iter().enumerate().map(|(i, k)| (k, i)).collect();

        let mut records: Vec<(usize, T)> = fetch(&keys)
            .into_iter()
            .filter_map(|record| {
                positions.get(&key_of(&record)).map(|&rank| (rank, record))
            })
            .collect();
        records.sort_by_key(|(rank, _)| *rank);
        records.into_iter().map(|(_, record)| record).collect()
    }

    /// Streaming variant of [`SearchEngine::map`]: the same filter and
    /// rank-sort applied over a streamed fetch.
    pub fn lazy_map<T, I, F>(
        &self,
        results: &SearchResults,
        fetch: F,
        key_of: impl Fn(&T) -> RecordKey,
    ) -> Vec<T>
    where
        I: IntoIterator<Item = T>,
        F: FnOnce(&[RecordKey]) -> I,
    {
        let keys = self.map_ids(results);
        if keys.is_empty() {
            return Vec::new();
        }

        let positions: HashMap<&RecordKey, usize> =
            keys.iter().enumerate().map(|(i, k)| (k, i)).collect();

        let mut records: Vec<(usize, T)> = fetch(&keys)
            .into_iter()
            .filter_map(|record| {
                positions.get(&key_of(&record)).map(|&rank| (rank, record))
            })
            .collect();
        records.sort_by_key(|(rank, _)| *rank);
        records.into_iter().map(|(_, record)| record).collect()
    }

    /// The total stashed by the producing search path, defaulting to zero.
    ///
    /// Not an authoritative remote count; see [`SearchResults`].
    pub fn get_total_count(&self, results: &SearchResults) -> usize {
        results.total.unwrap_or(0)
    }

    /// Delete every vector belonging to one logical collection.
    ///
    /// The store has no delete-by-filter primitive, so this sweeps with
    /// repeated filtered similarity queries against a zero-filled probe
    /// vector (syntactically valid, ranking irrelevant; only the filter
    /// matters) and deletes each batch by id.
    ///
    /// Already-deleted ids re-returned by a store lagging on deletion
    /// visibility are filtered out; a round that yields nothing new
    /// terminates the sweep, so the loop always makes progress.
    pub fn flush(&self, collection: &str) -> EngineResult<()> {
        let probe = vec![0.0_f32; self.embedding_model.dimensions()];
        let mut filter = Metadata::new();
        filter.insert(METADATA_MODEL.to_string(), collection.into());

        let mut deleted: HashSet<String> = HashSet::new();

        for round in 0..MAX_SWEEP_ITERATIONS {
            let matches = self
                .store
                .query_vectors(&probe, SWEEP_PAGE_SIZE, Some(&filter))?;
            if matches.is_empty() {
                info!(collection, total = deleted.len(), "flush complete");
                return Ok(());
            }

            let fresh: Vec<String> = matches
                .into_iter()
                .map(|m| m.id)
                .filter(|id| !deleted.contains(id))
                .collect();
            if fresh.is_empty() {
                // The store is still replaying ids we already deleted;
                // stop rather than spin on stale results.
                info!(collection, total = deleted.len(), "flush drained");
                return Ok(());
            }

            debug!(collection, round, batch = fresh.len(), "sweep round");
            self.store.delete_vectors(&fresh)?;
            deleted.extend(fresh);
        }

        Err(EngineError::SweepStalled {
            collection: collection.to_string(),
            iterations: MAX_SWEEP_ITERATIONS,
        })
    }

    /// Index creation is remote-managed; the adapter-level call is an
    /// explicit no-op kept for interface completeness. Use the operator
    /// commands for actual index lifecycle.
    pub fn create_index(&self, _name: &str) -> EngineResult<()> {
        Ok(())
    }

    /// Index deletion is remote-managed; explicit no-op, see
    /// [`SearchEngine::create_index`].
    pub fn delete_index(&self, _name: &str) -> EngineResult<()> {
        Ok(())
    }
}

/// Convert a record key into its metadata representation.
fn metadata_key(key: &RecordKey) -> MetadataValue {
    match key {
        RecordKey::Int(n) => MetadataValue::Int(*n),
        RecordKey::Str(s) => MetadataValue::Str(s.clone()),
    }
}

/// Recover a record key from a metadata value, if it is a usable scalar.
fn record_key(value: &MetadataValue) -> Option<RecordKey> {
    match value {
        MetadataValue::Int(n) => Some(RecordKey::Int(*n)),
        MetadataValue::Str(s) => Some(RecordKey::Str(s.clone())),
        MetadataValue::Float(x) if x.fract() == 0.0 => Some(RecordKey::Int(*x as i64)),
        MetadataValue::Float(_) | MetadataValue::Bool(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreResult;
    use std::cell::RefCell;

    /// Minimal store that records queries and answers with a fixed script.
    struct EchoStore {
        queries: RefCell<Vec<(usize, Option<Metadata>)>>,
    }

    impl EchoStore {
        fn new() -> Self {
            Self {
                queries: RefCell::new(Vec::new()),
            }
        }
    }

    impl VectorStore for EchoStore {
        fn generate_embedding(&self, _text: &str) -> StoreResult<Vec<f32>> {
            Ok(vec![0.1, 0.2])
        }

        fn insert_vectors(&self, _vectors: &[VectorDocument]) -> StoreResult<()> {
            Ok(())
        }

        fn query_vectors(
            &self,
            _vector: &[f32],
            top_k: usize,
            filter: Option<&Metadata>,
        ) -> StoreResult<Vec<VectorMatch>> {
            self.queries.borrow_mut().push((top_k, filter.cloned()));
            Ok(Vec::new())
        }

        fn delete_vectors(&self, _ids: &[String]) -> StoreResult<()> {
            Ok(())
        }
    }

    fn engine() -> SearchEngine<EchoStore> {
        SearchEngine::new(EchoStore::new(), EmbeddingModel::Base)
    }

    #[test]
    fn search_filter_includes_model_and_wheres() {
        let engine = engine();
        let query = SearchQuery::new("App\\Models\\Product", "red shoes")
            .where_eq("status", "published");
        engine.search(&query).unwrap();

        let queries = engine.store().queries.borrow();
        let (top_k, filter) = &queries[0];
        assert_eq!(*top_k, DEFAULT_LIMIT);
        let filter = filter.as_ref().unwrap();
        assert_eq!(
            filter.get(METADATA_MODEL),
            Some(&MetadataValue::Str("App\\Models\\Product".to_string()))
        );
        assert_eq!(
            filter.get("status"),
            Some(&MetadataValue::Str("published".to_string()))
        );
    }

    #[test]
    fn paginate_caps_the_window() {
        let engine = engine();
        let query = SearchQuery::new("Product", "anything");

        engine.paginate(&query, 15, 2).unwrap();
        engine.paginate(&query, 50, 7).unwrap();

        let queries = engine.store().queries.borrow();
        assert_eq!(queries[0].0, 30);
        assert_eq!(queries[1].0, PAGINATION_WINDOW_CAP);
    }

    #[test]
    fn callback_bypasses_embedding_and_query() {
        let engine = engine();
        let query = SearchQuery::new("Product", "ignored").with_callback(Box::new(
            |_store, text, options| {
                assert_eq!(text, "ignored");
                assert!(options.filter.contains_key(METADATA_MODEL));
                Ok(SearchResults {
                    results: Vec::new(),
                    total: Some(42),
                })
            },
        ));

        let results = engine.search(&query).unwrap();
        assert_eq!(engine.get_total_count(&results), 42);
        // The default path never ran
        assert!(engine.store().queries.borrow().is_empty());
    }

    #[test]
    fn total_count_defaults_to_zero() {
        let engine = engine();
        assert_eq!(engine.get_total_count(&SearchResults::default()), 0);
        let results = SearchResults {
            results: Vec::new(),
            total: Some(42),
        };
        assert_eq!(engine.get_total_count(&results), 42);
    }

    #[test]
    fn lifecycle_methods_are_noops() {
        let engine = engine();
        engine.create_index("records").unwrap();
        engine.delete_index("records").unwrap();
        assert!(engine.store().queries.borrow().is_empty());
    }
}
