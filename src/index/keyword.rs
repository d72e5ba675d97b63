//! Tantivy keyword index (BM25) backing the lexical channel

use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::{Field, Schema, Value, INDEXED, STORED, TEXT};
use tantivy::{doc, Index, IndexReader, ReloadPolicy, TantivyError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KeywordIndexError {
    #[error("Index initialization failed: {0}")]
    InitializationError(String),

    #[error("Cannot build keyword index over an empty corpus")]
    EmptyCorpus,

    #[error("Insert failed: {0}")]
    InsertError(String),

    #[error("Search failed: {0}")]
    SearchError(String),

    #[error("Tantivy error: {0}")]
    TantivyError(#[from] TantivyError),

    #[error("Query parsing error: {0}")]
    QueryParseError(String),
}

/// Keyword search hit: chunk id plus BM25 relevance score
#[derive(Debug, Clone)]
pub struct KeywordHit {
    pub id: u64,
    pub score: f32,
}

/// In-memory tantivy index over the chunk store
///
/// Built once per corpus and replaced wholesale on rebuild; never mutated
/// while queries are in flight.
pub struct KeywordIndex {
    index: Index,
    reader: IndexReader,
    id_field: Field,
    text_field: Field,
    doc_count: u64,
}

impl KeywordIndex {
    /// Build the index from `(chunk_id, text)` pairs
    ///
    /// Fails with `EmptyCorpus` when no documents are supplied; the hybrid
    /// retriever treats that as "lexical channel unavailable".
    pub fn build<'a, I>(docs: I) -> Result<Self, KeywordIndexError>
    where
        I: IntoIterator<Item = (u64, &'a str)>,
    {
        let mut schema_builder = Schema::builder();
        let id_field = schema_builder.add_u64_field("id", INDEXED | STORED);
        let text_field = schema_builder.add_text_field("text", TEXT);
        let schema = schema_builder.build();

        let index = Index::create_in_ram(schema);

        let mut writer = index
            .writer(50_000_000)
            .map_err(|e| KeywordIndexError::InitializationError(e.to_string()))?;

        let mut doc_count = 0u64;
        for (id, text) in docs {
            writer
                .add_document(doc!(
                    id_field => id,
                    text_field => text,
                ))
                .map_err(|e| KeywordIndexError::InsertError(e.to_string()))?;
            doc_count += 1;
        }

        if doc_count == 0 {
            return Err(KeywordIndexError::EmptyCorpus);
        }

        writer
            .commit()
            .map_err(|e| KeywordIndexError::InsertError(e.to_string()))?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()
            .map_err(|e: TantivyError| KeywordIndexError::InitializationError(e.to_string()))?;

        reader
            .reload()
            .map_err(|e| KeywordIndexError::InitializationError(e.to_string()))?;

        Ok(Self {
            index,
            reader,
            id_field,
            text_field,
            doc_count,
        })
    }

    /// Search the index, best-first, at most `limit` hits
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<KeywordHit>, KeywordIndexError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let searcher = self.reader.searcher();

        let query_parser = QueryParser::for_index(&self.index, vec![self.text_field]);
        let query = query_parser
            .parse_query(query)
            .map_err(|e| KeywordIndexError::QueryParseError(e.to_string()))?;

        let top_docs = searcher
            .search(&query, &TopDocs::with_limit(limit))
            .map_err(|e| KeywordIndexError::SearchError(e.to_string()))?;

        let mut results = Vec::with_capacity(top_docs.len());
        for (score, doc_address) in top_docs {
            let retrieved_doc: tantivy::TantivyDocument = searcher
                .doc(doc_address)
                .map_err(|e| KeywordIndexError::SearchError(e.to_string()))?;

            let id = retrieved_doc
                .get_first(self.id_field)
                .and_then(|v| v.as_u64())
                .ok_or_else(|| {
                    KeywordIndexError::SearchError("Missing or invalid ID field".to_string())
                })?;

            results.push(KeywordHit { id, score });
        }

        Ok(results)
    }

    pub fn len(&self) -> u64 {
        self.doc_count
    }

    pub fn is_empty(&self) -> bool {
        self.doc_count == 0
    }
}
