use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::splitter::TextSplitter;

/// A source text file known to the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub name: String,
    pub source: String,
    pub created_at: DateTime<Utc>,
}

impl Document {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            source: source.into(),
            created_at: Utc::now(),
        }
    }

    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::new(name, path.to_string_lossy())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: Uuid,
    pub document_id: Uuid,
    pub source: String,
    pub content: String,
    pub chunk_index: usize,
}

impl DocumentChunk {
    pub fn new(document: &Document, content: impl Into<String>, chunk_index: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id: document.id,
            source: document.source.clone(),
            content: content.into(),
            chunk_index,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub chunk: DocumentChunk,
    pub score: f32,
}

/// Splits a document's text into indexed chunks, numbered from 0.
pub fn chunk_document(
    document: &Document,
    content: &str,
    splitter: &TextSplitter,
) -> Vec<DocumentChunk> {
    splitter
        .split(content)
        .into_iter()
        .enumerate()
        .map(|(i, text)| DocumentChunk::new(document, text, i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunks_carry_provenance() {
        let doc = Document::from_path(Path::new("/data/notes/rust.txt"));
        let splitter = TextSplitter::new(10, 0).unwrap();
        let chunks = chunk_document(&doc, "First.\n\nSecond one.", &splitter);

        assert_eq!(doc.name, "rust.txt");
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].chunk_index, 1);
        assert!(chunks
            .iter()
            .all(|c| c.document_id == doc.id && c.source == "/data/notes/rust.txt"));
    }

    #[test]
    fn test_empty_document_has_no_chunks() {
        let doc = Document::new("empty.txt", "empty.txt");
        let splitter = TextSplitter::new(100, 10).unwrap();
        assert!(chunk_document(&doc, "", &splitter).is_empty());
    }
}
