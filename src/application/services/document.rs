use std::path::{Path, PathBuf};
use std::sync::Arc;

use chardetng::EncodingDetector;
use encoding_rs::UTF_8;
use futures::future::try_join_all;
use tracing::instrument;
use walkdir::WalkDir;

use crate::application::RagService;
use crate::domain::{chunk_document, Document, DocumentChunk, DomainError, TextSplitter};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub documents: usize,
    pub chunks: usize,
}

/// Loads text files, cuts them into chunks and hands them to the index.
pub struct DocumentService {
    rag: Arc<RagService>,
    splitter: TextSplitter,
    docs_dir: PathBuf,
}

impl DocumentService {
    pub fn new(rag: Arc<RagService>, splitter: TextSplitter, docs_dir: impl Into<PathBuf>) -> Self {
        Self {
            rag,
            splitter,
            docs_dir: docs_dir.into(),
        }
    }

    /// Indexes the given files, copies them into the managed documents
    /// directory and saves the index. Files already indexed are indexed again.
    #[instrument(skip(self, paths), fields(count = paths.len()))]
    pub async fn ingest_files(&self, paths: &[PathBuf]) -> Result<IngestReport, DomainError> {
        let loaded = try_join_all(paths.iter().map(|p| self.load(p))).await?;

        for path in paths {
            self.copy_to_store(path).await?;
        }

        self.index(loaded).await
    }

    /// Indexes every `*.txt` file below the documents directory without copying.
    #[instrument(skip(self), fields(dir = %self.docs_dir.display()))]
    pub async fn index_directory(&self) -> Result<IngestReport, DomainError> {
        let root = self.docs_dir.clone();
        let paths = tokio::task::spawn_blocking(move || collect_text_files(&root))
            .await
            .map_err(|e| DomainError::internal(e.to_string()))?;

        let loaded = try_join_all(paths.iter().map(|p| self.load(p))).await?;
        self.index(loaded).await
    }

    async fn index(
        &self,
        loaded: Vec<(Document, Vec<DocumentChunk>)>,
    ) -> Result<IngestReport, DomainError> {
        let report = IngestReport {
            documents: loaded.len(),
            chunks: loaded.iter().map(|(_, chunks)| chunks.len()).sum(),
        };
        let chunks: Vec<DocumentChunk> = loaded.into_iter().flat_map(|(_, c)| c).collect();

        self.rag.index_chunks(&chunks).await?;
        self.rag.persist().await?;

        tracing::info!(
            documents = report.documents,
            chunks = report.chunks,
            "documents ingested"
        );
        Ok(report)
    }

    async fn load(&self, path: &Path) -> Result<(Document, Vec<DocumentChunk>), DomainError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            DomainError::Io(std::io::Error::new(
                e.kind(),
                format!("{}: {e}", path.display()),
            ))
        })?;
        let text = decode_text(path, &bytes);

        let document = Document::from_path(path);
        let chunks = chunk_document(&document, &text, &self.splitter);
        tracing::debug!(source = %document.source, chunks = chunks.len(), "document split");
        Ok((document, chunks))
    }

    async fn copy_to_store(&self, path: &Path) -> Result<(), DomainError> {
        let file_name = path.file_name().ok_or_else(|| {
            DomainError::validation(format!("{} has no file name", path.display()))
        })?;

        tokio::fs::create_dir_all(&self.docs_dir).await?;
        let target = self.docs_dir.join(file_name);

        if same_file(path, &target).await {
            return Ok(());
        }
        tokio::fs::copy(path, &target).await?;
        Ok(())
    }
}

async fn same_file(a: &Path, b: &Path) -> bool {
    match (tokio::fs::canonicalize(a).await, tokio::fs::canonicalize(b).await) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Decodes file contents in their detected encoding. Valid UTF-8 (with or
/// without BOM) is taken as is; anything else goes through detection, with
/// undecodable bytes replaced.
fn decode_text(path: &Path, bytes: &[u8]) -> String {
    let encoding = match encoding_rs::Encoding::for_bom(bytes) {
        Some((encoding, _)) => encoding,
        None if std::str::from_utf8(bytes).is_ok() => UTF_8,
        None => {
            let mut detector = EncodingDetector::new();
            detector.feed(bytes, true);
            detector.guess(None, true)
        }
    };

    let (text, used, had_errors) = encoding.decode(bytes);
    if used != UTF_8 {
        tracing::debug!(path = %path.display(), encoding = used.name(), "decoded non-UTF-8 text");
    }
    if had_errors {
        tracing::warn!(path = %path.display(), encoding = used.name(), "replaced undecodable bytes");
    }
    text.into_owned()
}

fn collect_text_files(root: &Path) -> Vec<PathBuf> {
    if !root.is_dir() {
        return Vec::new();
    }

    let mut paths: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable entry in documents directory");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "txt"))
        .collect();
    paths.sort();
    paths
}
