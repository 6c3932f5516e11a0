//! Chunk store writer: chunks → normalized records → one table append.

use docqa_core::document::Chunk;
use docqa_core::error::StoreError;
use docqa_core::store::{ChunkMetadata, NewRecord, VectorTable};
use tracing::debug;

pub struct ChunkStoreWriter;

impl ChunkStoreWriter {
    /// Build the stored form of one chunk.
    ///
    /// Pages are the sorted, deduplicated union over every contributing
    /// item; the title is the outermost heading.
    pub fn to_record(chunk: &Chunk) -> NewRecord {
        let pages = chunk
            .doc_items
            .iter()
            .flat_map(|item| item.provenance.iter().map(|p| p.page_no));

        NewRecord {
            text: chunk.text.clone(),
            metadata: ChunkMetadata::new(chunk.filename.clone(), pages, chunk.headings.first().cloned()),
        }
    }

    /// Append all chunks to `table` as a single batch.
    ///
    /// Never reads existing rows, so writing the same chunks twice stores
    /// them twice. An empty slice does not touch the table.
    pub async fn write(chunks: &[Chunk], table: &dyn VectorTable) -> Result<usize, StoreError> {
        if chunks.is_empty() {
            return Ok(0);
        }
        let records: Vec<NewRecord> = chunks.iter().map(Self::to_record).collect();
        let written = table.add(records).await?;
        debug!(table = table.name(), written, "Stored chunks");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docqa_core::document::ChunkItem;
    use docqa_rag::{ContextRetriever, EntryClass};
    use docqa_store::InMemoryTable;
    use docqa_store::testing::{FailingEmbedder, HashEmbedder};
    use std::sync::Arc;

    fn chunk(text: &str, filename: Option<&str>, pages: &[&[u32]], headings: &[&str]) -> Chunk {
        Chunk {
            text: text.into(),
            filename: filename.map(String::from),
            doc_items: pages.iter().map(|p| ChunkItem::from_pages(p.iter().copied())).collect(),
            headings: headings.iter().map(|h| h.to_string()).collect(),
        }
    }

    #[test]
    fn record_normalizes_pages_and_takes_first_heading() {
        let record = ChunkStoreWriter::to_record(&chunk(
            "net.ipv4.tcp_rmem = 4096 87380 6291456",
            Some("net-tuning.pdf"),
            &[&[12], &[7, 7]],
            &["Intro", "Details"],
        ));

        assert_eq!(record.metadata.filename.as_deref(), Some("net-tuning.pdf"));
        assert_eq!(record.metadata.page_numbers, Some(vec![7, 12]));
        assert_eq!(record.metadata.title.as_deref(), Some("Intro"));
    }

    #[test]
    fn record_without_pages_or_headings() {
        let record = ChunkStoreWriter::to_record(&chunk("text", None, &[&[]], &[]));
        assert_eq!(record.metadata, ChunkMetadata::default());
    }

    #[tokio::test]
    async fn write_appends_one_batch() {
        let embedder = Arc::new(HashEmbedder::default());
        let table = InMemoryTable::new("docling", embedder.clone());
        let chunks = vec![
            chunk("a", Some("a.md"), &[], &[]),
            chunk("b", Some("a.md"), &[], &[]),
        ];

        assert_eq!(ChunkStoreWriter::write(&chunks, &table).await.unwrap(), 2);
        assert_eq!(embedder.calls(), 1);

        // No deduplication on re-ingest
        ChunkStoreWriter::write(&chunks, &table).await.unwrap();
        assert_eq!(table.count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn written_chunk_is_retrieved_with_its_citation() {
        let table = InMemoryTable::new("docling", Arc::new(HashEmbedder::default()));
        let chunks = vec![
            chunk(
                "Buffer sizes matter on fast links",
                Some("net-tuning.pdf"),
                &[&[3]],
                &["Overview"],
            ),
            chunk(
                "net.ipv4.tcp_rmem = 4194304 8388608 25165824",
                Some("net-tuning.pdf"),
                &[&[12], &[7, 7]],
                &["Kernel Parameters"],
            ),
        ];
        ChunkStoreWriter::write(&chunks, &table).await.unwrap();

        let context = ContextRetriever::default()
            .retrieve("tcp_rmem buffer", &table, 20)
            .await
            .unwrap();

        assert_eq!(context.len(), 2);
        let entry = &context.entries[0];
        assert_eq!(entry.text, "net.ipv4.tcp_rmem = 4194304 8388608 25165824");
        assert_eq!(entry.filename.as_deref(), Some("net-tuning.pdf"));
        assert_eq!(entry.page_numbers, Some(vec![7, 12]));
        assert_eq!(entry.title.as_deref(), Some("Kernel Parameters"));
        assert_eq!(entry.class, EntryClass::Complete);
        assert_eq!(context.entries[1].class, EntryClass::Other);
        assert!(context.render().starts_with(
            "net.ipv4.tcp_rmem = 4194304 8388608 25165824\nSource: net-tuning.pdf - p. 7, 12\nTitle: Kernel Parameters\n\n"
        ));
    }

    #[tokio::test]
    async fn empty_input_does_not_touch_the_table() {
        let table = InMemoryTable::new("docling", Arc::new(FailingEmbedder { ndims: 4 }));
        assert_eq!(ChunkStoreWriter::write(&[], &table).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn embedding_failure_propagates() {
        let table = InMemoryTable::new("docling", Arc::new(FailingEmbedder { ndims: 4 }));
        let err = ChunkStoreWriter::write(&[chunk("a", None, &[], &[])], &table)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Embedding(_)));
    }
}
