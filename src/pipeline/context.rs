//! Grounding context assembly and source previews

use crate::pipeline::protocol::Source;
use crate::store::Chunk;

/// Maximum preview length in characters
pub const PREVIEW_MAX_CHARS: usize = 160;

/// Render fused chunks into the page-annotated context block
///
/// Fusion order is preserved and nothing is re-ranked or truncated here;
/// `fused_top_k` already bounds the input.
pub fn assemble_context(chunks: &[Chunk]) -> String {
    chunks
        .iter()
        .map(|c| format!("[Page {}] {}", c.page_number, c.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Build the citation entry for a chunk
pub fn source_from_chunk(chunk: &Chunk) -> Source {
    let preview: String = chunk
        .text
        .chars()
        .take(PREVIEW_MAX_CHARS)
        .map(|c| if c == '\n' || c == '\r' || c == '\t' { ' ' } else { c })
        .collect();

    Source {
        page: Some(chunk.page_number),
        preview,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_format_and_order() {
        let chunks = vec![
            Chunk::new("apples are red", 1),
            Chunk::new("bananas are yellow", 2),
        ];

        let context = assemble_context(&chunks);
        assert_eq!(
            context,
            "[Page 1] apples are red\n\n[Page 2] bananas are yellow"
        );
    }

    #[test]
    fn test_empty_context() {
        assert_eq!(assemble_context(&[]), "");
    }

    #[test]
    fn test_preview_truncates_to_160_chars() {
        let chunk = Chunk::new("x".repeat(500), 3);
        let source = source_from_chunk(&chunk);
        assert_eq!(source.preview.chars().count(), PREVIEW_MAX_CHARS);
        assert_eq!(source.page, Some(3));
    }

    #[test]
    fn test_preview_short_text_unpadded() {
        let chunk = Chunk::new("short", 1);
        let source = source_from_chunk(&chunk);
        assert_eq!(source.preview, "short");
    }

    #[test]
    fn test_preview_has_no_newlines() {
        let chunk = Chunk::new("line one\nline two\r\nline\tthree", 1);
        let source = source_from_chunk(&chunk);
        assert!(!source.preview.contains('\n'));
        assert!(!source.preview.contains('\r'));
        assert_eq!(source.preview, "line one line two  line three");
    }

    #[test]
    fn test_preview_counts_chars_not_bytes() {
        let chunk = Chunk::new("é".repeat(200), 1);
        let source = source_from_chunk(&chunk);
        assert_eq!(source.preview.chars().count(), PREVIEW_MAX_CHARS);
    }
}
