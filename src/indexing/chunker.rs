//! Splits file content into fixed-size line chunks.

use crate::types::CodeSnippet;

/// A run of contiguous lines, numbered from 1 and inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub content: String,
    pub line_start: u32,
    pub line_end: u32,
}

impl Chunk {
    pub fn into_snippet(self, file: &str, repo: &str) -> CodeSnippet {
        CodeSnippet {
            file: file.to_string(),
            repo: repo.to_string(),
            content: self.content,
            line_start: self.line_start,
            line_end: self.line_end,
        }
    }
}

/// Number of lines in `content`. A trailing newline does not start a new line.
pub fn count_lines(content: &str) -> usize {
    content.split_terminator('\n').count()
}

/// Split `content` into non-overlapping chunks of at most `chunk_lines` lines.
///
/// Chunks made only of whitespace are dropped. A `chunk_lines` of zero is
/// treated as one.
pub fn chunk_content(content: &str, chunk_lines: usize) -> Vec<Chunk> {
    let chunk_lines = chunk_lines.max(1);
    let lines: Vec<&str> = content.split_terminator('\n').collect();

    lines
        .chunks(chunk_lines)
        .enumerate()
        .filter_map(|(i, window)| {
            let text = window.join("\n");
            if text.trim().is_empty() {
                return None;
            }
            let line_start = (i * chunk_lines + 1) as u32;
            Some(Chunk {
                content: text,
                line_start,
                line_end: line_start + window.len() as u32 - 1,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_lines(n: usize) -> String {
        (1..=n).map(|i| format!("let x{i} = {i};\n")).collect()
    }

    #[test]
    fn test_120_lines_make_three_chunks() {
        let chunks = chunk_content(&numbered_lines(120), 50);
        let ranges: Vec<(u32, u32)> = chunks.iter().map(|c| (c.line_start, c.line_end)).collect();
        assert_eq!(ranges, vec![(1, 50), (51, 100), (101, 120)]);
        assert!(chunks[0].content.starts_with("let x1 = 1;"));
        assert!(chunks[2].content.ends_with("let x120 = 120;"));
        assert_eq!(chunks[1].content.lines().count(), 50);
    }

    #[test]
    fn test_blank_file_has_no_chunks() {
        assert!(chunk_content("\n\n   \n\t\n", 50).is_empty());
        assert!(chunk_content("", 50).is_empty());
    }

    #[test]
    fn test_whitespace_chunk_is_dropped_but_numbering_continues() {
        let mut content = " \n".repeat(50);
        content.push_str("fn tail() {}\n");
        let chunks = chunk_content(&content, 50);
        assert_eq!(chunks.len(), 1);
        assert_eq!((chunks[0].line_start, chunks[0].line_end), (51, 51));
    }

    #[test]
    fn test_missing_trailing_newline() {
        let chunks = chunk_content("a\nb\nc", 2);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].content, "c");
        assert_eq!((chunks[1].line_start, chunks[1].line_end), (3, 3));
        assert_eq!(count_lines("a\nb\nc"), 3);
        assert_eq!(count_lines("a\nb\nc\n"), 3);
    }

    #[test]
    fn test_into_snippet_keeps_range() {
        let snippet = chunk_content("fn a() {}\n", 50)
            .remove(0)
            .into_snippet("repo/a.rs", "repo");
        assert_eq!(snippet.file, "repo/a.rs");
        assert_eq!(snippet.line_count(), 1);
    }
}
