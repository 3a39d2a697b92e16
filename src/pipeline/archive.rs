use std::io::{Cursor, Read};
use tracing::debug;
use zip::ZipArchive;

use crate::error::{CompileError, Result};

/// One file from the input archive, undecoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawArchiveEntry {
    pub path: String,
    pub content: Vec<u8>,
}

/// Default cap on the total decompressed size of an input archive.
pub const DEFAULT_MAX_EXTRACTED_BYTES: u64 = 50 * 1024 * 1024;

/// Decode every file entry of a zip archive, in archive order.
///
/// Directory entries are skipped. Decompressed output is capped at
/// `max_extracted_bytes` in total, counted from the bytes actually inflated
/// rather than the sizes the headers declare. Any parse or decompression
/// failure, or exceeding the cap, is an `ArchiveFormat` error; nothing
/// partial is returned.
pub fn read_archive(bytes: &[u8], max_extracted_bytes: u64) -> Result<Vec<RawArchiveEntry>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut entries = Vec::with_capacity(archive.len());
    let mut remaining = max_extracted_bytes;

    for index in 0..archive.len() {
        let mut file = archive.by_index(index)?;
        if file.is_dir() {
            continue;
        }

        let path = file.name().replace('\\', "/");
        let mut content = Vec::new();
        (&mut file)
            .take(remaining.saturating_add(1))
            .read_to_end(&mut content)
            .map_err(|e| {
                CompileError::ArchiveFormat(format!("failed to decompress '{}': {}", path, e))
            })?;

        let read = content.len() as u64;
        if read > remaining {
            return Err(CompileError::ArchiveFormat(format!(
                "contents expand beyond the {} byte limit (at '{}')",
                max_extracted_bytes, path
            )));
        }
        remaining -= read;

        debug!("Read archive entry {} ({} bytes)", path, content.len());
        entries.push(RawArchiveEntry { path, content });
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn make_zip(files: &[(&str, &str)], dirs: &[&str]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        for dir in dirs {
            writer.add_directory(*dir, options).unwrap();
        }
        for (name, body) in files {
            writer.start_file(*name, options).unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_reads_entries_in_archive_order() {
        let bytes = make_zip(
            &[("SKILL.MD", "Draw a spiral"), ("code.js", "function draw(){}")],
            &[],
        );
        let entries = read_archive(&bytes, DEFAULT_MAX_EXTRACTED_BYTES).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].path, "SKILL.MD");
        assert_eq!(entries[0].content, b"Draw a spiral");
        assert_eq!(entries[1].path, "code.js");
    }

    #[test]
    fn test_skips_directory_entries() {
        let bytes = make_zip(
            &[("skill/SKILL.md", "x"), ("skill/assets/a.txt", "y")],
            &["skill/", "skill/assets/"],
        );
        let entries = read_archive(&bytes, DEFAULT_MAX_EXTRACTED_BYTES).unwrap();
        let paths: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["skill/SKILL.md", "skill/assets/a.txt"]);
    }

    #[test]
    fn test_empty_archive_yields_no_entries() {
        let bytes = make_zip(&[], &[]);
        assert!(read_archive(&bytes, DEFAULT_MAX_EXTRACTED_BYTES).unwrap().is_empty());
    }

    #[test]
    fn test_garbage_bytes_are_archive_format_error() {
        let err =
            read_archive(b"definitely not a zip file", DEFAULT_MAX_EXTRACTED_BYTES).unwrap_err();
        assert!(matches!(err, CompileError::ArchiveFormat(_)));
    }

    #[test]
    fn test_truncated_archive_is_archive_format_error() {
        let bytes = make_zip(&[("SKILL.MD", "Draw a spiral")], &[]);
        let truncated = &bytes[..bytes.len() / 2];
        assert!(matches!(
            read_archive(truncated, DEFAULT_MAX_EXTRACTED_BYTES),
            Err(CompileError::ArchiveFormat(_))
        ));
    }

    #[test]
    fn test_single_entry_over_limit_rejected() {
        let big = "a".repeat(4096);
        let bytes = make_zip(&[("SKILL.MD", "Draw a spiral"), ("pad.txt", &big)], &[]);
        let err = read_archive(&bytes, 1024).unwrap_err();
        assert!(matches!(err, CompileError::ArchiveFormat(_)));
        assert!(err.to_string().contains("1024 byte limit"));
        assert!(err.to_string().contains("pad.txt"));
    }

    #[test]
    fn test_limit_counts_all_entries_together() {
        let part = "b".repeat(600);
        let bytes = make_zip(&[("a.txt", &part), ("b.txt", &part)], &[]);
        assert!(read_archive(&bytes, 1200).is_ok());
        assert!(matches!(
            read_archive(&bytes, 1199),
            Err(CompileError::ArchiveFormat(_))
        ));
    }

    #[test]
    fn test_deflated_padding_is_measured_after_inflation() {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        writer.start_file("SKILL.MD", options).unwrap();
        writer.write_all(b"Draw a spiral").unwrap();
        writer.start_file("pad.txt", options).unwrap();
        writer.write_all(&vec![b'a'; 1024 * 1024]).unwrap();
        let bytes = writer.finish().unwrap().into_inner();
        assert!(bytes.len() < 64 * 1024);

        let err = read_archive(&bytes, 256 * 1024).unwrap_err();
        assert!(matches!(err, CompileError::ArchiveFormat(_)));
    }
}
