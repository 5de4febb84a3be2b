/// File handling utilities
///
/// This module provides the streaming text decoder used by the analyzer,
/// encoding label lookup, companion path derivation and atomic sibling writes.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use encoding_rs::{CoderResult, Decoder, Encoding};
use log::debug;
use tempfile::NamedTempFile;

use crate::error::{CsvHeroError, Result};

/// Extension given to companion documents
pub const README_EXTENSION: &str = "readme.md";

const INPUT_CHUNK: usize = 8 * 1024;
const OUTPUT_CHUNK: usize = 16 * 1024;

/// Look up an encoding by its WHATWG label (`utf-8`, `latin1`, `shift_jis`, ...)
pub fn resolve_encoding(label: &str) -> Result<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| CsvHeroError::UnknownEncoding(label.to_string()))
}

/// Decode a byte sample in one go, replacing malformed sequences
///
/// A leading BOM for `encoding` is stripped, matching [`DecodingReader`].
pub fn decode_sample(encoding: &'static Encoding, bytes: &[u8]) -> String {
    let (text, had_errors) = encoding.decode_with_bom_removal(bytes);
    if had_errors {
        debug!("Sample contained bytes not valid in {}", encoding.name());
    }
    text.into_owned()
}

/// Read adapter that turns bytes in any supported encoding into UTF-8
///
/// Malformed input becomes U+FFFD instead of an error, and only a fixed pair of
/// buffers is held regardless of input size.
pub struct DecodingReader<R> {
    inner: R,
    decoder: Decoder,
    input: Box<[u8]>,
    input_start: usize,
    input_end: usize,
    output: String,
    output_pos: usize,
    eof: bool,
    finished: bool,
}

impl<R: Read> DecodingReader<R> {
    pub fn new(inner: R, encoding: &'static Encoding) -> Self {
        Self {
            inner,
            decoder: encoding.new_decoder_with_bom_removal(),
            input: vec![0u8; INPUT_CHUNK].into_boxed_slice(),
            input_start: 0,
            input_end: 0,
            output: String::with_capacity(OUTPUT_CHUNK),
            output_pos: 0,
            eof: false,
            finished: false,
        }
    }

    fn fill_output(&mut self) -> io::Result<()> {
        self.output.clear();
        self.output_pos = 0;

        while self.output.is_empty() && !self.finished {
            if self.input_start == self.input_end && !self.eof {
                let n = match self.inner.read(&mut self.input) {
                    Ok(n) => n,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e),
                };
                self.input_start = 0;
                self.input_end = n;
                self.eof = n == 0;
            }

            let (result, read, _) = self.decoder.decode_to_string(
                &self.input[self.input_start..self.input_end],
                &mut self.output,
                self.eof,
            );
            self.input_start += read;

            if self.eof && result == CoderResult::InputEmpty {
                self.finished = true;
            }
        }

        Ok(())
    }
}

impl<R: Read> Read for DecodingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.output_pos == self.output.len() {
            self.fill_output()?;
        }

        let pending = &self.output.as_bytes()[self.output_pos..];
        let n = pending.len().min(buf.len());
        buf[..n].copy_from_slice(&pending[..n]);
        self.output_pos += n;
        Ok(n)
    }
}

/// Companion document path for a source file
///
/// `orders.csv` becomes `orders.readme.md` in the same directory. The `.csv`
/// extension is dropped first and then whatever extension remains is replaced,
/// so `sales.2024.csv` becomes `sales.readme.md`.
pub fn readme_path_for(csv_path: &Path) -> PathBuf {
    csv_path.with_extension("").with_extension(README_EXTENSION)
}

/// Write `contents` next to its final location and rename it into place
///
/// With `overwrite` unset the rename refuses to replace an existing file, so a
/// destination that appears mid-write is still reported as existing.
pub fn write_atomic(dest: &Path, contents: &[u8], overwrite: bool) -> Result<()> {
    let write_err = |source: io::Error| CsvHeroError::Write {
        path: dest.to_path_buf(),
        source,
    };

    let parent = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(parent).map_err(write_err)?;
    tmp.write_all(contents).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;

    if overwrite {
        tmp.persist(dest).map_err(|e| write_err(e.error))?;
    } else {
        tmp.persist_noclobber(dest).map_err(|e| {
            if e.error.kind() == io::ErrorKind::AlreadyExists {
                CsvHeroError::DestinationExists(dest.to_path_buf())
            } else {
                write_err(e.error)
            }
        })?;
    }

    Ok(())
}

/// Absolute, symlink-free location of an existing file
pub fn resolve_path(path: &Path) -> Result<PathBuf> {
    fs::canonicalize(path).map_err(|source| CsvHeroError::Read {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hands out one byte per read to exercise sequences split across chunks
    struct Trickle<'a>(&'a [u8]);

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.0.is_empty() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.0[0];
            self.0 = &self.0[1..];
            Ok(1)
        }
    }

    fn decode_all<R: Read>(reader: R, encoding: &'static Encoding) -> String {
        let mut out = String::new();
        DecodingReader::new(reader, encoding)
            .read_to_string(&mut out)
            .unwrap();
        out
    }

    #[test]
    fn test_resolve_encoding_labels() {
        assert_eq!(resolve_encoding("utf-8").unwrap(), encoding_rs::UTF_8);
        assert_eq!(resolve_encoding("UTF8").unwrap(), encoding_rs::UTF_8);
        assert_eq!(resolve_encoding("latin1").unwrap(), encoding_rs::WINDOWS_1252);
        assert!(matches!(
            resolve_encoding("klingon"),
            Err(CsvHeroError::UnknownEncoding(_))
        ));
    }

    #[test]
    fn test_utf8_passthrough_split_across_reads() {
        let text = "naïve,日本語,emoji 🎉\n1,2,3\n";
        assert_eq!(decode_all(Trickle(text.as_bytes()), encoding_rs::UTF_8), text);
    }

    #[test]
    fn test_invalid_bytes_become_replacement_char() {
        let bytes = b"a,b\n\xff\xfe,x\n";
        let decoded = decode_all(&bytes[..], encoding_rs::UTF_8);
        assert!(decoded.starts_with("a,b\n"));
        assert!(decoded.contains('\u{FFFD}'));
        assert!(decoded.ends_with(",x\n"));
    }

    #[test]
    fn test_truncated_sequence_at_eof() {
        // First two bytes of a three byte sequence
        let bytes = b"ok\xe6\x97";
        assert_eq!(decode_all(&bytes[..], encoding_rs::UTF_8), "ok\u{FFFD}");
    }

    #[test]
    fn test_latin1_and_bom() {
        assert_eq!(decode_all(&b"caf\xe9"[..], encoding_rs::WINDOWS_1252), "café");
        assert_eq!(decode_all(&b"\xef\xbb\xbfid"[..], encoding_rs::UTF_8), "id");
    }

    #[test]
    fn test_large_input_decodes_completely() {
        let line = "alpha,beta,gamma\n";
        let text = line.repeat(10_000);
        assert_eq!(decode_all(text.as_bytes(), encoding_rs::UTF_8).len(), text.len());
    }

    #[test]
    fn test_readme_path_for() {
        assert_eq!(
            readme_path_for(Path::new("data/orders.csv")),
            PathBuf::from("data/orders.readme.md")
        );
        assert_eq!(readme_path_for(Path::new("a.csv")), PathBuf::from("a.readme.md"));
        assert_eq!(
            readme_path_for(Path::new("/x/sales.2024.csv")),
            PathBuf::from("/x/sales.readme.md")
        );
        assert_eq!(
            readme_path_for(Path::new("dir.v2/.csv")),
            PathBuf::from("dir.v2/.csv.readme.md")
        );
    }

    #[test]
    fn test_write_atomic_refuses_then_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("a.readme.md");

        write_atomic(&dest, b"first", false).unwrap();
        assert!(matches!(
            write_atomic(&dest, b"second", false),
            Err(CsvHeroError::DestinationExists(_))
        ));
        assert_eq!(fs::read(&dest).unwrap(), b"first");

        write_atomic(&dest, b"third", true).unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"third");

        // No temp files left behind
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
