use crate::error::MemFileError;
use memchr::memchr_iter;
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

const SCAN_CHUNK: usize = 32 * 1024;

/// Read-only random access to a memory-mapped file, plus the primitives a
/// reverse line reader needs: counting lines, and locating the newline
/// immediately before/after any byte offset.
///
/// `pos` is the cursor `read_prev_line`/`read_next_line` advance; it sits
/// in `[0, MaxOffset]` whenever the file is non-empty.
pub struct MemFile {
    mmap: Option<Mmap>,
    length: usize,
    pos: usize,
}

impl MemFile {
    /// An empty, unopened file. Call [`MemFile::open`] before using it.
    pub fn new() -> Self {
        MemFile {
            mmap: None,
            length: 0,
            pos: 0,
        }
    }

    /// Maps `path` read-only. A zero-length file is represented with no
    /// mapping at all (mapping an empty file is not meaningful).
    pub fn open(path: impl AsRef<Path>) -> Result<Self, MemFileError> {
        let file = File::open(path)?;
        let length = file.metadata()?.len() as usize;
        let mmap = if length == 0 {
            None
        } else {
            // SAFETY: the file is opened read-only and not expected to be
            // mutated for the lifetime of this mapping, consistent with
            // its use as a log file being searched, not written to.
            Some(unsafe { Mmap::map(&file)? })
        };
        Ok(MemFile {
            mmap,
            length,
            pos: 0,
        })
    }

    pub fn close(&mut self) {
        self.mmap = None;
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// `length - 1`. Only meaningful for a non-empty file.
    pub fn max_offset(&self) -> usize {
        self.length.saturating_sub(1)
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    fn bytes(&self) -> &[u8] {
        match &self.mmap {
            Some(m) => &m[..],
            None => &[],
        }
    }

    /// Total count of `\n` bytes, scanned in fixed 32 KiB chunks.
    pub fn lines(&self) -> usize {
        let data = self.bytes();
        let mut count = 0;
        let mut offset = 0;
        while offset < data.len() {
            let end = (offset + SCAN_CHUNK).min(data.len());
            count += memchr_iter(b'\n', &data[offset..end]).count();
            offset = end;
        }
        count
    }

    pub fn goto_end(&mut self) {
        self.pos = self.max_offset();
    }

    fn do_read(&self, offset: usize, size: usize) -> String {
        String::from_utf8_lossy(&self.bytes()[offset..offset + size]).into_owned()
    }

    /// Reads the byte range `[start, end)` as text. Used by [`crate::window::Window`]
    /// to split a cached block into lines without disturbing `pos`.
    pub fn slice_text(&self, start: usize, end: usize) -> String {
        self.do_read(start, end - start)
    }

    /// Scans from `origin` towards the beginning of the file looking for
    /// a newline, returning `(new_pos, start, end)` such that
    /// `[start, end)` is the byte range of exactly one line. A newline
    /// sitting exactly at `origin` is treated as the terminator of the
    /// adjacent line and skipped, so repeated calls make progress.
    pub fn prev_newline(&self, origin: usize) -> (usize, usize, usize) {
        let max = self.max_offset();
        let mut pos = origin;
        let mut end = self.length;
        let mut start;

        if origin == 0 {
            return (0, 0, 0);
        }
        if pos >= max {
            pos = max;
        }
        start = pos;

        loop {
            if pos == 0 {
                start = pos;
                break;
            }
            let ch = self.bytes()[pos];
            if ch == b'\n' {
                if pos == origin {
                    end = pos;
                    pos -= 1;
                    continue;
                }
                start = pos + 1;
                break;
            }
            pos -= 1;
        }

        (pos, start, end)
    }

    /// Symmetric to [`Self::prev_newline`], scanning towards the end.
    pub fn next_newline(&self, origin: usize) -> (usize, usize, usize) {
        let max = self.max_offset();
        let mut pos = origin;
        let mut end = origin;
        let mut start = 0;

        if pos >= max {
            return (0, 0, 0);
        }

        loop {
            if pos == max {
                end = pos;
                break;
            }
            let ch = self.bytes()[pos];
            if ch == b'\n' {
                if pos == origin {
                    pos += 1;
                    start = pos;
                    continue;
                }
                end = pos;
                break;
            }
            pos += 1;
        }

        (pos, start, end)
    }

    /// Returns the text of the line ending at or just before `pos`, and
    /// advances `pos` past its start. Fails with [`MemFileError::Bof`]
    /// once the cursor is already at the beginning of the file.
    pub fn read_prev_line(&mut self) -> Result<String, MemFileError> {
        if self.pos == 0 {
            return Err(MemFileError::Bof);
        }
        let (pos, start, end) = self.prev_newline(self.pos);
        self.pos = pos;
        Ok(self.do_read(start, end - start))
    }

    /// Symmetric to [`Self::read_prev_line`]: reads the next line towards
    /// `MaxOffset`, failing with [`MemFileError::Eof`] once the cursor is
    /// already there.
    pub fn read_next_line(&mut self) -> Result<String, MemFileError> {
        if self.is_empty() || self.pos == self.max_offset() {
            return Err(MemFileError::Eof);
        }
        let (pos, start, end) = self.next_newline(self.pos);
        let line = self.do_read(start, end - start);
        self.pos = pos;
        Ok(line)
    }
}

impl Default for MemFile {
    fn default() -> Self {
        MemFile::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn fixture(contents: &str) -> (tempfile::NamedTempFile, MemFile) {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f.flush().unwrap();
        let mf = MemFile::open(f.path()).unwrap();
        (f, mf)
    }

    #[test]
    fn empty_file_has_zero_lines() {
        let (_tmp, mf) = fixture("");
        assert_eq!(mf.len(), 0);
        assert_eq!(mf.lines(), 0);
    }

    #[test]
    fn lines_counts_newlines() {
        let (_tmp, mf) = fixture("a\nb\nc\n");
        assert_eq!(mf.lines(), 3);
    }

    #[test]
    fn read_prev_line_from_fresh_cursor_is_bof() {
        let (_tmp, mut mf) = fixture("a\nb\nc\n");
        assert!(matches!(mf.read_prev_line(), Err(MemFileError::Bof)));
    }

    #[test]
    fn reverse_iteration_yields_lines_in_reverse() {
        let (_tmp, mut mf) = fixture("one\ntwo\nthree\n");
        mf.goto_end();
        let mut lines = Vec::new();
        loop {
            match mf.read_prev_line() {
                Ok(line) => lines.push(line),
                Err(MemFileError::Bof) => break,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(lines, vec!["three", "two", "one"]);
    }

    #[test]
    fn forward_iteration_yields_lines_in_order() {
        let (_tmp, mut mf) = fixture("one\ntwo\nthree\n");
        let mut lines = Vec::new();
        loop {
            match mf.read_next_line() {
                Ok(line) => lines.push(line),
                Err(MemFileError::Eof) => break,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(lines, vec!["one", "two", "three"]);
    }

    #[test]
    fn file_without_trailing_newline_still_reads_last_line() {
        let (_tmp, mut mf) = fixture("one\ntwo\nthree");
        mf.goto_end();
        let mut lines = Vec::new();
        loop {
            match mf.read_prev_line() {
                Ok(line) => lines.push(line),
                Err(MemFileError::Bof) => break,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(lines, vec!["three", "two", "one"]);
    }
}
