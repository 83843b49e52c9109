use crate::error::MemFileError;
use crate::memfile::MemFile;
use std::collections::BTreeMap;

/// One page's byte extent within the file: `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub start: usize,
    pub end: usize,
}

impl Block {
    pub fn size(&self) -> usize {
        self.end - self.start
    }
}

/// A paged view over a [`MemFile`]: page 0 is anchored at the end of the
/// file, and increasing page index moves toward the beginning. Page
/// extents are computed once per index and memoised in `blocks`.
pub struct Window {
    file: MemFile,
    lines_per_page: usize,
    total_lines: usize,
    blocks: BTreeMap<usize, Block>,
    current_index: usize,
}

impl Window {
    /// Builds a window whose page 0 covers the last `lines_per_page`
    /// lines of `file`.
    pub fn make_window(file: MemFile, lines_per_page: usize) -> Self {
        let total_lines = file.lines();
        let mut window = Window {
            file,
            lines_per_page: lines_per_page.max(1),
            total_lines,
            blocks: BTreeMap::new(),
            current_index: 0,
        };
        if !window.file.is_empty() {
            window.make_extents(0);
        }
        window
    }

    /// Scans backward `lines_per_page` times from the page's origin to
    /// find the block start, then forward the same number of times from
    /// that start to find the block end. Caches the result.
    fn make_extents(&mut self, index: usize) -> Block {
        if let Some(block) = self.blocks.get(&index) {
            return *block;
        }

        let origin = if index == 0 {
            self.file.max_offset()
        } else {
            self.blocks
                .get(&(index - 1))
                .expect("preceding page must already be materialised")
                .start
        };

        let mut pos = origin;
        for _ in 0..self.lines_per_page {
            let (new_pos, start, _end) = self.file.prev_newline(pos);
            pos = new_pos;
            if start == 0 && new_pos == 0 {
                break;
            }
        }
        let start = pos;

        let mut fpos = start;
        let mut end = start;
        for _ in 0..self.lines_per_page {
            let (new_pos, _start, fend) = self.file.next_newline(fpos);
            end = fend;
            fpos = new_pos;
            if fpos == self.file.max_offset() {
                break;
            }
        }

        let block = Block { start, end };
        self.blocks.insert(index, block);
        block
    }

    /// Extends the window backward by one page (toward the beginning of
    /// the file). Returns `false` if the current page already reaches
    /// byte 0.
    pub fn move_prev(&mut self) -> bool {
        let current = self.make_extents(self.current_index);
        if current.start == 0 {
            return false;
        }
        self.current_index += 1;
        self.make_extents(self.current_index);
        true
    }

    /// Retreats one page toward the end of the file. Returns `false` if
    /// already at page 0.
    pub fn move_next(&mut self) -> bool {
        if self.current_index == 0 {
            return false;
        }
        self.current_index -= 1;
        true
    }

    /// The lines of the current page, in file order, newline discarded.
    pub fn get(&mut self) -> Result<Vec<String>, MemFileError> {
        let block = self.make_extents(self.current_index);
        if block.size() == 0 {
            return Ok(Vec::new());
        }
        // Walk prev_newline boundaries backward from the block's end,
        // the same scanning primitive read_prev_line uses, stopping once
        // we've covered [block.start, block.end).
        let mut lines = Vec::new();
        let mut pos = block.end;
        loop {
            let (new_pos, start, end) = self.file.prev_newline(pos);
            if end < block.start || start < block.start {
                break;
            }
            lines.push(self.file.slice_text(start, end));
            if new_pos <= block.start {
                break;
            }
            pos = new_pos;
        }
        lines.reverse();
        Ok(lines)
    }

    /// `(current_page_number_1_based, total_pages)`.
    pub fn position(&self) -> (usize, usize) {
        let total_pages = if self.lines_per_page == 0 {
            1
        } else {
            self.total_lines / self.lines_per_page + 1
        };
        (self.current_index + 1, total_pages)
    }

    /// Percentage of the file covered by pages `0..=current_index`,
    /// capped at 100.
    pub fn pct(&self) -> f64 {
        if self.total_lines == 0 {
            return 100.0;
        }
        let covered = (self.current_index + 1) * self.lines_per_page;
        let pct = (covered as f64 / self.total_lines as f64) * 100.0;
        pct.min(100.0)
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
    fn single_page_covers_whole_file() {
        let (_tmp, mf) = fixture("one\ntwo\nthree\n");
        let mut window = Window::make_window(mf, 10);
        assert_eq!(window.get().unwrap(), vec!["one", "two", "three"]);
        assert_eq!(window.position(), (1, 1));
    }

    #[test]
    fn pages_split_across_move_prev() {
        let (_tmp, mf) = fixture("one\ntwo\nthree\nfour\n");
        let mut window = Window::make_window(mf, 2);
        assert_eq!(window.get().unwrap(), vec!["three", "four"]);
        assert!(window.move_prev());
        assert_eq!(window.get().unwrap(), vec!["one", "two"]);
        assert!(!window.move_prev());
    }

    #[test]
    fn move_next_retreats_toward_the_end() {
        let (_tmp, mf) = fixture("one\ntwo\nthree\nfour\n");
        let mut window = Window::make_window(mf, 2);
        assert!(window.move_prev());
        assert!(window.move_next());
        assert!(!window.move_next());
        assert_eq!(window.get().unwrap(), vec!["three", "four"]);
    }

    #[test]
    fn pct_never_exceeds_100() {
        let (_tmp, mf) = fixture("one\ntwo\nthree\n");
        let window = Window::make_window(mf, 10);
        assert_eq!(window.pct(), 100.0);
    }

    #[test]
    fn empty_file_yields_no_lines() {
        let (_tmp, mf) = fixture("");
        let mut window = Window::make_window(mf, 5);
        assert_eq!(window.get().unwrap(), Vec::<String>::new());
    }
}
