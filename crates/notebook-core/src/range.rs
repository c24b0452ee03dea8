use serde::{Deserialize, Serialize};
use std::fmt;

/// Zero-based grid coordinate. Formulas address cells as 1-based `A1`
/// strings; the translation happens in [`CellCoord::from_a1`] and the parser.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct CellCoord {
    pub row: u32,
    pub col: u32,
}

impl CellCoord {
    pub const fn new(row: u32, col: u32) -> Self {
        CellCoord { row, col }
    }

    /// Create from A1 notation (e.g., "A1" -> (0, 0), "$B$2" -> (1, 1))
    pub fn from_a1(notation: &str) -> Option<Self> {
        let notation: String = notation
            .trim()
            .chars()
            .filter(|c| *c != '$')
            .collect();
        let split = notation.find(|c: char| c.is_ascii_digit())?;
        let (letters, digits) = notation.split_at(split);

        if letters.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }

        let col = col_from_label(letters)?;
        let row: u32 = digits.parse().ok()?;

        // Rows are 1-indexed in A1 notation
        let row = row.checked_sub(1)?;
        Some(CellCoord { row, col })
    }

    /// Convert to A1 notation (e.g., (0, 0) -> "A1")
    pub fn to_a1(&self) -> String {
        format!("{}{}", col_to_label(self.col), self.row + 1)
    }

    /// Check if this coord is within a `rows` x `cols` grid
    pub fn is_within(&self, rows: u32, cols: u32) -> bool {
        self.row < rows && self.col < cols
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1())
    }
}

/// Convert column index (0-indexed) to label (A, B, ..., Z, AA, AB, ...)
pub fn col_to_label(col: u32) -> String {
    let mut label = String::new();
    let mut n = col + 1;

    while n > 0 {
        n -= 1;
        label.insert(0, char::from(b'A' + (n % 26) as u8));
        n /= 26;
    }

    label
}

/// Convert column label (A, B, ..., Z, AA, AB, ...) to index (0-indexed)
pub fn col_from_label(label: &str) -> Option<u32> {
    let mut col: u32 = 0;

    for c in label.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        col = col
            .checked_mul(26)?
            .checked_add(c.to_ascii_uppercase() as u32 - 'A' as u32 + 1)?;
    }

    col.checked_sub(1)
}

/// An inclusive rectangular block of cells (e.g., A1:B10), normalized so
/// `start` is top-left and `end` is bottom-right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRange {
    pub start: CellCoord,
    pub end: CellCoord,
}

impl CellRange {
    pub fn new(start: CellCoord, end: CellCoord) -> Self {
        CellRange {
            start: CellCoord::new(start.row.min(end.row), start.col.min(end.col)),
            end: CellCoord::new(start.row.max(end.row), start.col.max(end.col)),
        }
    }

    pub fn single(coord: CellCoord) -> Self {
        CellRange::new(coord, coord)
    }

    /// Create from A1:B1 notation
    pub fn from_a1(notation: &str) -> Option<Self> {
        match notation.split_once(':') {
            None => CellCoord::from_a1(notation).map(CellRange::single),
            Some((a, b)) => Some(CellRange::new(
                CellCoord::from_a1(a)?,
                CellCoord::from_a1(b)?,
            )),
        }
    }

    /// `A1:B2`, or just `A1` for a single cell
    pub fn to_a1(&self) -> String {
        if self.start == self.end {
            return self.start.to_a1();
        }
        format!("{}:{}", self.start.to_a1(), self.end.to_a1())
    }

    pub fn contains(&self, coord: CellCoord) -> bool {
        (self.start.row..=self.end.row).contains(&coord.row)
            && (self.start.col..=self.end.col).contains(&coord.col)
    }

    pub fn row_count(&self) -> u32 {
        self.end.row - self.start.row + 1
    }

    pub fn col_count(&self) -> u32 {
        self.end.col - self.start.col + 1
    }

    /// Number of cells, widened to `u64`
    pub fn cell_count(&self) -> u64 {
        u64::from(self.row_count()) * u64::from(self.col_count())
    }

    /// Coordinates in row-major order
    pub fn iter(&self) -> CellRangeIter {
        CellRangeIter {
            range: *self,
            next: 0,
            len: self.cell_count(),
        }
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_a1())
    }
}

impl IntoIterator for CellRange {
    type Item = CellCoord;
    type IntoIter = CellRangeIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Row-major iterator over a [`CellRange`]
#[derive(Debug, Clone)]
pub struct CellRangeIter {
    range: CellRange,
    next: u64,
    len: u64,
}

impl Iterator for CellRangeIter {
    type Item = CellCoord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.len {
            return None;
        }
        let width = u64::from(self.range.col_count());
        let row = self.range.start.row + (self.next / width) as u32;
        let col = self.range.start.col + (self.next % width) as u32;
        self.next += 1;
        Some(CellCoord::new(row, col))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.len - self.next).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}
