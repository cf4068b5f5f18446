//! A1-style cell address parsing

use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};

/// A zero-based cell position (e.g., "A1" is row 0, column 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellAddress {
    /// Row index (0-based internally, 1-based in display)
    pub row: u32,
    /// Column index (0-based, A=0, B=1, ..., XFD=16383)
    pub col: u32,
}

/// The 1-based column and row numbers written in an A1 reference.
///
/// `$` markers are accepted and dropped; `"$C$7"` gives `col = 3, row = 7`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct A1Numbers {
    pub col: u32,
    pub row: u32,
}

impl CellAddress {
    /// Create a new cell address
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Parse a cell address from A1-style notation
    ///
    /// # Examples
    /// ```
    /// use sheetvault_core::CellAddress;
    ///
    /// let addr = CellAddress::parse("A1").unwrap();
    /// assert_eq!((addr.row, addr.col), (0, 0));
    ///
    /// let addr = CellAddress::parse("$B$2").unwrap();
    /// assert_eq!((addr.row, addr.col), (1, 1));
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let numbers = Self::parse_numbers(s)?;
        Ok(Self {
            row: numbers.row - 1,
            col: numbers.col - 1,
        })
    }

    /// Parse an A1 reference into its 1-based column and row numbers, exactly
    /// as written in the document.
    pub fn parse_numbers(s: &str) -> Result<A1Numbers> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::InvalidAddress("empty address".into()));
        }

        let bytes = s.as_bytes();
        let mut pos = 0;

        if bytes.get(pos) == Some(&b'$') {
            pos += 1;
        }

        let col_start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_alphabetic() {
            pos += 1;
        }

        if pos == col_start {
            return Err(Error::InvalidAddress(format!(
                "no column letters in '{}'",
                s
            )));
        }

        let col = Self::letters_to_number(&s[col_start..pos])?;

        if bytes.get(pos) == Some(&b'$') {
            pos += 1;
        }

        let row_str = &s[pos..];
        if row_str.is_empty() {
            return Err(Error::InvalidAddress(format!("no row number in '{}'", s)));
        }

        let row: u32 = row_str
            .parse()
            .map_err(|_| Error::InvalidAddress(format!("invalid row number in '{}'", s)))?;

        if row == 0 {
            return Err(Error::InvalidAddress(format!(
                "row number must be >= 1 in '{}'",
                s
            )));
        }

        if row > MAX_ROWS {
            return Err(Error::RowOutOfBounds(row - 1, MAX_ROWS - 1));
        }

        Ok(A1Numbers { col, row })
    }

    /// Parse an `A1:B10` range into its two corners' 1-based numbers.
    ///
    /// A single reference (`"C3"`) yields the same corner twice.
    pub fn parse_range_numbers(s: &str) -> Result<(A1Numbers, A1Numbers)> {
        let s = s.trim();
        match s.split_once(':') {
            Some((start, end)) => Ok((Self::parse_numbers(start)?, Self::parse_numbers(end)?)),
            None => {
                let single = Self::parse_numbers(s)
                    .map_err(|e| Error::InvalidRange(format!("'{}': {}", s, e)))?;
                Ok((single, single))
            }
        }
    }

    /// Convert column letters to a 1-based column number (A = 1, Z = 26, AA = 27)
    pub fn letters_to_number(letters: &str) -> Result<u32> {
        if letters.is_empty() {
            return Err(Error::InvalidAddress("empty column letters".into()));
        }

        let mut col: u32 = 0;
        for c in letters.chars() {
            if !c.is_ascii_alphabetic() {
                return Err(Error::InvalidAddress(format!(
                    "invalid column letter '{}'",
                    c
                )));
            }
            col = col
                .saturating_mul(26)
                .saturating_add(c.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
        }

        if col > MAX_COLS {
            return Err(Error::ColumnOutOfBounds(col - 1, MAX_COLS - 1));
        }

        Ok(col)
    }
}
