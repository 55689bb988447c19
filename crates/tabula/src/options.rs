//! Option types for the extraction entry points.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

/// Which extraction path to take for a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ExtractionMethod {
    /// Pick spreadsheet or basic with the tabular heuristic.
    #[default]
    Guess,
    /// Ruled-cell extraction.
    Spreadsheet,
    /// Whitespace-column extraction.
    Basic,
}

/// Error returned when an option string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionParseError {
    pub option: &'static str,
    pub value: String,
}

impl fmt::Display for OptionParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: {:?}", self.option, self.value)
    }
}

impl std::error::Error for OptionParseError {}

impl FromStr for ExtractionMethod {
    type Err = OptionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "guess" => Ok(ExtractionMethod::Guess),
            "spreadsheet" | "lattice" => Ok(ExtractionMethod::Spreadsheet),
            "original" | "basic" | "stream" => Ok(ExtractionMethod::Basic),
            _ => Err(OptionParseError {
                option: "extraction method",
                value: s.to_string(),
            }),
        }
    }
}

/// Options for [`crate::extract_table`] and [`crate::Page::extract`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ExtractionOptions {
    /// Password for encrypted documents. Default: empty.
    pub password: String,
    /// Use detected vertical rulings as column bounds when the region looks
    /// ruled and no explicit rulings are given. Default: `true`.
    pub detect_ruling_lines: bool,
    /// Explicit column x-positions; overrides detection when non-empty.
    pub vertical_rulings: Vec<f64>,
    pub extraction_method: ExtractionMethod,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            password: String::new(),
            detect_ruling_lines: true,
            vertical_rulings: Vec::new(),
            extraction_method: ExtractionMethod::Guess,
        }
    }
}

/// Options for basic extraction on a page.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TableOptions {
    /// Column x-positions; empty means columns come from the text layout.
    pub vertical_rulings: Vec<f64>,
}

impl TableOptions {
    pub fn with_vertical_rulings(vertical_rulings: impl Into<Vec<f64>>) -> Self {
        Self {
            vertical_rulings: vertical_rulings.into(),
        }
    }
}

/// One-indexed page selection.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PageSelector {
    Single(usize),
    List(Vec<usize>),
    All,
}

impl Default for PageSelector {
    fn default() -> Self {
        PageSelector::Single(1)
    }
}

impl PageSelector {
    /// The selected page numbers for a document with `page_count` pages.
    ///
    /// Numbers outside the document are kept; opening them reports
    /// `PageOutOfRange`.
    pub fn page_numbers(&self, page_count: usize) -> Vec<usize> {
        match self {
            PageSelector::Single(n) => vec![*n],
            PageSelector::List(pages) => pages.clone(),
            PageSelector::All => (1..=page_count).collect(),
        }
    }
}

impl From<usize> for PageSelector {
    fn from(page: usize) -> Self {
        PageSelector::Single(page)
    }
}

impl From<Vec<usize>> for PageSelector {
    fn from(pages: Vec<usize>) -> Self {
        PageSelector::List(pages)
    }
}

/// One comma-separated part of a selector: `"3"` or `"2-4"`.
static PAGE_PART: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d+)\s*(?:-\s*(\d+)\s*)?$").expect("valid page part regex")
});

/// Largest page number a selector accepts, the PDF limit on object numbers.
/// It also bounds how many pages one selector can expand to.
const MAX_PAGE_NUMBER: usize = 8_388_607;

impl FromStr for PageSelector {
    type Err = OptionParseError;

    /// Parses `"all"`, `"3"`, `"1,3,5"`, `"2-4"` and mixes like `"1,4-6"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || OptionParseError {
            option: "page selector",
            value: s.to_string(),
        };
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(PageSelector::All);
        }

        let mut pages = Vec::new();
        for part in s.split(',') {
            let caps = PAGE_PART.captures(part).ok_or_else(invalid)?;
            let first: usize = caps[1].parse().map_err(|_| invalid())?;
            let last: usize = match caps.get(2) {
                Some(m) => m.as_str().parse().map_err(|_| invalid())?,
                None => first,
            };
            if first == 0 || last < first || last > MAX_PAGE_NUMBER {
                return Err(invalid());
            }
            if pages.len() + (last - first + 1) > MAX_PAGE_NUMBER {
                return Err(invalid());
            }
            pages.extend(first..=last);
        }

        Ok(match pages.as_slice() {
            [single] => PageSelector::Single(*single),
            _ => PageSelector::List(pages),
        })
    }
}
