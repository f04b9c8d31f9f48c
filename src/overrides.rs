//! Local corrections for product attributes.
//!
//! The override file is a delimited text file mapping an ASIN to a Design
//! and/or Size. A header row naming an `ASIN` column is honored when present:
//! ```text
//! ASIN,Design,Size
//! B0DNKXYG1X,Red,XL
//! ```
//! Without one, columns are read positionally as `ASIN[,Design[,Size]]` and
//! anything past the third column is ignored.

use std::collections::HashMap;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, info, warn};

use crate::config::AttributeTokens;
use crate::error::OverrideError;
use crate::record::Asin;

pub const DEFAULT_OVERRIDE_PATH: &str = "asin_overrides.csv";

/// Corrected attribute values for one ASIN.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OverrideEntry {
    pub design: Option<String>,
    pub size: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct OverrideTable {
    entries: HashMap<Asin, OverrideEntry>,
}

/// Column positions of each field within a row.
#[derive(Debug, Clone, Copy)]
struct ColumnLayout {
    asin: usize,
    design: Option<usize>,
    size: Option<usize>,
}

impl ColumnLayout {
    const POSITIONAL: Self = Self {
        asin: 0,
        design: Some(1),
        size: Some(2),
    };

    /// Recognises a header row by an `ASIN` cell.
    ///
    /// Design and Size columns are found by exact name first, then by the
    /// default attribute tokens (`Kolor`, `Rozmiar`, ...). When neither is
    /// found, the first two other columns are taken as Design and Size.
    fn from_header(row: &StringRecord) -> Option<Self> {
        let find = |name: &str| row.iter().position(|cell| cell.eq_ignore_ascii_case(name));
        let asin = find("asin")?;

        let tokens = AttributeTokens::default();
        let find_token = |matches: &dyn Fn(&str) -> bool| {
            row.iter()
                .enumerate()
                .find(|(i, cell)| *i != asin && matches(&cell.to_lowercase()))
                .map(|(i, _)| i)
        };
        let design = find("design").or_else(|| find_token(&|c: &str| tokens.is_design(c)));
        let size = find("size").or_else(|| find_token(&|c: &str| tokens.is_size(c)));

        if design.is_none() && size.is_none() {
            let mut others = (0..row.len()).filter(|i| *i != asin);
            return Some(Self {
                asin,
                design: others.next(),
                size: others.next(),
            });
        }
        Some(Self { asin, design, size })
    }

    fn extract(&self, row: &StringRecord) -> Option<(Asin, OverrideEntry)> {
        let cell = |idx: Option<usize>| {
            idx.and_then(|i| row.get(i))
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let asin = Asin::new(row.get(self.asin)?);
        if asin.is_empty() {
            return None;
        }

        Some((
            asin,
            OverrideEntry {
                design: cell(self.design),
                size: cell(self.size),
            },
        ))
    }
}

impl OverrideTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Loads the table at `path`, never failing.
    ///
    /// A missing file silently yields an empty table. A file that exists but
    /// cannot be parsed logs a warning and also yields an empty table.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(Some(table)) => {
                info!(path = %path.display(), entries = table.len(), "Loaded override file");
                table
            }
            Ok(None) => {
                debug!(path = %path.display(), "No override file, continuing without overrides");
                Self::empty()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not load override file, ignoring it");
                Self::empty()
            }
        }
    }

    /// Like [`OverrideTable::load`] but reports what happened.
    ///
    /// Returns `Ok(None)` when the file does not exist.
    pub fn try_load(path: &Path) -> Result<Option<Self>, OverrideError> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read(path)?;
        Self::parse(&content).map(Some)
    }

    /// Parses override rows from raw file content.
    pub fn parse(content: &[u8]) -> Result<Self, OverrideError> {
        let content = content.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(content);

        let mut rdr = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .delimiter(sniff_delimiter(content))
            .from_reader(content);

        let mut layout = ColumnLayout::POSITIONAL;
        let mut entries = HashMap::new();

        for (idx, result) in rdr.records().enumerate() {
            let row = result?;
            if idx == 0 {
                if let Some(header) = ColumnLayout::from_header(&row) {
                    layout = header;
                    continue;
                }
            }
            if let Some((asin, entry)) = layout.extract(&row) {
                entries.insert(asin, entry);
            }
        }

        Ok(Self { entries })
    }

    pub fn get(&self, asin: &Asin) -> Option<&OverrideEntry> {
        self.entries.get(asin)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over all entries, ordered by ASIN.
    pub fn iter(&self) -> impl Iterator<Item = (&Asin, &OverrideEntry)> {
        let mut entries: Vec<_> = self.entries.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries.into_iter()
    }
}

/// Picks the most frequent of `,` `;` and tab on the first non-blank line.
fn sniff_delimiter(content: &[u8]) -> u8 {
    let first_line = content
        .split(|b| *b == b'\n')
        .find(|line| line.iter().any(|b| !b.is_ascii_whitespace()))
        .unwrap_or(&[]);

    [b',', b';', b'\t']
        .into_iter()
        .map(|d| (d, first_line.iter().filter(|b| **b == d).count()))
        .filter(|(_, n)| *n > 0)
        .max_by_key(|(_, n)| *n)
        .map(|(d, _)| d)
        .unwrap_or(b',')
}
