use crate::error::{PropertyIngestError, Result};
use crate::utils::clean_cell;
use csv::{ReaderBuilder, Trim};
use log::debug;
use serde::{Deserialize, Serialize};

/// Delimiters considered when the caller does not declare one, in tie-break order.
pub const CANDIDATE_DELIMITERS: [u8; 4] = [b',', b'\t', b'|', b';'];

/// How many leading lines are sampled when guessing the delimiter.
const SNIFF_LINES: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestOptions {
    /// Field delimiter; sniffed from the content when `None`.
    pub delimiter: Option<u8>,
    /// Whether the first record holds the field names.
    pub has_headers: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            has_headers: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub cells: Vec<String>,
}

impl RawRow {
    pub fn new(cells: Vec<String>) -> Self {
        Self { cells }
    }

    /// The trimmed, non-empty cell at `index`.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.cells.get(index).and_then(|c| clean_cell(c))
    }

    fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| clean_cell(c).is_none())
    }
}

/// A parsed delimited table. Rows that could not be decoded are kept in place
/// as `Err(reason)` so row numbering stays aligned with the source.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<std::result::Result<RawRow, String>>,
    pub delimiter: u8,
}

impl RawTable {
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            headers,
            rows: rows.into_iter().map(|cells| Ok(RawRow::new(cells))).collect(),
            delimiter: b',',
        }
    }
}

/// Guesses the delimiter from the first few lines, ignoring quoted sections.
/// Falls back to a comma when no candidate appears.
pub fn sniff_delimiter(input: &[u8]) -> u8 {
    let sample: Vec<&[u8]> = input
        .split(|&b| b == b'\n')
        .filter(|line| !line.iter().all(u8::is_ascii_whitespace))
        .take(SNIFF_LINES)
        .collect();

    let mut best = b',';
    let mut best_score = 0usize;

    for &candidate in &CANDIDATE_DELIMITERS {
        let counts: Vec<usize> = sample
            .iter()
            .map(|line| count_unquoted(line, candidate))
            .collect();

        let header_count = counts.first().copied().unwrap_or(0);
        if header_count == 0 {
            continue;
        }

        // Lines agreeing with the header count weigh in, so a stray comma in
        // free text does not outvote a consistent tab layout.
        let consistent = counts.iter().filter(|&&c| c == header_count).count();
        let score = header_count * consistent;

        if score > best_score {
            best = candidate;
            best_score = score;
        }
    }

    best
}

fn count_unquoted(line: &[u8], delimiter: u8) -> usize {
    let mut in_quotes = false;
    let mut count = 0;
    for &byte in line {
        if byte == b'"' {
            in_quotes = !in_quotes;
        } else if byte == delimiter && !in_quotes {
            count += 1;
        }
    }
    count
}

/// Reads raw delimited bytes into headers plus rows.
///
/// Batch-level problems (empty input, no header row, no data rows) are
/// returned as errors. Individual undecodable records become `Err` rows.
pub fn read_table(input: &[u8], options: &IngestOptions) -> Result<RawTable> {
    if input.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(PropertyIngestError::EmptyInput);
    }

    let delimiter = options.delimiter.unwrap_or_else(|| sniff_delimiter(input));
    debug!("Reading delimited input with delimiter {:?}", delimiter as char);

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(input);

    let mut records = reader.records();
    let mut headers: Vec<String> = Vec::new();
    let mut rows = Vec::new();

    if options.has_headers {
        let first = records.next().ok_or(PropertyIngestError::EmptyInput)??;
        headers = first
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();

        if headers.iter().all(|h| clean_cell(h).is_none()) {
            return Err(PropertyIngestError::MissingHeaders);
        }
    }

    for record in records {
        match record {
            Ok(record) => {
                let row = RawRow::new(record.iter().map(|c| c.to_string()).collect());
                if row.is_blank() {
                    continue;
                }
                if headers.is_empty() {
                    headers = (1..=row.cells.len())
                        .map(|n| format!("column_{}", n))
                        .collect();
                }
                rows.push(Ok(row));
            }
            Err(e) => rows.push(Err(e.to_string())),
        }
    }

    if headers.is_empty() {
        return Err(PropertyIngestError::EmptyInput);
    }
    if rows.is_empty() {
        return Err(PropertyIngestError::NoDataRows);
    }

    Ok(RawTable {
        headers,
        rows,
        delimiter,
    })
}
