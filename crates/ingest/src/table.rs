use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("unterminated quoted field")]
    UnterminatedQuote,
    #[error("file has no header row")]
    NoHeader,
    #[error("duplicate column name: {0}")]
    DuplicateColumn(String),
    #[error("no data rows")]
    NoDataRows,
}

/// A parsed upload: one header row plus the data rows, all raw strings.
///
/// Every row holds exactly one cell per header column (short rows are padded
/// with empty strings, long rows truncated), so addressing by column name is
/// total once the name exists in the header. Column order is preserved for
/// enumeration but carries no meaning downstream.
#[derive(Debug, Clone)]
pub struct SourceTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl SourceTable {
    /// Parse raw file bytes as delimited text. The first non-empty line is
    /// the header; fully empty lines are skipped; cell whitespace is
    /// trimmed. Pure transform, no side effects.
    pub fn parse(bytes: &[u8]) -> Result<SourceTable, ParseError> {
        // The csv reader recovers from unbalanced quotes by consuming to end
        // of input, which would silently swallow the rest of the file. Reject
        // such files up front instead.
        if has_unterminated_quote(bytes) {
            return Err(ParseError::UnterminatedQuote);
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(bytes);

        let mut headers: Option<Vec<String>> = None;
        let mut rows = Vec::new();

        for result in reader.records() {
            let record = result?;
            if record.iter().all(|f| f.is_empty()) {
                continue;
            }
            let fields: Vec<String> = record.iter().map(|f| f.to_string()).collect();

            match &headers {
                None => {
                    for (i, name) in fields.iter().enumerate() {
                        if fields[..i].contains(name) {
                            return Err(ParseError::DuplicateColumn(name.clone()));
                        }
                    }
                    headers = Some(fields);
                }
                Some(h) => {
                    let mut row = fields;
                    row.resize(h.len(), String::new());
                    rows.push(row);
                }
            }
        }

        let headers = headers.ok_or(ParseError::NoHeader)?;
        if rows.is_empty() {
            return Err(ParseError::NoDataRows);
        }

        Ok(SourceTable { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Cell value at `(row, column name)`. `None` only when the row index or
    /// the column name does not exist; a present-but-blank cell is `Some("")`.
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.headers.iter().position(|h| h == column)?;
        self.rows.get(row).map(|r| r[col].as_str())
    }
}

/// RFC-4180 quote scan: a quote opens a quoted field only at field start,
/// `""` inside quotes is an escaped quote. Returns true when a quoted field
/// is still open at end of input.
fn has_unterminated_quote(bytes: &[u8]) -> bool {
    let mut in_quotes = false;
    let mut field_start = true;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if in_quotes {
            if b == b'"' {
                if bytes.get(i + 1) == Some(&b'"') {
                    i += 1;
                } else {
                    in_quotes = false;
                    field_start = false;
                }
            }
        } else {
            match b {
                b'"' if field_start => in_quotes = true,
                b',' | b'\r' | b'\n' => field_start = true,
                _ => field_start = false,
            }
        }
        i += 1;
    }
    in_quotes
}
