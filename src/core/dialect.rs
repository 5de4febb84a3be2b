/// Delimiter and quoting inference
///
/// Guesses a dialect from a small decoded sample by checking how consistently
/// each candidate delimiter splits the sampled records. When nothing stands
/// out, callers fall back to [`Dialect::default`] (comma, double quote).

use std::io::{self, Read};

use log::debug;

/// Delimiters tried during sniffing, in tie-break order
pub const DELIMITER_CANDIDATES: [u8; 5] = [b',', b'\t', b';', b'|', b':'];

/// Quote characters tried during sniffing, in tie-break order
pub const QUOTE_CANDIDATES: [u8; 2] = [b'"', b'\''];

/// Share of sampled records that must agree on the field count
const MIN_CONSISTENCY: f64 = 0.9;

/// Upper bound on records inspected from the sample
const MAX_SAMPLE_RECORDS: usize = 64;

/// Field delimiter plus quoting convention
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    pub delimiter: u8,
    pub quote: u8,
    /// Whether a doubled quote inside a quoted field stands for one quote
    pub double_quote: bool,
}

impl Default for Dialect {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            double_quote: true,
        }
    }
}

impl Dialect {
    /// Build a `csv` reader configured for this dialect
    ///
    /// Headers are not special-cased and ragged rows are accepted.
    pub fn reader_builder(&self) -> csv::ReaderBuilder {
        let mut builder = csv::ReaderBuilder::new();
        builder
            .delimiter(self.delimiter)
            .quote(self.quote)
            .double_quote(self.double_quote)
            .has_headers(false)
            .flexible(true);
        builder
    }

    /// Try to infer the dialect of `sample`
    ///
    /// # Arguments
    ///
    /// * `sample` - Leading text of the file
    /// * `truncated` - Whether more data follows the sample, in which case the
    ///   last (possibly cut) record is ignored
    ///
    /// # Returns
    ///
    /// `None` when the sample does not point clearly at any delimiter
    pub fn sniff(sample: &str, truncated: bool) -> Option<Dialect> {
        let quote = guess_quote(sample);

        let mut best: Option<(f64, usize, u8)> = None;
        for &delimiter in DELIMITER_CANDIDATES.iter() {
            let counts = field_counts(sample, delimiter, quote, truncated);
            let Some((consistency, modal)) = score(&counts) else {
                continue;
            };
            if consistency < MIN_CONSISTENCY {
                continue;
            }

            // Earlier candidates win ties
            let better = match best {
                None => true,
                Some((best_consistency, best_modal, _)) => {
                    consistency > best_consistency
                        || (consistency == best_consistency && modal > best_modal)
                }
            };
            if better {
                best = Some((consistency, modal, delimiter));
            }
        }

        let (consistency, modal, delimiter) = best?;
        debug!(
            "Sniffed delimiter {:?} quote {:?} ({} fields, consistency {:.2})",
            delimiter as char, quote as char, modal, consistency
        );

        Some(Dialect {
            delimiter,
            quote,
            double_quote: true,
        })
    }
}

/// Where the tracker is within the current field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldState {
    Start,
    Unquoted,
    Quoted,
    QuoteInQuoted,
}

/// Read adapter that counts the empty lines a `csv` reader skips
///
/// Bytes pass through unchanged. Each empty line counts as an empty record,
/// while line breaks inside quoted fields and the `\n` of a `\r\n` pair do not.
pub struct BlankLineTracker<R> {
    inner: R,
    delimiter: u8,
    quote: u8,
    double_quote: bool,
    state: FieldState,
    line_has_content: bool,
    after_cr: bool,
    lines_ended: u64,
    blank_lines: u64,
    leading_blank: bool,
}

impl<R: Read> BlankLineTracker<R> {
    pub fn new(inner: R, dialect: &Dialect) -> Self {
        Self {
            inner,
            delimiter: dialect.delimiter,
            quote: dialect.quote,
            double_quote: dialect.double_quote,
            state: FieldState::Start,
            line_has_content: false,
            after_cr: false,
            lines_ended: 0,
            blank_lines: 0,
            leading_blank: false,
        }
    }

    /// Empty lines seen so far
    pub fn blank_lines(&self) -> u64 {
        self.blank_lines
    }

    /// Whether the very first line was empty
    pub fn leading_blank(&self) -> bool {
        self.leading_blank
    }

    fn scan(&mut self, b: u8) {
        match self.state {
            FieldState::Quoted => {
                if b == self.quote {
                    self.state = FieldState::QuoteInQuoted;
                }
                return;
            }
            FieldState::QuoteInQuoted => {
                if b == self.quote && self.double_quote {
                    self.state = FieldState::Quoted;
                    return;
                }
                self.state = FieldState::Unquoted;
            }
            FieldState::Start | FieldState::Unquoted => {}
        }

        if b == b'\n' || b == b'\r' {
            if b == b'\n' && self.after_cr {
                self.after_cr = false;
                return;
            }
            self.after_cr = b == b'\r';
            if !self.line_has_content {
                if self.lines_ended == 0 {
                    self.leading_blank = true;
                }
                self.blank_lines += 1;
            }
            self.lines_ended += 1;
            self.line_has_content = false;
            self.state = FieldState::Start;
            return;
        }

        self.after_cr = false;
        self.line_has_content = true;
        self.state = if b == self.delimiter {
            FieldState::Start
        } else if b == self.quote && self.state == FieldState::Start {
            FieldState::Quoted
        } else {
            FieldState::Unquoted
        };
    }
}

impl<R: Read> Read for BlankLineTracker<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        for &b in &buf[..n] {
            self.scan(b);
        }
        Ok(n)
    }
}

/// Pick the quote character that most often opens a field
fn guess_quote(sample: &str) -> u8 {
    let bytes = sample.as_bytes();
    let mut best = (0usize, QUOTE_CANDIDATES[0]);

    for &quote in QUOTE_CANDIDATES.iter() {
        let opening = bytes
            .iter()
            .enumerate()
            .filter(|&(i, &b)| {
                b == quote
                    && (i == 0
                        || matches!(bytes[i - 1], b'\n' | b'\r')
                        || DELIMITER_CANDIDATES.contains(&bytes[i - 1]))
            })
            .count();
        if opening > best.0 {
            best = (opening, quote);
        }
    }

    best.1
}

/// Split the sample into records and count fields per record for one delimiter
///
/// Quotes are honoured so delimiters and newlines inside quoted fields do not split.
fn field_counts(sample: &str, delimiter: u8, quote: u8, truncated: bool) -> Vec<usize> {
    let mut counts = Vec::new();
    let mut in_quotes = false;
    let mut delimiters = 0usize;
    let mut record_has_content = false;

    for &b in sample.as_bytes() {
        if b == quote {
            // A doubled quote toggles twice and leaves the state unchanged
            in_quotes = !in_quotes;
            record_has_content = true;
            continue;
        }
        if in_quotes {
            continue;
        }
        match b {
            b'\n' | b'\r' => {
                if record_has_content {
                    counts.push(delimiters + 1);
                    if counts.len() >= MAX_SAMPLE_RECORDS {
                        return counts;
                    }
                }
                delimiters = 0;
                record_has_content = false;
            }
            _ if b == delimiter => {
                delimiters += 1;
                record_has_content = true;
            }
            _ => record_has_content = true,
        }
    }

    if record_has_content && !truncated {
        counts.push(delimiters + 1);
    }

    counts
}

/// Share of records with the most common field count, and that count
///
/// Returns `None` when the delimiter never splits anything.
fn score(counts: &[usize]) -> Option<(f64, usize)> {
    if counts.is_empty() {
        return None;
    }

    let mut tally: Vec<(usize, usize)> = Vec::new();
    for &count in counts {
        match tally.iter_mut().find(|(c, _)| *c == count) {
            Some((_, n)) => *n += 1,
            None => tally.push((count, 1)),
        }
    }

    let (modal, occurrences) = tally
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)))?;

    if modal < 2 {
        return None;
    }

    Some((occurrences as f64 / counts.len() as f64, modal))
}
