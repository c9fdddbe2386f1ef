//! Streaming record extraction from PubMed XML archives.
//!
//! Archives are far too large to hold as a parsed tree, so records are
//! pulled one `<PubmedArticle>` at a time from the (decompressed) byte
//! stream; per-article state is dropped as soon as the record is yielded.
//!
//! Extraction per article:
//!   - first `<PMID>` in the citation (later PMIDs belong to references
//!     and comment/correction links)
//!   - first `<ArticleTitle>`; absent title yields an empty string
//!   - `<AbstractText>` segments in document order, a `Label` attribute is
//!     rendered as a bold prefix, every non-empty segment ends with `<br>`
//!   - creation date from `<DateCreated>` only (`<PubDate>` and
//!     `<DateCompleted>` carry Year/Month/Day too and must not match)
//!
//! A missing PMID or an absent/invalid date is an extraction error scoped
//! to that article; the reader stays consistent, so the caller may either
//! abort the archive or skip to the next record.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use chrono::NaiveDate;
use flate2::read::GzDecoder;
use quick_xml::events::Event;
use quick_xml::Reader;

use pubtrend_common::{PubtrendError, Result};

use crate::models::PubmedPaper;

/// Per-article accumulator, reset every `<PubmedArticle>`.
#[derive(Default)]
struct ArticleState {
    pmid: Option<String>,
    title: Option<String>,
    abstract_text: String,
    seg_label: Option<String>,
    seg_text: String,
    year: String,
    month: String,
    day: String,
}

pub struct RecordReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    /// Archive label used in error messages.
    archive: String,
    /// 1-based position of the article currently being parsed.
    article_no: usize,

    state: Option<ArticleState>,
    in_pmid: bool,
    in_title: bool,
    in_abstract_seg: bool,
    in_date_created: bool,
    in_year: bool,
    in_month: bool,
    in_day: bool,
}

impl RecordReader<BufReader<GzDecoder<File>>> {
    /// Open a gzip-compressed archive for streaming extraction.
    pub fn from_gzip_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let decoder = BufReader::new(GzDecoder::new(file));
        let label = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::from_reader(decoder, label))
    }
}

impl<R: BufRead> RecordReader<R> {
    /// Stream records from an already-decompressed XML byte stream.
    pub fn from_reader(source: R, archive: impl Into<String>) -> Self {
        let mut reader = Reader::from_reader(source);
        reader.config_mut().trim_text(true);
        Self {
            reader,
            buf: Vec::new(),
            archive: archive.into(),
            article_no: 0,
            state: None,
            in_pmid: false,
            in_title: false,
            in_abstract_seg: false,
            in_date_created: false,
            in_year: false,
            in_month: false,
            in_day: false,
        }
    }

    fn extraction_error(&self, reason: impl Into<String>) -> PubtrendError {
        PubtrendError::Extraction {
            archive: self.archive.clone(),
            article: self.article_no,
            reason: reason.into(),
        }
    }

    /// Advance to the next complete record, or `None` at end of stream.
    ///
    /// After an `Extraction` error the reader is positioned past the
    /// offending article, so calling again continues with the next one.
    pub fn next_record(&mut self) -> Result<Option<PubmedPaper>> {
        loop {
            let event = self
                .reader
                .read_event_into(&mut self.buf)
                .map_err(|e| PubtrendError::Xml(format!("{}: {e}", self.archive)))?;

            match event {
                Event::Start(ref e) => match e.name().as_ref() {
                    b"PubmedArticle" => {
                        self.article_no += 1;
                        self.state = Some(ArticleState::default());
                    }
                    b"PMID" => {
                        // Only the citation's own PMID, which comes first.
                        if matches!(self.state, Some(ref s) if s.pmid.is_none()) {
                            self.in_pmid = true;
                        }
                    }
                    b"ArticleTitle" => {
                        if matches!(self.state, Some(ref s) if s.title.is_none()) {
                            self.in_title = true;
                        }
                    }
                    b"AbstractText" => {
                        if let Some(state) = self.state.as_mut() {
                            self.in_abstract_seg = true;
                            state.seg_text.clear();
                            state.seg_label = e
                                .try_get_attribute("Label")
                                .map_err(|err| {
                                    PubtrendError::Xml(format!("{}: {err}", self.archive))
                                })?
                                .map(|attr| {
                                    attr.unescape_value()
                                        .map(|v| v.into_owned())
                                        .map_err(|err| {
                                            PubtrendError::Xml(format!(
                                                "{}: {err}",
                                                self.archive
                                            ))
                                        })
                                })
                                .transpose()?;
                        }
                    }
                    b"DateCreated" => {
                        if self.state.is_some() {
                            self.in_date_created = true;
                        }
                    }
                    b"Year" if self.in_date_created => self.in_year = true,
                    b"Month" if self.in_date_created => self.in_month = true,
                    b"Day" if self.in_date_created => self.in_day = true,
                    _ => {}
                },
                Event::Text(ref e) => {
                    if let Some(state) = self.state.as_mut() {
                        let text = e
                            .unescape()
                            .map_err(|err| PubtrendError::Xml(format!("{}: {err}", self.archive)))?
                            .into_owned();
                        if self.in_pmid {
                            state.pmid = Some(text);
                        } else if self.in_title {
                            state.title = Some(match state.title.take() {
                                Some(mut t) => {
                                    t.push_str(&text);
                                    t
                                }
                                None => text,
                            });
                        } else if self.in_abstract_seg {
                            state.seg_text.push_str(&text);
                        } else if self.in_year {
                            state.year = text;
                        } else if self.in_month {
                            state.month = text;
                        } else if self.in_day {
                            state.day = text;
                        }
                    }
                }
                Event::End(ref e) => match e.name().as_ref() {
                    b"PMID" => self.in_pmid = false,
                    b"ArticleTitle" => self.in_title = false,
                    b"AbstractText" => {
                        self.in_abstract_seg = false;
                        if let Some(state) = self.state.as_mut() {
                            let seg = std::mem::take(&mut state.seg_text);
                            let label = state.seg_label.take();
                            // Empty segments contribute nothing, label or not.
                            if !seg.is_empty() {
                                if let Some(label) = label {
                                    state
                                        .abstract_text
                                        .push_str(&format!("<b>{label}</b>: "));
                                }
                                state.abstract_text.push_str(&seg);
                                state.abstract_text.push_str("<br>");
                            }
                        }
                    }
                    b"DateCreated" => self.in_date_created = false,
                    b"Year" => self.in_year = false,
                    b"Month" => self.in_month = false,
                    b"Day" => self.in_day = false,
                    b"PubmedArticle" => {
                        if let Some(state) = self.state.take() {
                            return self.finish_article(state).map(Some);
                        }
                    }
                    _ => {}
                },
                Event::Eof => return Ok(None),
                _ => {}
            }
            self.buf.clear();
        }
    }

    /// Validate required fields and build the record.
    fn finish_article(&self, state: ArticleState) -> Result<PubmedPaper> {
        let pmid = match state.pmid {
            Some(ref p) if !p.is_empty() => p.clone(),
            _ => return Err(self.extraction_error("missing PMID")),
        };

        if state.year.is_empty() || state.month.is_empty() || state.day.is_empty() {
            return Err(self.extraction_error(format!("missing DateCreated (pmid {pmid})")));
        }
        let date = state
            .year
            .parse::<i32>()
            .ok()
            .zip(state.month.parse::<u32>().ok())
            .zip(state.day.parse::<u32>().ok())
            .and_then(|((y, m), d)| NaiveDate::from_ymd_opt(y, m, d))
            .ok_or_else(|| {
                self.extraction_error(format!(
                    "invalid DateCreated {}-{}-{} (pmid {pmid})",
                    state.year, state.month, state.day
                ))
            })?;

        Ok(PubmedPaper {
            pmid,
            title: state.title.unwrap_or_default(),
            abstract_text: state.abstract_text,
            created_date: date,
        })
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = Result<PubmedPaper>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}
