//! Data model for extracted publication records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Date format used in the index mapping and all range queries.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One normalized publication record, built per `<PubmedArticle>` and
/// discarded once handed to the bulk loader. The search index is the only
/// durable store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PubmedPaper {
    /// External identifier (digits); the index document key.
    pub pmid: String,
    /// May be empty when the title node is absent; an absent title does not
    /// fail the archive.
    pub title: String,
    /// Concatenated abstract segments; legitimately empty for many records.
    pub abstract_text: String,
    /// From `<DateCreated>`, day granularity.
    pub created_date: NaiveDate,
}

impl PubmedPaper {
    /// Document body as indexed. The PMID travels in the bulk action line,
    /// not in the body.
    pub fn document_body(&self) -> Value {
        json!({
            "title": self.title,
            "abstract": self.abstract_text,
            "created_date": self.created_date.format(DATE_FORMAT).to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_body_formats_date_day_granularity() {
        let paper = PubmedPaper {
            pmid: "12345678".to_string(),
            title: "A title".to_string(),
            abstract_text: String::new(),
            created_date: NaiveDate::from_ymd_opt(2017, 3, 5).unwrap(),
        };
        let body = paper.document_body();
        assert_eq!(body["created_date"], "2017-03-05");
        assert_eq!(body["title"], "A title");
        assert_eq!(body["abstract"], "");
        assert!(body.get("pmid").is_none());
    }
}
