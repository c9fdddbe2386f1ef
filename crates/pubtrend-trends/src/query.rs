//! Query construction for the trend counts.

use chrono::NaiveDate;
use serde_json::{json, Value};

/// strftime form of the index mapping's `yyyy-MM-dd` date format.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Query for "documents created in `[low, high)` that phrase-match any term
/// in either the title or the abstract".
///
/// With no terms, the term clause is omitted entirely and the query reduces
/// to the date range alone, which is the baseline used as the normalizing
/// count.
/// With terms, every term contributes one `match_phrase` per field, all
/// OR-ed in a single `should`; a document matches if any term appears in
/// either field.
pub fn trend_query(low: NaiveDate, high: NaiveDate, terms: &[String]) -> Value {
    let mut must = vec![json!({
        "range": {
            "created_date": {
                "gte": low.format(DATE_FORMAT).to_string(),
                "lt": high.format(DATE_FORMAT).to_string(),
                "format": "yyyy-MM-dd",
            }
        }
    })];

    if !terms.is_empty() {
        let should: Vec<Value> = terms
            .iter()
            .flat_map(|term| {
                [
                    json!({ "match_phrase": { "title": term } }),
                    json!({ "match_phrase": { "abstract": term } }),
                ]
            })
            .collect();
        must.push(json!({ "bool": { "should": should } }));
    }

    json!({ "bool": { "must": must } })
}
