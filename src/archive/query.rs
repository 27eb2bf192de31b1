use serde_json::Value;

use crate::error::ArchiveError;
use crate::theme::ThemeCode;
use crate::tune::RawTune;

pub const INDEX_PATH: &str = "/w/index.php";
pub const API_PATH: &str = "/w/api.php";

const CATEGORY: &str = "[[Category:Tune]]";
const SORT_FIELD: &str = "Theme_code_index";

/// Where a listing response keeps its result mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultsAt {
    /// `Special:Ask` export: top-level `results`.
    Root,
    /// `api.php?action=ask`: `query.results`.
    Query,
}

impl ResultsAt {
    fn pointer(self) -> &'static str {
        match self {
            ResultsAt::Root => "/results",
            ResultsAt::Query => "/query/results",
        }
    }

    fn label(self) -> &'static str {
        match self {
            ResultsAt::Root => "results",
            ResultsAt::Query => "query.results",
        }
    }
}

/// `Special:Ask` JSON export over the whole tune category.
pub fn listing_params(page: usize, page_size: usize) -> Vec<(&'static str, String)> {
    vec![
        ("title", "Special:Ask".into()),
        ("q", CATEGORY.into()),
        ("p[format]", "json".into()),
        ("sort[0]", SORT_FIELD.into()),
        ("order[0]", "ASC".into()),
        ("order_num", "ASC".into()),
        ("p[offset]", (page * page_size).to_string()),
        ("p[limit]", page_size.to_string()),
        ("p[searchlabel]", "JSON".into()),
        ("eq", "yes".into()),
    ]
}

/// Ask API query restricted to tunes whose theme code starts with `code`.
pub fn theme_params(code: &ThemeCode, page: usize, page_size: usize) -> Vec<(&'static str, String)> {
    let query = format!(
        "{}|[[Theme code index::~{}*]]|offset={}|limit={}",
        CATEGORY,
        code,
        page * page_size,
        page_size
    );
    vec![
        ("action", "ask".into()),
        ("query", query),
        ("format", "json".into()),
    ]
}

/// Decode a listing body into raw tunes, in the order the keys appear.
///
/// The wiki sends `[]` rather than `{}` when nothing matched, so an array
/// is accepted too.
pub fn decode_results(url: &str, body: &str, at: ResultsAt) -> Result<Vec<RawTune>, ArchiveError> {
    let mut value: Value = serde_json::from_str(body).map_err(|source| ArchiveError::Json {
        url: url.to_string(),
        source,
    })?;

    let missing = || ArchiveError::MissingResults {
        url: url.to_string(),
        path: at.label(),
    };

    let results = value.pointer_mut(at.pointer()).map(Value::take).ok_or_else(missing)?;

    let entries: Vec<(String, Value)> = match results {
        Value::Object(map) => map.into_iter().collect(),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        _ => return Err(missing()),
    };

    entries
        .into_iter()
        .map(|(key, entry)| {
            serde_json::from_value(entry).map_err(|source| ArchiveError::MalformedRecord { key, source })
        })
        .collect()
}
