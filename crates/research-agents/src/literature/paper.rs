use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A paper record as returned by search and accepted by categorization.
///
/// Deserialization is lenient because records come from three places with
/// different habits: the search service, model output, and API callers.
/// Fields not listed here are kept in `extra` and written back unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Paper {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_authors")]
    pub authors: Vec<String>,
    #[serde(rename = "abstract", default, deserialize_with = "lenient_string")]
    pub abstract_text: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub year: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub citations: u64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub venue: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Paper {
    /// Stand-in record when neither search nor the model produced anything usable.
    pub fn placeholder(topic: &str) -> Self {
        Paper {
            id: "1".to_string(),
            title: format!("Paper on {topic}"),
            authors: vec!["Author".to_string()],
            abstract_text: "Abstract not available".to_string(),
            year: "2024".to_string(),
            citations: 0,
            url: String::new(),
            venue: "Journal".to_string(),
            extra: Map::new(),
        }
    }

    pub fn has_title(&self) -> bool {
        !self.title.trim().is_empty()
    }

    /// Lowercased title and abstract, used by keyword matching.
    pub(crate) fn searchable_text(&self) -> String {
        format!("{} {}", self.title, self.abstract_text).to_lowercase()
    }
}

fn value_to_string(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_string(Value::deserialize(deserializer)?))
}

fn lenient_authors<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let authors = match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(mut obj) => obj.remove("name").map(value_to_string).unwrap_or_default(),
                other => value_to_string(other),
            })
            .collect(),
        Value::String(joined) => joined.split(',').map(str::to_string).collect(),
        Value::Null => Vec::new(),
        other => vec![other.to_string()],
    };

    Ok(authors
        .into_iter()
        .map(|a: String| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .collect())
}

fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Value::String(s) => s
            .chars()
            .filter(char::is_ascii_digit)
            .collect::<String>()
            .parse()
            .unwrap_or(0),
        _ => 0,
    })
}
