//! Pattern-based extractors used when the model's output is unusable.
//! Results carry a quality tag so callers can tell them apart.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};

use super::ExtractionKind;

lazy_static! {
    static ref TABLE_PATTERNS: [Regex; 2] = [
        Regex::new(r"(?i)Table \d+[.:]?\s*([^\n]+)").expect("Failed to compile table caption regex"),
        Regex::new(r"(?i)(\d+\.\d+\s+\d+\.\d+\s+\d+\.\d+)").expect("Failed to compile table row regex"),
    ];
    static ref SAMPLE_SIZE: Regex =
        Regex::new(r"(?i)n\s*=\s*(\d+)").expect("Failed to compile sample size regex");
    static ref P_VALUE: Regex =
        Regex::new(r"(?i)p\s*[<>=]\s*([0-9.]+)").expect("Failed to compile p-value regex");
    static ref CORRELATION: Regex =
        Regex::new(r"(?i)r\s*=\s*([-0-9.]+)").expect("Failed to compile correlation regex");
    static ref MEAN: Regex =
        Regex::new(r"(?i)mean\s*=\s*([0-9.]+)").expect("Failed to compile mean regex");
}

fn first_groups(pattern: &Regex, content: &str) -> Vec<String> {
    pattern
        .captures_iter(content)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

/// Table captions and numeric rows, each tagged low confidence.
pub fn tables(content: &str) -> Value {
    let matches = TABLE_PATTERNS
        .iter()
        .flat_map(|pattern| first_groups(pattern, content));

    let tables: Vec<Value> = matches
        .enumerate()
        .map(|(i, data)| {
            json!({
                "title": format!("Extracted Table {}", i + 1),
                "data": data,
                "confidence": "low",
            })
        })
        .collect();

    json!({
        "table_count": tables.len(),
        "tables": tables,
        "extraction_quality": "basic",
    })
}

pub fn statistics(content: &str) -> Value {
    json!({
        "sample_sizes": first_groups(&SAMPLE_SIZE, content),
        "p_values": first_groups(&P_VALUE, content),
        "correlations": first_groups(&CORRELATION, content),
        "means": first_groups(&MEAN, content),
        "extraction_quality": "basic",
    })
}

/// Empty payload for kinds without a pattern extractor.
pub fn empty(kind: ExtractionKind) -> Value {
    json!({ kind.as_str(): [] })
}
