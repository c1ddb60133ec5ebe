mod fallback;

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use research_llm::LLMGateway;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::agent::{log_activity, ResearchAgent};
use crate::error::{require_non_empty, Result};
use crate::parser;
use crate::prompt::{PromptFields, PromptTemplate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionKind {
    Tables,
    Statistics,
    Keywords,
    References,
    Figures,
    All,
}

impl ExtractionKind {
    /// Order the `all` kind runs in.
    pub const SINGLE: [ExtractionKind; 5] = [
        ExtractionKind::Tables,
        ExtractionKind::Figures,
        ExtractionKind::Statistics,
        ExtractionKind::Keywords,
        ExtractionKind::References,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionKind::Tables => "tables",
            ExtractionKind::Statistics => "statistics",
            ExtractionKind::Keywords => "keywords",
            ExtractionKind::References => "references",
            ExtractionKind::Figures => "figures",
            ExtractionKind::All => "all",
        }
    }

    fn profile(&self) -> Option<KindProfile> {
        let profile = match self {
            ExtractionKind::Tables => KindProfile {
                template: &TABLES,
                budget: Some(5000),
                temperature: 0.3,
            },
            ExtractionKind::Statistics => KindProfile {
                template: &STATISTICS,
                budget: Some(3000),
                temperature: 0.3,
            },
            ExtractionKind::Keywords => KindProfile {
                template: &KEYWORDS,
                budget: Some(2000),
                temperature: 0.5,
            },
            ExtractionKind::Figures => KindProfile {
                template: &FIGURES,
                budget: Some(2000),
                temperature: 0.5,
            },
            ExtractionKind::References => KindProfile {
                template: &REFERENCES,
                budget: None,
                temperature: 0.3,
            },
            ExtractionKind::All => return None,
        };
        Some(profile)
    }
}

impl fmt::Display for ExtractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognized names select [`ExtractionKind::All`].
impl FromStr for ExtractionKind {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "tables" => ExtractionKind::Tables,
            "statistics" => ExtractionKind::Statistics,
            "keywords" => ExtractionKind::Keywords,
            "references" => ExtractionKind::References,
            "figures" => ExtractionKind::Figures,
            _ => ExtractionKind::All,
        })
    }
}

struct KindProfile {
    template: &'static PromptTemplate,
    /// Characters of content sent to the model; `None` sends everything.
    budget: Option<usize>,
    temperature: f32,
}

const TABLES: PromptTemplate = PromptTemplate {
    id: "extraction.tables",
    system: "You are a data extraction expert. Extract tables from research papers accurately.",
    body: r#"
Extract all tables from the following research paper content. For each table:
1. Identify the table structure
2. Extract the data in a structured format
3. Provide the table caption/title
4. Note any footnotes or explanations

Content:
{content}

Return the result as a JSON object with:
- tables: array of table objects
- table_count: total number of tables found
- extraction_quality: assessment of extraction quality
"#,
    fields: &["content"],
};

const STATISTICS: PromptTemplate = PromptTemplate {
    id: "extraction.statistics",
    system: "You are a statistics expert. Extract and categorize statistical information accurately.",
    body: r#"
Extract statistical information from the following research paper content:

{content}

Look for:
- Sample sizes (n=)
- P-values
- Confidence intervals
- Effect sizes
- Mean/median values
- Standard deviations
- Correlation coefficients
- Statistical test results

Return as JSON with categories for different types of statistics.
"#,
    fields: &["content"],
};

const KEYWORDS: PromptTemplate = PromptTemplate {
    id: "extraction.keywords",
    system: "You are a research analysis expert. Extract and categorize key terms accurately.",
    body: r#"
Extract key terms, concepts, and important keywords from this research paper:

{content}

Focus on:
- Technical terms
- Methodology keywords
- Key concepts
- Research variables
- Domain-specific terminology

Return as JSON with categorized keywords.
"#,
    fields: &["content"],
};

const REFERENCES: PromptTemplate = PromptTemplate {
    id: "extraction.references",
    system: "You are a bibliographic expert. Extract references accurately.",
    body: r#"
Extract all references and citations from this research paper:

{content}

Look for:
- Author names and years
- Journal names
- Book titles
- DOI numbers
- URLs

Return as JSON with structured reference data.
"#,
    fields: &["content"],
};

const FIGURES: PromptTemplate = PromptTemplate {
    id: "extraction.figures",
    system: "You are a data visualization expert. Extract figure information accurately.",
    body: r#"
Extract information about figures, charts, and graphs from this research paper:

{content}

Look for:
- Figure captions
- Chart descriptions
- Graph data
- Visual elements mentioned

Return as JSON with figure details.
"#,
    fields: &["content"],
};

const ANALYZE: PromptTemplate = PromptTemplate {
    id: "extraction.analyze",
    system: "You are a data analysis expert. Provide comprehensive insights from research data.",
    body: r#"
Analyze the following extracted research data and provide insights:

{data}

Provide analysis including:
1. Key patterns and trends
2. Notable findings
3. Data quality assessment
4. Recommendations for further analysis
5. Potential research implications

Return as structured JSON with analysis sections.
"#,
    fields: &["data"],
};

pub(crate) const TEMPLATES: &[&PromptTemplate] =
    &[&TABLES, &STATISTICS, &KEYWORDS, &REFERENCES, &FIGURES, &ANALYZE];

#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    pub extraction_type: ExtractionKind,
    pub data: Value,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub analysis: Value,
    pub timestamp: DateTime<Utc>,
}

fn truncate(content: &str, budget: Option<usize>) -> &str {
    match budget.and_then(|n| content.char_indices().nth(n)) {
        Some((end, _)) => &content[..end],
        None => content,
    }
}

pub struct DataExtractionAgent {
    llm: Arc<dyn LLMGateway>,
}

impl DataExtractionAgent {
    pub fn new(llm: Arc<dyn LLMGateway>) -> Self {
        Self { llm }
    }

    pub async fn extract_data(
        &self,
        file_content: &str,
        kind: ExtractionKind,
    ) -> Result<ExtractionResult> {
        require_non_empty(&[("file_content", file_content)])?;
        log_activity(
            self.name(),
            "extract_data",
            json!({ "extraction_type": kind, "content_length": file_content.chars().count() }),
        );

        let data = match kind.profile() {
            Some(profile) => self.extract_single(kind, profile, file_content).await?,
            None => self.extract_all(file_content).await,
        };

        Ok(ExtractionResult {
            extraction_type: kind,
            data,
            timestamp: Utc::now(),
        })
    }

    /// Run every kind in turn. A failing kind is recorded as `{"error": ...}`
    /// under its name; the others still run.
    async fn extract_all(&self, content: &str) -> Value {
        let mut results = Map::new();
        for (kind, profile) in ExtractionKind::SINGLE
            .into_iter()
            .filter_map(|kind| kind.profile().map(|p| (kind, p)))
        {
            let data = match self.extract_single(kind, profile, content).await {
                Ok(data) => data,
                Err(e) => {
                    log::warn!("{} extraction failed: {}", kind, e);
                    json!({ "error": e.to_string() })
                }
            };
            results.insert(kind.as_str().to_string(), data);
        }
        Value::Object(results)
    }

    async fn extract_single(
        &self,
        kind: ExtractionKind,
        profile: KindProfile,
        content: &str,
    ) -> Result<Value> {
        let fields = PromptFields::new().with("content", truncate(content, profile.budget));
        let response = self
            .llm
            .complete(&profile.template.render(&fields), profile.temperature)
            .await;

        match response {
            Ok(text) => match parser::decode_value(&text) {
                Ok(data) => Ok(data),
                Err(e) => {
                    log::warn!("Could not parse {} extraction, using fallback: {}", kind, e);
                    Ok(decode_fallback(kind, content))
                }
            },
            Err(e) if matches!(kind, ExtractionKind::Tables | ExtractionKind::Statistics) => {
                log::warn!("{} extraction call failed, using fallback: {}", kind, e);
                Ok(decode_fallback(kind, content))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn analyze_data(&self, data: &Value) -> Result<Analysis> {
        log_activity(
            self.name(),
            "analyze_data",
            json!({ "data_type": parser::type_name(data) }),
        );

        let pretty = serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string());
        let text = self
            .llm
            .complete(&ANALYZE.render(&PromptFields::new().with("data", pretty)), 0.7)
            .await?;

        let analysis = parser::decode_value(&text).unwrap_or_else(|e| {
            log::warn!("Could not parse analysis: {}", e);
            json!({ "insights": "Analysis completed but could not parse structured response" })
        });

        Ok(Analysis {
            analysis,
            timestamp: Utc::now(),
        })
    }

    /// Describe the chart that would be drawn for `data`. Nothing is rendered.
    pub fn generate_visualization(&self, data: &Value, chart_type: &str) -> Value {
        log_activity(
            self.name(),
            "generate_visualization",
            json!({ "chart_type": chart_type }),
        );
        let timestamp = Utc::now();

        if let Some(tables) = data.get("tables") {
            let table_count = match tables {
                Value::Array(items) => items.len(),
                Value::Object(map) => map.len(),
                other => return visualization_error(other, chart_type),
            };
            return json!({
                "visualization_type": chart_type,
                "data_source": "tables",
                "table_count": table_count,
                "message": "Table visualization would be generated here",
                "timestamp": timestamp,
            });
        }

        if let Some(stats) = data.get("statistics") {
            let Value::Object(stats) = stats else {
                return visualization_error(stats, chart_type);
            };
            return json!({
                "visualization_type": chart_type,
                "data_source": "statistics",
                "stats_categories": stats.keys().collect::<Vec<_>>(),
                "message": "Statistical visualization would be generated here",
                "timestamp": timestamp,
            });
        }

        json!({
            "visualization_type": chart_type,
            "data_type": parser::type_name(data),
            "message": "Generic visualization would be generated here",
            "timestamp": timestamp,
        })
    }
}

fn decode_fallback(kind: ExtractionKind, content: &str) -> Value {
    match kind {
        ExtractionKind::Tables => fallback::tables(content),
        ExtractionKind::Statistics => fallback::statistics(content),
        other => fallback::empty(other),
    }
}

fn visualization_error(found: &Value, chart_type: &str) -> Value {
    json!({
        "error": format!(
            "Could not generate visualization: unexpected {} payload",
            parser::type_name(found)
        ),
        "chart_type": chart_type,
        "timestamp": Utc::now(),
    })
}

impl ResearchAgent for DataExtractionAgent {
    fn key(&self) -> &'static str {
        "data_extraction"
    }

    fn name(&self) -> &'static str {
        "DataExtractionAgent"
    }

    fn description(&self) -> &'static str {
        "Data Extraction & Analysis Agent - Extracts and analyzes data from research papers"
    }

    fn capabilities(&self) -> &'static [&'static str] {
        &[
            "Extract tables from research papers",
            "Extract statistical data",
            "Generate data visualizations",
            "Analyze research trends",
            "Extract key findings and statistics",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedGateway;

    fn agent(llm: ScriptedGateway) -> (DataExtractionAgent, Arc<ScriptedGateway>) {
        let llm = Arc::new(llm);
        (DataExtractionAgent::new(llm.clone()), llm)
    }

    #[test]
    fn unknown_kind_names_mean_all() {
        assert_eq!("tables".parse::<ExtractionKind>(), Ok(ExtractionKind::Tables));
        assert_eq!(" Figures ".parse::<ExtractionKind>(), Ok(ExtractionKind::Figures));
        assert_eq!("everything".parse::<ExtractionKind>(), Ok(ExtractionKind::All));
    }

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("héllo", Some(2)), "hé");
        assert_eq!(truncate("abc", Some(10)), "abc");
        assert_eq!(truncate("abc", None), "abc");
    }

    #[tokio::test]
    async fn statistics_fallback_reads_sample_size_from_malformed_output() {
        let content = "Participants (n = 42) completed the survey.";
        let (agent, llm) = agent(ScriptedGateway::new().reply("{\"sample_sizes\": [42"));

        let result = agent
            .extract_data(content, ExtractionKind::Statistics)
            .await
            .unwrap();

        assert_eq!(result.extraction_type, ExtractionKind::Statistics);
        assert_eq!(result.data["sample_sizes"], json!(["42"]));
        assert_eq!(result.data["extraction_quality"], "basic");
        assert_eq!(llm.calls()[0].temperature, 0.3);
    }

    #[tokio::test]
    async fn statistics_fallback_covers_gateway_failure() {
        let (agent, _) = agent(ScriptedGateway::new().fail("timeout"));

        let result = agent
            .extract_data("n = 42", ExtractionKind::Statistics)
            .await
            .unwrap();
        assert_eq!(result.data["sample_sizes"], json!(["42"]));
    }

    #[tokio::test]
    async fn well_formed_output_is_returned_as_is() {
        let (agent, _) = agent(
            ScriptedGateway::new().reply("```json\n{\"tables\": [], \"table_count\": 0}\n```"),
        );

        let result = agent
            .extract_data("No tables here.", ExtractionKind::Tables)
            .await
            .unwrap();
        assert_eq!(result.data, json!({ "tables": [], "table_count": 0 }));
    }

    #[tokio::test]
    async fn content_is_cut_to_the_kind_budget() {
        let content = "x".repeat(6000);
        let (agent, llm) = agent(ScriptedGateway::new().reply("{}").reply("{}").reply("{}"));

        agent.extract_data(&content, ExtractionKind::Tables).await.unwrap();
        agent.extract_data(&content, ExtractionKind::Keywords).await.unwrap();
        agent.extract_data(&content, ExtractionKind::References).await.unwrap();

        let calls = llm.calls();
        assert!(calls[0].user().contains(&"x".repeat(5000)));
        assert!(!calls[0].user().contains(&"x".repeat(5001)));
        assert!(!calls[1].user().contains(&"x".repeat(2001)));
        assert_eq!(calls[1].temperature, 0.5);
        assert!(calls[2].user().contains(&content));
    }

    #[tokio::test]
    async fn keywords_decode_failure_yields_empty_list() {
        let (agent, _) = agent(ScriptedGateway::new().reply("machine learning, transformers"));

        let result = agent
            .extract_data("some text", ExtractionKind::Keywords)
            .await
            .unwrap();
        assert_eq!(result.data, json!({ "keywords": [] }));
    }

    #[tokio::test]
    async fn keywords_gateway_failure_propagates() {
        let (agent, _) = agent(ScriptedGateway::new().fail("down"));
        assert!(agent
            .extract_data("some text", ExtractionKind::Keywords)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn all_isolates_failures_per_kind() {
        let (agent, llm) = agent(
            ScriptedGateway::new()
                .reply(r#"{"tables": [{"title": "T1"}], "table_count": 1}"#)
                .fail("figures down")
                .reply(r#"{"p_values": ["0.01"]}"#)
                .reply("not json")
                .reply(r#"{"references": ["Smith 2020"]}"#),
        );

        let result = agent
            .extract_data("Table 1: Results", ExtractionKind::All)
            .await
            .unwrap();

        assert_eq!(result.extraction_type, ExtractionKind::All);
        let data = result.data.as_object().unwrap();
        assert_eq!(data.len(), 5);
        assert_eq!(data["tables"]["table_count"], 1);
        assert!(data["figures"]["error"].as_str().unwrap().contains("figures down"));
        assert_eq!(data["statistics"]["p_values"], json!(["0.01"]));
        assert_eq!(data["keywords"], json!({ "keywords": [] }));
        assert_eq!(data["references"]["references"], json!(["Smith 2020"]));
        assert_eq!(llm.call_count(), 5);
    }

    #[tokio::test]
    async fn blank_content_is_rejected() {
        let (agent, llm) = agent(ScriptedGateway::new());
        let err = agent
            .extract_data("   ", ExtractionKind::Tables)
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn analysis_falls_back_to_insight_message() {
        let (agent, llm) = agent(
            ScriptedGateway::new()
                .reply(r#"{"patterns": ["growth"]}"#)
                .reply("Looks interesting."),
        );
        let data = json!({ "tables": [] });

        let analysis = agent.analyze_data(&data).await.unwrap();
        assert_eq!(analysis.analysis["patterns"], json!(["growth"]));
        assert!(llm.calls()[0].user().contains("\"tables\": []"));

        let analysis = agent.analyze_data(&data).await.unwrap();
        assert_eq!(
            analysis.analysis["insights"],
            "Analysis completed but could not parse structured response"
        );
    }

    #[test]
    fn visualization_describes_the_payload() {
        let (agent, _) = agent(ScriptedGateway::new());

        let chart = agent.generate_visualization(&json!({ "tables": [1, 2] }), "bar");
        assert_eq!(chart["data_source"], "tables");
        assert_eq!(chart["table_count"], 2);

        let chart = agent.generate_visualization(
            &json!({ "statistics": { "means": [], "p_values": [] } }),
            "line",
        );
        assert_eq!(chart["visualization_type"], "line");
        assert_eq!(chart["stats_categories"], json!(["means", "p_values"]));

        let chart = agent.generate_visualization(&json!([1, 2, 3]), "bar");
        assert_eq!(chart["data_type"], "array");

        let chart = agent.generate_visualization(&json!({ "tables": 3 }), "bar");
        assert!(chart["error"].as_str().unwrap().starts_with("Could not generate visualization"));
    }
}
