use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use research_llm::LLMGateway;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};

use crate::agent::{log_activity, ResearchAgent};
use crate::error::{require_non_empty, AgentError, Result};
use crate::parser;
use crate::prompt::{PromptFields, PromptTemplate};

pub const PROPOSAL_SECTIONS: [&str; 13] = [
    "title",
    "abstract",
    "introduction",
    "literature_review",
    "research_questions",
    "hypotheses",
    "methodology",
    "data_collection",
    "analysis_plan",
    "expected_outcomes",
    "timeline",
    "budget",
    "references",
];

/// Sections written one by one when the full proposal cannot be decoded.
/// `literature_review`, `data_collection` and `analysis_plan` are not
/// among them.
pub const FALLBACK_SECTIONS: [&str; 10] = [
    "title",
    "abstract",
    "introduction",
    "research_questions",
    "hypotheses",
    "methodology",
    "expected_outcomes",
    "timeline",
    "budget",
    "references",
];

pub const DEFAULT_FUNDING_AMOUNT: &str = "50,000";

const FULL_PROPOSAL: PromptTemplate = PromptTemplate {
    id: "proposal.generate",
    system: "You are an expert research proposal writer. Generate comprehensive, well-structured proposals that follow academic standards.",
    body: r#"
Generate a comprehensive research proposal based on the following information:

Research Topic: {research_topic}
Research Question: {research_question}
Methodology: {methodology}
Expected Outcomes: {expected_outcomes}
Additional Context: {additional_context}

Create a complete research proposal with the following sections:
1. Title - Clear and descriptive
2. Abstract - Summary of the research (150-250 words)
3. Introduction - Background and significance
4. Literature Review - Brief overview of relevant research
5. Research Questions - Specific questions to be addressed
6. Hypotheses - Testable predictions
7. Methodology - Detailed research design
8. Data Collection - Methods and procedures
9. Analysis Plan - Statistical or analytical approach
10. Expected Outcomes - Anticipated results and impact
11. Timeline - Project schedule (6-12 months)
12. Budget - Estimated costs and justification
13. References - Key sources (at least 10)

Format the proposal professionally with clear headings and academic writing style.
Return as a structured JSON object with each section as a key.
"#,
    fields: &[
        "research_topic",
        "research_question",
        "methodology",
        "expected_outcomes",
        "additional_context",
    ],
};

const FALLBACK_SECTION: PromptTemplate = PromptTemplate {
    id: "proposal.fallback_section",
    system: "You are writing the {section} section of a research proposal.",
    body: r#"
{instruction}

Additional context: {additional_context}

Write this section in academic style, be specific and detailed.
"#,
    fields: &["section", "instruction", "additional_context"],
};

const SECTION: PromptTemplate = PromptTemplate {
    id: "proposal.section",
    system: "You are writing the {section} section of a research proposal.",
    body: r#"
{instruction}

Context:
{context}

Write this section in academic style, be specific and detailed.
"#,
    fields: &["section", "instruction", "context"],
};

const IMPROVE: PromptTemplate = PromptTemplate {
    id: "proposal.improve",
    system: "You are an expert research proposal editor. Improve proposals based on feedback while maintaining academic standards.",
    body: r#"
Improve the following research proposal based on the provided feedback:

Original Proposal:
{proposal_text}

Feedback for Improvement:
{feedback}

Please:
1. Address all points in the feedback
2. Maintain the original structure and flow
3. Improve clarity, specificity, and academic rigor
4. Ensure all sections are well-developed
5. Fix any grammatical or formatting issues

Return the improved proposal with the same structure as the original.
"#,
    fields: &["proposal_text", "feedback"],
};

const VALIDATE: PromptTemplate = PromptTemplate {
    id: "proposal.validate",
    system: "You are a research proposal reviewer. Assess proposals for completeness, quality, and feasibility.",
    body: r#"
Validate the following research proposal for completeness and quality:

{proposal}

Assess:
1. Completeness - Are all essential sections present?
2. Quality - Is the writing clear and academic?
3. Coherence - Do sections flow logically?
4. Specificity - Are methods and outcomes specific enough?
5. Feasibility - Is the research feasible?
6. Impact - Is the significance clear?

Return a JSON object with:
- overall_score: 1-10
- missing_sections: list of missing sections
- quality_issues: list of quality problems
- recommendations: list of improvement suggestions
- is_ready: boolean (ready for submission)
"#,
    fields: &["proposal"],
};

const FUNDING: PromptTemplate = PromptTemplate {
    id: "proposal.funding",
    system: "You are a grant writing expert. Create compelling funding justifications.",
    body: r#"
Generate a funding justification for the following research proposal:

{proposal}

Funding Amount: ${funding_amount}

Create a compelling justification that includes:
1. Research significance and impact
2. Innovation and novelty
3. Feasibility and methodology strength
4. Expected outcomes and benefits
5. Cost-effectiveness
6. Alignment with funding priorities

Write in a persuasive, professional tone suitable for funding applications.
"#,
    fields: &["proposal", "funding_amount"],
};

pub(crate) const TEMPLATES: &[&PromptTemplate] = &[
    &FULL_PROPOSAL,
    &FALLBACK_SECTION,
    &SECTION,
    &IMPROVE,
    &VALIDATE,
    &FUNDING,
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProposalRequest {
    pub research_topic: String,
    pub research_question: String,
    pub methodology: String,
    pub expected_outcomes: String,
    #[serde(default)]
    pub additional_context: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedProposal {
    pub proposal: IndexMap<String, Value>,
    pub generated_at: DateTime<Utc>,
    pub sections_completed: usize,
    pub status: &'static str,
}

impl GeneratedProposal {
    fn complete(proposal: IndexMap<String, Value>) -> Self {
        Self {
            sections_completed: proposal.len(),
            proposal,
            generated_at: Utc::now(),
            status: "complete",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImprovedProposal {
    pub improved_proposal: String,
    pub original_proposal: String,
    pub feedback_applied: String,
    pub improved_at: DateTime<Utc>,
    pub status: &'static str,
}

/// Reviewer verdict as decoded from the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalReview {
    #[serde(deserialize_with = "score_1_to_10")]
    pub overall_score: u8,
    #[serde(default)]
    pub missing_sections: Vec<String>,
    #[serde(default)]
    pub quality_issues: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub is_ready: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ValidationOutcome {
    Review(ProposalReview),
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ProposalValidation {
    pub validation: ValidationOutcome,
    pub validated_at: DateTime<Utc>,
    pub proposal_sections: Vec<String>,
}

/// Accepts integers, floats and numeric strings; rounds and clamps to 1..=10.
fn score_1_to_10<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let raw = match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| D::Error::custom("score is not a finite number"))?,
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| D::Error::custom(format!("score '{}' is not a number", s)))?,
        other => {
            return Err(D::Error::custom(format!(
                "score must be a number, found {}",
                parser::type_name(&other)
            )))
        }
    };
    // Float-to-int `as` saturates, so out-of-range values land on a bound.
    Ok((raw.round() as i64).clamp(1, 10) as u8)
}

fn fallback_instruction(section: &str, request: &ProposalRequest) -> String {
    let topic = &request.research_topic;
    match section {
        "title" => format!("Generate a clear, descriptive title for research on: {}", topic),
        "abstract" => format!(
            "Write an abstract (150-250 words) for research on {}. Research question: {}. Methodology: {}",
            topic, request.research_question, request.methodology
        ),
        "introduction" => format!(
            "Write an introduction for research on {}. Include background, significance, and context.",
            topic
        ),
        "research_questions" => format!(
            "Formulate specific research questions for: {}",
            request.research_question
        ),
        "hypotheses" => format!("Generate testable hypotheses for research on {}", topic),
        "methodology" => format!("Detail the methodology for: {}", request.methodology),
        "expected_outcomes" => format!("Describe expected outcomes: {}", request.expected_outcomes),
        "timeline" => "Create a 12-month project timeline with milestones".to_string(),
        "budget" => "Estimate budget for this research project with cost breakdown".to_string(),
        "references" => format!("Generate 10 relevant references for research on {}", topic),
        other => format!("Write the {} section", other),
    }
}

fn section_instruction(section: &str) -> &'static str {
    match section {
        "title" => "Generate a clear, descriptive research title",
        "abstract" => "Write a comprehensive abstract (150-250 words)",
        "introduction" => "Write an introduction with background and significance",
        "literature_review" => "Write a literature review section",
        "research_questions" => "Formulate specific research questions",
        "hypotheses" => "Generate testable hypotheses",
        "methodology" => "Detail the research methodology",
        "data_collection" => "Describe data collection methods",
        "analysis_plan" => "Outline the analysis plan",
        "expected_outcomes" => "Describe expected outcomes and impact",
        "timeline" => "Create a project timeline with milestones",
        "budget" => "Estimate budget with cost breakdown",
        _ => "Generate relevant references",
    }
}

/// Known sections first, in declared order, then anything else the model added.
fn has_known_section(decoded: &Map<String, Value>) -> bool {
    PROPOSAL_SECTIONS.iter().any(|s| decoded.contains_key(*s))
}

fn ordered_sections(mut decoded: Map<String, Value>) -> IndexMap<String, Value> {
    let mut ordered = IndexMap::with_capacity(decoded.len());
    for section in PROPOSAL_SECTIONS {
        if let Some(value) = decoded.remove(section) {
            ordered.insert(section.to_string(), value);
        }
    }
    ordered.extend(decoded);
    ordered
}

fn pretty(value: &impl Serialize) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

pub struct ProposalAgent {
    llm: Arc<dyn LLMGateway>,
}

impl ProposalAgent {
    pub fn new(llm: Arc<dyn LLMGateway>) -> Self {
        Self { llm }
    }

    /// One model call for the whole proposal; if its output is not a JSON
    /// object, each of [`FALLBACK_SECTIONS`] is written separately.
    pub async fn generate_proposal(&self, request: &ProposalRequest) -> Result<GeneratedProposal> {
        require_non_empty(&[
            ("research_topic", &request.research_topic),
            ("research_question", &request.research_question),
            ("methodology", &request.methodology),
            ("expected_outcomes", &request.expected_outcomes),
        ])?;
        log_activity(
            self.name(),
            "generate_proposal",
            json!({
                "research_topic": request.research_topic,
                "methodology": request.methodology,
            }),
        );

        let fields = PromptFields::new()
            .with("research_topic", &request.research_topic)
            .with("research_question", &request.research_question)
            .with("methodology", &request.methodology)
            .with("expected_outcomes", &request.expected_outcomes)
            .with("additional_context", &request.additional_context);

        let response = self
            .llm
            .complete(&FULL_PROPOSAL.render(&fields), 0.7)
            .await
            .map_err(|e| AgentError::from(e).context("Failed to generate proposal"))?;

        match parser::decode_object(&response) {
            Ok(decoded) if has_known_section(&decoded) => {
                Ok(GeneratedProposal::complete(ordered_sections(decoded)))
            }
            Ok(_) => {
                log::warn!("Proposal names no known section, writing sections one by one");
                Ok(self.generate_by_section(request).await)
            }
            Err(e) => {
                log::warn!("Could not parse proposal, writing sections one by one: {}", e);
                Ok(self.generate_by_section(request).await)
            }
        }
    }

    async fn generate_by_section(&self, request: &ProposalRequest) -> GeneratedProposal {
        let mut proposal = IndexMap::with_capacity(FALLBACK_SECTIONS.len());

        for section in FALLBACK_SECTIONS {
            let fields = PromptFields::new()
                .with("section", section)
                .with("instruction", fallback_instruction(section, request))
                .with("additional_context", &request.additional_context);

            let text = match self.llm.complete(&FALLBACK_SECTION.render(&fields), 0.6).await {
                Ok(text) => parser::plain_text(&text),
                Err(e) => {
                    log::warn!("Failed to write proposal section {}: {}", section, e);
                    format!("Error generating {}: {}", section, e)
                }
            };
            proposal.insert(section.to_string(), Value::String(text));
        }

        GeneratedProposal::complete(proposal)
    }

    pub async fn improve_proposal(&self, proposal_text: &str, feedback: &str) -> Result<ImprovedProposal> {
        require_non_empty(&[("proposal_text", proposal_text), ("feedback", feedback)])?;
        log_activity(
            self.name(),
            "improve_proposal",
            json!({ "feedback_length": feedback.chars().count() }),
        );

        let fields = PromptFields::new()
            .with("proposal_text", proposal_text)
            .with("feedback", feedback);
        let improved = self
            .llm
            .complete(&IMPROVE.render(&fields), 0.6)
            .await
            .map_err(|e| AgentError::from(e).context("Failed to improve proposal"))?;

        Ok(ImprovedProposal {
            improved_proposal: parser::plain_text(&improved),
            original_proposal: proposal_text.to_string(),
            feedback_applied: feedback.to_string(),
            improved_at: Utc::now(),
            status: "improved",
        })
    }

    pub async fn generate_section(
        &self,
        section: &str,
        context: &IndexMap<String, String>,
    ) -> Result<String> {
        if !PROPOSAL_SECTIONS.contains(&section) {
            return Err(AgentError::validation(format!("Invalid section: {}", section)));
        }
        log_activity(self.name(), "generate_section", json!({ "section": section }));

        let fields = PromptFields::new()
            .with("section", section)
            .with("instruction", section_instruction(section))
            .with("context", pretty(context));

        let text = self.llm.complete(&SECTION.render(&fields), 0.6).await?;
        Ok(parser::plain_text(&text))
    }

    /// Never fails once the proposal is non-empty; model or decode failures
    /// come back as [`ValidationOutcome::Failed`].
    pub async fn validate_proposal(&self, proposal: &Map<String, Value>) -> Result<ProposalValidation> {
        if proposal.is_empty() {
            return Err(AgentError::validation("proposal is required"));
        }
        log_activity(
            self.name(),
            "validate_proposal",
            json!({ "sections_count": proposal.len() }),
        );

        let fields = PromptFields::new().with("proposal", pretty(proposal));
        let validation = match self.llm.complete(&VALIDATE.render(&fields), 0.5).await {
            Ok(text) => match parser::decode::<ProposalReview>(&text) {
                Ok(review) => ValidationOutcome::Review(review),
                Err(e) => {
                    log::warn!("Could not parse proposal review: {}", e);
                    ValidationOutcome::Failed {
                        error: "Could not parse validation result".to_string(),
                    }
                }
            },
            Err(e) => ValidationOutcome::Failed {
                error: format!("Validation failed: {}", e),
            },
        };

        Ok(ProposalValidation {
            validation,
            validated_at: Utc::now(),
            proposal_sections: proposal.keys().cloned().collect(),
        })
    }

    /// Gateway failures are reported in the returned text.
    pub async fn generate_funding_justification(
        &self,
        proposal: &Map<String, Value>,
        funding_amount: Option<&str>,
    ) -> Result<String> {
        if proposal.is_empty() {
            return Err(AgentError::validation("proposal is required"));
        }
        let funding_amount = funding_amount
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .unwrap_or(DEFAULT_FUNDING_AMOUNT);
        log_activity(
            self.name(),
            "generate_funding_justification",
            json!({ "funding_amount": funding_amount }),
        );

        let fields = PromptFields::new()
            .with("proposal", pretty(proposal))
            .with("funding_amount", funding_amount);

        Ok(match self.llm.complete(&FUNDING.render(&fields), 0.7).await {
            Ok(text) => parser::plain_text(&text),
            Err(e) => format!("Error generating funding justification: {}", e),
        })
    }
}

impl ResearchAgent for ProposalAgent {
    fn key(&self) -> &'static str {
        "proposal"
    }

    fn name(&self) -> &'static str {
        "ProposalAgent"
    }

    fn description(&self) -> &'static str {
        "Automated Research Proposal Generator - Generates and improves research proposals"
    }

    fn capabilities(&self) -> &'static [&'static str] {
        &[
            "Generate complete research proposals",
            "Improve existing proposals with feedback",
            "Create proposal sections individually",
            "Validate proposal structure",
            "Generate funding justifications",
        ]
    }
}
