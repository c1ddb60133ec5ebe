use std::sync::Arc;

use actix_http::Request;
use actix_web::{
    dev::{Service, ServiceResponse},
    test, web, App, Error,
};
use research_agents::testing::{MissingMetadata, ScriptedGateway, StaticSearch, UnreachableSearch};
use research_agents::{InMemoryStore, Paper, PaperSearch};
use research_server::{app_config, AppState};
use serde_json::{json, Value};

async fn create_test_app_with(
    llm: ScriptedGateway,
    search: Arc<dyn PaperSearch>,
) -> (
    impl Service<Request, Response = ServiceResponse, Error = Error>,
    Arc<ScriptedGateway>,
) {
    let llm = Arc::new(llm);
    let state = AppState::new_with(
        llm.clone(),
        Arc::new(MissingMetadata),
        search,
        Arc::new(InMemoryStore::new()),
    )
    .expect("templates are valid");

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(app_config),
    )
    .await;
    (app, llm)
}

async fn create_test_app(
    llm: ScriptedGateway,
) -> (
    impl Service<Request, Response = ServiceResponse, Error = Error>,
    Arc<ScriptedGateway>,
) {
    create_test_app_with(llm, Arc::new(UnreachableSearch)).await
}

async fn post_json(
    app: &impl Service<Request, Response = ServiceResponse, Error = Error>,
    uri: &str,
    body: Value,
) -> (u16, Value) {
    let req = test::TestRequest::post().uri(uri).set_json(&body).to_request();
    let resp = test::call_service(app, req).await;
    let status = resp.status().as_u16();
    (status, test::read_body_json(resp).await)
}

async fn get_json(
    app: &impl Service<Request, Response = ServiceResponse, Error = Error>,
    uri: &str,
) -> (u16, Value) {
    let req = test::TestRequest::get().uri(uri).to_request();
    let resp = test::call_service(app, req).await;
    let status = resp.status().as_u16();
    (status, test::read_body_json(resp).await)
}

#[actix_web::test]
async fn test_health_lists_all_agents() {
    let (app, _) = create_test_app(ScriptedGateway::new()).await;

    let (status, body) = get_json(&app, "/health").await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "healthy");
    assert_eq!(
        body["agents"],
        json!(["citation", "literature", "collaboration", "data_extraction", "proposal"])
    );

    let (status, body) = get_json(&app, "/").await;
    assert_eq!(status, 200);
    assert_eq!(body["message"], "Agentic Research Assistant Suite API");
}

#[actix_web::test]
async fn test_agent_registry_describes_capabilities() {
    let (app, _) = create_test_app(ScriptedGateway::new()).await;

    let (status, body) = get_json(&app, "/api/agents").await;
    assert_eq!(status, 200);
    let agents = body["agents"].as_array().unwrap();
    assert_eq!(agents.len(), 5);
    assert_eq!(agents[0]["name"], "CitationAgent");
    assert!(agents
        .iter()
        .all(|a| !a["capabilities"].as_array().unwrap().is_empty()));
}

#[actix_web::test]
async fn test_citation_styles() {
    let (app, _) = create_test_app(ScriptedGateway::new()).await;

    let (status, body) = get_json(&app, "/api/citation/styles").await;
    assert_eq!(status, 200);
    assert_eq!(
        body["styles"],
        json!(["apa", "mla", "chicago", "harvard", "ieee", "vancouver", "ama"])
    );
}

#[actix_web::test]
async fn test_citation_from_url_defaults_to_apa() {
    let (app, llm) = create_test_app(ScriptedGateway::new().reply(" [Author]. (n.d.). [Title]. ")).await;

    let (status, body) = post_json(
        &app,
        "/api/citation/generate",
        json!({ "paper_url": "https://example.com/paper" }),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["citation"], "[Author]. (n.d.). [Title].");
    assert_eq!(body["style"], "apa");
    assert_eq!(llm.call_count(), 1);
}

#[actix_web::test]
async fn test_citation_failure_returns_500_detail() {
    let (app, _) = create_test_app(ScriptedGateway::new()).await;

    let (status, body) = post_json(
        &app,
        "/api/citation/generate",
        json!({ "paper_url": "https://doi.org/10.1038/nature14539", "citation_style": "mla" }),
    )
    .await;

    assert_eq!(status, 500);
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .starts_with("Failed to generate citation from DOI"));
}

#[actix_web::test]
async fn test_blank_required_field_returns_422() {
    let (app, llm) = create_test_app(ScriptedGateway::new()).await;

    let (status, body) = post_json(&app, "/api/citation/generate", json!({ "paper_url": "" })).await;
    assert_eq!(status, 422);
    assert_eq!(body["detail"], "paper_url is required");
    assert_eq!(llm.call_count(), 0);
}

#[actix_web::test]
async fn test_malformed_body_returns_422_detail() {
    let (app, _) = create_test_app(ScriptedGateway::new()).await;

    let (status, body) = post_json(
        &app,
        "/api/proposal/generate",
        json!({ "research_topic": "Soil" }),
    )
    .await;
    assert_eq!(status, 422);
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .starts_with("Invalid request body"));
}

#[actix_web::test]
async fn test_literature_search_falls_back_to_model() {
    let (app, llm) = create_test_app(ScriptedGateway::new().reply(
        r#"[{"title": "Q1"}, {"title": "Q2"}, {"title": "Q3"}, {"title": "Q4"}]"#,
    ))
    .await;

    let (status, body) = post_json(
        &app,
        "/api/literature/search",
        json!({ "topic": "quantum computing", "max_results": 3 }),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["topic"], "quantum computing");
    let papers = body["papers"].as_array().unwrap();
    assert_eq!(papers.len(), 3);
    assert!(papers.iter().all(|p| !p["title"].as_str().unwrap().is_empty()));
    assert_eq!(llm.call_count(), 1);
}

#[actix_web::test]
async fn test_literature_review_uses_search_results() {
    let papers = vec![Paper {
        title: "A survey of retrieval".to_string(),
        ..Paper::default()
    }];
    let (app, _) = create_test_app_with(
        ScriptedGateway::new()
            .reply("not an object")
            .reply("Retrieval is maturing."),
        Arc::new(StaticSearch(papers)),
    )
    .await;

    let (status, body) = post_json(
        &app,
        "/api/literature/review",
        json!({ "topic": "retrieval" }),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["papers"].as_array().unwrap().len(), 1);
    assert_eq!(body["categorized_papers"]["Review"].as_array().unwrap().len(), 1);
    assert_eq!(body["summary"], "Retrieval is maturing.");
}

#[actix_web::test]
async fn test_categorize_accepts_loose_paper_records() {
    let (app, _) = create_test_app(ScriptedGateway::new().reply(r#"{"Theory": [1]}"#)).await;

    let (status, body) = post_json(
        &app,
        "/api/literature/categorize",
        json!([
            { "title": "Empirical study", "authors": "A. One, B. Two", "year": 2020 },
            { "title": "A theory of mind", "citations": "12" }
        ]),
    )
    .await;

    assert_eq!(status, 200);
    let categorized = body["categorized_papers"].as_object().unwrap();
    assert_eq!(categorized.len(), 9);
    assert_eq!(categorized["Theory"][0]["title"], "A theory of mind");
}

#[actix_web::test]
async fn test_comment_and_ai_reply_flow() {
    let (app, _) = create_test_app(ScriptedGateway::new().reply("Thanks, consider a control group.")).await;

    let (status, body) = post_json(
        &app,
        "/api/collaboration/comment",
        json!({ "paper_id": "p-1", "comment": "Needs a control", "user_id": "alice" }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    let comment_id = body["comment_id"].as_str().unwrap().to_string();

    let (status, body) = get_json(&app, "/api/collaboration/comments/p-1").await;
    assert_eq!(status, 200);
    let comments = body["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0]["id"], comment_id.as_str());
    assert_eq!(comments[1]["user_id"], "ai_assistant");
    assert_eq!(comments[1]["is_ai"], true);
    assert_eq!(comments[1]["reply_to"], comment_id.as_str());
}

#[actix_web::test]
async fn test_comment_survives_reply_failure() {
    let (app, _) = create_test_app(ScriptedGateway::new().fail("down")).await;

    let (status, _) = post_json(
        &app,
        "/api/collaboration/comment",
        json!({ "paper_id": "p-1", "comment": "Looks good", "user_id": "bob" }),
    )
    .await;
    assert_eq!(status, 200);

    let (_, body) = get_json(&app, "/api/collaboration/comments/p-1").await;
    assert_eq!(body["comments"].as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn test_collaborator_is_added_once() {
    let (app, _) = create_test_app(ScriptedGateway::new()).await;
    let payload = json!({ "paper_id": "p-1", "user_id": "carol" });

    let (_, first) = post_json(&app, "/api/collaboration/collaborator", payload.clone()).await;
    let (_, second) = post_json(&app, "/api/collaboration/collaborator", payload).await;
    assert_eq!(first["success"], true);
    assert_eq!(second["success"], false);

    let (_, body) = get_json(&app, "/api/collaboration/collaborators/p-1").await;
    assert_eq!(body["collaborators"].as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn test_task_lifecycle() {
    let (app, _) = create_test_app(ScriptedGateway::new()).await;

    let (status, body) = post_json(
        &app,
        "/api/collaboration/task",
        json!({ "paper_id": "p-1", "title": "Draft intro", "assigned_to": "dan", "priority": "high" }),
    )
    .await;
    assert_eq!(status, 200);
    let task_id = body["task_id"].as_str().unwrap().to_string();

    let uri = format!("/api/collaboration/task/{}/status", task_id);
    let (status, body) = post_json(&app, &uri, json!({ "status": "completed" })).await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);

    let (status, _) = post_json(&app, &uri, json!({ "status": "done" })).await;
    assert_eq!(status, 422);

    let (_, body) = get_json(&app, "/api/collaboration/tasks/p-1").await;
    let tasks = body["tasks"].as_array().unwrap();
    assert_eq!(tasks[0]["status"], "completed");
    assert_eq!(tasks[0]["priority"], "high");
}

#[actix_web::test]
async fn test_versions_are_numbered() {
    let (app, _) = create_test_app(ScriptedGateway::new()).await;

    let (_, body) = get_json(&app, "/api/collaboration/versions/p-1/latest").await;
    assert!(body["version"].is_null());

    for content in ["first", "second"] {
        let (status, _) = post_json(
            &app,
            "/api/collaboration/version",
            json!({ "paper_id": "p-1", "content": content, "user_id": "alice" }),
        )
        .await;
        assert_eq!(status, 200);
    }

    let (_, body) = get_json(&app, "/api/collaboration/versions/p-1/latest").await;
    assert_eq!(body["version"]["version_number"], 2);
    assert_eq!(body["version"]["content"], "second");
}

#[actix_web::test]
async fn test_statistics_extraction_fallback() {
    let (app, _) = create_test_app(ScriptedGateway::new().reply("```json\n{broken")).await;

    let (status, body) = post_json(
        &app,
        "/api/data/extract",
        json!({ "file_content": "A cohort of n = 42 patients.", "extraction_type": "statistics" }),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["extracted_data"]["extraction_type"], "statistics");
    assert_eq!(body["extracted_data"]["data"]["sample_sizes"], json!(["42"]));
}

#[actix_web::test]
async fn test_visualization_stub() {
    let (app, llm) = create_test_app(ScriptedGateway::new()).await;

    let (status, body) = post_json(
        &app,
        "/api/data/visualize",
        json!({ "data": { "tables": [{}, {}] } }),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["visualization"]["visualization_type"], "bar");
    assert_eq!(body["visualization"]["table_count"], 2);
    assert_eq!(llm.call_count(), 0);
}

#[actix_web::test]
async fn test_proposal_generation() {
    let (app, _) = create_test_app(
        ScriptedGateway::new().reply(r#"{"title": "Soil and tillage", "abstract": "We study soil."}"#),
    )
    .await;

    let (status, body) = post_json(
        &app,
        "/api/proposal/generate",
        json!({
            "research_topic": "Soil",
            "research_question": "Does tillage matter?",
            "methodology": "Field trials",
            "expected_outcomes": "Guidance"
        }),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["proposal"]["sections_completed"], 2);
    assert_eq!(body["proposal"]["status"], "complete");
    assert_eq!(body["proposal"]["proposal"]["title"], "Soil and tillage");
}

#[actix_web::test]
async fn test_proposal_blank_field_is_rejected() {
    let (app, llm) = create_test_app(ScriptedGateway::new()).await;

    let (status, body) = post_json(
        &app,
        "/api/proposal/generate",
        json!({
            "research_topic": "Soil",
            "research_question": "",
            "methodology": "Field trials",
            "expected_outcomes": ""
        }),
    )
    .await;

    assert_eq!(status, 422);
    assert_eq!(body["detail"], "research_question, expected_outcomes are required");
    assert_eq!(llm.call_count(), 0);
}

#[actix_web::test]
async fn test_proposal_improve_and_section() {
    let (app, _) = create_test_app(ScriptedGateway::new().reply("Improved text")).await;

    let (status, body) = post_json(
        &app,
        "/api/proposal/improve",
        json!({ "proposal_text": "Old", "feedback": "Be specific" }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["improved_proposal"]["improved_proposal"], "Improved text");
    assert_eq!(body["improved_proposal"]["status"], "improved");

    let (status, body) = post_json(
        &app,
        "/api/proposal/section",
        json!({ "section": "discussion", "context": { "topic": "Soil" } }),
    )
    .await;
    assert_eq!(status, 422);
    assert_eq!(body["detail"], "Invalid section: discussion");
}

#[actix_web::test]
async fn test_proposal_validation_and_funding() {
    let (app, _) = create_test_app(
        ScriptedGateway::new()
            .reply(r#"{"overall_score": 0, "missing_sections": ["budget"], "is_ready": false}"#)
            .fail("down"),
    )
    .await;
    let proposal = json!({ "title": "Soil", "abstract": "..." });

    let (status, body) = post_json(
        &app,
        "/api/proposal/validate",
        json!({ "proposal": proposal }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["validation"]["overall_score"], 1);
    assert_eq!(body["proposal_sections"], json!(["abstract", "title"]));

    let (status, body) = post_json(
        &app,
        "/api/proposal/funding-justification",
        json!({ "proposal": proposal }),
    )
    .await;
    assert_eq!(status, 200);
    assert!(body["funding_justification"]
        .as_str()
        .unwrap()
        .starts_with("Error generating funding justification"));
}
