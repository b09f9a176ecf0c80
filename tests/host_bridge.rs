//! End-to-end tests for the NDJSON host bridge against a mocked registry.

use npa::config::ApiConfig;
use npa::host::contract::{CommandEnvelope, CommandName, ResponseEnvelope};
use npa::host::handler::CommandHandler;
use npa::host::stdio::serve;
use npa::pravo::PravoStore;
use npa_search::{NpaSearcher, RetryPolicy, SearchConfig};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn registry() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/Documents"))
        .and(query_param("Number", "1490"))
        .and(query_param("NumberSearchType", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{
                "id": "b2",
                "number": "1490",
                "name": "Об утверждении Правил оказания платных образовательных услуг",
                "complexName": "Постановление Правительства Российской Федерации от 15.09.2020 № 1490",
                "eoNumber": "0001202009250006",
                "viewDate": "25.09.2020"
            }],
            "itemsTotalCount": 1
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/Documents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/file/pdf"))
        .and(query_param("eoNumber", "0001202009250006"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.4 test".to_vec()))
        .mount(&server)
        .await;
    server
}

fn handler(server: &MockServer) -> CommandHandler<PravoStore> {
    let api = ApiConfig {
        base_url: format!("{}/api", server.uri()),
        file_base_url: server.uri(),
        ..Default::default()
    };
    let config = SearchConfig {
        request_delay_ms: 0,
        retry: RetryPolicy::no_retry(),
        ..Default::default()
    };
    let store = PravoStore::new(&api, &config).expect("store");
    CommandHandler::new(NpaSearcher::new(store, config).expect("searcher"))
}

fn line(envelope: &CommandEnvelope) -> String {
    let mut s = serde_json::to_string(envelope).expect("serialize");
    s.push('\n');
    s
}

async fn session(server: &MockServer, commands: &[CommandEnvelope]) -> Vec<ResponseEnvelope> {
    let input: String = commands.iter().map(line).collect();
    let mut output = Vec::new();
    serve(&handler(server), input.as_bytes(), &mut output)
        .await
        .expect("serve");
    String::from_utf8(output)
        .expect("utf8")
        .lines()
        .map(|l| serde_json::from_str(l).expect("response"))
        .collect()
}

#[tokio::test]
async fn search_then_download_then_stop() {
    let server = registry().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let target = dir.path().join("1490.pdf");

    let descriptor = json!({
        "type": "Постановление",
        "number": "№ 1490",
        "title": "Об утверждении Правил оказания платных образовательных услуг"
    });
    let responses = session(
        &server,
        &[
            CommandEnvelope::new("1", CommandName::SearchRun, descriptor),
            CommandEnvelope::new(
                "2",
                CommandName::DocumentDownload,
                json!({
                    "candidate": {"id": "b2", "number": "1490", "eoNumber": "0001202009250006"},
                    "path": target,
                }),
            ),
            CommandEnvelope::new("3", CommandName::SearchStats, json!(null)),
            CommandEnvelope::new("4", CommandName::HostStop, json!(null)),
        ],
    )
    .await;

    assert_eq!(responses.len(), 4);
    assert!(responses.iter().all(|r| r.ok), "{responses:?}");

    let results = responses[0].payload["results"].as_array().expect("results");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["eoNumber"], "0001202009250006");
    // clean exact + three title words + 2020
    assert_eq!(results[0]["score"], 7000 + 3000 + 50);

    assert_eq!(responses[1].payload["bytes"], 13);
    assert_eq!(std::fs::read(&target).expect("pdf"), b"%PDF-1.4 test");

    assert_eq!(responses[2].payload["totalSearches"], 1);
    assert_eq!(responses[2].payload["successfulSearches"], 1);
    assert_eq!(responses[3].payload["stopping"], true);
}

#[tokio::test]
async fn failures_are_reported_per_command() {
    let server = registry().await;
    let responses = session(
        &server,
        &[
            CommandEnvelope::new("bad", CommandName::SearchRun, json!({"type": "ФЗ", "number": "1"})),
            CommandEnvelope::new(
                "missing",
                CommandName::DocumentDownload,
                json!({"candidate": {"id": "x", "eoNumber": "0000"}, "path": "/tmp/never.pdf"}),
            ),
            CommandEnvelope::new("after", CommandName::SearchStats, json!(null)),
        ],
    )
    .await;

    assert_eq!(responses.len(), 3);
    assert!(!responses[0].ok);
    assert!(
        responses[0]
            .error
            .as_deref()
            .expect("error")
            .starts_with("invalid document descriptor")
    );
    assert!(!responses[1].ok);
    assert!(
        responses[1]
            .error
            .as_deref()
            .expect("error")
            .starts_with("document not found")
    );
    assert!(responses[2].ok);
    assert_eq!(responses[2].payload["totalSearches"], 0);
}
