//! End-to-end pipeline tests: scrape, enrichment, and Notion registration
//! all served by one mock server.

use notion_web_clipper::config::Config;
use notion_web_clipper::pipeline::Pipeline;
use serde_json::Value;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Test config with every endpoint pointed at the mock server and a tag
/// allow-list on disk.
fn pipeline_config(mock_server: &MockServer, temp_dir: &TempDir, with_llm: bool) -> Config {
    let tags_file = temp_dir.path().join("tags.txt");
    std::fs::write(&tags_file, "ゲーム\nAI\nビジネス\n").expect("write tags");

    Config {
        firecrawl_api_key: Some("fc-test".to_string()),
        firecrawl_api_url: mock_server.uri(),
        openai_api_key: with_llm.then(|| "sk-test".to_string()),
        openai_api_url: mock_server.uri(),
        notion_api_url: mock_server.uri(),
        tags_file,
        ..Config::for_testing()
    }
}

fn json_response(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "application/json")
}

fn chat_reply(content: &str) -> ResponseTemplate {
    json_response(&format!(
        r#"{{"choices": [{{"message": {{"role": "assistant", "content": "{content}"}}}}]}}"#
    ))
}

async fn mount_scrape(mock_server: &MockServer, title: &str, markdown: &str) {
    Mock::given(method("POST"))
        .and(path("/v2/scrape"))
        .and(header("Authorization", "Bearer fc-test"))
        .respond_with(json_response(&format!(
            r#"{{
                "success": true,
                "data": {{
                    "markdown": "{markdown}",
                    "metadata": {{"title": "{title}"}}
                }}
            }}"#
        )))
        .mount(mock_server)
        .await;
}

async fn mount_notion(mock_server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/pages"))
        .respond_with(json_response(
            r#"{"id": "page-abc", "url": "https://www.notion.so/page-abc"}"#,
        ))
        .mount(mock_server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/blocks/page-abc/children"))
        .respond_with(json_response("{}"))
        .mount(mock_server)
        .await;
}

async fn requests_to(mock_server: &MockServer, url_path: &str) -> Vec<Value> {
    mock_server
        .received_requests()
        .await
        .expect("request recording enabled")
        .iter()
        .filter(|r| r.url.path() == url_path)
        .map(|r| serde_json::from_slice(&r.body).expect("JSON body"))
        .collect()
}

#[tokio::test]
async fn test_generic_page_clip_with_enrichment() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("temp dir");

    mount_scrape(
        &mock_server,
        "The Future of Gaming",
        "Game industry analysis.",
    )
    .await;
    mount_notion(&mock_server).await;

    // Translation and tag prediction hit the same endpoint; the prompts
    // tell them apart.
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("以下のタイトルを翻訳してください"))
        .respond_with(chat_reply("ゲームの未来"))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("最適なタグ"))
        .respond_with(chat_reply("ゲーム, AI, 未知のタグ"))
        .mount(&mock_server)
        .await;

    let config = pipeline_config(&mock_server, &temp_dir, true);
    let pipeline = Pipeline::from_config(&config).expect("pipeline");

    let outcome = pipeline
        .process_url("https://example.com/article")
        .await
        .expect("clip");

    assert_eq!(outcome.handler, "generic");
    assert_eq!(outcome.title, "ゲームの未来 (原題: The Future of Gaming)");
    assert_eq!(outcome.page_url, "https://www.notion.so/page-abc");

    let creates = requests_to(&mock_server, "/pages").await;
    assert_eq!(creates.len(), 1);
    let properties = &creates[0]["properties"];
    assert_eq!(
        properties["タイトル"]["title"][0]["text"]["content"],
        "ゲームの未来 (原題: The Future of Gaming)"
    );
    assert_eq!(properties["URL"]["url"], "https://example.com/article");
    // The invented tag is filtered out by the allow-list.
    assert_eq!(
        properties["タグ"]["multi_select"],
        serde_json::json!([{"name": "ゲーム"}, {"name": "AI"}])
    );
}

#[tokio::test]
async fn test_clip_without_llm_skips_enrichment() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("temp dir");

    mount_scrape(&mock_server, "Plain English Title", "Some body text.").await;
    mount_notion(&mock_server).await;

    let config = pipeline_config(&mock_server, &temp_dir, false);
    let pipeline = Pipeline::from_config(&config).expect("pipeline");

    let outcome = pipeline
        .process_url("https://example.com/plain")
        .await
        .expect("clip");

    assert_eq!(outcome.title, "Plain English Title");

    let creates = requests_to(&mock_server, "/pages").await;
    let properties = creates[0]["properties"].as_object().expect("properties");
    assert!(!properties.contains_key("タグ"));
    assert!(requests_to(&mock_server, "/chat/completions").await.is_empty());
}

#[tokio::test]
async fn test_japanese_title_not_translated() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("temp dir");

    mount_scrape(&mock_server, "日本語のタイトルの記事", "本文です。").await;
    mount_notion(&mock_server).await;
    // Tag prediction still runs; translation must not.
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(chat_reply("ゲーム"))
        .mount(&mock_server)
        .await;

    let config = pipeline_config(&mock_server, &temp_dir, true);
    let pipeline = Pipeline::from_config(&config).expect("pipeline");

    let outcome = pipeline
        .process_url("https://example.com/ja")
        .await
        .expect("clip");

    assert_eq!(outcome.title, "日本語のタイトルの記事");

    let chats = requests_to(&mock_server, "/chat/completions").await;
    assert_eq!(chats.len(), 1);
    let body = serde_json::to_string(&chats[0]).expect("serialize");
    assert!(!body.contains("翻訳してください"));
}

#[tokio::test]
async fn test_translation_failure_keeps_original_title() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("temp dir");

    mount_scrape(&mock_server, "Resilient Title", "Body.").await;
    mount_notion(&mock_server).await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("以下のタイトルを翻訳してください"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("最適なタグ"))
        .respond_with(chat_reply("AI"))
        .mount(&mock_server)
        .await;

    let config = pipeline_config(&mock_server, &temp_dir, true);
    let pipeline = Pipeline::from_config(&config).expect("pipeline");

    let outcome = pipeline
        .process_url("https://example.com/resilient")
        .await
        .expect("enrichment failures never fail the clip");

    assert_eq!(outcome.title, "Resilient Title");
    let creates = requests_to(&mock_server, "/pages").await;
    assert_eq!(
        creates[0]["properties"]["タグ"]["multi_select"],
        serde_json::json!([{"name": "AI"}])
    );
}

#[tokio::test]
async fn test_scrape_failure_reaches_caller_and_skips_notion() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("temp dir");

    Mock::given(method("POST"))
        .and(path("/v2/scrape"))
        .respond_with(json_response(
            r#"{"success": false, "error": "site unreachable"}"#,
        ))
        .mount(&mock_server)
        .await;

    let config = pipeline_config(&mock_server, &temp_dir, false);
    let pipeline = Pipeline::from_config(&config).expect("pipeline");

    let err = pipeline
        .process_url("https://example.com/down")
        .await
        .expect_err("scrape failure propagates");
    assert!(format!("{err:#}").contains("site unreachable"));
    assert!(requests_to(&mock_server, "/pages").await.is_empty());
}

#[tokio::test]
async fn test_unsupported_scheme_has_no_handler() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("temp dir");

    let config = pipeline_config(&mock_server, &temp_dir, false);
    let pipeline = Pipeline::from_config(&config).expect("pipeline");

    let err = pipeline
        .process_url("ftp://example.com/file")
        .await
        .expect_err("no handler for ftp");
    assert!(format!("{err:#}").contains("No handler"));
}

#[tokio::test]
async fn test_x_post_url_routes_to_post_handler() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("temp dir");

    Mock::given(method("GET"))
        .and(path("/someone/status/5"))
        .respond_with(json_response(
            r#"{
                "tweet": {
                    "text": "ポストの本文です",
                    "author": {"name": "Some One", "screen_name": "someone"},
                    "url": "https://x.com/someone/status/5"
                }
            }"#,
        ))
        .mount(&mock_server)
        .await;
    mount_notion(&mock_server).await;

    let config = Config {
        mirror_api_url: mock_server.uri(),
        ..pipeline_config(&mock_server, &temp_dir, false)
    };
    let pipeline = Pipeline::from_config(&config).expect("pipeline");

    let outcome = pipeline
        .process_url("https://twitter.com/someone/status/5")
        .await
        .expect("clip");

    assert_eq!(outcome.handler, "x-post");
    assert_eq!(outcome.title, "@someone: ポストの本文です");

    // The canonical URL, not the legacy share link, lands in the property.
    let creates = requests_to(&mock_server, "/pages").await;
    assert_eq!(
        creates[0]["properties"]["URL"]["url"],
        "https://x.com/someone/status/5"
    );
}
