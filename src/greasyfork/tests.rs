use chrono::DateTime;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;

fn script() -> ScriptId {
    ScriptId::new(12345).unwrap()
}

fn config_for(server: &MockServer) -> MigrationConfig {
    MigrationConfig {
        base_url: server.uri(),
        ..MigrationConfig::default()
    }
}

fn entry(seq: u64, tag: &str, date: &str, note: &str) -> String {
    format!(
        r#"<li>
  <input type="radio" name="v1" value="{seq}">
  <input type="radio" name="v2" value="{seq}">
  <a rel="nofollow" href="/en/scripts/12345-demo?version={seq}">{tag}</a>
  <time datetime="{date}">x</time>
  by <a href="/en/users/9-carol">carol</a>
  - {note}
</li>"#
    )
}

fn page(entries: &[String], next: Option<&str>) -> String {
    let mut html = format!("<ul class=\"history_versions\">{}</ul>", entries.join("\n"));
    if let Some(href) = next {
        html.push_str(&format!(r#"<div class="pagination"><a class="next_page" rel="next" href="{href}">Next</a></div>"#));
    }
    html
}

fn descriptor(seq: u64) -> VersionDescriptor {
    VersionDescriptor {
        seq,
        tag: "1.0".to_string(),
        timestamp: DateTime::parse_from_rfc3339("2020-01-01T00:00:00Z").unwrap(),
        author: "carol".to_string(),
        note: None,
    }
}

#[test]
fn test_urls() {
    let config = MigrationConfig::default();
    let client = GreasyForkClient::new(&config).unwrap();
    assert_eq!(
        client.homepage_url(script()).unwrap().as_str(),
        "https://greasyfork.org/en/scripts/12345"
    );
    assert_eq!(
        client.history_url(script()).unwrap().as_str(),
        "https://greasyfork.org/en/scripts/12345/versions?show_all_versions=1"
    );
    assert_eq!(
        client.code_url(script(), 678).unwrap().as_str(),
        "https://greasyfork.org/scripts/12345/code/code.js?version=678"
    );

    let config = MigrationConfig {
        all_versions: false,
        ..MigrationConfig::default()
    };
    let client = GreasyForkClient::new(&config).unwrap();
    assert_eq!(
        client.history_url(script()).unwrap().as_str(),
        "https://greasyfork.org/en/scripts/12345/versions"
    );
}

#[tokio::test]
async fn test_list_versions_normalizes_newest_first() {
    let server = MockServer::start().await;
    let body = page(
        &[
            entry(300, "1.2", "2020-03-01T00:00:00+00:00", "third"),
            entry(120, "1.1", "2020-02-01T00:00:00+00:00", "second"),
            entry(7, "1.0", "2020-01-01T00:00:00+00:00", "first"),
        ],
        None,
    );
    Mock::given(method("GET"))
        .and(path("/en/scripts/12345/versions"))
        .and(query_param("show_all_versions", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html"))
        .expect(1)
        .mount(&server)
        .await;

    let client = GreasyForkClient::new(&config_for(&server)).unwrap();
    let history = client.list_versions(script()).await.unwrap();

    assert_eq!(history.seqs().collect::<Vec<_>>(), vec![7, 120, 300]);
    let versions: Vec<VersionDescriptor> = history.into_iter().collect();
    assert_eq!(versions[0].note.as_deref(), Some("first"));
    assert_eq!(versions[2].tag, "1.2");
    assert!(versions.iter().all(|v| v.author == "carol"));
}

#[tokio::test]
async fn test_list_versions_follows_pagination() {
    let server = MockServer::start().await;
    let page1 = page(
        &[
            entry(50, "3.0", "2021-03-01T00:00:00Z", "c"),
            entry(40, "2.0", "2021-02-01T00:00:00Z", "b"),
        ],
        Some("/en/scripts/12345/versions?page=2&amp;show_all_versions=1"),
    );
    let page2 = page(
        &[entry(30, "1.5", "2021-01-15T00:00:00Z", "a2")],
        Some("/en/scripts/12345/versions?page=3&amp;show_all_versions=1"),
    );
    let page3 = page(&[entry(3, "1.0", "2021-01-01T00:00:00Z", "a")], None);

    for (number, body) in [("2", page2), ("3", page3)] {
        Mock::given(method("GET"))
            .and(path("/en/scripts/12345/versions"))
            .and(query_param("page", number))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html"))
            .with_priority(1)
            .expect(1)
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/en/scripts/12345/versions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(page1, "text/html"))
        .expect(1)
        .mount(&server)
        .await;

    let client = GreasyForkClient::new(&config_for(&server)).unwrap();
    let history = client.list_versions(script()).await.unwrap();
    assert_eq!(history.seqs().collect::<Vec<_>>(), vec![3, 30, 40, 50]);
}

#[tokio::test]
async fn test_list_versions_page_cap() {
    let server = MockServer::start().await;
    // every page links to itself
    let looping = page(
        &[entry(1, "1.0", "2021-01-01T00:00:00Z", "a")],
        Some("/en/scripts/12345/versions"),
    );
    Mock::given(method("GET"))
        .and(path("/en/scripts/12345/versions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(looping, "text/html"))
        .mount(&server)
        .await;

    let config = MigrationConfig {
        max_pages: 3,
        ..config_for(&server)
    };
    let client = GreasyForkClient::new(&config).unwrap();
    let err = client.list_versions(script()).await.unwrap_err();
    assert!(matches!(err, SourceError::Parse(_)), "{err}");
}

#[tokio::test]
async fn test_list_versions_duplicate_across_pages() {
    let server = MockServer::start().await;
    let page1 = page(
        &[entry(5, "1.1", "2021-02-01T00:00:00Z", "b")],
        Some("/en/scripts/12345/versions?page=2"),
    );
    let page2 = page(&[entry(5, "1.1", "2021-02-01T00:00:00Z", "b")], None);
    Mock::given(method("GET"))
        .and(path("/en/scripts/12345/versions"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(page2, "text/html"))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/en/scripts/12345/versions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(page1, "text/html"))
        .mount(&server)
        .await;

    let client = GreasyForkClient::new(&config_for(&server)).unwrap();
    let err = client.list_versions(script()).await.unwrap_err();
    assert!(matches!(err, SourceError::Parse(_)));
}

#[tokio::test]
async fn test_list_versions_single_version() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/en/scripts/12345/versions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            page(&[entry(1, "0.1", "2019-05-05T05:05:05Z", "initial")], None),
            "text/html",
        ))
        .mount(&server)
        .await;

    let client = GreasyForkClient::new(&config_for(&server)).unwrap();
    let history = client.list_versions(script()).await.unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn test_list_versions_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = GreasyForkClient::new(&config_for(&server)).unwrap();
    let err = client.list_versions(script()).await.unwrap_err();
    assert!(matches!(err, SourceError::NotFound(_)));
}

#[tokio::test]
async fn test_list_versions_markup_drift() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/en/scripts/12345/versions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html><body><div class=\"new-layout\">v1</div></body></html>", "text/html"),
        )
        .mount(&server)
        .await;

    let client = GreasyForkClient::new(&config_for(&server)).unwrap();
    let err = client.list_versions(script()).await.unwrap_err();
    assert!(matches!(err, SourceError::Parse(_)));
}

#[tokio::test]
async fn test_server_error_is_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = GreasyForkClient::new(&config_for(&server)).unwrap();
    let err = client.list_versions(script()).await.unwrap_err();
    assert!(matches!(err, SourceError::Network(_)));
}

#[tokio::test]
async fn test_unreachable_host_is_network_error() {
    let config = MigrationConfig {
        base_url: "http://127.0.0.1:1".to_string(),
        timeout_secs: 5,
        ..MigrationConfig::default()
    };
    let client = GreasyForkClient::new(&config).unwrap();
    let err = client.list_versions(script()).await.unwrap_err();
    assert!(matches!(err, SourceError::Network(_)));
}

#[tokio::test]
async fn test_author_fallback_uses_homepage() {
    let server = MockServer::start().await;
    let body = r#"<ul><li><a href="/en/scripts/12345-demo?version=2">1.0</a>
<time datetime="2020-01-01T00:00:00Z">x</time></li></ul>"#;
    Mock::given(method("GET"))
        .and(path("/en/scripts/12345/versions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/en/scripts/12345"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<link rel="canonical" href="https://greasyfork.org/en/scripts/12345-demo">
<header><h2>Demo</h2></header>
<dd class="script-show-author"><a href="/en/users/1-dave">dave</a></dd>"#,
            "text/html",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let client = GreasyForkClient::new(&config_for(&server)).unwrap();
    let history = client.list_versions(script()).await.unwrap();
    assert_eq!(history.first().unwrap().author, "dave");
}

#[tokio::test]
async fn test_fetch_content_raw() {
    let server = MockServer::start().await;
    let code = "// ==UserScript==\n// @name Demo\n// ==/UserScript==\nconsole.log('&amp;');\n";
    Mock::given(method("GET"))
        .and(path("/scripts/12345/code/code.js"))
        .and(query_param("version", "77"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(code, "application/javascript"))
        .expect(1)
        .mount(&server)
        .await;

    let client = GreasyForkClient::new(&config_for(&server)).unwrap();
    let content = client.fetch_content(script(), &descriptor(77)).await.unwrap();
    assert_eq!(content.seq, 77);
    assert_eq!(content.text, code);
}

#[tokio::test]
async fn test_fetch_content_from_rendered_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/scripts/12345/code/code.js"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "<!DOCTYPE html><html><pre class=\"lang-js\">a &lt; b &amp;&amp; c</pre></html>",
            "text/html",
        ))
        .mount(&server)
        .await;

    let client = GreasyForkClient::new(&config_for(&server)).unwrap();
    let content = client.fetch_content(script(), &descriptor(1)).await.unwrap();
    assert_eq!(content.text, "a < b && c");
}

#[tokio::test]
async fn test_fetch_deleted_version() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/scripts/12345/code/code.js"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = GreasyForkClient::new(&config_for(&server)).unwrap();
    let err = client.fetch_content(script(), &descriptor(9)).await.unwrap_err();
    assert!(matches!(err, SourceError::NotFound(_)));
}

#[tokio::test]
async fn test_fetch_metadata() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/en/scripts/12345"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<link rel="canonical" href="https://greasyfork.org/en/scripts/12345-demo-script">
<header><h2>Demo Script</h2><p id="script-description">Hello</p></header>"#,
            "text/html",
        ))
        .mount(&server)
        .await;

    let client = GreasyForkClient::new(&config_for(&server)).unwrap();
    let meta = client.fetch_metadata(script()).await.unwrap();
    assert_eq!(meta.name, "Demo Script");
    assert_eq!(meta.description, "Hello");
    assert_eq!(meta.slug, "demo-script");
    assert_eq!(meta.author, None);
}

#[tokio::test]
async fn test_invalid_script_id_makes_no_request() {
    let server = MockServer::start().await;
    let _client = GreasyForkClient::new(&config_for(&server)).unwrap();

    for raw in ["", "abc", "0", "https://greasyfork.org/en/users/12"] {
        let err = raw.parse::<ScriptId>().unwrap_err();
        assert!(matches!(err, SourceError::InvalidScriptId(_)), "{raw}");
    }
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_homepage_is_fetched_once() {
    let server = MockServer::start().await;
    let body = r#"<ul><li><a href="/en/scripts/12345-demo?version=2">1.0</a>
<time datetime="2020-01-01T00:00:00Z">x</time> - no author link</li></ul>"#;
    Mock::given(method("GET"))
        .and(path("/en/scripts/12345/versions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/en/scripts/12345"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<link rel="canonical" href="https://greasyfork.org/en/scripts/12345-demo">
<header><h2>Demo</h2></header>
<dd class="script-show-author"><a href="/en/users/1-dave">dave</a></dd>"#,
            "text/html",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let client = GreasyForkClient::new(&config_for(&server)).unwrap();
    let meta = client.fetch_metadata(script()).await.unwrap();
    assert_eq!(meta.author.as_deref(), Some("dave"));

    let history = client.list_versions(script()).await.unwrap();
    assert_eq!(history.first().unwrap().author, "dave");
    assert_eq!(client.fetch_metadata(script()).await.unwrap(), meta);
}
