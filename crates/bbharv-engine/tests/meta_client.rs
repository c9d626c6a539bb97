//! Integration tests for `MetaClient::fetch_post_meta`.
//!
//! Uses `wiremock` to stand up a local HTTP server per test so no real
//! network traffic is made. Covers the gone/blinded classification (4xx and
//! marker-less 200s), header forwarding, and retry behavior on 5xx.

use bbharv_core::{Comment, PostId, PostMeta};
use scraper::Html;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bbharv_engine::sites::{ListingMode, PostHeader, Site};
use bbharv_engine::walker::{Extracted, NextProbe, PagedFlow};
use bbharv_engine::{AdmissionPolicy, EngineError, MetaClient, MetaFetch};

/// Minimal direct-item site whose URLs point at the mock server.
struct TestSite {
    base: String,
    comments: NoComments,
}

impl TestSite {
    fn new(base: &str) -> Self {
        Self {
            base: base.to_string(),
            comments: NoComments,
        }
    }
}

impl Site for TestSite {
    fn slug(&self) -> &'static str {
        "testboard"
    }

    fn listing(&self) -> ListingMode {
        ListingMode::DirectItem
    }

    fn default_policy(&self) -> AdmissionPolicy {
        AdmissionPolicy::Fixed(0)
    }

    fn headers(&self) -> Vec<(&'static str, &'static str)> {
        vec![("Referer", "https://testboard.example/")]
    }

    fn item_url(&self, id: PostId) -> String {
        format!("{}/board/view/{id}", self.base)
    }

    fn meta(&self, html: &str, id: PostId, final_url: &str) -> Option<PostMeta> {
        let doc = Html::parse_document(html);
        let head_sel = scraper::Selector::parse("div.head").unwrap();
        let head = doc.select(&head_sel).next()?;

        let text = |sel: &str| {
            let sel = scraper::Selector::parse(sel).unwrap();
            head.select(&sel)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
        };

        Some(PostMeta {
            id,
            url: final_url.to_string(),
            title: text("h1")?,
            author: text("span.nick")?,
            author_ip: None,
            date: text("span.date")?,
        })
    }

    fn detail_ready_selector(&self) -> &'static str {
        "div.head"
    }

    fn post_header(&self, _doc: &Html) -> Result<PostHeader, EngineError> {
        Err(EngineError::Extract {
            context: "testboard".to_string(),
            reason: "not used in these tests".to_string(),
        })
    }

    fn comment_flow(&self) -> &dyn PagedFlow<Comment> {
        &self.comments
    }
}

struct NoComments;

impl PagedFlow<Comment> for NoComments {
    fn extract(&self, _doc: &Html) -> Extracted<Comment> {
        Extracted::default()
    }

    fn marker(&self, _doc: &Html) -> Option<String> {
        None
    }

    fn next(&self, _doc: &Html) -> NextProbe {
        NextProbe::End
    }
}

fn post_html() -> String {
    "<div class='head'><h1>게시글 제목</h1>\
     <span class='nick'>작성자</span>\
     <span class='date'>2025.05.26</span></div>"
        .to_string()
}

fn client() -> MetaClient {
    MetaClient::new(5, "bbharv-test/0.1", 0, 0).expect("failed to build MetaClient")
}

fn client_with_retries(max_retries: u32) -> MetaClient {
    MetaClient::new(5, "bbharv-test/0.1", max_retries, 0).expect("failed to build MetaClient")
}

#[tokio::test]
async fn success_with_markers_yields_meta() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/board/view/42"))
        .and(header("Referer", "https://testboard.example/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(post_html()))
        .mount(&server)
        .await;

    let site = TestSite::new(&server.uri());
    let result = client().fetch_post_meta(&site, 42).await;

    let meta = result.unwrap().expect("expected Some(meta)");
    assert_eq!(meta.id, 42);
    assert_eq!(meta.title, "게시글 제목");
    assert_eq!(meta.author, "작성자");
}

#[tokio::test]
async fn markers_absent_on_success_reads_as_gone() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/board/view/7"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<html><body>삭제된 게시물입니다</body></html>"),
        )
        .mount(&server)
        .await;

    let site = TestSite::new(&server.uri());
    let result = client().fetch_post_meta(&site, 7).await;
    assert!(result.unwrap().is_none(), "marker-less page must read as gone");
}

#[tokio::test]
async fn not_found_reads_as_gone_without_retrying() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/board/view/8"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let site = TestSite::new(&server.uri());
    let result = client_with_retries(3).fetch_post_meta(&site, 8).await;
    assert!(result.unwrap().is_none(), "404 must read as gone, not error");
}

#[tokio::test]
async fn server_error_is_retried_then_succeeds() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/board/view/9"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/board/view/9"))
        .respond_with(ResponseTemplate::new(200).set_body_string(post_html()))
        .mount(&server)
        .await;

    let site = TestSite::new(&server.uri());
    let result = client_with_retries(1).fetch_post_meta(&site, 9).await;
    assert!(result.unwrap().is_some(), "expected recovery after one 503");
}

#[tokio::test]
async fn server_error_exhausts_retries_and_propagates() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/board/view/10"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2) // 1 initial + 1 retry
        .mount(&server)
        .await;

    let site = TestSite::new(&server.uri());
    let result = client_with_retries(1).fetch_post_meta(&site, 10).await;
    assert!(matches!(
        result,
        Err(EngineError::UnexpectedStatus { status: 503, .. })
    ));
}
