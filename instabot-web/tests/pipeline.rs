mod common;

use common::{ARTICLE_HTML, CountingReader, FakeBrowser, Route, eventually};
use futures::future::join_all;
use instabot_drivers::instabot_browser::session::IdlePolicy;
use instabot_web::{
    ArticleExtractor, ContentExtractor, ErrorKind, ExtractionOptions, Readability,
};
use std::{
    sync::{Arc, atomic::Ordering},
    time::{Duration, Instant},
};

const ARTICLE_URL: &str = "https://blog.example.com/posts/small-batches";
const MISSING_URL: &str = "https://blog.example.com/missing";
const HANGING_URL: &str = "https://slow.example.com/";
const PDF_URL: &str = "https://blog.example.com/menu.pdf";
const HELLO_URL: &str = "https://hello.example.com/";
const BROKEN_URL: &str = "https://broken.example.com/";
const FROZEN_URL: &str = "https://frozen.example.com/";

const PARAGRAPHS: [&str; 4] = [
    "For most of our first decade we roasted in large drums, twelve kilos at a time, because that was what the equipment we inherited was built for and because it kept the schedule simple for a very small team.",
    "Last spring we switched to a three kilo roaster, and the difference in the cup surprised even the people who had pushed for it. Lighter roasts kept their acidity, and the washed Ethiopian lots finally tasted like the cupping notes we had been printing on the bags.",
    "The change also rearranged our week. Roasting now happens every morning instead of twice a week, which means beans ship within a day of roasting, and the café gets a fresh batch before opening. Here is how we plan the schedule.",
    "Small batches are not free. Each roast takes almost as long as a big one, so the roaster runs longer hours, and we had to hire a second person who now knows more about airflow curves than any of us.",
];

fn browser() -> FakeBrowser {
    FakeBrowser::new([
        (ARTICLE_URL, Route::Html(ARTICLE_HTML.to_string())),
        (MISSING_URL, Route::Status(404)),
        (HANGING_URL, Route::Hang),
        (PDF_URL, Route::ContentType("application/pdf".into())),
        (HELLO_URL, Route::Html("<div>Hello</div>".into())),
        (BROKEN_URL, Route::BrokenContent),
        (FROZEN_URL, Route::HangingContent),
    ])
}

fn options(timeout: Duration) -> ExtractionOptions {
    ExtractionOptions {
        navigation_timeout: timeout,
        idle: IdlePolicy {
            window: Duration::from_millis(5),
            poll_interval: Duration::from_millis(1),
        },
    }
}

fn extractor(browser: Arc<FakeBrowser>, timeout: Duration) -> ArticleExtractor {
    ArticleExtractor::new(browser, Arc::new(Readability::default()), options(timeout))
}

#[tokio::test]
async fn malformed_urls_never_launch_a_browser() {
    common::init_test_tracing();
    let browser = Arc::new(browser());
    let extractor = extractor(browser.clone(), Duration::from_secs(5));

    for input in ["", "not a url", "example.com/post", "ftp://example.com/a", "http://"] {
        let err = extractor.extract_article(input).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput, "{input:?}");
    }
    assert_eq!(browser.counters.launches(), 0);
}

#[tokio::test]
async fn never_settling_navigation_times_out_and_closes_once() {
    common::init_test_tracing();
    let browser = Arc::new(browser());
    let extractor = extractor(browser.clone(), Duration::from_millis(200));

    let started = Instant::now();
    let err = extractor.extract_article(HANGING_URL).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NavigationTimeout);
    assert!(started.elapsed() < Duration::from_secs(2), "{:?}", started.elapsed());
    assert_eq!(browser.counters.launches(), 1);
    assert_eq!(browser.counters.closes(), 1);
}

#[tokio::test]
async fn stuck_dom_read_shares_the_navigation_deadline() {
    common::init_test_tracing();
    let browser = Arc::new(browser());
    let extractor = extractor(browser.clone(), Duration::from_millis(200));

    let started = Instant::now();
    let err = extractor.extract_article(FROZEN_URL).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NavigationTimeout);
    assert!(started.elapsed() < Duration::from_secs(2), "{:?}", started.elapsed());
    assert_eq!(browser.counters.navigations(), 1);
    assert_eq!(browser.counters.closes(), 1);
}

#[tokio::test]
async fn stalled_launch_is_bounded() {
    let browser = Arc::new(FakeBrowser::stalled());
    let extractor = extractor(browser.clone(), Duration::from_millis(200));

    let started = Instant::now();
    let err = extractor.extract_article(ARTICLE_URL).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Environment);
    assert!(started.elapsed() < Duration::from_secs(2), "{:?}", started.elapsed());
    assert_eq!(browser.counters.closes(), 0);
}

#[tokio::test]
async fn not_found_is_a_navigation_failure_with_status() {
    let browser = Arc::new(browser());
    let extractor = extractor(browser.clone(), Duration::from_secs(5));

    let err = extractor.extract_article(MISSING_URL).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Navigation);
    assert_eq!(err.status(), Some(404));
    assert_eq!(browser.counters.closes(), 1);
}

#[tokio::test]
async fn dns_failures_carry_the_browser_reason() {
    let browser = Arc::new(browser());
    let extractor = extractor(browser.clone(), Duration::from_secs(5));

    let err = extractor
        .extract_article("https://nope.invalid/")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Navigation);
    assert!(err.to_string().contains("ERR_NAME_NOT_RESOLVED"), "{err}");
    assert_eq!(browser.counters.closes(), 1);
}

#[tokio::test]
async fn dom_read_failures_are_navigation_failures() {
    let browser = Arc::new(browser());
    let extractor = extractor(browser.clone(), Duration::from_secs(5));

    let err = extractor.extract_article(BROKEN_URL).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Navigation);
    assert_eq!(browser.counters.closes(), 1);
}

#[tokio::test]
async fn article_fixture_yields_paragraphs_without_boilerplate() {
    common::init_test_tracing();
    let browser = Arc::new(browser());
    let extractor = extractor(browser.clone(), Duration::from_secs(5));

    let article = extractor.extract(ARTICLE_URL).await.unwrap();
    for paragraph in PARAGRAPHS {
        assert!(article.text_content.contains(paragraph), "missing: {paragraph}");
    }
    for boilerplate in [
        "Shop all coffee",
        "Wholesale enquiries",
        "Popular posts",
        "Share on Twitter",
        "Great read",
        "Copyright 2024",
        "dataLayer",
    ] {
        assert!(!article.text_content.contains(boilerplate), "leaked: {boilerplate}");
    }

    assert_eq!(
        article.title.as_deref(),
        Some("Why our coffee roaster moved to small batches")
    );
    assert_eq!(article.byline.as_deref(), Some("Jordan Reyes"));
    assert_eq!(article.site_name.as_deref(), Some("Northside Roasters"));
    assert_eq!(article.lang.as_deref(), Some("en"));
    assert!(
        article
            .content
            .contains(r#"href="https://blog.example.com/blog/roast-schedule""#)
    );
    assert_eq!(browser.counters.closes(), 1);
}

#[tokio::test]
async fn redirected_pages_resolve_links_against_the_final_url() {
    let browser = Arc::new(FakeBrowser::new([(
        "http://old.example.com/post",
        Route::Redirect {
            to: "https://new.example.com/2024/post/".into(),
            html: ARTICLE_HTML.replace("/blog/roast-schedule", "roast-schedule"),
        },
    )]));
    let extractor = extractor(browser.clone(), Duration::from_secs(5));

    let article = extractor.extract("http://old.example.com/post").await.unwrap();
    assert!(
        article
            .content
            .contains(r#"href="https://new.example.com/2024/post/roast-schedule""#),
        "{}",
        article.content
    );
}

#[tokio::test]
async fn content_free_page_reports_no_content() {
    let browser = Arc::new(browser());
    let extractor = extractor(browser.clone(), Duration::from_secs(5));

    let err = extractor.extract_article(HELLO_URL).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoContentExtracted);
    assert_eq!(browser.counters.closes(), 1);
}

#[tokio::test]
async fn repeated_extraction_is_idempotent() {
    let browser = Arc::new(browser());
    let extractor = extractor(browser.clone(), Duration::from_secs(5));

    let first = extractor.extract_article(ARTICLE_URL).await.unwrap();
    let second = extractor.extract_article(ARTICLE_URL).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(browser.counters.launches(), 2);
    assert_eq!(browser.counters.closes(), 2);
}

#[tokio::test]
async fn non_html_documents_never_reach_the_reader() {
    let browser = Arc::new(browser());
    let reader = Arc::new(CountingReader::default());
    let extractor = ArticleExtractor::new(
        browser.clone(),
        reader.clone() as Arc<dyn ContentExtractor>,
        options(Duration::from_secs(5)),
    );

    let err = extractor.extract_article(PDF_URL).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedContentType);
    assert_eq!(reader.calls.load(Ordering::SeqCst), 0);
    assert_eq!(browser.counters.closes(), 1);
}

#[tokio::test]
async fn launch_failures_are_environment_errors() {
    let browser = Arc::new(FakeBrowser::refusing());
    let extractor = extractor(browser.clone(), Duration::from_secs(5));

    let err = extractor.extract_article(ARTICLE_URL).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Environment);
    assert_eq!(browser.counters.launches(), 0);
    assert_eq!(browser.counters.closes(), 0);
}

#[tokio::test]
async fn concurrent_calls_close_every_session() {
    common::init_test_tracing();
    let browser = Arc::new(browser());
    let extractor = extractor(browser.clone(), Duration::from_millis(100));
    let urls = [
        ARTICLE_URL,
        MISSING_URL,
        HANGING_URL,
        PDF_URL,
        HELLO_URL,
        BROKEN_URL,
        "https://nope.invalid/",
        "not a url",
    ];

    let calls = (0..100).map(|i| {
        let extractor = extractor.clone();
        let url = urls[i % urls.len()];
        async move { extractor.extract_article(url).await }
    });
    let results = join_all(calls).await;

    let ok = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(ok, 13);
    assert!(browser.counters.launches() > 0);
    assert_eq!(browser.counters.launches(), browser.counters.closes());
}

#[tokio::test]
async fn aborted_extraction_still_closes_the_session() {
    let browser = Arc::new(browser());
    let extractor = extractor(browser.clone(), Duration::from_secs(60));

    let task = tokio::spawn({
        let extractor = extractor.clone();
        async move { extractor.extract_article(HANGING_URL).await }
    });
    let counters = browser.counters.clone();
    assert!(eventually(Duration::from_secs(2), || counters.navigations() == 1).await);

    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());
    assert!(eventually(Duration::from_secs(2), || counters.closes() == 1).await);
    assert_eq!(counters.launches(), 1);
}

#[tokio::test]
async fn caller_timeout_still_closes_the_session() {
    let browser = Arc::new(browser());
    let extractor = extractor(browser.clone(), Duration::from_secs(60));

    let outcome = tokio::time::timeout(
        Duration::from_millis(50),
        extractor.extract_article(HANGING_URL),
    )
    .await;
    assert!(outcome.is_err());

    let counters = browser.counters.clone();
    assert!(eventually(Duration::from_secs(2), || counters.closes() == 1).await);
}
