// ABOUTME: End-to-end tests for preview dispatch against a local mock server.
// ABOUTME: Covers content-type branching, registry overrides, settings, cancellation and Twitch.

use std::time::{Duration, Instant};

use httpmock::prelude::*;
use lookout::{primitive, CancellationToken, Client, Link, PreviewError, Specialization};
use pretty_assertions::assert_eq;
use scraper::Html;
use url::Url;

const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
<title>Mock Page</title>
<meta name="description" content="A page served by the mock server">
<meta property="og:image" content="https://cdn.example.com/card.png">
<link rel="icon" href="/favicon-16.png" sizes="16x16">
<link rel="icon" href="/favicon-64.png" sizes="64x64">
<link rel="icon" href="/favicon-32.png" sizes="32x32">
</head>
<body><p>Hello</p></body>
</html>"#;

/// The registry key for the mock server, `127.0.0.1:<port>`.
fn server_host(server: &MockServer) -> String {
    let url = Url::parse(&server.base_url()).unwrap();
    format!("{}:{}", url.host_str().unwrap(), url.port().unwrap())
}

fn tagging_parser(tag: &'static str) -> Specialization {
    Specialization::custom(
        move |doc: &Html, url: &Url, uri: &str| -> Result<Link, PreviewError> {
            let mut link = primitive(doc, url, uri);
            link.set_extra("Parser", tag);
            Ok(link)
        },
    )
}

#[tokio::test]
async fn unknown_host_uses_generic_extractor() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/article");
        then.status(200)
            .header("content-type", "text/html; charset=utf-8")
            .body(PAGE);
    });

    let client = Client::builder().build();
    let url = server.url("/article");
    let link = client.get(&url).await.unwrap();
    mock.assert();

    assert_eq!(link.title, "Mock Page");
    assert_eq!(link.description, "A page served by the mock server");
    assert_eq!(link.image, "https://cdn.example.com/card.png");
    assert_eq!(link.favicon, format!("{}/favicon-64.png", server.base_url()));
    assert_eq!(link.host, server_host(&server));
    assert_eq!(link.uri, url);
    assert!(link.extras.is_empty());
}

#[tokio::test]
async fn register_conflict_then_force_register_changes_dispatch() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/page");
        then.status(200).header("content-type", "text/html").body(PAGE);
    });

    let client = Client::builder().build();
    let host = server_host(&server);
    client.register(&host, tagging_parser("first")).unwrap();

    let err = client
        .register(&host, tagging_parser("second"))
        .unwrap_err();
    assert!(err.is_host_already_registered());

    let url = server.url("/page");
    let link = client.get(&url).await.unwrap();
    assert_eq!(link.extra("Parser"), Some("first"));

    client.force_register(&host, tagging_parser("second"));
    let link = client.get(&url).await.unwrap();
    assert_eq!(link.extra("Parser"), Some("second"));

    client.unregister(&host);
    let link = client.get(&url).await.unwrap();
    assert_eq!(link.extra("Parser"), None);
}

#[tokio::test]
async fn image_link_skips_document_parsing() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/photo.jpg");
        then.status(200)
            .header("content-type", "image/jpeg")
            .body(vec![0xFF, 0xD8, 0xFF, 0xE0]);
    });

    let client = Client::builder().build();
    client.register(&server_host(&server), tagging_parser("never")).unwrap();

    let url = server.url("/photo.jpg");
    let link = client.get(&url).await.unwrap();

    assert_eq!(link.extras.len(), 1);
    assert!(link.is_image_link());
    assert_eq!(link.title, "");
    assert_eq!(link.uri, url);
    assert_eq!(link.host, server_host(&server));
}

#[tokio::test]
async fn video_link_skips_document_parsing() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/clip.mp4");
        then.status(200).header("content-type", "video/mp4").body("....");
    });

    let client = Client::builder().build();
    let link = client.get(&server.url("/clip.mp4")).await.unwrap();

    assert_eq!(link.extras.len(), 1);
    assert!(link.is_video_link());
    assert!(!link.is_image_link());
}

#[tokio::test]
async fn pdf_is_unsupported() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/paper.pdf");
        then.status(200)
            .header("content-type", "application/pdf")
            .body("%PDF-1.7");
    });

    let client = Client::builder().build();
    let err = client.get(&server.url("/paper.pdf")).await.unwrap_err();
    assert!(err.is_unsupported_content());
}

#[tokio::test]
async fn missing_page_is_not_accessible() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/gone");
        then.status(404).body("not found");
    });

    let client = Client::builder().build();
    let err = client.get(&server.url("/gone")).await.unwrap_err();
    assert!(err.is_not_accessible());
}

#[tokio::test]
async fn oversized_page_is_not_valid() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/big");
        then.status(200).header("content-type", "text/html").body(PAGE);
    });

    let client = Client::builder().max_content_length(64).build();
    let err = client.get(&server.url("/big")).await.unwrap_err();
    assert!(err.is_content_not_valid());
}

#[tokio::test]
async fn settings_apply_to_next_request() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/page")
            .header("user-agent", "PreviewBot/2.0")
            .header("accept-language", "de-DE")
            .header("x-preview", "1");
        then.status(200).header("content-type", "text/html").body(PAGE);
    });

    let client = Client::builder().header("X-Preview", "1").build();
    client.set_user_agent("PreviewBot/2.0").unwrap();
    client.set_request_language("de-DE").unwrap();

    client.get(&server.url("/page")).await.unwrap();
    mock.assert();
}

#[tokio::test]
async fn cancellation_abandons_slow_fetch() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/slow");
        then.status(200)
            .header("content-type", "text/html")
            .body(PAGE)
            .delay(Duration::from_secs(5));
    });

    let client = Client::builder().build();
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = client
        .get_with_cancel(&server.url("/slow"), &token)
        .await
        .unwrap_err();
    assert!(err.is_cancelled());
}

#[tokio::test]
async fn slow_page_times_out_as_no_response() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/slow");
        then.status(200)
            .header("content-type", "text/html")
            .body(PAGE)
            .delay(Duration::from_secs(3));
    });

    let client = Client::builder()
        .timeout(Duration::from_millis(200))
        .build();
    let url = server.url("/slow");

    // Spawning requires the preview future to be Send.
    let err = tokio::spawn(async move { client.get(&url).await })
        .await
        .unwrap()
        .unwrap_err();
    assert!(err.is_no_response());
}

#[tokio::test]
async fn cancellation_abandons_slow_twitch_query() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/somestreamer");
        then.status(200).header("content-type", "text/html").body(PAGE);
    });
    server.mock(|when, then| {
        when.method(POST).path("/gql");
        then.status(200).body("[]").delay(Duration::from_secs(5));
    });

    let client = Client::builder()
        .twitch_endpoint(server.url("/gql"))
        .build();
    client.force_register(&server_host(&server), Specialization::Twitch);

    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        trigger.cancel();
    });

    let start = Instant::now();
    let err = client
        .get_with_cancel(&server.url("/somestreamer"), &token)
        .await
        .unwrap_err();
    let elapsed = start.elapsed();

    assert!(err.is_cancelled());
    assert!(elapsed < Duration::from_secs(3), "took {:?}", elapsed);
}

#[tokio::test]
async fn cancelled_token_fails_immediately() {
    let client = Client::builder().build();
    let token = CancellationToken::new();
    token.cancel();
    let err = client
        .get_with_cancel("https://example.invalid/", &token)
        .await
        .unwrap_err();
    assert!(err.is_cancelled());
}

#[tokio::test]
async fn twitch_channel_end_to_end() {
    let server = MockServer::start();
    let page = server.mock(|when, then| {
        when.method(GET).path("/somestreamer");
        then.status(200).header("content-type", "text/html").body(PAGE);
    });
    let gql = server.mock(|when, then| {
        when.method(POST)
            .path("/gql")
            .header("accept-language", "en-US,en;q=0.5")
            .header("client-id", "kimne78kx3ncx6brgo4mv6wki5h1ko");
        then.status(200).body(
            r#"[{"data":{"user":{"displayName":"SomeStreamer",
                "broadcastSettings":{"title":"Chill stream","game":{"name":"Chess","boxArtURL":"https://cdn.example.com/Chess-85x113.jpg"}},
                "stream":null}}}]"#,
        );
    });

    let client = Client::builder()
        .twitch_endpoint(server.url("/gql"))
        .build();
    client.force_register(&server_host(&server), Specialization::Twitch);

    let link = client.get(&server.url("/somestreamer")).await.unwrap();
    page.assert();
    gql.assert();

    assert_eq!(link.title, "SomeStreamer - Twitch");
    assert_eq!(link.extra("IsClip"), Some("false"));
    assert_eq!(link.extra("Live"), Some("false"));
    assert_eq!(link.extra("StreamTitle"), Some("Chill stream"));
    assert_eq!(link.extra("GameArtFull"), Some("https://cdn.example.com/Chess.jpg"));
    assert_eq!(link.description, "");
}

#[tokio::test]
async fn twitch_clip_with_empty_response_keeps_clip_extras() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/streamer/clip/SomeSlug");
        then.status(200).header("content-type", "text/html").body(PAGE);
    });
    server.mock(|when, then| {
        when.method(POST).path("/gql");
        then.status(200).body("[]");
    });

    let client = Client::builder()
        .twitch_endpoint(server.url("/gql"))
        .build();
    client.force_register(&server_host(&server), Specialization::Twitch);

    let link = client
        .get(&server.url("/streamer/clip/SomeSlug"))
        .await
        .unwrap();
    assert_eq!(link.title, "Twitch");
    assert_eq!(link.extra("IsClip"), Some("true"));
    assert_eq!(link.extra("ClipSlug"), Some("SomeSlug"));
}

#[tokio::test]
async fn twitch_failure_returns_no_link() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/somestreamer");
        then.status(200).header("content-type", "text/html").body(PAGE);
    });
    server.mock(|when, then| {
        when.method(POST).path("/gql");
        then.status(500).body("upstream exploded");
    });

    let client = Client::builder()
        .twitch_endpoint(server.url("/gql"))
        .build();
    client.force_register(&server_host(&server), Specialization::Twitch);

    let err = client.get(&server.url("/somestreamer")).await.unwrap_err();
    assert!(err.is_not_accessible());
    assert!(err.to_string().contains("upstream exploded"));
}

const WATCH_PAGE: &str = r#"<html><head>
<title>Big Buck Bunny - YouTube</title>
<meta property="og:image" content="https://i.ytimg.com/vi/abc/hqdefault.jpg?sqp=1">
<link rel="icon" href="https://www.youtube.com/s/desktop/favicon_144x144.png" sizes="144x144">
</head></html>"#;

#[tokio::test]
async fn watch_url_maps_query_into_extras() {
    let client = Client::builder().build();
    let link = client
        .parse_html(WATCH_PAGE, "https://youtube.com/watch?v=abc&t=10")
        .await
        .unwrap();

    assert_eq!(link.title, "Big Buck Bunny");
    assert_eq!(link.extra("Video"), Some("abc"));
    assert_eq!(link.extra("Time"), Some("10"));
    assert_eq!(link.extra("IsVideo"), Some("true"));
    assert_eq!(link.extra("IsPlaylist"), Some("false"));
    assert_eq!(link.extra("IsYouTubeLink"), Some("true"));
    assert_eq!(link.image, "https://img.youtube.com/vi/abc/maxresdefault.jpg");
}

#[tokio::test]
async fn short_link_matches_watch_url() {
    let client = Client::builder().build();
    let short = client
        .parse_html(WATCH_PAGE, "https://youtu.be/abc")
        .await
        .unwrap();
    let long = client
        .parse_html(WATCH_PAGE, "https://youtube.com/watch?v=abc")
        .await
        .unwrap();

    assert_eq!(short, long);
    assert_eq!(short.host, "youtube.com");
}

#[tokio::test]
async fn reddit_percentage_uses_dislikes_over_likes() {
    let html = r#"<html><head><title>A post</title></head><body>
        <div class="unvoted">
            <div class="dislikes">10</div>
            <div class="unvoted">100</div>
            <div class="likes">90</div>
        </div></body></html>"#;

    let client = Client::builder().build();
    let link = client
        .parse_html(html, "https://www.reddit.com/r/rust/comments/abc/a_post/")
        .await
        .unwrap();

    assert_eq!(link.host, "old.reddit.com");
    assert_eq!(link.uri, "https://www.reddit.com/r/rust/comments/abc/a_post/");
    assert_eq!(link.extra("Percentage"), Some("11"));
    assert_eq!(link.extra("Score"), Some("100"));
    assert_eq!(link.extra("IsRedditLink"), Some("true"));
}

#[tokio::test]
async fn overridden_reddit_keeps_original_host() {
    let client = Client::builder().build();
    client.force_register("reddit.com", tagging_parser("mine"));

    let link = client
        .parse_html("<title>A post</title>", "https://reddit.com/r/rust")
        .await
        .unwrap();

    assert!(client.has_overridden("reddit.com"));
    assert_eq!(link.host, "reddit.com");
    assert_eq!(link.extra("Parser"), Some("mine"));
    assert_eq!(link.extra("IsRedditLink"), None);
}
