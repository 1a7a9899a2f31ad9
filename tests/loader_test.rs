use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use vast_loader::{
    stitcher, ErrorKind, EventKind, HttpTransport, LoadOptions, Loader, LoaderEvent, Result,
    TagKind, Transport, VastError,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TREMOR_INLINE: &str = "http://demo.tremormedia.com/proddev/vast/vast_inline_linear.xml";

fn fixture(name: &str) -> String {
    std::fs::read_to_string(format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name))
        .unwrap()
}

/// Rewrites the public Tremor tag to the local mock server
struct ProxyTransport {
    inner: HttpTransport,
    base_url: String,
}

#[async_trait]
impl Transport for ProxyTransport {
    async fn fetch(&self, uri: &str) -> Result<String> {
        if uri == TREMOR_INLINE {
            let proxied = format!("{}/tremor-video/vast_inline_linear.xml", self.base_url);
            return self.inner.fetch(&proxied).await;
        }
        self.inner.fetch(uri).await
    }
}

async fn fixture_server() -> MockServer {
    let server = MockServer::start().await;

    let wrapper = fixture("wrapper_linear.xml")
        .replace("tests/fixtures/inline_linear.xml", TREMOR_INLINE);

    for (route, body) in [
        ("/tremor-video/vast_inline_linear.xml", fixture("inline_linear.xml")),
        ("/tremor-video/vast_wrapper_linear_1.xml", wrapper),
        ("/no-ads.xml", fixture("no-ads.xml")),
    ] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;
    }

    server
}

fn create_loader(server: &MockServer, options: LoadOptions) -> Loader<ProxyTransport> {
    let transport = ProxyTransport {
        inner: HttpTransport::new(Duration::from_secs(5)).unwrap(),
        base_url: server.uri(),
    };
    Loader::with_options(transport, options)
}

fn counter<T: Transport>(loader: &mut Loader<T>, kind: EventKind) -> Arc<Mutex<usize>> {
    let count = Arc::new(Mutex::new(0));
    let handle = Arc::clone(&count);
    loader.on(kind, move |_| *handle.lock().unwrap() += 1);
    count
}

#[tokio::test]
async fn loads_the_inline() {
    let server = fixture_server().await;
    let loader = create_loader(&server, LoadOptions::default());

    let chain = loader
        .load(&format!("{}/tremor-video/vast_inline_linear.xml", server.uri()))
        .await
        .unwrap();

    assert_eq!(chain.len(), 1);
    assert_eq!(chain[0].kind, TagKind::InLine);
    assert_eq!(chain[0].ads[0].id.as_deref(), Some("601364"));
}

#[tokio::test]
async fn loads_the_wrapper() {
    let server = fixture_server().await;
    let loader = create_loader(&server, LoadOptions::default());

    let chain = loader
        .load(&format!("{}/tremor-video/vast_wrapper_linear_1.xml", server.uri()))
        .await
        .unwrap();

    let kinds: Vec<_> = chain.iter().map(|document| document.kind).collect();
    assert_eq!(kinds, vec![TagKind::Wrapper, TagKind::InLine]);
    assert_eq!(chain[0].next_uri.as_deref(), Some(TREMOR_INLINE));
    assert_eq!(chain[1].uri, TREMOR_INLINE);
}

#[tokio::test]
async fn fails_when_max_depth_is_reached() {
    let server = fixture_server().await;
    let loader = create_loader(&server, LoadOptions::default().with_max_depth(1));

    let err = loader
        .load(&format!("{}/tremor-video/vast_wrapper_linear_1.xml", server.uri()))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::MaxDepthExceeded);
    assert_eq!(err.vast_code(), 302);
}

#[tokio::test]
async fn fails_on_tags_without_ads() {
    let server = fixture_server().await;
    let loader = create_loader(&server, LoadOptions::default());

    let err = loader
        .load(&format!("{}/no-ads.xml", server.uri()))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("No ads found"));
    assert_eq!(err.kind(), ErrorKind::NoAds);
}

#[tokio::test]
async fn fails_on_http_errors() {
    let server = fixture_server().await;
    let loader = create_loader(&server, LoadOptions::default());

    let err = loader
        .load(&format!("{}/four-oh-four", server.uri()))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("404"));
    assert!(matches!(err, VastError::Http { status: Some(404), .. }));
}

#[tokio::test]
async fn emits_each_lifecycle_event() {
    let server = fixture_server().await;
    let uri = format!("{}/tremor-video/vast_inline_linear.xml", server.uri());

    for kind in [
        EventKind::WillFetch,
        EventKind::DidFetch,
        EventKind::WillParse,
        EventKind::DidParse,
    ] {
        let mut loader = create_loader(&server, LoadOptions::default());
        let count = counter(&mut loader, kind);
        loader.load(&uri).await.unwrap();
        assert_eq!(*count.lock().unwrap(), 1, "{kind} should fire once");
    }
}

#[tokio::test]
async fn emits_lifecycle_events_once_per_tag() {
    let server = fixture_server().await;
    let uri = format!("{}/tremor-video/vast_wrapper_linear_1.xml", server.uri());

    for kind in [
        EventKind::WillFetch,
        EventKind::DidFetch,
        EventKind::WillParse,
        EventKind::DidParse,
    ] {
        let mut loader = create_loader(&server, LoadOptions::default());
        let count = counter(&mut loader, kind);
        loader.load(&uri).await.unwrap();
        assert_eq!(*count.lock().unwrap(), 2, "{kind} should fire twice");
    }
}

#[tokio::test]
async fn emits_error_once_on_errors() {
    let server = fixture_server().await;
    let mut loader = create_loader(&server, LoadOptions::default());
    let errors = counter(&mut loader, EventKind::Error);

    let result = loader.load(&format!("{}/four-oh-four", server.uri())).await;

    assert!(result.is_err());
    assert_eq!(*errors.lock().unwrap(), 1);
}

#[tokio::test]
async fn remote_wrappers_cannot_redirect_into_local_files() {
    let server = MockServer::start().await;
    let local_uris = ["file:///etc/hostname", "tests/fixtures/inline_linear.xml"];

    for (index, local) in local_uris.iter().enumerate() {
        let wrapper = fixture("wrapper_linear.xml").replace("tests/fixtures/inline_linear.xml", local);
        Mock::given(method("GET"))
            .and(path(format!("/wrapper-{index}.xml")))
            .respond_with(ResponseTemplate::new(200).set_body_string(wrapper))
            .mount(&server)
            .await;
    }

    for index in 0..local_uris.len() {
        let mut loader = Loader::http(LoadOptions::default()).unwrap();
        let fetched = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&fetched);
        loader.on(EventKind::DidFetch, move |event| {
            if let LoaderEvent::DidFetch { uri, .. } = event {
                sink.lock().unwrap().push(uri.to_string());
            }
        });
        let errors = counter(&mut loader, EventKind::Error);

        let wrapper_uri = format!("{}/wrapper-{index}.xml", server.uri());
        let err = loader.load(&wrapper_uri).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Http);
        assert_eq!(err.status(), None);
        // Only the remote wrapper was ever read
        assert_eq!(*fetched.lock().unwrap(), vec![wrapper_uri]);
        assert_eq!(*errors.lock().unwrap(), 1);
    }
}

#[tokio::test]
async fn timeouts_surface_as_http_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(fixture("inline_linear.xml"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let options = LoadOptions::default().with_timeout(Duration::from_millis(200));
    let mut loader = Loader::http(options).unwrap();
    let errors = counter(&mut loader, EventKind::Error);

    let err = loader
        .load(&format!("{}/slow", server.uri()))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Http);
    assert_eq!(err.status(), None);
    assert!(err.to_string().contains("timed out"));
    assert_eq!(*errors.lock().unwrap(), 1);
}

#[tokio::test]
async fn loads_and_stitches_local_fixtures() {
    // The wrapper fixture points at the InLine fixture by relative path
    let loader = Loader::http(LoadOptions::default()).unwrap();
    let chain = loader.load("tests/fixtures/wrapper_linear.xml").await.unwrap();
    assert_eq!(chain.len(), 2);

    let vast = stitcher::stitch(&chain).unwrap();
    let inline = vast.ads[0].inline.as_ref().unwrap();
    let impressions: Vec<_> = inline.impressions.iter().map(|i| i.url.as_str()).collect();
    assert_eq!(
        impressions,
        vec![
            "http://myTrackingURL/impression",
            "http://myTrackingURL/wrapper/impression"
        ]
    );
    // The InLine keeps its own error URL
    assert_eq!(inline.error.as_deref(), Some("http://myErrorURL/error"));

    let linear = inline.creatives[0].linear.as_ref().unwrap();
    assert_eq!(linear.tracking_events.len(), 8);
    assert_eq!(
        linear.video_clicks.as_ref().unwrap().click_tracking,
        vec![
            "http://myTrackingURL/click".to_string(),
            "http://myTrackingURL/wrapper/click".to_string()
        ]
    );
}

#[tokio::test]
async fn one_shot_load_matches_loader() {
    let server = fixture_server().await;
    let uri = format!("{}/tremor-video/vast_inline_linear.xml", server.uri());

    let chain = vast_loader::load(&uri, LoadOptions::default()).await.unwrap();
    let again = vast_loader::load(&uri, LoadOptions::default()).await.unwrap();

    assert_eq!(chain, again);
}
