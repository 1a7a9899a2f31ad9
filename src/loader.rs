use crate::document::{AdDocument, Chain, TagKind};
use crate::error::{Result, VastError};
use crate::events::{EventChannel, EventKind, LoaderEvent};
use crate::parser;
use crate::transport::{self, HttpTransport, Transport, DEFAULT_TIMEOUT};
use std::time::Duration;

/// Default maximum number of tags fetched while resolving one chain
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Per-load configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Maximum number of tags fetched in one chain, at least 1
    pub max_depth: usize,

    /// Per-fetch timeout used when the loader builds its own HTTP transport
    pub timeout: Duration,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl LoadOptions {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(VastError::InvalidOptions(
                "max_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Resolves a VAST tag by following wrappers down to an InLine document.
///
/// A `Loader` holds only its transport, options and subscribed handlers; all
/// state of a resolution lives inside [`Loader::load`], so one loader can run
/// any number of loads concurrently.
#[derive(Debug)]
pub struct Loader<T = HttpTransport> {
    transport: T,
    options: LoadOptions,
    events: EventChannel,
}

impl Loader<HttpTransport> {
    /// A loader fetching over HTTP(S) or from local files, honouring `options.timeout`
    pub fn http(options: LoadOptions) -> Result<Self> {
        let transport = HttpTransport::new(options.timeout)?;
        Ok(Self::with_options(transport, options))
    }
}

impl<T: Transport> Loader<T> {
    pub fn new(transport: T) -> Self {
        Self::with_options(transport, LoadOptions::default())
    }

    pub fn with_options(transport: T, options: LoadOptions) -> Self {
        Self {
            transport,
            options,
            events: EventChannel::new(),
        }
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    pub fn events(&self) -> &EventChannel {
        &self.events
    }

    /// Subscribe `handler` to every event of `kind` emitted by this loader
    pub fn on<F>(&mut self, kind: EventKind, handler: F) -> &mut Self
    where
        F: Fn(&LoaderEvent<'_>) + Send + Sync + 'static,
    {
        self.events.on(kind, handler);
        self
    }

    /// Resolve `uri` into its wrapper chain.
    ///
    /// On success the chain holds every Wrapper followed, in order, and ends
    /// with an InLine document carrying at least one ad. On failure exactly
    /// one `error` event is emitted and no partial chain is returned.
    pub async fn load(&self, uri: &str) -> Result<Chain> {
        let result = match self.options.validate() {
            Ok(()) => self.resolve(uri).await,
            Err(e) => Err(e),
        };

        if let Err(error) = &result {
            log::warn!("Failed to load {}: {}", uri, error);
            self.events.emit(&LoaderEvent::Error { error });
        }

        result
    }

    async fn resolve(&self, uri: &str) -> Result<Chain> {
        let mut resolution = Resolution::new(uri);

        loop {
            let document = self.load_tag(&resolution.current_uri).await?;

            // Decide whether the chain is complete or which tag comes next
            let next = resolution.push(document, self.options.max_depth)?;

            match next {
                Some(next_uri) => {
                    log::debug!("Following wrapper #{} to {}", resolution.depth, next_uri);
                    resolution.current_uri = next_uri;
                }
                None => return Ok(resolution.chain),
            }
        }
    }

    /// Fetch and parse a single tag, emitting its four lifecycle events
    async fn load_tag(&self, uri: &str) -> Result<AdDocument> {
        // Fetch the raw tag
        self.events.emit(&LoaderEvent::WillFetch { uri });
        let body = self.transport.fetch(uri).await?;
        self.events.emit(&LoaderEvent::DidFetch { uri, body: &body });

        // Parse the VAST XML and classify it
        self.events.emit(&LoaderEvent::WillParse { uri, body: &body });
        let vast = parser::parse_vast(&body)?;
        let document = AdDocument::from_vast(uri, vast);
        log::debug!(
            "Parsed {:?} tag from {} with {} ad(s)",
            document.kind,
            uri,
            document.ads.len()
        );
        self.events.emit(&LoaderEvent::DidParse { document: &document });

        Ok(document)
    }
}

/// State of one in-flight `load()` call
#[derive(Debug)]
struct Resolution {
    /// Number of tags fetched so far
    depth: usize,
    current_uri: String,
    chain: Chain,
}

impl Resolution {
    fn new(uri: &str) -> Self {
        Self {
            depth: 0,
            current_uri: uri.to_string(),
            chain: Vec::new(),
        }
    }

    /// Record a parsed document and decide what happens next: `None` when the
    /// chain is complete, or the URI of the next tag to fetch.
    fn push(&mut self, document: AdDocument, max_depth: usize) -> Result<Option<String>> {
        let next_uri = match document.kind {
            TagKind::InLine if document.ads.is_empty() => {
                return Err(VastError::NoAds { uri: document.uri });
            }
            TagKind::InLine => None,
            TagKind::Wrapper => match &document.next_uri {
                // A dead-end wrapper reports "no ads", never a depth error
                None => return Err(VastError::NoAds { uri: document.uri }),
                Some(next_uri) => Some(next_uri.clone()),
            },
        };

        let from = document.uri.clone();
        self.chain.push(document);

        if let Some(next_uri) = &next_uri {
            self.depth += 1;
            if self.depth >= max_depth {
                return Err(VastError::MaxDepthExceeded { max_depth });
            }

            // A tag served over the network may only link to other remote tags
            transport::check_origin(&from, next_uri)?;
        }

        Ok(next_uri)
    }
}

/// Resolve `uri` with a one-off HTTP loader
pub async fn load(uri: &str, options: LoadOptions) -> Result<Chain> {
    Loader::http(options)?.load(uri).await
}
