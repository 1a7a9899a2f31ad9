//! Lifecycle events published by the [`Loader`](crate::loader::Loader).
//!
//! For every tag it processes the loader emits, in order, `willFetch`,
//! `didFetch`, `willParse` and `didParse`. A failed load additionally emits a
//! single `error` event before returning the error to the caller.

use crate::document::AdDocument;
use crate::error::VastError;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    WillFetch,
    DidFetch,
    WillParse,
    DidParse,
    Error,
}

impl EventKind {
    pub const ALL: [EventKind; 5] = [
        EventKind::WillFetch,
        EventKind::DidFetch,
        EventKind::WillParse,
        EventKind::DidParse,
        EventKind::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::WillFetch => "willFetch",
            EventKind::DidFetch => "didFetch",
            EventKind::WillParse => "willParse",
            EventKind::DidParse => "didParse",
            EventKind::Error => "error",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = VastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| VastError::InvalidOptions(format!("unknown event `{}`", s)))
    }
}

/// An event together with the data it reports. Payloads are borrowed from the
/// in-flight load and only live for the duration of the handler call.
#[derive(Debug, Clone, Copy)]
pub enum LoaderEvent<'a> {
    WillFetch { uri: &'a str },
    DidFetch { uri: &'a str, body: &'a str },
    WillParse { uri: &'a str, body: &'a str },
    DidParse { document: &'a AdDocument },
    Error { error: &'a VastError },
}

impl LoaderEvent<'_> {
    pub fn kind(&self) -> EventKind {
        match self {
            LoaderEvent::WillFetch { .. } => EventKind::WillFetch,
            LoaderEvent::DidFetch { .. } => EventKind::DidFetch,
            LoaderEvent::WillParse { .. } => EventKind::WillParse,
            LoaderEvent::DidParse { .. } => EventKind::DidParse,
            LoaderEvent::Error { .. } => EventKind::Error,
        }
    }
}

pub type Handler = Arc<dyn Fn(&LoaderEvent<'_>) + Send + Sync>;

/// Maps each event kind to the handlers subscribed to it.
///
/// Handlers run synchronously on the emitting task, in the order they were
/// registered. A panicking handler is not caught.
#[derive(Default, Clone)]
pub struct EventChannel {
    handlers: HashMap<EventKind, Vec<Handler>>,
}

impl EventChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<F>(&mut self, kind: EventKind, handler: F)
    where
        F: Fn(&LoaderEvent<'_>) + Send + Sync + 'static,
    {
        self.handlers.entry(kind).or_default().push(Arc::new(handler));
    }

    pub fn emit(&self, event: &LoaderEvent<'_>) {
        if let Some(handlers) = self.handlers.get(&event.kind()) {
            for handler in handlers {
                handler(event);
            }
        }
    }

    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.handlers.get(&kind).map_or(0, Vec::len)
    }
}

impl fmt::Debug for EventChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for kind in EventKind::ALL {
            map.entry(&kind.as_str(), &self.handler_count(kind));
        }
        map.finish()
    }
}
