//! Classification of parsed VAST documents into the links of a wrapper chain.

use crate::models::{Ad, Vast};
use serde::{Deserialize, Serialize};

/// Whether a tag ends the chain or points at another tag
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
pub enum TagKind {
    InLine,
    Wrapper,
}

/// One fetched and parsed tag in a wrapper chain
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct AdDocument {
    /// The URI this document was fetched from
    pub uri: String,

    pub kind: TagKind,

    /// The document's ads, in document order
    pub ads: Vec<Ad>,

    /// The tag to follow next; only ever set for wrappers
    pub next_uri: Option<String>,

    /// Document version and error URL, as parsed
    pub version: String,
    pub error: Option<String>,
}

/// The tags traversed by one load, from the initial URI to the terminal InLine
pub type Chain = Vec<AdDocument>;

impl AdDocument {
    /// Classify a parsed document.
    ///
    /// The first ad decides: if it is a `<Wrapper>` the document is a wrapper
    /// and its `VASTAdTagURI` is the next link. Anything else, including a
    /// document with no ads at all, is treated as InLine.
    pub fn from_vast(uri: impl Into<String>, vast: Vast) -> Self {
        let next_uri = vast
            .ads
            .first()
            .and_then(|ad| ad.wrapper.as_ref())
            .map(|wrapper| wrapper.vast_ad_tag_uri.trim().to_string());

        let kind = if next_uri.is_some() {
            TagKind::Wrapper
        } else {
            TagKind::InLine
        };

        AdDocument {
            uri: uri.into(),
            kind,
            ads: vast.ads,
            next_uri: next_uri.filter(|uri| !uri.is_empty()),
            version: vast.version,
            error: vast.error,
        }
    }

    pub fn is_inline(&self) -> bool {
        self.kind == TagKind::InLine
    }

    pub fn is_wrapper(&self) -> bool {
        self.kind == TagKind::Wrapper
    }

    /// Rebuild the `Vast` this document was classified from
    pub fn to_vast(&self) -> Vast {
        Vast {
            version: self.version.clone(),
            ads: self.ads.clone(),
            error: self.error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InLine, Wrapper};

    fn wrapper_ad(uri: &str) -> Ad {
        Ad {
            wrapper: Some(Wrapper {
                vast_ad_tag_uri: uri.to_string(),
                ..Wrapper::default()
            }),
            ..Ad::default()
        }
    }

    fn inline_ad() -> Ad {
        Ad {
            inline: Some(InLine::default()),
            ..Ad::default()
        }
    }

    fn vast(ads: Vec<Ad>) -> Vast {
        Vast {
            version: "3.0".to_string(),
            ads,
            error: None,
        }
    }

    #[test]
    fn inline_document() {
        let doc = AdDocument::from_vast("a.xml", vast(vec![inline_ad()]));
        assert!(doc.is_inline());
        assert_eq!(doc.next_uri, None);
        assert_eq!(doc.ads.len(), 1);
        assert_eq!(doc.uri, "a.xml");
    }

    #[test]
    fn wrapper_document_exposes_next_uri() {
        let doc = AdDocument::from_vast("w.xml", vast(vec![wrapper_ad(" http://next.example/tag ")]));
        assert!(doc.is_wrapper());
        assert_eq!(doc.next_uri.as_deref(), Some("http://next.example/tag"));
    }

    #[test]
    fn wrapper_without_tag_uri_has_no_next_link() {
        let doc = AdDocument::from_vast("w.xml", vast(vec![wrapper_ad("   ")]));
        assert!(doc.is_wrapper());
        assert_eq!(doc.next_uri, None);
    }

    #[test]
    fn first_ad_decides() {
        let doc = AdDocument::from_vast("m.xml", vast(vec![inline_ad(), wrapper_ad("x")]));
        assert!(doc.is_inline());
        assert_eq!(doc.ads.len(), 2);
    }

    #[test]
    fn empty_document_is_inline_without_ads() {
        let doc = AdDocument::from_vast("empty.xml", vast(Vec::new()));
        assert!(doc.is_inline());
        assert!(doc.ads.is_empty());
        assert_eq!(doc.to_vast(), vast(Vec::new()));
    }
}
