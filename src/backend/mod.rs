//! Page backends
//!
//! A backend loads requests into documents and answers selector queries
//! over them. The crawler is generic over [`Backend`]; [`HtmlBackend`] is
//! the bundled implementation, parsing static HTML fetched over HTTP or
//! read from `file://` URLs.

mod html;

pub use html::{HtmlBackend, HtmlElement, HtmlPage};

use crate::crawler::Request;
use crate::rules::Selector;
use crate::BackendError;
use async_trait::async_trait;

/// Fetches documents and queries elements within them
///
/// Backends that cannot evaluate a selector kind must fail with
/// [`BackendError::UnsupportedSelector`] rather than return no matches.
#[async_trait(?Send)]
pub trait Backend {
    /// A loaded page; cloned into setup and navigate handlers
    type Document: Clone + 'static;

    /// An element of a loaded page
    type Element: Clone + 'static;

    /// Short name used in log lines and errors
    fn name(&self) -> &'static str;

    /// Loads a request into a document
    async fn fetch(&self, request: &Request) -> Result<Self::Document, BackendError>;

    /// The URL the document was loaded from, after redirects
    fn page_url(&self, document: &Self::Document) -> String;

    /// Elements of the document matching `selector`, in document order
    async fn query_document(
        &self,
        document: &Self::Document,
        selector: &Selector,
    ) -> Result<Vec<Self::Element>, BackendError>;

    /// Elements below `element` matching `selector`, in document order
    async fn query_element(
        &self,
        element: &Self::Element,
        selector: &Selector,
    ) -> Result<Vec<Self::Element>, BackendError>;

    /// Raw `href` values of the document's links
    fn links(&self, document: &Self::Document) -> Vec<String>;

    /// Applies the page transition requested by a navigate handler
    ///
    /// # Returns
    ///
    /// * `Ok(Some(document))` - The page moved and this is the new document
    /// * `Ok(None)` - No transition was requested; the page is unchanged
    /// * `Err(BackendError)` - The transition failed
    async fn navigate(
        &self,
        document: &Self::Document,
    ) -> Result<Option<Self::Document>, BackendError>;
}
