//! Static HTML backend
//!
//! Pages are fetched with `reqwest` (every request goes through the
//! [`RequestGate`] first) or read from disk for `file://` URLs, then parsed
//! with `scraper`. Elements are handles into the shared parsed tree, so
//! they can be cloned freely and moved into async handlers.

use crate::backend::Backend;
use crate::config::UserAgentConfig;
use crate::crawler::{build_http_client, extract_links, GateDecision, Request, RequestGate};
use crate::rules::{Selector, SelectorKind};
use crate::url::resolve_link;
use crate::BackendError;
use async_trait::async_trait;
use ego_tree::NodeId;
use regex::RegexBuilder;
use reqwest::Client;
use scraper::{ElementRef, Html};
use std::cell::RefCell;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use url::Url;

const BACKEND_NAME: &str = "html";

struct ParsedHtml {
    url: String,
    html: Html,
}

impl ParsedHtml {
    fn element(&self, id: NodeId) -> Option<ElementRef<'_>> {
        self.html.tree.get(id).and_then(ElementRef::wrap)
    }
}

/// A parsed HTML page
///
/// Clones share the parsed tree and the pending navigation, so a navigate
/// handler can request a transition on its copy of the page.
#[derive(Clone)]
pub struct HtmlPage {
    inner: Rc<ParsedHtml>,
    pending: Rc<RefCell<Option<String>>>,
}

impl HtmlPage {
    /// Parses `body` as the document found at `url`
    pub fn parse(url: &str, body: &str) -> Self {
        Self {
            inner: Rc::new(ParsedHtml {
                url: url.to_string(),
                html: Html::parse_document(body),
            }),
            pending: Rc::new(RefCell::new(None)),
        }
    }

    pub fn url(&self) -> &str {
        &self.inner.url
    }

    /// The serialized document
    pub fn html(&self) -> String {
        self.inner.html.html()
    }

    /// Text of the `<title>` element, if any
    pub fn title(&self) -> Option<String> {
        let selector = scraper::Selector::parse("title").ok()?;
        self.inner
            .html
            .select(&selector)
            .next()
            .map(|element| element.text().collect::<String>().trim().to_string())
            .filter(|title| !title.is_empty())
    }

    /// Elements of the page matching `selector`, in document order
    pub fn select(&self, selector: impl Into<Selector>) -> Result<Vec<HtmlElement>, BackendError> {
        query(&self.inner, None, &selector.into())
    }

    pub fn select_first(&self, selector: impl Into<Selector>) -> Option<HtmlElement> {
        self.select(selector).ok()?.into_iter().next()
    }

    /// Requests navigation to `url` once the navigate handler returns
    pub fn goto(&self, url: impl Into<String>) {
        *self.pending.borrow_mut() = Some(url.into());
    }

    /// Requests navigation to the target of a link element, resolved
    /// against this page
    ///
    /// # Returns
    ///
    /// * `true` - A transition was requested
    /// * `false` - The element has no followable `href`
    pub fn follow(&self, element: &HtmlElement) -> bool {
        match element.attr("href") {
            Some(href) => self.follow_href(&href),
            None => false,
        }
    }

    /// Requests navigation to `href`, resolved against this page
    pub fn follow_href(&self, href: &str) -> bool {
        let Ok(base) = Url::parse(self.url()) else {
            return false;
        };
        match resolve_link(href, &base) {
            Some(target) => {
                self.goto(target.to_string());
                true
            }
            None => false,
        }
    }

    fn take_pending(&self) -> Option<String> {
        self.pending.borrow_mut().take()
    }
}

impl fmt::Debug for HtmlPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HtmlPage")
            .field("url", &self.inner.url)
            .field("pending", &self.pending.borrow())
            .finish()
    }
}

/// An element of an [`HtmlPage`]
#[derive(Clone)]
pub struct HtmlElement {
    doc: Rc<ParsedHtml>,
    id: NodeId,
}

impl HtmlElement {
    fn element_ref(&self) -> Option<ElementRef<'_>> {
        self.doc.element(self.id)
    }

    /// Lowercase tag name
    pub fn name(&self) -> String {
        self.element_ref()
            .map(|el| el.value().name().to_string())
            .unwrap_or_default()
    }

    /// All text below the element, trimmed
    pub fn text(&self) -> String {
        self.element_ref()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .unwrap_or_default()
    }

    pub fn attr(&self, name: &str) -> Option<String> {
        self.element_ref()
            .and_then(|el| el.value().attr(name).map(str::to_string))
    }

    /// Outer HTML
    pub fn html(&self) -> String {
        self.element_ref().map(|el| el.html()).unwrap_or_default()
    }

    pub fn inner_html(&self) -> String {
        self.element_ref()
            .map(|el| el.inner_html())
            .unwrap_or_default()
    }

    /// URL of the page the element belongs to
    pub fn page_url(&self) -> &str {
        &self.doc.url
    }
}

impl fmt::Debug for HtmlElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HtmlElement")
            .field("name", &self.name())
            .field("page_url", &self.doc.url)
            .finish()
    }
}

/// Text held directly by an element, excluding its descendants
fn own_text(element: &ElementRef<'_>) -> String {
    element
        .children()
        .filter_map(|child| child.value().as_text())
        .map(|text| &**text)
        .collect()
}

/// Runs `selector` over the document, or below the element `scope`
fn query(
    doc: &Rc<ParsedHtml>,
    scope: Option<NodeId>,
    selector: &Selector,
) -> Result<Vec<HtmlElement>, BackendError> {
    let scope = match scope {
        Some(id) => match doc.element(id) {
            Some(element) => Some(element),
            None => return Ok(Vec::new()),
        },
        None => None,
    };

    let ids: Vec<NodeId> = match selector.kind() {
        SelectorKind::Any | SelectorKind::Css => {
            let parsed = scraper::Selector::parse(selector.pattern()).map_err(|e| {
                BackendError::InvalidSelector {
                    selector: selector.to_string(),
                    message: e.to_string(),
                }
            })?;
            match scope {
                Some(element) => element.select(&parsed).map(|el| el.id()).collect(),
                None => doc.html.select(&parsed).map(|el| el.id()).collect(),
            }
        }
        SelectorKind::Text => {
            let needle = selector.pattern().to_lowercase();
            scan(doc, scope, |text| text.to_lowercase().contains(&needle))
        }
        SelectorKind::Regex => {
            let regex = RegexBuilder::new(selector.pattern())
                .case_insensitive(true)
                .build()
                .map_err(|e| BackendError::InvalidSelector {
                    selector: selector.to_string(),
                    message: e.to_string(),
                })?;
            scan(doc, scope, |text| regex.is_match(text))
        }
        kind @ SelectorKind::XPath => {
            return Err(BackendError::UnsupportedSelector {
                backend: BACKEND_NAME,
                kind,
            })
        }
    };

    Ok(ids
        .into_iter()
        .map(|id| HtmlElement {
            doc: Rc::clone(doc),
            id,
        })
        .collect())
}

/// Ids of the elements whose own text satisfies `matches`
fn scan<F>(doc: &ParsedHtml, scope: Option<ElementRef<'_>>, matches: F) -> Vec<NodeId>
where
    F: Fn(&str) -> bool,
{
    let candidates: Vec<ElementRef<'_>> = match scope {
        Some(element) => element
            .descendants()
            .skip(1)
            .filter_map(ElementRef::wrap)
            .collect(),
        None => doc
            .html
            .tree
            .root()
            .descendants()
            .filter_map(ElementRef::wrap)
            .collect(),
    };

    candidates
        .into_iter()
        .filter(|element| {
            let text = own_text(element);
            !text.trim().is_empty() && matches(&text)
        })
        .map(|element| element.id())
        .collect()
}

/// Backend parsing static HTML over HTTP or from local files
#[derive(Debug)]
pub struct HtmlBackend {
    client: Client,
    gate: RequestGate,
}

impl HtmlBackend {
    /// Creates a backend with its own HTTP client
    ///
    /// # Arguments
    ///
    /// * `user_agent` - Identification sent with every request
    /// * `gate` - Filter consulted before every network request
    pub fn new(user_agent: &UserAgentConfig, gate: RequestGate) -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(build_http_client(user_agent)?, gate))
    }

    pub fn with_client(client: Client, gate: RequestGate) -> Self {
        Self { client, gate }
    }

    async fn fetch_file(&self, url: &str, path: &Path) -> Result<HtmlPage, BackendError> {
        let body = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| BackendError::Io {
                path: path.display().to_string(),
                source,
            })?;
        Ok(HtmlPage::parse(url, &body))
    }

    async fn fetch_http(&self, request: &Request) -> Result<HtmlPage, BackendError> {
        if self.gate.check_async(request).await == GateDecision::Block {
            return Err(BackendError::Blocked {
                url: request.url.clone(),
            });
        }

        let mut builder = self
            .client
            .request(request.method.clone(), request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let http_error = |source| BackendError::Http {
            url: request.url.clone(),
            source,
        };
        let response = builder.send().await.map_err(http_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status {
                url: request.url.clone(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().to_string();
        let body = response.text().await.map_err(http_error)?;
        Ok(HtmlPage::parse(&final_url, &body))
    }
}

/// Filesystem path of a `file://` URL
///
/// Resolved links come back percent-encoded (`my%20site`), so the URL is
/// decoded when it parses. Host-relative forms such as `file://page.html`
/// fall back to the text after the scheme.
fn local_path(url: &str, raw: &str) -> PathBuf {
    Url::parse(url)
        .ok()
        .and_then(|url| url.to_file_path().ok())
        .unwrap_or_else(|| PathBuf::from(raw))
}

#[async_trait(?Send)]
impl Backend for HtmlBackend {
    type Document = HtmlPage;
    type Element = HtmlElement;

    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    async fn fetch(&self, request: &Request) -> Result<HtmlPage, BackendError> {
        match request.url.strip_prefix("file://") {
            Some(raw) => {
                let path = local_path(&request.url, raw);
                self.fetch_file(&request.url, &path).await
            }
            None => self.fetch_http(request).await,
        }
    }

    fn page_url(&self, document: &HtmlPage) -> String {
        document.url().to_string()
    }

    async fn query_document(
        &self,
        document: &HtmlPage,
        selector: &Selector,
    ) -> Result<Vec<HtmlElement>, BackendError> {
        query(&document.inner, None, selector)
    }

    async fn query_element(
        &self,
        element: &HtmlElement,
        selector: &Selector,
    ) -> Result<Vec<HtmlElement>, BackendError> {
        query(&element.doc, Some(element.id), selector)
    }

    fn links(&self, document: &HtmlPage) -> Vec<String> {
        extract_links(&document.inner.html)
    }

    async fn navigate(&self, document: &HtmlPage) -> Result<Option<HtmlPage>, BackendError> {
        let Some(target) = document.take_pending() else {
            return Ok(None);
        };

        tracing::debug!("Navigating from {} to {}", document.url(), target);
        let request = Request::get(target).with_header("referer", document.url());
        self.fetch(&request).await.map(Some)
    }
}
