use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Default)]
struct HandleState {
    pending: Vec<String>,
    current_url: Option<String>,
}

/// Gives handlers access to the running crawl
///
/// Clones share state. Obtain one from [`Harvester::handle`] before the
/// crawl starts and move it into handlers that need to queue URLs or know
/// which URL is being processed.
///
/// [`Harvester::handle`]: crate::harvester::Harvester::handle
#[derive(Debug, Clone, Default)]
pub struct CrawlHandle {
    inner: Rc<RefCell<HandleState>>,
}

impl CrawlHandle {
    /// Queues an absolute URL for crawling
    ///
    /// The URL goes through the same allow-list and robots.txt checks as
    /// any other frontier entry.
    pub fn follow_url(&self, url: impl Into<String>) {
        self.inner.borrow_mut().pending.push(url.into());
    }

    /// The frontier entry or navigated page currently being processed
    pub fn current_url(&self) -> Option<String> {
        self.inner.borrow().current_url.clone()
    }

    pub(crate) fn set_current_url(&self, url: &str) {
        self.inner.borrow_mut().current_url = Some(url.to_string());
    }

    pub(crate) fn take_pending(&self) -> Vec<String> {
        std::mem::take(&mut self.inner.borrow_mut().pending)
    }
}
