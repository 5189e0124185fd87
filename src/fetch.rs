//! Background menu fetcher
//!
//! Fetches the restaurant's daily menu page immediately and then on a fixed
//! interval from its own thread. Results go to subscribers on that thread;
//! UI consumers must marshal them onto the UI thread themselves.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use chrono::{Datelike, Local, Weekday};
use crossbeam::channel::{self, RecvTimeoutError, Sender};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;

use crate::error::{OverlayError, Result};
use crate::menu::{DailyMenu, CZECH_DAY_NAMES};

pub const USER_AGENT: &str = "Menu500Tracker/1.0";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

static HEADING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<h4[^>]*>(.*?)</h4>").expect("valid heading regex"));
static PARAGRAPH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<p[^>]*>(.*?)</p>").expect("valid paragraph regex"));
static LINE_BREAK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<br\s*/?>|\r|\n").expect("valid line break regex"));
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid tag regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Handle returned by [`MenuFetchService::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

type Listener = Arc<dyn Fn(&DailyMenu) + Send + Sync>;

#[derive(Default)]
struct Shared {
    listeners: Mutex<Vec<(Subscription, Listener)>>,
    current: Mutex<Option<DailyMenu>>,
    next_id: AtomicU64,
}

impl Shared {
    fn publish(&self, menu: DailyMenu) {
        *self.current.lock() = Some(menu.clone());
        // Call outside the lock so listeners may (un)subscribe
        let listeners: Vec<Listener> = self.listeners.lock().iter().map(|(_, l)| l.clone()).collect();
        for listener in listeners {
            listener(&menu);
        }
    }
}

/// Running fetch thread and the channel that stops it
struct Worker {
    shutdown_tx: Sender<()>,
    handle: JoinHandle<()>,
}

pub struct MenuFetchService {
    url: String,
    refresh_interval: Duration,
    shared: Arc<Shared>,
    worker: Mutex<Option<Worker>>,
}

impl MenuFetchService {
    pub fn new(url: impl Into<String>, refresh_interval: Duration) -> Self {
        Self {
            url: url.into(),
            refresh_interval,
            shared: Arc::new(Shared::default()),
            worker: Mutex::new(None),
        }
    }

    /// Register for menu updates. Listeners run on the fetch thread.
    pub fn subscribe(&self, listener: impl Fn(&DailyMenu) + Send + Sync + 'static) -> Subscription {
        let id = Subscription(self.shared.next_id.fetch_add(1, Ordering::Relaxed));
        self.shared.listeners.lock().push((id, Arc::new(listener)));
        id
    }

    /// Returns false if the subscription was already gone
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        let mut listeners = self.shared.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(id, _)| *id != subscription);
        listeners.len() != before
    }

    /// Latest result, if any fetch has completed
    pub fn current_menu(&self) -> Option<DailyMenu> {
        self.shared.current.lock().clone()
    }

    /// Publish a result as if it had just been fetched
    pub fn publish(&self, menu: DailyMenu) {
        self.shared.publish(menu);
    }

    pub fn is_running(&self) -> bool {
        self.worker.lock().is_some()
    }

    /// Fetch now, then every refresh interval, until disposed
    pub fn start(&self) {
        let mut worker = self.worker.lock();
        if worker.is_some() {
            return;
        }

        let (shutdown_tx, shutdown_rx) = channel::bounded::<()>(1);
        let shared = self.shared.clone();
        let url = self.url.clone();
        let interval = self.refresh_interval;

        let spawned = std::thread::Builder::new()
            .name("menu-fetch".to_string())
            .spawn(move || {
                let client = match reqwest::blocking::Client::builder()
                    .user_agent(USER_AGENT)
                    .timeout(REQUEST_TIMEOUT)
                    .build()
                {
                    Ok(client) => client,
                    Err(e) => {
                        tracing::error!("Failed to build HTTP client: {}", e);
                        shared.publish(DailyMenu::error(format!("Unexpected error: {}", e)));
                        return;
                    }
                };

                loop {
                    let menu = fetch_today(&client, &url, Local::now().weekday());
                    tracing::info!(is_error = menu.is_error, "Menu fetched");
                    shared.publish(menu);

                    match shutdown_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        _ => break,
                    }
                }
                tracing::debug!("Menu fetch thread exiting");
            });

        match spawned {
            Ok(handle) => *worker = Some(Worker { shutdown_tx, handle }),
            Err(e) => tracing::error!("Failed to spawn menu fetch thread: {}", e),
        }
    }

    /// Stop the fetch thread. Safe to call more than once.
    pub fn dispose(&self) {
        let Some(worker) = self.worker.lock().take() else {
            return;
        };
        let _ = worker.shutdown_tx.send(());
        if worker.handle.join().is_err() {
            tracing::error!("Menu fetch thread panicked");
        }
    }
}

impl Drop for MenuFetchService {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Fetch and parse the menu for `day`
pub fn fetch_today(client: &reqwest::blocking::Client, url: &str, day: Weekday) -> DailyMenu {
    if matches!(day, Weekday::Sat | Weekday::Sun) {
        return DailyMenu::weekend();
    }

    let html = client
        .get(url)
        .send()
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.text());

    match html {
        Ok(html) => parse_menu(&html, day).unwrap_or_else(|e| DailyMenu::error(e.to_string())),
        Err(e) => {
            tracing::warn!("Menu request failed: {}", e);
            DailyMenu::error(OverlayError::Fetch(e.to_string()).to_string())
        }
    }
}

/// Extract `day`'s soup and main dish from the menu page.
///
/// The page lists each day under an `<h4>` heading; everything up to the
/// next `<h4>` belongs to that day. The first of two items is the soup.
pub fn parse_menu(html: &str, day: Weekday) -> Result<DailyMenu> {
    let czech_day = CZECH_DAY_NAMES
        .get(&day)
        .ok_or_else(|| OverlayError::Parse("Could not determine day name".to_string()))?;

    let headings: Vec<_> = HEADING_RE.captures_iter(html).collect();
    let index = headings
        .iter()
        .position(|c| strip_html(&c[1]).to_lowercase() == czech_day.to_lowercase())
        .ok_or_else(|| OverlayError::Parse("Could not find today's menu section".to_string()))?;

    let start = headings[index].get(0).map(|m| m.end()).unwrap_or(html.len());
    let end = headings
        .get(index + 1)
        .and_then(|c| c.get(0))
        .map(|m| m.start())
        .unwrap_or(html.len());
    let section = &html[start..end];

    let mut items: Vec<String> = PARAGRAPH_RE
        .captures_iter(section)
        .map(|c| strip_html(&c[1]))
        .filter(|p| !p.is_empty())
        .collect();

    if items.is_empty() {
        items = LINE_BREAK_RE
            .split(section)
            .map(strip_html)
            .filter(|line| !line.is_empty())
            .collect();
    }

    let mut items = items.into_iter();
    let (soup, main_dish) = match (items.next(), items.next()) {
        (Some(soup), Some(main)) => (Some(soup), main),
        (Some(main), None) => (None, main),
        _ => return Err(OverlayError::Parse("Could not parse menu items".to_string())),
    };

    Ok(DailyMenu::new(*czech_day, soup, main_dish))
}

/// Drop tags, decode the common entities and normalize whitespace
pub fn strip_html(html: &str) -> String {
    let text = TAG_RE.replace_all(html, " ");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");
    WHITESPACE_RE.replace_all(&text, " ").trim().to_string()
}
