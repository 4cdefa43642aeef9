//! Subreddit feed fetched in a background thread.
//!
//! Works like a polling monitor: the UI thread never blocks on the
//! network, it reads the latest [`FeedState`] behind a lock and notices
//! new results through a version counter.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use backdrop_core::Interval;
use rand::Rng;
use serde::Deserialize;

use crate::decrypt::Decrypt;

/// Silent refresh cadence.
pub const POLL_INTERVAL: Duration = Duration::from_secs(120);

/// Timeout for HTTP requests.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const ITEM_LIMIT: usize = 10;

pub const LOADING_TEXT: &str = "Establishing Uplink...";
pub const ERROR_TEXT: &str = "Signal Lost: Protocol Error";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    pub permalink: String,
    pub subreddit: String,
    pub author: String,
}

impl FeedItem {
    /// Absolute link to the post.
    pub fn url(&self) -> String {
        format!("https://reddit.com{}", self.permalink)
    }

    /// `r/<sub> • u/<author>`
    pub fn meta(&self) -> String {
        format!("r/{} • u/{}", self.subreddit, self.author)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FeedState {
    #[default]
    Hidden,
    Loading,
    Items(Vec<FeedItem>),
    Error,
}

/// Fetches items for a `+`-joined subreddit list.
pub type Fetcher = Arc<dyn Fn(&str) -> Result<Vec<FeedItem>, String> + Send + Sync>;

/// Reddit listing JSON (partial - only fields we need).
#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: Post,
}

#[derive(Debug, Deserialize)]
struct Post {
    title: String,
    permalink: String,
    subreddit: String,
    author: String,
}

impl From<Listing> for Vec<FeedItem> {
    fn from(listing: Listing) -> Self {
        listing
            .data
            .children
            .into_iter()
            .take(ITEM_LIMIT)
            .map(|child| FeedItem {
                title: child.data.title,
                permalink: child.data.permalink,
                subreddit: child.data.subreddit,
                author: child.data.author,
            })
            .collect()
    }
}

/// Fetch the newest posts from reddit.
pub fn fetch_reddit(subs: &str) -> Result<Vec<FeedItem>, String> {
    let url = format!("https://www.reddit.com/r/{subs}/new.json?limit={ITEM_LIMIT}");

    let agent = ureq::Agent::config_builder()
        .timeout_global(Some(REQUEST_TIMEOUT))
        .build()
        .new_agent();

    let listing: Listing = agent
        .get(&url)
        .header("User-Agent", concat!("backdrop/", env!("CARGO_PKG_VERSION")))
        .call()
        .map_err(|e| format!("HTTP error: {e}"))?
        .body_mut()
        .read_json()
        .map_err(|e| format!("JSON parse error: {e}"))?;

    Ok(listing.into())
}

/// Owns the poll timer and the shared state written by fetch threads.
pub struct FeedMonitor {
    state: Arc<RwLock<FeedState>>,
    /// Bumped for every request; a response from an older request is dropped.
    generation: Arc<AtomicU64>,
    /// Bumped whenever `state` changes.
    version: Arc<AtomicU64>,
    fetcher: Fetcher,
    poll: Interval,
    enabled: bool,
    subreddits: String,
}

impl FeedMonitor {
    pub fn new() -> Self {
        Self::with_fetcher(Arc::new(fetch_reddit))
    }

    pub fn with_fetcher(fetcher: Fetcher) -> Self {
        Self {
            state: Arc::new(RwLock::new(FeedState::Hidden)),
            generation: Arc::new(AtomicU64::new(0)),
            version: Arc::new(AtomicU64::new(0)),
            fetcher,
            poll: Interval::new(POLL_INTERVAL),
            enabled: false,
            subreddits: String::new(),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> FeedState {
        self.state.read().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Apply the feed settings and do a visible refresh.
    pub fn configure(&mut self, enabled: bool, subreddits: &str, now: Instant) -> Option<JoinHandle<()>> {
        self.enabled = enabled;
        self.subreddits = if subreddits.is_empty() {
            "matrix+cyberpunk".to_string()
        } else {
            subreddits.to_string()
        };
        if enabled {
            self.poll.restart(POLL_INTERVAL, now);
        } else {
            self.poll.cancel();
        }
        self.refresh(false)
    }

    /// Start a fetch. A silent refresh keeps whatever is on screen until
    /// it succeeds; a visible one shows the loading text first and the
    /// error text on failure.
    pub fn refresh(&self, silent: bool) -> Option<JoinHandle<()>> {
        // the bump and the publish share one guard so a fetch thread
        // never sees the new generation with the old state
        let generation = {
            let mut guard = match self.state.write() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
            let shown = if !self.enabled {
                Some(FeedState::Hidden)
            } else if !silent {
                Some(FeedState::Loading)
            } else {
                None
            };
            if let Some(shown) = shown {
                *guard = shown;
                self.version.fetch_add(1, Ordering::AcqRel);
            }
            generation
        };
        if !self.enabled {
            return None;
        }

        let state = self.state.clone();
        let current = self.generation.clone();
        let version = self.version.clone();
        let fetcher = self.fetcher.clone();
        let subs = self.subreddits.clone();

        Some(thread::spawn(move || {
            let result = fetcher(&subs);
            let next = match result {
                Ok(items) => FeedState::Items(items),
                Err(e) if silent => {
                    tracing::warn!("feed poll failed: {e}");
                    return;
                }
                Err(e) => {
                    tracing::warn!("feed refresh failed: {e}");
                    FeedState::Error
                }
            };
            let Ok(mut s) = state.write() else {
                return;
            };
            if current.load(Ordering::Acquire) != generation {
                tracing::debug!(generation, "dropping superseded feed response");
                return;
            }
            *s = next;
            version.fetch_add(1, Ordering::AcqRel);
        }))
    }

    /// Silent refresh when the poll interval is due.
    pub fn tick(&mut self, now: Instant) -> Option<JoinHandle<()>> {
        if self.poll.poll(now) {
            // a visible refresh still in flight owns the screen
            if self.state() == FeedState::Loading {
                return None;
            }
            return self.refresh(true);
        }
        None
    }
}

impl Default for FeedMonitor {
    fn default() -> Self {
        Self::new()
    }
}

/// One displayed entry: the item and its title animation.
#[derive(Debug, Clone)]
pub struct FeedEntry {
    pub item: FeedItem,
    pub title: Decrypt,
}

/// Display side of the feed: per-entry animations and the keyboard
/// highlight that stands in for mouse hover.
#[derive(Debug, Default)]
pub struct FeedPanel {
    seen_version: u64,
    state: FeedState,
    entries: Vec<FeedEntry>,
    highlighted: Option<usize>,
}

impl FeedPanel {
    /// Pick up a new state from the monitor. Entries are rebuilt
    /// scrambled whenever the item list is replaced.
    pub fn sync(&mut self, monitor: &FeedMonitor, rng: &mut impl Rng) -> bool {
        let version = monitor.version();
        if version == self.seen_version {
            return false;
        }
        self.seen_version = version;
        let state = monitor.state();
        if let FeedState::Items(items) = &state {
            self.entries = items
                .iter()
                .map(|item| FeedEntry {
                    item: item.clone(),
                    title: Decrypt::new(&item.title, rng),
                })
                .collect();
        } else {
            self.entries.clear();
        }
        self.highlighted = None;
        self.state = state;
        true
    }

    pub fn state(&self) -> &FeedState {
        &self.state
    }

    pub fn entries(&self) -> &[FeedEntry] {
        &self.entries
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.highlighted
    }

    pub fn highlight_next(&mut self, now: Instant) {
        let next = match self.highlighted {
            None => 0,
            Some(i) => i + 1,
        };
        self.move_highlight(next, now);
    }

    pub fn highlight_prev(&mut self, now: Instant) {
        let len = self.entries.len();
        let prev = match self.highlighted {
            None | Some(0) => len.saturating_sub(1),
            Some(i) => i - 1,
        };
        self.move_highlight(prev, now);
    }

    /// Drop the highlight, concealing the title it was on.
    pub fn clear_highlight(&mut self, now: Instant) {
        if let Some(old) = self.highlighted.take()
            && let Some(entry) = self.entries.get_mut(old)
        {
            entry.title.hover(false, now);
        }
    }

    fn move_highlight(&mut self, index: usize, now: Instant) {
        if self.entries.is_empty() {
            return;
        }
        let index = index % self.entries.len();
        self.clear_highlight(now);
        self.entries[index].title.hover(true, now);
        self.highlighted = Some(index);
    }

    /// Link of the highlighted entry.
    pub fn highlighted_url(&self) -> Option<String> {
        self.highlighted
            .and_then(|i| self.entries.get(i))
            .map(|e| e.item.url())
    }

    pub fn tick(&mut self, now: Instant, rng: &mut impl Rng) {
        for entry in self.entries.iter_mut().filter(|e| e.title.is_animating()) {
            entry.title.tick(now, rng);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};
    use std::sync::Mutex;

    fn item(title: &str) -> FeedItem {
        FeedItem {
            title: title.to_string(),
            permalink: format!("/r/matrix/comments/{title}"),
            subreddit: "matrix".to_string(),
            author: "neo".to_string(),
        }
    }

    /// Fetcher that answers from a queue of canned results.
    fn scripted(results: Vec<Result<Vec<FeedItem>, String>>) -> Fetcher {
        let queue = Mutex::new(results.into_iter());
        Arc::new(move |_subs: &str| {
            queue
                .lock()
                .unwrap()
                .next()
                .unwrap_or_else(|| Err("exhausted".to_string()))
        })
    }

    fn join(handle: Option<JoinHandle<()>>) {
        handle.expect("a fetch thread").join().unwrap();
    }

    #[test]
    fn test_listing_parses_nested_children() {
        let json = r#"{"kind":"Listing","data":{"after":null,"children":[
            {"kind":"t3","data":{"title":"Red pill","permalink":"/r/matrix/comments/1/red_pill/",
             "subreddit":"matrix","author":"morpheus","score":9}},
            {"kind":"t3","data":{"title":"Blue pill","permalink":"/r/matrix/comments/2/blue_pill/",
             "subreddit":"matrix","author":"cypher"}}]}}"#;
        let listing: Listing = serde_json::from_str(json).unwrap();
        let items: Vec<FeedItem> = listing.into();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Red pill");
        assert_eq!(items[0].url(), "https://reddit.com/r/matrix/comments/1/red_pill/");
        assert_eq!(items[1].meta(), "r/matrix • u/cypher");
    }

    #[test]
    fn test_disabled_is_hidden_without_fetching() {
        let mut feed = FeedMonitor::with_fetcher(scripted(vec![]));
        assert!(feed.configure(false, "matrix", Instant::now()).is_none());
        assert_eq!(feed.state(), FeedState::Hidden);
    }

    #[test]
    fn test_visible_refresh_shows_loading_then_items() {
        let (tx, rx) = std::sync::mpsc::channel::<()>();
        let rx = Mutex::new(rx);
        let fetcher: Fetcher = Arc::new(move |_subs: &str| {
            rx.lock().unwrap().recv().unwrap();
            Ok(vec![item("one")])
        });
        let mut feed = FeedMonitor::with_fetcher(fetcher);
        let handle = feed.configure(true, "matrix", Instant::now());
        assert_eq!(feed.state(), FeedState::Loading);
        tx.send(()).unwrap();
        join(handle);
        assert_eq!(feed.state(), FeedState::Items(vec![item("one")]));
    }

    #[test]
    fn test_visible_failure_shows_error() {
        let mut feed = FeedMonitor::with_fetcher(scripted(vec![Err("offline".into())]));
        join(feed.configure(true, "matrix", Instant::now()));
        assert_eq!(feed.state(), FeedState::Error);
    }

    #[test]
    fn test_silent_failure_keeps_error_message() {
        let mut feed = FeedMonitor::with_fetcher(scripted(vec![
            Err("offline".into()),
            Err("still offline".into()),
            Ok(vec![item("back")]),
        ]));
        let t0 = Instant::now();
        join(feed.configure(true, "matrix", t0));
        assert_eq!(feed.state(), FeedState::Error);

        join(feed.tick(t0 + POLL_INTERVAL));
        assert_eq!(feed.state(), FeedState::Error);

        join(feed.tick(t0 + POLL_INTERVAL * 2));
        assert_eq!(feed.state(), FeedState::Items(vec![item("back")]));
    }

    #[test]
    fn test_silent_failure_keeps_items() {
        let mut feed = FeedMonitor::with_fetcher(scripted(vec![
            Ok(vec![item("kept")]),
            Err("offline".into()),
        ]));
        let t0 = Instant::now();
        join(feed.configure(true, "matrix", t0));
        let version = feed.version();
        join(feed.tick(t0 + POLL_INTERVAL));
        assert_eq!(feed.state(), FeedState::Items(vec![item("kept")]));
        assert_eq!(feed.version(), version);
    }

    #[test]
    fn test_poll_waits_for_interval() {
        let mut feed = FeedMonitor::with_fetcher(scripted(vec![Ok(vec![])]));
        let t0 = Instant::now();
        join(feed.configure(true, "matrix", t0));
        assert!(feed.tick(t0 + Duration::from_secs(60)).is_none());
    }

    #[test]
    fn test_superseded_response_is_dropped() {
        let (slow_tx, slow_rx) = std::sync::mpsc::channel::<()>();
        let slow_rx = Mutex::new(slow_rx);
        let fetcher: Fetcher = Arc::new(move |subs: &str| {
            if subs == "slow" {
                slow_rx.lock().unwrap().recv().unwrap();
                Ok(vec![item("stale")])
            } else {
                Ok(vec![item("fresh")])
            }
        });
        let mut feed = FeedMonitor::with_fetcher(fetcher);
        let t0 = Instant::now();
        let slow = feed.configure(true, "slow", t0);
        join(feed.configure(true, "fast", t0));
        slow_tx.send(()).unwrap();
        join(slow);
        assert_eq!(feed.state(), FeedState::Items(vec![item("fresh")]));
    }

    #[test]
    fn test_disabling_discards_in_flight_response() {
        let (tx, rx) = std::sync::mpsc::channel::<()>();
        let rx = Mutex::new(rx);
        let fetcher: Fetcher = Arc::new(move |_subs: &str| {
            rx.lock().unwrap().recv().unwrap();
            Ok(vec![item("late")])
        });
        let mut feed = FeedMonitor::with_fetcher(fetcher);
        let t0 = Instant::now();
        let pending = feed.configure(true, "matrix", t0);
        assert!(feed.configure(false, "matrix", t0).is_none());
        tx.send(()).unwrap();
        join(pending);
        assert_eq!(feed.state(), FeedState::Hidden);
    }

    #[test]
    fn test_response_waiting_on_lock_respects_newer_generation() {
        let (tx, rx) = std::sync::mpsc::channel::<()>();
        let rx = Mutex::new(rx);
        let fetcher: Fetcher = Arc::new(move |_subs: &str| {
            rx.lock().unwrap().recv().unwrap();
            Ok(vec![item("late")])
        });
        let mut feed = FeedMonitor::with_fetcher(fetcher);
        let pending = feed.configure(true, "matrix", Instant::now());

        // finish the fetch while the state is locked, then supersede it
        // under the same guard
        let state = feed.state.clone();
        let mut guard = state.write().unwrap();
        tx.send(()).unwrap();
        thread::sleep(Duration::from_millis(50));
        feed.generation.fetch_add(1, Ordering::AcqRel);
        *guard = FeedState::Hidden;
        drop(guard);

        join(pending);
        assert_eq!(feed.state(), FeedState::Hidden);
    }

    #[test]
    fn test_silent_poll_leaves_version_alone() {
        let (tx, rx) = std::sync::mpsc::channel::<()>();
        let rx = Mutex::new(rx);
        let fetcher: Fetcher = Arc::new(move |_subs: &str| {
            rx.lock().unwrap().recv().unwrap();
            Ok(vec![item("same")])
        });
        let mut feed = FeedMonitor::with_fetcher(fetcher);
        let t0 = Instant::now();
        let first = feed.configure(true, "matrix", t0);
        tx.send(()).unwrap();
        join(first);
        let version = feed.version();

        let poll = feed.tick(t0 + POLL_INTERVAL);
        assert_eq!(feed.version(), version);
        tx.send(()).unwrap();
        join(poll);
        assert_eq!(feed.version(), version + 1);
    }

    #[test]
    fn test_panel_rebuilds_scrambled_entries_and_highlights() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut feed = FeedMonitor::with_fetcher(scripted(vec![Ok(vec![item("alpha"), item("beta")])]));
        let t0 = Instant::now();
        join(feed.configure(true, "matrix", t0));

        let mut panel = FeedPanel::default();
        assert!(panel.sync(&feed, &mut rng));
        assert!(!panel.sync(&feed, &mut rng));
        assert_eq!(panel.entries().len(), 2);
        assert_ne!(panel.entries()[0].title.display(), "alpha");
        assert!(panel.highlighted_url().is_none());

        panel.highlight_prev(t0);
        assert_eq!(panel.highlighted(), Some(1));
        panel.highlight_next(t0);
        assert_eq!(panel.highlighted(), Some(0));
        assert_eq!(
            panel.highlighted_url().as_deref(),
            Some("https://reddit.com/r/matrix/comments/alpha")
        );

        let mut now = t0;
        for _ in 0..40 {
            now += crate::decrypt::DECRYPT_TICK;
            panel.tick(now, &mut rng);
        }
        assert_eq!(panel.entries()[0].title.display(), "alpha");
        assert_ne!(panel.entries()[1].title.display(), "beta");
    }
}
