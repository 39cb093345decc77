use std::sync::Arc;

use log::warn;
use parking_lot::RwLock;

use crate::feed::{CameraFeed, CameraPosition};

/// Source of every camera feed known to the process.
pub trait FeedRegistry {
    /// Unordered snapshot of the known feeds.
    fn find_all_feeds(&self) -> Vec<Arc<dyn CameraFeed>>;
}

/// Shared, thread-safe list of feeds.
#[derive(Default)]
pub struct FeedList {
    feeds: Arc<RwLock<Vec<Arc<dyn CameraFeed>>>>,
}

impl Clone for FeedList {
    fn clone(&self) -> Self {
        Self {
            feeds: Arc::clone(&self.feeds),
        }
    }
}

impl FeedList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_feeds(feeds: Vec<Arc<dyn CameraFeed>>) -> Self {
        Self {
            feeds: Arc::new(RwLock::new(feeds)),
        }
    }

    pub fn register(&self, feed: Arc<dyn CameraFeed>) {
        self.feeds.write().push(feed);
    }

    pub fn len(&self) -> usize {
        self.feeds.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.feeds.read().is_empty()
    }
}

impl FeedRegistry for FeedList {
    fn find_all_feeds(&self) -> Vec<Arc<dyn CameraFeed>> {
        self.feeds.read().clone()
    }
}

/// Returns the configured feed when it matches `required`, otherwise the
/// first registry feed at that position. A mismatched configured feed is
/// never returned.
pub fn resolve_feed(
    configured: Option<Arc<dyn CameraFeed>>,
    required: CameraPosition,
    registry: &dyn FeedRegistry,
) -> Option<Arc<dyn CameraFeed>> {
    if let Some(feed) = configured {
        let actual = feed.position();
        if actual == required {
            return Some(feed);
        }
        warn!("assigned camera feed has position {actual} but {required} was expected");
    }

    registry
        .find_all_feeds()
        .into_iter()
        .find(|feed| feed.position() == required)
}
