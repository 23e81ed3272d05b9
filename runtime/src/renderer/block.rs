//! Subresource blocking while a page loads.
//!
//! Every request the page makes is paused by the browser and classified
//! here. Scripts always go through: the stores render with JS, and request
//! interception itself depends on the page's scripts running.

use std::collections::BTreeSet;

/// Category of a subresource, as reported by the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceKind {
    Document,
    Script,
    Stylesheet,
    Image,
    Font,
    Media,
    Manifest,
    Xhr,
    Fetch,
    /// The browser's own "Other" bucket.
    Other,
    /// Any type without its own tag here (websockets, pings, prefetches...).
    Unlisted,
}

/// Outcome for one paused request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

/// Denylist of resource kinds, fixed when a session opens.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlockPolicy {
    denied: BTreeSet<ResourceKind>,
}

impl BlockPolicy {
    /// Kinds every store page can do without.
    pub const COMMON: [ResourceKind; 5] = [
        ResourceKind::Image,
        ResourceKind::Font,
        ResourceKind::Media,
        ResourceKind::Manifest,
        ResourceKind::Other,
    ];

    /// Deny `kinds`. `Script` is dropped from the set if present.
    pub fn deny<I>(kinds: I) -> Self
    where
        I: IntoIterator<Item = ResourceKind>,
    {
        let denied = kinds
            .into_iter()
            .filter(|kind| *kind != ResourceKind::Script)
            .collect();
        Self { denied }
    }

    /// The common denylist.
    pub fn common() -> Self {
        Self::deny(Self::COMMON)
    }

    /// The common denylist plus stylesheets.
    pub fn common_and_stylesheets() -> Self {
        Self::deny(
            Self::COMMON
                .into_iter()
                .chain(std::iter::once(ResourceKind::Stylesheet)),
        )
    }

    pub fn classify(&self, kind: ResourceKind) -> Decision {
        if kind != ResourceKind::Script && self.denied.contains(&kind) {
            Decision::Deny
        } else {
            Decision::Allow
        }
    }

    pub fn denied(&self) -> impl Iterator<Item = ResourceKind> + '_ {
        self.denied.iter().copied()
    }
}
