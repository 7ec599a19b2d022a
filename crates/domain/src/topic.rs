//! Topic: an ordered sequence of segments, always free of the process-wide
//! prefix.
//!
//! The prefix is applied by the bus session when a topic crosses the
//! transport boundary ([`Topic::render`]) and removed from inbound topics
//! ([`Topic::strip_prefix`]). Application code never sees it.

use std::fmt;

/// Separator between topic segments.
pub const SEPARATOR: char = '/';
/// Single-level wildcard.
pub const SINGLE_LEVEL: &str = "+";
/// Multi-level wildcard, only valid as the last segment of a filter.
pub const MULTI_LEVEL: &str = "#";

/// A prefix-free bus topic or subscription filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Topic {
    segments: Vec<String>,
}

impl Topic {
    /// Parse a `/`-separated path. A leading separator is ignored.
    #[must_use]
    pub fn new(path: &str) -> Self {
        let path = path.strip_prefix(SEPARATOR).unwrap_or(path);
        Self {
            segments: path.split(SEPARATOR).map(str::to_string).collect(),
        }
    }

    /// Build a topic from individual segments.
    #[must_use]
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Return a new topic with `segment` appended.
    #[must_use]
    pub fn join(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// All segments in order.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The last segment.
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// For a command topic of the shape `.../<name>/set`, return `<name>`.
    #[must_use]
    pub fn set_target(&self) -> Option<&str> {
        match self.segments.as_slice() {
            [.., name, last] if last == "set" && !name.is_empty() => Some(name.as_str()),
            _ => None,
        }
    }

    /// Whether the topic contains a wildcard segment.
    #[must_use]
    pub fn is_filter(&self) -> bool {
        self.segments
            .iter()
            .any(|s| s == SINGLE_LEVEL || s == MULTI_LEVEL)
    }

    /// MQTT-style match of this (concrete) topic against a subscription filter.
    #[must_use]
    pub fn matches(&self, filter: &Topic) -> bool {
        let mut topic = self.segments.iter();
        for pattern in &filter.segments {
            if pattern == MULTI_LEVEL {
                return true;
            }
            match topic.next() {
                Some(segment) if pattern == SINGLE_LEVEL || pattern == segment => {}
                _ => return false,
            }
        }
        topic.next().is_none()
    }

    /// Render the full transport topic, `<prefix>/<segments...>`.
    ///
    /// An empty prefix renders the bare path.
    #[must_use]
    pub fn render(&self, prefix: &str) -> String {
        if prefix.is_empty() {
            self.to_string()
        } else {
            format!("{prefix}{SEPARATOR}{self}")
        }
    }

    /// Remove `prefix` from a raw transport topic.
    ///
    /// Returns `None` when the raw topic is outside the prefix.
    #[must_use]
    pub fn strip_prefix(prefix: &str, raw: &str) -> Option<Self> {
        if prefix.is_empty() {
            return Some(Self::new(raw));
        }
        raw.strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix(SEPARATOR))
            .map(Self::new)
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

impl From<&str> for Topic {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for Topic {
    fn from(path: String) -> Self {
        Self::new(&path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_render_with_prefix() {
        let topic = Topic::new("events/lighting/hall_light");
        assert_eq!(topic.render("home"), "home/events/lighting/hall_light");
    }

    #[test]
    fn should_render_bare_path_when_prefix_empty() {
        let topic = Topic::new("system/status/home-rf");
        assert_eq!(topic.render(""), "system/status/home-rf");
    }

    #[test]
    fn should_ignore_leading_separator() {
        assert_eq!(Topic::new("/a/b"), Topic::new("a/b"));
    }

    #[test]
    fn should_strip_prefix_from_raw_topic() {
        let topic = Topic::strip_prefix("home", "home/events/switch/lamp/set").unwrap();
        assert_eq!(topic, Topic::new("events/switch/lamp/set"));
    }

    #[test]
    fn should_not_strip_partial_prefix_match() {
        assert!(Topic::strip_prefix("home", "homeowner/events/x").is_none());
        assert!(Topic::strip_prefix("home", "other/events/x").is_none());
    }

    #[test]
    fn should_extract_set_target() {
        let topic = Topic::new("events/switch/hall_light/set");
        assert_eq!(topic.set_target(), Some("hall_light"));
        assert_eq!(Topic::new("events/lighting/hall_light").set_target(), None);
        assert_eq!(Topic::new("set").set_target(), None);
    }

    #[test]
    fn should_match_single_level_wildcard() {
        let filter = Topic::new("events/switch/+/set");
        assert!(Topic::new("events/switch/lamp/set").matches(&filter));
        assert!(!Topic::new("events/switch/lamp/extra/set").matches(&filter));
        assert!(!Topic::new("events/switch/lamp").matches(&filter));
    }

    #[test]
    fn should_match_multi_level_wildcard() {
        let filter = Topic::new("events/#");
        assert!(Topic::new("events/lighting/lamp").matches(&filter));
        assert!(Topic::new("events").matches(&filter));
        assert!(!Topic::new("system/status/x").matches(&filter));
        assert!(Topic::new("anything/at/all").matches(&Topic::new("#")));
    }

    #[test]
    fn should_match_exact_topic() {
        let filter = Topic::new("devices/rfxcom/events");
        assert!(Topic::new("devices/rfxcom/events").matches(&filter));
        assert!(!Topic::new("devices/rfxcom").matches(&filter));
    }

    #[test]
    fn should_detect_filters() {
        assert!(Topic::new("devices/relay/+/set").is_filter());
        assert!(!Topic::new("devices/relay/pump/set").is_filter());
    }

    #[test]
    fn should_join_segments() {
        let base = Topic::new("events/lighting");
        assert_eq!(base.join("porch").to_string(), "events/lighting/porch");
    }
}
