//! Path stack handed from the mount point down to the method resolver.

use std::collections::VecDeque;

use percent_encoding::percent_decode_str;

/// The unconsumed, percent-decoded segments of a request path.
///
/// Empty segments (from `//` or a trailing `/`) are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathStack {
    segments: VecDeque<String>,
}

impl PathStack {
    /// Split and decode a URI path.
    #[must_use]
    pub fn from_path(path: &str) -> Self {
        let segments = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(decode_uri_component)
            .collect();
        Self { segments }
    }

    /// Whether every segment has been consumed.
    #[must_use]
    pub fn is_at_end(&self) -> bool {
        self.segments.is_empty()
    }

    /// Remove and return the next segment.
    pub fn pop(&mut self) -> Option<String> {
        self.segments.pop_front()
    }

    /// The next segment without consuming it.
    #[must_use]
    pub fn peek(&self) -> Option<&str> {
        self.segments.front().map(String::as_str)
    }

    /// Number of segments left.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether no segments are left.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The remaining segments, in order.
    #[must_use]
    pub fn into_segments(self) -> Vec<String> {
        self.segments.into()
    }

    /// Consume `prefix` if the stack starts with it; otherwise leave it untouched.
    pub fn strip_prefix(&mut self, prefix: &[String]) -> bool {
        if prefix.len() > self.segments.len()
            || !prefix.iter().zip(&self.segments).all(|(a, b)| a == b)
        {
            return false;
        }
        self.segments.drain(..prefix.len());
        true
    }
}

/// Decode a percent-encoded URI component.
fn decode_uri_component(s: &str) -> String {
    percent_decode_str(s).decode_utf8_lossy().into_owned()
}
