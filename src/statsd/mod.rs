use std::fmt;
use std::str::FromStr;

use crate::StatsdError;

pub mod endpoint;
pub mod reporter;
pub mod snapshot;
pub mod socket;
pub mod writer;

/// Upper bound, in bytes, of the rendered `|#...` tag suffix.
pub const MAX_TAGS_LEN: usize = 400;

/// Statsd metric type codes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MetricType {
    /// A monotonically increasing count (`c`).
    Count,
    /// A point-in-time value (`g`).
    Gauge,
}

impl MetricType {
    /// Wire code of the metric type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Count => "c",
            Self::Gauge => "g",
        }
    }
}

/// Tag dialect appended to every metric line.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum TagsFlavor {
    /// Plain statsd, no tags.
    #[default]
    None,
    /// `DogStatsD` `|#key:value,...` suffix.
    Dogstatsd,
}

impl FromStr for TagsFlavor {
    type Err = StatsdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("none") {
            Ok(Self::None)
        } else if s.eq_ignore_ascii_case("dogstatsd") {
            Ok(Self::Dogstatsd)
        } else {
            Err(format!("unsupported tags flavor {s:?}").into())
        }
    }
}

impl fmt::Display for TagsFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Dogstatsd => write!(f, "dogstatsd"),
        }
    }
}

/// Static tags rendered after every metric line.
///
/// The joined `key:value,key:value` form is built once; [`TagSet::suffix`] returns the
/// `|#...` suffix, cut to at most [`MAX_TAGS_LEN`] bytes on a character boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    suffix: String,
}

impl TagSet {
    /// A tag set that renders nothing.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            suffix: String::new(),
        }
    }

    /// Builds a tag set from `(key, value)` pairs.
    #[must_use]
    pub fn new<K, V>(tags: &[(K, V)]) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        if tags.is_empty() {
            return Self::empty();
        }

        let tags_len_bytes: usize = tags
            .iter()
            .map(|(k, v)| k.as_ref().len() + v.as_ref().len() + 1)
            .sum();
        let mut suffix = String::with_capacity(2 + tags_len_bytes + tags.len() - 1);
        suffix.push_str("|#");

        let mut iter = tags.iter();
        if let Some((key, value)) = iter.next() {
            push_tag(&mut suffix, key.as_ref(), value.as_ref());
        }
        for (key, value) in iter {
            suffix.push(',');
            push_tag(&mut suffix, key.as_ref(), value.as_ref());
        }

        truncate_on_char_boundary(&mut suffix, MAX_TAGS_LEN);
        Self { suffix }
    }

    /// The `banner` / `afl_version` pair reported by fuzzers.
    #[must_use]
    pub fn dogstatsd(banner: &str, version: &str) -> Self {
        Self::new(&[("banner", banner), ("afl_version", version)])
    }

    /// Builds the tag set matching `flavor`.
    #[must_use]
    pub fn for_flavor(flavor: TagsFlavor, banner: &str, version: &str) -> Self {
        match flavor {
            TagsFlavor::None => Self::empty(),
            TagsFlavor::Dogstatsd => Self::dogstatsd(banner, version),
        }
    }

    /// The rendered suffix, empty when there are no tags.
    #[must_use]
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.suffix.is_empty()
    }
}

fn push_tag(buffer: &mut String, key: &str, value: &str) {
    buffer.push_str(key);
    buffer.push(':');
    buffer.push_str(value);
}

fn truncate_on_char_boundary(s: &mut String, max_len: usize) {
    if s.len() <= max_len {
        return;
    }
    let mut cut = max_len;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    s.truncate(cut);
}
