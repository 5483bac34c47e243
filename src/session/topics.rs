//! Topic layout.
//!
//! `[prefix/]<kind>/<client_id>[/suffix]`, e.g. `site/conf/ddeeff/lab`.
//! The wildcard form replaces the kind with `+` and is what the status
//! text shows.

use core::fmt::Write;

use crate::app::ports::TopicString;
use crate::config::SessionSettings;

/// Maximum length of the topic shown in status text.
pub const TOPIC_TEXT_MAX: usize = 39;
pub type TopicText = heapless::String<TOPIC_TEXT_MAX>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicKind {
    /// Inbound configuration.
    Config,
    /// Inbound commands.
    Command,
    Status,
    Telemetry,
    Adopt,
    Log,
    /// Online/offline marker (last will).
    Lwt,
}

impl TopicKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Config => "conf",
            Self::Command => "cmnd",
            Self::Status => "stat",
            Self::Telemetry => "tele",
            Self::Adopt => "adopt",
            Self::Log => "log",
            Self::Lwt => "lwt",
        }
    }
}

fn build(settings: &SessionSettings, kind: &str) -> TopicString {
    // Segment capacities keep the worst case well inside TopicString.
    let mut t = TopicString::new();
    if !settings.topic_prefix.is_empty() {
        let _ = write!(t, "{}/", settings.topic_prefix);
    }
    let _ = write!(t, "{}/{}", kind, settings.client_id);
    if !settings.topic_suffix.is_empty() {
        let _ = write!(t, "/{}", settings.topic_suffix);
    }
    t
}

pub fn topic(settings: &SessionSettings, kind: TopicKind) -> TopicString {
    build(settings, kind.as_str())
}

pub fn wildcard(settings: &SessionSettings) -> TopicString {
    build(settings, "+")
}

/// Which inbound category `topic` belongs to, if any.
pub fn classify(settings: &SessionSettings, topic_name: &str) -> Option<TopicKind> {
    [TopicKind::Config, TopicKind::Command]
        .into_iter()
        .find(|kind| topic(settings, *kind).as_str() == topic_name)
}

/// Wildcard topic truncated to [`TOPIC_TEXT_MAX`] characters.
pub fn topic_text(settings: &SessionSettings) -> TopicText {
    let mut text = TopicText::new();
    for c in wildcard(settings).chars() {
        if text.push(c).is_err() {
            break;
        }
    }
    text
}
