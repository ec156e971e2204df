use chrono::{DateTime, Utc};
use std::borrow::Cow;
use typed_builder::TypedBuilder;
pub use zwave_core::log::Loglevel;
use zwave_core::log::LogPayload;

#[cfg(feature = "std")]
mod colored {
    use super::*;
    use termcolor::ColorSpec;

    pub trait LogFormatter {
        fn format_log(&self, log: &LogInfo, level: Loglevel) -> Vec<FormattedString>;
    }

    pub struct FormattedString {
        pub string: Cow<'static, str>,
        pub color: Option<ColorSpec>,
    }

    pub trait WithColor {
        fn with_color(self, color: ColorSpec) -> FormattedString;
    }

    impl FormattedString {
        pub fn new(string: impl Into<Cow<'static, str>>, color: Option<ColorSpec>) -> Self {
            Self {
                string: string.into(),
                color,
            }
        }
    }

    impl<T> From<T> for FormattedString
    where
        T: Into<Cow<'static, str>>,
    {
        fn from(string: T) -> Self {
            Self::new(string, None)
        }
    }

    impl<T> WithColor for T
    where
        T: Into<Cow<'static, str>>,
    {
        fn with_color(self, color: ColorSpec) -> FormattedString {
            FormattedString::new(self, Some(color))
        }
    }
}

#[cfg(feature = "std")]
pub use colored::*;

/// A trait for logging messages
pub trait Logger {
    fn log(&mut self, log: LogInfo, level: Loglevel);

    fn log_level(&self) -> Loglevel;
    fn set_log_level(&mut self, level: Loglevel);
}

/// A variant of the [Logger] trait that does not require mutability. This is typically an abstraction
/// over a message channel to another thread handling the actual logging.
pub trait ImmutableLogger: Send + Sync {
    fn log(&self, log: LogInfo, level: Loglevel);

    fn log_level(&self) -> Loglevel;
    fn set_log_level(&self, level: Loglevel);
}

/// Like [ImmutableLogger], but for loggers that are only ever driven from
/// a single task/actor and don't need to cross a thread boundary - e.g.
/// the serial API and driver actors, which hold `&dyn LocalImmutableLogger`
/// for the duration of their own event loop.
pub trait LocalImmutableLogger {
    fn log(&self, log: LogInfo, level: Loglevel);

    fn log_level(&self) -> Loglevel;
    fn set_log_level(&self, level: Loglevel);
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    #[default]
    None,
    Inbound,
    Outbound,
}

#[derive(Debug, Clone, TypedBuilder)]
pub struct LogInfo {
    #[builder(default = Utc::now())]
    pub timestamp: DateTime<Utc>,
    #[builder(default)]
    pub direction: Direction,
    pub label: &'static str,
    #[builder(default, setter(strip_option))]
    pub primary_tags: Option<Vec<Cow<'static, str>>>,
    #[builder(default, setter(strip_option))]
    pub secondary_tag: Option<Cow<'static, str>>,
    pub payload: LogPayload,
    // FIXME: Context
}
