use std::fmt;

/// Connection state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    Disconnected,
    Connecting,
    Connected,
    LoggingIn,
    LoggingIn2,
    LoggedIn,
    /// Terminal: no further automatic reconnects.
    Error,
}

impl State {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "DISCONNECTED",
            Self::Connecting => "CONNECTING",
            Self::Connected => "CONNECTED",
            Self::LoggingIn => "LOGGING_IN",
            Self::LoggingIn2 => "LOGGING_IN_2",
            Self::LoggedIn => "LOGGED_IN",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
