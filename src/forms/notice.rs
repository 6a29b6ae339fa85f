use std::time::{Duration, Instant};

/// How long success and info banners stay up
pub const BANNER_TIMEOUT: Duration = Duration::from_secs(8);

const SUCCESS_ICON: &str = "M9 12l2 2 4-4m6 2a9 9 0 11-18 0 9 9 0 0118 0z";
const ERROR_ICON: &str = "M12 8v4m0 4h.01M21 12a9 9 0 11-18 0 9 9 0 0118 0z";
const WARNING_ICON: &str = "M12 9v2m0 4h.01m-6.938 4h13.856c1.54 0 2.502-1.667 1.732-3L13.732 4c-.77-1.333-2.694-1.333-3.464 0L3.34 16c-.77 1.333.192 3 1.732 3z";
const INFO_ICON: &str = "M13 16h-1v-4h-1m1-4h.01M21 12a9 9 0 11-18 0 9 9 0 0118 0z";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Info,
    Warning,
    Error,
}

impl NoticeKind {
    /// SVG path data for the banner icon
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Success => SUCCESS_ICON,
            Self::Error => ERROR_ICON,
            Self::Warning => WARNING_ICON,
            Self::Info => INFO_ICON,
        }
    }

    pub fn style(&self) -> &'static str {
        match self {
            Self::Success => "alert-success",
            Self::Info => "alert-info",
            Self::Warning => "alert-warning",
            Self::Error => "alert-error",
        }
    }

    fn expires(&self) -> bool {
        matches!(self, Self::Success | Self::Info)
    }
}

/// A message shown to the visitor after a form submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn new(kind: NoticeKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(NoticeKind::Success, text)
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(NoticeKind::Info, text)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(NoticeKind::Warning, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(NoticeKind::Error, text)
    }
}

/// Dismissible banner. Success and info banners expire after [`BANNER_TIMEOUT`].
#[derive(Debug, Clone)]
pub struct Banner {
    notice: Notice,
    shown_at: Instant,
    dismissed: bool,
}

impl Banner {
    pub fn show(notice: Notice, shown_at: Instant) -> Self {
        Self {
            notice,
            shown_at,
            dismissed: false,
        }
    }

    pub fn notice(&self) -> &Notice {
        &self.notice
    }

    pub fn dismiss(&mut self) {
        self.dismissed = true;
    }

    /// When the banner hides itself, if ever
    pub fn expires_at(&self) -> Option<Instant> {
        self.notice
            .kind
            .expires()
            .then(|| self.shown_at + BANNER_TIMEOUT)
    }

    pub fn is_visible_at(&self, now: Instant) -> bool {
        if self.dismissed {
            return false;
        }
        match self.expires_at() {
            Some(expires_at) => now < expires_at,
            None => true,
        }
    }
}
