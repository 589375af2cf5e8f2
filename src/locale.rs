/// Placeholder shown when the endpoint replies with a blank string.
pub const EMPTY_REPLY: &str = "(empty reply)";

/// Last-resort detail for a failed HTTP exchange with nothing to report.
pub const UNKNOWN_ERROR: &str = "unknown error";

/// Display language of the interface, also sent to the endpoint as the
/// target language of the reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    English,
    Chinese,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Chinese => "zh",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Some(Language::English),
            "zh" | "zh-cn" | "chinese" => Some(Language::Chinese),
            _ => None,
        }
    }

    /// Shown for 404/502 responses and for a `{}` payload.
    pub fn network_unstable(&self) -> &'static str {
        match self {
            Language::English => "The network is unstable, please try again.",
            Language::Chinese => "网络不稳定，请重试。",
        }
    }

    /// Shown instead of the raw error when the machine is offline.
    pub fn offline(&self) -> &'static str {
        match self {
            Language::English => "You appear to be offline. Check your connection and try again.",
            Language::Chinese => "网络已断开，请检查网络连接后重试。",
        }
    }

    pub fn input_placeholder(&self) -> &'static str {
        match self {
            Language::English => "Type a message...",
            Language::Chinese => "输入消息...",
        }
    }

    pub fn thinking(&self) -> &'static str {
        match self {
            Language::English => "Thinking",
            Language::Chinese => "思考中",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_accepts_codes_and_names() {
        assert_eq!(Language::from_str("en"), Some(Language::English));
        assert_eq!(Language::from_str(" ZH "), Some(Language::Chinese));
        assert_eq!(Language::from_str("chinese"), Some(Language::Chinese));
        assert_eq!(Language::from_str("fr"), None);
    }

    #[test]
    fn test_codes_round_trip_for_every_language() {
        for language in [Language::English, Language::Chinese] {
            assert_eq!(Language::from_str(language.as_str()), Some(language));
        }
    }

    #[test]
    fn test_notices_differ_per_language() {
        assert_ne!(
            Language::English.network_unstable(),
            Language::Chinese.network_unstable()
        );
        assert_ne!(Language::English.offline(), Language::Chinese.offline());
    }
}
