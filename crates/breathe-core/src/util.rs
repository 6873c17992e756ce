//! Small formatting helpers shared by the engine and its hosts.

/// Describe how long ago `timestamp` (unix seconds) was, relative to `now`.
///
/// Future timestamps count as "Just now".
///
/// ```
/// use breathe_core::util::time_ago;
///
/// assert_eq!(time_ago(1_000, 1_030), "Just now");
/// assert_eq!(time_ago(1_000, 1_000 + 5 * 60), "5m ago");
/// assert_eq!(time_ago(0, 3 * 3600 + 59), "3h ago");
/// assert_eq!(time_ago(0, 90_000), ">1d ago");
/// ```
pub fn time_ago(timestamp: i64, now: i64) -> String {
    let diff = now.saturating_sub(timestamp);
    match diff {
        d if d < 60 => "Just now".to_string(),
        d if d < 3600 => format!("{}m ago", d / 60),
        d if d < 86_400 => format!("{}h ago", d / 3600),
        _ => ">1d ago".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries() {
        assert_eq!(time_ago(0, 59), "Just now");
        assert_eq!(time_ago(0, 60), "1m ago");
        assert_eq!(time_ago(0, 3599), "59m ago");
        assert_eq!(time_ago(0, 3600), "1h ago");
        assert_eq!(time_ago(0, 86_399), "23h ago");
        assert_eq!(time_ago(0, 86_400), ">1d ago");
    }

    #[test]
    fn test_future_timestamp() {
        assert_eq!(time_ago(100, 0), "Just now");
    }
}
