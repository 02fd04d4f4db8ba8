//! Display formatting helpers

/// Format milliseconds as `M:SS`.
///
/// Fractions of a second are dropped and minutes are not wrapped into hours,
/// so one hour reads `60:00`.
pub fn format_time(ms: u64) -> String {
    let total_seconds = ms / 1000;
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{}:{:02}", minutes, seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seconds_only() {
        assert_eq!(format_time(5000), "0:05");
        assert_eq!(format_time(45000), "0:45");
    }

    #[test]
    fn test_minutes_and_seconds() {
        assert_eq!(format_time(65000), "1:05");
        assert_eq!(format_time(125000), "2:05");
        assert_eq!(format_time(754000), "12:34");
    }

    #[test]
    fn test_zero_and_sub_second() {
        assert_eq!(format_time(0), "0:00");
        assert_eq!(format_time(500), "0:00");
        assert_eq!(format_time(999), "0:00");
    }

    #[test]
    fn test_large_values() {
        assert_eq!(format_time(600000), "10:00");
        assert_eq!(format_time(3600000), "60:00");
    }
}
