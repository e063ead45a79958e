use chrono::{DateTime, Utc};

// 时间工具函数
pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

/// HTTP 边界上的时间戳渲染（RFC 3339）
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timestamp() {
        let dt: DateTime<Utc> = "2024-01-01T00:00:00Z".parse().unwrap();
        assert_eq!(format_timestamp(&dt), "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_format_timestamp_round_trip() {
        let now = now_utc();
        let rendered = format_timestamp(&now);
        let parsed: DateTime<Utc> = rendered.parse().unwrap();
        assert_eq!(parsed, now);
    }
}
