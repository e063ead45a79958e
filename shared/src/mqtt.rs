use serde::{Deserialize, Serialize};

// 订阅会话状态机
//
// Disconnected -> Connecting -> Connected，故障时回到 Disconnected；
// 只有主动停机才是终态。状态迁移仅通过日志可见。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        };
        write!(f, "{}", s)
    }
}

// 主题过滤器
#[derive(Debug, Clone, PartialEq)]
pub struct TopicFilter {
    pub topic_pattern: String,
}

impl TopicFilter {
    pub fn new(topic_pattern: String) -> Self {
        Self { topic_pattern }
    }

    // 常用主题过滤器
    pub fn all_sensors() -> Self {
        Self::new("smartsense/#".to_string())
    }

    pub fn device_sensors(device_channel: &str) -> Self {
        Self::new(format!("smartsense/{}", device_channel))
    }
}
