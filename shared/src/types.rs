use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// 持久化的测量记录 - 对应 measurements 表的一行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Measurement {
    pub topic: String,
    pub value: String,
    pub timestamp: DateTime<Utc>,
}

// 传感器读数 - 与外部发布端的载荷契约
//
// 摄取路径不解析这个结构，入库时原样保存 JSON 文本；
// 这里的定义供模拟器生成载荷和契约测试使用。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub device_id: String,
    pub temperature: f64,
    pub humidity: f64,
    pub pm2_5: f64,
    pub co2: i64,
    pub voc_index: f64,
    pub timestamp_utc: String,
}

// 存储层错误
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database connection error: {0}")]
    Connection(String),

    #[error("Database query error: {0}")]
    Query(#[from] sqlx::Error),
}

// 摄取路径错误
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Payload is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
