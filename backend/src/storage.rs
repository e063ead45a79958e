// 存储网关 - 测量数据的写入与最新读取
use async_trait::async_trait;
use smartsense_shared::{Measurement, StorageError};
use sqlx::PgPool;
use tracing::debug;

/// 测量数据存取操作
///
/// 摄取路径和查询路径共同依赖的唯一存储接口。
#[async_trait]
pub trait MeasurementStore: Send + Sync {
    /// 写入单条测量记录；失败上抛给调用方，不在本层吞掉
    async fn insert(&self, topic: &str, value: &str) -> Result<(), StorageError>;

    /// 按时间戳取最新一条记录；无数据返回 None，与错误可区分
    async fn latest(&self) -> Result<Option<Measurement>, StorageError>;
}

// Postgres 存储实现
//
// 连接池中每次操作都是一条独立提交的语句，请求间不共享事务状态。
pub struct PgMeasurementStore {
    pool: PgPool,
}

impl PgMeasurementStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 初始化表结构
    pub async fn init_schema(&self) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS measurements (
                topic TEXT NOT NULL,
                value TEXT NOT NULL,
                timestamp TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// 健康检查
    pub async fn health_check(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl MeasurementStore for PgMeasurementStore {
    async fn insert(&self, topic: &str, value: &str) -> Result<(), StorageError> {
        // timestamp 由存储端的列默认值赋予，即服务器写入时刻
        sqlx::query("INSERT INTO measurements (topic, value) VALUES ($1, $2)")
            .bind(topic)
            .bind(value)
            .execute(&self.pool)
            .await?;

        debug!("Inserted measurement for topic: {}", topic);
        Ok(())
    }

    async fn latest(&self) -> Result<Option<Measurement>, StorageError> {
        let row = sqlx::query_as::<_, Measurement>(
            "SELECT topic, value, timestamp FROM measurements ORDER BY timestamp DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}

// 内存存储，供单元测试使用
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use tokio::sync::Mutex;

    pub struct MockStore {
        pub rows: Mutex<Vec<Measurement>>,
        pub fail_insert: bool,
        pub fail_latest: bool,
    }

    impl MockStore {
        pub fn new() -> Self {
            Self {
                rows: Mutex::new(Vec::new()),
                fail_insert: false,
                fail_latest: false,
            }
        }

        pub fn failing_insert() -> Self {
            Self {
                fail_insert: true,
                ..Self::new()
            }
        }

        pub fn failing_latest() -> Self {
            Self {
                fail_latest: true,
                ..Self::new()
            }
        }
    }

    #[async_trait]
    impl MeasurementStore for MockStore {
        async fn insert(&self, topic: &str, value: &str) -> Result<(), StorageError> {
            if self.fail_insert {
                return Err(StorageError::Connection("store unavailable".to_string()));
            }

            self.rows.lock().await.push(Measurement {
                topic: topic.to_string(),
                value: value.to_string(),
                timestamp: smartsense_shared::now_utc(),
            });
            Ok(())
        }

        async fn latest(&self) -> Result<Option<Measurement>, StorageError> {
            if self.fail_latest {
                return Err(StorageError::Connection("store unavailable".to_string()));
            }

            // 按时间戳取最大者，与到达顺序无关
            let rows = self.rows.lock().await;
            Ok(rows.iter().max_by_key(|m| m.timestamp).cloned())
        }
    }
}
