// 摄取处理 - 单条消息落库，失败就地消化
use crate::storage::MeasurementStore;
use smartsense_shared::IngestError;
use tracing::{debug, error};

/// 处理一条入站消息
///
/// 契约：任何失败只记录日志并丢弃这条读数，绝不向订阅循环上抛。
/// 单次尝试，不重试，没有死信队列。
pub async fn handle_message(store: &dyn MeasurementStore, topic: &str, payload: &[u8]) {
    if let Err(e) = ingest_message(store, topic, payload).await {
        error!("Message processing error on topic {}: {}", topic, e);
    }
}

// 解码并写入一条读数
async fn ingest_message(
    store: &dyn MeasurementStore,
    topic: &str,
    payload: &[u8],
) -> Result<(), IngestError> {
    // 载荷按原样文本入库，不解析 JSON 结构
    let value = std::str::from_utf8(payload)?;
    debug!("Received reading on {}: {}", topic, value);

    store.insert(topic, value).await?;
    debug!("Saved to database");

    Ok(())
}
