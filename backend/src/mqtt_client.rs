// 订阅会话 - 与 broker 的长连接、订阅与重连
use crate::ingest;
use crate::storage::MeasurementStore;
use rumqttc::{AsyncClient, Event, EventLoop, Packet, QoS};
use smartsense_shared::{ConnectionState, MqttConfig, TopicFilter};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

// 订阅会话
//
// 由进程引导流程构造并持有，生命周期显式，不依赖任何全局句柄。
pub struct SubscriberSession {
    client: AsyncClient,
    event_loop: EventLoop,
    config: MqttConfig,
    store: Arc<dyn MeasurementStore>,
    state: ConnectionState,
}

impl SubscriberSession {
    pub fn new(config: MqttConfig, store: Arc<dyn MeasurementStore>) -> Self {
        let mut mqtt_options = rumqttc::MqttOptions::new(
            config.client_id.clone(),
            &config.broker_host,
            config.broker_port,
        );

        mqtt_options.set_keep_alive(Duration::from_secs(config.keep_alive));
        mqtt_options.set_clean_session(true);

        let (client, event_loop) = AsyncClient::new(mqtt_options, 10);

        Self {
            client,
            event_loop,
            config,
            store,
            state: ConnectionState::Disconnected,
        }
    }

    /// 运行接收循环，直到取消令牌触发
    ///
    /// 连接故障按固定间隔无限重试；broker 层的投递保证是尽力而为，
    /// 断开窗口内在途的消息不会重放。
    pub async fn run(mut self, shutdown: CancellationToken) {
        let backoff = Duration::from_millis(self.config.reconnect_interval_ms);

        info!(
            "Starting subscriber session to {}:{}",
            self.config.broker_host, self.config.broker_port
        );
        self.set_state(ConnectionState::Connecting);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Subscriber session shutting down");
                    let _ = self.client.disconnect().await;
                    return;
                }
                event = self.event_loop.poll() => match event {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        self.set_state(ConnectionState::Connected);
                        info!(
                            "Connected to MQTT broker {}:{}",
                            self.config.broker_host, self.config.broker_port
                        );
                        Self::subscribe_sensor_topics(self.client.clone()).await;
                    }
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        // 每条消息在循环内同步处理，彼此之间没有内部队列
                        ingest::handle_message(
                            self.store.as_ref(),
                            &publish.topic,
                            &publish.payload,
                        )
                        .await;
                    }
                    Ok(Event::Incoming(Packet::SubAck(_))) => {
                        debug!("Subscription acknowledged");
                    }
                    Ok(Event::Incoming(Packet::Disconnect)) => {
                        warn!("MQTT broker initiated disconnect");
                        self.set_state(ConnectionState::Disconnected);
                    }
                    Ok(Event::Incoming(incoming)) => {
                        debug!("Received MQTT packet: {:?}", incoming);
                    }
                    Ok(Event::Outgoing(outgoing)) => {
                        debug!("Sending MQTT packet: {:?}", outgoing);
                    }
                    Err(e) => {
                        // 固定间隔重试，不设上限
                        error!(
                            "MQTT connection error: {}, retrying in {}s",
                            e,
                            backoff.as_secs()
                        );
                        self.set_state(ConnectionState::Disconnected);

                        tokio::select! {
                            _ = shutdown.cancelled() => {
                                info!("Subscriber session shutting down");
                                return;
                            }
                            _ = tokio::time::sleep(backoff) => {
                                self.set_state(ConnectionState::Connecting);
                            }
                        }
                    }
                }
            }
        }
    }

    // 订阅传感器主题；重连后的每个 ConnAck 都会重新订阅
    // 传入客户端句柄的所有权，避免在 .await 期间持有 &self（EventLoop 非 Sync）
    async fn subscribe_sensor_topics(client: AsyncClient) {
        let filter = TopicFilter::all_sensors();

        match client
            .subscribe(filter.topic_pattern.clone(), QoS::AtMostOnce)
            .await
        {
            Ok(()) => info!("Subscribed to MQTT topic: {}", filter.topic_pattern),
            Err(e) => error!(
                "Failed to subscribe to topic {}: {}",
                filter.topic_pattern, e
            ),
        }
    }

    // 记录状态迁移；状态只通过日志可见
    fn set_state(&mut self, next: ConnectionState) {
        if self.state != next {
            info!("Subscriber state: {} -> {}", self.state, next);
            self.state = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::testing::MockStore;

    #[test]
    fn test_new_session_starts_disconnected() {
        let config = MqttConfig {
            broker_host: "localhost".to_string(),
            broker_port: 1883,
            client_id: "backend-test".to_string(),
            keep_alive: 60,
            reconnect_interval_ms: 5000,
        };

        let session = SubscriberSession::new(config, Arc::new(MockStore::new()));
        assert_eq!(session.state, ConnectionState::Disconnected);
    }
}
