// 设备模拟器 - 以固定节拍发布合成读数
use anyhow::Result;
use rand::Rng;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use smartsense_shared::{load_simulator_config, SensorReading};
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting SmartSense device simulator...");

    let config = load_simulator_config();
    info!(
        "Publishing as {} to topic {} via {}:{}",
        config.device_id, config.topic, config.mqtt.broker_host, config.mqtt.broker_port
    );

    // 设备 ID 即 client id
    let mut mqtt_options = MqttOptions::new(
        config.device_id.clone(),
        &config.mqtt.broker_host,
        config.mqtt.broker_port,
    );
    mqtt_options.set_keep_alive(Duration::from_secs(config.mqtt.keep_alive));

    let (client, mut event_loop) = AsyncClient::new(mqtt_options, 10);

    // 事件循环任务：驱动连接，断开后固定间隔重连
    let reconnect_delay = Duration::from_millis(config.mqtt.reconnect_interval_ms);
    tokio::spawn(async move {
        loop {
            match event_loop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    info!("Connected to MQTT broker");
                }
                Ok(event) => {
                    debug!("MQTT event: {:?}", event);
                }
                Err(e) => {
                    warn!(
                        "MQTT connection error: {}, reconnecting in {}s",
                        e,
                        reconnect_delay.as_secs()
                    );
                    tokio::time::sleep(reconnect_delay).await;
                }
            }
        }
    });

    // 固定节拍发布读数
    let mut interval = tokio::time::interval(Duration::from_secs(config.publish_interval_secs));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Stopped by user");
                let _ = client.disconnect().await;
                return Ok(());
            }
            _ = interval.tick() => {
                let reading = generate_reading(&config.device_id);

                match serde_json::to_string(&reading) {
                    Ok(payload) => {
                        if let Err(e) = client
                            .publish(config.topic.clone(), QoS::AtMostOnce, false, payload.clone())
                            .await
                        {
                            error!("Failed to publish reading: {}", e);
                        } else {
                            info!("Published: {}", payload);
                        }
                    }
                    Err(e) => error!("Failed to serialize reading: {}", e),
                }
            }
        }
    }
}

// 生成一条合成读数，量纲与真实设备一致
fn generate_reading(device_id: &str) -> SensorReading {
    let mut rng = rand::thread_rng();

    SensorReading {
        device_id: device_id.to_string(),
        temperature: round1(rng.gen_range(18.0..30.0)),
        humidity: round1(rng.gen_range(30.0..65.0)),
        pm2_5: round1(rng.gen_range(3.0..80.0)),
        co2: rng.gen_range(380..=1600),
        voc_index: round2(rng.gen_range(0.0..10.0)),
        timestamp_utc: chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    #[test]
    fn test_generate_reading_ranges() {
        for _ in 0..100 {
            let reading = generate_reading("sim-001");

            assert_eq!(reading.device_id, "sim-001");
            assert!((18.0..=30.0).contains(&reading.temperature));
            assert!((30.0..=65.0).contains(&reading.humidity));
            assert!((3.0..=80.0).contains(&reading.pm2_5));
            assert!((380..=1600).contains(&reading.co2));
            assert!((0.0..=10.0).contains(&reading.voc_index));
        }
    }

    #[test]
    fn test_generate_reading_timestamp_format() {
        let reading = generate_reading("sim-001");
        assert!(
            NaiveDateTime::parse_from_str(&reading.timestamp_utc, "%Y-%m-%dT%H:%M:%SZ").is_ok()
        );
    }

    #[test]
    fn test_reading_serializes_with_contract_fields() {
        let reading = generate_reading("sim-001");
        let value = serde_json::to_value(&reading).unwrap();

        for field in [
            "device_id",
            "temperature",
            "humidity",
            "pm2_5",
            "co2",
            "voc_index",
            "timestamp_utc",
        ] {
            assert!(value.get(field).is_some(), "missing field {}", field);
        }
    }
}
