pub mod config;
pub mod mqtt;
pub mod types;
pub mod utils;

pub use config::{
    load_backend_config, load_simulator_config, BackendConfig, DatabaseConfig, HttpConfig,
    MqttConfig, SimulatorConfig,
};
pub use mqtt::{ConnectionState, TopicFilter};
pub use types::{IngestError, Measurement, SensorReading, StorageError};
pub use utils::{format_timestamp, now_utc};
