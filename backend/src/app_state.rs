use crate::storage::MeasurementStore;
use std::sync::Arc;

/// 应用程序状态
#[derive(Clone)]
pub struct AppState {
    /// 存储网关
    pub store: Arc<dyn MeasurementStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn MeasurementStore>) -> Self {
        Self { store }
    }
}
