use crate::error::{CitasError, Result};

#[derive(Debug, Clone)]
pub struct CitasConfig {
    pub database_url: String,
    pub environment: String,
    /// Capacity of the realtime event channels handed to transport sessions.
    pub realtime_channel_capacity: usize,
    /// Fixed distribution list that receives at-home inspection alerts.
    pub operations_list_address: String,
    pub notification_default_priority: i32,
}

impl Default for CitasConfig {
    fn default() -> Self {
        Self {
            database_url: "postgresql://localhost/citas_development".to_string(),
            environment: "development".to_string(),
            realtime_channel_capacity: 1000,
            operations_list_address: "operaciones@inspecciones.local".to_string(),
            notification_default_priority: 1,
        }
    }
}

impl CitasConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(db_url) = std::env::var("DATABASE_URL") {
            config.database_url = db_url;
        }

        if let Ok(env) = std::env::var("CITAS_ENV") {
            config.environment = env;
        }

        if let Ok(capacity) = std::env::var("CITAS_REALTIME_CAPACITY") {
            config.realtime_channel_capacity = capacity.parse().map_err(|e| {
                CitasError::ConfigurationError(format!("Invalid realtime_channel_capacity: {e}"))
            })?;
        }

        if let Ok(address) = std::env::var("CITAS_OPERATIONS_LIST") {
            config.operations_list_address = address;
        }

        if let Ok(priority) = std::env::var("CITAS_NOTIFICATION_PRIORITY") {
            config.notification_default_priority = priority.parse().map_err(|e| {
                CitasError::ConfigurationError(format!("Invalid notification_default_priority: {e}"))
            })?;
        }

        Ok(config)
    }
}
