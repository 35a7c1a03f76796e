use crate::model::Coordinate;
use tracing::{debug, error, info, warn};

/// Context information for log messages
#[derive(Debug, Clone)]
pub struct LogContext {
    /// Component name (e.g., "fetcher", "collector", "store")
    pub component: String,
    /// Identifier shared by every line of one collection run
    pub run_id: Option<String>,
    /// Coordinate being swept
    pub coordinate: Option<Coordinate>,
    /// Station the line refers to
    pub station_id: Option<String>,
}

impl LogContext {
    /// Create a new log context
    pub fn new(component: &str) -> Self {
        Self {
            component: component.to_string(),
            run_id: None,
            coordinate: None,
            station_id: None,
        }
    }

    /// Set run ID
    pub fn with_run_id(mut self, run_id: String) -> Self {
        self.run_id = Some(run_id);
        self
    }

    /// Set coordinate
    pub fn with_coordinate(mut self, coordinate: Coordinate) -> Self {
        self.coordinate = Some(coordinate);
        self
    }

    /// Set station ID
    pub fn with_station_id(mut self, station_id: String) -> Self {
        self.station_id = Some(station_id);
        self
    }
}

/// Structured logger with context
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    pub(crate) context: LogContext,
}

impl StructuredLogger {
    /// Create a new structured logger with context
    pub fn new(context: LogContext) -> Self {
        Self { context }
    }

    /// Derive a logger for one station, keeping the rest of the context
    pub fn for_station(&self, station_id: &str) -> Self {
        Self::new(
            self.context
                .clone()
                .with_station_id(station_id.to_string()),
        )
    }

    pub fn context(&self) -> &LogContext {
        &self.context
    }

    /// Log an info message with context
    pub fn info(&self, message: &str) {
        let fields = self.format_fields();
        info!(%fields, "{}", message);
    }
    /// Log a warning message with context
    pub fn warn(&self, message: &str) {
        let fields = self.format_fields();
        warn!(%fields, "{}", message);
    }
    /// Log an error message with context
    pub fn error(&self, message: &str) {
        let fields = self.format_fields();
        error!(%fields, "{}", message);
    }
    /// Log a debug message with context
    pub fn debug(&self, message: &str) {
        let fields = self.format_fields();
        debug!(%fields, "{}", message);
    }

    /// Format context fields for logging
    pub(crate) fn format_fields(&self) -> String {
        let mut fields = vec![format!("component={}", self.context.component)];
        if let Some(ref run_id) = self.context.run_id {
            fields.push(format!("run_id={}", run_id));
        }
        if let Some(coordinate) = self.context.coordinate {
            fields.push(format!("coordinate={}", coordinate));
        }
        if let Some(ref station_id) = self.context.station_id {
            fields.push(format!("station_id={}", station_id));
        }
        fields.join(",")
    }
}

/// Create a logger for a specific component
pub fn get_logger(component: &str) -> StructuredLogger {
    StructuredLogger::new(LogContext::new(component))
}
/// Create a logger with full context
pub fn get_logger_with_context(context: LogContext) -> StructuredLogger {
    StructuredLogger::new(context)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_context() {
        let context = LogContext::new("test")
            .with_run_id("run_123".to_string())
            .with_station_id("42".to_string());

        assert_eq!(context.component, "test");
        assert_eq!(context.run_id, Some("run_123".to_string()));
        assert_eq!(context.station_id, Some("42".to_string()));
        assert!(context.coordinate.is_none());
    }

    #[test]
    fn test_format_fields_order() {
        let logger = get_logger_with_context(
            LogContext::new("collector")
                .with_run_id("r1".to_string())
                .with_coordinate(Coordinate::new(49.25, -123.1)),
        )
        .for_station("7");
        assert_eq!(
            logger.format_fields(),
            "component=collector,run_id=r1,coordinate=(49.25,-123.1),station_id=7"
        );
    }

    #[test]
    fn test_get_logger() {
        let logger = get_logger("test_component");
        assert_eq!(logger.context().component, "test_component");
    }
}
