use super::*;

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            backoff_base_secs: 1.0,
        }
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            coordinate_cooldown_secs: 60.0,
            station_spacing_secs: 5.0,
            discovery_settle_secs: 3.0,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from("data/gas_prices.csv"),
            cleaned_path: PathBuf::from("data/cleaned_gas_prices.csv"),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://www.gasbuddy.com/graphql".to_string(),
            timeout_secs: 30,
            user_agent: format!("pumpwatch/{}", env!("APP_VERSION")),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "DEBUG".to_string(),
            console_level: Some("INFO".to_string()),
            file_level: None,
            file: "log/pumpwatch.log".to_string(),
            backup_count: 7,
            console_output: true,
            json_format: false,
        }
    }
}

impl TimeTagConfig {
    fn window(tag: &str, start_hour: u32, end_hour: u32) -> Self {
        Self {
            tag: tag.to_string(),
            start_hour,
            end_hour,
        }
    }
}

/// Day-part windows used by the cleaning step
fn default_time_tags() -> Vec<TimeTagConfig> {
    vec![
        TimeTagConfig::window("morning", 8, 10),
        TimeTagConfig::window("afternoon", 12, 15),
        TimeTagConfig::window("evening", 19, 22),
        TimeTagConfig::window("midnight", 4, 5),
    ]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            coordinates: vec![
                Coordinate::new(49.249, -123.173),
                Coordinate::new(49.243, -123.0823),
                Coordinate::new(49.173, -123.079),
                Coordinate::new(49.15, -123.159),
            ],
            fetch: FetchConfig::default(),
            pacing: PacingConfig::default(),
            output: OutputConfig::default(),
            provider: ProviderConfig::default(),
            logging: LoggingConfig::default(),
            time_tags: default_time_tags(),
            timezone: None,
        }
    }
}
