use std::path::PathBuf;

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub log_level: String,
    pub venues_path: PathBuf,

    pub places_base_url: String,
    pub places_api_key: Option<String>,
    pub menus_base_url: String,

    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,

    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub inter_request_delay_ms: u64,
    pub max_retries: u32,
    pub retry_backoff_base_secs: u64,

    pub batch_size: usize,
    pub match_threshold: f64,
    pub dedupe_name_threshold: f64,
    pub dedupe_address_threshold: f64,
    pub dedupe_loose_address_threshold: f64,
    pub max_menu_items_per_venue: usize,
    pub max_photos_per_venue: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("database_url", &"[redacted]")
            .field("log_level", &self.log_level)
            .field("venues_path", &self.venues_path)
            .field("places_base_url", &self.places_base_url)
            .field(
                "places_api_key",
                &self.places_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("menus_base_url", &self.menus_base_url)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("inter_request_delay_ms", &self.inter_request_delay_ms)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_secs", &self.retry_backoff_base_secs)
            .field("batch_size", &self.batch_size)
            .field("match_threshold", &self.match_threshold)
            .field("dedupe_name_threshold", &self.dedupe_name_threshold)
            .field("dedupe_address_threshold", &self.dedupe_address_threshold)
            .field(
                "dedupe_loose_address_threshold",
                &self.dedupe_loose_address_threshold,
            )
            .field("max_menu_items_per_venue", &self.max_menu_items_per_venue)
            .field("max_photos_per_venue", &self.max_photos_per_venue)
            .finish()
    }
}
