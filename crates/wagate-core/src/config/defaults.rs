//! Default value functions used by serde for config deserialization.

pub fn default_name() -> String {
    "wagate".to_string()
}

pub fn default_log_level() -> String {
    "info".to_string()
}

pub fn default_true() -> bool {
    true
}

pub fn default_api_host() -> String {
    "0.0.0.0".to_string()
}

pub fn default_api_port() -> u16 {
    3001
}

pub fn default_body_limit() -> usize {
    1024 * 1024
}

pub fn default_auth_dir() -> String {
    "./auth".to_string()
}

pub fn default_device_name() -> String {
    "wagate".to_string()
}

pub fn default_reconnect_delay_ms() -> u64 {
    3000
}

pub fn default_relogin_delay_ms() -> u64 {
    1000
}
