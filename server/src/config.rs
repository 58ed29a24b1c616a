use std::time::Duration;

pub const DEFAULT_COUNTIES_URL: &str =
    "https://raw.githubusercontent.com/plotly/datasets/master/geojson-counties-fips.json";
pub const DEFAULT_SERVER_PORT: u16 = 3000;
pub const DEFAULT_STATIC_DIR: &str = "client/dist";
pub const DEFAULT_UPSTREAM_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_GEOMETRY_RETRY_SECS: u64 = 30;

pub const COUNTIES_CACHE_CONTROL: &str = "public, max-age=3600";

pub fn counties_url() -> String {
    non_empty_env("COUNTIES_URL").unwrap_or_else(|| DEFAULT_COUNTIES_URL.to_owned())
}

pub fn server_port() -> u16 {
    std::env::var("SERVER_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_SERVER_PORT)
}

pub fn static_dir() -> String {
    non_empty_env("STATIC_DIR").unwrap_or_else(|| DEFAULT_STATIC_DIR.to_owned())
}

pub fn upstream_http_timeout() -> Duration {
    positive_secs("UPSTREAM_HTTP_TIMEOUT_SECS", DEFAULT_UPSTREAM_HTTP_TIMEOUT_SECS)
}

pub fn upstream_connect_timeout() -> Duration {
    positive_secs(
        "UPSTREAM_CONNECT_TIMEOUT_SECS",
        DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS,
    )
}

pub fn geometry_retry_interval() -> Duration {
    positive_secs("GEOMETRY_RETRY_SECS", DEFAULT_GEOMETRY_RETRY_SECS)
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn positive_secs(key: &str, default_secs: u64) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(default_secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_env() {
        temp_env::with_vars_unset(
            [
                "COUNTIES_URL",
                "SERVER_PORT",
                "STATIC_DIR",
                "GEOMETRY_RETRY_SECS",
            ],
            || {
                assert_eq!(counties_url(), DEFAULT_COUNTIES_URL);
                assert_eq!(server_port(), DEFAULT_SERVER_PORT);
                assert_eq!(static_dir(), DEFAULT_STATIC_DIR);
                assert_eq!(
                    geometry_retry_interval(),
                    Duration::from_secs(DEFAULT_GEOMETRY_RETRY_SECS)
                );
            },
        );
    }

    #[test]
    fn env_overrides_are_used() {
        temp_env::with_vars(
            [
                ("COUNTIES_URL", Some("http://127.0.0.1:9000/counties.json")),
                ("SERVER_PORT", Some("8080")),
                ("UPSTREAM_HTTP_TIMEOUT_SECS", Some("12")),
            ],
            || {
                assert_eq!(counties_url(), "http://127.0.0.1:9000/counties.json");
                assert_eq!(server_port(), 8080);
                assert_eq!(upstream_http_timeout(), Duration::from_secs(12));
            },
        );
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        temp_env::with_vars(
            [
                ("COUNTIES_URL", Some("   ")),
                ("SERVER_PORT", Some("0")),
                ("UPSTREAM_CONNECT_TIMEOUT_SECS", Some("-3")),
                ("GEOMETRY_RETRY_SECS", Some("soon")),
            ],
            || {
                assert_eq!(counties_url(), DEFAULT_COUNTIES_URL);
                assert_eq!(server_port(), DEFAULT_SERVER_PORT);
                assert_eq!(
                    upstream_connect_timeout(),
                    Duration::from_secs(DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS)
                );
                assert_eq!(
                    geometry_retry_interval(),
                    Duration::from_secs(DEFAULT_GEOMETRY_RETRY_SECS)
                );
            },
        );
    }
}
