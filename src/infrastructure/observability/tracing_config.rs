/// How the tracing subscriber is set up. The filter only applies when
/// `RUST_LOG` is unset; `LOG_FORMAT=json` overrides the format choice.
pub struct TracingConfig {
    pub default_filter: String,
    pub json_format: bool,
}

impl TracingConfig {
    pub fn new(default_filter: impl Into<String>, json_format: bool) -> Self {
        Self {
            default_filter: default_filter.into(),
            json_format: std::env::var("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(json_format),
        }
    }
}
