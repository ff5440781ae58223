use crate::config::TelemetryConfig;
use crate::error::TelemetryError;
use tracing_subscriber::EnvFilter;

/// Installs the global log subscriber. `RUST_LOG` wins over the configured
/// level. Output goes to stderr so command output stays clean.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => build_filter(&config.log_level)?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::Subscriber)
}

fn build_filter(level: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(level).map_err(|source| TelemetryError::EnvFilter {
        value: level.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_level_and_directive_filters() {
        assert!(build_filter("warn").is_ok());
        assert!(build_filter("pop_planner=debug,info").is_ok());
    }

    #[test]
    fn rejects_malformed_filter() {
        let err = build_filter("pop_planner=loud").expect_err("bad directive");
        assert!(matches!(err, TelemetryError::EnvFilter { .. }));
    }
}
