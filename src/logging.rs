use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Environment variable holding the tracing filter directive.
pub const LOG_FILTER_VAR: &str = "STONE_SORTER_LOG";
const DEFAULT_FILTER: &str = "info";

/// Builds the filter from `STONE_SORTER_LOG`, falling back to `info`.
///
/// Returns the filter and, if the variable held an invalid directive, the parse error text.
pub fn build_filter(directive: Option<&str>) -> (EnvFilter, Option<String>) {
    match directive.map(str::trim).filter(|d| !d.is_empty()) {
        Some(directive) => match EnvFilter::try_new(directive) {
            Ok(filter) => (filter, None),
            Err(err) => (
                EnvFilter::new(DEFAULT_FILTER),
                Some(format!("invalid {} '{}': {}", LOG_FILTER_VAR, directive, err)),
            ),
        },
        None => (EnvFilter::new(DEFAULT_FILTER), None),
    }
}

/// Installs the global subscriber writing compact lines to stderr.
///
/// Calling this more than once keeps the first subscriber.
pub fn setup_logging() {
    let directive = std::env::var(LOG_FILTER_VAR).ok();
    let (filter, problem) = build_filter(directive.as_deref());

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .try_init()
        .is_ok();

    if let (true, Some(problem)) = (installed, problem) {
        tracing::warn!("{problem}; using '{DEFAULT_FILTER}'");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_when_unset_or_blank() {
        assert!(build_filter(None).1.is_none());
        assert!(build_filter(Some("   ")).1.is_none());
    }

    #[test]
    fn accepts_valid_directives() {
        let (_, problem) = build_filter(Some("stone_sorter=debug,tower_http=warn"));
        assert!(problem.is_none());
    }

    #[test]
    fn reports_invalid_directives() {
        let (_, problem) = build_filter(Some("stone_sorter=loud"));
        let problem = problem.expect("invalid level must be reported");
        assert!(problem.contains(LOG_FILTER_VAR));
    }

    #[test]
    fn setup_is_idempotent() {
        setup_logging();
        setup_logging();
        tracing::info!("logging initialized twice without panicking");
    }
}
