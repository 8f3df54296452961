//! Logging setup for binaries and examples

use tracing::Level;

/// Parse a configured log level, falling back to INFO
pub fn parse_level(level: &str) -> Level {
    level.trim().parse().unwrap_or(Level::INFO)
}

/// Initialize the global fmt subscriber. Logs go to stderr so stdout stays
/// free for command output.
pub fn init(level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(parse_level(level))
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("debug"), Level::DEBUG);
        assert_eq!(parse_level("WARN"), Level::WARN);
        assert_eq!(parse_level("loud"), Level::INFO);
    }
}
