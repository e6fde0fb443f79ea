//! Engine tunables from an optional JSON file, defaults for everything left out.

use std::path::Path;

use analysis::EngineConfig;

use crate::Error;

pub fn load(path: Option<&Path>) -> Result<EngineConfig, Error> {
    let path = match path {
        Some(p) => p,
        None => return Ok(EngineConfig::default()),
    };

    let content = std::fs::read_to_string(path).map_err(|source| Error::ConfigIo {
        path: path.to_path_buf(),
        source,
    })?;

    parse(&content).map_err(|source| Error::Config {
        path: path.to_path_buf(),
        source,
    })
}

pub fn parse(content: &str) -> Result<EngineConfig, serde_json::Error> {
    serde_json::from_str(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn missing_file_means_defaults() {
        assert_eq!(EngineConfig::default(), load(None).unwrap());
    }

    #[test]
    fn partial_overrides() {
        let config =
            parse(r#"{"trade_window_secs": 3.5, "economy": {"eco_threshold": 1500}}"#).unwrap();

        assert_eq!(3.5, config.trade_window_secs);
        assert_eq!(1500, config.economy.eco_threshold);
        assert_eq!(3500, config.economy.full_buy_threshold);
        assert_eq!(EngineConfig::default().rounds, config.rounds);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse("max_rounds = 24").is_err());
    }

    #[test]
    fn unreadable_file() {
        let err = load(Some(Path::new("/nonexistent/ingest.json"))).unwrap_err();
        assert!(matches!(err, Error::ConfigIo { .. }));
    }
}
