//! Loaders for the plain-text configuration files.
//!
//! Older deployments configure the emulator with three small text files in
//! the working directory instead of `emulator-config.yaml`:
//!
//! - `channels_config.txt` -- one channel per line, `id|min|max`, with the
//!   extended forms `id|min|max|step|change_probability` and
//!   `id|bool[|toggle_probability]`
//! - `app.txt` -- `Period=<ms>`
//! - `db_config.txt` -- `key=value` connection settings
//!
//! Blank lines and `#` comments are skipped everywhere; `channels_config.txt`
//! also accepts `//` comments. A channel line that cannot be parsed is
//! logged and skipped; definitions that parse but are invalid are caught
//! later by [`EmulatorConfig::validate`]. A missing file or key falls back
//! to the default, but a malformed period or port is an error.

use std::io::ErrorKind;
use std::path::Path;

use emulator_types::{BooleanParams, ChannelDefinition, ChannelId, NumericParams};
use tracing::{info, warn};

use crate::config::{ConfigError, DEFAULT_PERIOD_MS, EmulatorConfig, StorageConfig};

/// Channel list file name.
pub const CHANNELS_FILE: &str = "channels_config.txt";

/// Tick period file name.
pub const PERIOD_FILE: &str = "app.txt";

/// Database connection file name.
pub const DB_CONFIG_FILE: &str = "db_config.txt";

#[derive(Debug, thiserror::Error)]
enum LineError {
    #[error("expected id|min|max[|step|change_probability] or id|bool[|toggle_probability]")]
    Format,
    #[error("cannot parse {field} from {text:?}: {reason}")]
    Number {
        field: &'static str,
        text: String,
        reason: String,
    },
}

/// Parse the contents of a channel list file.
///
/// Lines that cannot be parsed are logged at warn level and skipped.
pub fn parse_channel_lines(text: &str) -> Vec<ChannelDefinition> {
    let mut channels = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("//") {
            continue;
        }
        match parse_channel_line(trimmed) {
            Ok(def) => channels.push(def),
            Err(e) => {
                warn!(line = index.saturating_add(1), text = trimmed, error = %e, "Skipping channel line");
            }
        }
    }
    channels
}

fn parse_channel_line(line: &str) -> Result<ChannelDefinition, LineError> {
    let parts: Vec<&str> = line.split('|').map(str::trim).collect();
    let (id_text, rest) = parts.split_first().ok_or(LineError::Format)?;
    let id = id_text.parse::<u32>().map_err(|e| LineError::Number {
        field: "id",
        text: (*id_text).to_owned(),
        reason: e.to_string(),
    })?;
    let id = ChannelId::new(id);

    if let Some(kind) = rest.first()
        && (kind.eq_ignore_ascii_case("bool") || kind.eq_ignore_ascii_case("boolean"))
    {
        let params = match rest {
            [_] => BooleanParams::default(),
            [_, p] => BooleanParams {
                toggle_probability: parse_number("toggle_probability", p)?,
            },
            _ => return Err(LineError::Format),
        };
        return Ok(ChannelDefinition::boolean(id, params));
    }

    let params = match rest {
        [min, max] => NumericParams::with_range(
            parse_number("min", min)?,
            parse_number("max", max)?,
        ),
        [min, max, step, p] => NumericParams {
            min: parse_number("min", min)?,
            max: parse_number("max", max)?,
            step: parse_number("step", step)?,
            change_probability: parse_number("change_probability", p)?,
        },
        _ => return Err(LineError::Format),
    };
    Ok(ChannelDefinition::numeric(id, params))
}

/// Parse a decimal number, accepting a comma as the decimal separator.
fn parse_number(field: &'static str, text: &str) -> Result<f64, LineError> {
    text.replace(',', ".")
        .parse::<f64>()
        .map_err(|e| LineError::Number {
            field,
            text: text.to_owned(),
            reason: e.to_string(),
        })
}

/// Load channel definitions from a channel list file.
///
/// A missing file yields an empty list (and a warning).
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file exists but cannot be read.
pub fn load_channels_file(path: &Path) -> Result<Vec<ChannelDefinition>, ConfigError> {
    let Some(text) = read_optional(path)? else {
        warn!(path = %path.display(), "Channel list file not found");
        return Ok(Vec::new());
    };
    let channels = parse_channel_lines(&text);
    info!(path = %path.display(), count = channels.len(), "Loaded channel list");
    Ok(channels)
}

/// Extract the tick period from the contents of an `app.txt` file.
///
/// Falls back to [`DEFAULT_PERIOD_MS`] (with a warning) when no `Period=`
/// line is present.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidPeriod`] if the value is not a positive
/// integer.
pub fn parse_period(text: &str) -> Result<u64, ConfigError> {
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let Some((key, value)) = trimmed.split_once('=') else {
            continue;
        };
        if !key.trim().eq_ignore_ascii_case("period") {
            continue;
        }
        let value = value.trim();
        return match value.parse::<u64>() {
            Ok(ms) if ms > 0 => Ok(ms),
            _ => Err(ConfigError::InvalidPeriod {
                value: value.to_owned(),
            }),
        };
    }
    warn!(default_ms = DEFAULT_PERIOD_MS, "Period not set, using default");
    Ok(DEFAULT_PERIOD_MS)
}

/// Load the tick period from an `app.txt` file.
///
/// A missing file yields the default (and a warning).
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file exists but cannot be read, or
/// [`ConfigError::InvalidPeriod`] if the period value is malformed.
pub fn load_period_file(path: &Path) -> Result<u64, ConfigError> {
    match read_optional(path)? {
        Some(text) => parse_period(&text),
        None => {
            warn!(
                path = %path.display(),
                default_ms = DEFAULT_PERIOD_MS,
                "Period file not found, using default"
            );
            Ok(DEFAULT_PERIOD_MS)
        }
    }
}

/// Apply `key=value` lines from a `db_config.txt` file on top of `base`.
///
/// Unknown keys are ignored.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidPort`] if the port is not a valid `u16`.
pub fn parse_db_config(text: &str, base: StorageConfig) -> Result<StorageConfig, ConfigError> {
    let mut storage = base;
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let Some((key, value)) = trimmed.split_once('=') else {
            continue;
        };
        let value = value.trim();
        match key.trim().to_ascii_lowercase().as_str() {
            "host" => value.clone_into(&mut storage.host),
            "port" => {
                storage.port = value.parse().map_err(|e: std::num::ParseIntError| {
                    ConfigError::InvalidPort {
                        value: value.to_owned(),
                        reason: e.to_string(),
                    }
                })?;
            }
            "database" => value.clone_into(&mut storage.database),
            "username" => value.clone_into(&mut storage.username),
            "password" => value.clone_into(&mut storage.password),
            _ => {}
        }
    }
    Ok(storage)
}

/// Load storage settings from a `db_config.txt` file.
///
/// A missing file yields the default settings (and a warning).
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file exists but cannot be read, or
/// [`ConfigError::InvalidPort`] if the port is malformed.
pub fn load_db_config_file(path: &Path) -> Result<StorageConfig, ConfigError> {
    let mut storage = match read_optional(path)? {
        Some(text) => parse_db_config(&text, StorageConfig::default())?,
        None => {
            warn!(path = %path.display(), "Database config file not found, using defaults");
            StorageConfig::default()
        }
    };
    storage.apply_env_overrides();
    Ok(storage)
}

impl EmulatorConfig {
    /// Assemble a configuration from the text files in `dir`.
    ///
    /// The result is not validated; an empty channel list is reported by
    /// [`EmulatorConfig::validate`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if a file exists but cannot be read, or
    /// [`ConfigError::InvalidPeriod`] / [`ConfigError::InvalidPort`] for a
    /// malformed period or port.
    pub fn from_legacy_dir(dir: &Path) -> Result<Self, ConfigError> {
        Ok(Self {
            period_ms: load_period_file(&dir.join(PERIOD_FILE))?,
            storage: load_db_config_file(&dir.join(DB_CONFIG_FILE))?,
            channels: load_channels_file(&dir.join(CHANNELS_FILE))?,
            ..Self::default()
        })
    }
}

/// Read a file, mapping "not found" to `None`.
fn read_optional(path: &Path) -> Result<Option<String>, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::float_cmp,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use emulator_types::ChannelKind;
    use tempfile::TempDir;

    use super::*;

    fn write(dir: &TempDir, file: &str, contents: &str) {
        std::fs::write(dir.path().join(file), contents).unwrap();
    }

    #[test]
    fn parses_all_channel_forms() {
        let text = "\
# numeric, defaults
1|0|100
// extended numeric with decimal commas
2|-1,5|1,5|0,25|0,9
3|bool
4|BOOL|0.5
";
        let defs = parse_channel_lines(text);
        assert_eq!(defs.len(), 4);

        let ChannelKind::Numeric(p) = defs[0].kind else {
            panic!("expected numeric");
        };
        assert_eq!((p.min, p.max), (0.0, 100.0));
        assert_eq!(p.step, emulator_types::channel::DEFAULT_STEP);

        let ChannelKind::Numeric(p) = defs[1].kind else {
            panic!("expected numeric");
        };
        assert_eq!((p.min, p.max, p.step), (-1.5, 1.5, 0.25));
        assert_eq!(p.change_probability, 0.9);

        assert!(matches!(defs[2].kind, ChannelKind::Boolean(_)));
        let ChannelKind::Boolean(b) = defs[3].kind else {
            panic!("expected boolean");
        };
        assert_eq!(b.toggle_probability, 0.5);
    }

    #[test]
    fn bad_lines_are_skipped() {
        let text = "x|0|1\n1|0\n2|a|b\n3|0|1|2\n4|bool|1|2\n5|0|10\n";
        let defs = parse_channel_lines(text);
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].id, ChannelId::new(5));
    }

    #[test]
    fn invalid_but_parseable_lines_are_kept_for_validation() {
        let defs = parse_channel_lines("1|10|0\n");
        assert_eq!(defs.len(), 1);
        assert!(defs[0].validate().is_err());
    }

    #[test]
    fn period_parsing() {
        assert_eq!(parse_period("Period=1000").unwrap(), 1000);
        assert_eq!(parse_period("# comment\nperiod = 250\n").unwrap(), 250);
        assert_eq!(parse_period("Other=3").unwrap(), DEFAULT_PERIOD_MS);
        assert_eq!(parse_period("").unwrap(), DEFAULT_PERIOD_MS);
    }

    #[test]
    fn malformed_period_is_an_error() {
        for text in ["Period=fast", "Period=0", "Period=-5", "Period=abc\nPeriod=750\n"] {
            assert!(
                matches!(parse_period(text), Err(ConfigError::InvalidPeriod { .. })),
                "accepted {text:?}"
            );
        }
    }

    #[test]
    fn db_config_parsing() {
        let text = "# connection\nHost=db.local\nport=6000\ndatabase = metrics\nUsername=svc\npassword=p=w\nextra=1\n";
        let storage = parse_db_config(text, StorageConfig::default()).unwrap();
        assert_eq!(storage.host, "db.local");
        assert_eq!(storage.port, 6000);
        assert_eq!(storage.database, "metrics");
        assert_eq!(storage.username, "svc");
        assert_eq!(storage.password, "p=w");
    }

    #[test]
    fn malformed_port_is_an_error() {
        for text in ["port=abc\n", "port=70000\n"] {
            assert!(
                matches!(
                    parse_db_config(text, StorageConfig::default()),
                    Err(ConfigError::InvalidPort { .. })
                ),
                "accepted {text:?}"
            );
        }
    }

    #[test]
    fn missing_files_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_channels_file(&dir.path().join(CHANNELS_FILE)).unwrap().is_empty());
        assert_eq!(
            load_period_file(&dir.path().join(PERIOD_FILE)).unwrap(),
            DEFAULT_PERIOD_MS
        );
        let storage = load_db_config_file(&dir.path().join(DB_CONFIG_FILE)).unwrap();
        assert_eq!(storage.host, "localhost");
    }

    #[test]
    fn legacy_dir_assembles_config() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir, CHANNELS_FILE, "1|0|10\n2|bool\n");
        write(&dir, PERIOD_FILE, "Period=750\n");
        write(&dir, DB_CONFIG_FILE, "host=pg\n");

        let config = EmulatorConfig::from_legacy_dir(dir.path()).unwrap();
        assert_eq!(config.period_ms, 750);
        assert_eq!(config.channels.len(), 2);
        assert_eq!(config.storage.host, "pg");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn legacy_dir_rejects_malformed_period_and_port() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir, CHANNELS_FILE, "1|0|10\n");
        write(&dir, PERIOD_FILE, "Period=soon\n");
        assert!(matches!(
            EmulatorConfig::from_legacy_dir(dir.path()),
            Err(ConfigError::InvalidPeriod { .. })
        ));

        write(&dir, PERIOD_FILE, "Period=500\n");
        write(&dir, DB_CONFIG_FILE, "port=five\n");
        assert!(matches!(
            EmulatorConfig::from_legacy_dir(dir.path()),
            Err(ConfigError::InvalidPort { .. })
        ));
    }

    #[test]
    fn empty_legacy_dir_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let config = EmulatorConfig::from_legacy_dir(dir.path()).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::NoChannels)));
    }
}
