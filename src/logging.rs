use crate::config::LoggingConfig;
use std::io::Write;
use std::path::PathBuf;

/// ~/.local/share/path-labeler, or `None` without a home directory.
pub fn data_dir() -> Option<PathBuf> {
    let home = std::env::var_os("HOME")?;
    Some(std::path::Path::new(&home).join(".local/share/path-labeler"))
}

/// Install the global logger.
///
/// Diagnostics go to `path-labeler.log` in the data directory when file
/// logging is on and the file can be opened, otherwise to stderr. `verbose`
/// raises the level to at least debug. Calling this twice is harmless; the
/// second logger is ignored.
pub fn init(config: &LoggingConfig, verbose: bool) {
    let mut level = config.level.filter();
    if verbose && level < log::LevelFilter::Debug {
        level = log::LevelFilter::Debug;
    }
    let log_config = simplelog::Config::default();

    if config.file
        && let Some(file) = open_in_data_dir("path-labeler.log")
    {
        let _ = simplelog::WriteLogger::init(level, log_config, file);
        return;
    }
    let _ = simplelog::TermLogger::init(
        level,
        log_config,
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Never,
    );
}

/// Append an applied-labels record to ~/.local/share/path-labeler/applied.log.
/// Best-effort: failures are silently ignored (recording must never fail a
/// session update).
pub fn record_applied(working_directory: &str, added: &[String]) {
    if added.is_empty() {
        return;
    }
    let Some(mut file) = open_in_data_dir("applied.log") else {
        return;
    };

    let dir_oneline = working_directory.replace(['\n', '\t'], " ");
    let ts = timestamp_now();

    let _ = writeln!(
        file,
        "{ts}\t{dir}\t{labels}",
        dir = dir_oneline,
        labels = added.join(","),
    );
}

fn open_in_data_dir(name: &str) -> Option<std::fs::File> {
    let dir = data_dir()?;
    std::fs::create_dir_all(&dir).ok()?;
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(name))
        .ok()
}

/// UTC timestamp, second precision.
fn timestamp_now() -> String {
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let (year, month, day) = civil_from_days(secs / 86400);
    let rem = secs % 86400;
    format!(
        "{year:04}-{month:02}-{day:02}T{:02}:{:02}:{:02}Z",
        rem / 3600,
        (rem % 3600) / 60,
        rem % 60
    )
}

/// Days since the Unix epoch to (year, month, day), Hinnant's algorithm.
fn civil_from_days(days: u64) -> (u64, u64, u64) {
    let z = days + 719468;
    let era = z / 146097;
    let doe = z - era * 146097;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + u64::from(month <= 2);
    (year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_dates() {
        assert_eq!(civil_from_days(0), (1970, 1, 1));
        assert_eq!(civil_from_days(59), (1970, 3, 1));
        // 2000-02-29, a leap day in a century year
        assert_eq!(civil_from_days(11016), (2000, 2, 29));
        assert_eq!(civil_from_days(20_745), (2026, 10, 19));
    }

    #[test]
    fn timestamp_shape() {
        let ts = timestamp_now();
        assert_eq!(ts.len(), 20);
        assert!(ts.ends_with('Z'));
        assert_eq!(&ts[10..11], "T");
    }
}
