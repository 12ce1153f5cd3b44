use clap::Parser;
use reqwest::Url;
use std::path::PathBuf;
use std::time::Duration;

use crate::presence::BroadcastConfig;

/// Room display backend: calendar events and live viewer counts per room
#[derive(Parser, Debug, Clone)]
#[command(name = "scheduler", version, about)]
pub struct Args {
    /// Port to run the server on
    #[arg(short, long, env = "SCHEDULER_PORT", default_value_t = 80)]
    pub port: u16,

    /// Level of logging wanted. 1=DEBUG, 2=INFO, 3=WARN, 4=ERROR, 5=PANIC
    #[arg(short, long, env = "SCHEDULER_LOG_LEVEL", default_value_t = 2, allow_negative_numbers = true)]
    pub log_level: i64,

    /// Directory holding the display UI bundle
    #[arg(long, env = "SCHEDULER_WEB_ROOT", default_value = "web-dist")]
    pub web_root: PathBuf,

    /// Directory served under /static
    #[arg(long, env = "SCHEDULER_STATIC_ROOT", default_value = "web-dist/static")]
    pub static_root: PathBuf,

    /// Base URL of the calendar service; events stay in memory when unset
    #[arg(long, env = "CALENDAR_URL")]
    pub calendar_url: Option<Url>,

    /// Timeout for each calendar or help desk request
    #[arg(long, env = "CALENDAR_TIMEOUT_SECS", default_value_t = 10)]
    pub calendar_timeout_secs: u64,

    /// Webhook that receives help requests; they are only logged when unset
    #[arg(long, env = "HELP_URL")]
    pub help_url: Option<Url>,

    /// JSON file describing this display's room
    #[arg(long, env = "ROOM_CONFIG")]
    pub room_config: Option<PathBuf>,

    /// Seconds between viewer count broadcasts
    #[arg(long, env = "BROADCAST_INTERVAL_SECS", default_value_t = 180)]
    pub broadcast_interval_secs: u64,

    /// Milliseconds allowed for delivering one broadcast to one viewer
    #[arg(long, env = "SEND_TIMEOUT_MS", default_value_t = 2000)]
    pub send_timeout_ms: u64,

    /// Refuse viewers beyond this many per room
    #[arg(long, env = "MAX_CONNECTIONS_PER_ROOM")]
    pub max_connections_per_room: Option<usize>,
}

impl Args {
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.calendar_timeout_secs)
    }

    pub fn broadcast_config(&self) -> BroadcastConfig {
        BroadcastConfig {
            // A zero period would make tokio's interval panic
            interval: Duration::from_secs(self.broadcast_interval_secs.max(1)),
            send_timeout: Duration::from_millis(self.send_timeout_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["scheduler"]).unwrap();

        assert_eq!(args.port, 80);
        assert_eq!(args.log_level, 2);
        assert_eq!(args.web_root, PathBuf::from("web-dist"));
        assert!(args.calendar_url.is_none());
        assert_eq!(args.broadcast_config().interval, Duration::from_secs(180));
        assert_eq!(args.broadcast_config().send_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_short_flags() {
        let args = Args::try_parse_from(["scheduler", "-p", "8080", "-l", "3"]).unwrap();

        assert_eq!(args.port, 8080);
        assert_eq!(args.log_level, 3);
    }

    #[test]
    fn test_out_of_range_log_level_still_parses() {
        // Range is enforced at startup so the failure is logged like other startup faults
        let args = Args::try_parse_from(["scheduler", "--log-level", "9"]).unwrap();

        assert_eq!(args.log_level, 9);
    }

    #[test]
    fn test_invalid_calendar_url_is_rejected() {
        let result = Args::try_parse_from(["scheduler", "--calendar-url", "not a url"]);

        assert!(result.is_err());
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let args = Args::try_parse_from(["scheduler", "--broadcast-interval-secs", "0"]).unwrap();

        assert_eq!(args.broadcast_config().interval, Duration::from_secs(1));
    }
}
