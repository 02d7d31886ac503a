use clap::Parser;
use std::net::SocketAddr;

/// Runtime settings, read from flags or the environment.
#[derive(Debug, Clone, Parser)]
#[command(author, version, about)]
pub struct Config {
    /// Address the HTTP server listens on.
    #[arg(long, env = "TIMETABLE_BIND", default_value = "127.0.0.1:8080")]
    pub bind: SocketAddr,
    /// Default log filter when RUST_LOG is not set.
    #[arg(long, env = "TIMETABLE_LOG", default_value = "info")]
    pub log_level: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let args = [
            "timetable_generator",
            "--bind",
            "0.0.0.0:9000",
            "--log-level",
            "trace",
        ];
        let config = Config::try_parse_from(args).unwrap();
        assert_eq!(config.bind, "0.0.0.0:9000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.log_level, "trace");
    }

    #[test]
    fn rejects_invalid_bind_address() {
        assert!(Config::try_parse_from(["timetable_generator", "--bind", "nowhere"]).is_err());
    }
}
