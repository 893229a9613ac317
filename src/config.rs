use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;

/// A CPU usage tracker for processes
#[derive(Debug, Clone, Parser)]
#[command(name = "cpu-tracker", version, about)]
pub struct Config {
    /// Address to bind the HTTP server to
    #[arg(long, env = "APP_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to run the server on
    #[arg(short, long, env = "APP_PORT", default_value_t = 5000)]
    pub port: u16,

    /// Seconds between sampling passes
    #[arg(
        long,
        env = "SAMPLE_INTERVAL",
        default_value_t = 1,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub interval: u64,
}

impl Config {
    pub fn listen_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_secs(self.interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::try_parse_from(["cpu-tracker"]).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.sample_interval(), Duration::from_secs(1));
        assert_eq!(config.listen_addr().unwrap(), "0.0.0.0:5000".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn short_port_flag() {
        let config = Config::try_parse_from(["cpu-tracker", "-p", "8080"]).unwrap();
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn rejects_zero_interval() {
        assert!(Config::try_parse_from(["cpu-tracker", "--interval", "0"]).is_err());
    }
}
