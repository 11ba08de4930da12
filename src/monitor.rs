//! Sensor connectivity monitor
//!
//! Periodically checks that the sensor endpoint is reachable (DNS lookup,
//! one ping, one HTTP GET) and appends a one-line status per cycle to a
//! log file. Meant to run on a different host than the daemon so outages
//! of either side still get recorded.

use crate::common::{Error, Result};
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;

/// Monitor settings, assembled by the CLI
#[derive(Debug, Clone)]
pub struct MonitorOptions {
    pub sensor_url: String,
    pub interval: Duration,
    pub ping_timeout_secs: u64,
    pub http_timeout: Duration,
    pub log_path: PathBuf,
}

/// Outcome of one probe cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reachability {
    Ok,
    PingOnly,
    HttpOnly,
    Down,
}

impl Reachability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Reachability::Ok => "OK",
            Reachability::PingOnly => "PING_ONLY",
            Reachability::HttpOnly => "HTTP_ONLY",
            Reachability::Down => "DOWN",
        }
    }

    fn classify(ping_ok: bool, http_ok: bool) -> Self {
        match (ping_ok, http_ok) {
            (true, true) => Reachability::Ok,
            (true, false) => Reachability::PingOnly,
            (false, true) => Reachability::HttpOnly,
            (false, false) => Reachability::Down,
        }
    }
}

/// Runs probe cycles until ctrl-c
pub async fn run(opts: MonitorOptions) -> Result<()> {
    let host = host_of(&opts.sensor_url)?;
    let client = reqwest::Client::builder()
        .timeout(opts.http_timeout)
        .build()?;

    tracing::info!("Watching sensor at {} (host {})", opts.sensor_url, host);
    tracing::info!("  Interval: {:?}", opts.interval);
    tracing::info!("  Status log: {}", opts.log_path.display());

    loop {
        let line = check_once(&client, &opts, &host).await;
        tracing::info!("{}", line);
        if let Err(e) = append_line(&opts.log_path, &line).await {
            tracing::warn!("Could not append to status log: {}", e);
        }

        tokio::select! {
            _ = tokio::time::sleep(opts.interval) => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
                return Ok(());
            }
        }
    }
}

/// One full probe cycle, formatted as a log line
async fn check_once(client: &reqwest::Client, opts: &MonitorOptions, host: &str) -> String {
    let stamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
    let ip = resolve(host).await;
    let ip_text = ip.map_or_else(|| "DNS_FAIL".to_string(), |ip| ip.to_string());

    // Ping the resolved address when we have one, the hostname otherwise
    let ping_target = ip.map_or_else(|| host.to_string(), |ip| ip.to_string());
    let (ping_ok, ping_msg) = ping_once(&ping_target, opts.ping_timeout_secs).await;
    let (http_ok, http_msg) = http_probe(client, &opts.sensor_url).await;

    let status = Reachability::classify(ping_ok, http_ok);
    format!(
        "{stamp} | {:<9} | host={host} ip={ip_text} | ping={ping_ok} '{ping_msg}' | http={http_ok} '{http_msg}'",
        status.as_str()
    )
}

/// First address the host resolves to
async fn resolve(host: &str) -> Option<IpAddr> {
    tokio::net::lookup_host((host, 0))
        .await
        .ok()?
        .next()
        .map(|addr| addr.ip())
}

/// One ICMP echo via the system ping binary
async fn ping_once(target: &str, timeout_secs: u64) -> (bool, String) {
    let output = tokio::process::Command::new("ping")
        .arg("-c")
        .arg("1")
        .arg("-W")
        .arg(timeout_secs.to_string())
        .arg(target)
        .output()
        .await;

    match output {
        Ok(output) => {
            let text = format!(
                "{}{}",
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            );
            (output.status.success(), summarize_ping(&text))
        }
        Err(e) => (false, format!("ping failed to start: {e}")),
    }
}

/// Picks the informative line out of ping's output
fn summarize_ping(output: &str) -> String {
    let lines: Vec<&str> = output.lines().filter(|l| !l.trim().is_empty()).collect();
    for needle in ["bytes from", "Destination Host Unreachable", "100% packet loss"] {
        if let Some(line) = lines.iter().find(|l| l.contains(needle)) {
            return line.trim().to_string();
        }
    }
    lines
        .last()
        .map_or_else(|| "no output".to_string(), |l| l.trim().to_string())
}

/// One GET against the sensor endpoint
async fn http_probe(client: &reqwest::Client, url: &str) -> (bool, String) {
    match client.get(url).send().await {
        Ok(resp) => {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            let excerpt: String = body
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
                .chars()
                .take(200)
                .collect();
            (status.as_u16() == 200, format!("HTTP {} {}", status.as_u16(), excerpt))
        }
        Err(e) => (false, format!("http error: {e}")),
    }
}

async fn append_line(path: &Path, line: &str) -> Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(line.as_bytes()).await?;
    file.write_all(b"\n").await?;
    Ok(())
}

/// Host component of the sensor URL
fn host_of(url: &str) -> Result<String> {
    let parsed = reqwest::Url::parse(url)
        .map_err(|e| Error::InvalidConfig(format!("invalid sensor url {url:?}: {e}")))?;
    parsed
        .host_str()
        .map(str::to_string)
        .ok_or_else(|| Error::InvalidConfig(format!("sensor url {url:?} has no host")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(Reachability::classify(true, true), Reachability::Ok);
        assert_eq!(Reachability::classify(true, false), Reachability::PingOnly);
        assert_eq!(Reachability::classify(false, true), Reachability::HttpOnly);
        assert_eq!(Reachability::classify(false, false), Reachability::Down);
        assert_eq!(Reachability::Down.as_str(), "DOWN");
        assert_eq!(Reachability::PingOnly.as_str(), "PING_ONLY");
    }

    #[test]
    fn test_summarize_ping_prefers_reply_line() {
        let reply = "PING 10.0.0.7 (10.0.0.7) 56(84) bytes of data.\n\
                     64 bytes from 10.0.0.7: icmp_seq=1 ttl=64 time=0.5 ms\n\
                     \n\
                     --- 10.0.0.7 ping statistics ---";
        assert!(summarize_ping(reply).starts_with("64 bytes from"));

        let loss = "PING 10.0.0.7 (10.0.0.7) 56(84) bytes of data.\n\
                    \n\
                    --- 10.0.0.7 ping statistics ---\n\
                    1 packets transmitted, 0 received, 100% packet loss, time 0ms";
        assert!(summarize_ping(loss).contains("100% packet loss"));

        assert_eq!(summarize_ping(""), "no output");
        assert_eq!(summarize_ping("lone line\n"), "lone line");
    }

    #[test]
    fn test_host_of() {
        assert_eq!(
            host_of("http://tank-sensor.local/distance").unwrap(),
            "tank-sensor.local"
        );
        assert_eq!(host_of("http://10.1.2.3:8000/distance").unwrap(), "10.1.2.3");
        assert!(host_of("not a url").is_err());
    }

    #[tokio::test]
    async fn test_append_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("monitor.log");
        append_line(&path, "line one").await.unwrap();
        append_line(&path, "line two").await.unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "line one\nline two\n");
    }
}
