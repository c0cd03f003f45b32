//! WebDriver process management and application health gate

use std::process::{Child, Command, Stdio};
use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::DriverConfig;
use crate::error::{Error, Result};

/// Handle to a running WebDriver process (chromedriver, geckodriver)
pub struct DriverHandle {
    child: Child,
    endpoint: String,
    pub port: u16,
}

impl DriverHandle {
    /// Spawn the driver binary and wait until its status endpoint is ready
    pub async fn spawn(config: DriverConfig) -> Result<Self> {
        let port = config.port.unwrap_or_else(find_free_port);
        let endpoint = format!("http://127.0.0.1:{}", port);

        info!("Spawning WebDriver on port {}", port);

        let mut cmd = Command::new(&config.binary_path);
        cmd.arg(format!("--port={}", port));
        cmd.args(&config.extra_args);
        cmd.stdout(Stdio::null()).stderr(Stdio::null());

        let child = cmd.spawn().map_err(|e| {
            Error::DriverStartup(format!(
                "failed to spawn {}: {}",
                config.binary_path.display(),
                e
            ))
        })?;

        let handle = DriverHandle {
            child,
            endpoint: endpoint.clone(),
            port,
        };

        handle.wait_for_ready(config.startup_timeout).await?;

        info!("WebDriver ready at {}", endpoint);
        Ok(handle)
    }

    /// Wait for the driver to report ready on its status endpoint
    async fn wait_for_ready(&self, timeout: Duration) -> Result<()> {
        let status_url = format!("{}/status", self.endpoint);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()?;

        let start = std::time::Instant::now();
        let mut attempts = 0;

        while start.elapsed() < timeout {
            attempts += 1;

            match client.get(&status_url).send().await {
                Ok(resp) if resp.status().is_success() => {
                    match resp.json::<serde_json::Value>().await {
                        Ok(body) if body["value"]["ready"].as_bool().unwrap_or(false) => {
                            return Ok(());
                        }
                        Ok(_) => {}
                        Err(e) => warn!("Driver status body unreadable: {}", e),
                    }
                }
                Ok(resp) => {
                    warn!("Driver status returned {}", resp.status());
                }
                Err(e) => {
                    if attempts == 1 {
                        info!("Waiting for WebDriver to start...");
                    }
                    // Connection refused is expected while the driver is starting
                    if !e.is_connect() {
                        warn!("Driver status error: {}", e);
                    }
                }
            }

            sleep(Duration::from_millis(100)).await;
        }

        Err(Error::DriverHealthCheck(attempts))
    }

    /// WebDriver endpoint URL for opening sessions
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Stop the driver process
    pub fn stop(&mut self) -> Result<()> {
        info!("Stopping WebDriver (pid: {})", self.child.id());

        // Try graceful shutdown first
        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            let pid = Pid::from_raw(self.child.id() as i32);
            if kill(pid, Signal::SIGTERM).is_ok() {
                std::thread::sleep(Duration::from_millis(500));
            }
        }

        // Force kill if still running
        let _ = self.child.kill();
        let _ = self.child.wait();

        Ok(())
    }
}

impl Drop for DriverHandle {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// Poll the application base URL until it responds. Any HTTP response counts:
/// an unauthenticated redirect to /login still means the app is up.
pub async fn wait_for_app(base_url: &str, timeout: Duration) -> Result<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()?;

    let start = std::time::Instant::now();
    let mut attempts = 0;

    while start.elapsed() < timeout {
        attempts += 1;

        match client.get(base_url).send().await {
            Ok(_) => return Ok(()),
            Err(e) => {
                if attempts == 1 {
                    info!("Waiting for application at {}...", base_url);
                }
                if !e.is_connect() {
                    warn!("Application health check error: {}", e);
                }
            }
        }

        sleep(Duration::from_millis(250)).await;
    }

    Err(Error::AppUnreachable {
        url: base_url.to_string(),
        attempts,
    })
}

/// Find a free port to use
fn find_free_port() -> u16 {
    use std::net::TcpListener;

    TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind to find free port")
        .local_addr()
        .expect("Failed to get local addr")
        .port()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_free_port() {
        let port1 = find_free_port();
        let port2 = find_free_port();

        // Ports should be in valid range
        assert!(port1 > 1024);
        assert!(port2 > 1024);
    }

    #[tokio::test]
    async fn test_wait_for_app_unreachable() {
        // Nothing listens on this port; the gate should give up quickly
        let result = wait_for_app("http://127.0.0.1:1", Duration::from_millis(300)).await;
        assert!(matches!(result, Err(Error::AppUnreachable { .. })));
    }
}
