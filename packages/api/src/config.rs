const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// IP literal or hostname; resolved when the listener binds.
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST")
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match lookup("PORT") {
            Some(port) => port.parse().unwrap_or_else(|e| {
                tracing::warn!("Invalid value '{}' for PORT: {}. Using default.", port, e);
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };

        Self { host, port }
    }

    /// Address in the form accepted by `tokio::net::TcpListener::bind`.
    pub fn bind_addr(&self) -> (&str, u16) {
        (self.host.as_str(), self.port)
    }
}
