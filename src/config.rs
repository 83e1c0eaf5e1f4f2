use std::env;

use crate::resolver::MatchPolicy;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub redis_url: Option<String>,
    pub host: String,
    pub port: u16,
    /// Base URL prepended to relative product image paths.
    pub media_base_url: String,
    /// Stock balances equal to this value are hidden in add-to-cart
    /// responses. `STOCK_DISPLAY_SENTINEL=none` disables the behavior.
    pub stock_display_sentinel: Option<i32>,
    pub resolver_match_policy: MatchPolicy,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let redis_url = env::var("REDIS_URL").ok().filter(|url| !url.is_empty());
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let media_base_url = env::var("MEDIA_BASE_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:3000/media".to_string());
        let stock_display_sentinel = parse_sentinel(env::var("STOCK_DISPLAY_SENTINEL").ok())?;
        let resolver_match_policy = match env::var("RESOLVER_MATCH_POLICY") {
            Ok(raw) => raw
                .parse()
                .map_err(|err: String| anyhow::anyhow!("RESOLVER_MATCH_POLICY: {err}"))?,
            Err(_) => MatchPolicy::default(),
        };
        Ok(Self {
            database_url,
            redis_url,
            host,
            port,
            media_base_url,
            stock_display_sentinel,
            resolver_match_policy,
        })
    }
}

fn parse_sentinel(raw: Option<String>) -> anyhow::Result<Option<i32>> {
    match raw.as_deref() {
        // Default matches the storefront frontend, which treats 300 as
        // "do not display remaining stock".
        None | Some("") => Ok(Some(300)),
        Some("none") | Some("off") => Ok(None),
        Some(value) => value
            .parse::<i32>()
            .map(Some)
            .map_err(|_| anyhow::anyhow!("STOCK_DISPLAY_SENTINEL must be an integer, 'none' or 'off'")),
    }
}

#[cfg(test)]
mod tests {
    use super::parse_sentinel;

    #[test]
    fn sentinel_defaults_to_300() {
        assert_eq!(parse_sentinel(None).unwrap(), Some(300));
        assert_eq!(parse_sentinel(Some(String::new())).unwrap(), Some(300));
    }

    #[test]
    fn sentinel_can_be_disabled_or_overridden() {
        assert_eq!(parse_sentinel(Some("none".into())).unwrap(), None);
        assert_eq!(parse_sentinel(Some("off".into())).unwrap(), None);
        assert_eq!(parse_sentinel(Some("150".into())).unwrap(), Some(150));
        assert!(parse_sentinel(Some("lots".into())).is_err());
    }
}
