use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub password_reset: PasswordResetConfig,
    #[serde(default)]
    pub trending: TrendingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// 允许跨域的来源，为空时不限制
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expires_in: i64,  // seconds
    pub refresh_token_expires_in: i64, // seconds
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordResetConfig {
    /// 找回密码凭证有效期（秒）
    #[serde(default = "default_ticket_ttl")]
    pub ticket_ttl_secs: i64,
}

impl Default for PasswordResetConfig {
    fn default() -> Self {
        Self {
            ticket_ttl_secs: default_ticket_ttl(),
        }
    }
}

fn default_ticket_ttl() -> i64 {
    900
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendingConfig {
    #[serde(default = "default_period_days")]
    pub period_days: i64,
    #[serde(default = "default_trending_limit")]
    pub default_limit: usize,
    /// 热门榜快照刷新间隔（秒）
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
}

impl Default for TrendingConfig {
    fn default() -> Self {
        Self {
            period_days: default_period_days(),
            default_limit: default_trending_limit(),
            refresh_interval_secs: default_refresh_interval(),
        }
    }
}

fn default_period_days() -> i64 {
    7
}

fn default_trending_limit() -> usize {
    10
}

fn default_refresh_interval() -> u64 {
    3600
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // 尝试读取配置文件，如果不存在则完全依赖环境变量
        let config_result = std::fs::read_to_string(&config_path);

        let mut config: Config = match config_result {
            Ok(config_str) => {
                toml::from_str(&config_str).map_err(|e| format!("解析配置文件失败: {e}"))?
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                fn get_env(name: &str) -> Option<String> {
                    env::var(name).ok()
                }
                fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
                    env::var(name)
                        .ok()
                        .and_then(|v| v.parse::<T>().ok())
                        .unwrap_or(default)
                }

                // 数据库 URL 在无配置文件时必须提供
                let database_url = get_env("DATABASE_URL")
                    .ok_or("缺少 DATABASE_URL 环境变量，且未找到配置文件 config.toml")?;

                Config {
                    server: ServerConfig {
                        host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                        port: get_env_parse("SERVER_PORT", 8080u16),
                        cors_origins: Vec::new(),
                    },
                    database: DatabaseConfig {
                        url: database_url,
                        max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
                    },
                    jwt: JwtConfig {
                        secret: get_env("JWT_SECRET")
                            .unwrap_or_else(|| "change-me-in-production".to_string()),
                        access_token_expires_in: get_env_parse("JWT_ACCESS_EXPIRES_IN", 7200i64),
                        refresh_token_expires_in: get_env_parse(
                            "JWT_REFRESH_EXPIRES_IN",
                            2_592_000i64,
                        ),
                    },
                    password_reset: PasswordResetConfig::default(),
                    trending: TrendingConfig::default(),
                }
            }
            Err(e) => {
                return Err(format!("无法读取配置文件 {config_path}: {e}").into());
            }
        };

        // 环境变量覆盖（即便文件存在时也覆盖）
        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = env::var("SERVER_HOST") {
            self.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            self.server.port = p;
        }
        if let Ok(v) = env::var("CORS_ORIGINS") {
            self.server.cors_origins = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            self.database.max_connections = mc;
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.jwt.secret = v;
        }
        if let Ok(v) = env::var("JWT_ACCESS_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            self.jwt.access_token_expires_in = n;
        }
        if let Ok(v) = env::var("JWT_REFRESH_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            self.jwt.refresh_token_expires_in = n;
        }
        if let Ok(v) = env::var("PASSWORD_RESET_TICKET_TTL")
            && let Ok(n) = v.parse()
        {
            self.password_reset.ticket_ttl_secs = n;
        }
        if let Ok(v) = env::var("TRENDING_PERIOD_DAYS")
            && let Ok(n) = v.parse()
        {
            self.trending.period_days = n;
        }
        if let Ok(v) = env::var("TRENDING_DEFAULT_LIMIT")
            && let Ok(n) = v.parse()
        {
            self.trending.default_limit = n;
        }
        if let Ok(v) = env::var("TRENDING_REFRESH_INTERVAL")
            && let Ok(n) = v.parse()
        {
            self.trending.refresh_interval_secs = n;
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.password_reset.ticket_ttl_secs <= 0 {
            return Err("password_reset.ticket_ttl_secs must be positive".to_string());
        }
        if self.trending.period_days <= 0 {
            return Err("trending.period_days must be positive".to_string());
        }
        if self.trending.default_limit == 0 {
            return Err("trending.default_limit must be positive".to_string());
        }
        if self.trending.refresh_interval_secs == 0 {
            return Err("trending.refresh_interval_secs must be positive".to_string());
        }
        Ok(())
    }
}
