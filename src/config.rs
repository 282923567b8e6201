use clap::Parser;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// roomcast chat hub server
#[derive(Parser, Serialize, Deserialize, Clone, Debug)]
#[command(name = "roomcast-server", version, about = "Room chat presence and broadcast hub")]
pub struct Config {
    /// Port to listen on
    #[arg(long, env = "ROOMCAST_PORT", default_value = "5000")]
    pub port: u16,

    /// Bind address
    #[arg(long, env = "ROOMCAST_BIND_ADDRESS", default_value = "0.0.0.0")]
    pub bind_address: String,

    /// Path to TOML config file
    #[arg(long, default_value = "./roomcast.toml")]
    pub config: String,

    /// Enable structured JSON logging (for Docker/production)
    #[arg(long, env = "ROOMCAST_JSON_LOGS")]
    pub json_logs: bool,

    /// Output a commented TOML config template and exit
    #[arg(long)]
    pub generate_config: bool,

    /// Rooms that always exist, even with zero members. Seeded at startup
    /// before any connection is accepted.
    #[arg(
        long = "permanent-room",
        env = "ROOMCAST_PERMANENT_ROOMS",
        value_delimiter = ',',
        default_values_t = [String::from("General"), String::from("Random")]
    )]
    pub permanent_rooms: Vec<String>,

    /// Maximum accepted length (bytes) for room and display names
    #[arg(long, env = "ROOMCAST_MAX_NAME_LENGTH", default_value = "64")]
    pub max_name_length: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5000,
            bind_address: "0.0.0.0".to_string(),
            config: "./roomcast.toml".to_string(),
            json_logs: false,
            generate_config: false,
            permanent_rooms: vec!["General".to_string(), "Random".to_string()],
            max_name_length: 64,
        }
    }
}

impl Config {
    /// Load config with layered precedence:
    /// built-in defaults < TOML file < env vars (ROOMCAST_*) < CLI args
    pub fn load() -> Result<Self, figment::Error> {
        let cli = Config::parse();
        let config_path = cli.config.clone();

        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_path))
            .merge(Env::prefixed("ROOMCAST_"))
            .merge(Serialized::defaults(cli))
            .extract()
    }
}

/// Generate a commented TOML config template
pub fn generate_config_template() -> String {
    r#"# roomcast Server Configuration
# Place this file at ./roomcast.toml or specify with --config <path>
# All settings can be overridden via environment variables (ROOMCAST_PORT, etc.)
# or CLI flags (--port, etc.)

# Server port (default: 5000)
# port = 5000

# Bind address (default: 0.0.0.0 — all interfaces)
# bind_address = "0.0.0.0"

# Enable structured JSON logging for Docker/production
# json_logs = false

# Rooms that always exist, even with zero members.
# Non-permanent rooms are created on first join and deleted when their
# last member leaves.
# permanent_rooms = ["General", "Random"]

# Maximum accepted length (bytes) for room and display names
# max_name_length = 64
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_seed_the_two_standard_rooms() {
        let config = Config::default();
        assert_eq!(config.permanent_rooms, vec!["General", "Random"]);
        assert_eq!(config.port, 5000);
    }
}
