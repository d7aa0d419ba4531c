//! Runtime settings, read from the environment.

use anyhow::{Context, Result};
use ring::digest;
use std::{
    env,
    net::{IpAddr, SocketAddr},
    path::PathBuf,
};

use crate::assist::openai::{DEFAULT_BASE_URL, DEFAULT_MODEL};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";
pub const DEFAULT_LESSONS_PATH: &str = "lessons.toml";
/// "Always reply in Thai."
pub const DEFAULT_SYSTEM_PROMPT: &str = "โปรดตอบกลับเป็นภาษาไทยเสมอ";

#[derive(Clone, Debug)]
pub struct Settings {
    pub bind_addr: SocketAddr,
    pub cors_origin: String,
    pub secret_key: Option<[u8; digest::SHA256_OUTPUT_LEN]>,
    pub lessons_path: PathBuf,
    pub assist: AssistSettings,
}

#[derive(Clone, Debug)]
pub struct AssistSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub system_prompt: String,
}

impl Settings {
    pub fn from_env() -> Result<Settings> {
        Settings::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Settings> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.into());

        let host = var("HOST", DEFAULT_HOST);
        let port = match lookup("PORT") {
            None => DEFAULT_PORT,
            Some(port) => port
                .parse()
                .with_context(|| format!("PORT is not a valid port: {:?}", port))?,
        };
        let ip: IpAddr = host
            .trim()
            .parse()
            .with_context(|| format!("HOST is not a valid IP address: {:?}", host))?;
        let bind_addr = SocketAddr::new(ip, port);

        let secret_key = match lookup("SECRET_KEY") {
            None => None,
            Some(hex_key) => {
                let mut secret_key = [0u8; digest::SHA256_OUTPUT_LEN];
                hex::decode_to_slice(hex_key.trim(), &mut secret_key)
                    .context("SECRET_KEY must be 64 hex characters")?;
                Some(secret_key)
            }
        };

        Ok(Settings {
            bind_addr,
            cors_origin: var("CORS_ORIGIN", DEFAULT_CORS_ORIGIN),
            secret_key,
            lessons_path: var("LESSONS_PATH", DEFAULT_LESSONS_PATH).into(),
            assist: AssistSettings {
                api_key: lookup("OPENAI_API_KEY").filter(|key| !key.is_empty()),
                base_url: var("OPENAI_BASE_URL", DEFAULT_BASE_URL),
                model: var("ASSIST_MODEL", DEFAULT_MODEL),
                system_prompt: var("ASSIST_SYSTEM_PROMPT", DEFAULT_SYSTEM_PROMPT),
            },
        })
    }
}
