// Command line and environment, validated once into `Config`.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::credential::FileBackend;
use crate::error::Error;
use crate::types::Color;

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp-image-generation";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Parser, Debug)]
#[command(author, version, about = "Doodle on a canvas and let Gemini redraw it")]
pub struct Args {
    /// Base URL of the generation API
    #[arg(long, env = "GEMINI_API_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
    /// Model that accepts an image + text and answers with an image
    #[arg(long, default_value = DEFAULT_MODEL)]
    pub model: String,
    /// Request timeout in seconds (0 waits forever)
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,
    /// Where the API key is persisted (defaults to the user config dir)
    #[arg(long)]
    pub credential_file: Option<PathBuf>,
    /// API key for this session only; never written to disk
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
    /// Initial pen color as #RRGGBB
    #[arg(long, default_value = "#000000")]
    pub pen_color: String,
    /// Keep a copy of every generated image in this folder
    #[arg(long)]
    pub save_dir: Option<PathBuf>,
    /// Verbose logging (honours RUST_LOG)
    #[arg(long)]
    pub debug: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ServiceConfig {
    pub endpoint: String,
    pub model: String,
    pub timeout: Option<Duration>,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub service: ServiceConfig,
    pub credential_path: Option<PathBuf>,
    pub api_key: Option<String>,
    pub pen_color: Color,
    pub save_dir: Option<PathBuf>,
    pub debug: bool,
}

impl Config {
    pub fn from_args(args: Args) -> Result<Self, Error> {
        let endpoint = args.endpoint.trim().to_string();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(Error::Config(format!("endpoint must be an http(s) URL, got '{endpoint}'")));
        }
        if args.model.trim().is_empty() {
            return Err(Error::Config("model name must not be empty".into()));
        }
        let timeout = match args.timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        Ok(Self {
            service: ServiceConfig { endpoint, model: args.model.trim().to_string(), timeout },
            credential_path: args.credential_file.or_else(FileBackend::default_path),
            api_key: args.api_key.filter(|k| !k.trim().is_empty()),
            pen_color: Color::parse_hex(&args.pen_color)?,
            save_dir: args.save_dir,
            debug: args.debug,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Result<Config, Error> {
        let mut full = vec!["co-drawing"];
        full.extend_from_slice(argv);
        Config::from_args(Args::try_parse_from(full).unwrap())
    }

    #[test]
    fn defaults_are_usable() {
        let config = parse(&["--endpoint", DEFAULT_ENDPOINT]).unwrap();
        assert_eq!(config.service.model, DEFAULT_MODEL);
        assert_eq!(config.service.timeout, Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)));
        assert_eq!(config.pen_color, Color::BLACK);
        assert!(!config.debug);
    }

    #[test]
    fn zero_timeout_disables_it() {
        let config = parse(&["--endpoint", DEFAULT_ENDPOINT, "--timeout-secs", "0"]).unwrap();
        assert_eq!(config.service.timeout, None);
    }

    #[test]
    fn explicit_values_win() {
        let config = parse(&[
            "--endpoint", "http://localhost:8080",
            "--model", "m",
            "--pen-color", "#336699",
            "--credential-file", "/tmp/key.json",
            "--save-dir", "/tmp/out",
            "--debug",
        ])
        .unwrap();
        assert_eq!(config.service.endpoint, "http://localhost:8080");
        assert_eq!(config.service.model, "m");
        assert_eq!(config.pen_color, Color::rgb(0x33, 0x66, 0x99));
        assert_eq!(config.credential_path, Some(PathBuf::from("/tmp/key.json")));
        assert_eq!(config.save_dir, Some(PathBuf::from("/tmp/out")));
        assert!(config.debug);
    }

    #[test]
    fn bad_values_are_config_errors() {
        assert!(matches!(
            parse(&["--endpoint", "ftp://nope"]),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            parse(&["--endpoint", DEFAULT_ENDPOINT, "--pen-color", "blue"]),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            parse(&["--endpoint", DEFAULT_ENDPOINT, "--model", " "]),
            Err(Error::Config(_))
        ));
    }
}
