use std::env;
use std::process;

use smbsession::{ClientConfig, MemoryTransport};
use tracing_subscriber::{EnvFilter, fmt};

pub fn usage_and_exit(usage: &str) -> ! {
    eprintln!("{usage}");
    process::exit(1);
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("smbsession=debug"));
    fmt().with_env_filter(filter).with_target(false).init();
}

pub struct ArgParser {
    args: Vec<String>,
    usage: &'static str,
}

impl ArgParser {
    pub fn new(usage: &'static str) -> Self {
        let args: Vec<String> = env::args().skip(1).collect();

        if args.iter().any(|a| a == "--help" || a == "-h") {
            println!("{usage}");
            process::exit(0);
        }

        Self { args, usage }
    }

    pub fn take_value(&mut self, names: &[&str]) -> Option<String> {
        let mut i = 0;
        while i < self.args.len() {
            if names.contains(&self.args[i].as_str()) {
                let value = self.args.get(i + 1).cloned();
                if value.is_none() {
                    usage_and_exit(self.usage);
                }
                self.args.drain(i..=i + 1);
                return value;
            }
            i += 1;
        }
        None
    }

    pub fn remaining(self) -> Vec<String> {
        self.args
    }
}

pub struct Settings {
    pub config: ClientConfig,
    pub positionals: Vec<String>,
}

/// Build the client configuration from `--config FILE` and/or flags.
///
/// Flags win over the file; `SMB_*` environment variables win over both
/// file values when a file is given.
pub fn parse_settings(usage: &'static str) -> Settings {
    let mut parser = ArgParser::new(usage);

    let mut config = match parser.take_value(&["--config", "-c"]) {
        Some(path) => ClientConfig::load(&path).unwrap_or_else(|e| {
            eprintln!("{}", e);
            process::exit(1);
        }),
        None => ClientConfig {
            host: "127.0.0.1".to_string(),
            share: "Users".to_string(),
            path: "administrator\\shared".to_string(),
            username: "administrator".to_string(),
            password: "password".to_string(),
            ..ClientConfig::default()
        },
    };

    if let Some(host) = parser.take_value(&["--host"]) {
        config.host = host;
    }
    if let Some(share) = parser.take_value(&["--share", "-s"]) {
        config.share = share;
    }
    if let Some(path) = parser.take_value(&["--path"]) {
        config.path = path;
    }
    if let Some(username) = parser.take_value(&["--user", "-u"]) {
        config.username = username;
    }
    if let Some(password) = parser.take_value(&["--password", "-p"]) {
        config.password = password;
    }
    if let Err(e) = config.validate() {
        eprintln!("{}", e);
        usage_and_exit(usage);
    }

    Settings {
        config,
        positionals: parser.remaining(),
    }
}

/// An in-process server that accepts the configured account and exposes the
/// configured share and base path.
pub fn demo_server(config: &ClientConfig) -> MemoryTransport {
    MemoryTransport::new()
        .with_account(&config.username, &config.password)
        .with_share(&config.share)
        .with_share("IPC$")
        .with_directory(&config.share, &config.path)
}
