//! Example: Print a file from a share
//!
//! Usage:
//!   cargo run --example cat -- [--config appsettings.json] [--chunk 4096] FILE

mod cli;

use cli::{demo_server, init_tracing, parse_settings, usage_and_exit};
use smbsession::progress::make_progress_printer;
use smbsession::{ClientConfig, Session};

const USAGE: &str = "Usage: cargo run --example cat -- [--config FILE] [--host HOST] [--share SHARE] \
[--user USER] [--password PASSWORD] [--chunk BYTES] FILE";

#[tokio::main]
async fn main() {
    init_tracing();
    let settings = parse_settings(USAGE);

    let mut chunk = None;
    let mut file = None;
    let mut args = settings.positionals.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--chunk" => {
                let size = args
                    .next()
                    .and_then(|v| v.parse::<u32>().ok())
                    .unwrap_or_else(|| usage_and_exit(USAGE));
                chunk = Some(size);
            }
            _ if file.is_none() => file = Some(arg),
            _ => usage_and_exit(USAGE),
        }
    }
    let Some(file) = file else {
        usage_and_exit(USAGE);
    };
    let config = settings.config;
    let remote = format!("{}\\{}", config.path, file);

    match cat(&config, &remote, chunk).await {
        Ok(data) => print!("{}", String::from_utf8_lossy(&data)),
        Err(e) => {
            eprintln!("Failed to read {}: {}", remote, e);
            std::process::exit(1);
        }
    }
}

async fn cat(
    config: &ClientConfig,
    remote: &str,
    chunk: Option<u32>,
) -> smbsession::Result<Vec<u8>> {
    let server = demo_server(config);
    server.add_file(
        &config.share,
        remote,
        b"The quick brown fox jumps over the lazy dog.\n",
    );

    let session = Session::login(server, &config.endpoint(), &config.credentials()).await?;
    if let Some(size) = chunk.or(config.read_chunk_size) {
        session.set_read_chunk_size(size).await;
    }
    session.watch_progress(make_progress_printer()).await;

    let result = match session.attach_share(&config.share).await {
        Ok(share) => share.read_file(remote).await,
        Err(e) => Err(e),
    };
    session.close().await;
    result
}
