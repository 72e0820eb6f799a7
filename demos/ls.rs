//! Example: List a directory on a share
//!
//! Usage:
//!   cargo run --example ls -- [--config appsettings.json] [--pattern '*.txt'] [--all] [PATH]

mod cli;

use cli::{demo_server, init_tracing, parse_settings, usage_and_exit};
use smbsession::{ClientConfig, DirectoryEntry, EntriesExt, EntryKind, Session};

const USAGE: &str = "Usage: cargo run --example ls -- [--config FILE] [--host HOST] [--share SHARE] \
[--user USER] [--password PASSWORD] [--pattern PATTERN] [--all] [PATH]";

#[tokio::main]
async fn main() {
    init_tracing();
    let settings = parse_settings(USAGE);

    let mut pattern = smbsession::fs::MATCH_ALL.to_string();
    let mut show_all = false;
    let mut path = None;
    let mut args = settings.positionals.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--pattern" => pattern = args.next().unwrap_or_else(|| usage_and_exit(USAGE)),
            "--all" | "-a" => show_all = true,
            _ if path.is_none() => path = Some(arg),
            _ => usage_and_exit(USAGE),
        }
    }
    let config = settings.config;
    let path = path.unwrap_or_else(|| config.path.clone());

    let entries = match list(&config, &path, &pattern).await {
        Ok(entries) if show_all => entries,
        Ok(entries) => entries.without_dots(),
        Err(e) => {
            eprintln!("Failed to list {}: {}", path, e);
            std::process::exit(1);
        }
    };

    for entry in entries {
        let marker = match entry.kind {
            EntryKind::Directory => "d",
            EntryKind::File => "-",
            EntryKind::Other => "?",
        };
        println!("{} {:>10} {}", marker, entry.size, entry.name);
    }
}

async fn list(
    config: &ClientConfig,
    path: &str,
    pattern: &str,
) -> smbsession::Result<Vec<DirectoryEntry>> {
    // A small tree so there is something to list.
    let server = demo_server(config);
    server.add_file(&config.share, &format!("{}\\readme.txt", path), b"hello");
    server.add_file(&config.share, &format!("{}\\notes.txt", path), b"some notes");
    server.add_directory(&config.share, &format!("{}\\archive", path));

    let session = Session::login(server, &config.endpoint(), &config.credentials()).await?;
    let result = match session.attach_share(&config.share).await {
        Ok(share) => share.list_directory_matching(path, pattern).await,
        Err(e) => Err(e),
    };
    session.close().await;
    result
}
