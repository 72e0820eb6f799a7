//! Example: full session walkthrough
//!
//! Connects, lists shares, creates a file and three directories under the
//! configured path, lists the path, deletes the directories and the file,
//! and disconnects. Runs against an in-process server.
//!
//! Usage:
//!   cargo run --example walkthrough -- [--config appsettings.json] [--host HOST]
//!       [--share SHARE] [--path PATH] [--user USER] [--password PASSWORD]

mod cli;

use cli::{demo_server, init_tracing, parse_settings, usage_and_exit};
use smbsession::fs::path::join_path;
use smbsession::{
    DirectoryEntry, EntryKind, MemoryTransport, ObjectHandle, OpenOptions, Session,
    ShareConnection,
};
use uuid::Uuid;

const USAGE: &str = "Usage: cargo run --example walkthrough -- [--config FILE] [--host HOST] \
[--share SHARE] [--path PATH] [--user USER] [--password PASSWORD]";

#[tokio::main]
async fn main() {
    init_tracing();
    let settings = parse_settings(USAGE);
    if !settings.positionals.is_empty() {
        usage_and_exit(USAGE);
    }

    if let Err(e) = run(&settings.config).await {
        eprintln!("Walkthrough failed: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: &smbsession::ClientConfig) -> smbsession::Result<()> {
    let endpoint = config.endpoint();
    println!("Connecting to {}", endpoint.unc());

    let session = Session::new(demo_server(config));
    session.connect(&endpoint).await?;
    session.authenticate(&config.credentials()).await?;
    if let Some(size) = config.read_chunk_size {
        session.set_read_chunk_size(size).await;
    }

    println!("Shares:");
    for share in session.list_shares().await? {
        println!("  {}", share);
    }
    println!("-------------");

    let share = session.attach_share(endpoint.share()).await?;
    let base = endpoint.base_path();

    println!("Create File");
    let file_path = join_path(base, &format!("{}.txt", Uuid::new_v4()));
    let file = share.open(&file_path, &OpenOptions::write_file()).await?;
    // The handle stays open until the final delete; close it on any failure
    // in between.
    let entries = match populate(&share, &file, &file_path, base).await {
        Ok(entries) => entries,
        Err(e) => {
            if let Err(close_err) = share.close(file).await {
                eprintln!("  close {}: {}", file_path, close_err);
            }
            session.close().await;
            return Err(e);
        }
    };

    println!("Delete Directory");
    for entry in entries
        .iter()
        .filter(|e| e.kind == EntryKind::Directory && !e.is_dot())
    {
        let dir_path = join_path(base, &entry.name);
        match share.delete_directory(&dir_path).await {
            Ok(()) => println!("  {}", dir_path),
            Err(e) => eprintln!("  {}: {}", dir_path, e),
        }
    }
    println!("-------------");

    println!("Delete File");
    share.delete_open(file).await?;
    println!("  {}", file_path);
    println!("-------------");

    session.close().await;
    println!("Disconnected.");
    Ok(())
}

/// Write the new file, create three directories, and list the base path.
async fn populate(
    share: &ShareConnection<MemoryTransport>,
    file: &ObjectHandle,
    file_path: &str,
    base: &str,
) -> smbsession::Result<Vec<DirectoryEntry>> {
    share
        .write_all(file, Uuid::new_v4().to_string().as_bytes())
        .await?;
    println!("  {}", file_path);
    println!("-------------");

    println!("Create Directory");
    for _ in 0..3 {
        let dir_path = join_path(base, &Uuid::new_v4().to_string());
        match share.create_directory(&dir_path).await {
            Ok(()) => println!("  {}", dir_path),
            Err(e) => eprintln!("  {}: {}", dir_path, e),
        }
    }
    println!("-------------");

    println!("Query Directory");
    let entries = share.list_directory(base).await?;
    for entry in &entries {
        println!("  {}", entry.name);
    }
    println!("-------------");
    Ok(entries)
}
