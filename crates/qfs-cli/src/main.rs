mod args;
mod client;
mod output;

use anyhow::{bail, Result};
use clap::Parser;
use reqwest::{Client, Response};
use tracing_subscriber::EnvFilter;

use qfs_console::link::encode_fs_info;
use qfs_console::SharedFsAction;

use crate::args::{Args, Command, FsCommand, SharedCommand};
use crate::client::{api_url, auth, host_path};
use crate::output::{print_browse, print_file_systems, print_shared_page};

/// Target of a shared file system command.
struct SharedTarget<'a> {
    host: &'a str,
    fs: &'a str,
    member: &'a str,
}

async fn json_or_exit(resp: Response, what: &str) -> Result<serde_json::Value> {
    if resp.status().is_success() {
        return Ok(resp.json().await?);
    }
    eprintln!("✗ Failed to {}: {}", what, resp.text().await?);
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let client = Client::new();
    let token = args.token;
    let base = args.console_url.as_str();

    match args.command {
        Command::Shared { subcommand } => match subcommand {
            SharedCommand::Status { host, fs } => {
                let path = format!("/shared/{}", urlencoding::encode(&fs));
                let url = api_url(base, &host_path(&host, &path));
                let resp = auth(client.get(&url), token.as_ref()).send().await?;
                let page = json_or_exit(resp, "get shared file system").await?;
                print_shared_page(&page);
            }
            SharedCommand::Mount { host, fs, member } => {
                let target = SharedTarget {
                    host: &host,
                    fs: &fs,
                    member: &member,
                };
                run_action(&client, token.as_ref(), base, &target, SharedFsAction::Mount).await?;
            }
            SharedCommand::Unmount { host, fs, member } => {
                let target = SharedTarget {
                    host: &host,
                    fs: &fs,
                    member: &member,
                };
                run_action(&client, token.as_ref(), base, &target, SharedFsAction::Unmount).await?;
            }
            SharedCommand::Remove { host, fs, member } => {
                let path = format!(
                    "/shared/{}/members/{}",
                    urlencoding::encode(&fs),
                    urlencoding::encode(&member)
                );
                let url = api_url(base, &host_path(&host, &path));
                let resp = auth(client.delete(&url), token.as_ref()).send().await?;
                let page = json_or_exit(resp, "remove member").await?;
                // Removing the metadata server deletes the file system, and the
                // console answers with the host's file system list instead.
                if page["view"].as_str() == Some("file_systems") {
                    print_file_systems(&page);
                } else {
                    print_shared_page(&page);
                }
            }
        },
        Command::Fs { subcommand } => match subcommand {
            FsCommand::List { host } => {
                let url = api_url(base, &host_path(&host, "/filesystems"));
                let resp = auth(client.get(&url), token.as_ref()).send().await?;
                let summary = json_or_exit(resp, "list file systems").await?;
                print_file_systems(&summary);
            }
        },
        Command::Browse {
            host,
            path,
            fs,
            mount_point,
        } => {
            let url = api_url(base, &host_path(&host, "/browse"));
            let mut query = vec![("path", path)];
            if let Some(fs) = fs {
                query.push(("fs_info", encode_fs_info(&fs, mount_point.as_deref().unwrap_or(""))));
            }
            let resp = auth(client.get(&url), token.as_ref())
                .query(&query)
                .send()
                .await?;
            let page = json_or_exit(resp, "browse").await?;
            print_browse(&page);
        }
        Command::Whoami => {
            let url = api_url(base, "/whoami");
            let resp = auth(client.get(&url), token.as_ref()).send().await?;
            let me = json_or_exit(resp, "get identity").await?;
            println!(
                "{} ({})",
                me["principal"].as_str().unwrap_or(""),
                me["role"].as_str().unwrap_or("")
            );
        }
    }

    Ok(())
}

async fn run_action(
    client: &Client,
    token: Option<&String>,
    base: &str,
    target: &SharedTarget<'_>,
    action: SharedFsAction,
) -> Result<()> {
    let Some(option) = action.token() else {
        bail!("{} has no drop-down option", action.label());
    };
    let url = api_url(
        base,
        &host_path(
            target.host,
            &format!("/shared/{}/actions", urlencoding::encode(target.fs)),
        ),
    );
    let body = serde_json::json!({ "option": option, "member": target.member });
    tracing::debug!(url = %url, ?action, "posting shared file system action");
    let resp = auth(client.post(&url), token).json(&body).send().await?;
    let page = json_or_exit(resp, action.label()).await?;
    print_shared_page(&page);
    Ok(())
}
