use clap::Parser;

#[derive(Debug, Parser)]
#[command(author, version, about = "QFS administration console API")]
pub struct Args {
    #[arg(long, env = "QFS_CONSOLE_ADDR", default_value = "0.0.0.0:18090")]
    pub listen_addr: String,

    /// Management daemon base URL. Without it the console uses an
    /// in-process backend.
    #[arg(long, env = "QFS_MGMT_URL")]
    pub mgmt_url: Option<String>,

    /// Seed the in-process backend with a sample shared file system.
    #[arg(long, env = "QFS_MGMT_DEMO", default_value_t = false)]
    pub demo: bool,

    #[arg(long, env = "QFS_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,

    #[arg(long, env = "QFS_OTLP_TOKEN")]
    pub otlp_token: Option<String>,
}
