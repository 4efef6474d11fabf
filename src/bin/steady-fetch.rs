use std::time::Duration;

use clap::Parser;
use reqwest::redirect;

use steady_http::client::{Client, Transport, DEFAULT_TIMEOUT};

#[derive(Parser)]
#[command(name = "steady-fetch")]
#[command(about = "GET a URL with a bounded timeout", long_about = None)]
struct Cli {
    /// URL to fetch
    url: String,

    /// Total request timeout in seconds (0 disables it)
    #[arg(short, long, default_value_t = DEFAULT_TIMEOUT.as_secs())]
    timeout_secs: u64,

    /// Return redirect responses instead of following them
    #[arg(long)]
    no_redirects: bool,

    /// Ignore proxy settings from the environment
    #[arg(long)]
    no_proxy: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut builder = Client::builder().with_timeout(Duration::from_secs(cli.timeout_secs));
    if cli.no_redirects {
        builder = builder.with_redirect_policy(redirect::Policy::none());
    }
    if cli.no_proxy {
        builder = builder.with_transport(Transport::new().no_proxy());
    }
    let client = builder.build()?;

    let res = client.get(&cli.url).send().await?;
    let status = res.status();
    let body = res.text().await?;

    if !status.is_success() {
        eprintln!("Error: {} returned status {}", cli.url, status);
    }
    println!("{}", body);
    Ok(())
}
