use clap::Parser;
use medchat_cli::{Args, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    telemetry::init(args.verbose);

    medchat_cli::run(args).await
}
