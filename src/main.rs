use dotenv::dotenv;
use trinity_mind::cli;

#[tokio::main]
async fn main() {
    dotenv().ok();
    let cli = cli::parse_cli();

    // RUST_LOG wins over --log-level
    let level = std::env::var("RUST_LOG").unwrap_or_else(|_| cli.log_level.clone());
    env_logger::Builder::new().parse_filters(&level).init();

    if let Err(e) = cli::run_with_cli(cli).await {
        eprintln!("{}", cli::failure_message(&e));
        std::process::exit(1);
    }
}
