use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = linkswitch::cli::Cli::parse();
    if let Err(e) = linkswitch::cmd::dispatch(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
