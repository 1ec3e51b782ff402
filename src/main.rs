#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = snapquiz::run().await {
        eprintln!("snapquiz fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
