#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = gradebook_rust::run_worker().await {
        eprintln!("gradebook-worker fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
