#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = task_scheduler::run().await {
        eprintln!("task-scheduler fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
