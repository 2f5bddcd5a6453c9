#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = task_scheduler::run_worker().await {
        eprintln!("task-scheduler worker fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
