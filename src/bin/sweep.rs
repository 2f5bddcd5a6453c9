#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = task_scheduler::run_sweep_once().await {
        eprintln!("task-scheduler sweep fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
