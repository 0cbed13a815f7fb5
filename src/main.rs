use std::io::Write;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let settings = facturacion_app::bootstrap()?;

    let mut stdout = std::io::stdout().lock();
    let outcome = facturacion_app::run(&settings, &mut stdout).await;
    stdout.flush().ok();

    // Always exit cleanly: the console lines are the result.
    tracing::info!(?outcome, "facturacion probe finished");
    Ok(())
}
