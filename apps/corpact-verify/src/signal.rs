use corpact_infrastructure::control::CancellationFlag;

/// Cancels `flag` on the first Ctrl-C. The harness itself is synchronous, so
/// the signal future runs on a small runtime in its own thread.
pub fn cancel_on_ctrl_c(flag: CancellationFlag) -> Result<(), String> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| format!("failed to init signal runtime: {err}"))?;

    std::thread::Builder::new()
        .name("corpact-signal".to_string())
        .spawn(move || {
            runtime.block_on(async move {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => {
                        tracing::warn!("received Ctrl-C, cancelling run");
                        flag.cancel();
                    }
                    Err(err) => tracing::warn!(error = %err, "ctrl-c handler unavailable"),
                }
            });
        })
        .map_err(|err| format!("failed to spawn signal thread: {err}"))?;
    Ok(())
}
