mod app;
mod commands;
mod config;
mod logging;
mod playback;
mod recording;
mod setup;
mod storage;
mod ui;

/// The capture stream is not `Send`, so everything runs on one thread.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    app::run().await
}
