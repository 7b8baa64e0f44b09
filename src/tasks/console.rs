//! Terminal clock display

use tokio::{
    io::{self, AsyncWriteExt},
    sync::watch,
};
use tracing::{debug, info};

use crate::state::ClockFace;

/// Background task that redraws the clock on stdout whenever the face changes
pub async fn console_clock_task(mut face_rx: watch::Receiver<ClockFace>) {
    info!("Starting terminal clock");

    let mut stdout = io::stdout();
    loop {
        let line = face_rx.borrow_and_update().render();
        // \r + clear-to-end keeps the clock on a single terminal line
        if let Err(e) = stdout
            .write_all(format!("\r{}\x1b[K", line).as_bytes())
            .await
        {
            debug!("Terminal clock write failed: {}", e);
            break;
        }
        if let Err(e) = stdout.flush().await {
            debug!("Terminal clock flush failed: {}", e);
            break;
        }

        if face_rx.changed().await.is_err() {
            debug!("Clock face channel closed, terminal clock exiting");
            break;
        }
    }
}
