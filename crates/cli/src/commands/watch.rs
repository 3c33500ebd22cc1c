//! Follow the cart until interrupted

use larder_app::context::AppContext;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::shutdown;

use super::output;

/// Keep the session fresh and print the cart whenever it settles, until Ctrl+C.
pub(crate) async fn run(app: &AppContext) -> Result<(), String> {
    let mut notices = app.cart.notices();
    let mut state = app.cart.subscribe();
    let sync = app.spawn_sync();

    app.restore().await;

    let current = state.borrow_and_update().clone();
    output::print_state(&current);

    let interrupted = shutdown::signal();
    tokio::pin!(interrupted);

    let outcome = loop {
        tokio::select! {
            result = &mut interrupted => break result.map_err(|error| error.to_string()),
            changed = state.changed() => {
                if changed.is_err() {
                    break Ok(());
                }

                let current = state.borrow_and_update().clone();

                if !current.is_loading() {
                    output::print_state(&current);
                }
            }
            notice = notices.recv() => match notice {
                Ok(notice) => output::print_notice(&notice),
                Err(RecvError::Lagged(skipped)) => debug!(skipped, "missed cart notices"),
                Err(RecvError::Closed) => break Ok(()),
            },
        }
    };

    if let Err(error) = sync.shutdown().await {
        warn!("session sync task failed: {error}");
    }

    outcome
}
