mod app;
mod content;
mod search_bar;
mod tab;

pub use app::{App, LaunchOptions};

use dioxus::prelude::*;

use crate::state::{PendingLoad, Viewer};

/// Run a load in the background and commit it to the viewer when done
pub(crate) fn run_load(mut viewer: Signal<Viewer>, pending: Option<PendingLoad>) {
    let Some(pending) = pending else {
        return;
    };
    spawn(async move {
        let done = pending.execute().await;
        // Failures are already recorded on the document and logged
        let _ = viewer.write().complete_load(done);
    });
}
