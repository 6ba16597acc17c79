use dioxus::document;
use dioxus::prelude::*;

use super::run_load;
use crate::host::{LinkOpener, OpenError};
use crate::state::{LinkOutcome, Viewer};
use crate::utils::opener::SystemOpener;

/// Fallback opener that asks the webview to open the target
struct WebviewOpener;

impl LinkOpener for WebviewOpener {
    fn open_external(&self, target: &str) -> Result<(), OpenError> {
        // Use JSON encoding to safely escape the string for JavaScript
        let encoded = serde_json::to_string(target).map_err(|e| OpenError {
            target: target.to_string(),
            message: e.to_string(),
        })?;
        let js = format!("window.open({encoded}, '_blank');");
        spawn(async move {
            let _ = document::eval(&js).await;
        });
        Ok(())
    }
}

#[component]
pub fn Content() -> Element {
    let viewer = use_context::<Signal<Viewer>>();
    let (html, banner, current_match) = {
        let viewer = viewer.read();
        (
            viewer.active_html(),
            viewer.error_banner(),
            viewer.search().current_index(),
        )
    };

    use_link_click_handler(viewer);

    // Keep the current match in view
    use_effect(use_reactive!(|current_match| {
        if current_match.is_some() {
            spawn(async move {
                let _ = document::eval(indoc::indoc! {r#"
                    document
                        .querySelector('mark.search-highlight-current')
                        ?.scrollIntoView({ block: 'center' });
                "#})
                .await;
            });
        }
    }));

    rsx! {
        div {
            class: "content",

            if let Some(message) = banner {
                div {
                    class: "error-banner",
                    "{message}"
                }
            }

            article {
                class: "markdown-body",
                dangerous_inner_html: "{html}",
            }
        }
    }
}

/// Hook to route clicks on rendered links back into the viewer
fn use_link_click_handler(mut viewer: Signal<Viewer>) {
    use_hook(move || {
        let mut eval_provider = document::eval(indoc::indoc! {r#"
            document.addEventListener('click', (event) => {
                const link = event.target.closest('.markdown-body a[href]');
                if (!link) return;
                event.preventDefault();
                dioxus.send(link.getAttribute('href'));
            });
        "#});

        spawn(async move {
            while let Ok(href) = eval_provider.recv::<String>().await {
                tracing::info!(%href, "Markdown link clicked");
                let outcome = viewer
                    .write()
                    .open_link(&href, &SystemOpener, &WebviewOpener);
                match outcome {
                    LinkOutcome::ScrollTo(anchor) => scroll_to_anchor(anchor),
                    LinkOutcome::Load(pending) => run_load(viewer, Some(pending)),
                    LinkOutcome::Handled => {}
                }
            }
        });
    });
}

fn scroll_to_anchor(anchor: String) {
    let Ok(encoded) = serde_json::to_string(&anchor) else {
        return;
    };
    spawn(async move {
        let js = format!("document.getElementById({encoded})?.scrollIntoView();");
        let _ = document::eval(&js).await;
    });
}
