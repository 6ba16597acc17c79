use dioxus::prelude::*;
use std::rc::Rc;

use super::tab_item::{TabInfo, TabItem};
use crate::state::{DocumentId, Viewer};
use crate::utils::clipboard::SystemClipboard;

#[component]
pub fn TabBar() -> Element {
    let mut viewer = use_context::<Signal<Viewer>>();
    let clipboard = use_context::<Rc<SystemClipboard>>();

    // Document being dragged for reordering
    let dragged = use_signal(|| None::<DocumentId>);

    let (tabs, active_id) = {
        let viewer = viewer.read();
        let session = viewer.session();
        let tabs: Vec<TabInfo> = session.documents().iter().map(TabInfo::from).collect();
        (tabs, session.active_id())
    };

    let copy_source = {
        let clipboard = clipboard.clone();
        move |_: MouseEvent| viewer.read().copy_source(&*clipboard)
    };
    let copy_rendered = move |_: MouseEvent| viewer.read().copy_rendered(&*clipboard);

    rsx! {
        div {
            class: "tab-bar",

            for (index, tab) in tabs.iter().enumerate() {
                TabItem {
                    key: "{tab.id}",
                    index,
                    tab: tab.clone(),
                    is_active: tab.id == active_id,
                    dragged,
                }
            }

            // New tab button
            button {
                class: "tab-new",
                title: "New tab",
                onclick: move |_| {
                    viewer.write().new_document();
                },
                "+"
            }

            div { class: "tab-bar-spacer" }

            button {
                class: "tab-action",
                title: "Copy markdown source",
                onclick: copy_source,
                "Copy source"
            }
            button {
                class: "tab-action",
                title: "Copy rendered HTML",
                onclick: copy_rendered,
                "Copy HTML"
            }
        }
    }
}
