use dioxus::prelude::*;

use crate::state::Viewer;

#[component]
pub fn SearchBar() -> Element {
    let mut viewer = use_context::<Signal<Viewer>>();
    let (match_info, case_sensitive, has_matches) = {
        let viewer = viewer.read();
        let search = viewer.search();
        (
            search.match_info().to_string(),
            search.is_case_sensitive(),
            !search.matches().is_empty(),
        )
    };

    rsx! {
        div {
            class: "search-bar",

            // Uncontrolled input to preserve IME composition state; it is
            // unmounted on hide, so every show starts empty
            input {
                r#type: "text",
                class: "search-input",
                placeholder: "Search...",
                autofocus: true,
                oninput: move |evt| {
                    viewer.write().set_query(evt.value());
                },
                onkeydown: move |evt| {
                    match evt.key() {
                        Key::Enter => {
                            if evt.modifiers().shift() {
                                viewer.write().previous_match();
                            } else {
                                viewer.write().next_match();
                            }
                        }
                        Key::Escape => viewer.write().hide_search(),
                        _ => {}
                    }
                },
            }

            button {
                class: "search-case-button",
                class: if case_sensitive { "active" },
                title: "Match case",
                onclick: move |_| viewer.write().toggle_case_sensitive(),
                "Aa"
            }

            button {
                class: "search-nav-button",
                disabled: !has_matches,
                title: "Previous match (Shift+Enter)",
                onclick: move |_| viewer.write().previous_match(),
                "↑"
            }

            button {
                class: "search-nav-button",
                disabled: !has_matches,
                title: "Next match (Enter)",
                onclick: move |_| viewer.write().next_match(),
                "↓"
            }

            span {
                class: "search-match-info",
                "{match_info}"
            }

            button {
                class: "search-close-button",
                title: "Close (Escape)",
                onclick: move |_| viewer.write().hide_search(),
                "×"
            }
        }
    }
}
