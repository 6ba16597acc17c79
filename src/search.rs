//! In-document search over the active document's rendered content.
//!
//! Finding matches ([`find_matches`]) and painting highlights ([`paint`]) are
//! pure functions over [`RenderedContent`](crate::markdown::RenderedContent);
//! [`SearchManager`] only keeps the query, the toggles and the navigation
//! cursor.

mod highlight;
mod manager;
mod matcher;

pub use highlight::{paint, CURRENT_CLASS, HIGHLIGHT_CLASS};
pub use manager::{MatchInfo, SearchManager};
pub use matcher::{find_in_text, find_matches, Match};
