// State module - open documents, session persistence and the viewer context

mod document;
pub use document::{title_for, Document, DocumentId, LoadError, UNTITLED};

mod load;
pub use load::{CompletedLoad, LoadOrigin, LoadPipeline, PendingLoad};

mod persistence;
pub use persistence::{RestoreError, SessionSnapshot, TabEntry, SESSION_KEY, SNAPSHOT_VERSION};

mod session;
pub use session::SessionManager;

mod viewer;
pub use viewer::{LinkOutcome, Viewer};
