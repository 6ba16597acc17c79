//! System clipboard binding using arboard
//!
//! The clipboard handle is created on first use and then kept for the
//! lifetime of the binding: on Linux the clipboard contents are owned by the
//! application that placed them, so dropping the handle would drop the data.

use arboard::Clipboard as ArboardClipboard;
use parking_lot::Mutex;

use crate::host::{Clipboard, ClipboardError};

#[derive(Default)]
pub struct SystemClipboard {
    inner: Mutex<Option<ArboardClipboard>>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clipboard for SystemClipboard {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        let mut inner = self.inner.lock();
        if inner.is_none() {
            let clipboard =
                ArboardClipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
            *inner = Some(clipboard);
        }
        let Some(clipboard) = inner.as_mut() else {
            return Err(ClipboardError::Unavailable(
                "clipboard was not initialized".to_string(),
            ));
        };
        clipboard
            .set_text(text)
            .map_err(|e| ClipboardError::Write(e.to_string()))
    }
}
