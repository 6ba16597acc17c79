use crate::host::{LinkOpener, OpenError};

/// Opens targets with the platform's default handler
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemOpener;

impl LinkOpener for SystemOpener {
    fn open_external(&self, target: &str) -> Result<(), OpenError> {
        open::that(target).map_err(|e| OpenError {
            target: target.to_string(),
            message: e.to_string(),
        })
    }
}

/// Open `target` with `primary`, falling back to `fallback` when it fails.
///
/// Failures are logged only; the caller's state is never affected.
pub fn open_with_fallback(primary: &dyn LinkOpener, fallback: &dyn LinkOpener, target: &str) {
    let Err(e) = primary.open_external(target) else {
        tracing::debug!(link = target, "Opened external link");
        return;
    };
    tracing::warn!(%e, "Failed to open link with system handler, trying fallback");
    if let Err(e) = fallback.open_external(target) {
        tracing::error!(%e, "Failed to open link");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::testing::RecordingOpener;

    #[test]
    fn test_primary_success_skips_fallback() {
        let primary = RecordingOpener::default();
        let fallback = RecordingOpener::default();

        open_with_fallback(&primary, &fallback, "https://example.com");

        assert_eq!(*primary.opened.lock(), vec!["https://example.com"]);
        assert!(fallback.opened.lock().is_empty());
    }

    #[test]
    fn test_primary_failure_uses_fallback() {
        let primary = RecordingOpener {
            fail: true,
            ..Default::default()
        };
        let fallback = RecordingOpener::default();

        open_with_fallback(&primary, &fallback, "https://example.com");

        assert_eq!(*fallback.opened.lock(), vec!["https://example.com"]);
    }

    #[test]
    fn test_both_failing_does_not_panic() {
        let primary = RecordingOpener {
            fail: true,
            ..Default::default()
        };
        let fallback = RecordingOpener {
            fail: true,
            ..Default::default()
        };

        open_with_fallback(&primary, &fallback, "https://example.com");
    }
}
