//! Progress reporting for chunked reads and writes.

/// Progress information for a chunked transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferProgress {
    /// Bytes transferred so far
    pub done: u64,
    /// Total bytes to transfer, when known up front (writes only)
    pub total: Option<u64>,
    /// Share-relative path of the object being transferred
    pub path: String,
}

impl TransferProgress {
    /// Create a new progress report.
    pub fn new(done: u64, total: Option<u64>, path: impl Into<String>) -> Self {
        Self {
            done,
            total,
            path: path.into(),
        }
    }

    /// Get progress as a percentage (0.0 to 100.0), if the total is known.
    pub fn percent(&self) -> Option<f64> {
        match self.total {
            Some(0) => Some(100.0),
            Some(total) => Some((self.done as f64 / total as f64) * 100.0),
            None => None,
        }
    }

    /// Check if transfer is complete.
    pub fn is_complete(&self) -> bool {
        self.total.is_some_and(|total| self.done >= total)
    }
}

/// Type alias for progress callback function.
///
/// Report-only: the callback observes each chunk and cannot stop the transfer.
pub type ProgressCallback = Box<dyn FnMut(&TransferProgress) + Send>;

/// Create a simple progress callback that prints to stderr.
///
/// # Example
/// ```no_run
/// use smbsession::progress::make_progress_printer;
///
/// let callback = make_progress_printer();
/// ```
pub fn make_progress_printer() -> ProgressCallback {
    Box::new(|progress: &TransferProgress| match progress.percent() {
        Some(percent) => eprintln!(
            "{}: {}/{} bytes ({:.1}%)",
            progress.path,
            progress.done,
            progress.total.unwrap_or_default(),
            percent
        ),
        None => eprintln!("{}: {} bytes", progress.path, progress.done),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent() {
        assert_eq!(TransferProgress::new(5, Some(10), "a").percent(), Some(50.0));
        assert_eq!(TransferProgress::new(0, Some(0), "a").percent(), Some(100.0));
        assert_eq!(TransferProgress::new(5, None, "a").percent(), None);
    }

    #[test]
    fn test_is_complete() {
        assert!(TransferProgress::new(10, Some(10), "a").is_complete());
        assert!(!TransferProgress::new(9, Some(10), "a").is_complete());
        assert!(!TransferProgress::new(9, None, "a").is_complete());
    }
}
