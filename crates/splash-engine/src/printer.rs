//! # Receipt Printing
//!
//! Receipts are printed after the bill or refund is already durable. A jammed
//! or missing printer must never fail the sale, so printing runs on its own
//! task behind a bounded queue.
//!
//! ## Spooler Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Print Spooler                                    │
//! │                                                                         │
//! │  BillingEngine / RefundEngine                                           │
//! │       │                                                                 │
//! │       │  handle.submit(receipt)   ← try_send, never waits               │
//! │       │      ├── queued                                                 │
//! │       │      └── queue full / spooler gone → warn!, receipt dropped     │
//! │       ▼                                                                 │
//! │  ┌──────────────────────────────┐                                       │
//! │  │   mpsc queue (capacity N)    │                                       │
//! │  └──────────────┬───────────────┘                                       │
//! │                 ▼                                                       │
//! │  PrintSpooler::run()                                                    │
//! │       │  spawn_blocking(printer.print(&receipt))                        │
//! │       ├── Ok  → debug!                                                  │
//! │       └── Err → error!, next receipt                                    │
//! │                                                                         │
//! │  shutdown(): stop accepting, print what is queued, exit                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use splash_core::Receipt;

/// Default number of receipts that can wait for the printer.
pub const DEFAULT_SPOOL_CAPACITY: usize = 64;

// =============================================================================
// Printers
// =============================================================================

#[derive(Debug, Error)]
pub enum PrintError {
    #[error("printer I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("printer unavailable: {0}")]
    Unavailable(String),
}

/// A receipt output device.
///
/// Called from a blocking thread; implementations may do synchronous I/O.
pub trait ReceiptPrinter: Send + Sync + 'static {
    fn print(&self, receipt: &Receipt) -> Result<(), PrintError>;
}

/// Writes receipts to the log. Used when no device is configured.
#[derive(Debug, Default, Clone)]
pub struct LogPrinter;

impl ReceiptPrinter for LogPrinter {
    fn print(&self, receipt: &Receipt) -> Result<(), PrintError> {
        info!(
            kind = receipt.kind.as_str(),
            bill_no = %receipt.bill_no,
            total = %receipt.total,
            "Receipt issued"
        );
        debug!("\n{}", receipt.render());
        Ok(())
    }
}

/// Appends rendered receipts to a text file, e.g. a spool file watched by a
/// line printer daemon.
#[derive(Debug, Clone)]
pub struct FilePrinter {
    path: PathBuf,
}

impl FilePrinter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FilePrinter { path: path.into() }
    }
}

impl ReceiptPrinter for FilePrinter {
    fn print(&self, receipt: &Receipt) -> Result<(), PrintError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(receipt.render().as_bytes())?;
        file.write_all(b"\n\n")?;
        file.flush()?;
        Ok(())
    }
}

// =============================================================================
// Spooler
// =============================================================================

/// Background task feeding receipts to a [`ReceiptPrinter`].
pub struct PrintSpooler {
    printer: Arc<dyn ReceiptPrinter>,

    queue_rx: mpsc::Receiver<Receipt>,

    shutdown_rx: mpsc::Receiver<()>,
}

/// Handle for submitting receipts and stopping the spooler.
#[derive(Debug, Clone)]
pub struct PrintSpoolerHandle {
    queue_tx: mpsc::Sender<Receipt>,

    shutdown_tx: mpsc::Sender<()>,
}

impl PrintSpoolerHandle {
    /// Queues a receipt without waiting.
    ///
    /// Returns `false` if the receipt was dropped because the queue is full
    /// or the spooler has stopped.
    pub fn submit(&self, receipt: Receipt) -> bool {
        match self.queue_tx.try_send(receipt) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(r)) => {
                warn!(bill_no = %r.bill_no, "Print queue full, receipt dropped");
                false
            }
            Err(mpsc::error::TrySendError::Closed(r)) => {
                warn!(bill_no = %r.bill_no, "Print spooler stopped, receipt dropped");
                false
            }
        }
    }

    /// Asks the spooler to finish what is queued and stop.
    pub async fn shutdown(&self) {
        // Already stopped if the receiver is gone.
        let _ = self.shutdown_tx.send(()).await;
    }
}

impl PrintSpooler {
    /// Creates a spooler and its handle. Spawn [`run`](Self::run) to start it.
    pub fn new(printer: Arc<dyn ReceiptPrinter>, capacity: usize) -> (Self, PrintSpoolerHandle) {
        let (queue_tx, queue_rx) = mpsc::channel(capacity.max(1));
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let spooler = PrintSpooler {
            printer,
            queue_rx,
            shutdown_rx,
        };
        let handle = PrintSpoolerHandle {
            queue_tx,
            shutdown_tx,
        };

        (spooler, handle)
    }

    /// Spawns the spooler on the current runtime.
    pub fn spawn(
        printer: Arc<dyn ReceiptPrinter>,
        capacity: usize,
    ) -> (PrintSpoolerHandle, tokio::task::JoinHandle<()>) {
        let (spooler, handle) = Self::new(printer, capacity);
        let task = tokio::spawn(spooler.run());
        (handle, task)
    }

    /// Runs the spooler loop until shutdown or until every handle is dropped.
    pub async fn run(mut self) {
        info!("Print spooler starting");

        loop {
            tokio::select! {
                received = self.queue_rx.recv() => {
                    match received {
                        Some(receipt) => self.print(receipt).await,
                        None => break,
                    }
                }

                _ = self.shutdown_rx.recv() => {
                    info!("Print spooler shutting down");
                    self.queue_rx.close();
                    while let Some(receipt) = self.queue_rx.recv().await {
                        self.print(receipt).await;
                    }
                    break;
                }
            }
        }

        info!("Print spooler stopped");
    }

    async fn print(&self, receipt: Receipt) {
        let printer = Arc::clone(&self.printer);
        let bill_no = receipt.bill_no.clone();

        match tokio::task::spawn_blocking(move || printer.print(&receipt)).await {
            Ok(Ok(())) => debug!(bill_no = %bill_no, "Receipt printed"),
            Ok(Err(e)) => error!(?e, bill_no = %bill_no, "Failed to print receipt"),
            Err(e) => error!(?e, bill_no = %bill_no, "Printer task panicked"),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};
    use splash_core::{Money, ReceiptKind};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingPrinter {
        printed: Mutex<Vec<String>>,
    }

    impl ReceiptPrinter for RecordingPrinter {
        fn print(&self, receipt: &Receipt) -> Result<(), PrintError> {
            if receipt.bill_no == "JAM" {
                return Err(PrintError::Unavailable("paper jam".to_string()));
            }
            self.printed.lock().unwrap().push(receipt.bill_no.clone());
            Ok(())
        }
    }

    fn receipt(bill_no: &str) -> Receipt {
        let at = FixedOffset::east_opt(330 * 60)
            .unwrap()
            .with_ymd_and_hms(2026, 5, 3, 10, 0, 0)
            .unwrap();
        Receipt {
            kind: ReceiptKind::Sale,
            facility: "Splash".to_string(),
            bill_id: "b1".to_string(),
            bill_no: bill_no.to_string(),
            customer_name: "Asha".to_string(),
            customer_number: "9876543210".to_string(),
            issued_at: at,
            lines: Vec::new(),
            subtotal: Money::from_paise(100),
            discount_amount: Money::zero(),
            gst_amount: Money::zero(),
            total: Money::from_paise(100),
            cash_paid: Money::from_paise(100),
            online_paid: Money::zero(),
        }
    }

    #[tokio::test]
    async fn test_prints_queued_receipts_and_survives_failures() {
        let printer = Arc::new(RecordingPrinter::default());
        let (handle, task) = PrintSpooler::spawn(printer.clone(), 8);

        assert!(handle.submit(receipt("SPL-1")));
        assert!(handle.submit(receipt("JAM")));
        assert!(handle.submit(receipt("SPL-2")));

        handle.shutdown().await;
        task.await.unwrap();

        assert_eq!(*printer.printed.lock().unwrap(), vec!["SPL-1", "SPL-2"]);
        assert!(!handle.submit(receipt("SPL-3")));
    }

    #[tokio::test]
    async fn test_full_queue_drops_instead_of_waiting() {
        let printer = Arc::new(RecordingPrinter::default());
        // Not running: nothing drains the queue.
        let (_spooler, handle) = PrintSpooler::new(printer, 1);

        assert!(handle.submit(receipt("SPL-1")));
        assert!(!handle.submit(receipt("SPL-2")));
    }

    #[tokio::test]
    async fn test_file_printer_appends() {
        let path = std::env::temp_dir().join(format!("splash-receipts-{}.txt", uuid::Uuid::new_v4()));
        let printer = FilePrinter::new(&path);

        printer.print(&receipt("SPL-1")).unwrap();
        printer.print(&receipt("SPL-2")).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("SPL-1"));
        assert!(contents.contains("SPL-2"));
        std::fs::remove_file(&path).unwrap();
    }
}
