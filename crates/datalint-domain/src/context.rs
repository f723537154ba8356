use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Longest single sleep between cancellation checks.
const SLEEP_SLICE: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("operation cancelled")]
pub struct Cancelled;

#[derive(Debug, Default)]
struct CancelState {
    cancelled: AtomicBool,
    deadline: Option<Instant>,
}

/// A cancellation signal with an optional deadline, shared by clones.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    state: Arc<CancelState>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        CancelToken {
            state: Arc::new(CancelState {
                cancelled: AtomicBool::new(false),
                deadline: Some(deadline),
            }),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn cancel(&self) {
        self.state.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        if self.state.cancelled.load(Ordering::SeqCst) {
            return true;
        }
        self.state
            .deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
    }

    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }

    /// Time left before the deadline, if one is set.
    pub fn remaining(&self) -> Option<Duration> {
        self.state
            .deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Sleep for `duration`, waking early with `Err` when cancelled.
    pub fn sleep(&self, duration: Duration) -> Result<(), Cancelled> {
        let until = Instant::now() + duration;
        loop {
            self.check()?;
            let now = Instant::now();
            if now >= until {
                return Ok(());
            }
            std::thread::sleep((until - now).min(SLEEP_SLICE));
        }
    }
}

/// Per-run collaborators handed explicitly to every component.
///
/// Nothing here is process-global, so several runs can share a process without cross-talk.
#[derive(Clone, Debug)]
pub struct RunContext {
    pub cancel: CancelToken,
    /// Parent span for everything logged during the run.
    pub span: tracing::Span,
}

impl RunContext {
    pub fn new(cancel: CancelToken, span: tracing::Span) -> Self {
        RunContext { cancel, span }
    }

    /// A context with no deadline and a disabled span, for tests and embedding.
    pub fn detached() -> Self {
        RunContext {
            cancel: CancelToken::new(),
            span: tracing::Span::none(),
        }
    }
}
