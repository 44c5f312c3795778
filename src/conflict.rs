/// The user's answer to a `cart_conflict` dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictDecision {
    /// Abort the attempted mutation; nothing changes.
    KeepExisting,
    /// Delete every conflicting cart, then re-issue the original request.
    DeleteAndRetry,
}

/// Bounded retry budget for a mutation that hit a structured conflict.
///
/// The original attempt is number zero; `allows(n)` says whether retry
/// number `n` may be issued. The default budget is a single retry — a
/// conflict surviving its resolution is reported, never looped on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
}

impl RetryPolicy {
    pub const fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }

    pub const fn once() -> Self {
        Self::new(1)
    }

    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub const fn allows(&self, retry: u32) -> bool {
        retry <= self.max_retries
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::once()
    }
}
