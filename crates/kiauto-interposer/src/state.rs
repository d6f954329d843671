use std::cell::{Cell, UnsafeCell};

// ============================================================================
// Recursion Guard
// ============================================================================

thread_local! {
    static IN_INTERPOSER: Cell<bool> = const { Cell::new(false) };
}

/// Held while the interposer is doing its own work on this thread.
///
/// Anything the interposer calls that lands back in a wrapped symbol (reading
/// its config files, opening the log file) sees the guard taken and passes
/// straight through without tracing.
pub struct InterposerGuard(());

impl InterposerGuard {
    /// `None` when this thread is already inside the interposer, or when its
    /// thread-locals are gone (thread teardown).
    pub fn enter() -> Option<Self> {
        IN_INTERPOSER
            .try_with(|active| {
                if active.replace(true) {
                    None
                } else {
                    Some(InterposerGuard(()))
                }
            })
            .ok()
            .flatten()
    }

    /// Whether this thread is inside the interposer. Counts as held once the
    /// thread-locals are gone.
    pub fn is_held() -> bool {
        IN_INTERPOSER.try_with(Cell::get).unwrap_or(true)
    }
}

impl Drop for InterposerGuard {
    fn drop(&mut self) {
        let _ = IN_INTERPOSER.try_with(|active| active.set(false));
    }
}

// ============================================================================
// Per-call-site state
// ============================================================================

/// Mutable state owned by one call site, without a lock.
///
/// Precondition for every access: the call site has a single writer. GTK and
/// Pango are only driven from the main thread, so this holds for the wrapped
/// entry points that use it.
pub struct SiteCell<T>(UnsafeCell<T>);

unsafe impl<T: Send> Sync for SiteCell<T> {}

impl<T> SiteCell<T> {
    pub const fn new(value: T) -> Self {
        Self(UnsafeCell::new(value))
    }

    /// # Safety
    /// No other thread may access the cell during `f`.
    pub unsafe fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut *self.0.get())
    }
}

// ============================================================================
// FixedString: Zero-Allocation String Storage
// ============================================================================

/// Inline byte buffer that silently truncates at `N`
#[derive(Clone, Copy)]
pub struct FixedString<const N: usize> {
    data: [u8; N],
    len: usize,
}

impl<const N: usize> FixedString<N> {
    pub const fn new() -> Self {
        Self {
            data: [0u8; N],
            len: 0,
        }
    }

    pub fn set(&mut self, bytes: &[u8]) {
        let to_copy = std::cmp::min(bytes.len(), N);
        self.data[..to_copy].copy_from_slice(&bytes[..to_copy]);
        self.len = to_copy;
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }

}

impl<const N: usize> std::fmt::Debug for FixedString<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(self.as_bytes()))
    }
}

impl<const N: usize> Default for FixedString<N> {
    fn default() -> Self {
        Self::new()
    }
}
