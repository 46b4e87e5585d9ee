use dirhash_lib::CancelToken;
use std::sync::OnceLock;

// Signal handlers cannot reach instance data, so the token lives in a process-global slot.
static ACTIVE: OnceLock<CancelToken> = OnceLock::new();

/// First Ctrl-C asks the run to stop cleanly. The default disposition is put back
/// so a second Ctrl-C terminates even if a read is stuck.
extern "C" fn on_sigint(_sig: libc::c_int) {
    if let Some(token) = ACTIVE.get() {
        token.cancel();
    }
    // SAFETY: signal() is async-signal-safe.
    unsafe {
        libc::signal(libc::SIGINT, libc::SIG_DFL);
    }
}

/// Installs the SIGINT handler and returns the token it will set.
pub fn install_interrupt_handler() -> CancelToken {
    let token = ACTIVE.get_or_init(CancelToken::new).clone();

    // SAFETY: the handler only performs an atomic store and resets the disposition.
    let previous = unsafe { libc::signal(libc::SIGINT, on_sigint as extern "C" fn(libc::c_int) as libc::sighandler_t) };
    if previous == libc::SIG_ERR {
        log::warn!("Failed to install SIGINT handler; Ctrl-C will terminate without finalizing");
    } else {
        log::debug!("SIGINT handler installed");
    }

    token
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_interrupt_cancels_and_restores_default() {
        let token = install_interrupt_handler();
        assert!(!token.is_cancelled());

        // SAFETY: raise() runs the handler synchronously on this thread.
        let raised = unsafe { libc::raise(libc::SIGINT) };
        assert_eq!(raised, 0);
        assert!(token.is_cancelled());

        // SAFETY: swapping in SIG_IGN only to read back the current disposition.
        let current = unsafe { libc::signal(libc::SIGINT, libc::SIG_IGN) };
        unsafe {
            libc::signal(libc::SIGINT, libc::SIG_DFL);
        }
        assert_eq!(current, libc::SIG_DFL);
    }
}
