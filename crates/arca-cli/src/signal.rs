//! Ctrl-C wiring for cooperative cancellation
//!
//! The first SIGINT/SIGTERM raises the engine's [`CancelFlag`] so the
//! batch in flight stops at the next file boundary; the handler then
//! restores the default disposition so a second signal terminates
//! immediately.

use std::sync::OnceLock;

use arca_core::CancelFlag;

static CANCEL: OnceLock<CancelFlag> = OnceLock::new();

/// Install signal handlers and return the flag they raise.
pub fn install_signal_handlers() -> CancelFlag {
    let flag = CANCEL.get_or_init(CancelFlag::new).clone();

    #[cfg(unix)]
    {
        // Safety: the handler only raises an atomic flag and restores the
        // default handler.
        unsafe {
            libc::signal(
                libc::SIGTERM,
                unix_signal_handler as *const () as libc::sighandler_t,
            );
            libc::signal(
                libc::SIGINT,
                unix_signal_handler as *const () as libc::sighandler_t,
            );
        }
    }

    #[cfg(windows)]
    {
        unsafe {
            windows_sys::Win32::System::Console::SetConsoleCtrlHandler(
                Some(windows_console_handler),
                1, // TRUE
            );
        }
    }

    flag
}

fn request_cancel() {
    // The flag exists before any handler is installed, so get() never
    // races with initialization.
    if let Some(flag) = CANCEL.get() {
        flag.cancel();
    }
}

#[cfg(unix)]
extern "C" fn unix_signal_handler(sig: libc::c_int) {
    request_cancel();
    // Restore default handler so a second signal kills immediately
    unsafe {
        libc::signal(sig, libc::SIG_DFL);
    }
}

#[cfg(windows)]
unsafe extern "system" fn windows_console_handler(ctrl_type: u32) -> i32 {
    // CTRL_C_EVENT (0), CTRL_BREAK_EVENT (1), CTRL_CLOSE_EVENT (2)
    if ctrl_type <= 2 {
        request_cancel();
        // Unregister this handler so a second signal terminates immediately
        unsafe {
            windows_sys::Win32::System::Console::SetConsoleCtrlHandler(
                Some(windows_console_handler),
                0, // FALSE = remove
            );
        }
        return 1; // TRUE = handled this time
    }
    0 // FALSE = not handled
}
