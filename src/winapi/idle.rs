use crate::host::{idle_ms_since, Host};
use windows::Win32::Foundation::{LPARAM, WPARAM};
use windows::Win32::System::SystemInformation::GetTickCount64;
use windows::Win32::UI::Input::KeyboardAndMouse::{GetLastInputInfo, LASTINPUTINFO};
use windows::Win32::Graphics::Gdi::SC_SCREENSAVE;
use windows::Win32::UI::WindowsAndMessaging::{GetForegroundWindow, PostMessageW, WM_SYSCOMMAND};

/// `Host` backed by the Win32 input clock and the foreground window.
pub struct SystemHost;

impl SystemHost {
    fn last_input_tick() -> Option<u32> {
        let mut info = LASTINPUTINFO {
            cbSize: size_of::<LASTINPUTINFO>() as u32,
            dwTime: 0,
        };
        // SAFETY: `info` is a valid local structure with `cbSize` set
        if unsafe { GetLastInputInfo(&mut info) }.as_bool() {
            Some(info.dwTime)
        } else {
            debug!("GetLastInputInfo failed, assuming active user");
            None
        }
    }
}

impl Host for SystemHost {
    fn query_idle_ms(&self) -> u32 {
        let last_input = Self::last_input_tick();
        // SAFETY: The call has no preconditions
        let now = unsafe { GetTickCount64() };
        idle_ms_since(now, last_input)
    }

    fn trigger_screensaver(&self) {
        // SAFETY: The call has no preconditions
        let window = unsafe { GetForegroundWindow() };
        if window.is_invalid() {
            debug!("No foreground window to send the screen saver command to");
            return;
        }
        // SAFETY: Posting a message does not dereference anything, a stale handle only fails the call
        let result = unsafe {
            PostMessageW(
                window,
                WM_SYSCOMMAND,
                WPARAM(SC_SCREENSAVE as usize),
                LPARAM(0),
            )
        };
        if let Err(err) = result {
            debug!("Failed to post the screen saver command: {}", err);
        }
    }
}
