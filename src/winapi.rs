mod idle;

pub use idle::SystemHost;

use windows::core::{Error, PCWSTR};
use windows::Win32::Foundation::{BOOL, HINSTANCE, HWND, LRESULT, SYSTEMTIME};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::System::SystemInformation::GetLocalTime;
use windows::Win32::UI::WindowsAndMessaging::{
    DispatchMessageW, GetMessageW, MessageBoxW, TranslateMessage, GWLP_USERDATA, MB_ICONERROR,
    MB_OK, MSG,
};
#[cfg(target_pointer_width = "64")]
use windows::Win32::UI::WindowsAndMessaging::{GetWindowLongPtrW, SetWindowLongPtrW};
#[cfg(target_pointer_width = "32")]
use windows::Win32::UI::WindowsAndMessaging::{GetWindowLongW, SetWindowLongW};

#[inline]
pub fn get_instance_handle() -> windows::core::Result<HINSTANCE> {
    // SAFETY: lpModuleName is None instead of a raw pointer
    let module_handle = unsafe { GetModuleHandleW(None) }?;
    Ok(module_handle.into())
}

#[inline]
pub fn get_local_time() -> SYSTEMTIME {
    // SAFETY: The call has no preconditions
    unsafe { GetLocalTime() }
}

/// Reads the pointer-sized `GWLP_USERDATA` slot of a window.
///
/// # Safety
///
/// `window` must be a window owned by the current thread.
#[cfg(target_pointer_width = "64")]
#[inline]
pub unsafe fn get_window_user_data(window: HWND) -> isize {
    // SAFETY: Guaranteed by the caller
    unsafe { GetWindowLongPtrW(window, GWLP_USERDATA) }
}

/// Replaces the `GWLP_USERDATA` slot of a window and returns the previous value.
///
/// # Safety
///
/// `window` must be a window owned by the current thread.
#[cfg(target_pointer_width = "64")]
#[inline]
pub unsafe fn set_window_user_data(window: HWND, value: isize) -> isize {
    // SAFETY: Guaranteed by the caller
    unsafe { SetWindowLongPtrW(window, GWLP_USERDATA, value) }
}

/// # Safety
///
/// `window` must be a window owned by the current thread.
#[cfg(target_pointer_width = "32")]
#[inline]
pub unsafe fn get_window_user_data(window: HWND) -> isize {
    // SAFETY: Guaranteed by the caller, pointers fit into 32 bits here
    unsafe { GetWindowLongW(window, GWLP_USERDATA) as isize }
}

/// # Safety
///
/// `window` must be a window owned by the current thread.
#[cfg(target_pointer_width = "32")]
#[inline]
pub unsafe fn set_window_user_data(window: HWND, value: isize) -> isize {
    // SAFETY: Guaranteed by the caller, pointers fit into 32 bits here
    unsafe { SetWindowLongW(window, GWLP_USERDATA, value as i32) as isize }
}

#[inline]
fn unwrap_winapi_bool(bool: BOOL) -> windows::core::Result<bool> {
    match bool.0 {
        1.. => Ok(true),
        0 => Ok(false),
        _ => Err(Error::from_win32()),
    }
}

#[inline]
fn get_message(msg: &mut MSG) -> windows::core::Result<bool> {
    // SAFETY: msg is a valid pointer
    let result = unsafe { GetMessageW(msg, None, 0, 0) };
    unwrap_winapi_bool(result)
}

#[inline]
fn dispatch_message(msg: &MSG) -> LRESULT {
    // SAFETY: msg is a valid pointer
    unsafe { DispatchMessageW(msg) }
}

/// Pumps messages of the current thread until `WM_QUIT` is received.
pub fn windows_message_loop() -> windows::core::Result<()> {
    let mut msg = MSG::default();
    while get_message(&mut msg)? {
        // SAFETY: msg is a valid pointer
        _ = unsafe { TranslateMessage(&msg) };
        dispatch_message(&msg);
    }
    Ok(())
}

pub fn show_error_message_box(text: &str) {
    let mut text: Vec<u16> = text.encode_utf16().collect();
    text.push(0); // null-terminate
    let mut caption: Vec<u16> = "ScreenSaver Tray".encode_utf16().collect();
    caption.push(0);
    // SAFETY: Both strings are null-terminated and outlive the call
    unsafe {
        MessageBoxW(
            None,
            PCWSTR(text.as_ptr()),
            PCWSTR(caption.as_ptr()),
            MB_OK | MB_ICONERROR,
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use windows::core::w;
    use windows::Win32::UI::WindowsAndMessaging::{
        CreateWindowExW, DestroyWindow, WINDOW_EX_STYLE, WINDOW_STYLE,
    };

    #[test]
    fn window_user_data() {
        // Arrange: any window of this thread will do
        // SAFETY: Creating an invisible window of a system class
        let window = unsafe {
            CreateWindowExW(
                WINDOW_EX_STYLE::default(),
                w!("STATIC"),
                w!(""),
                WINDOW_STYLE::default(),
                0,
                0,
                0,
                0,
                None,
                None,
                None,
                None,
            )
        }
        .expect("Failed to create window");
        let value = Box::into_raw(Box::new(17u32)) as isize;

        // Act
        // SAFETY: The window was created on this thread
        let previous = unsafe { set_window_user_data(window, value) };
        // SAFETY: The window was created on this thread
        let current = unsafe { get_window_user_data(window) };

        // Assert
        assert_eq!(previous, 0);
        assert_eq!(current, value);
        // SAFETY: The value came from `Box::into_raw` above
        assert_eq!(*unsafe { Box::from_raw(current as *mut u32) }, 17);
        // SAFETY: The window is owned by this test
        unsafe { DestroyWindow(window) }.expect("Failed to destroy window");
    }
}
