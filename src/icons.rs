use std::cmp::min;
use windows::core::{Error, Result};
use windows::Win32::Foundation::{ERROR_INVALID_PARAMETER, HWND};
use windows::Win32::UI::Shell::{
    Shell_NotifyIconW, NIF_ICON, NIF_MESSAGE, NIF_TIP, NIM_ADD, NIM_DELETE, NIM_SETVERSION,
    NOTIFYICONDATAW, NOTIFYICONDATAW_0, NOTIFYICON_VERSION_4,
};
use windows::Win32::UI::WindowsAndMessaging::{LoadIconW, IDI_INFORMATION, WM_APP};

pub const WM_NOTIFY_ICON: u32 = WM_APP + 1;

/// A notification area icon showing the stock "information" glyph.
/// The icon is removed from the shell on drop.
pub struct NotifyIcon {
    window: HWND,
    id: u32,
}

impl NotifyIcon {
    /// # Safety
    ///
    /// Caller must guarantee that the provided window will stay valid
    /// for the entire lifetime of the returned instance.
    pub unsafe fn new(window: HWND, id: u32, tip: &str) -> Result<NotifyIcon> {
        // SAFETY: Loading a stock icon, the shared handle must not be destroyed
        let icon = unsafe { LoadIconW(None, IDI_INFORMATION) }?;
        let mut notify_icon_data = NOTIFYICONDATAW {
            cbSize: size_of::<NOTIFYICONDATAW>() as u32,
            hWnd: window,
            uID: id,
            uFlags: NIF_MESSAGE | NIF_ICON | NIF_TIP,
            uCallbackMessage: WM_NOTIFY_ICON,
            Anonymous: NOTIFYICONDATAW_0 {
                uVersion: NOTIFYICON_VERSION_4,
            },
            hIcon: icon,
            ..Default::default()
        };
        let tip: Vec<u16> = tip.encode_utf16().collect();
        // ensure at least one character remains NULL
        let len = min(notify_icon_data.szTip.len() - 1, tip.len());
        notify_icon_data.szTip[..len].copy_from_slice(&tip[..len]);
        // SAFETY: Notify icon data is a local structure
        if unsafe { Shell_NotifyIconW(NIM_ADD, &notify_icon_data) }.0 == 0 {
            return Err(Error::from(ERROR_INVALID_PARAMETER));
        }
        let notify_icon = NotifyIcon { window, id };
        // SAFETY: Notify icon data is a local structure
        if unsafe { Shell_NotifyIconW(NIM_SETVERSION, &notify_icon_data) }.0 == 0 {
            // dropping `notify_icon` removes the half-initialized icon
            return Err(Error::from(ERROR_INVALID_PARAMETER));
        }
        debug!("Notify icon {} added", id);
        Ok(notify_icon)
    }
}

impl Drop for NotifyIcon {
    fn drop(&mut self) {
        let notify_icon_data = NOTIFYICONDATAW {
            cbSize: size_of::<NOTIFYICONDATAW>() as u32,
            hWnd: self.window,
            uID: self.id,
            ..Default::default()
        };
        // SAFETY: Notify icon data is a local structure
        if unsafe { Shell_NotifyIconW(NIM_DELETE, &notify_icon_data) }.0 == 0 {
            warn!("Failed to remove notify icon {}", self.id);
        } else {
            debug!("Notify icon {} removed", self.id);
        }
    }
}
