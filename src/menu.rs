use windows::core::{Owned, Result, PCWSTR};
use windows::Win32::Foundation::{HWND, LPARAM, WPARAM};
use windows::Win32::UI::WindowsAndMessaging::{
    AppendMenuW, CheckMenuItem, CreatePopupMenu, PostMessageW, SetForegroundWindow,
    TrackPopupMenu, HMENU, MF_BYCOMMAND, MF_CHECKED, MF_ENABLED, MF_SEPARATOR, MF_STRING,
    MF_UNCHECKED, TPM_NONOTIFY, TPM_RETURNCMD, TPM_RIGHTBUTTON, WM_NULL,
};

pub struct PopupMenu {
    handle: Owned<HMENU>,
}

impl PopupMenu {
    /// Constructs a new empty popup menu.
    pub fn new() -> Result<Self> {
        // SAFETY: The call is always sound, the returned handle is owned by `PopupMenu`
        let handle = unsafe { Owned::new(CreatePopupMenu()?) };
        Ok(PopupMenu { handle })
    }

    pub fn append_separator(&mut self) -> Result<()> {
        // SAFETY: Menu handle is owned by `self` and stays valid until drop
        unsafe { AppendMenuW(*self.handle, MF_SEPARATOR, 0, PCWSTR::null()) }
    }

    /// Appends a menu item. `&` in the title marks the access key.
    pub fn append_menu_item(&mut self, title: &str, id: u32, checked: bool) -> Result<()> {
        let mut buf: Vec<u16> = title.encode_utf16().collect();
        buf.push(0); // null-terminate
        let flags = MF_ENABLED | MF_STRING | if checked { MF_CHECKED } else { MF_UNCHECKED };
        // SAFETY: Menu handle is owned by `self`, `buf` outlives the call
        unsafe { AppendMenuW(*self.handle, flags, id as usize, PCWSTR(buf.as_ptr())) }
    }

    /// Sets the check mark of a menu item and returns its previous state,
    /// or `None` if there is no such item.
    pub fn check_menu_item(&self, id: u32, checked: bool) -> Option<bool> {
        let flags = MF_BYCOMMAND | if checked { MF_CHECKED } else { MF_UNCHECKED };
        // SAFETY: Menu handle is owned by `self` and stays valid until drop
        let result = unsafe { CheckMenuItem(*self.handle, id, flags.0) };
        match result {
            u32::MAX => None,
            r => Some(r & MF_CHECKED.0 != 0),
        }
    }

    /// Returns whether a menu item is checked, or `None` if there is no such item.
    #[cfg(test)]
    pub fn is_checked(&self, id: u32) -> Option<bool> {
        use windows::Win32::UI::WindowsAndMessaging::GetMenuState;
        // SAFETY: Menu handle is owned by `self` and stays valid until drop
        let state = unsafe { GetMenuState(*self.handle, id, MF_BYCOMMAND) };
        match state {
            u32::MAX => None,
            s => Some(s & MF_CHECKED.0 != 0),
        }
    }

    /// Shows the menu at the given screen coordinates and returns the selected item id.
    ///
    /// # Notes
    ///
    /// The call runs a nested message loop until the menu is dismissed,
    /// so the window procedure is re-entered for messages like `WM_TIMER`.
    ///
    /// # Safety
    ///
    /// The caller must guarantee that the handle will stay valid for the duration of the call.
    pub unsafe fn show(&self, x: i32, y: i32, window: HWND) -> Option<u32> {
        // Without this the menu stays open after it loses focus.
        // SAFETY: The call is sound with a valid handle (guaranteed by the caller).
        // The call is expected to fail in some cases, the menu is still usable then.
        _ = unsafe { SetForegroundWindow(window) };
        let flags = TPM_RIGHTBUTTON | TPM_RETURNCMD | TPM_NONOTIFY;
        // SAFETY: The call is sound with valid handles.
        let selected = unsafe { TrackPopupMenu(*self.handle, flags, x, y, 0, window, None) }.0;
        // Forces a task switch so the next right click opens the menu again.
        // SAFETY: The handle is valid, WM_NULL carries no data
        _ = unsafe { PostMessageW(window, WM_NULL, WPARAM(0), LPARAM(0)) };
        u32::try_from(selected).ok().filter(|id| *id != 0)
    }
}
