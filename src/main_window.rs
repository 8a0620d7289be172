mod commands;
mod controller;
mod id;
mod model;
#[cfg(windows)]
mod view;

#[cfg(windows)]
pub use window::MainWindow;

#[cfg(windows)]
mod window {
    use super::controller::Controller;
    use super::id;
    use super::view::View;
    use crate::icons::WM_NOTIFY_ICON;
    use crate::poll::POLL_INTERVAL_MS;
    use crate::winapi::{
        get_instance_handle, get_window_user_data, set_window_user_data, SystemHost,
    };
    use std::cell::RefCell;
    use std::marker::PhantomData;
    use windows::core::{w, Error};
    use windows::Win32::Foundation::{HWND, LPARAM, LRESULT, WPARAM};
    use windows::Win32::UI::WindowsAndMessaging::{
        CreateWindowExW, DefWindowProcW, DestroyWindow, KillTimer, PostMessageW,
        PostQuitMessage, RegisterClassExW, RegisterWindowMessageW, SetTimer, WM_CLOSE,
        WM_CONTEXTMENU, WM_DESTROY, WM_TIMER, WNDCLASSEXW, WS_EX_TOOLWINDOW, WS_OVERLAPPED,
    };

    struct WindowState {
        controller: Controller<SystemHost>,
        view: View,
        /// Broadcast by the shell when the taskbar is (re)created, 0 if unavailable
        taskbar_created: u32,
    }

    /// Hidden window that owns the tray icon and receives timer and menu messages.
    pub struct MainWindow {
        handle: HWND,
        // This marks MainWindow as !Send and !Sync
        _marker: PhantomData<*const ()>,
    }

    impl MainWindow {
        pub fn new() -> Result<MainWindow, Error> {
            let window_class_name = w!("ScreenSaverTrayWindow");
            let instance = get_instance_handle()?;
            let wnd_class_params = WNDCLASSEXW {
                cbSize: size_of::<WNDCLASSEXW>() as u32,
                lpfnWndProc: Some(Self::process_message),
                hInstance: instance,
                lpszClassName: window_class_name,
                ..Default::default()
            };
            // SAFETY: The structure is fully initialized and the class name is a static string
            let window_class_atom = unsafe { RegisterClassExW(&wnd_class_params) };
            if window_class_atom == 0 {
                return Err(Error::from_win32());
            }
            // The window is never shown, it only exists to receive messages
            // SAFETY: The class was registered above
            let handle = unsafe {
                CreateWindowExW(
                    WS_EX_TOOLWINDOW,
                    window_class_name,
                    w!("ScreenSaver Tray"),
                    WS_OVERLAPPED,
                    0,
                    0,
                    0,
                    0,
                    None,
                    None,
                    instance,
                    None,
                )
            }?;
            // From here on dropping `window` tears everything down
            let window = MainWindow {
                handle,
                _marker: PhantomData,
            };

            let controller = Controller::new(SystemHost);
            // SAFETY: The view is dropped in WM_DESTROY, while the handle is still valid
            let mut view = unsafe { View::new(handle) };
            if let Err(err) = view.update(controller.get_model()) {
                // e.g. started at logon before the taskbar exists
                warn!("Tray icon unavailable until the taskbar starts: {}", err);
            }
            // SAFETY: The string is a static null-terminated literal
            let taskbar_created = unsafe { RegisterWindowMessageW(w!("TaskbarCreated")) };
            if taskbar_created == 0 {
                warn!("Failed to register TaskbarCreated: {}", Error::from_win32());
            }
            let state = Box::new(RefCell::new(WindowState {
                controller,
                view,
                taskbar_created,
            }));
            // SAFETY: The pointer is reclaimed exactly once, in WM_DESTROY
            unsafe { set_window_user_data(handle, Box::into_raw(state) as isize) };

            // SAFETY: The timer belongs to a valid window and is killed in WM_DESTROY
            if unsafe { SetTimer(handle, id::Timer::Poll as usize, POLL_INTERVAL_MS, None) } == 0 {
                return Err(Error::from_win32());
            }
            info!("Watching idle time every {} ms", POLL_INTERVAL_MS);
            Ok(window)
        }

        /// # Safety
        ///
        /// Must be called from the window procedure of `window`,
        /// the reference must not be used after `DestroyWindow`.
        unsafe fn get_state<'a>(window: HWND) -> Option<&'a RefCell<WindowState>> {
            // SAFETY: The value is either zero or the pointer set in `new`
            let ptr = unsafe { get_window_user_data(window) } as *const RefCell<_>;
            // SAFETY: The box stays alive until WM_DESTROY
            unsafe { ptr.as_ref() }
        }

        fn on_timer(state: &RefCell<WindowState>) {
            state.borrow_mut().controller.on_timer();
        }

        fn on_taskbar_created(state: &RefCell<WindowState>) {
            let mut state = state.borrow_mut();
            let state = &mut *state;
            info!("Taskbar created, adding the tray icon again");
            state.view.reset_tray_icon();
            if let Err(err) = state.view.update(state.controller.get_model()) {
                error!("Failed to add the tray icon: {}", err);
            }
        }

        fn on_context_menu(window: HWND, state: &RefCell<WindowState>, x: i32, y: i32) {
            let Some(menu) = state.borrow().view.get_popup_menu() else {
                return;
            };
            // No borrow is held here: the menu loop dispatches WM_TIMER back to us
            // SAFETY: We are in the window procedure of `window`, so it is alive
            let Some(item) = (unsafe { menu.show(x, y, window) }) else {
                return;
            };
            let exit_requested = {
                let mut state = state.borrow_mut();
                let state = &mut *state;
                let Some(command) = state.view.get_command_for_menu_item(item) else {
                    warn!("Unknown menu item {}", item);
                    return;
                };
                state.controller.on_command(command);
                let model = state.controller.get_model();
                if !model.exit_requested {
                    if let Err(err) = state.view.update(model) {
                        error!("Failed to update the tray icon: {}", err);
                    }
                }
                model.exit_requested
            };
            if exit_requested {
                // WM_DESTROY renders the final model after the timer is gone
                Self::close(window);
            }
        }

        /// Destroys the window from the message loop, or right away if posting fails.
        ///
        /// Must not be called while the window state is borrowed.
        fn close(window: HWND) {
            // SAFETY: The handle is valid, WM_CLOSE carries no data
            let Err(err) = (unsafe { PostMessageW(window, WM_CLOSE, WPARAM(0), LPARAM(0)) }) else {
                return;
            };
            warn!("Failed to post WM_CLOSE, destroying the window directly: {}", err);
            // SAFETY: No borrow of the window state is alive, WM_DESTROY reclaims it
            if let Err(err) = unsafe { DestroyWindow(window) } {
                error!("Failed to destroy the window: {}", err);
            }
        }

        fn on_destroy(window: HWND) {
            // SAFETY: The timer was created for this window
            if let Err(err) = unsafe { KillTimer(window, id::Timer::Poll as usize) } {
                warn!("Failed to kill the poll timer: {}", err);
            }
            // SAFETY: Resetting the pointer first guarantees the box is reclaimed only once
            let ptr = unsafe { set_window_user_data(window, 0) }
                as *mut RefCell<WindowState>;
            if !ptr.is_null() {
                // SAFETY: The pointer came from `Box::into_raw` in `new`
                let state: RefCell<WindowState> = *unsafe { Box::from_raw(ptr) };
                let WindowState {
                    controller,
                    mut view,
                    ..
                } = state.into_inner();
                if let Err(err) = view.update(controller.get_model()) {
                    warn!("Failed to render the final state: {}", err);
                }
                // dropping the view removes the tray icon
                drop(view);
            }
            info!("Main window destroyed");
            // SAFETY: This is a typical response to WM_DESTROY message
            unsafe { PostQuitMessage(0) }
        }

        extern "system" fn process_message(
            window: HWND,
            message: u32,
            w_param: WPARAM,
            l_param: LPARAM,
        ) -> LRESULT {
            if message == WM_DESTROY {
                Self::on_destroy(window);
                return LRESULT(0);
            }
            // SAFETY: We are in the window procedure, WM_DESTROY is handled above
            let Some(state) = (unsafe { Self::get_state(window) }) else {
                // SAFETY: Arguments come straight from the OS
                return unsafe { DefWindowProcW(window, message, w_param, l_param) };
            };
            let taskbar_created = state.borrow().taskbar_created;
            if taskbar_created != 0 && message == taskbar_created {
                Self::on_taskbar_created(state);
                return LRESULT(0);
            }
            match message {
                WM_TIMER if w_param.0 == id::Timer::Poll as usize => {
                    Self::on_timer(state);
                    LRESULT(0)
                }
                WM_NOTIFY_ICON => {
                    // NOTIFYICON_VERSION_4: the event is in LOWORD(lParam),
                    // anchor coordinates in wParam
                    let event = (l_param.0 & 0xFFFF) as u32;
                    if event == WM_CONTEXTMENU {
                        let x = (w_param.0 & 0xFFFF) as u16 as i16 as i32;
                        let y = ((w_param.0 >> 16) & 0xFFFF) as u16 as i16 as i32;
                        Self::on_context_menu(window, state, x, y);
                    }
                    LRESULT(0)
                }
                _ =>
                // SAFETY: We are in the context of message processor, validity of arguments is guaranteed by the caller (OS)
                unsafe { DefWindowProcW(window, message, w_param, l_param) },
            }
        }
    }

    impl Drop for MainWindow {
        fn drop(&mut self) {
            // Usually the window is already gone after the message loop exits
            // SAFETY: The call fails harmlessly on a destroyed handle
            unsafe {
                let _ = DestroyWindow(self.handle);
            }
        }
    }
}
