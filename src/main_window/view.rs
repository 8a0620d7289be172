use super::commands::Command;
use super::id;
use super::model::Model;
use crate::icons::NotifyIcon;
use crate::menu::PopupMenu;
use crate::threshold::Preset;
use std::rc::Rc;
use windows::core::Result;
use windows::Win32::Foundation::HWND;

const IDM_START: u32 = 1;
const TOOLTIP: &str = "ScreenSaver Tray";

/// View owns the UI components and renders model in the window.
pub struct View {
    window: HWND,
    model: Option<Model>,
    tray_icon: Option<NotifyIcon>,
    popup_menu: Option<Rc<PopupMenu>>,
    menu_commands: Vec<Command>,
}

impl View {
    /// # Safety
    ///
    /// The window handle should stay valid for the entire lifetime of the returned instance.
    pub unsafe fn new(window: HWND) -> Self {
        View {
            window,
            model: None,
            tray_icon: None,
            popup_menu: None,
            menu_commands: vec![],
        }
    }

    /// Updates UI according to the provided model.
    pub fn update(&mut self, new_model: &Model) -> Result<()> {
        if self.model.as_ref() == Some(new_model) {
            return Ok(());
        }
        if new_model.tray_icon_visible {
            if self.tray_icon.is_none() {
                // SAFETY: Window handle's validity is guaranteed by the owner
                let icon =
                    unsafe { NotifyIcon::new(self.window, id::NotifyIcon::Main as _, TOOLTIP) }?;
                self.tray_icon = Some(icon);
            }
            if self.popup_menu.is_none() {
                self.build_menu(new_model)?;
            } else {
                self.update_selection(new_model);
            }
        } else {
            self.popup_menu = None;
            self.tray_icon = None;
        }
        self.model = Some(new_model.clone());
        Ok(())
    }

    /// Forgets the tray icon and menu, so the next `update` adds them again.
    ///
    /// Used after the shell restarts, when the old icon is already gone.
    pub fn reset_tray_icon(&mut self) {
        self.popup_menu = None;
        self.tray_icon = None;
        self.model = None;
    }

    /// Returns the context menu if the tray icon is shown.
    pub fn get_popup_menu(&self) -> Option<Rc<PopupMenu>> {
        self.popup_menu.clone()
    }

    pub fn get_command_for_menu_item(&self, id: u32) -> Option<Command> {
        id.checked_sub(IDM_START)
            .and_then(|i| self.menu_commands.get(i as usize))
            .copied()
    }

    fn add_command(&mut self, command: Command) -> u32 {
        let id = IDM_START + self.menu_commands.len() as u32;
        self.menu_commands.push(command);
        id
    }

    fn build_menu(&mut self, model: &Model) -> Result<()> {
        self.menu_commands.clear();
        let mut menu = PopupMenu::new()?;
        for preset in Preset::ALL {
            let id = self.add_command(Command::SetThreshold(preset));
            menu.append_menu_item(preset.title(), id, model.threshold.is_checked(preset))?;
        }
        menu.append_separator()?;
        let id = self.add_command(Command::Exit);
        menu.append_menu_item("E&xit", id, false)?;
        self.popup_menu = Some(Rc::new(menu));
        Ok(())
    }

    fn update_selection(&self, model: &Model) {
        let Some(menu) = &self.popup_menu else {
            return;
        };
        for (i, command) in self.menu_commands.iter().enumerate() {
            let Command::SetThreshold(preset) = command else {
                continue;
            };
            let id = i as u32 + IDM_START;
            if menu
                .check_menu_item(id, model.threshold.is_checked(*preset))
                .is_none()
            {
                warn!("Menu item {} is missing", id);
            }
        }
    }
}
