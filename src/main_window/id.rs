#[repr(usize)]
pub enum Timer {
    Poll = 1,
}

#[repr(u32)]
pub enum NotifyIcon {
    Main = 1,
}
