use crate::threshold::Preset;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Command {
    SetThreshold(Preset),
    Exit,
}
