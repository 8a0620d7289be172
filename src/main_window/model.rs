use crate::threshold::ThresholdPolicy;

/// Model defines the current state of the application.
#[derive(Clone, Debug, PartialEq)]
pub struct Model {
    pub threshold: ThresholdPolicy,
    pub tray_icon_visible: bool,
    pub exit_requested: bool,
}

impl Model {
    pub fn new() -> Self {
        Model {
            threshold: ThresholdPolicy::new(),
            tray_icon_visible: true,
            exit_requested: false,
        }
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}
