/// Idle limits selectable from the tray menu.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Preset {
    ThirtySeconds,
    #[default]
    OneMinute,
    FiveMinutes,
}

impl Preset {
    /// All presets in menu order.
    pub const ALL: [Preset; 3] = [Preset::ThirtySeconds, Preset::OneMinute, Preset::FiveMinutes];

    pub const fn idle_limit_ms(self) -> u32 {
        match self {
            Preset::ThirtySeconds => 30 * 1000,
            Preset::OneMinute => 60 * 1000,
            Preset::FiveMinutes => 5 * 60 * 1000,
        }
    }

    pub const fn title(self) -> &'static str {
        match self {
            Preset::ThirtySeconds => "30 seconds",
            Preset::OneMinute => "1 minute",
            Preset::FiveMinutes => "5 minutes",
        }
    }
}

/// Holds the active idle limit and which preset the menu shows as checked.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ThresholdPolicy {
    idle_limit_ms: u32,
    selected: Preset,
}

impl ThresholdPolicy {
    pub fn new() -> Self {
        let selected = Preset::default();
        ThresholdPolicy {
            idle_limit_ms: selected.idle_limit_ms(),
            selected,
        }
    }

    /// Replaces the idle limit and makes `preset` the only checked entry.
    pub fn set_limit(&mut self, ms: u32, preset: Preset) {
        self.idle_limit_ms = ms;
        self.selected = preset;
    }

    pub fn select(&mut self, preset: Preset) {
        self.set_limit(preset.idle_limit_ms(), preset);
    }

    pub fn current_limit_ms(&self) -> u32 {
        self.idle_limit_ms
    }

    pub fn selected_preset(&self) -> Preset {
        self.selected
    }

    pub fn is_checked(&self, preset: Preset) -> bool {
        self.selected == preset
    }
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self::new()
    }
}
