use super::commands::Command;
use super::model::Model;
use crate::host::Host;
use crate::poll::{PollLoop, PollState, TickOutcome};

/// Controller owns the model and processes events coming from the window.
pub struct Controller<H: Host> {
    host: H,
    poll: PollLoop,
    model: Model,
}

impl<H: Host> Controller<H> {
    pub fn new(host: H) -> Self {
        Controller {
            host,
            poll: PollLoop::new(),
            model: Model::new(),
        }
    }

    pub fn on_timer(&mut self) -> TickOutcome {
        self.poll
            .tick(&self.host, self.model.threshold.current_limit_ms())
    }

    pub fn on_command(&mut self, command: Command) {
        match command {
            Command::SetThreshold(preset) => {
                info!(
                    "Idle limit set to {} ({} ms)",
                    preset.title(),
                    preset.idle_limit_ms()
                );
                self.model
                    .threshold
                    .set_limit(preset.idle_limit_ms(), preset);
            }
            Command::Exit => {
                info!("Exit requested");
                self.poll.stop();
                self.model.tray_icon_visible = false;
                self.model.exit_requested = true;
            }
        }
    }

    pub fn is_watching(&self) -> bool {
        self.poll.state() == PollState::Watching
    }

    pub fn get_model(&self) -> &Model {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poll::tests::FakeHost;
    use crate::poll::POLL_INTERVAL_MS;
    use crate::threshold::Preset;

    #[test]
    fn launch_state() {
        let controller = Controller::new(FakeHost::default());

        let model = controller.get_model();
        assert_eq!(model.threshold.current_limit_ms(), 60_000);
        assert!(model.threshold.is_checked(Preset::OneMinute));
        assert!(model.tray_icon_visible);
        assert!(!model.exit_requested);
        assert!(controller.is_watching());
    }

    #[test]
    fn selection_changes_next_tick() {
        // Arrange
        let mut controller = Controller::new(FakeHost::idle_for(45_000));
        assert_eq!(
            controller.on_timer(),
            TickOutcome::Active { idle_ms: 45_000 }
        );

        // Act
        controller.on_command(Command::SetThreshold(Preset::ThirtySeconds));
        let outcome = controller.on_timer();

        // Assert
        assert_eq!(outcome, TickOutcome::Triggered { idle_ms: 45_000 });
        assert_eq!(controller.host.triggers.get(), 1);
        let threshold = &controller.get_model().threshold;
        assert!(threshold.is_checked(Preset::ThirtySeconds));
        assert!(!threshold.is_checked(Preset::OneMinute));
        assert!(!threshold.is_checked(Preset::FiveMinutes));
    }

    #[test]
    fn raising_limit_stops_triggers() {
        let mut controller = Controller::new(FakeHost::idle_for(90_000));
        controller.on_timer();
        assert_eq!(controller.host.triggers.get(), 1);

        controller.on_command(Command::SetThreshold(Preset::FiveMinutes));
        controller.host.idle_ms.set(90_000 + POLL_INTERVAL_MS);
        controller.on_timer();

        assert_eq!(controller.host.triggers.get(), 1);
    }

    #[test]
    fn exit_stops_polling_and_hides_icon() {
        // Arrange
        let mut controller = Controller::new(FakeHost::idle_for(u32::MAX));

        // Act
        controller.on_command(Command::Exit);
        let outcome = controller.on_timer();

        // Assert
        assert_eq!(outcome, TickOutcome::Stopped);
        assert!(!controller.is_watching());
        assert_eq!(controller.host.queries.get(), 0);
        assert_eq!(controller.host.triggers.get(), 0);
        let model = controller.get_model();
        assert!(!model.tray_icon_visible);
        assert!(model.exit_requested);
    }
}
