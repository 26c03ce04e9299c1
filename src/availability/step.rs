use chrono::NaiveDate;

use crate::availability::editor::{AvailabilityEditor, EditorEvent, LoadOutcome, SaveOutcome};
use crate::availability::grid::GridError;
use crate::availability::week::{AnchorPolicy, DAYS_PER_WEEK, day_labels, next_monday};
use crate::availability::window::{TimeWindow, WindowError};
use crate::store::{AvailabilityStore, StoreError, UserId};

/// Callbacks into the wizard that hosts the availability step.
pub trait WizardNavigator {
    fn advance(&mut self);
    fn retreat(&mut self);
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Navigation {
    Advance,
    Retreat,
}

/// Navigator for hosts that only need to know where the user went last.
#[derive(Debug, Default)]
pub struct RecordedNavigation {
    pub last: Option<Navigation>,
}

impl WizardNavigator for RecordedNavigation {
    fn advance(&mut self) {
        self.last = Some(Navigation::Advance);
    }

    fn retreat(&mut self) {
        self.last = Some(Navigation::Retreat);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StepSettings {
    pub window: TimeWindow,
    pub anchor_policy: AnchorPolicy,
}

pub enum Mounted {
    Ready(Box<AvailabilityStep>),
    Retreated,
}

pub struct AvailabilityStep {
    user: UserId,
    store: AvailabilityStore,
    editor: AvailabilityEditor,
    window: TimeWindow,
    anchor: NaiveDate,
    day_labels: [String; DAYS_PER_WEEK],
}

impl AvailabilityStep {
    /// Enters the step. Without a user id the host is sent back one step and
    /// nothing is loaded.
    pub fn mount(
        user: Option<UserId>,
        store: AvailabilityStore,
        today: NaiveDate,
        settings: StepSettings,
        navigator: &mut dyn WizardNavigator,
    ) -> anyhow::Result<(Mounted, Option<LoadOutcome>)> {
        let Some(user) = user else {
            tracing::info!("availability step entered without a user id, retreating");
            navigator.retreat();
            return Ok((Mounted::Retreated, None));
        };

        let anchor = next_monday(today, settings.anchor_policy)
            .ok_or_else(|| anyhow::anyhow!("no Monday on or after {today}"))?;
        let day_labels = day_labels(anchor)
            .ok_or_else(|| anyhow::anyhow!("week of {anchor} runs past the end of the calendar"))?;
        let mut editor = AvailabilityEditor::default();
        let outcome = editor.load(&store, &user)?;

        let step = Self {
            user,
            store,
            editor,
            window: settings.window,
            anchor,
            day_labels,
        };
        Ok((Mounted::Ready(Box::new(step)), Some(outcome)))
    }

    pub fn user(&self) -> &UserId {
        &self.user
    }

    pub fn editor(&self) -> &AvailabilityEditor {
        &self.editor
    }

    pub fn window(&self) -> TimeWindow {
        self.window
    }

    pub fn anchor(&self) -> NaiveDate {
        self.anchor
    }

    pub fn day_labels(&self) -> &[String] {
        &self.day_labels
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&EditorEvent) + 'static) {
        self.editor.subscribe(listener);
    }

    pub fn toggle(&mut self, day: usize, hour: usize) -> Result<bool, GridError> {
        self.editor.toggle(day, hour)
    }

    pub fn set_start(&mut self, hour: u8) -> Result<(), WindowError> {
        self.window.set_start(hour)
    }

    pub fn set_end(&mut self, hour: u8) -> Result<(), WindowError> {
        self.window.set_end(hour)
    }

    pub fn save(&mut self) -> Result<SaveOutcome, StoreError> {
        self.editor.save(&mut self.store, Some(&self.user))
    }

    /// Discards unsaved toggles in favour of the stored copy.
    pub fn reload(&mut self) -> Result<LoadOutcome, StoreError> {
        self.editor.load(&self.store, &self.user)
    }

    pub fn previous(&self, navigator: &mut dyn WizardNavigator) {
        self.log_leaving("previous");
        navigator.retreat();
    }

    pub fn next(&self, navigator: &mut dyn WizardNavigator) {
        self.log_leaving("next");
        navigator.advance();
    }

    fn log_leaving(&self, direction: &str) {
        if self.editor.is_dirty() {
            tracing::info!(user = %self.user, direction, "leaving step with unsaved changes");
        }
    }
}
