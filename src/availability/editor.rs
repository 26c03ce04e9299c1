use crate::availability::grid::{AvailabilityGrid, DecodeError, GridError};
use crate::store::{AvailabilityStore, StoreError, UserId};

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum DirtyState {
    #[default]
    Clean,
    Dirty,
}

#[derive(Debug)]
pub enum LoadOutcome {
    Loaded,
    /// Nothing stored for the user yet.
    Defaulted,
    /// Stored payload was unreadable and has been replaced by an empty grid in memory.
    Recovered(DecodeError),
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SaveOutcome {
    Saved,
    Skipped,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum EditorEvent {
    Loaded,
    Toggled { day: usize, hour: usize, value: bool },
    Saved,
    DirtyChanged(DirtyState),
}

type Listener = Box<dyn FnMut(&EditorEvent)>;

/// Owns the grid for one editing session and tracks whether it matches the store.
#[derive(Default)]
pub struct AvailabilityEditor {
    grid: AvailabilityGrid,
    dirty: DirtyState,
    listeners: Vec<Listener>,
}

impl AvailabilityEditor {
    pub fn grid(&self) -> &AvailabilityGrid {
        &self.grid
    }

    pub fn dirty(&self) -> DirtyState {
        self.dirty
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty == DirtyState::Dirty
    }

    pub fn get(&self, day: usize, hour: usize) -> Result<bool, GridError> {
        self.grid.get(day, hour)
    }

    pub fn available_count(&self) -> usize {
        self.grid.available_count()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&EditorEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Replaces the grid with the stored copy for `user`, or an empty grid.
    ///
    /// A malformed payload is not an error here: it is logged and treated as absent.
    pub fn load(
        &mut self,
        store: &AvailabilityStore,
        user: &UserId,
    ) -> Result<LoadOutcome, StoreError> {
        let (grid, outcome) = match store.read(user)? {
            None => (AvailabilityGrid::default(), LoadOutcome::Defaulted),
            Some(payload) => match AvailabilityGrid::decode(&payload) {
                Ok(grid) => (grid, LoadOutcome::Loaded),
                Err(err) => {
                    tracing::warn!(
                        user = %user,
                        key = %AvailabilityStore::key_for(user),
                        error = %err,
                        "stored availability is malformed, starting from an empty grid"
                    );
                    (AvailabilityGrid::default(), LoadOutcome::Recovered(err))
                }
            },
        };

        self.grid = grid;
        self.emit(EditorEvent::Loaded);
        self.set_dirty(DirtyState::Clean);
        tracing::debug!(user = %user, slots = self.grid.available_count(), "availability loaded");
        Ok(outcome)
    }

    pub fn toggle(&mut self, day: usize, hour: usize) -> Result<bool, GridError> {
        let value = self.grid.toggle(day, hour)?;
        self.emit(EditorEvent::Toggled { day, hour, value });
        self.set_dirty(DirtyState::Dirty);
        Ok(value)
    }

    /// Writes the grid for `user`. Without a user this is a silent no-op that
    /// leaves the dirty flag as it was.
    pub fn save(
        &mut self,
        store: &mut AvailabilityStore,
        user: Option<&UserId>,
    ) -> Result<SaveOutcome, StoreError> {
        let Some(user) = user else {
            tracing::debug!("save skipped: no user id");
            return Ok(SaveOutcome::Skipped);
        };

        store.write(user, self.grid.encode().as_bytes())?;
        self.emit(EditorEvent::Saved);
        self.set_dirty(DirtyState::Clean);
        tracing::info!(user = %user, slots = self.grid.available_count(), "availability saved");
        Ok(SaveOutcome::Saved)
    }

    fn set_dirty(&mut self, state: DirtyState) {
        if self.dirty != state {
            self.dirty = state;
            self.emit(EditorEvent::DirtyChanged(state));
        }
    }

    fn emit(&mut self, event: EditorEvent) {
        for listener in &mut self.listeners {
            listener(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use super::*;
    use crate::store::KeyValueStore;

    fn user(id: &str) -> UserId {
        UserId::parse(Some(id)).expect("present")
    }

    #[test]
    fn load_without_stored_entry_yields_clean_empty_grid() {
        let store = AvailabilityStore::in_memory();
        let mut editor = AvailabilityEditor::default();

        let outcome = editor.load(&store, &user("u1")).expect("load");
        assert!(matches!(outcome, LoadOutcome::Defaulted));
        assert_eq!(*editor.grid(), AvailabilityGrid::default());
        assert_eq!(editor.dirty(), DirtyState::Clean);
    }

    #[test]
    fn toggle_save_reload_scenario() {
        let mut store = AvailabilityStore::in_memory();
        let u1 = user("u1");
        let mut editor = AvailabilityEditor::default();
        editor.load(&store, &u1).expect("load");

        assert!(editor.toggle(0, 9).expect("in range"));
        assert!(editor.is_dirty());

        let outcome = editor.save(&mut store, Some(&u1)).expect("save");
        assert_eq!(outcome, SaveOutcome::Saved);
        assert_eq!(editor.dirty(), DirtyState::Clean);

        let stored = store.read(&u1).expect("read").expect("entry written");
        let rows: Vec<Vec<u8>> = serde_json::from_slice(&stored).expect("nested array");
        assert_eq!(rows.len(), 7);
        for (day, hours) in rows.iter().enumerate() {
            assert_eq!(hours.len(), 24);
            for (hour, slot) in hours.iter().enumerate() {
                assert_eq!(*slot, u8::from(day == 0 && hour == 9));
            }
        }

        let before = *editor.grid();
        let mut reloaded = AvailabilityEditor::default();
        assert!(matches!(
            reloaded.load(&store, &u1).expect("reload"),
            LoadOutcome::Loaded
        ));
        assert_eq!(*reloaded.grid(), before);
        assert_eq!(reloaded.dirty(), DirtyState::Clean);
    }

    #[test]
    fn any_toggle_sequence_makes_dirty_and_load_cleans() {
        let store = AvailabilityStore::in_memory();
        let u1 = user("u1");
        let mut editor = AvailabilityEditor::default();
        editor.load(&store, &u1).expect("load");

        editor.toggle(2, 5).expect("in range");
        editor.toggle(2, 5).expect("in range");
        // back to the stored content, still dirty
        assert_eq!(*editor.grid(), AvailabilityGrid::default());
        assert!(editor.is_dirty());

        editor.load(&store, &u1).expect("reload");
        assert!(!editor.is_dirty());
    }

    #[test]
    fn save_without_user_changes_nothing() {
        let mut store = AvailabilityStore::in_memory();
        let u1 = user("u1");
        let mut editor = AvailabilityEditor::default();
        editor.toggle(6, 23).expect("in range");

        let outcome = editor.save(&mut store, None).expect("no-op save");
        assert_eq!(outcome, SaveOutcome::Skipped);
        assert!(editor.is_dirty());
        assert_eq!(store.read(&u1).expect("read"), None);
    }

    #[test]
    fn out_of_range_toggle_keeps_state() {
        let mut editor = AvailabilityEditor::default();
        assert!(editor.toggle(7, 0).is_err());
        assert!(editor.toggle(0, 24).is_err());
        assert_eq!(editor.dirty(), DirtyState::Clean);
        assert_eq!(editor.available_count(), 0);
    }

    #[test]
    fn malformed_payload_falls_back_to_empty_grid() {
        let mut store = AvailabilityStore::in_memory();
        let u1 = user("u1");
        store.write(&u1, b"[[1,1,1]]").expect("seed");

        let mut editor = AvailabilityEditor::default();
        editor.toggle(1, 1).expect("in range");
        let outcome = editor.load(&store, &u1).expect("load");
        assert!(matches!(
            outcome,
            LoadOutcome::Recovered(DecodeError::DayCount(1))
        ));
        assert_eq!(*editor.grid(), AvailabilityGrid::default());
        assert_eq!(editor.dirty(), DirtyState::Clean);
        // the broken entry stays until the user saves over it
        assert_eq!(store.read(&u1).expect("read"), Some(b"[[1,1,1]]".to_vec()));
    }

    struct RejectingStore {
        attempts: Rc<Cell<usize>>,
    }

    impl KeyValueStore for RejectingStore {
        fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, StoreError> {
            Ok(None)
        }

        fn set(&mut self, _key: &str, _value: &[u8]) -> Result<(), StoreError> {
            self.attempts.set(self.attempts.get() + 1);
            Err(StoreError::Io {
                path: "availability-store.json".into(),
                source: std::io::Error::other("disk full"),
            })
        }
    }

    #[test]
    fn failed_save_stays_dirty_and_reports_the_error() {
        let attempts = Rc::new(Cell::new(0));
        let mut store = AvailabilityStore::new(Box::new(RejectingStore {
            attempts: Rc::clone(&attempts),
        }));
        let u1 = user("u1");
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);

        let mut editor = AvailabilityEditor::default();
        editor.load(&store, &u1).expect("load");
        editor.subscribe(move |event| sink.borrow_mut().push(*event));
        editor.toggle(3, 12).expect("in range");

        let err = editor.save(&mut store, Some(&u1)).expect_err("store rejects writes");
        assert!(matches!(err, StoreError::Io { .. }));
        assert!(err.to_string().contains("disk full"));
        assert_eq!(attempts.get(), 1);
        assert!(editor.is_dirty());
        assert!(editor.get(3, 12).expect("in range"));
        assert_eq!(
            *events.borrow(),
            vec![
                EditorEvent::Toggled {
                    day: 3,
                    hour: 12,
                    value: true
                },
                EditorEvent::DirtyChanged(DirtyState::Dirty),
            ]
        );
    }

    #[test]
    fn listeners_see_dirty_transitions_once() {
        let mut store = AvailabilityStore::in_memory();
        let u1 = user("u1");
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);

        let mut editor = AvailabilityEditor::default();
        editor.subscribe(move |event| sink.borrow_mut().push(*event));
        editor.load(&store, &u1).expect("load");
        editor.toggle(0, 1).expect("in range");
        editor.toggle(0, 2).expect("in range");
        editor.save(&mut store, Some(&u1)).expect("save");

        assert_eq!(
            *events.borrow(),
            vec![
                EditorEvent::Loaded,
                EditorEvent::Toggled {
                    day: 0,
                    hour: 1,
                    value: true
                },
                EditorEvent::DirtyChanged(DirtyState::Dirty),
                EditorEvent::Toggled {
                    day: 0,
                    hour: 2,
                    value: true
                },
                EditorEvent::Saved,
                EditorEvent::DirtyChanged(DirtyState::Clean),
            ]
        );
    }
}
