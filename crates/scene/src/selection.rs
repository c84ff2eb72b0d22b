use std::sync::Arc;

use parking_lot::Mutex;

/// Receives point-of-interest selection changes, keyed by entity id.
///
/// At most one entity is selected at a time; re-picking the selected entity
/// produces no events.
pub trait SelectionListener {
    fn on_poi_selected(&mut self, sid: &str);
    fn on_poi_deselected(&mut self, sid: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionEvent {
    Selected(String),
    Deselected(String),
}

/// Listener that records every event. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct SelectionLog {
    events: Arc<Mutex<Vec<SelectionEvent>>>,
}

impl SelectionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SelectionEvent> {
        self.events.lock().clone()
    }

    pub fn take(&self) -> Vec<SelectionEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl SelectionListener for SelectionLog {
    fn on_poi_selected(&mut self, sid: &str) {
        self.events.lock().push(SelectionEvent::Selected(sid.to_string()));
    }

    fn on_poi_deselected(&mut self, sid: &str) {
        self.events
            .lock()
            .push(SelectionEvent::Deselected(sid.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::{SelectionEvent, SelectionListener, SelectionLog};
    use pretty_assertions::assert_eq;

    #[test]
    fn clones_share_the_log() {
        let log = SelectionLog::new();
        let mut listener = log.clone();
        listener.on_poi_selected("poi/a");
        listener.on_poi_deselected("poi/a");

        assert_eq!(
            log.take(),
            vec![
                SelectionEvent::Selected("poi/a".into()),
                SelectionEvent::Deselected("poi/a".into()),
            ]
        );
        assert!(log.events().is_empty());
    }
}
