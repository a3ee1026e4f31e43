use std::fmt::{Debug, Formatter};

/// A committed change to the machine state.
///
/// The interpreter emits exactly one event per mutation, after the mutation
/// has been applied, in mutation order. The animation layer subscribes to
/// these instead of reaching into the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    RegisterChanged {
        index: usize,
        old: i64,
        new: i64,
    },
    PcChanged {
        old: usize,
        new: usize,
    },
    MemoryChanged {
        word_index: usize,
        old: Option<String>,
        new: String,
    },
    StorageChanged {
        word_index: usize,
        old: Option<String>,
        new: String,
    },
    Halted,
    Errored {
        message: String,
    },
}

/// Fan-out channel from the machine to its subscribers.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<Box<dyn FnMut(&Event)>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&Event) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn emit(&mut self, event: Event) {
        for listener in &mut self.listeners {
            listener(&event);
        }
    }
}

impl Debug for EventBus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // The listeners are opaque closures; the count is all we can show
        write!(f, "EventBus({} listeners)", self.listeners.len())
    }
}
