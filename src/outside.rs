//! Detection of pointer presses that land outside an open popup.
//!
//! A host owns one [`PointerListeners`] registry for the whole screen and
//! reports every pointer press to it.  Each open picker holds an
//! [`OutsideClick`] subscription taken from the registry.  A press outside a
//! subscription's areas runs its callback at once and removes it from the
//! registry; dropping the subscription removes it too, so a closed or
//! discarded picker never receives further notifications.
use ratatui::layout::{Position, Rect};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

#[derive(Debug, Default)]
struct Registry {
    next_id: u64,
    listeners: Vec<Listener>,
}

struct Listener {
    id: u64,
    inside: Vec<Rect>,
    on_outside: Box<dyn FnMut()>,
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("id", &self.id)
            .field("inside", &self.inside)
            .finish_non_exhaustive()
    }
}

/// Screen-wide registry of outside-press listeners
#[derive(Clone, Debug, Default)]
pub struct PointerListeners(Rc<RefCell<Registry>>);

impl PointerListeners {
    pub fn new() -> PointerListeners {
        PointerListeners::default()
    }

    /// Registers `on_outside` to be called once, on the first press that
    /// lands outside the subscription's areas.  It stays registered until
    /// then or until the returned subscription is dropped.
    pub fn subscribe<F>(&self, on_outside: F) -> OutsideClick
    where
        F: FnMut() + 'static,
    {
        let mut reg = self.0.borrow_mut();
        let id = reg.next_id;
        reg.next_id += 1;
        reg.listeners.push(Listener {
            id,
            inside: Vec::new(),
            on_outside: Box::new(on_outside),
        });
        log::trace!("Outside-press listener {id} registered");
        OutsideClick {
            id,
            registry: Rc::downgrade(&self.0),
        }
    }

    /// Reports a pointer press at `pos`.  Every listener whose areas do not
    /// contain `pos` is removed and its callback run.  Returns the number of
    /// listeners notified.
    pub fn pointer_down(&self, pos: Position) -> usize {
        let mut fired = {
            let mut reg = self.0.borrow_mut();
            let (fired, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut reg.listeners)
                .into_iter()
                .partition(|l| !l.inside.iter().any(|r| r.contains(pos)));
            reg.listeners = kept;
            fired
        };
        // Callbacks run with the registry released so that they may
        // subscribe or unsubscribe
        for listener in &mut fired {
            log::trace!("Outside-press listener {} notified", listener.id);
            (listener.on_outside)();
        }
        fired.len()
    }

    /// Number of live subscriptions
    pub fn len(&self) -> usize {
        self.0.borrow().listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A live outside-press subscription.  Dropping it unregisters the listener.
#[derive(Debug)]
pub struct OutsideClick {
    id: u64,
    registry: Weak<RefCell<Registry>>,
}

impl OutsideClick {
    /// Sets the screen areas that count as "inside"
    pub fn set_inside(&self, areas: Vec<Rect>) {
        if let Some(reg) = self.registry.upgrade() {
            if let Some(listener) = reg
                .borrow_mut()
                .listeners
                .iter_mut()
                .find(|l| l.id == self.id)
            {
                listener.inside = areas;
            }
        }
    }

    /// Whether the listener is still registered
    pub fn is_active(&self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|reg| reg.borrow().listeners.iter().any(|l| l.id == self.id))
    }
}

impl Drop for OutsideClick {
    fn drop(&mut self) {
        if let Some(reg) = self.registry.upgrade() {
            if let Ok(mut reg) = reg.try_borrow_mut() {
                reg.listeners.retain(|l| l.id != self.id);
                log::trace!("Outside-press listener {} released", self.id);
            }
        }
    }
}
