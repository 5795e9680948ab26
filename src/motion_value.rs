use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Listener<T> = Box<dyn FnMut(T)>;

/// A value holder that notifies subscribers whenever it changes.
///
/// Setting the value it already holds is not a change and notifies nobody.
pub struct MotionValue<T> {
    current: T,
    listeners: Vec<(SubscriptionId, Listener<T>)>,
    next_id: u64,
}

impl<T: Copy + PartialEq> MotionValue<T> {
    pub fn new(initial: T) -> Self {
        Self {
            current: initial,
            listeners: Vec::new(),
            next_id: 0,
        }
    }

    pub fn get(&self) -> T {
        self.current
    }

    /// Stores `value`, returning true when it differed from the previous one.
    pub fn set(&mut self, value: T) -> bool {
        if self.current == value {
            return false;
        }
        self.current = value;
        for (_, listener) in &mut self.listeners {
            listener(value);
        }
        true
    }

    pub fn subscribe(&mut self, listener: impl FnMut(T) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        before != self.listeners.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn clear_subscribers(&mut self) {
        self.listeners.clear();
    }
}

impl<T: fmt::Debug> fmt::Debug for MotionValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MotionValue")
            .field("current", &self.current)
            .field("subscribers", &self.listeners.len())
            .finish()
    }
}
