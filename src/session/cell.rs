use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

/// A shared value with one writer and any number of observers.
///
/// Every [`set`](Self::set) replaces the value and pushes a copy to each
/// subscriber. Subscribers whose receiver was dropped are pruned on the next
/// write.
#[derive(Debug)]
pub struct StateCell<T> {
    value: Arc<Mutex<T>>,
    subscribers: Arc<Mutex<Vec<Sender<T>>>>,
}

impl<T> Clone for StateCell<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            subscribers: self.subscribers.clone(),
        }
    }
}

impl<T: Clone> StateCell<T> {
    pub fn new(initial: T) -> Self {
        Self {
            value: Arc::new(Mutex::new(initial)),
            subscribers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn get(&self) -> T {
        match self.value.lock() {
            Ok(v) => v.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn set(&self, value: T) {
        match self.value.lock() {
            Ok(mut v) => *v = value.clone(),
            Err(poisoned) => *poisoned.into_inner() = value.clone(),
        }
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.retain(|tx| tx.send(value.clone()).is_ok());
        }
    }

    /// Observe changes. The receiver starts with the current value.
    pub fn subscribe(&self) -> Receiver<T> {
        let (tx, rx) = mpsc::channel();
        let _ = tx.send(self.get());
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.push(tx);
        }
        rx
    }
}
