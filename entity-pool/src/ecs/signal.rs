// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Observer lists
//!
//! A [`Signal`] is an ordered list of callbacks for one event channel.
//! Emitting runs every callback to completion, in subscription order,
//! before the mutating call that triggered it returns. Nothing is queued.

use std::fmt;

/// Handle returned by [`Signal::connect`], used to disconnect later
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Get the raw u64 value
    pub fn raw(&self) -> u64 {
        self.0
    }
}

struct Listener<F: ?Sized> {
    id: ListenerId,
    callback: Box<F>,
}

/// Ordered list of subscribers for a single event channel
///
/// `F` is the callback trait object, e.g. `dyn FnMut(&GroupEvent<'_>)`.
pub struct Signal<F: ?Sized> {
    listeners: Vec<Listener<F>>,
    next_id: u64,
}

impl<F: ?Sized> Signal<F> {
    /// Create an empty signal
    pub fn new() -> Self {
        Signal {
            listeners: Vec::new(),
            next_id: 0,
        }
    }

    /// Append a callback; it runs after every callback connected before it
    pub fn connect(&mut self, callback: Box<F>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push(Listener { id, callback });
        id
    }

    /// Remove a callback, keeping the order of the others
    ///
    /// Returns false if `id` is not connected.
    pub fn disconnect(&mut self, id: ListenerId) -> bool {
        match self.listeners.iter().position(|listener| listener.id == id) {
            Some(position) => {
                self.listeners.remove(position);
                true
            }
            None => false,
        }
    }

    /// Remove every callback
    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    /// Number of connected callbacks
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Check if no callback is connected
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub(crate) fn emit<E: ?Sized>(&mut self, event: &E)
    where
        F: FnMut(&E),
    {
        for listener in &mut self.listeners {
            (listener.callback)(event);
        }
    }
}

impl<F: ?Sized> Default for Signal<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: ?Sized> fmt::Debug for Signal<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
