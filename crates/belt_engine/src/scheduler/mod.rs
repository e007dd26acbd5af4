//! Update Scheduling
//!
//! Explicit per-frame callback registry. Hosts call [`UpdateScheduler::tick`]
//! once per frame; every registered callback runs exactly once per tick, in
//! registration order, on the calling thread.

use slotmap::{new_key_type, SlotMap};
use thiserror::Error;

new_key_type! {
    /// Handle returned by [`UpdateScheduler::register`]
    pub struct CallbackId;
}

/// Scheduler lifecycle errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerError {
    /// `tick` called before `start` or after `shutdown`
    #[error("scheduler is not running")]
    NotRunning,
}

/// Information passed to every callback of a tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickInfo {
    /// Tick counter, starting at 1
    pub frame: u64,
    /// Seconds since the previous tick, as supplied by the host
    pub delta_time: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Idle,
    Running,
    Stopped,
}

type Callback = Box<dyn FnMut(&TickInfo)>;

/// Ordered registry of per-tick callbacks
pub struct UpdateScheduler {
    callbacks: SlotMap<CallbackId, Callback>,
    order: Vec<CallbackId>,
    lifecycle: Lifecycle,
    frame: u64,
}

impl std::fmt::Debug for UpdateScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateScheduler")
            .field("callbacks", &self.order.len())
            .field("lifecycle", &self.lifecycle)
            .field("frame", &self.frame)
            .finish()
    }
}

impl UpdateScheduler {
    /// Create an idle scheduler
    pub fn new() -> Self {
        Self {
            callbacks: SlotMap::with_key(),
            order: Vec::new(),
            lifecycle: Lifecycle::Idle,
            frame: 0,
        }
    }

    /// Add a callback to run on every tick after the ones already registered
    pub fn register<F>(&mut self, callback: F) -> CallbackId
    where
        F: FnMut(&TickInfo) + 'static,
    {
        let id = self.callbacks.insert(Box::new(callback));
        self.order.push(id);
        log::debug!("Registered update callback {:?} ({} total)", id, self.order.len());
        id
    }

    /// Remove a callback; returns whether it was registered
    pub fn unregister(&mut self, id: CallbackId) -> bool {
        if self.callbacks.remove(id).is_none() {
            return false;
        }
        self.order.retain(|&registered| registered != id);
        log::debug!("Unregistered update callback {:?}", id);
        true
    }

    /// Allow ticking
    pub fn start(&mut self) {
        if self.lifecycle != Lifecycle::Running {
            log::info!("Update scheduler started with {} callbacks", self.order.len());
        }
        self.lifecycle = Lifecycle::Running;
    }

    /// Run every callback once, in registration order
    pub fn tick(&mut self, delta_time: f32) -> Result<TickInfo, SchedulerError> {
        if self.lifecycle != Lifecycle::Running {
            return Err(SchedulerError::NotRunning);
        }

        self.frame += 1;
        let info = TickInfo { frame: self.frame, delta_time };

        for id in &self.order {
            if let Some(callback) = self.callbacks.get_mut(*id) {
                callback(&info);
            }
        }
        Ok(info)
    }

    /// Drop every callback and stop ticking
    pub fn shutdown(&mut self) {
        let count = self.order.len();
        self.callbacks.clear();
        self.order.clear();
        self.lifecycle = Lifecycle::Stopped;
        log::info!("Update scheduler shut down after {} ticks ({} callbacks dropped)", self.frame, count);
    }

    /// Whether `tick` is currently allowed
    pub fn is_running(&self) -> bool {
        self.lifecycle == Lifecycle::Running
    }

    /// Registered callback count
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether no callback is registered
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Ticks run so far
    pub fn frame(&self) -> u64 {
        self.frame
    }
}

impl Default for UpdateScheduler {
    fn default() -> Self {
        Self::new()
    }
}
