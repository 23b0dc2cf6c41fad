//! Reference counted sessions shared between consumers.
//!

use std::collections::{HashMap, hash_map::Entry};

use tracing::{debug, warn};

use crate::{
    error::Error,
    platform::GraphicsDevice,
    session::{DuplicationSession, SessionConfig},
};

/// An opaque reference to a registered session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionHandle(u32);

impl SessionHandle {
    /// The index of the monitor the session duplicates.
    pub fn monitor_index(&self) -> u32 {
        self.0
    }
}

/// Reference counted sessions keyed by monitor index.
///
/// There is at most one session per monitor, however many consumers hold a handle to it.
/// Dropping the registry destroys every remaining session.
pub struct SessionRegistry<D: GraphicsDevice> {
    sessions: HashMap<u32, DuplicationSession<D>>,
    config: SessionConfig,
}

impl<D: GraphicsDevice> SessionRegistry<D> {
    /// Creates an empty registry whose sessions start with `config`.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            sessions: HashMap::new(),
            config,
        }
    }

    /// Gets a handle to the session for `monitor_index`, starting it if it doesn't exist.
    ///
    /// If the session fails to start nothing is registered.
    pub fn acquire(&mut self, device: &D, monitor_index: u32) -> Result<SessionHandle, Error> {
        match self.sessions.entry(monitor_index) {
            Entry::Occupied(mut entry) => {
                entry.get_mut().refs += 1;
            }
            Entry::Vacant(entry) => {
                let session = DuplicationSession::start(device, monitor_index, &self.config)?;
                entry.insert(session);
            }
        }

        Ok(SessionHandle(monitor_index))
    }

    /// Releases a handle, destroying the session once no handles remain.
    ///
    /// Each handle from [`acquire`](Self::acquire) must be released exactly once.
    pub fn release(&mut self, handle: SessionHandle) {
        let Entry::Occupied(mut entry) = self.sessions.entry(handle.0) else {
            warn!("Released unregistered session {}", handle.0);
            return;
        };

        let session = entry.get_mut();
        session.refs -= 1;

        if session.refs == 0 {
            debug!("Destroying session for monitor {}", handle.0);
            entry.remove();
        }
    }

    /// Clears the frame available flag of every session.
    pub fn reset_all(&mut self) {
        for session in self.sessions.values_mut() {
            session.reset();
        }
    }

    /// Gets the session a handle refers to.
    pub fn get(&self, handle: SessionHandle) -> Option<&DuplicationSession<D>> {
        self.sessions.get(&handle.0)
    }

    /// Gets the session a handle refers to.
    pub fn get_mut(&mut self, handle: SessionHandle) -> Option<&mut DuplicationSession<D>> {
        self.sessions.get_mut(&handle.0)
    }

    /// The number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether there are no live sessions.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
