//! Thin façade over in-process or inter-process (MPI) message passing.
//!
//! Messages are *contiguous byte slices* (no zero-copy guarantees).
//! All handles are **waitable** but non-blocking to post; the transpose
//! exchange posts every receive and send first and only then calls
//! `.wait()` on each handle.

use bytes::Bytes;
use hashbrown::HashMap;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

/// Non-blocking point-to-point communication interface.
pub trait Communicator {
    /// Handle returned by `isend`.
    type SendHandle: Wait;
    /// Handle returned by `irecv`.
    type RecvHandle: Wait;

    /// This process' rank in `[0, size)`.
    fn rank(&self) -> usize;
    /// Number of cooperating processes.
    fn size(&self) -> usize;

    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> Self::SendHandle;
    /// Post a receive of `buf.len()` bytes from `peer`.
    ///
    /// The received payload is returned by [`Wait::wait`]; callers validate
    /// its length against what they expected.
    fn irecv(&self, peer: usize, tag: u16, buf: &mut [u8]) -> Self::RecvHandle;
}

/// Anything that can be waited on.
pub trait Wait {
    /// Wait for completion and return the received data (if any).
    fn wait(self) -> Option<Vec<u8>>;
}

impl Wait for () {
    fn wait(self) -> Option<Vec<u8>> {
        None
    }
}

/// Message tag with a fixed base per exchange kind.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CommTag(u16);

impl CommTag {
    pub const fn new(tag: u16) -> Self {
        Self(tag)
    }

    /// Tag offset by `n` (wrapping).
    pub const fn offset(self, n: u16) -> Self {
        Self(self.0.wrapping_add(n))
    }

    pub const fn as_u16(self) -> u16 {
        self.0
    }
}

/// Compile-time no-op comm for pure serial use: one process, no peers.
#[derive(Clone, Debug, Default)]
pub struct NoComm;

impl Communicator for NoComm {
    type SendHandle = ();
    type RecvHandle = ();

    fn rank(&self) -> usize {
        0
    }
    fn size(&self) -> usize {
        1
    }
    fn isend(&self, _peer: usize, _tag: u16, _buf: &[u8]) {}
    fn irecv(&self, _peer: usize, _tag: u16, _buf: &mut [u8]) {}
}

// --- LocalComm: simulated world on threads of one process ---

type Key = (usize, usize, u16); // (src, dst, tag)

/// How long a local receive waits before reporting failure.
const LOCAL_RECV_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Default)]
struct Mailbox {
    slots: Mutex<HashMap<Key, VecDeque<Bytes>>>,
    arrived: Condvar,
}

/// One rank of an in-process world created by [`LocalComm::world`].
///
/// Messages are FIFO per `(src, dst, tag)`. Sends complete immediately;
/// receives block in `wait` until the matching message arrives.
#[derive(Clone)]
pub struct LocalComm {
    rank: usize,
    size: usize,
    mailbox: Arc<Mailbox>,
}

impl std::fmt::Debug for LocalComm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalComm")
            .field("rank", &self.rank)
            .field("size", &self.size)
            .finish()
    }
}

impl LocalComm {
    /// `size` communicators sharing one mailbox, indexed by rank.
    pub fn world(size: usize) -> Vec<LocalComm> {
        let mailbox = Arc::new(Mailbox::default());
        (0..size)
            .map(|rank| LocalComm {
                rank,
                size,
                mailbox: Arc::clone(&mailbox),
            })
            .collect()
    }
}

pub struct LocalRecv {
    mailbox: Arc<Mailbox>,
    key: Key,
}

impl Wait for LocalRecv {
    fn wait(self) -> Option<Vec<u8>> {
        let mut slots = self.mailbox.slots.lock();
        loop {
            if let Some(msg) = slots.get_mut(&self.key).and_then(VecDeque::pop_front) {
                return Some(msg.to_vec());
            }
            if self
                .mailbox
                .arrived
                .wait_for(&mut slots, LOCAL_RECV_TIMEOUT)
                .timed_out()
            {
                log::warn!(
                    "local receive from rank {} (tag {:#x}) timed out",
                    self.key.0,
                    self.key.2
                );
                return None;
            }
        }
    }
}

impl Communicator for LocalComm {
    type SendHandle = ();
    type RecvHandle = LocalRecv;

    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) {
        let key = (self.rank, peer, tag);
        self.mailbox
            .slots
            .lock()
            .entry(key)
            .or_default()
            .push_back(Bytes::copy_from_slice(buf));
        self.mailbox.arrived.notify_all();
    }

    fn irecv(&self, peer: usize, tag: u16, _buf: &mut [u8]) -> LocalRecv {
        LocalRecv {
            mailbox: Arc::clone(&self.mailbox),
            key: (peer, self.rank, tag),
        }
    }
}

// --- MPI backend (feature = "mpi-support") ---
#[cfg(feature = "mpi-support")]
mod mpi_backend {
    use super::{Communicator, Wait};
    use mpi::environment::Universe;
    use mpi::request::StaticScope;
    use mpi::traits::*;
    use std::sync::Arc;

    /// World communicator; keeps the MPI environment alive while cloned.
    #[derive(Clone)]
    pub struct MpiComm {
        universe: Arc<Universe>,
        rank: usize,
        size: usize,
    }

    impl MpiComm {
        /// Initialise MPI. Returns `None` if it was already initialised.
        pub fn new() -> Option<Self> {
            let universe = mpi::initialize()?;
            let world = universe.world();
            let rank = world.rank() as usize;
            let size = world.size() as usize;
            Some(Self {
                universe: Arc::new(universe),
                rank,
                size,
            })
        }
    }

    pub struct MpiSend(Option<Box<dyn FnOnce()>>);

    impl Wait for MpiSend {
        fn wait(mut self) -> Option<Vec<u8>> {
            if let Some(finish) = self.0.take() {
                finish();
            }
            None
        }
    }

    pub struct MpiRecv {
        universe: Arc<Universe>,
        peer: usize,
        tag: i32,
    }

    impl Wait for MpiRecv {
        fn wait(self) -> Option<Vec<u8>> {
            let world = self.universe.world();
            let (data, _status) = world
                .process_at_rank(self.peer as i32)
                .receive_vec_with_tag::<u8>(self.tag);
            Some(data)
        }
    }

    impl Communicator for MpiComm {
        type SendHandle = MpiSend;
        type RecvHandle = MpiRecv;

        fn rank(&self) -> usize {
            self.rank
        }

        fn size(&self) -> usize {
            self.size
        }

        fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> MpiSend {
            let raw: *mut [u8] = Box::into_raw(buf.to_vec().into_boxed_slice());
            // SAFETY: `raw` stays allocated until the request completes below,
            // and nothing else aliases it.
            let staged: &'static [u8] = unsafe { &*raw };
            let world = self.universe.world();
            let req = world
                .process_at_rank(peer as i32)
                .immediate_send_with_tag(StaticScope, staged, tag as i32);
            MpiSend(Some(Box::new(move || {
                req.wait();
                // SAFETY: the send completed; reclaim the staging buffer.
                drop(unsafe { Box::from_raw(raw) });
            })))
        }

        fn irecv(&self, peer: usize, tag: u16, _buf: &mut [u8]) -> MpiRecv {
            MpiRecv {
                universe: Arc::clone(&self.universe),
                peer,
                tag: tag as i32,
            }
        }
    }
}

#[cfg(feature = "mpi-support")]
pub use mpi_backend::MpiComm;
