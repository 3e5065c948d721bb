//! Human agent driven by an external input surface.
//!
//! The surface runs on its own thread and talks to the agent over channels:
//! it receives [`SurfaceEvent`]s and answers move requests with positions.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::ai::{Agent, Seat};
use crate::board::Board;
use crate::error::GameError;
use crate::rules::snapshot;
use crate::types::{BoardSnapshot, Outcome, Position, Side};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    BoardChanged(BoardSnapshot),
    /// The agent is blocked until one of these positions is submitted.
    AwaitMove(Vec<Position>),
    GameEnded(Outcome),
}

/// Surface side of the connection.
pub struct HumanHandle {
    events: Receiver<SurfaceEvent>,
    picks: Sender<Position>,
    running: Arc<AtomicBool>,
    ready: Option<SyncSender<()>>,
}

impl HumanHandle {
    /// Signals that the surface is up. Only the first call has an effect.
    pub fn ready(&mut self) {
        if let Some(tx) = self.ready.take() {
            let _ = tx.send(());
        }
    }

    /// Blocks for the next event; `None` once the agent is gone.
    pub fn next_event(&self) -> Option<SurfaceEvent> {
        self.events.recv().ok()
    }

    pub fn try_next_event(&self) -> Option<SurfaceEvent> {
        self.events.try_recv().ok()
    }

    /// Offers a move; returns `false` once the agent is gone.
    pub fn submit(&self, pos: Position) -> bool {
        self.picks.send(pos).is_ok()
    }

    /// Shuts the surface down. The agent reports itself as not running and
    /// any pending move request fails.
    pub fn close(self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

impl Drop for HumanHandle {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

/// Agent whose moves come from a [`HumanHandle`].
///
/// Clones share the same surface and pick queue, so seat at most one clone
/// in a running game at a time.
#[derive(Clone)]
pub struct HumanAgent {
    name: String,
    seat: Seat,
    events: Sender<SurfaceEvent>,
    picks: Arc<Mutex<Receiver<Position>>>,
    running: Arc<AtomicBool>,
}

impl HumanAgent {
    /// Creates a connected agent/handle pair without starting anything.
    pub fn connect(name: impl Into<String>) -> (Self, HumanHandle) {
        let (event_tx, event_rx) = mpsc::channel();
        let (pick_tx, pick_rx) = mpsc::channel();
        let running = Arc::new(AtomicBool::new(true));

        let agent = Self {
            name: name.into(),
            seat: Seat::default(),
            events: event_tx,
            picks: Arc::new(Mutex::new(pick_rx)),
            running: Arc::clone(&running),
        };
        let handle = HumanHandle {
            events: event_rx,
            picks: pick_tx,
            running,
            ready: None,
        };
        (agent, handle)
    }

    /// Starts `surface` on its own thread and blocks until it calls
    /// [`HumanHandle::ready`].
    pub fn launch<F>(name: impl Into<String>, surface: F) -> Result<(Self, JoinHandle<()>), GameError>
    where
        F: FnOnce(HumanHandle) + Send + 'static,
    {
        let (agent, mut handle) = Self::connect(name);
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);
        handle.ready = Some(ready_tx);

        let thread = thread::spawn(move || surface(handle));
        ready_rx.recv().map_err(|_| GameError::InputClosed)?;
        tracing::debug!(agent = %agent.name, "input surface ready");
        Ok((agent, thread))
    }

    fn emit(&self, event: SurfaceEvent) {
        if self.events.send(event).is_err() {
            self.running.store(false, Ordering::SeqCst);
        }
    }
}

impl Agent for HumanAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn side(&self) -> Option<Side> {
        self.seat.side()
    }

    fn join(&mut self, side: Side) -> Result<(), GameError> {
        self.seat.join(side)
    }

    fn on_board_changed(&mut self, board: &Board) {
        self.emit(SurfaceEvent::BoardChanged(snapshot(board, None)));
    }

    fn on_game_ended(&mut self, _board: &Board, outcome: Outcome) {
        self.emit(SurfaceEvent::GameEnded(outcome));
    }

    fn select_move(&mut self, _board: &Board, legal: &[Position]) -> Result<Position, GameError> {
        let side = self.seat.require_side()?;
        if legal.is_empty() {
            return Err(GameError::NoLegalMove(side));
        }
        self.emit(SurfaceEvent::AwaitMove(legal.to_vec()));

        let picks = self.picks.lock().map_err(|_| GameError::InputClosed)?;
        loop {
            match picks.recv() {
                Ok(pos) if legal.contains(&pos) => return Ok(pos),
                Ok(pos) => tracing::debug!(%side, %pos, "ignoring pick outside the offered moves"),
                Err(_) => {
                    self.running.store(false, Ordering::SeqCst);
                    return Err(GameError::InputClosed);
                }
            }
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Shares the surface: the clone is a second seat on the same channel.
    fn clone_agent(&self) -> Box<dyn Agent> {
        Box::new(self.clone())
    }
}
