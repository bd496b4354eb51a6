/*!
 * Ordered Run Queue
 * Index-linked run queues backed by a slab of queue nodes
 *
 * Queue nodes live in a `NodeArena` keyed by `NodeId`. A task refers to its
 * node by index, never by pointer, so releasing a node can't leave a
 * dangling link behind. Each `RunQueue` is a doubly-linked list threaded
 * through the arena, giving O(1) front/back insertion and O(1) unlink.
 */

use super::task::TaskHandle;
use crate::core::errors::SchedulerError;
use crate::core::types::SchedResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, trace};

/// Index of a queue node in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Which run queue a node belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueKind {
    Active,
    /// Present for round-robin compatibility, never populated by this policy
    Expired,
}

/// Engine-owned wrapper placing a task in a run queue
#[derive(Debug)]
pub(crate) struct QueueNode {
    task: TaskHandle,
    queue: QueueKind,
    prev: Option<NodeId>,
    next: Option<NodeId>,
}

#[derive(Debug)]
enum Slot {
    Occupied(QueueNode),
    Vacant { next_free: Option<usize> },
}

/// Slab of queue nodes with free-list reuse
#[derive(Debug)]
pub struct NodeArena {
    slots: Vec<Slot>,
    free_head: Option<usize>,
    len: usize,
    max_nodes: usize,
}

impl NodeArena {
    pub fn new(max_nodes: usize) -> Self {
        Self {
            slots: Vec::new(),
            free_head: None,
            len: 0,
            max_nodes,
        }
    }

    /// Number of live nodes
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn insert(&mut self, task: TaskHandle, queue: QueueKind) -> SchedResult<NodeId> {
        if self.len >= self.max_nodes {
            return Err(SchedulerError::ResourceExhausted(format!(
                "queue node limit of {} reached",
                self.max_nodes
            )));
        }

        let node = QueueNode {
            task,
            queue,
            prev: None,
            next: None,
        };

        let index = match self.free_head {
            Some(index) => {
                self.free_head = match self.slots[index] {
                    Slot::Vacant { next_free } => next_free,
                    Slot::Occupied(_) => unreachable!("free list points at occupied slot"),
                };
                self.slots[index] = Slot::Occupied(node);
                index
            }
            None => {
                self.slots
                    .try_reserve(1)
                    .map_err(|e| SchedulerError::ResourceExhausted(e.to_string()))?;
                self.slots.push(Slot::Occupied(node));
                self.slots.len() - 1
            }
        };

        self.len += 1;
        Ok(NodeId(index))
    }

    fn remove(&mut self, id: NodeId) -> Option<QueueNode> {
        let slot = self.slots.get_mut(id.0)?;
        if !matches!(slot, Slot::Occupied(_)) {
            return None;
        }

        let old = std::mem::replace(
            slot,
            Slot::Vacant {
                next_free: self.free_head,
            },
        );
        self.free_head = Some(id.0);
        self.len -= 1;

        match old {
            Slot::Occupied(node) => Some(node),
            Slot::Vacant { .. } => None,
        }
    }

    #[inline]
    pub(crate) fn get(&self, id: NodeId) -> Option<&QueueNode> {
        match self.slots.get(id.0) {
            Some(Slot::Occupied(node)) => Some(node),
            _ => None,
        }
    }

    #[inline]
    fn get_mut(&mut self, id: NodeId) -> Option<&mut QueueNode> {
        match self.slots.get_mut(id.0) {
            Some(Slot::Occupied(node)) => Some(node),
            _ => None,
        }
    }

    fn node(&self, id: NodeId) -> &QueueNode {
        self.get(id).expect("run queue links to a released node")
    }

    fn node_mut(&mut self, id: NodeId) -> &mut QueueNode {
        self.get_mut(id).expect("run queue links to a released node")
    }
}

/// Doubly-linked run queue threaded through a `NodeArena`
#[derive(Debug)]
pub struct RunQueue {
    kind: QueueKind,
    head: Option<NodeId>,
    tail: Option<NodeId>,
    len: usize,
}

impl RunQueue {
    pub const fn new(kind: QueueKind) -> Self {
        Self {
            kind,
            head: None,
            tail: None,
            len: 0,
        }
    }

    #[inline]
    pub fn kind(&self) -> QueueKind {
        self.kind
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn push_front(&mut self, arena: &mut NodeArena, id: NodeId) {
        let old_head = self.head;
        {
            let node = arena.node_mut(id);
            node.prev = None;
            node.next = old_head;
        }
        match old_head {
            Some(head) => arena.node_mut(head).prev = Some(id),
            None => self.tail = Some(id),
        }
        self.head = Some(id);
        self.len += 1;
    }

    fn push_back(&mut self, arena: &mut NodeArena, id: NodeId) {
        let old_tail = self.tail;
        {
            let node = arena.node_mut(id);
            node.prev = old_tail;
            node.next = None;
        }
        match old_tail {
            Some(tail) => arena.node_mut(tail).next = Some(id),
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        self.len += 1;
    }

    fn unlink(&mut self, arena: &mut NodeArena, id: NodeId) {
        let (prev, next) = {
            let node = arena.node_mut(id);
            (node.prev.take(), node.next.take())
        };
        match prev {
            Some(prev) => arena.node_mut(prev).next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => arena.node_mut(next).prev = prev,
            None => self.tail = prev,
        }
        self.len -= 1;
    }

    /// Iterate nodes in list order
    pub fn iter<'a>(&self, arena: &'a NodeArena) -> Iter<'a> {
        Iter {
            arena,
            cursor: self.head,
        }
    }

    /// Task handles in list order
    pub fn tasks(&self, arena: &NodeArena) -> Vec<TaskHandle> {
        self.iter(arena).map(|(_, task)| task.clone()).collect()
    }

    /// Linear scan for the node whose task has the smallest remaining slice
    ///
    /// Ties resolve to the first node encountered in list order.
    pub fn find_min_remaining(&self, arena: &NodeArena) -> Option<NodeId> {
        let mut best: Option<(NodeId, u32)> = None;
        for (id, task) in self.iter(arena) {
            let slice = task.time_slice();
            match best {
                Some((_, min)) if slice >= min => {}
                _ => best = Some((id, slice)),
            }
        }
        best.map(|(id, _)| id)
    }

    /// Unlink every node matching `pred`, visiting in list order
    ///
    /// The successor is read before the current node is visited, so removing
    /// the visited node never breaks the walk.
    fn remove_where<F>(&mut self, arena: &mut NodeArena, mut pred: F) -> Vec<QueueNode>
    where
        F: FnMut(&QueueNode) -> bool,
    {
        let mut removed = Vec::new();
        let mut cursor = self.head;
        while let Some(id) = cursor {
            cursor = arena.node(id).next;
            if pred(arena.node(id)) {
                self.unlink(arena, id);
                if let Some(node) = arena.remove(id) {
                    removed.push(node);
                }
            }
        }
        removed
    }
}

/// Iterator over `(NodeId, &TaskHandle)` in list order
pub struct Iter<'a> {
    arena: &'a NodeArena,
    cursor: Option<NodeId>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (NodeId, &'a TaskHandle);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cursor?;
        let node = self.arena.get(id)?;
        self.cursor = node.next;
        Some((id, &node.task))
    }
}

/// The node arena together with the active and expired queues
#[derive(Debug)]
pub struct RunQueues {
    arena: NodeArena,
    active: RunQueue,
    expired: RunQueue,
}

impl RunQueues {
    /// Create both queues, empty
    pub fn new(max_nodes: usize) -> Self {
        Self {
            arena: NodeArena::new(max_nodes),
            active: RunQueue::new(QueueKind::Active),
            expired: RunQueue::new(QueueKind::Expired),
        }
    }

    #[inline]
    pub fn queue(&self, kind: QueueKind) -> &RunQueue {
        match kind {
            QueueKind::Active => &self.active,
            QueueKind::Expired => &self.expired,
        }
    }

    #[inline]
    pub fn arena(&self) -> &NodeArena {
        &self.arena
    }

    fn split(&mut self, kind: QueueKind) -> (&mut RunQueue, &mut NodeArena) {
        match kind {
            QueueKind::Active => (&mut self.active, &mut self.arena),
            QueueKind::Expired => (&mut self.expired, &mut self.arena),
        }
    }

    /// Live queue nodes across both queues
    #[inline]
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    /// Allocate a node for `task` and insert it at the front of `kind`
    pub fn enqueue(&mut self, task: &TaskHandle, kind: QueueKind) -> SchedResult<NodeId> {
        let pid = {
            let guard = task.lock();
            if guard.membership.is_some() {
                return Err(SchedulerError::AlreadyQueued(guard.pid));
            }
            guard.pid
        };

        let (queue, arena) = self.split(kind);
        let id = arena.insert(task.clone(), kind)?;
        queue.push_front(arena, id);
        task.lock().membership = Some(id);

        debug!(pid, node = %id, queue = ?kind, "enqueued task");
        Ok(id)
    }

    /// Remove `task` from whichever queue holds it and release its node
    pub fn dequeue(&mut self, task: &TaskHandle) -> SchedResult<()> {
        let (pid, id) = {
            let guard = task.lock();
            match guard.membership {
                Some(id) => (guard.pid, id),
                None => return Err(SchedulerError::NotQueued(guard.pid)),
            }
        };

        let kind = match self.arena.get(id) {
            Some(node) if node.task.same(task) => node.queue,
            _ => return Err(SchedulerError::NotQueued(pid)),
        };

        let (queue, arena) = self.split(kind);
        queue.unlink(arena, id);
        arena.remove(id);
        task.lock().membership = None;

        debug!(pid, node = %id, queue = ?kind, "dequeued task");
        Ok(())
    }

    /// Move a queued task to the back of its queue
    pub fn requeue_back(&mut self, task: &TaskHandle) -> SchedResult<()> {
        let (pid, id) = {
            let guard = task.lock();
            match guard.membership {
                Some(id) => (guard.pid, id),
                None => return Err(SchedulerError::NotQueued(guard.pid)),
            }
        };

        let kind = match self.arena.get(id) {
            Some(node) if node.task.same(task) => node.queue,
            _ => return Err(SchedulerError::NotQueued(pid)),
        };

        let (queue, arena) = self.split(kind);
        queue.unlink(arena, id);
        queue.push_back(arena, id);

        trace!(pid, node = %id, queue = ?queue.kind(), "moved task to back of queue");
        Ok(())
    }

    /// Task with the smallest remaining slice in `kind`, first in list order on ties
    pub fn find_min_remaining(&self, kind: QueueKind) -> Option<TaskHandle> {
        let id = self.queue(kind).find_min_remaining(&self.arena)?;
        self.arena.get(id).map(|node| node.task.clone())
    }

    /// Release every node of `kind`, clearing the tasks' memberships
    ///
    /// Returns the handles that were queued, in list order.
    pub fn drain(&mut self, kind: QueueKind) -> Vec<TaskHandle> {
        let (queue, arena) = self.split(kind);
        queue
            .remove_where(arena, |_| true)
            .into_iter()
            .map(|node| {
                node.task.lock().membership = None;
                node.task
            })
            .collect()
    }
}
