//! Task registry - the work exclusivity mechanism of one colony.
//!
//! The registry is the only long-lived owner of task records. Agents hold
//! just the identity of their task. All mutation happens inside the
//! colony's synchronous cycle, so a check with [`TaskRegistry::is_taken`]
//! followed by [`TaskRegistry::assign`] for the same agent cannot be
//! interleaved with another agent's logic.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use colony_core::{Agent, ObjectId, RoomName, Task, TaskId, TaskKind, TaskPayload};
use tracing::{debug, trace};

/// Result of an [`TaskRegistry::assign`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignment {
    /// The agent now holds the task
    Assigned,
    /// Another agent got there first and the task is at its limit
    Contended,
}

/// Colony-scoped map from task identity to task record.
#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    tasks: BTreeMap<TaskId, Task>,
}

impl TaskRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a task for the (location, target, kind) triple.
    ///
    /// This does not touch any registry; the identity of the result depends
    /// only on the triple.
    pub fn create(
        room: RoomName,
        target: ObjectId,
        kind: TaskKind,
        limit: u32,
        payload: Option<TaskPayload>,
    ) -> Task {
        Task::new(room, target, kind, limit, payload)
    }

    /// Whether no further agent may take this identity.
    pub fn is_taken(&self, id: &TaskId) -> bool {
        self.tasks
            .get(id)
            .map(|task| task.complete || task.is_full())
            .unwrap_or(false)
    }

    /// Give `task` to `agent`, evicting whatever the agent held before.
    ///
    /// If the identity is already live the existing record is updated and
    /// the agent joins its holders, provided the limit allows it.
    pub fn assign(&mut self, agent: &mut Agent, task: Task) -> Assignment {
        if agent.task.as_ref() != Some(&task.id) {
            self.release(agent);
        }

        let id = task.id.clone();
        match self.tasks.entry(id.clone()) {
            Entry::Occupied(mut entry) => {
                let live = entry.get_mut();
                if !live.holders.contains(&agent.name) && (live.complete || live.is_full()) {
                    debug!("{} lost {} to {:?}", agent.name, id, live.holders);
                    return Assignment::Contended;
                }
                live.limit = task.limit.max(live.holders.len() as u32);
                live.payload = task.payload;
                live.holders.insert(agent.name.clone());
            }
            Entry::Vacant(entry) => {
                let mut task = task;
                task.complete = false;
                task.holders.clear();
                task.holders.insert(agent.name.clone());
                entry.insert(task);
            }
        }

        trace!("{} assigned {}", agent.name, id);
        agent.task = Some(id);
        Assignment::Assigned
    }

    /// Drop the agent's hold on its current task and clear its pointer.
    ///
    /// The record is removed once its last holder lets go.
    pub fn release(&mut self, agent: &mut Agent) -> Option<Task> {
        let id = agent.task.take()?;
        let Entry::Occupied(mut entry) = self.tasks.entry(id) else {
            return None;
        };

        entry.get_mut().holders.remove(&agent.name);
        if entry.get().holders.is_empty() {
            let task = entry.remove();
            trace!("{} released {}", agent.name, task.id);
            Some(task)
        } else {
            Some(entry.get().clone())
        }
    }

    /// Reconstruct the registry from the identities carried by live agents.
    ///
    /// Agents sharing an identity collapse into one record; its limit is the
    /// kind's default, raised if more agents already hold it.
    pub fn rebuild<'a>(&mut self, agents: impl IntoIterator<Item = &'a Agent>) {
        self.tasks.clear();

        for agent in agents {
            let Some(id) = &agent.task else {
                continue;
            };
            let task = self.tasks.entry(id.clone()).or_insert_with(|| Task {
                id: id.clone(),
                complete: false,
                limit: id.kind.default_limit(),
                payload: None,
                holders: Default::default(),
            });
            task.holders.insert(agent.name.clone());
            task.limit = task.limit.max(task.holders.len() as u32);
        }

        debug!("Rebuilt registry with {} tasks", self.tasks.len());
    }

    /// Mark a task complete. Returns false if it is not live.
    pub fn mark_complete(&mut self, id: &TaskId) -> bool {
        match self.tasks.get_mut(id) {
            Some(task) => {
                task.finish();
                true
            }
            None => false,
        }
    }

    /// Look up a live task.
    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.get(id)
    }

    /// Look up a live task for mutation.
    pub fn get_mut(&mut self, id: &TaskId) -> Option<&mut Task> {
        self.tasks.get_mut(id)
    }

    /// Whether the identity is live.
    pub fn contains(&self, id: &TaskId) -> bool {
        self.tasks.contains_key(id)
    }

    /// Number of live tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether there are no live tasks.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Iterate over live tasks in identity order.
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    /// Drop every record. Used at colony teardown.
    pub fn clear(&mut self) {
        self.tasks.clear();
    }
}
