//! Generational slot storage for agents.
//!
//! Agents never hold references to each other; they hold [`AgentId`]s and
//! resolve them through the arena each time. A lookup either finds the live
//! agent or returns `None`, which is how stale owner/child/target links are
//! detected and recovered from.

use super::AgentId;

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
    /// `true` while the value is checked out for its own tick.
    checked_out: bool,
}

/// Slot vector with a free list and per-slot generation counters.
#[derive(Debug)]
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Number of live values (including ones currently checked out).
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Inserts a value built from its future id.
    pub fn insert_with(&mut self, build: impl FnOnce(AgentId) -> T) -> AgentId {
        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                AgentId::new(index, slot.generation)
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    value: None,
                    checked_out: false,
                });
                AgentId::new((self.slots.len() - 1) as u32, 0)
            }
        };
        let slot = &mut self.slots[id.index as usize];
        slot.value = Some(build(id));
        slot.checked_out = false;
        self.len += 1;
        id
    }

    fn slot(&self, id: AgentId) -> Option<&Slot<T>> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
    }

    fn slot_mut(&mut self, id: AgentId) -> Option<&mut Slot<T>> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
    }

    /// Returns `true` if `id` refers to a live value (checked out or not).
    pub fn contains(&self, id: AgentId) -> bool {
        self.slot(id)
            .is_some_and(|slot| slot.value.is_some() || slot.checked_out)
    }

    pub fn get(&self, id: AgentId) -> Option<&T> {
        self.slot(id).and_then(|slot| slot.value.as_ref())
    }

    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut T> {
        self.slot_mut(id).and_then(|slot| slot.value.as_mut())
    }

    /// Removes a value, bumping the slot generation so outstanding ids go stale.
    pub fn remove(&mut self, id: AgentId) -> Option<T> {
        let slot = self.slot_mut(id)?;
        if slot.value.is_none() && !slot.checked_out {
            return None;
        }
        let value = slot.value.take();
        slot.checked_out = false;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.len -= 1;
        value
    }

    /// Temporarily moves a value out so it can be mutated while the rest of
    /// the arena stays queryable. Must be paired with [`Arena::check_in`].
    pub(crate) fn check_out(&mut self, id: AgentId) -> Option<T> {
        let slot = self.slot_mut(id)?;
        let value = slot.value.take()?;
        slot.checked_out = true;
        Some(value)
    }

    /// Returns a value taken with [`Arena::check_out`]. If the slot was
    /// removed in the meantime the value is handed back to the caller.
    pub(crate) fn check_in(&mut self, id: AgentId, value: T) -> Result<(), T> {
        match self.slot_mut(id) {
            Some(slot) if slot.checked_out => {
                slot.value = Some(value);
                slot.checked_out = false;
                Ok(())
            }
            _ => Err(value),
        }
    }

    /// Ids of all live values in slot order.
    pub fn ids(&self) -> Vec<AgentId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.value.is_some() || slot.checked_out)
            .map(|(index, slot)| AgentId::new(index as u32, slot.generation))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (AgentId, &T)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.value
                .as_ref()
                .map(|value| (AgentId::new(index as u32, slot.generation), value))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removed_ids_go_stale_when_slot_is_reused() {
        let mut arena = Arena::new();
        let first = arena.insert_with(|_| "mine");
        assert_eq!(arena.remove(first), Some("mine"));

        let second = arena.insert_with(|_| "drone");
        assert_eq!(second.index, first.index);
        assert_ne!(second.generation, first.generation);
        assert_eq!(arena.get(first), None);
        assert_eq!(arena.get(second), Some(&"drone"));
    }

    #[test]
    fn checked_out_value_is_hidden_but_still_contained() {
        let mut arena = Arena::new();
        let id = arena.insert_with(|_| 7);
        let value = arena.check_out(id).unwrap();
        assert_eq!(arena.get(id), None);
        assert!(arena.contains(id));
        assert_eq!(arena.ids(), vec![id]);
        arena.check_in(id, value + 1).unwrap();
        assert_eq!(arena.get(id), Some(&8));
    }

    #[test]
    fn check_in_after_removal_returns_value() {
        let mut arena = Arena::new();
        let id = arena.insert_with(|_| 1);
        let value = arena.check_out(id).unwrap();
        assert_eq!(arena.remove(id), None);
        assert!(!arena.contains(id));
        assert_eq!(arena.check_in(id, value), Err(1));
        assert!(arena.is_empty());
    }
}
