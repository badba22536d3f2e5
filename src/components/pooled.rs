//! Pooled entries and the templates they are instantiated from.
//!
//! A [`PoolEntry`] is created once, when its [`Spawner`](super::spawner::Spawner)
//! grows, and is then only toggled between [`EntryState::Inactive`] and
//! [`EntryState::Active`]. The rendering/physics layer is expected to honor
//! that flag; nothing here draws or moves anything.
//!
//! Templates come in two shapes:
//! - single: one entity placed at the spawn position
//! - group: several members placed at fixed offsets from the spawn position,
//!   despawned as a whole once every member has been despawned

use glam::Vec2;
use smallvec::SmallVec;

/// Something that can be activated at a position and deactivated again.
pub trait Spawnable {
    /// Activate at `position` with `rotation` (degrees).
    fn spawn(&mut self, position: Vec2, rotation: f32);
    /// Deactivate, keeping the instance for reuse.
    fn despawn(&mut self);
}

/// Index of a template in its spawner's candidate set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TemplateId(pub usize);

/// Index of an entry in its spawner's pool, in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(pub usize);

/// A spawnable template.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnTemplate {
    pub name: String,
    /// Member offsets for group templates; empty for single templates.
    pub members: Vec<Vec2>,
}

impl SpawnTemplate {
    pub fn single(name: impl Into<String>) -> Self {
        SpawnTemplate {
            name: name.into(),
            members: Vec::new(),
        }
    }

    pub fn group(name: impl Into<String>, offsets: impl IntoIterator<Item = Vec2>) -> Self {
        SpawnTemplate {
            name: name.into(),
            members: offsets.into_iter().collect(),
        }
    }

    pub fn is_group(&self) -> bool {
        !self.members.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryState {
    #[default]
    Inactive,
    Active,
}

/// One member of a group entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Member {
    /// Local offset from the entry's position.
    pub offset: Vec2,
    /// World position, set on spawn.
    pub position: Vec2,
    pub active: bool,
}

/// A reusable pooled instance of a template.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolEntry {
    pub template: TemplateId,
    pub state: EntryState,
    pub position: Vec2,
    /// Rotation in degrees.
    pub rotation: f32,
    /// Horizontal scroll speed; raised by accelerations.
    pub speed: f32,
    pub members: SmallVec<[Member; 4]>,
}

impl PoolEntry {
    /// New inactive entry for `template`.
    pub fn new(id: TemplateId, template: &SpawnTemplate, speed: f32) -> Self {
        PoolEntry {
            template: id,
            state: EntryState::Inactive,
            position: Vec2::ZERO,
            rotation: 0.0,
            speed,
            members: template
                .members
                .iter()
                .map(|&offset| Member {
                    offset,
                    position: offset,
                    active: false,
                })
                .collect(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == EntryState::Active
    }

    /// Deactivate one member; the entry despawns once no member is active.
    ///
    /// Returns `None` if `member` is out of range, otherwise whether the whole
    /// entry was despawned by this call.
    pub fn despawn_member(&mut self, member: usize) -> Option<bool> {
        self.members.get_mut(member)?.active = false;
        if self.is_active() && self.members.iter().all(|m| !m.active) {
            self.despawn();
            return Some(true);
        }
        Some(false)
    }

    pub fn active_members(&self) -> usize {
        self.members.iter().filter(|m| m.active).count()
    }
}

impl Spawnable for PoolEntry {
    fn spawn(&mut self, position: Vec2, rotation: f32) {
        self.state = EntryState::Active;
        self.position = position;
        self.rotation = rotation;
        for m in self.members.iter_mut() {
            m.position = position + m.offset;
            m.active = true;
        }
    }

    fn despawn(&mut self) {
        self.state = EntryState::Inactive;
        for m in self.members.iter_mut() {
            m.active = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group_entry() -> PoolEntry {
        let t = SpawnTemplate::group(
            "cactus_group",
            [Vec2::new(0.0, 0.0), Vec2::new(1.5, 0.0), Vec2::new(3.0, 0.5)],
        );
        PoolEntry::new(TemplateId(0), &t, 2.0)
    }

    #[test]
    fn new_entry_is_inactive() {
        let e = group_entry();
        assert_eq!(e.state, EntryState::Inactive);
        assert_eq!(e.members.len(), 3);
        assert_eq!(e.active_members(), 0);
        assert_eq!(e.speed, 2.0);
    }

    #[test]
    fn spawn_places_members_at_offsets() {
        let mut e = group_entry();
        e.spawn(Vec2::new(10.0, -1.0), 0.0);
        assert!(e.is_active());
        assert_eq!(e.active_members(), 3);
        assert_eq!(e.members[1].position, Vec2::new(11.5, -1.0));
        assert_eq!(e.members[2].position, Vec2::new(13.0, -0.5));
    }

    #[test]
    fn group_despawns_when_last_member_goes() {
        let mut e = group_entry();
        e.spawn(Vec2::ZERO, 0.0);
        assert_eq!(e.despawn_member(0), Some(false));
        assert_eq!(e.despawn_member(2), Some(false));
        assert!(e.is_active());
        assert_eq!(e.despawn_member(1), Some(true));
        assert!(!e.is_active());
    }

    #[test]
    fn despawn_member_out_of_range() {
        let mut e = group_entry();
        assert_eq!(e.despawn_member(7), None);
    }

    #[test]
    fn single_entry_toggles() {
        let t = SpawnTemplate::single("cloud");
        let mut e = PoolEntry::new(TemplateId(1), &t, 0.0);
        e.spawn(Vec2::new(4.0, 2.0), 90.0);
        assert!(e.is_active());
        assert_eq!(e.rotation, 90.0);
        e.despawn();
        assert!(!e.is_active());
        assert!(!t.is_group());
    }
}
