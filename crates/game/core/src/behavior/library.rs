//! Per-archetype behaviour profiles, built and validated once.

use arrayvec::ArrayVec;
use strum::IntoEnumIterator;

use crate::ability::{AbilityDef, AbilitySpec};
use crate::behavior::{PhaseCtx, PhaseHook, PhaseSpec, PhaseTable, TableError, TableKind, archetypes};
use crate::boss;
use crate::config::CombatConfig;
use crate::state::{AbilityId, Agent, Archetype, StateOwner, Vec2};

/// Velocity an archetype moves with during free-movement phases.
pub type Locomotion = fn(&mut PhaseCtx<'_>) -> Vec2;

/// Unvalidated static description of one archetype.
#[derive(Clone, Copy, Debug)]
pub struct Blueprint {
    pub archetype: Archetype,
    pub primary: &'static [PhaseSpec],
    pub abilities: &'static [AbilitySpec],
    pub locomotion: Locomotion,
    /// Runs once per tick before any machine, for observations that span
    /// phases (proximity timers, health latches).
    pub sensor: Option<PhaseHook>,
}

impl Blueprint {
    /// Built-in blueprint of `archetype`.
    pub fn standard(archetype: Archetype) -> Self {
        match archetype {
            Archetype::Melee => archetypes::melee::blueprint(),
            Archetype::Ranged => archetypes::ranged::blueprint(),
            Archetype::Sniper => archetypes::sniper::blueprint(),
            Archetype::Turret => archetypes::turret::blueprint(),
            Archetype::Mine => archetypes::support::mine(),
            Archetype::Drone => archetypes::support::drone(),
            Archetype::Healer => archetypes::support::healer(),
            Archetype::Dummy => archetypes::support::dummy(),
            Archetype::Brawler => boss::brawler::blueprint(),
            Archetype::HeavyGunner => boss::heavy_gunner::blueprint(),
            Archetype::EvasiveCaster => boss::evasive_caster::blueprint(),
        }
    }
}

/// Validated behaviour of one archetype.
#[derive(Clone, Debug)]
pub struct ArchetypeProfile {
    pub archetype: Archetype,
    pub primary: PhaseTable,
    pub abilities: ArrayVec<AbilityDef, { CombatConfig::MAX_ABILITIES }>,
    pub locomotion: Locomotion,
    pub sensor: Option<PhaseHook>,
}

impl ArchetypeProfile {
    /// # Errors
    ///
    /// The first [`TableError`] found in the primary table or any ability.
    pub fn build(blueprint: Blueprint) -> Result<Self, TableError> {
        let archetype = blueprint.archetype;
        let primary = PhaseTable::new(archetype.as_str(), TableKind::Primary, blueprint.primary)?;
        let mut abilities = ArrayVec::new();
        for spec in blueprint.abilities {
            let def = AbilityDef::build(*spec)?;
            if abilities.try_push(def).is_err() {
                return Err(TableError::TooManyAbilities {
                    archetype: archetype.as_str(),
                });
            }
        }
        Ok(Self {
            archetype,
            primary,
            abilities,
            locomotion: blueprint.locomotion,
            sensor: blueprint.sensor,
        })
    }

    pub fn ability(&self, id: AbilityId) -> Option<&AbilityDef> {
        self.abilities.iter().find(|def| def.spec.id == id)
    }

    /// Machine currently deciding the agent's movement and reactions: the
    /// lock holder, else a running ability that suppresses the primary, else
    /// the primary.
    pub fn controller(&self, agent: &Agent) -> StateOwner {
        if let Some(holder) = agent.lock_holder() {
            return holder;
        }
        agent
            .abilities
            .iter()
            .filter(|slot| !slot.is_idle())
            .find(|slot| {
                self.ability(slot.id)
                    .and_then(|def| def.table.phase(slot.machine.tag))
                    .is_some_and(|spec| spec.suppress_primary)
            })
            .map_or(StateOwner::Primary, |slot| StateOwner::Ability(slot.id))
    }

    /// Whether the primary cycle is paused this tick.
    pub fn primary_suppressed(&self, agent: &Agent) -> bool {
        matches!(self.controller(agent), StateOwner::Ability(_))
    }

    /// Current phase of one of the agent's machines.
    pub fn phase_of(&self, agent: &Agent, owner: StateOwner) -> Option<&'static PhaseSpec> {
        match owner {
            StateOwner::Primary => self.primary.phase(agent.primary.tag),
            StateOwner::Ability(id) => {
                let slot = agent.ability(id)?;
                self.ability(id)?.table.phase(slot.machine.tag)
            }
        }
    }
}

/// Every archetype's validated profile, indexed by archetype.
#[derive(Clone, Debug)]
pub struct PhaseLibrary {
    profiles: Vec<ArchetypeProfile>,
}

impl PhaseLibrary {
    /// Library of the built-in blueprints.
    ///
    /// # Errors
    ///
    /// Any authoring defect in the built-in tables.
    pub fn standard() -> Result<Self, TableError> {
        Self::from_blueprints(Archetype::iter().map(Blueprint::standard))
    }

    /// Builds a library from one blueprint per archetype. Later blueprints for
    /// the same archetype replace earlier ones.
    ///
    /// # Errors
    ///
    /// Table defects, or an archetype left without a blueprint.
    pub fn from_blueprints(
        blueprints: impl IntoIterator<Item = Blueprint>,
    ) -> Result<Self, TableError> {
        let mut slots: Vec<Option<ArchetypeProfile>> = Archetype::iter().map(|_| None).collect();
        for blueprint in blueprints {
            let index = blueprint.archetype.index();
            slots[index] = Some(ArchetypeProfile::build(blueprint)?);
        }

        let mut profiles = Vec::with_capacity(slots.len());
        for (archetype, slot) in Archetype::iter().zip(slots) {
            let profile = slot.ok_or(TableError::MissingArchetype {
                archetype: archetype.as_str(),
            })?;
            profiles.push(profile);
        }
        Ok(Self { profiles })
    }

    pub fn profile(&self, archetype: Archetype) -> &ArchetypeProfile {
        // Construction guarantees one profile per archetype, in index order.
        &self.profiles[archetype.index()]
    }

    pub fn profiles(&self) -> impl Iterator<Item = &ArchetypeProfile> {
        self.profiles.iter()
    }
}
