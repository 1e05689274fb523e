// Fake ports and a small harness shared by the use-case tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::types::{GameEvent, NpcSpawn, NpcSpawnKind, PlayerCommand};
use super::world::{CombatWorld, WorldPorts};
use crate::domain::ports::{Clock, KillHook, KilledMob, RewardSink, ViewRadius};
use crate::domain::systems::rewards::SharedRoll;
use crate::domain::tuning::Tuning;
use crate::domain::{CombatError, Loadout, MobTable, NpcId, PlayerId, Position};

pub const START_MS: u64 = 1_000_000;

/// Clock the test moves by hand. Clones share the same time.
#[derive(Clone)]
pub struct FixedClock(Arc<AtomicU64>);

impl FixedClock {
    pub fn new(now: u64) -> Self {
        Self(Arc::new(AtomicU64::new(now)))
    }

    pub fn set(&self, now: u64) {
        self.0.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, by: u64) {
        self.0.fetch_add(by, Ordering::SeqCst);
    }

    pub fn now(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

impl Clock for FixedClock {
    fn now_ms(&self) -> u64 {
        self.now()
    }
}

#[derive(Clone, Default)]
pub struct RecordingRewards {
    rewards: Arc<Mutex<Vec<(PlayerId, KilledMob, SharedRoll)>>>,
    notices: Arc<Mutex<Vec<(PlayerId, i32, u32)>>>,
}

impl RecordingRewards {
    pub fn rewards(&self) -> Vec<(PlayerId, KilledMob, SharedRoll)> {
        self.rewards.lock().unwrap().clone()
    }

    pub fn notices(&self) -> Vec<(PlayerId, i32, u32)> {
        self.notices.lock().unwrap().clone()
    }

    pub fn rewarded_players(&self) -> Vec<PlayerId> {
        self.rewards().iter().map(|reward| reward.0).collect()
    }

    pub fn notified_players(&self) -> Vec<PlayerId> {
        self.notices().iter().map(|notice| notice.0).collect()
    }
}

impl RewardSink for RecordingRewards {
    fn give_kill_reward(&mut self, player_id: PlayerId, mob: &KilledMob, roll: SharedRoll) {
        self.rewards.lock().unwrap().push((player_id, *mob, roll));
    }

    fn notify_mob_killed(&mut self, player_id: PlayerId, mob_type: i32, qualifying_roll: u32) {
        self.notices
            .lock()
            .unwrap()
            .push((player_id, mob_type, qualifying_roll));
    }
}

#[derive(Clone, Default)]
pub struct RecordingHook {
    kills: Arc<Mutex<Vec<(Option<PlayerId>, NpcId)>>>,
}

impl RecordingHook {
    pub fn kills(&self) -> Vec<(Option<PlayerId>, NpcId)> {
        self.kills.lock().unwrap().clone()
    }
}

impl KillHook for RecordingHook {
    fn on_kill(&mut self, killer: Option<PlayerId>, mob: &KilledMob) {
        self.kills.lock().unwrap().push((killer, mob.npc_id));
    }
}

pub struct TestWorld {
    pub world: CombatWorld,
    pub clock: FixedClock,
    pub rewards: RecordingRewards,
}

impl TestWorld {
    pub fn new(seed: u64) -> Self {
        let clock = FixedClock::new(START_MS);
        let rewards = RecordingRewards::default();
        let world = CombatWorld::new(
            MobTable::builtin(),
            Tuning::default(),
            ChaCha8Rng::seed_from_u64(seed),
            WorldPorts {
                clock: Box::new(clock.clone()),
                view: Box::new(ViewRadius { radius: 8000.0 }),
                rewards: Box::new(rewards.clone()),
            },
        );
        Self {
            world,
            clock,
            rewards,
        }
    }

    pub fn join(&mut self, player_id: PlayerId, position: Position) {
        self.world
            .handle(GameEvent::Join {
                player_id,
                loadout: Loadout::default(),
                position,
            })
            .expect("join never fails");
    }

    pub fn spawn_passive(&mut self, npc_id: NpcId, position: Position) {
        self.spawn(NpcSpawn {
            npc_id,
            npc_type: 900,
            position,
            kind: NpcSpawnKind::Passive,
            path: Vec::new(),
            static_path: false,
        });
    }

    pub fn spawn_follower(&mut self, npc_id: NpcId, position: Position) {
        self.spawn(NpcSpawn {
            npc_id,
            npc_type: 901,
            position,
            kind: NpcSpawnKind::Follower,
            path: Vec::new(),
            static_path: false,
        });
    }

    pub fn spawn_mob_with_path(
        &mut self,
        npc_id: NpcId,
        mob_type: i32,
        path: Vec<Position>,
        static_path: bool,
    ) {
        self.spawn(NpcSpawn {
            npc_id,
            npc_type: mob_type,
            position: Position::default(),
            kind: NpcSpawnKind::Mob {
                mob_type,
                group_leader: None,
            },
            path,
            static_path,
        });
    }

    pub fn spawn_pack_member(&mut self, npc_id: NpcId, mob_type: i32, leader: Option<NpcId>) {
        self.spawn(NpcSpawn {
            npc_id,
            npc_type: mob_type,
            position: Position::default(),
            kind: NpcSpawnKind::Mob {
                mob_type,
                group_leader: leader,
            },
            path: Vec::new(),
            static_path: false,
        });
    }

    fn spawn(&mut self, spawn: NpcSpawn) {
        self.world
            .handle(GameEvent::SpawnNpc(spawn))
            .expect("spawn should succeed");
    }
}

pub fn spawn_mob(world: &mut CombatWorld, npc_id: NpcId, mob_type: i32, position: Position) {
    world
        .handle(GameEvent::SpawnNpc(NpcSpawn {
            npc_id,
            npc_type: mob_type,
            position,
            kind: NpcSpawnKind::Mob {
                mob_type,
                group_leader: None,
            },
            path: Vec::new(),
            static_path: false,
        }))
        .expect("spawn should succeed");
}

/// Point attack with a count that matches the ids.
pub fn attack_npcs(
    world: &mut CombatWorld,
    player_id: PlayerId,
    npc_ids: &[NpcId],
) -> Result<(), CombatError> {
    world.handle(GameEvent::Command {
        player_id,
        command: PlayerCommand::AttackNpcs {
            count: npc_ids.len(),
            npc_ids: npc_ids.to_vec(),
        },
    })
}
