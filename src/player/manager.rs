//! The player manager: entity-ID allocation, visibility tracking, broadcast
//! fan-out, and the item-entity registry (spec.md §4.8).

use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use uuid::Uuid;

use crate::player::inventory::Slot;
use crate::player::state::Player;

/// Chebyshev chunk distance beyond which a pair stops tracking each other
/// (spec.md §3 "Visibility relation").
pub type ViewDistance = i32;

/// A dropped item in the world (spec.md §3 "Item entity").
#[derive(Debug, Clone)]
pub struct ItemEntity {
    pub entity_id: i32,
    pub slot: Slot,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub velocity: (i16, i16, i16),
    pub spawn_tick: i64,
}

const PICKUP_DELAY_TICKS: i64 = 10;
const ITEM_EXPIRY_TICKS: i64 = 6000;
const PURGE_INTERVAL_TICKS: i64 = 600;
const RESYNC_INTERVAL_TICKS: i64 = 400;
const PHYSICS_MAX_TICKS: u32 = 80;
const GRAVITY: f64 = 0.04;
const DRAG: f64 = 0.98;

/// Visibility and lifecycle fan-out effects, implemented by the play-phase
/// layer (which knows packet formats the manager deliberately does not —
/// spec.md §9 models the registries and generator the same way: the manager
/// is parameterized over a capability rather than depending on the wire
/// format directly).
pub trait VisibilityEffects: Send + Sync {
    fn send_add_tab_list(&self, target: &Player, subject: &Player);
    fn send_remove_tab_list(&self, target: &Player, subject: &Player);
    fn send_spawn(&self, target: &Player, subject: &Player);
    fn send_destroy(&self, target: &Player, subject: &Player);
    fn send_absolute_teleport(&self, target: &Player, subject: &Player);
    fn send_item_spawn(&self, target: &Player, item: &ItemEntity);
    fn send_item_destroy(&self, target: &Player, item_id: i32);
    fn send_item_collect(&self, collector: i32, item_id: i32);
}

pub struct PlayerManager {
    effects: Arc<dyn VisibilityEffects>,
    view_distance: ViewDistance,
    next_entity_id: AtomicI32,
    players: RwLock<HashMap<i32, Arc<Player>>>,
    by_uuid: RwLock<HashMap<Uuid, i32>>,
    items: Mutex<HashMap<i32, ItemEntity>>,
    tick_counter: Mutex<i64>,
}

impl PlayerManager {
    #[must_use]
    pub fn new(effects: Arc<dyn VisibilityEffects>, view_distance: ViewDistance) -> Self {
        PlayerManager {
            effects,
            view_distance,
            next_entity_id: AtomicI32::new(1),
            players: RwLock::new(HashMap::new()),
            by_uuid: RwLock::new(HashMap::new()),
            items: Mutex::new(HashMap::new()),
            tick_counter: Mutex::new(0),
        }
    }

    #[must_use]
    pub fn allocate_entity_id(&self) -> i32 {
        self.next_entity_id.fetch_add(1, Ordering::Relaxed)
    }

    #[must_use]
    pub fn get(&self, entity_id: i32) -> Option<Arc<Player>> {
        self.players.read().get(&entity_id).cloned()
    }

    #[must_use]
    pub fn get_by_uuid(&self, uuid: &Uuid) -> Option<Arc<Player>> {
        let entity_id = *self.by_uuid.read().get(uuid)?;
        self.get(entity_id)
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.players.read().len()
    }

    #[must_use]
    pub fn view_distance(&self) -> ViewDistance {
        self.view_distance
    }

    /// Snapshot of every currently connected player, for join-time fan-out.
    #[must_use]
    pub fn all(&self) -> Vec<Arc<Player>> {
        self.players.read().values().cloned().collect()
    }

    /// Inserts `player`, then — without holding the players lock for the
    /// duration — replays tab-list and spawn fan-out in both directions and
    /// mirrors every live item entity to the newcomer (spec.md §4.8 `add`).
    pub fn add(&self, player: Arc<Player>) {
        let others: Vec<Arc<Player>> = {
            let mut players = self.players.write();
            let mut by_uuid = self.by_uuid.write();
            let others = players.values().cloned().collect();
            players.insert(player.entity_id, Arc::clone(&player));
            by_uuid.insert(player.uuid, player.entity_id);
            others
        };

        for other in &others {
            self.effects.send_add_tab_list(other, &player);
            self.effects.send_add_tab_list(&player, other);
            if in_range(self.view_distance, other.position().chunk(), player.position().chunk())
            {
                self.effects.send_spawn(other, &player);
                self.effects.send_spawn(&player, other);
                other.start_tracking(player.entity_id);
                player.start_tracking(other.entity_id);
            }
        }

        let items: Vec<ItemEntity> = self.items.lock().values().cloned().collect();
        for item in &items {
            self.effects.send_item_spawn(&player, item);
        }
    }

    /// Removes `player` and emits the symmetric remove-player / destroy-
    /// entity fan-out.
    pub fn remove(&self, entity_id: i32) {
        let removed = {
            let mut players = self.players.write();
            let removed = players.remove(&entity_id);
            if let Some(p) = &removed {
                self.by_uuid.write().remove(&p.uuid);
            }
            removed
        };
        let Some(removed) = removed else { return };

        for other in self.players.read().values() {
            self.effects.send_remove_tab_list(other, &removed);
            if other.is_tracking(entity_id) {
                self.effects.send_destroy(other, &removed);
                other.stop_tracking(entity_id);
            }
        }
    }

    pub fn broadcast(&self, packet_id: i32, payload: &[u8]) {
        for player in self.players.read().values() {
            player.send(packet_id, payload);
        }
    }

    pub fn broadcast_except(&self, packet_id: i32, payload: &[u8], excluded_id: i32) {
        for player in self.players.read().values() {
            if player.entity_id != excluded_id {
                player.send(packet_id, payload);
            }
        }
    }

    pub fn broadcast_to_trackers(&self, packet_id: i32, payload: &[u8], subject_id: i32) {
        for player in self.players.read().values() {
            if player.entity_id != subject_id && player.is_tracking(subject_id) {
                player.send(packet_id, payload);
            }
        }
    }

    /// Re-evaluates every pair involving `moved` against the view distance,
    /// emitting spawn or destroy pairs on range transitions (spec.md §4.8).
    pub fn update_tracking(&self, moved_id: i32) {
        let Some(moved) = self.get(moved_id) else { return };
        let moved_chunk = moved.position().chunk();

        for other in self.players.read().values() {
            if other.entity_id == moved_id {
                continue;
            }
            let now_in_range = in_range(self.view_distance, moved_chunk, other.position().chunk());
            let was_tracking = other.is_tracking(moved_id);

            if now_in_range && !was_tracking {
                self.effects.send_spawn(other, &moved);
                self.effects.send_spawn(&moved, other);
                other.start_tracking(moved_id);
                moved.start_tracking(other.entity_id);
            } else if !now_in_range && was_tracking {
                self.effects.send_destroy(other, &moved);
                self.effects.send_destroy(&moved, other);
                other.stop_tracking(moved_id);
                moved.stop_tracking(other.entity_id);
            }
        }
    }

    /// Allocates an ID, simulates the landing trajectory, and spawns an
    /// item entity thrown from `(x, y, z)` toward `yaw` (spec.md §4.8,
    /// §9 "Item-entity landing simulation"). `ground_at` returns the height
    /// of the first solid block beneath a column.
    pub fn spawn_item_entity(
        &self,
        slot: Slot,
        x: f64,
        y: f64,
        z: f64,
        yaw: f32,
        ground_at: impl Fn(f64, f64) -> f64,
    ) -> i32 {
        let entity_id = self.allocate_entity_id();
        let yaw_rad = (yaw as f64).to_radians();
        let horizontal = 0.3;
        let vx = -yaw_rad.sin() * horizontal;
        let vz = yaw_rad.cos() * horizontal;
        let vy = 0.1;

        let (rest_x, rest_y, rest_z) = simulate_landing(x, y, z, vx, vy, vz, &ground_at);

        let velocity = (
            (vx * 8000.0) as i16,
            (vy * 8000.0) as i16,
            (vz * 8000.0) as i16,
        );

        let item = ItemEntity {
            entity_id,
            slot,
            x: rest_x,
            y: rest_y,
            z: rest_z,
            velocity,
            spawn_tick: *self.tick_counter.lock(),
        };

        for player in self.players.read().values() {
            self.effects.send_item_spawn(player, &item);
        }
        self.items.lock().insert(entity_id, item);
        entity_id
    }

    /// Attempts to pick up nearby, pickable item entities into `player`'s
    /// inventory (spec.md §4.8 `try_pickup_items`). Returns whether
    /// anything was absorbed (partially or fully), so the caller knows to
    /// resend window-items.
    pub fn try_pickup_items(&self, player: &Player) -> bool {
        let now = *self.tick_counter.lock();
        let (px, py, pz) = {
            let pos = player.position();
            (pos.x, pos.y + 0.5, pos.z)
        };

        let candidates: Vec<i32> = {
            let items = self.items.lock();
            items
                .values()
                .filter(|item| {
                    now - item.spawn_tick >= PICKUP_DELAY_TICKS
                        && distance(px, py, pz, item.x, item.y, item.z) <= 2.5
                })
                .map(|item| item.entity_id)
                .collect()
        };

        let mut absorbed_any = false;
        for item_id in candidates {
            let mut items = self.items.lock();
            let Some(item) = items.get(&item_id).cloned() else {
                continue;
            };

            let leftover = player.inventory.write().add_item(item.slot);
            if leftover.is_empty() {
                items.remove(&item_id);
                drop(items);
                self.effects.send_item_collect(player.entity_id, item_id);
                self.broadcast_item_destroy(item_id);
                absorbed_any = true;
            } else if leftover.count != item.slot.count {
                if let Some(stored) = items.get_mut(&item_id) {
                    stored.slot = leftover;
                }
                absorbed_any = true;
            }
        }
        absorbed_any
    }

    fn broadcast_item_destroy(&self, item_id: i32) {
        for player in self.players.read().values() {
            self.effects.send_item_destroy(player, item_id);
        }
    }

    /// Advances the tick counter; every 600 ticks purges expired items,
    /// every 400 ticks resyncs tracked players with an absolute teleport
    /// (spec.md §4.8 `tick`).
    pub fn tick(&self) {
        let now = {
            let mut counter = self.tick_counter.lock();
            *counter += 1;
            *counter
        };

        if now % PURGE_INTERVAL_TICKS == 0 {
            let expired: Vec<i32> = {
                let items = self.items.lock();
                items
                    .values()
                    .filter(|item| now - item.spawn_tick > ITEM_EXPIRY_TICKS)
                    .map(|item| item.entity_id)
                    .collect()
            };
            for item_id in expired {
                self.items.lock().remove(&item_id);
                self.broadcast_item_destroy(item_id);
            }
        }

        if now % RESYNC_INTERVAL_TICKS == 0 {
            let players = self.players.read();
            for subject in players.values() {
                for viewer in players.values() {
                    if viewer.entity_id != subject.entity_id && viewer.is_tracking(subject.entity_id)
                    {
                        self.effects.send_absolute_teleport(viewer, subject);
                    }
                }
            }
        }
    }
}

fn in_range(view_distance: ViewDistance, a: (i32, i32), b: (i32, i32)) -> bool {
    (a.0 - b.0).abs().max((a.1 - b.1).abs()) <= view_distance
}

fn distance(x1: f64, y1: f64, z1: f64, x2: f64, y2: f64, z2: f64) -> f64 {
    ((x1 - x2).powi(2) + (y1 - y2).powi(2) + (z1 - z2).powi(2)).sqrt()
}

/// Simulates gravity -> move -> drag, one tick at a time, until the item
/// settles on the ground or `PHYSICS_MAX_TICKS` elapses (spec.md §9).
fn simulate_landing(
    x: f64,
    y: f64,
    z: f64,
    vx: f64,
    vy: f64,
    vz: f64,
    ground_at: &impl Fn(f64, f64) -> f64,
) -> (f64, f64, f64) {
    let (mut px, mut py, mut pz) = (x, y, z);
    let (mut vx, mut vy, mut vz) = (vx, vy, vz);

    for _ in 0..PHYSICS_MAX_TICKS {
        vy -= GRAVITY;
        px += vx;
        py += vy;
        pz += vz;
        vx *= DRAG;
        vy *= DRAG;
        vz *= DRAG;

        if vy < 0.0 && py <= ground_at(px, pz) {
            py = ground_at(px, pz);
            break;
        }
    }
    (px, py, pz)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[derive(Default)]
    struct CountingEffects {
        spawns: AtomicUsize,
        destroys: AtomicUsize,
    }

    impl VisibilityEffects for CountingEffects {
        fn send_add_tab_list(&self, _target: &Player, _subject: &Player) {}
        fn send_remove_tab_list(&self, _target: &Player, _subject: &Player) {}
        fn send_spawn(&self, _target: &Player, _subject: &Player) {
            self.spawns.fetch_add(1, Ordering::SeqCst);
        }
        fn send_destroy(&self, _target: &Player, _subject: &Player) {
            self.destroys.fetch_add(1, Ordering::SeqCst);
        }
        fn send_absolute_teleport(&self, _target: &Player, _subject: &Player) {}
        fn send_item_spawn(&self, _target: &Player, _item: &ItemEntity) {}
        fn send_item_destroy(&self, _target: &Player, _item_id: i32) {}
        fn send_item_collect(&self, _collector: i32, _item_id: i32) {}
    }

    struct NullSink;
    impl crate::player::state::PacketSink for NullSink {
        fn send_packet(&self, _id: i32, _payload: &[u8]) -> crate::error::Result<()> {
            Ok(())
        }
    }

    fn make_player(entity_id: i32, name: &str) -> Arc<Player> {
        Arc::new(Player::new(
            entity_id,
            Uuid::new_v4(),
            name.to_string(),
            Arc::new(NullSink),
        ))
    }

    #[test]
    fn add_spawns_both_directions_when_in_range() {
        let effects = Arc::new(CountingEffects::default());
        let manager = PlayerManager::new(effects.clone(), 8);

        let alice = make_player(1, "Alice");
        manager.add(alice.clone());

        let bob = make_player(2, "Bob");
        manager.add(bob.clone());

        assert_eq!(effects.spawns.load(Ordering::SeqCst), 2);
        assert!(alice.is_tracking(2));
        assert!(bob.is_tracking(1));
    }

    #[test]
    fn update_tracking_destroys_on_leaving_range() {
        let effects = Arc::new(CountingEffects::default());
        let manager = PlayerManager::new(effects.clone(), 2);

        let alice = make_player(1, "Alice");
        manager.add(alice.clone());
        let bob = make_player(2, "Bob");
        manager.add(bob.clone());
        assert_eq!(effects.spawns.load(Ordering::SeqCst), 2);

        bob.set_position(crate::player::state::Position {
            x: 1600.0,
            ..bob.position()
        });
        manager.update_tracking(2);

        assert_eq!(effects.destroys.load(Ordering::SeqCst), 2);
        assert!(!alice.is_tracking(2));
        assert!(!bob.is_tracking(1));
    }

    #[test]
    fn item_cannot_be_picked_up_before_delay() {
        let effects = Arc::new(CountingEffects::default());
        let manager = PlayerManager::new(effects, 8);
        let alice = make_player(1, "Alice");
        manager.add(alice.clone());

        let item_id = manager.spawn_item_entity(
            Slot {
                block_id: 1,
                count: 1,
                damage: 0,
            },
            0.0,
            64.0,
            0.0,
            0.0,
            |_x, _z| 64.0,
        );

        assert!(!manager.try_pickup_items(&alice));
        assert!(manager.items.lock().contains_key(&item_id));
    }

    #[test]
    fn item_picked_up_after_delay_merges_into_inventory() {
        let effects = Arc::new(CountingEffects::default());
        let manager = PlayerManager::new(effects, 8);
        let alice = make_player(1, "Alice");
        manager.add(alice.clone());

        manager.spawn_item_entity(
            Slot {
                block_id: 1,
                count: 1,
                damage: 0,
            },
            0.0,
            64.5,
            0.0,
            0.0,
            |_x, _z| 64.0,
        );

        for _ in 0..PICKUP_DELAY_TICKS {
            manager.tick();
        }

        assert!(manager.try_pickup_items(&alice));
        assert_eq!(alice.inventory.read().main[0].count, 1);
    }
}
