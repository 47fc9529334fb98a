//! Short-lived memory of tanks seen on radar or heard about over the radio.
//!
//! Every sighting (direct or relayed) refreshes an entry's expiry to
//! `tick + ttl - 1` on the receiver's own clock; an entry is dropped on the
//! first tick past its expiry.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::TankConfig;
use crate::snapshot::{Command, Message, Point, SensedTank, Snapshot, TankId};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackedEntity {
    pub id: TankId,
    pub x: f64,
    pub y: f64,
    pub angle: f64,
    pub speed: f64,
    pub energy: f64,
    pub expires_at_tick: u64,
}

impl TrackedEntity {
    pub fn new(sensed: &SensedTank, expires_at_tick: u64) -> Self {
        Self {
            id: sensed.id,
            x: sensed.x,
            y: sensed.y,
            angle: sensed.angle,
            speed: sensed.speed,
            energy: sensed.energy,
            expires_at_tick,
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn is_expired(&self, tick: u64) -> bool {
        tick > self.expires_at_tick
    }

    pub fn to_sensed(&self) -> SensedTank {
        SensedTank {
            id: self.id,
            x: self.x,
            y: self.y,
            angle: self.angle,
            speed: self.speed,
            energy: self.energy,
        }
    }
}

/// One id-keyed map of tracked tanks, iterated in ascending id order.
#[derive(Debug, Clone)]
pub struct Tracker {
    entries: BTreeMap<TankId, TrackedEntity>,
    ttl: u64,
}

impl Tracker {
    pub fn new(ttl: u64) -> Self {
        Self {
            entries: BTreeMap::new(),
            ttl: ttl.max(1),
        }
    }

    pub fn refresh(&mut self, sensed: &SensedTank, tick: u64) -> &TrackedEntity {
        let entity = TrackedEntity::new(sensed, tick.saturating_add(self.ttl - 1));
        self.entries.insert(sensed.id, entity);
        &self.entries[&sensed.id]
    }

    /// Drops expired entries; returns how many went.
    pub fn prune(&mut self, tick: u64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entity| !entity.is_expired(tick));
        before - self.entries.len()
    }

    pub fn get(&self, id: TankId) -> Option<&TrackedEntity> {
        self.entries.get(&id)
    }

    pub fn contains(&self, id: TankId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedEntity> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn first(&self) -> Option<&TrackedEntity> {
        self.entries.values().next()
    }

    /// The only tracked entity, if exactly one is tracked.
    pub fn sole(&self) -> Option<&TrackedEntity> {
        if self.entries.len() == 1 {
            self.first()
        } else {
            None
        }
    }

    pub fn nearest_to(&self, from: Point) -> Option<&TrackedEntity> {
        nearest(self.iter(), from)
    }
}

fn nearest<'a>(
    candidates: impl Iterator<Item = &'a TrackedEntity>,
    from: Point,
) -> Option<&'a TrackedEntity> {
    candidates.min_by(|a, b| {
        from.distance_to(a.position())
            .total_cmp(&from.distance_to(b.position()))
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TargetClaim {
    pub target: TankId,
    pub expires_at_tick: u64,
}

/// Enemy and ally trackers plus the allies' announced targets.
#[derive(Debug, Clone)]
pub struct SharedTrackers {
    pub enemies: Tracker,
    pub friendlies: Tracker,
    claims: BTreeMap<TankId, TargetClaim>,
    ttl: u64,
    self_report_interval: u64,
}

impl SharedTrackers {
    pub fn new(config: &TankConfig) -> Self {
        Self {
            enemies: Tracker::new(config.tracker_ttl_ticks),
            friendlies: Tracker::new(config.tracker_ttl_ticks),
            claims: BTreeMap::new(),
            ttl: config.tracker_ttl_ticks.max(1),
            self_report_interval: config.self_report_interval,
        }
    }

    /// Fold this tick's radar contacts and inbox into the trackers, relay
    /// direct sightings to allies, then drop whatever went stale.
    pub fn ingest(&mut self, snapshot: &Snapshot, tick: u64, command: &mut Command) {
        if let Some(enemy) = &snapshot.radar.enemy {
            let tracked = self.enemies.refresh(enemy, tick);
            command.send(Message::Enemy {
                enemy: tracked.to_sensed(),
            });
        }

        if let Some(ally) = &snapshot.radar.ally {
            let tracked = self.friendlies.refresh(ally, tick);
            command.send(Message::Friendly {
                friendly: tracked.to_sensed(),
            });
        }

        for message in &snapshot.radio.inbox {
            self.absorb(message, snapshot.id, tick);
        }

        if self.self_report_interval > 0 && tick % self.self_report_interval == 0 {
            command.send(Message::Friendly {
                friendly: SensedTank {
                    id: snapshot.id,
                    x: snapshot.x,
                    y: snapshot.y,
                    angle: snapshot.angle,
                    speed: 0.0,
                    energy: snapshot.energy,
                },
            });
        }

        self.prune(tick);
    }

    pub fn absorb(&mut self, message: &Message, own_id: TankId, tick: u64) {
        match message {
            Message::Enemy { enemy } => {
                self.enemies.refresh(enemy, tick);
            }
            Message::Friendly { friendly } if friendly.id != own_id => {
                self.friendlies.refresh(friendly, tick);
            }
            Message::Shooting { sender, target } if *sender != own_id => {
                self.claims.insert(
                    *sender,
                    TargetClaim {
                        target: *target,
                        expires_at_tick: tick.saturating_add(self.ttl - 1),
                    },
                );
            }
            _ => {}
        }
    }

    pub fn prune(&mut self, tick: u64) {
        self.enemies.prune(tick);
        self.friendlies.prune(tick);
        self.claims.retain(|_, claim| tick <= claim.expires_at_tick);
    }

    pub fn claim_of(&self, ally: TankId) -> Option<TankId> {
        self.claims.get(&ally).map(|claim| claim.target)
    }

    pub fn is_claimed(&self, enemy: TankId) -> bool {
        self.claims.values().any(|claim| claim.target == enemy)
    }

    /// Nearest enemy no ally has announced, else the nearest enemy.
    pub fn preferred_target(&self, from: Point) -> Option<&TrackedEntity> {
        nearest(self.enemies.iter().filter(|e| !self.is_claimed(e.id)), from)
            .or_else(|| self.enemies.nearest_to(from))
    }
}
