pub mod driving;
pub mod evasion;
pub mod gunnery;
pub mod scouting;

use tank_core::Behavior;

pub fn roster_ids() -> Vec<&'static str> {
    vec!["jamro", "patrol"]
}

pub fn describe_rosters() -> Vec<(&'static str, &'static str)> {
    vec![
        ("jamro", "Aggressive brawler: random drive, lead shots, ramming, bullet and wall evasion."),
        ("patrol", "Perimeter patroller: calibrates the origin, then loops the field edge while shooting."),
    ]
}

pub fn create_roster(id: &str) -> Option<Vec<Box<dyn Behavior>>> {
    match id {
        "jamro" => Some(jamro()),
        "patrol" => Some(patrol()),
        _ => None,
    }
}

/// Later entries override earlier ones, so safety guards come last.
fn jamro() -> Vec<Box<dyn Behavior>> {
    vec![
        Box::new(scouting::DiscoverOrigin),
        Box::new(scouting::AlwaysBeScanning),
        Box::new(gunnery::AlwaysBeShooting),
        Box::new(gunnery::CounterGunTurn),
        Box::new(driving::AlwaysBeDriving),
        Box::new(scouting::LockRadarOnNearbyEnemies),
        Box::new(driving::MoveRandomly),
        Box::new(gunnery::TrackLastKnownEnemy::new()),
        Box::new(gunnery::ShootAtVisibleTanks::new()),
        Box::new(driving::TryToMaintainDistance),
        Box::new(evasion::DodgeBullets),
        Box::new(driving::Ram),
        Box::new(evasion::AvoidCollidingWithWalls),
        Box::new(evasion::AvoidSelfCollision),
        Box::new(gunnery::AvoidShootingSelf),
    ]
}

fn patrol() -> Vec<Box<dyn Behavior>> {
    vec![
        Box::new(scouting::DiscoverOrigin),
        Box::new(scouting::AlwaysBeScanning),
        Box::new(gunnery::CounterGunTurn),
        Box::new(scouting::LockRadarOnNearbyEnemies),
        Box::new(driving::PatrolPerimeter::default()),
        Box::new(gunnery::TrackLastKnownEnemy::new()),
        Box::new(gunnery::ShootAtVisibleTanks::new()),
        Box::new(evasion::DodgeBullets),
        Box::new(evasion::AvoidCollidingWithWalls),
        Box::new(evasion::AvoidSelfCollision),
        Box::new(gunnery::AvoidShootingSelf),
    ]
}

#[cfg(test)]
pub(crate) mod fixtures {
    use tank_core::{Command, SensedTank, Snapshot, TankConfig, TankContext, TankId};

    pub fn context() -> TankContext {
        TankContext::new(TankConfig::default()).unwrap()
    }

    /// Context with the origin at (0, 0), so world and field coordinates agree.
    pub fn calibrated() -> TankContext {
        let mut ctx = context();
        ctx.autopilot.set_origin(0.0, 0.0);
        ctx
    }

    pub fn snapshot_at(x: f64, y: f64, heading: f64) -> Snapshot {
        Snapshot {
            id: 1,
            x,
            y,
            angle: heading,
            energy: 100.0,
            ..Snapshot::default()
        }
    }

    pub fn enemy(id: TankId, x: f64, y: f64) -> SensedTank {
        SensedTank {
            id,
            x,
            y,
            energy: 100.0,
            ..SensedTank::default()
        }
    }

    /// Run the pre-arbitration half of a tick.
    pub fn observe(ctx: &mut TankContext, snapshot: &Snapshot) -> Command {
        ctx.tick += 1;
        let mut command = Command::new();
        ctx.autopilot.update(snapshot);
        ctx.trackers.ingest(snapshot, ctx.tick, &mut command);
        command.drain_outbox();
        command
    }
}
