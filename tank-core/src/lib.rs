//! Tank core - inference and arbitration for a single battle tank.
//!
//! Each tick the host hands over a sensor [`Snapshot`]; the [`Tank`] derives
//! geometry, calibrates the battlefield origin, refreshes its trackers and
//! runs a priority-ordered list of behaviors into one [`Command`].

pub mod angle;
pub mod autopilot;
pub mod config;
pub mod constants;
pub mod derived;
pub mod engine;
pub mod error;
pub mod origin;
pub mod rng;
pub mod snapshot;
pub mod tank;
pub mod trackers;

pub use autopilot::{Autopilot, FireSolution, LeadShot};
pub use config::TankConfig;
pub use engine::{ArbitrationEngine, Behavior, BehaviorStats, PinnedPatch, Verdict};
pub use error::AutopilotError;
pub use origin::{Origin, OriginFinder};
pub use rng::SeededRng;
pub use snapshot::{Command, CommandPatch, Message, Point, SensedTank, Snapshot, TankId};
pub use tank::{Tank, TankContext};
pub use trackers::{SharedTrackers, TrackedEntity};
