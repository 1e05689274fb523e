// Pure combat rules. Nothing in here reads the clock or touches a channel.

pub mod damage;
pub mod follower;
pub mod mob_state;
pub mod projectiles;
pub mod rewards;
pub mod suspicion;
