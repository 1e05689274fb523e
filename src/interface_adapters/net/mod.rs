// Network adapter modules split by player sockets vs internal HTTP routes.

pub mod client;
pub mod internal;

pub use client::{outbound_serializer, ws_handler};
pub use internal::{
    follower_handler, group_handler, mob_attack_handler, session_handler, spawn_npc_handler,
};
