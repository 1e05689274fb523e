// Interface adapters: wire protocol, sockets, internal routes and outbound clients.

pub mod clients;
pub mod http;
pub mod net;
pub mod protocol;
pub mod sessions;
pub mod state;
pub mod utils;
