// Outbound HTTP clients for collaborators that live in other services.

pub mod rewards;
