//! Domain logic for the routing controller.

pub mod dijkstra;
pub mod paths;
pub mod topology;
