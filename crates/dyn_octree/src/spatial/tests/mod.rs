//! Scenario tests across the octree, the manager and the query layer

pub(crate) mod support;
