// Domain layer: core models and ports (interfaces). No HTTP or configuration concerns here.

pub mod calendar;
pub mod model;
pub mod ports;
