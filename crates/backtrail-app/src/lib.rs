// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod dropdown;
pub mod ids;
pub mod model;
pub mod sections;
pub mod state;

pub use dropdown::*;
pub use ids::*;
pub use model::*;
pub use sections::*;
pub use state::*;
