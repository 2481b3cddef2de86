//! Star formation
//!
//! Converts a fixed fraction of the cold-gas reservoir into stars each
//! step and records the rate over the step that produced it. Runs on any
//! record still holding a payload, so satellites keep forming stars from
//! the gas they brought in.

use linkme::distributed_slice;

use crate::{GroupHalos, PhysicsStage, Result, StageContext, StageDescriptor, STAGES};

#[distributed_slice(STAGES)]
static STARFORMATION: StageDescriptor = StageDescriptor {
    name: "starformation",
    doc: "fixed-efficiency conversion of cold gas into stars",
    build: |params| {
        Box::new(StarFormation {
            efficiency: params.get_or("SfrEfficiency", 0.05),
        })
    },
};

struct StarFormation {
    efficiency: f64,
}

impl PhysicsStage for StarFormation {
    fn name(&self) -> &'static str {
        "starformation"
    }

    fn process_group(&self, _ctx: &StageContext, group: &mut GroupHalos<'_>) -> Result<()> {
        for i in 0..group.len() {
            let dt = group.halo(i).dt;
            let Some(galaxy) = group.galaxy_mut(i) else {
                continue;
            };
            let formed = self.efficiency * galaxy.cold_gas;
            if formed <= 0.0 {
                galaxy.sfr = 0.0;
                continue;
            }
            galaxy.cold_gas -= formed;
            galaxy.stellar_mass += formed;
            galaxy.sfr = if dt > 0.0 { formed / dt } else { 0.0 };
        }
        Ok(())
    }
}
