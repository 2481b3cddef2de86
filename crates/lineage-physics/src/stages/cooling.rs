//! Gas cooling
//!
//! Cold gas accumulates from newly accreted halo mass on centrals:
//! `dColdGas = f_baryon * dMvir`. The accumulated reservoir rides along
//! through progenitor inheritance.

use linkme::distributed_slice;

use lineage_foundation::HaloType;

use crate::{GroupHalos, PhysicsStage, Result, StageContext, StageDescriptor, STAGES};

#[distributed_slice(STAGES)]
static COOLING: StageDescriptor = StageDescriptor {
    name: "cooling",
    doc: "cold gas from accreted mass on centrals",
    build: |params| {
        Box::new(Cooling {
            baryon_fraction: params.get_or("BaryonFraction", 0.15),
        })
    },
};

struct Cooling {
    baryon_fraction: f64,
}

impl PhysicsStage for Cooling {
    fn name(&self) -> &'static str {
        "cooling"
    }

    fn process_group(&self, _ctx: &StageContext, group: &mut GroupHalos<'_>) -> Result<()> {
        for i in 0..group.len() {
            let halo = group.halo(i);
            if halo.halo_type != HaloType::Central {
                continue;
            }
            let delta_mvir = halo.delta_mvir;
            // Mass loss does not add cold gas
            if delta_mvir <= 0.0 {
                continue;
            }
            if let Some(galaxy) = group.galaxy_mut(i) {
                galaxy.cold_gas += self.baryon_fraction * delta_mvir;
            }
        }
        Ok(())
    }
}
