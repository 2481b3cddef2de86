//! Orphan mergers
//!
//! Counts each orphan's merge clock down by the step it just took. When
//! the clock runs out the orphan's baryons are absorbed by the group
//! central and the record is flagged merged; the flush then drops it and
//! back-patches its earlier-snapshot counterpart.

use linkme::distributed_slice;
use tracing::trace;

use lineage_foundation::{merge_clock_unset, HaloType};

use crate::{GroupHalos, PhysicsStage, Result, StageContext, StageDescriptor, STAGES};

#[distributed_slice(STAGES)]
static MERGERS: StageDescriptor = StageDescriptor {
    name: "mergers",
    doc: "orphan absorption into the group central on clock expiry",
    build: |_params| Box::new(Mergers),
};

struct Mergers;

impl PhysicsStage for Mergers {
    fn name(&self) -> &'static str {
        "mergers"
    }

    fn process_group(&self, ctx: &StageContext, group: &mut GroupHalos<'_>) -> Result<()> {
        for i in 0..group.len() {
            let halo = group.halo(i);
            if halo.halo_type != HaloType::Orphan || i == ctx.central {
                continue;
            }
            if merge_clock_unset(halo.merge_clock) {
                continue;
            }
            let elapsed = halo.dt.max(0.0);
            if halo.merge_clock > elapsed {
                group.set_merge_clock(i, halo.merge_clock - elapsed);
                continue;
            }

            let Some(satellite) = group.galaxy(i).cloned() else {
                continue;
            };
            if let Some(central) = group.galaxy_mut(ctx.central) {
                central.cold_gas += satellite.cold_gas;
                central.hot_gas += satellite.hot_gas;
                central.ejected_gas += satellite.ejected_gas;
                central.stellar_mass += satellite.stellar_mass;
                central.bulge_mass += satellite.stellar_mass;
                central.black_hole_mass += satellite.black_hole_mass;
                central.metals_cold += satellite.metals_cold;
                central.metals_stellar += satellite.metals_stellar;
            }
            trace!(record = i, central = ctx.central, root = %ctx.root, "orphan merged");
            group.mark_merged(i, ctx.central);
        }
        Ok(())
    }
}
