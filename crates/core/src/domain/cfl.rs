//! `SetTimestepCFL`: choose `dt` from the CFL condition (spec.md §4.2
//! "`dt = min(Cmin*dx/(|u|+|v|), Cmin*dz/|w|)`").

use crate::core_types::Seconds;
use crate::domain::domain::Domain;
use crate::domain::manipulator::DomainManipulator;
use crate::error::Result;
use nalgebra::{Vector2, Vector3};

pub struct SetTimestepCfl {
    /// Courant number ceiling, `Cmin` in spec.md §4.2.
    pub cmin: f64,
}

impl SetTimestepCfl {
    #[must_use]
    pub fn new(cmin: f64) -> Self {
        SetTimestepCfl { cmin }
    }
}

impl DomainManipulator for SetTimestepCfl {
    fn name(&self) -> &'static str {
        "SetTimestepCFL"
    }

    fn run(&self, domain: &mut Domain) -> Result<()> {
        let dt = domain
            .cells
            .iter()
            .map(|cell| {
                // Net 3-D wind as a single vector, the same way `demo-bevy`'s
                // physics reads split directional fields into one
                // `Vector3`; horiz/vert CFL limits come from its planar and
                // z components rather than re-deriving them from six scalars.
                let net_wind = Vector3::new(
                    cell.met.u_plus_speed.value() - cell.met.u_minus_speed.value(),
                    cell.met.v_plus_speed.value() - cell.met.v_minus_speed.value(),
                    cell.met.w_plus_speed.value() - cell.met.w_minus_speed.value(),
                );
                let horiz_speed = Vector2::new(net_wind.x, net_wind.y).norm().max(1e-9);
                let vert_speed = net_wind.z.abs().max(1e-9);
                let horiz_limit = self.cmin * cell.dx.value().min(cell.dy.value()) / horiz_speed;
                let vert_limit = self.cmin * cell.dz.value() / vert_speed;
                horiz_limit.min(vert_limit)
            })
            .fold(f64::MAX, f64::min);

        domain.dt = Seconds::new(if dt.is_finite() { dt } else { 1.0 });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{Meters, Polygon, Rect};
    use crate::grid::{Cell, Emissions};
    use crate::mechanism::SimpleChem;
    use std::sync::Arc;

    #[test]
    fn dt_shrinks_as_wind_speed_grows() {
        let poly = Polygon::from_rect(Rect::new(0.0, 0.0, 100.0, 100.0));
        let mut slow = Cell::new(0, poly.clone(), 0, Meters::new(50.0), 1);
        slow.met.u_plus_speed = crate::core_types::MetersPerSecond::new(1.0);
        let mut fast = Cell::new(0, poly, 0, Meters::new(50.0), 1);
        fast.met.u_plus_speed = crate::core_types::MetersPerSecond::new(10.0);

        let mut slow_domain = Domain::new(vec![slow], Arc::new(SimpleChem::new()), Emissions::default());
        let mut fast_domain = Domain::new(vec![fast], Arc::new(SimpleChem::new()), Emissions::default());
        let manipulator = SetTimestepCfl::new(0.5);
        manipulator.run(&mut slow_domain).unwrap();
        manipulator.run(&mut fast_domain).unwrap();
        assert!(fast_domain.dt.value() < slow_domain.dt.value());
    }
}
