//! Exogenous schedules that depend only on the period index.
//!
//! Policy schedules are laid out in blocks of five periods: the first block
//! covers the years up to 2050, the next two blocks 2100 and 2150, and the final
//! block the rest of the horizon.

use crate::parameters::ModelParameters;
use crate::state::FloatValue;

/// Number of periods per policy schedule block.
pub const SCHEDULE_BLOCK: usize = 5;

/// Periods over which non-CO2 forcing ramps to its long-run value.
const FORCING_RAMP_PERIODS: usize = 11;

fn block(period: usize) -> (usize, FloatValue) {
    let index = (period / SCHEDULE_BLOCK).min(3);
    let offset = period - index * SCHEDULE_BLOCK;
    (index, offset as FloatValue)
}

/// Treaty emissions cap as a fraction of period-0 industrial emissions.
pub fn emissions_cap(parameters: &ModelParameters, period: usize) -> FloatValue {
    match block(period).0 {
        0 => 1.0,
        1 => 1.0 - parameters.e2050,
        2 => 1.0 - parameters.e2100,
        _ => 1.0 - parameters.e2150,
    }
}

/// User carbon tax ($/tC), linear within each block.
///
/// The final block keeps the slope of the 2100 to 2150 block.
pub fn carbon_tax(parameters: &ModelParameters, period: usize) -> FloatValue {
    let c = [
        0.0,
        parameters.c2050,
        parameters.c2100,
        parameters.c2150,
        parameters.cmax,
    ];
    let (index, offset) = block(period);
    let step = match index {
        3 => (c[3] - c[2]) / SCHEDULE_BLOCK as FloatValue,
        k => (c[k + 1] - c[k]) / SCHEDULE_BLOCK as FloatValue,
    };
    c[index] + step * offset
}

/// Fraction of emissions inside the control regime.
///
/// Participation only varies under a treaty; otherwise every emitter participates.
pub fn participation(parameters: &ModelParameters, period: usize) -> FloatValue {
    if !parameters.treaty {
        return 1.0;
    }
    let p = [
        parameters.p2050,
        parameters.p2050,
        parameters.p2100,
        parameters.p2150,
        parameters.pmax,
    ];
    let (index, offset) = block(period);
    p[index + 1] + (p[index] - p[index + 1]) * (-0.25 * offset).exp()
}

/// Forcing from non-CO2 greenhouse gases (W/m^2).
pub fn forcing_ghg(parameters: &ModelParameters, period: usize) -> FloatValue {
    if period < FORCING_RAMP_PERIODS {
        parameters.forcing_ghg_init
            + 0.1 * (parameters.forcing_ghg_future - parameters.forcing_ghg_init) * period as FloatValue
    } else {
        parameters.forcing_ghg_future
    }
}

/// Land use emissions (GtC/yr) decaying geometrically from their period-0 value.
pub fn land_use_emissions(
    parameters: &ModelParameters,
    retention: FloatValue,
    period: usize,
) -> FloatValue {
    parameters.emissions_deforest_init * retention.powi(period as i32)
}
