//! Physical and calibration constants shared by the components.

use webdice_core::state::FloatValue;

pub use webdice_core::parameters::CARBON_PER_CO2;

/// CO2 mass per unit carbon mass
pub const CO2_PER_CARBON: FloatValue = 44.0 / 12.0;

/// Smallest atmospheric carbon mass (GtC) admitted to the forcing logarithm
pub const MIN_CARBON_MASS: FloatValue = 1e-9;

/// Fraction of land use emissions retained each period
pub const LAND_USE_RETENTION_DICE_2007: FloatValue = 0.9;
pub const LAND_USE_RETENTION_DICE_2010: FloatValue = 0.8;

/// Decay in the DICE2010 productivity growth curve (per yr)
pub const PRODUCTIVITY_GROWTH_DAMPING: FloatValue = 0.002;

/// Small offset keeping the Ramsey discount exponent finite at period 0
pub const RAMSEY_TIME_OFFSET: FloatValue = 1e-6;

// BEAM carbonate chemistry
/// Atmosphere to upper ocean exchange rate (per yr)
pub const BEAM_K_A: FloatValue = 0.2;
/// Upper to lower ocean exchange rate (per yr)
pub const BEAM_K_D: FloatValue = 0.05;
/// Lower to upper ocean exchange rate (per yr)
pub const BEAM_K_D_RETURN: FloatValue = 0.001;
/// First dissociation constant of carbonic acid
pub const BEAM_K_1: FloatValue = 8e-7;
/// Second dissociation constant of carbonic acid
pub const BEAM_K_2: FloatValue = 4.53e-10;
/// Ratio of atmosphere to ocean carbon at equilibrium for a neutral ocean
pub const BEAM_A: FloatValue = 142.349;
/// Floor for the hydrogen ion concentration
pub const BEAM_MIN_H: FloatValue = 1e-12;

// Weitzman tipping point damages
pub const TIPPING_SCALE_LOW: FloatValue = 20.46;
pub const TIPPING_SCALE_HIGH: FloatValue = 6.081;
pub const TIPPING_EXPONENT_HIGH: FloatValue = 6.754;

/// Willingness to pay for incommensurable environmental goods
pub const INCOMMENSURABLE_C25D: FloatValue = 1.4771e-05;

/// Exponent bounding DICE2013 damages below gross output
pub const DICE_2013_DAMAGES_BOUND_EXPONENT: i32 = 10;
