//! Variant selectors for the submodel families.
//!
//! Each family is a closed set of variants. Selectors are resolved from their
//! string names when a scenario is constructed; an unknown name is a
//! configuration error naming the family and the accepted values.

use crate::errors::DiceError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Defines a selector enum with a canonical name per variant and optional aliases.
///
/// The generated type serialises as its canonical name and deserialises from the
/// canonical name or any alias.
macro_rules! define_selector {
    (
        $(#[$meta:meta])*
        $ty:ident, family = $family:expr,
        {
            $(
                $(#[$vmeta:meta])*
                $variant:ident => $name:literal $(| $alias:literal)*
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $ty {
            $(
                $(#[$vmeta])*
                $variant,
            )+
        }

        impl $ty {
            /// All variants in declaration order.
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            /// Canonical configuration name of the variant.
            pub fn name(&self) -> &'static str {
                match self {
                    $($ty::$variant => $name,)+
                }
            }
        }

        impl FromStr for $ty {
            type Err = DiceError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name $(| $alias)* => Ok($ty::$variant),)+
                    other => Err(DiceError::UnknownVariant {
                        family: $family,
                        name: other.to_string(),
                        expected: [$($name),+].join(", "),
                    }),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }

        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.name())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let name = String::deserialize(deserializer)?;
                name.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

define_selector!(
    /// Productivity, population and gross output
    ProductivityVariant, family = "productivity",
    {
        /// Exponential decline curves for intensity and TFP growth
        Dice2007 => "dice_2007",
        /// Self-referential recurrences on the previous period
        Dice2010 => "dice_2010",
        /// DICE2013 intensity, TFP and backstop curves, population in billions
        Dice2013 => "dice_2013",
        /// DICE2010 productivity with the simpler DICE2013 backstop curve
        DiceBackstop2013 => "dice_backstop_2013",
    }
);

define_selector!(
    /// Control rate and emissions
    EmissionsVariant, family = "emissions",
    {
        /// Land use emissions decline by 10% per period
        Dice2007 => "dice_2007",
        /// Land use emissions decline by 20% per period
        Dice2010 => "dice_2010" | "dice_2013",
    }
);

define_selector!(
    /// Carbon reservoirs and radiative forcing
    CarbonVariant, family = "carbon",
    {
        /// Fixed linear transfer matrix
        Dice => "dice" | "dice_2007" | "dice_2010" | "dice_2013",
        /// Sub-stepped BEAM with carbonate chemistry
        Beam => "beam" | "beam_carbon",
    }
);

define_selector!(
    /// Atmosphere and lower ocean temperature
    TemperatureVariant, family = "temperature",
    {
        /// Two-box energy balance
        TwoBox => "two_box" | "dice_2007" | "dice_2010" | "dice_2013",
        /// Linear map from cumulative emissions to atmosphere temperature
        Linear => "linear" | "linear_temperature" | "linear_carbon",
    }
);

define_selector!(
    /// Damages, abatement cost and net output
    DamagesVariant, family = "damages",
    {
        /// Polynomial-in-temperature damage fraction
        Dice2007 => "dice_2007" | "dice_2010",
        /// Exponential mapping of the damage polynomial to output
        ExponentialMap => "exponential_map",
        /// Weitzman tipping point with high-order terms
        TippingPoint => "tipping_point",
        /// Part of the damages hit total factor productivity
        ProductivityFraction => "productivity_fraction",
        /// Additive incommensurable environmental goods
        Incommensurable => "incommensurable" | "incommensurable_damages",
        /// DICE2013 damages with catastrophic term
        Dice2013 => "dice_2013",
    }
);

define_selector!(
    /// Consumption, investment and consumption discounting
    ConsumptionVariant, family = "consumption",
    {
        /// Ramsey discounting on per-capita consumption growth
        Ramsey => "ramsey" | "dice_2007" | "dice_2010" | "dice_2013",
        /// Constant consumption discount rate
        Constant => "constant",
    }
);

define_selector!(
    /// Period utility and discounted utility
    UtilityVariant, family = "utility",
    {
        /// `(c^(1-η) - 1) / (1 - η)`
        Crra => "crra" | "dice_2010" | "dice_2013",
        /// `c^(1-η) / (1 - η) + 1`
        Dice2007 => "dice_2007",
    }
);

define_selector!(
    /// Constrained nonlinear solver used by the policy optimiser
    SolverKind, family = "solver",
    {
        /// Built-in projected gradient ascent
        ProjectedGradient => "projected_gradient",
        /// Interior point solver (not linked into this build)
        Ipopt => "ipopt",
    }
);

define_selector!(
    /// Parameter calibration
    Preset, family = "preset",
    {
        Dice2007 => "dice_2007",
        Dice2010 => "dice_2010",
        Dice2013 => "dice_2013",
    }
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical_and_alias() {
        assert_eq!(
            "beam_carbon".parse::<CarbonVariant>().unwrap(),
            CarbonVariant::Beam
        );
        assert_eq!("beam".parse::<CarbonVariant>().unwrap(), CarbonVariant::Beam);
        assert_eq!(CarbonVariant::Beam.name(), "beam");
    }

    #[test]
    fn test_unknown_variant_names_family() {
        let err = "quartic".parse::<DamagesVariant>().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("damages"), "{}", message);
        assert!(message.contains("quartic"), "{}", message);
        assert!(message.contains("tipping_point"), "{}", message);
    }

    #[test]
    fn test_serde_uses_canonical_name() {
        let json = serde_json::to_string(&TemperatureVariant::Linear).unwrap();
        assert_eq!(json, "\"linear\"");
        let parsed: TemperatureVariant = serde_json::from_str("\"linear_temperature\"").unwrap();
        assert_eq!(parsed, TemperatureVariant::Linear);
    }

    #[test]
    fn test_all_names_round_trip() {
        for variant in DamagesVariant::ALL {
            assert_eq!(variant.name().parse::<DamagesVariant>().unwrap(), *variant);
        }
    }
}
