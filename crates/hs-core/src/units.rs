// hs-core/src/units.rs

use uom::si::f64::{
    Length as UomLength, Mass as UomMass, MassDensity as UomMassDensity,
    Pressure as UomPressure,
};

// Public canonical unit types (SI, f64)
pub type Length = UomLength;
pub type Mass = UomMass;
pub type Density = UomMassDensity;
pub type Pressure = UomPressure;

#[inline]
pub fn pa(v: f64) -> Pressure {
    use uom::si::pressure::pascal;
    Pressure::new::<pascal>(v)
}

#[inline]
pub fn m(v: f64) -> Length {
    use uom::si::length::meter;
    Length::new::<meter>(v)
}

#[inline]
pub fn kg(v: f64) -> Mass {
    use uom::si::mass::kilogram;
    Mass::new::<kilogram>(v)
}

#[inline]
pub fn kgm3(v: f64) -> Density {
    use uom::si::mass_density::kilogram_per_cubic_meter;
    Density::new::<kilogram_per_cubic_meter>(v)
}

pub mod constants {
    /// Newtonian gravitational constant [m³/(kg·s²)], CODATA 2014
    pub const G_SI: f64 = 6.674_08e-11;

    /// Earth mass [kg]
    pub const M_EARTH_KG: f64 = 5.972_2e24;

    /// Earth equatorial radius [m]
    pub const R_EARTH_M: f64 = 6.378_1e6;

    /// Jupiter mass [kg]
    pub const M_JUPITER_KG: f64 = 1.898_13e27;

    /// Jupiter equatorial radius [m]
    pub const R_JUPITER_M: f64 = 7.149_2e7;
}
