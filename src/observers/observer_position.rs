use nalgebra::Vector3;

use crate::observations::Observation;
use crate::observers::earth_position::sun_position;
use crate::observers::Site;
use crate::ref_system::equatorial_to_ecliptic;
use crate::time::local_sidereal_time;

/// Geocentric position of an observer, in the equatorial frame of date (AU).
///
/// Space-based observations carry their own Earth → observer vector. Ground-based ones are
/// placed on the rotating Earth from the parallax constants of their site and the local
/// sidereal time of the observation.
pub fn geocentric_observer(obs: &Observation, site: &Site) -> Vector3<f64> {
    match obs.space_position {
        Some(position) => position,
        None => {
            let (sin_th, cos_th) = local_sidereal_time(obs.time, site.longitude).sin_cos();
            Vector3::new(
                site.rho_cos_phi * cos_th,
                site.rho_cos_phi * sin_th,
                site.rho_sin_phi,
            )
        }
    }
}

/// Heliocentric position of the observer of `obs`, in the ecliptic frame of date.
///
/// Arguments
/// ---------
/// * `obs`: the observation, providing the epoch and, for space-based observers, the
///   Earth → observer vector
/// * `site`: observing site of `obs`
///
/// Return
/// ----------
/// * The Sun → observer vector in AU.
///
/// See also
/// ------------
/// * [`sun_position`] – geocentric Sun and obliquity of date.
/// * [`geocentric_observer`] – Earth → observer vector.
pub fn sun_to_observer(obs: &Observation, site: &Site) -> Vector3<f64> {
    let sun = sun_position(obs.time);
    equatorial_to_ecliptic(sun.obliquity) * (geocentric_observer(obs, site) - sun.geocentric)
}
