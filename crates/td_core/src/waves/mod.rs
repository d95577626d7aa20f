//! Wave composition: the policy that scales difficulty with the wave
//! number and the generator that turns it into spawn schedules.

mod generator;
mod policy;

pub use generator::{Draws, Wave, WaveGenerator};
pub use policy::{Eligibility, WavePolicy, WaveRecord};
