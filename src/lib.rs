// Criticality Monte Carlo: k-effective by batches of fission generations, with
// reservoir resampling of the fission bank and a Shannon entropy diagnostic.

pub mod bank;
pub mod eigenvalue;
pub mod entropy;
pub mod error;
pub mod fast_rng;
pub mod geometry;
pub mod material;
pub mod output;
pub mod particle;
pub mod queue;
pub mod settings;
pub mod simulation;
pub mod source;
pub mod tally;
pub mod transport;

pub use bank::Bank;
pub use eigenvalue::{calculate_keff, synchronize_bank, KeffEstimator};
pub use entropy::{shannon_entropy, EntropyMesh};
pub use error::{Error, Result};
pub use fast_rng::FastRng;
pub use geometry::{BoundaryCondition, Geometry, Surface};
pub use material::{Material, Nuclide};
pub use output::OutputFiles;
pub use particle::Particle;
pub use queue::ParticleQueue;
pub use settings::{OutputSettings, Settings};
pub use simulation::{BatchPhase, RunSummary, Simulation};
pub use source::{sample_fission_particle, sample_source_particle, Source, SourceDistribution};
pub use tally::{Tally, TallyScores};
pub use transport::{AnalogTransport, Transport, WorkerState};
