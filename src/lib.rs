//! # photon-trace
//!
//! An offline, physically based Monte Carlo path tracer: BVH-accelerated
//! intersection, a multiple-importance-sampled path integrator, and a
//! thread-pool dispatcher that hands out pixel spans to worker threads.
//!
//! ## Rendering equation
//!
//! ```text
//!   L_o(p, ω_o) = L_e(p, ω_o) + ∫_Ω f_r(p, ω_i, ω_o) · L_i(p, ω_i) · |cos θ_i| dω_i
//! ```
//!
//! Each bounce samples a 50/50 mixture of the material's own BSDF lobe and
//! the scene's light sources, dividing by the mixture density to stay an
//! unbiased estimator.

pub mod camera;
pub mod dispatcher;
pub mod error;
pub mod framebuffer;
pub mod hittable;
pub mod integrator;
pub mod io;
pub mod material;
pub mod math;
pub mod onb;
pub mod pdf;
pub mod presets;
pub mod texture;
