#![warn(clippy::all)]
#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]
#![doc = include_str!("../README.md")]

mod analysis;
mod errors;
mod geometry;
pub mod input;
mod joint;
mod member;
mod section;
mod truss;

pub use analysis::{Analysis, AnalysisReport, MemberResult, Reaction, ReactionResult};
pub use errors::{ParseError, TrussError};
pub use geometry::{force, point, Force, Point};
pub use input::TrussDefinition;
pub use joint::{Joint, LocalEquations, Support, SupportKind};
pub use member::{FailureMode, Member};
pub use section::{CrossSection, ShapeTag};
pub use truss::{EquilibriumSystem, ReactionBlock, SolverOptions, Truss};

/// Parse a plain-text definition and build the truss it describes.
///
/// # Errors
///
/// Returns [`ParseError`] for malformed text or any [`TrussError`] raised while
/// building.
///
/// # Examples
/// ```
/// let text = "\
/// A Fixed 0 0
/// B Loose 0 2 0
/// C Free 1 1
/// ----
/// A-B O 0.05 0.005 200e9 250e6
/// B-C O 0.05 0.005 200e9 250e6
/// A-C O 0.05 0.005 200e9 250e6
/// ----
/// C 10 270
/// ";
/// let analysis = pinjoint::load_text(text)?.solve()?;
/// assert_eq!(analysis.failures().len(), 3);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn load_text(text: &str) -> Result<Truss, ParseError> {
    Ok(TrussDefinition::parse_text(text)?.build()?)
}
