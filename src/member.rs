//! Truss members and their axial failure checks.

use std::f64::consts::PI;

use petgraph::graph::{EdgeIndex, NodeIndex};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::TrussError;
use crate::geometry::Point;
use crate::section::CrossSection;

/// Mechanism that limits an axially loaded member.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureMode {
    /// Euler buckling about the weak axis under compression.
    Buckling,
    /// Material yielding under tension.
    Yielding,
}

/// A straight, pin-ended bar connecting two joints.
///
/// Geometry and section properties are fixed at construction. The axial force
/// is written once by the failure pass after the equilibrium solve.
#[derive(Clone, Debug)]
pub struct Member {
    /// Column of this member in the unknown-force vector.
    index: EdgeIndex,
    /// First endpoint.
    node_i: NodeIndex,
    /// Second endpoint.
    node_j: NodeIndex,
    /// Position of the first endpoint.
    start: Point,
    /// Position of the second endpoint.
    end: Point,
    /// Cross-section of the bar.
    section: CrossSection,
    /// Elastic modulus.
    elastic_modulus: f64,
    /// Yield strength.
    yield_strength: f64,
    /// Distance between the endpoints.
    length: f64,
    /// Cached cross-sectional area.
    area: f64,
    /// Cached second moment about the x axis.
    inertia_xx: f64,
    /// Cached second moment about the y axis.
    inertia_yy: f64,
    /// Axial force after the failure pass; positive is tension.
    axial_force: Option<f64>,
    /// Mechanism that failed, if any.
    failure_mode: Option<FailureMode>,
}

impl Member {
    /// Create a member spanning `start` to `end`.
    ///
    /// # Errors
    ///
    /// Returns [`TrussError::ZeroLengthMember`] when both endpoints coincide and
    /// [`TrussError::InvalidDimension`] when a material value is not finite and
    /// positive.
    pub fn new(
        index: EdgeIndex,
        start: (NodeIndex, Point),
        end: (NodeIndex, Point),
        section: CrossSection,
        elastic_modulus: f64,
        yield_strength: f64,
    ) -> Result<Self, TrussError> {
        for (quantity, value) in [
            ("elastic modulus", elastic_modulus),
            ("yield strength", yield_strength),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(TrussError::InvalidDimension {
                    shape: section.shape(),
                    quantity,
                    value,
                });
            }
        }
        let length = start.1.distance_to(end.1);
        if length == 0.0 {
            return Err(TrussError::ZeroLengthMember(index));
        }
        let (inertia_xx, inertia_yy) = section.second_moments();
        Ok(Self {
            index,
            node_i: start.0,
            node_j: end.0,
            start: start.1,
            end: end.1,
            area: section.area(),
            section,
            elastic_modulus,
            yield_strength,
            length,
            inertia_xx,
            inertia_yy,
            axial_force: None,
            failure_mode: None,
        })
    }

    /// Column of this member in the unknown-force vector.
    #[must_use]
    pub fn index(&self) -> EdgeIndex {
        self.index
    }

    /// The two joints this member connects.
    #[must_use]
    pub fn endpoints(&self) -> (NodeIndex, NodeIndex) {
        (self.node_i, self.node_j)
    }

    /// Distance between the endpoints.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Cross-sectional area.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.area
    }

    /// Second moments of area `(Ixx, Iyy)`.
    #[must_use]
    pub fn second_moments(&self) -> (f64, f64) {
        (self.inertia_xx, self.inertia_yy)
    }

    /// Cross-section of the bar.
    #[must_use]
    pub fn section(&self) -> &CrossSection {
        &self.section
    }

    /// Angle in radians of the member axis seen from `from` toward the other end.
    ///
    /// # Errors
    ///
    /// Returns [`TrussError::InvalidEndpoint`] when `from` is not an endpoint.
    pub fn orientation(&self, from: NodeIndex) -> Result<f64, TrussError> {
        if from == self.node_i {
            Ok(self.start.bearing_to(self.end))
        } else if from == self.node_j {
            Ok(self.end.bearing_to(self.start))
        } else {
            Err(TrussError::InvalidEndpoint {
                member: self.index,
                node: from,
            })
        }
    }

    /// Governing mechanism and limit load for a given axial force.
    ///
    /// Tension is limited by `yield_strength * area`, compression by the Euler
    /// load `pi^2 E min(Ixx, Iyy) / L^2`. A zero force has no limit.
    #[must_use]
    pub fn critical_force(&self, axial_force: f64) -> Option<(FailureMode, f64)> {
        if axial_force > 0.0 {
            Some((FailureMode::Yielding, self.yield_strength * self.area))
        } else if axial_force < 0.0 {
            let inertia = self.inertia_xx.min(self.inertia_yy);
            Some((
                FailureMode::Buckling,
                PI.powi(2) * self.elastic_modulus * inertia / self.length.powi(2),
            ))
        } else {
            None
        }
    }

    /// Record the solved axial force and check it against the critical load.
    ///
    /// Returns `true` when the member fails. Exceeding the limit strictly is
    /// required; a force equal to the limit passes.
    ///
    /// # Errors
    ///
    /// Returns [`TrussError::ConflictingMemberForce`] when the member was already
    /// evaluated with a different force.
    pub fn evaluate_failure(&mut self, axial_force: f64) -> Result<bool, TrussError> {
        if let Some(recorded) = self.axial_force {
            if recorded.to_bits() != axial_force.to_bits() {
                return Err(TrussError::ConflictingMemberForce {
                    member: self.index,
                    recorded,
                    received: axial_force,
                });
            }
            return Ok(self.failure_mode.is_some());
        }
        self.axial_force = Some(axial_force);
        self.failure_mode = match self.critical_force(axial_force) {
            Some((mode, limit)) if axial_force.abs() > limit => {
                warn!(
                    member = self.index.index(),
                    force = axial_force,
                    limit,
                    ?mode,
                    "member fails"
                );
                Some(mode)
            }
            _ => None,
        };
        Ok(self.failure_mode.is_some())
    }

    /// Axial force recorded by the failure pass; positive is tension.
    #[must_use]
    pub fn axial_force(&self) -> Option<f64> {
        self.axial_force
    }

    /// Whether the member failed, once it has been evaluated.
    #[must_use]
    pub fn failed(&self) -> Option<bool> {
        self.axial_force.map(|_| self.failure_mode.is_some())
    }

    /// Mechanism that caused failure, if the member failed.
    #[must_use]
    pub fn failure_mode(&self) -> Option<FailureMode> {
        self.failure_mode
    }

    /// Ratio of the governing limit load to the recorded force.
    ///
    /// An unloaded member reports an infinite factor of safety.
    #[must_use]
    pub fn factor_of_safety(&self) -> Option<f64> {
        let force = self.axial_force?;
        Some(match self.critical_force(force) {
            Some((_, limit)) => limit / force.abs(),
            None => f64::INFINITY,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::{FRAC_PI_2, PI};

    use approx::assert_relative_eq;

    use super::*;
    use crate::geometry::point;
    use crate::section::ShapeTag;

    fn tube_member(length: f64) -> Member {
        let section = CrossSection::new(ShapeTag::O, &[0.05, 0.005]).expect("valid tube");
        Member::new(
            EdgeIndex::new(0),
            (NodeIndex::new(0), point(0.0, 0.0)),
            (NodeIndex::new(1), point(0.0, length)),
            section,
            200.0e9,
            250.0e6,
        )
        .expect("valid member")
    }

    #[test]
    fn orientation_depends_on_the_reference_end() {
        let member = tube_member(2.0);
        assert_relative_eq!(member.length(), 2.0);
        assert_relative_eq!(member.orientation(NodeIndex::new(0)).unwrap(), FRAC_PI_2);
        assert_relative_eq!(member.orientation(NodeIndex::new(1)).unwrap(), -FRAC_PI_2);
        let error = member
            .orientation(NodeIndex::new(7))
            .expect_err("foreign node rejected");
        assert_eq!(
            error,
            TrussError::InvalidEndpoint {
                member: EdgeIndex::new(0),
                node: NodeIndex::new(7),
            }
        );
    }

    #[test]
    fn zero_length_member_is_rejected() {
        let section = CrossSection::new(ShapeTag::O, &[0.05, 0.005]).expect("valid tube");
        let error = Member::new(
            EdgeIndex::new(3),
            (NodeIndex::new(0), point(1.0, 1.0)),
            (NodeIndex::new(1), point(1.0, 1.0)),
            section,
            200.0e9,
            250.0e6,
        )
        .expect_err("zero length detected");
        assert_eq!(error, TrussError::ZeroLengthMember(EdgeIndex::new(3)));
    }

    #[test]
    fn material_must_be_positive() {
        let section = CrossSection::new(ShapeTag::O, &[0.05, 0.005]).expect("valid tube");
        let error = Member::new(
            EdgeIndex::new(0),
            (NodeIndex::new(0), point(0.0, 0.0)),
            (NodeIndex::new(1), point(1.0, 0.0)),
            section,
            0.0,
            250.0e6,
        )
        .expect_err("zero modulus rejected");
        assert!(matches!(
            error,
            TrussError::InvalidDimension { quantity: "elastic modulus", .. }
        ));
    }

    #[test]
    fn unloaded_member_never_fails() {
        let mut member = tube_member(1.0);
        assert_eq!(member.failed(), None);
        assert!(!member.evaluate_failure(0.0).unwrap());
        assert_eq!(member.failed(), Some(false));
        assert_eq!(member.failure_mode(), None);
        assert_eq!(member.factor_of_safety(), Some(f64::INFINITY));
    }

    #[test]
    fn tension_limit_is_strict() {
        let member = tube_member(1.0);
        let limit = 250.0e6 * member.area();

        let mut at_limit = member.clone();
        assert!(!at_limit.evaluate_failure(limit).unwrap());
        assert_relative_eq!(at_limit.factor_of_safety().unwrap(), 1.0);

        let mut beyond = member;
        assert!(beyond.evaluate_failure(limit * 1.000_001).unwrap());
        assert_eq!(beyond.failure_mode(), Some(FailureMode::Yielding));
    }

    #[test]
    fn compression_uses_euler_load_about_weak_axis() {
        let member = tube_member(3.0);
        let (ixx, iyy) = member.second_moments();
        let euler = PI.powi(2) * 200.0e9 * ixx.min(iyy) / 9.0;
        let (mode, limit) = member.critical_force(-1.0).expect("compression limit");
        assert_eq!(mode, FailureMode::Buckling);
        assert_relative_eq!(limit, euler);

        let mut at_limit = member.clone();
        assert!(!at_limit.evaluate_failure(-limit).unwrap());

        let mut beyond = member;
        assert!(beyond.evaluate_failure(-2.0 * euler).unwrap());
        assert_eq!(beyond.failure_mode(), Some(FailureMode::Buckling));
        assert_relative_eq!(beyond.factor_of_safety().unwrap(), 0.5);
    }

    #[test]
    fn repeated_evaluation_must_agree() {
        let mut member = tube_member(1.0);
        assert!(!member.evaluate_failure(-5.0).unwrap());
        assert!(!member.evaluate_failure(-5.0).unwrap());
        let error = member.evaluate_failure(5.0).expect_err("conflict detected");
        assert!(matches!(error, TrussError::ConflictingMemberForce { .. }));
        assert_eq!(member.axial_force(), Some(-5.0));
    }
}
