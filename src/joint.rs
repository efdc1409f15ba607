//! Truss joints, their supports and local equilibrium equations.

use std::fmt;
use std::f64::consts::FRAC_PI_2;
use std::str::FromStr;

use nalgebra::{DMatrix, Vector2};
use petgraph::graph::{EdgeIndex, NodeIndex};
use serde::{Deserialize, Serialize};

use crate::errors::TrussError;
use crate::geometry::{Force, Point};
use crate::member::Member;

/// Tag naming a support condition, as written in truss definitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SupportKind {
    /// Unsupported joint.
    Free,
    /// Roller resisting motion normal to an inclined surface.
    Loose,
    /// Pin resisting motion in both directions.
    Fixed,
}

impl FromStr for SupportKind {
    type Err = TrussError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Free" => Ok(SupportKind::Free),
            "Loose" => Ok(SupportKind::Loose),
            "Fixed" => Ok(SupportKind::Fixed),
            other => Err(TrussError::UnknownSupportType(other.to_string())),
        }
    }
}

impl fmt::Display for SupportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            SupportKind::Free => "Free",
            SupportKind::Loose => "Loose",
            SupportKind::Fixed => "Fixed",
        };
        f.write_str(tag)
    }
}

/// Support condition of a joint.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Support {
    /// No reaction.
    Free,
    /// One reaction normal to a surface inclined at `angle` radians.
    Loose {
        /// Inclination of the supporting surface in radians.
        angle: f64,
    },
    /// Independent reactions along X and Y.
    Fixed,
}

impl Support {
    /// Build a support from its tag and a surface inclination in degrees.
    ///
    /// The inclination only matters for [`SupportKind::Loose`].
    #[must_use]
    pub fn new(kind: SupportKind, angle_degrees: f64) -> Self {
        match kind {
            SupportKind::Free => Support::Free,
            SupportKind::Loose => Support::Loose {
                angle: angle_degrees.to_radians(),
            },
            SupportKind::Fixed => Support::Fixed,
        }
    }

    /// Tag of this support.
    #[must_use]
    pub fn kind(&self) -> SupportKind {
        match self {
            Support::Free => SupportKind::Free,
            Support::Loose { .. } => SupportKind::Loose,
            Support::Fixed => SupportKind::Fixed,
        }
    }

    /// Number of reaction unknowns the support contributes.
    #[must_use]
    pub fn reaction_count(&self) -> usize {
        match self {
            Support::Free => 0,
            Support::Loose { .. } => 1,
            Support::Fixed => 2,
        }
    }

    /// Coefficients of the reaction unknowns in the joint's two equations.
    fn reaction_block(&self) -> DMatrix<f64> {
        match *self {
            Support::Free => DMatrix::zeros(2, 0),
            Support::Loose { angle } => {
                let normal = angle + FRAC_PI_2;
                DMatrix::from_column_slice(2, 1, &[normal.cos(), normal.sin()])
            }
            Support::Fixed => DMatrix::identity(2, 2),
        }
    }
}

/// Equilibrium coefficients contributed by a single joint.
///
/// The joint is in equilibrium when
/// `members * member_forces + reactions * reaction_forces + load = 0`.
#[derive(Clone, Debug, PartialEq)]
pub struct LocalEquations {
    /// Global indices of the incident members, one per column of `members`.
    pub member_indices: Vec<EdgeIndex>,
    /// 2×k direction cosines of the incident members seen from the joint.
    pub members: DMatrix<f64>,
    /// 2×r reaction coefficients; `r` depends on the support.
    pub reactions: DMatrix<f64>,
    /// External load on the joint.
    pub load: Vector2<f64>,
}

/// A pin joint of the truss.
#[derive(Clone, Debug)]
pub struct Joint {
    /// Name used in truss definitions.
    name: String,
    /// Position of the joint.
    position: Point,
    /// Support condition.
    support: Support,
    /// External load; only one load per joint is kept.
    load: Force,
    /// Incident members in the order they were attached.
    members: Vec<EdgeIndex>,
}

impl Joint {
    /// Create an unloaded joint with no members.
    pub fn new(name: impl Into<String>, position: Point, support: Support) -> Self {
        Self {
            name: name.into(),
            position,
            support,
            load: Force::default(),
            members: Vec::new(),
        }
    }

    /// Name used in truss definitions.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position of the joint.
    #[must_use]
    pub fn position(&self) -> Point {
        self.position
    }

    /// Support condition.
    #[must_use]
    pub fn support(&self) -> Support {
        self.support
    }

    /// External load on the joint.
    #[must_use]
    pub fn load(&self) -> Force {
        self.load
    }

    /// Incident members in attachment order.
    #[must_use]
    pub fn members(&self) -> &[EdgeIndex] {
        &self.members
    }

    /// Attach an incident member.
    pub(crate) fn add_member(&mut self, member: EdgeIndex) {
        self.members.push(member);
    }

    /// Replace the external load with `magnitude` acting at `angle_degrees`.
    pub fn add_force(&mut self, magnitude: f64, angle_degrees: f64) {
        self.load = Force::from_polar(magnitude, angle_degrees);
    }

    /// Build this joint's two equilibrium equations.
    ///
    /// `node` is the joint's own index and `member` resolves incident member
    /// indices to the shared member records.
    ///
    /// # Errors
    ///
    /// Returns [`TrussError::InvalidEndpoint`] when an attached member does not
    /// actually end at `node`.
    pub fn local_equations<'a, F>(
        &self,
        node: NodeIndex,
        member: F,
    ) -> Result<LocalEquations, TrussError>
    where
        F: Fn(EdgeIndex) -> &'a Member,
    {
        let mut members = DMatrix::zeros(2, self.members.len());
        for (column, &edge) in self.members.iter().enumerate() {
            let angle = member(edge).orientation(node)?;
            members[(0, column)] = angle.cos();
            members[(1, column)] = angle.sin();
        }
        Ok(LocalEquations {
            member_indices: self.members.clone(),
            members,
            reactions: self.support.reaction_block(),
            load: self.load.to_vector(),
        })
    }
}
