//! Results of a solved truss.

use nalgebra::DVector;
use petgraph::graph::{EdgeIndex, NodeIndex};
use serde::{Deserialize, Serialize};

use crate::joint::SupportKind;
use crate::member::{FailureMode, Member};
use crate::truss::{EquilibriumSystem, Truss};

/// Reaction components provided by one supported joint.
#[derive(Clone, Debug, PartialEq)]
pub struct Reaction {
    /// Supported joint.
    pub node: NodeIndex,
    /// Support condition of the joint.
    pub support: SupportKind,
    /// Reaction components: `[Rx, Ry]` for a fixed joint, `[R]` along the
    /// surface normal for a loose one.
    pub components: Vec<f64>,
}

/// Outcome of [`Truss::solve`].
///
/// Holds the solved truss, its equilibrium equations, the raw unknown-force
/// vector and the per-member failure flags.
#[derive(Clone, Debug)]
pub struct Analysis {
    /// Solved truss with member forces recorded.
    truss: Truss,
    /// Equations the solution satisfies.
    system: EquilibriumSystem,
    /// Member forces followed by reaction components.
    forces: DVector<f64>,
    /// Failure flag per member in member order.
    failures: Vec<bool>,
}

impl Analysis {
    /// Bundle the pieces produced by the solve.
    pub(crate) fn new(
        truss: Truss,
        system: EquilibriumSystem,
        forces: DVector<f64>,
        failures: Vec<bool>,
    ) -> Self {
        Self {
            truss,
            system,
            forces,
            failures,
        }
    }

    /// Raw solution: member forces by member index, then reaction components
    /// in joint order.
    #[must_use]
    pub fn forces(&self) -> &DVector<f64> {
        &self.forces
    }

    /// One failure flag per member, in member order.
    #[must_use]
    pub fn failures(&self) -> &[bool] {
        &self.failures
    }

    /// The solved truss.
    #[must_use]
    pub fn truss(&self) -> &Truss {
        &self.truss
    }

    /// Equilibrium equations that produced the solution.
    #[must_use]
    pub fn system(&self) -> &EquilibriumSystem {
        &self.system
    }

    /// Member stored at `member`, with its axial force recorded.
    #[must_use]
    pub fn member(&self, member: EdgeIndex) -> Option<&Member> {
        self.truss.member(member)
    }

    /// Members in member order, each with its axial force recorded.
    pub fn members(&self) -> impl Iterator<Item = &Member> {
        self.truss.members()
    }

    /// Reactions of every supported joint in joint order.
    #[must_use]
    pub fn reactions(&self) -> Vec<Reaction> {
        self.system
            .reactions
            .iter()
            .filter_map(|block| {
                let joint = self.truss.joint(block.node)?;
                Some(Reaction {
                    node: block.node,
                    support: joint.support().kind(),
                    components: self
                        .forces
                        .rows(block.offset, block.len)
                        .iter()
                        .copied()
                        .collect(),
                })
            })
            .collect()
    }

    /// Out-of-balance force at every joint; zero up to round-off for a valid solve.
    #[must_use]
    pub fn residual(&self) -> DVector<f64> {
        self.system.residual(&self.forces)
    }

    /// Serialisable summary of the analysis.
    #[must_use]
    pub fn report(&self) -> AnalysisReport {
        let members = self
            .truss
            .members()
            .map(|member| MemberResult {
                name: self
                    .truss
                    .member_label(member.index())
                    .unwrap_or_default(),
                force: member.axial_force().unwrap_or_default(),
                failed: member.failed().unwrap_or(false),
                failure_mode: member.failure_mode(),
                factor_of_safety: member
                    .factor_of_safety()
                    .filter(|fos| fos.is_finite()),
            })
            .collect();
        let reactions = self
            .reactions()
            .into_iter()
            .filter_map(|reaction| {
                let joint = self.truss.joint(reaction.node)?;
                Some(ReactionResult {
                    node: joint.name().to_string(),
                    support: reaction.support,
                    components: reaction.components,
                })
            })
            .collect();
        AnalysisReport {
            unknown_forces: self.forces.iter().copied().collect(),
            failures: self.failures.clone(),
            members,
            reactions,
        }
    }
}

/// Per-member entry of an [`AnalysisReport`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemberResult {
    /// `A-B` label built from the joint names.
    pub name: String,
    /// Axial force carried by the member.
    pub force: f64,
    /// Whether the member failed.
    pub failed: bool,
    /// Mechanism that caused failure.
    pub failure_mode: Option<FailureMode>,
    /// Limit load over carried load; absent for an unloaded member.
    pub factor_of_safety: Option<f64>,
}

/// Per-joint entry of an [`AnalysisReport`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReactionResult {
    /// Joint name.
    pub node: String,
    /// Support condition.
    pub support: SupportKind,
    /// Reaction components.
    pub components: Vec<f64>,
}

/// Serialisable summary of an [`Analysis`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Raw solution vector.
    pub unknown_forces: Vec<f64>,
    /// Failure flag per member.
    pub failures: Vec<bool>,
    /// Member results in member order.
    pub members: Vec<MemberResult>,
    /// Reactions in joint order.
    pub reactions: Vec<ReactionResult>,
}
