//! Truss assembly and the method-of-joints solve.

use std::collections::HashMap;

use nalgebra::{DMatrix, DVector, SVD};
use petgraph::graph::{EdgeIndex, Graph, NodeIndex};
use tracing::{debug, info};

use crate::analysis::Analysis;
use crate::errors::TrussError;
use crate::geometry::Point;
use crate::joint::{Joint, Support};
use crate::member::Member;
use crate::section::{CrossSection, ShapeTag};

/// Tuning for the equilibrium solve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolverOptions {
    /// Singular values below `rcond` times the largest one are treated as zero
    /// when forming the pseudo-inverse.
    pub rcond: f64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self { rcond: 1.0e-15 }
    }
}

/// Iteration budget of the singular value decomposition per matrix dimension.
const SVD_ITERATIONS_PER_DIMENSION: usize = 100;

/// Column block of the reaction unknowns belonging to one supported joint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReactionBlock {
    /// Joint providing the reaction.
    pub node: NodeIndex,
    /// First column of the block in the unknown vector.
    pub offset: usize,
    /// Number of reaction components.
    pub len: usize,
}

/// Global equilibrium equations `A x + f = 0` for a determinate truss.
///
/// `x` holds every member force in member order followed by every reaction
/// component in joint order.
#[derive(Clone, Debug, PartialEq)]
pub struct EquilibriumSystem {
    /// Coefficient matrix `A`, two rows per joint.
    pub matrix: DMatrix<f64>,
    /// External load vector `f`, two entries per joint.
    pub load: DVector<f64>,
    /// Number of member unknowns preceding the reactions.
    pub member_count: usize,
    /// Reaction blocks in joint order.
    pub reactions: Vec<ReactionBlock>,
}

impl EquilibriumSystem {
    /// Solve `x = pinv(A) (-f)`.
    ///
    /// # Errors
    ///
    /// Returns [`TrussError::InvalidTolerance`] for a negative or non-finite
    /// `rcond`, and [`TrussError::SingularSystem`] when the equations hold
    /// non-finite values or the decomposition does not converge.
    pub fn solve(&self, options: &SolverOptions) -> Result<DVector<f64>, TrussError> {
        if !(options.rcond.is_finite() && options.rcond >= 0.0) {
            return Err(TrussError::InvalidTolerance(options.rcond));
        }
        if self.matrix.is_empty() {
            return Ok(DVector::zeros(self.matrix.ncols()));
        }
        if self.matrix.iter().chain(self.load.iter()).any(|v| !v.is_finite()) {
            return Err(TrussError::SingularSystem(
                "equilibrium equations contain non-finite coefficients",
            ));
        }
        let max_iterations =
            SVD_ITERATIONS_PER_DIMENSION * self.matrix.nrows().max(self.matrix.ncols());
        let svd = SVD::try_new(
            self.matrix.clone(),
            true,
            true,
            f64::EPSILON,
            max_iterations,
        )
        .ok_or(TrussError::SingularSystem(
            "singular value decomposition did not converge",
        ))?;
        let cutoff = options.rcond * svd.singular_values.max();
        let pseudo_inverse = svd
            .pseudo_inverse(cutoff)
            .map_err(TrussError::SingularSystem)?;
        Ok(pseudo_inverse * -&self.load)
    }

    /// Out-of-balance force `A x + f` for a candidate solution.
    #[must_use]
    pub fn residual(&self, unknowns: &DVector<f64>) -> DVector<f64> {
        &self.matrix * unknowns + &self.load
    }
}

/// Container for a pin-jointed planar truss.
///
/// Joints and members live in a single graph arena. A joint's index selects its
/// pair of equilibrium rows and a member's index selects its column, so both
/// follow creation order.
#[derive(Clone, Debug, Default)]
pub struct Truss {
    /// Joint and member storage.
    graph: Graph<Joint, Member>,
    /// Lookup from joint name to index.
    names: HashMap<String, NodeIndex>,
}

impl Truss {
    /// Create an empty truss.
    ///
    /// # Examples
    /// ```
    /// use pinjoint::Truss;
    ///
    /// let truss = Truss::new();
    /// assert_eq!(truss.joint_count(), 0);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self {
            graph: Graph::new(),
            names: HashMap::new(),
        }
    }

    /// Return the number of joints in the truss.
    #[must_use]
    pub fn joint_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Return the number of members in the truss.
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Total number of reaction unknowns provided by the supports.
    #[must_use]
    pub fn reaction_count(&self) -> usize {
        self.graph
            .node_weights()
            .map(|joint| joint.support().reaction_count())
            .sum()
    }

    /// Add a named joint.
    ///
    /// # Errors
    ///
    /// Returns [`TrussError::DuplicateNode`] when `name` is already taken and
    /// [`TrussError::NonFiniteValue`] for a NaN or infinite coordinate or
    /// support angle.
    ///
    /// # Examples
    /// ```
    /// use pinjoint::{point, Support, Truss};
    ///
    /// let mut truss = Truss::new();
    /// let joint = truss.add_node("A", Support::Fixed, point(0.0, 0.0)).unwrap();
    /// assert_eq!(joint.index(), 0);
    /// assert!(truss.add_node("A", Support::Free, point(1.0, 0.0)).is_err());
    /// ```
    pub fn add_node(
        &mut self,
        name: &str,
        support: Support,
        position: Point,
    ) -> Result<NodeIndex, TrussError> {
        if self.names.contains_key(name) {
            return Err(TrussError::DuplicateNode(name.to_string()));
        }
        let angle = match support {
            Support::Loose { angle } => angle,
            Support::Free | Support::Fixed => 0.0,
        };
        for (quantity, value) in [
            ("x coordinate", position.x),
            ("y coordinate", position.y),
            ("support angle", angle),
        ] {
            check_finite(name, quantity, value)?;
        }
        let index = self.graph.add_node(Joint::new(name, position, support));
        self.names.insert(name.to_string(), index);
        Ok(index)
    }

    /// Connect two named joints with a new member.
    ///
    /// The member is stored once and registered with both of its joints.
    ///
    /// # Errors
    ///
    /// Returns [`TrussError::UndefinedNodeReference`] for an unknown joint name,
    /// [`TrussError::InvalidConfiguration`] when `dimensions` does not suit
    /// `shape`, and [`TrussError::ZeroLengthMember`] when the joints coincide.
    pub fn add_member(
        &mut self,
        from: &str,
        to: &str,
        shape: ShapeTag,
        dimensions: &[f64],
        elastic_modulus: f64,
        yield_strength: f64,
    ) -> Result<EdgeIndex, TrussError> {
        let start = self.lookup(from)?;
        let end = self.lookup(to)?;
        let section = CrossSection::new(shape, dimensions)?;
        let index = EdgeIndex::new(self.graph.edge_count());
        let member = Member::new(
            index,
            (start, self.graph[start].position()),
            (end, self.graph[end].position()),
            section,
            elastic_modulus,
            yield_strength,
        )?;
        let edge = self.graph.add_edge(start, end, member);
        debug_assert_eq!(edge, index);
        self.graph[start].add_member(edge);
        self.graph[end].add_member(edge);
        Ok(edge)
    }

    /// Set the external force on a named joint, replacing any earlier one.
    ///
    /// # Errors
    ///
    /// Returns [`TrussError::UndefinedNodeReference`] for an unknown joint name
    /// and [`TrussError::NonFiniteValue`] for a NaN or infinite magnitude or angle.
    pub fn add_force(
        &mut self,
        name: &str,
        magnitude: f64,
        angle_degrees: f64,
    ) -> Result<(), TrussError> {
        let node = self.lookup(name)?;
        check_finite(name, "force magnitude", magnitude)?;
        check_finite(name, "force angle", angle_degrees)?;
        self.graph[node].add_force(magnitude, angle_degrees);
        Ok(())
    }

    /// Index of the joint called `name`.
    #[must_use]
    pub fn node_index(&self, name: &str) -> Option<NodeIndex> {
        self.names.get(name).copied()
    }

    /// Joint stored at `node`.
    #[must_use]
    pub fn joint(&self, node: NodeIndex) -> Option<&Joint> {
        self.graph.node_weight(node)
    }

    /// Member stored at `member`.
    #[must_use]
    pub fn member(&self, member: EdgeIndex) -> Option<&Member> {
        self.graph.edge_weight(member)
    }

    /// Joints in creation order.
    pub fn joints(&self) -> impl Iterator<Item = (NodeIndex, &Joint)> {
        self.graph
            .node_indices()
            .map(move |node| (node, &self.graph[node]))
    }

    /// Members in creation order.
    pub fn members(&self) -> impl Iterator<Item = &Member> {
        self.graph.edge_weights()
    }

    /// `A-B` style label of a member built from its joint names.
    #[must_use]
    pub fn member_label(&self, member: EdgeIndex) -> Option<String> {
        let (start, end) = self.graph.edge_endpoints(member)?;
        Some(format!(
            "{}-{}",
            self.graph[start].name(),
            self.graph[end].name()
        ))
    }

    /// Assemble the global equilibrium equations.
    ///
    /// # Errors
    ///
    /// Returns [`TrussError::Indeterminate`] unless `2N == M + R`.
    pub fn assemble(&self) -> Result<EquilibriumSystem, TrussError> {
        let mut local = Vec::with_capacity(self.joint_count());
        for node in self.graph.node_indices() {
            local.push(self.graph[node].local_equations(node, |edge| &self.graph[edge])?);
        }

        let equations = 2 * self.joint_count();
        let member_count = self.member_count();
        let unknowns = member_count + self.reaction_count();
        if equations != unknowns {
            return Err(TrussError::Indeterminate {
                equations,
                unknowns,
            });
        }
        debug!(
            joints = self.joint_count(),
            members = member_count,
            reactions = unknowns - member_count,
            "assembling equilibrium equations"
        );

        let mut matrix = DMatrix::zeros(equations, unknowns);
        let mut load = DVector::zeros(equations);
        let mut reactions = Vec::new();
        let mut offset = member_count;
        for (node, block) in self.graph.node_indices().zip(&local) {
            let row = 2 * node.index();
            for (column, member) in block.member_indices.iter().enumerate() {
                matrix
                    .fixed_view_mut::<2, 1>(row, member.index())
                    .copy_from(&block.members.column(column));
            }
            let width = block.reactions.ncols();
            if width > 0 {
                matrix
                    .view_mut((row, offset), (2, width))
                    .copy_from(&block.reactions);
                reactions.push(ReactionBlock {
                    node,
                    offset,
                    len: width,
                });
                offset += width;
            }
            load.fixed_rows_mut::<2>(row).copy_from(&block.load);
        }

        Ok(EquilibriumSystem {
            matrix,
            load,
            member_count,
            reactions,
        })
    }

    /// Solve the truss with default [`SolverOptions`].
    ///
    /// # Errors
    ///
    /// See [`Truss::solve_with`].
    pub fn solve(self) -> Result<Analysis, TrussError> {
        self.solve_with(&SolverOptions::default())
    }

    /// Assemble, solve and evaluate every member for failure.
    ///
    /// The truss is consumed; the returned [`Analysis`] owns it with the solved
    /// member forces recorded.
    ///
    /// # Errors
    ///
    /// Returns [`TrussError::Indeterminate`] for a truss that is not statically
    /// determinate and [`TrussError::SingularSystem`] when the equations cannot
    /// be decomposed.
    ///
    /// # Examples
    /// ```
    /// use pinjoint::{point, ShapeTag, Support, SupportKind, Truss};
    ///
    /// let mut truss = Truss::new();
    /// truss.add_node("A", Support::Fixed, point(0.0, 0.0))?;
    /// truss.add_node("B", Support::new(SupportKind::Loose, 0.0), point(2.0, 0.0))?;
    /// truss.add_node("C", Support::Free, point(1.0, 1.0))?;
    /// for (a, b) in [("A", "B"), ("B", "C"), ("A", "C")] {
    ///     truss.add_member(a, b, ShapeTag::O, &[0.05, 0.005], 200.0e9, 250.0e6)?;
    /// }
    /// truss.add_force("C", 10.0, 270.0)?;
    ///
    /// let analysis = truss.solve()?;
    /// assert_eq!(analysis.failures(), &[false, false, false]);
    /// # Ok::<(), pinjoint::TrussError>(())
    /// ```
    pub fn solve_with(mut self, options: &SolverOptions) -> Result<Analysis, TrussError> {
        let system = self.assemble()?;
        let unknowns = system.solve(options)?;
        info!(
            unknowns = unknowns.len(),
            "solved equilibrium equations"
        );

        // The solution holds the pull each member exerts on its joints; the
        // member itself carries the opposite force.
        let mut failures = Vec::with_capacity(self.member_count());
        for edge in self.graph.edge_indices() {
            let axial_force = -unknowns[edge.index()];
            failures.push(self.graph[edge].evaluate_failure(axial_force)?);
        }
        let failed = failures.iter().filter(|failed| **failed).count();
        info!(members = failures.len(), failed, "evaluated member failure");

        Ok(Analysis::new(self, system, unknowns, failures))
    }

    /// Resolve a joint name.
    fn lookup(&self, name: &str) -> Result<NodeIndex, TrussError> {
        self.node_index(name)
            .ok_or_else(|| TrussError::UndefinedNodeReference(name.to_string()))
    }
}

/// Reject NaN and infinite joint data.
fn check_finite(node: &str, quantity: &'static str, value: f64) -> Result<(), TrussError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(TrussError::NonFiniteValue {
            node: node.to_string(),
            quantity,
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::geometry::point;
    use crate::joint::SupportKind;
    use crate::member::FailureMode;

    fn add_tube(truss: &mut Truss, from: &str, to: &str) -> EdgeIndex {
        truss
            .add_member(from, to, ShapeTag::O, &[0.05, 0.005], 200.0e9, 250.0e6)
            .expect("member accepted")
    }

    fn triangle() -> Truss {
        let mut truss = Truss::new();
        truss
            .add_node("A", Support::Fixed, point(0.0, 0.0))
            .expect("node accepted");
        truss
            .add_node("B", Support::new(SupportKind::Loose, 0.0), point(2.0, 0.0))
            .expect("node accepted");
        truss
            .add_node("C", Support::Free, point(1.0, 1.0))
            .expect("node accepted");
        add_tube(&mut truss, "A", "B");
        add_tube(&mut truss, "B", "C");
        add_tube(&mut truss, "A", "C");
        truss
    }

    #[test]
    fn members_are_shared_between_both_joints() {
        let truss = triangle();
        let a = truss.node_index("A").expect("A exists");
        let c = truss.node_index("C").expect("C exists");
        assert_eq!(
            truss.joint(a).expect("joint").members(),
            &[EdgeIndex::new(0), EdgeIndex::new(2)]
        );
        assert_eq!(
            truss.joint(c).expect("joint").members(),
            &[EdgeIndex::new(1), EdgeIndex::new(2)]
        );
        assert_eq!(truss.member_count(), 3);
        assert_eq!(truss.member_label(EdgeIndex::new(1)).as_deref(), Some("B-C"));
    }

    #[test]
    fn undefined_references_are_rejected() {
        let mut truss = triangle();
        let error = truss
            .add_member("A", "Z", ShapeTag::O, &[0.05, 0.005], 200.0e9, 250.0e6)
            .expect_err("unknown joint rejected");
        assert_eq!(error, TrussError::UndefinedNodeReference("Z".to_string()));
        let error = truss
            .add_force("Q", 1.0, 0.0)
            .expect_err("unknown joint rejected");
        assert_eq!(error, TrussError::UndefinedNodeReference("Q".to_string()));
        assert_eq!(truss.member_count(), 3);
    }

    #[test]
    fn wrong_arity_member_is_rejected_without_side_effects() {
        let mut truss = triangle();
        let error = truss
            .add_member("A", "B", ShapeTag::T, &[0.1, 0.2], 200.0e9, 250.0e6)
            .expect_err("arity checked");
        assert!(matches!(error, TrussError::InvalidConfiguration { .. }));
        let a = truss.node_index("A").expect("A exists");
        assert_eq!(truss.joint(a).expect("joint").members().len(), 2);
    }

    #[test]
    fn assembly_places_reaction_blocks_after_members() {
        let truss = triangle();
        let system = truss.assemble().expect("determinate");
        assert_eq!(system.matrix.shape(), (6, 6));
        assert_eq!(
            system.reactions,
            vec![
                ReactionBlock {
                    node: NodeIndex::new(0),
                    offset: 3,
                    len: 2,
                },
                ReactionBlock {
                    node: NodeIndex::new(1),
                    offset: 5,
                    len: 1,
                },
            ]
        );
        // Joint A: member A-B points along +x, A-C along 45 degrees.
        assert_relative_eq!(system.matrix[(0, 0)], 1.0);
        assert_relative_eq!(system.matrix[(0, 2)], std::f64::consts::FRAC_1_SQRT_2);
        assert_relative_eq!(system.matrix[(0, 3)], 1.0);
        assert_relative_eq!(system.matrix[(1, 4)], 1.0);
        // Joint B: loose support on a level surface reacts vertically.
        assert_relative_eq!(system.matrix[(3, 5)], 1.0);
        assert_relative_eq!(system.matrix[(0, 1)], 0.0);
    }

    #[test]
    fn indeterminate_truss_is_rejected() {
        let mut truss = triangle();
        add_tube(&mut truss, "C", "A");
        let error = truss.assemble().expect_err("redundant member");
        assert_eq!(
            error,
            TrussError::Indeterminate {
                equations: 6,
                unknowns: 7,
            }
        );

        let mut unstable = Truss::new();
        unstable
            .add_node("A", Support::Free, point(0.0, 0.0))
            .expect("node accepted");
        unstable
            .add_node("B", Support::Free, point(1.0, 0.0))
            .expect("node accepted");
        add_tube(&mut unstable, "A", "B");
        let error = unstable.solve().expect_err("under-constrained");
        assert_eq!(
            error,
            TrussError::Indeterminate {
                equations: 4,
                unknowns: 1,
            }
        );
    }

    #[test]
    fn symmetric_triangle_splits_the_load() {
        let mut truss = triangle();
        truss.add_force("C", 10.0, 270.0).expect("force accepted");
        let analysis = truss.solve().expect("solvable");

        let rafter = -5.0 * 2.0_f64.sqrt();
        let forces = analysis.forces();
        // The chord pulls on its joints while both rafters push on the apex.
        assert_relative_eq!(forces[0], 5.0, epsilon = 1.0e-9);
        assert_relative_eq!(forces[1], rafter, epsilon = 1.0e-9);
        assert_relative_eq!(forces[2], rafter, epsilon = 1.0e-9);
        assert_relative_eq!(forces[3], 0.0, epsilon = 1.0e-9);
        assert_relative_eq!(forces[4], 5.0, epsilon = 1.0e-9);
        assert_relative_eq!(forces[5], 5.0, epsilon = 1.0e-9);

        let chord = analysis.member(EdgeIndex::new(0)).expect("member");
        assert_relative_eq!(chord.axial_force().unwrap(), -5.0, epsilon = 1.0e-9);
        assert_eq!(analysis.failures(), &[false, false, false]);
        assert!(analysis.residual().amax() < 1.0e-9);
    }

    #[test]
    fn overloaded_member_fails_without_aborting_the_solve() {
        let mut truss = triangle();
        truss.add_force("C", 5.0e9, 270.0).expect("force accepted");
        let analysis = truss.solve().expect("solvable");
        assert_eq!(analysis.failures(), &[true, true, true]);
        let rafter = analysis.member(EdgeIndex::new(1)).expect("member");
        assert_eq!(rafter.failure_mode(), Some(FailureMode::Yielding));
        let chord = analysis.member(EdgeIndex::new(0)).expect("member");
        assert_eq!(chord.failure_mode(), Some(FailureMode::Buckling));
    }

    #[test]
    fn non_finite_joint_data_is_rejected() {
        let mut truss = triangle();
        let error = truss
            .add_node("D", Support::Free, point(1.0, f64::NAN))
            .expect_err("nan coordinate");
        assert!(matches!(
            error,
            TrussError::NonFiniteValue { ref node, quantity: "y coordinate", .. } if node == "D"
        ));
        let error = truss
            .add_node("D", Support::Fixed, point(f64::INFINITY, 0.0))
            .expect_err("infinite coordinate");
        assert!(matches!(
            error,
            TrussError::NonFiniteValue { quantity: "x coordinate", .. }
        ));
        let error = truss
            .add_node("D", Support::new(SupportKind::Loose, f64::NAN), point(3.0, 0.0))
            .expect_err("nan support angle");
        assert!(matches!(
            error,
            TrussError::NonFiniteValue { quantity: "support angle", .. }
        ));
        assert_eq!(truss.joint_count(), 3);
        assert_eq!(truss.node_index("D"), None);

        let error = truss.add_force("C", f64::NAN, 270.0).expect_err("nan magnitude");
        assert!(matches!(
            error,
            TrussError::NonFiniteValue { quantity: "force magnitude", .. }
        ));
        let error = truss
            .add_force("C", 10.0, f64::NEG_INFINITY)
            .expect_err("infinite angle");
        assert!(matches!(
            error,
            TrussError::NonFiniteValue { quantity: "force angle", .. }
        ));

        // The rejected loads leave the truss solvable.
        truss.add_force("C", 10.0, 270.0).expect("force accepted");
        assert!(truss.solve().is_ok());
    }

    #[test]
    fn invalid_tolerance_is_rejected() {
        let system = triangle().assemble().expect("determinate");
        for rcond in [f64::NAN, f64::INFINITY, -1.0e-15] {
            let error = system
                .solve(&SolverOptions { rcond })
                .expect_err("bad cutoff");
            assert!(matches!(
                error,
                TrussError::InvalidTolerance(value) if value.to_bits() == rcond.to_bits()
            ));
        }
        let error = triangle()
            .solve_with(&SolverOptions { rcond: f64::NAN })
            .expect_err("bad cutoff");
        assert!(matches!(error, TrussError::InvalidTolerance(_)));
    }

    #[test]
    fn non_finite_equations_are_rejected() {
        let mut system = triangle().assemble().expect("determinate");
        system.matrix[(0, 0)] = f64::NAN;
        let error = system
            .solve(&SolverOptions::default())
            .expect_err("nan coefficient");
        assert!(matches!(error, TrussError::SingularSystem(_)));

        let mut system = triangle().assemble().expect("determinate");
        system.load[1] = f64::INFINITY;
        let error = system
            .solve(&SolverOptions::default())
            .expect_err("infinite load");
        assert!(matches!(error, TrussError::SingularSystem(_)));
    }

    #[test]
    fn empty_truss_solves_to_nothing() {
        let analysis = Truss::new().solve().expect("trivially determinate");
        assert!(analysis.forces().is_empty());
        assert!(analysis.failures().is_empty());
    }
}
