//! Truss definitions: plain-text and JSON records and their conversion into a [`Truss`].
//!
//! The text form has three sections separated by a `----` line:
//!
//! ```text
//! A Fixed 0 0
//! B Loose 0 1 0
//! C Free 0.5 1
//! ----
//! A-B O 0.05 0.005 200e9 250e6
//! B-C O 0.05 0.005 200e9 250e6
//! A-C O 0.05 0.005 200e9 250e6
//! ----
//! C 10 270
//! ```
//!
//! Node lines are `name support [angle] x y`, member lines are
//! `from-to shape dimensions... elastic_modulus yield_strength` and force lines
//! are `node magnitude angle`. Angles are in degrees.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{ParseError, TrussError};
use crate::geometry::point;
use crate::joint::{Support, SupportKind};
use crate::section::ShapeTag;
use crate::truss::Truss;

/// Line separating the sections of a text definition.
const SECTION_SEPARATOR: &str = "----";

/// A joint declaration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Unique joint name.
    pub name: String,
    /// Support tag: `Free`, `Loose` or `Fixed`.
    pub support: String,
    /// Inclination of a loose support's surface in degrees.
    #[serde(default)]
    pub angle: f64,
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
}

/// A member declaration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemberRecord {
    /// Name of the first joint.
    pub from: String,
    /// Name of the second joint.
    pub to: String,
    /// Shape tag: `I`, `T`, `C` or `O`.
    pub shape: String,
    /// Shape dimensions in the order the shape expects.
    pub dimensions: Vec<f64>,
    /// Elastic modulus.
    pub elastic_modulus: f64,
    /// Yield strength.
    pub yield_strength: f64,
}

/// An external force declaration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ForceRecord {
    /// Name of the loaded joint.
    pub node: String,
    /// Force magnitude.
    pub magnitude: f64,
    /// Direction in degrees, counter-clockwise from the X axis.
    pub angle: f64,
}

/// Complete description of a truss as flat records.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrussDefinition {
    /// Joints in creation order.
    pub nodes: Vec<NodeRecord>,
    /// Members in creation order.
    pub members: Vec<MemberRecord>,
    /// External forces; a later force on the same joint replaces an earlier one.
    #[serde(default)]
    pub forces: Vec<ForceRecord>,
}

impl TrussDefinition {
    /// Parse the plain-text definition format.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] naming the offending line when the text is malformed.
    pub fn parse_text(text: &str) -> Result<Self, ParseError> {
        let sections = split_sections(text);
        if sections.len() != 3 {
            return Err(ParseError::MissingSection(sections.len()));
        }

        let mut definition = TrussDefinition::default();
        for (line, tokens) in &sections[0] {
            definition.nodes.push(parse_node(*line, tokens)?);
        }
        for (line, tokens) in &sections[1] {
            definition.members.push(parse_member(*line, tokens)?);
        }
        for (line, tokens) in &sections[2] {
            definition.forces.push(parse_force(*line, tokens)?);
        }
        debug!(
            nodes = definition.nodes.len(),
            members = definition.members.len(),
            forces = definition.forces.len(),
            "parsed truss definition"
        );
        Ok(definition)
    }

    /// Parse the JSON form of the records.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Json`] when the document does not match the record layout.
    pub fn from_json(text: &str) -> Result<Self, ParseError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read a definition file, choosing JSON for a `.json` extension and the
    /// text format otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Io`] when the file cannot be read, or the parse error.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ParseError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|extension| extension.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json(&text)
        } else {
            Self::parse_text(&text)
        }
    }

    /// Build the truss described by these records.
    ///
    /// Joints are created first, then members, then forces, each in record order.
    ///
    /// # Errors
    ///
    /// Returns the first [`TrussError`] raised while adding a record.
    pub fn build(&self) -> Result<Truss, TrussError> {
        let mut truss = Truss::new();
        for node in &self.nodes {
            let kind = SupportKind::from_str(&node.support)?;
            truss.add_node(
                &node.name,
                Support::new(kind, node.angle),
                point(node.x, node.y),
            )?;
        }
        for member in &self.members {
            let shape = ShapeTag::from_str(&member.shape)?;
            truss.add_member(
                &member.from,
                &member.to,
                shape,
                &member.dimensions,
                member.elastic_modulus,
                member.yield_strength,
            )?;
        }
        for force in &self.forces {
            truss.add_force(&force.node, force.magnitude, force.angle)?;
        }
        Ok(truss)
    }
}

impl FromStr for TrussDefinition {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_text(s)
    }
}

/// Tokenised, non-empty lines of a section with their 1-based line numbers.
type Section<'a> = Vec<(usize, Vec<&'a str>)>;

/// Split text into sections at separator lines, dropping blank lines.
fn split_sections(text: &str) -> Vec<Section<'_>> {
    let mut sections = vec![Section::new()];
    for (number, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed == SECTION_SEPARATOR {
            sections.push(Section::new());
        } else if !trimmed.is_empty() {
            if let Some(section) = sections.last_mut() {
                section.push((number + 1, trimmed.split_whitespace().collect()));
            }
        }
    }
    sections
}

/// Parse a numeric token.
fn number(line: usize, token: &str) -> Result<f64, ParseError> {
    token.parse().map_err(|_| ParseError::InvalidNumber {
        line,
        token: token.to_string(),
    })
}

/// `name support [angle] x y`
fn parse_node(line: usize, tokens: &[&str]) -> Result<NodeRecord, ParseError> {
    let (angle, x, y) = match tokens {
        [_, _, x, y] => (0.0, number(line, x)?, number(line, y)?),
        [_, _, angle, x, y] => (number(line, angle)?, number(line, x)?, number(line, y)?),
        _ => {
            return Err(ParseError::MalformedLine {
                line,
                reason: format!("node needs 4 or 5 fields, found {}", tokens.len()),
            })
        }
    };
    Ok(NodeRecord {
        name: tokens[0].to_string(),
        support: tokens[1].to_string(),
        angle,
        x,
        y,
    })
}

/// `from-to shape dimensions... elastic_modulus yield_strength`
fn parse_member(line: usize, tokens: &[&str]) -> Result<MemberRecord, ParseError> {
    let [connector, shape, values @ ..] = tokens else {
        return Err(ParseError::MalformedLine {
            line,
            reason: "member needs a connector and a shape".to_string(),
        });
    };
    let (from, to) = match connector.split_once('-') {
        Some((from, to)) if !from.is_empty() && !to.is_empty() && !to.contains('-') => {
            (from, to)
        }
        _ => {
            return Err(ParseError::MalformedLine {
                line,
                reason: format!("`{connector}` is not a `from-to` connector"),
            })
        }
    };
    let values = values
        .iter()
        .map(|token| number(line, token))
        .collect::<Result<Vec<_>, _>>()?;
    let [dimensions @ .., elastic_modulus, yield_strength] = values.as_slice() else {
        return Err(ParseError::MalformedLine {
            line,
            reason: "member needs an elastic modulus and a yield strength".to_string(),
        });
    };
    Ok(MemberRecord {
        from: from.to_string(),
        to: to.to_string(),
        shape: (*shape).to_string(),
        dimensions: dimensions.to_vec(),
        elastic_modulus: *elastic_modulus,
        yield_strength: *yield_strength,
    })
}

/// `node magnitude angle`
fn parse_force(line: usize, tokens: &[&str]) -> Result<ForceRecord, ParseError> {
    let [node, magnitude, angle] = tokens else {
        return Err(ParseError::MalformedLine {
            line,
            reason: format!("force needs 3 fields, found {}", tokens.len()),
        });
    };
    Ok(ForceRecord {
        node: (*node).to_string(),
        magnitude: number(line, magnitude)?,
        angle: number(line, angle)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE: &str = "\
A Fixed 0 0
B Loose 30 2 0

C Free 1 1
----
A-B O 0.05 0.005 200e9 250e6
B-C T 0.1 0.2 0.01 200e9 250e6
----
C 10 270
";

    #[test]
    fn parses_all_three_sections() {
        let definition: TrussDefinition = TRIANGLE.parse().expect("valid definition");
        assert_eq!(definition.nodes.len(), 3);
        assert_eq!(definition.nodes[0].angle, 0.0);
        assert_eq!(definition.nodes[1].angle, 30.0);
        assert_eq!(definition.nodes[1].x, 2.0);
        assert_eq!(definition.members[1].from, "B");
        assert_eq!(definition.members[1].to, "C");
        assert_eq!(definition.members[1].dimensions, vec![0.1, 0.2, 0.01]);
        assert_eq!(definition.members[1].elastic_modulus, 200.0e9);
        assert_eq!(
            definition.forces,
            vec![ForceRecord {
                node: "C".to_string(),
                magnitude: 10.0,
                angle: 270.0,
            }]
        );
    }

    #[test]
    fn missing_sections_are_reported() {
        let error = TrussDefinition::parse_text("A Fixed 0 0\n----\n").expect_err("two sections");
        assert!(matches!(error, ParseError::MissingSection(2)));
    }

    #[test]
    fn malformed_lines_carry_line_numbers() {
        let text = "A Fixed 0 0\nB Free 1\n----\n----\n";
        let error = TrussDefinition::parse_text(text).expect_err("short node line");
        assert!(matches!(error, ParseError::MalformedLine { line: 2, .. }));

        let text = "A Fixed 0 zero\n----\n----\n";
        let error = TrussDefinition::parse_text(text).expect_err("bad number");
        assert!(matches!(
            error,
            ParseError::InvalidNumber { line: 1, ref token } if token == "zero"
        ));

        let text = "A Fixed 0 0\n----\nAB O 1 0.1 1 1\n----\n";
        let error = TrussDefinition::parse_text(text).expect_err("bad connector");
        assert!(matches!(error, ParseError::MalformedLine { line: 3, .. }));

        let text = "A Fixed 0 0\nB Free 1 0\n----\nA-B O 200e9\n----\n";
        let error = TrussDefinition::parse_text(text).expect_err("missing material");
        assert!(matches!(error, ParseError::MalformedLine { line: 4, .. }));

        let text = "A Fixed 0 0\n----\n----\nA 10\n";
        let error = TrussDefinition::parse_text(text).expect_err("short force line");
        assert!(matches!(error, ParseError::MalformedLine { line: 4, .. }));
    }

    #[test]
    fn build_validates_tags_and_references() {
        let mut definition: TrussDefinition = TRIANGLE.parse().expect("valid definition");
        definition.nodes[2].support = "Hinged".to_string();
        assert_eq!(
            definition.build().expect_err("unknown support"),
            TrussError::UnknownSupportType("Hinged".to_string())
        );

        let mut definition: TrussDefinition = TRIANGLE.parse().expect("valid definition");
        definition.members[0].shape = "L".to_string();
        assert_eq!(
            definition.build().expect_err("unknown shape"),
            TrussError::UnknownShape("L".to_string())
        );

        let mut definition: TrussDefinition = TRIANGLE.parse().expect("valid definition");
        definition.members[0].dimensions.push(1.0);
        assert!(matches!(
            definition.build().expect_err("wrong arity"),
            TrussError::InvalidConfiguration {
                shape: ShapeTag::O,
                expected: 2,
                found: 3,
            }
        ));
    }

    #[test]
    fn non_finite_tokens_are_rejected_when_built() {
        let text = TRIANGLE.replace("C Free 1 1", "C Free 1 nan");
        let definition: TrussDefinition = text.parse().expect("nan is a number token");
        assert!(definition.nodes[2].y.is_nan());
        assert!(matches!(
            definition.build().expect_err("nan coordinate"),
            TrussError::NonFiniteValue { ref node, quantity: "y coordinate", .. } if node == "C"
        ));

        let text = TRIANGLE.replace("C 10 270", "C inf 270");
        let definition: TrussDefinition = text.parse().expect("inf is a number token");
        assert!(matches!(
            definition.build().expect_err("infinite force"),
            TrussError::NonFiniteValue { quantity: "force magnitude", .. }
        ));
    }

    #[test]
    fn json_records_match_text_records() {
        let definition: TrussDefinition = TRIANGLE.parse().expect("valid definition");
        let json = serde_json::to_string(&definition).expect("serialises");
        let parsed = TrussDefinition::from_json(&json).expect("parses");
        assert_eq!(parsed, definition);

        let minimal = r#"{
            "nodes": [{"name": "A", "support": "Fixed", "x": 0, "y": 0}],
            "members": []
        }"#;
        let parsed = TrussDefinition::from_json(minimal).expect("defaults apply");
        assert_eq!(parsed.nodes[0].angle, 0.0);
        assert!(parsed.forces.is_empty());
    }
}
