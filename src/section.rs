//! Cross-section shapes and their closed-form section properties.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::TrussError;

/// One-letter tag naming a cross-section family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeTag {
    /// Symmetric I-beam.
    I,
    /// T-beam with the flange on top of the web.
    T,
    /// C-channel.
    C,
    /// Circular tube.
    O,
}

impl ShapeTag {
    /// Number of dimension values the shape is described by.
    #[must_use]
    pub const fn arity(self) -> usize {
        match self {
            ShapeTag::O => 2,
            ShapeTag::I | ShapeTag::T | ShapeTag::C => 3,
        }
    }
}

impl fmt::Display for ShapeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            ShapeTag::I => "I",
            ShapeTag::T => "T",
            ShapeTag::C => "C",
            ShapeTag::O => "O",
        };
        f.write_str(tag)
    }
}

impl FromStr for ShapeTag {
    type Err = TrussError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "I" => Ok(ShapeTag::I),
            "T" => Ok(ShapeTag::T),
            "C" => Ok(ShapeTag::C),
            "O" => Ok(ShapeTag::O),
            other => Err(TrussError::UnknownShape(other.to_string())),
        }
    }
}

/// Cross-section of a member.
///
/// The flanged shapes share the `[B, H, h]` description: `B` is the flange or
/// base width, `H` the web height and `h` the flange thickness. The web
/// thickness equals `h` for every flanged shape.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum CrossSection {
    /// Circular tube described by `[d, t]`; the inner diameter is `d - t`.
    Tube {
        /// Outer diameter.
        outer_diameter: f64,
        /// Wall thickness.
        thickness: f64,
    },
    /// I-beam described by `[B, H, h]`.
    IBeam {
        /// Flange width `B`.
        flange_width: f64,
        /// Web height `H`.
        web_height: f64,
        /// Flange thickness `h`.
        thickness: f64,
    },
    /// T-beam described by `[B, H, h]`.
    TBeam {
        /// Flange width `B`.
        flange_width: f64,
        /// Web height `H`.
        web_height: f64,
        /// Flange thickness `h`.
        thickness: f64,
    },
    /// C-channel described by `[B, H, h]`.
    Channel {
        /// Leg width `B`.
        flange_width: f64,
        /// Web height `H`.
        web_height: f64,
        /// Leg thickness `h`.
        thickness: f64,
    },
}

impl CrossSection {
    /// Build a section from a shape tag and its ordered dimension values.
    ///
    /// # Errors
    ///
    /// Returns [`TrussError::InvalidConfiguration`] when `dimensions` does not
    /// hold exactly [`ShapeTag::arity`] values, and
    /// [`TrussError::InvalidDimension`] when a value is not finite and positive,
    /// a tube wall is not thinner than its diameter, or the resulting area is
    /// not positive.
    ///
    /// # Examples
    /// ```
    /// use pinjoint::{CrossSection, ShapeTag, TrussError};
    ///
    /// let tube = CrossSection::new(ShapeTag::O, &[0.1, 0.01]).expect("valid tube");
    /// assert!(tube.area() > 0.0);
    ///
    /// let error = CrossSection::new(ShapeTag::I, &[0.1, 0.2]).expect_err("arity checked");
    /// assert!(matches!(error, TrussError::InvalidConfiguration { expected: 3, .. }));
    /// ```
    pub fn new(shape: ShapeTag, dimensions: &[f64]) -> Result<Self, TrussError> {
        if dimensions.len() != shape.arity() {
            return Err(TrussError::InvalidConfiguration {
                shape,
                expected: shape.arity(),
                found: dimensions.len(),
            });
        }
        if let Some(&value) = dimensions.iter().find(|v| !v.is_finite() || **v <= 0.0) {
            return Err(TrussError::InvalidDimension {
                shape,
                quantity: "dimension",
                value,
            });
        }
        if shape == ShapeTag::O && dimensions[1] >= dimensions[0] {
            return Err(TrussError::InvalidDimension {
                shape,
                quantity: "wall thickness",
                value: dimensions[1],
            });
        }
        let section = match shape {
            ShapeTag::O => CrossSection::Tube {
                outer_diameter: dimensions[0],
                thickness: dimensions[1],
            },
            ShapeTag::I => CrossSection::IBeam {
                flange_width: dimensions[0],
                web_height: dimensions[1],
                thickness: dimensions[2],
            },
            ShapeTag::T => CrossSection::TBeam {
                flange_width: dimensions[0],
                web_height: dimensions[1],
                thickness: dimensions[2],
            },
            ShapeTag::C => CrossSection::Channel {
                flange_width: dimensions[0],
                web_height: dimensions[1],
                thickness: dimensions[2],
            },
        };
        let area = section.area();
        if !(area.is_finite() && area > 0.0) {
            return Err(TrussError::InvalidDimension {
                shape,
                quantity: "area",
                value: area,
            });
        }
        Ok(section)
    }

    /// Tag of the family this section belongs to.
    #[must_use]
    pub const fn shape(&self) -> ShapeTag {
        match self {
            CrossSection::Tube { .. } => ShapeTag::O,
            CrossSection::IBeam { .. } => ShapeTag::I,
            CrossSection::TBeam { .. } => ShapeTag::T,
            CrossSection::Channel { .. } => ShapeTag::C,
        }
    }

    /// Cross-sectional area.
    #[must_use]
    pub fn area(&self) -> f64 {
        match *self {
            CrossSection::Tube {
                outer_diameter: d,
                thickness: t,
            } => {
                let d1 = d - t;
                PI / 4.0 * (d.powi(2) - d1.powi(2))
            }
            CrossSection::IBeam {
                flange_width: big_b,
                web_height: big_h,
                thickness: h,
            }
            | CrossSection::Channel {
                flange_width: big_b,
                web_height: big_h,
                thickness: h,
            } => big_h * h + 2.0 * big_b * h,
            CrossSection::TBeam {
                flange_width: big_b,
                web_height: big_h,
                thickness: h,
            } => big_b * h + big_h * h,
        }
    }

    /// Second moments of area `(Ixx, Iyy)` about the centroidal axes.
    #[must_use]
    pub fn second_moments(&self) -> (f64, f64) {
        match *self {
            CrossSection::Tube {
                outer_diameter: d,
                thickness: t,
            } => {
                let d1 = d - t;
                let inertia = PI / 64.0 * (d.powi(4) - d1.powi(4));
                (inertia, inertia)
            }
            CrossSection::IBeam {
                flange_width: big_b,
                web_height: big_h,
                thickness: h,
            } => {
                let b = h;
                let ixx = big_h.powi(3) * b / 12.0
                    + 2.0 * (h.powi(3) * big_b / 12.0 + h * big_b * (big_h + h).powi(2) / 4.0);
                let iyy = b.powi(3) * big_h / 12.0 + 2.0 * (big_b.powi(3) * h / 12.0);
                (ixx, iyy)
            }
            CrossSection::TBeam {
                flange_width: big_b,
                web_height: big_h,
                thickness: h,
            } => {
                let b = h;
                let centroid_y = ((big_h + h / 2.0) * h * big_b + big_h.powi(2) * b / 2.0)
                    / self.area();
                let ixx = b * big_h * (centroid_y - big_h / 2.0).powi(2)
                    + h * big_h.powi(3) / 12.0
                    + h * big_b * (big_h + h / 2.0 - centroid_y).powi(2)
                    + h.powi(3) * big_b / 12.0;
                let iyy = b.powi(3) * big_h / 12.0 + big_b.powi(3) * h / 12.0;
                (ixx, iyy)
            }
            CrossSection::Channel {
                flange_width: big_b,
                web_height: big_h,
                thickness: h,
            } => {
                let b = h;
                let centroid_x =
                    (2.0 * h * big_b.powi(2) / 2.0 + b.powi(2) * big_h / 2.0) / self.area();
                let iyy = big_h.powi(3) * b / 12.0
                    + b * big_h * (centroid_x - b / 2.0).powi(2)
                    + 2.0 * big_b.powi(3) * h / 12.0
                    + 2.0 * big_b * h * (centroid_x - big_b / 2.0).powi(2);
                let ixx = big_h.powi(3) * b / 12.0
                    + 2.0 * (h.powi(3) * big_b / 12.0 + h * big_b * (h + big_h).powi(2) / 4.0);
                (ixx, iyy)
            }
        }
    }

    /// Smallest principal second moment, governing Euler buckling.
    #[must_use]
    pub fn weak_axis_inertia(&self) -> f64 {
        let (ixx, iyy) = self.second_moments();
        ixx.min(iyy)
    }
}
