// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Fused trailing activations and bias broadcast.

use inference_core::{EngineError, EngineResult};

/// Slope of the negative half of [`Activation::LeakyRelu`].
const LEAKY_SLOPE: f32 = 0.1;

/// An activation fused onto the tail of an operator's forward step.
///
/// Applied in place over the entire output buffer, identically on the
/// portable and accelerated compute paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Relu,
    LeakyRelu,
}

impl Activation {
    /// Parses the `activation` operator parameter.
    ///
    /// The empty string (the parameter default) and `"none"` mean no fused
    /// activation; any other unknown name is a parameter error.
    pub fn parse(name: &str) -> EngineResult<Option<Activation>> {
        match name {
            "" | "none" => Ok(None),
            "relu" => Ok(Some(Activation::Relu)),
            "leaky_relu" => Ok(Some(Activation::LeakyRelu)),
            other => Err(EngineError::BadParam {
                name: "activation".to_string(),
                detail: format!("unknown activation '{other}'"),
            }),
        }
    }

    /// Applies the activation in place.
    pub fn apply(self, data: &mut [f32]) {
        match self {
            Activation::Relu => {
                for v in data.iter_mut() {
                    if *v < 0.0 {
                        *v = 0.0;
                    }
                }
            }
            Activation::LeakyRelu => {
                for v in data.iter_mut() {
                    if *v < 0.0 {
                        *v *= LEAKY_SLOPE;
                    }
                }
            }
        }
    }
}

/// Broadcast-adds one bias value per channel plane of a single image.
///
/// `image` is `[channels, spatial]` row-major with `channels == bias.len()`.
pub fn add_bias(image: &mut [f32], bias: &[f32], spatial: usize) {
    debug_assert!(image.len() >= bias.len() * spatial);
    for (c, &b) in bias.iter().enumerate() {
        for v in &mut image[c * spatial..(c + 1) * spatial] {
            *v += b;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(Activation::parse("").unwrap(), None);
        assert_eq!(Activation::parse("none").unwrap(), None);
        assert_eq!(Activation::parse("relu").unwrap(), Some(Activation::Relu));
        assert_eq!(
            Activation::parse("leaky_relu").unwrap(),
            Some(Activation::LeakyRelu)
        );
        assert!(matches!(
            Activation::parse("swish"),
            Err(EngineError::BadParam { .. })
        ));
    }

    #[test]
    fn test_relu() {
        let mut data = [-2.0, -0.5, 0.0, 0.5, 2.0];
        Activation::Relu.apply(&mut data);
        assert_eq!(data, [0.0, 0.0, 0.0, 0.5, 2.0]);
    }

    #[test]
    fn test_leaky_relu() {
        let mut data = [-2.0, 0.0, 3.0];
        Activation::LeakyRelu.apply(&mut data);
        assert_eq!(data, [-0.2, 0.0, 3.0]);
    }

    #[test]
    fn test_add_bias() {
        let mut image = [0.0, 1.0, 10.0, 11.0];
        add_bias(&mut image, &[1.0, -1.0], 2);
        assert_eq!(image, [1.0, 2.0, 9.0, 10.0]);
    }
}
