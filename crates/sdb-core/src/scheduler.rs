use std::fmt;
use std::str::FromStr;
use log::debug;
use serde::{Deserialize, Serialize};
use crate::config::RunConfig;
use crate::error::{Error, Result};

/// Scheduler algorithm families the engine understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchedulerKind {
    /// Linear multistep, for pure text-to-image runs
    Lms,
    /// Pseudo numerical methods, tolerant of an injected initial image
    Pndm,
}

impl SchedulerKind {
    pub fn name(&self) -> &str {
        match self {
            Self::Lms => "LMSDiscreteScheduler",
            Self::Pndm => "PNDMScheduler",
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Lms => "lms",
            Self::Pndm => "pndm",
        }
    }
}

/// Interpolation curve for the beta (noise variance) schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BetaSchedule {
    Linear,
    ScaledLinear,
    SquaredcosCapV2,
}

impl BetaSchedule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::ScaledLinear => "scaled_linear",
            Self::SquaredcosCapV2 => "squaredcos_cap_v2",
        }
    }

    pub fn all() -> [BetaSchedule; 3] {
        [Self::Linear, Self::ScaledLinear, Self::SquaredcosCapV2]
    }
}

impl fmt::Display for BetaSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BetaSchedule {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::all()
            .into_iter()
            .find(|schedule| schedule.as_str() == s)
            .ok_or_else(|| {
                let supported: Vec<&str> = Self::all().iter().map(|s| s.as_str()).collect();
                Error::Configuration(format!(
                    "unsupported beta schedule '{}' (expected one of: {})",
                    s,
                    supported.join(", ")
                ))
            })
    }
}

/// A constructed scheduler, consumed by exactly one engine call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerSpec {
    pub kind: SchedulerKind,
    pub beta_start: f64,
    pub beta_end: f64,
    pub beta_schedule: BetaSchedule,
    /// Only ever set for PNDM
    pub skip_prk_steps: Option<bool>,
    pub tensor_format: String,
}

pub struct SchedulerFactory;

impl SchedulerFactory {
    /// Text-to-image runs get LMS. Anything with an init image, masked or
    /// not, gets PNDM with Runge-Kutta steps skipped.
    pub fn build(config: &RunConfig) -> Result<SchedulerSpec> {
        let beta_schedule: BetaSchedule = config.beta_schedule.parse()?;
        Self::check_betas(config.beta_start, config.beta_end)?;

        let (kind, skip_prk_steps) = if config.init_image.is_none() {
            (SchedulerKind::Lms, None)
        } else {
            (SchedulerKind::Pndm, Some(true))
        };

        debug!(
            "Built {} (beta {}..{}, {})",
            kind.name(),
            config.beta_start,
            config.beta_end,
            beta_schedule
        );

        Ok(SchedulerSpec {
            kind,
            beta_start: config.beta_start,
            beta_end: config.beta_end,
            beta_schedule,
            skip_prk_steps,
            tensor_format: "np".to_string(),
        })
    }

    fn check_betas(beta_start: f64, beta_end: f64) -> Result<()> {
        if !beta_start.is_finite() || !beta_end.is_finite() || beta_start < 0.0 {
            return Err(Error::Configuration(format!(
                "beta bounds must be finite and non-negative, got {}..{}",
                beta_start, beta_end
            )));
        }
        if beta_start > beta_end {
            return Err(Error::Configuration(format!(
                "beta-start ({}) must not exceed beta-end ({})",
                beta_start, beta_end
            )));
        }
        Ok(())
    }
}
