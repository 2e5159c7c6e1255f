use common::intersects;

use crate::{ExperimentError, Registry, Restriction, Result};

/// Whether a registered model can run against a registered problem
pub fn compatible(registry: &Registry, problem_id: &str, model_id: &str) -> Result<bool> {
    let problem = registry.problem(problem_id)?;
    let model = registry.model(model_id)?;

    Ok(intersects(problem.compatibles(), model.compatibles()))
}

/// The (problem, model) pairs to run, in problems-then-models order.
///
/// Without a restriction this is the capability filtered cross product.
/// With one it is exactly the enumerated pairs, still in `models` order; incompatible ones are kept
/// and reported so that the runner records a failed trial for them.
/// A restriction naming ids outside of `problems` or `models` is rejected.
pub fn pairs(
    registry: &Registry,
    problems: &[String],
    models: &[String],
    restriction: Option<&Restriction>,
) -> Result<Vec<(String, String)>> {
    if let Some(restriction) = restriction {
        for (problem_id, model_ids) in restriction.iter() {
            if !problems.contains(problem_id) {
                return Err(ExperimentError::InvalidConfig(format!(
                    "restriction names problem `{}` which is not part of the experiment",
                    problem_id
                )));
            }
            if let Some(m) = model_ids.iter().find(|m| !models.contains(m)) {
                return Err(ExperimentError::InvalidConfig(format!(
                    "restriction names model `{}` which is not part of the experiment",
                    m
                )));
            }
        }
    }

    let mut out = Vec::new();
    for problem_id in problems {
        for model_id in models {
            let ok = compatible(registry, problem_id, model_id)?;
            match restriction {
                None => {
                    if ok {
                        out.push((problem_id.clone(), model_id.clone()));
                    } else {
                        debug!("skipping incompatible pair ({}, {})", problem_id, model_id);
                    }
                }
                Some(restriction) => {
                    let listed = restriction
                        .get(problem_id)
                        .map(|ms| ms.contains(model_id))
                        .unwrap_or(false);
                    if !listed {
                        continue;
                    }
                    if !ok {
                        warn!(
                            "model {} is not compatible with problem {}, the trial will be recorded as failed",
                            model_id, problem_id
                        );
                    }
                    out.push((problem_id.clone(), model_id.clone()));
                }
            }
        }
    }

    Ok(out)
}
