use log::error;

use crate::catalog::RawProblem;

const FALLBACK_JSON: &str = include_str!("data/fallback_problems.json");

pub fn problems() -> Vec<RawProblem> {
    match serde_json::from_str(FALLBACK_JSON) {
        Ok(problems) => problems,
        Err(e) => {
            error!("Bundled fallback dataset is malformed: {}", e);
            Vec::new()
        }
    }
}
