//! Search and filtering over the current job batch, as offered by the map/list UI.

use std::collections::BTreeSet;

use serde::Deserialize;

use crate::errors::AppError;
use crate::feed::JobRecord;
use crate::geo::distance::haversine_km;
use crate::geo::Coordinates;
use crate::parsing::ContractType;

/// Radius applied when a search location is given without one.
pub const DEFAULT_RADIUS_KM: f64 = 30.0;
const MAX_LOCATIONS: usize = 10;

/// Query-string parameters of `GET /api/v1/jobs`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobQuery {
    /// Free-text search over title, city and department.
    pub q: Option<String>,
    /// Contract type name or label; "Tous"/"all" means no filter.
    #[serde(rename = "type")]
    pub contract_type: Option<String>,
    /// City or department substring.
    pub location: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub radius_km: Option<f64>,
    #[serde(default)]
    pub located_only: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobFilter {
    search: Option<String>,
    contract_type: Option<ContractType>,
    location: Option<String>,
    near: Option<(Coordinates, f64)>,
    located_only: bool,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl JobFilter {
    pub fn from_query(query: JobQuery) -> Result<Self, AppError> {
        let contract_type = match non_empty(query.contract_type) {
            None => None,
            Some(t) if t.eq_ignore_ascii_case("tous") || t.eq_ignore_ascii_case("all") => None,
            Some(t) => Some(
                t.parse::<ContractType>()
                    .map_err(|e| AppError::Validation(e.to_string()))?,
            ),
        };

        let near = match (query.lat, query.lon) {
            (Some(lat), Some(lon)) => {
                if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
                    return Err(AppError::Validation(format!(
                        "lat/lon out of range: {lat}, {lon}"
                    )));
                }
                let radius = query.radius_km.unwrap_or(DEFAULT_RADIUS_KM);
                if radius < 0.0 || !radius.is_finite() {
                    return Err(AppError::Validation(format!(
                        "radius_km must be a non-negative number, got {radius}"
                    )));
                }
                // Radius 0 switches the distance filter off.
                (radius > 0.0).then_some((Coordinates::new(lat, lon), radius))
            }
            (None, None) => None,
            _ => {
                return Err(AppError::Validation(
                    "lat and lon must be given together".to_string(),
                ))
            }
        };

        Ok(JobFilter {
            search: non_empty(query.q).map(|s| s.to_lowercase()),
            contract_type,
            location: non_empty(query.location),
            near,
            located_only: query.located_only,
        })
    }

    pub fn matches(&self, job: &JobRecord) -> bool {
        if self.located_only && job.coordinates.is_none() {
            return false;
        }

        if let Some((center, radius)) = self.near {
            match job.coordinates {
                Some(coords) if haversine_km(center, coords) <= radius => {}
                _ => return false,
            }
        }

        if let Some(kind) = self.contract_type {
            if job.contract_type != kind {
                return false;
            }
        }

        if let Some(location) = &self.location {
            let wanted = location.to_lowercase();
            if !job.city.to_lowercase().contains(&wanted)
                && !job.department.contains(location.as_str())
            {
                return false;
            }
        }

        if let Some(term) = &self.search {
            let hit = job.title.to_lowercase().contains(term)
                || job.city.to_lowercase().contains(term)
                || job.department.contains(term.as_str());
            if !hit {
                return false;
            }
        }

        true
    }

    pub fn apply(&self, jobs: Vec<JobRecord>) -> Vec<JobRecord> {
        jobs.into_iter().filter(|j| self.matches(j)).collect()
    }
}

/// Distinct cities of the batch, sorted, capped for the location dropdown.
pub fn distinct_locations(jobs: &[JobRecord]) -> Vec<String> {
    jobs.iter()
        .filter(|j| !j.city.is_empty())
        .map(|j| j.city.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .take(MAX_LOCATIONS)
        .collect()
}
