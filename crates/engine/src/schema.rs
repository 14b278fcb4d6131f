//! Input schema: turns loosely-shaped generator output into validated steps.
//!
//! The generator returns JSON with every field optional and occasionally
//! wraps it in a markdown code fence.  Everything is normalised here so the
//! graph builder only ever sees well-formed [`RoadmapStep`]s.
//!
//! Rules enforced:
//! 1. A step must have a non-blank title.
//! 2. Missing ids become the step's input index; ids must be unique.
//! 3. Resources without a URL are dropped; unknown resource kinds become `article`.
//! 4. Dependencies are trimmed and de-duplicated.  Self references are kept:
//!    declaring one still selects DAG mode, and layout tolerates the loop.
//!
//! Dangling dependency ids are kept: the graph builder drops them silently.

use std::collections::HashSet;

use serde::Deserialize;
use serde_json::Value;

use crate::EngineError;
use crate::models::{CapstoneProject, Resource, ResourceKind, RoadmapStep};

// ---------------------------------------------------------------------------
// Raw wire shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawResource {
    title: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    url: Option<String>,
}

/// A step exactly as the generator may send it.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRoadmapStep {
    #[serde(default, deserialize_with = "id_from_any")]
    id: Option<String>,
    title: Option<String>,
    duration: Option<String>,
    description: Option<String>,
    detailed_explanation: Option<String>,
    #[serde(default)]
    resources: Vec<RawResource>,
    #[serde(default, deserialize_with = "ids_from_any")]
    dependencies: Vec<String>,
}

/// The generation envelope: `{ isValidRole, validationError?, roadmap?, suggestedProject? }`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEnvelope {
    is_valid_role: bool,
    validation_error: Option<String>,
    roadmap: Option<Vec<RawRoadmapStep>>,
    suggested_project: Option<CapstoneProject>,
}

/// LLMs emit ids as strings or numbers; accept both.
fn id_from_any<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(scalar_to_string(&Value::deserialize(deserializer)?))
}

fn ids_from_any<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items.iter().filter_map(scalar_to_string).collect(),
        other => scalar_to_string(&other).into_iter().collect(),
    })
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Parsed output
// ---------------------------------------------------------------------------

/// Validated result of parsing a generator payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRoadmap {
    pub steps: Vec<RoadmapStep>,
    pub suggested_project: Option<CapstoneProject>,
}

/// Parse a generator payload given as text.
///
/// Accepts a bare JSON array of steps or the generation envelope, optionally
/// wrapped in a ```` ```json ```` fence.
///
/// # Errors
/// - [`EngineError::Parse`] if the text is not JSON of an accepted shape.
/// - [`EngineError::InvalidRole`] if the envelope says the role was rejected.
/// - [`EngineError::EmptyRoadmap`] if there are no steps.
/// - [`EngineError::InvalidStep`] / [`EngineError::DuplicateStepId`] from [`normalize_steps`].
pub fn parse_roadmap(text: &str) -> Result<ParsedRoadmap, EngineError> {
    let value: Value = serde_json::from_str(strip_code_fence(text))?;
    parse_roadmap_value(value)
}

/// Same as [`parse_roadmap`] for an already-decoded JSON value.
pub fn parse_roadmap_value(value: Value) -> Result<ParsedRoadmap, EngineError> {
    if value.is_array() {
        let raw: Vec<RawRoadmapStep> = serde_json::from_value(value)?;
        return Ok(ParsedRoadmap {
            steps: normalize_steps(raw)?,
            suggested_project: None,
        });
    }

    let envelope: RawEnvelope = serde_json::from_value(value)?;
    if !envelope.is_valid_role {
        return Err(EngineError::InvalidRole(
            envelope
                .validation_error
                .unwrap_or_else(|| "the requested role is not a recognised job role".into()),
        ));
    }

    Ok(ParsedRoadmap {
        steps: normalize_steps(envelope.roadmap.unwrap_or_default())?,
        suggested_project: envelope.suggested_project,
    })
}

/// Shorthand when only the steps are needed.
pub fn parse_steps(text: &str) -> Result<Vec<RoadmapStep>, EngineError> {
    parse_roadmap(text).map(|parsed| parsed.steps)
}

/// Validate and normalise raw steps, preserving input order.
pub fn normalize_steps(raw: Vec<RawRoadmapStep>) -> Result<Vec<RoadmapStep>, EngineError> {
    if raw.is_empty() {
        return Err(EngineError::EmptyRoadmap);
    }

    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut steps = Vec::with_capacity(raw.len());

    for (index, step) in raw.into_iter().enumerate() {
        let title = non_blank(step.title).ok_or_else(|| EngineError::InvalidStep {
            index,
            reason: "missing title".into(),
        })?;

        let id = non_blank(step.id).unwrap_or_else(|| index.to_string());
        if !seen_ids.insert(id.clone()) {
            return Err(EngineError::DuplicateStepId(id));
        }

        let mut deps_seen: HashSet<String> = HashSet::new();
        let dependencies = step
            .dependencies
            .into_iter()
            .map(|d| d.trim().to_owned())
            .filter(|d| !d.is_empty() && deps_seen.insert(d.clone()))
            .collect();

        let resources = step
            .resources
            .into_iter()
            .filter_map(|r| {
                let url = non_blank(r.url)?;
                Some(Resource {
                    title: non_blank(r.title).unwrap_or_else(|| url.clone()),
                    kind: resource_kind(r.kind.as_deref()),
                    url,
                })
            })
            .collect();

        steps.push(RoadmapStep {
            id,
            title,
            duration: step.duration.unwrap_or_default(),
            description: step.description.unwrap_or_default(),
            detailed_explanation: non_blank(step.detailed_explanation),
            resources,
            dependencies,
        });
    }

    Ok(steps)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
}

fn resource_kind(kind: Option<&str>) -> ResourceKind {
    match kind.map(|k| k.trim().to_ascii_lowercase()).as_deref() {
        Some("video") => ResourceKind::Video,
        Some("course") => ResourceKind::Course,
        Some("documentation") | Some("docs") => ResourceKind::Documentation,
        _ => ResourceKind::Article,
    }
}

/// Remove a surrounding markdown code fence, if present.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
