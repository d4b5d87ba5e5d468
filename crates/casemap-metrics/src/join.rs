//! Merges region metrics into a boundary document's feature properties.
//!
//! Supports TopoJSON (`"type": "Topology"`, features under
//! `objects.*.geometries`) and GeoJSON (`"type": "FeatureCollection"`).
//! Only the metric fields of matching features are written; geometry and
//! every other property are left as they were.

use std::collections::HashMap;

use casemap_core::RegionMetric;
use serde_json::{Map, Value};

use crate::error::MetricError;

/// Which metrics found a feature and which did not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinReport {
    pub joined: Vec<String>,
    /// Regions with a metric but no matching feature.
    pub skipped: Vec<String>,
}

type Properties = Map<String, Value>;

/// Writes each metric onto the feature whose `key` property equals its
/// region code.
///
/// # Errors
///
/// Returns [`MetricError::UnsupportedBoundary`] if the document is neither a
/// TopoJSON topology nor a GeoJSON feature collection.
pub fn join_metrics(
    doc: &mut Value,
    metrics: &[RegionMetric],
    key: &str,
) -> Result<JoinReport, MetricError> {
    let mut features = feature_properties(doc)?;

    let mut index: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, props) in features.iter().enumerate() {
        if let Some(code) = props.get(key).and_then(Value::as_str) {
            index.entry(code.trim().to_ascii_uppercase()).or_default().push(i);
        }
    }

    let mut report = JoinReport::default();
    for metric in metrics {
        let Some(targets) = index.get(&metric.region.to_ascii_uppercase()) else {
            tracing::warn!(region = %metric.region, "no boundary feature for region; skipped");
            report.skipped.push(metric.region.clone());
            continue;
        };
        if targets.len() > 1 {
            tracing::warn!(
                region = %metric.region,
                features = targets.len(),
                "several boundary features share a region code; writing to all"
            );
        }

        let Value::Object(fields) = serde_json::to_value(metric)? else {
            continue;
        };
        for &i in targets {
            for (name, value) in &fields {
                features[i].insert(name.clone(), value.clone());
            }
        }
        report.joined.push(metric.region.clone());
    }

    Ok(report)
}

/// Lists the region codes carried under `key`, in document order.
///
/// # Errors
///
/// Returns [`MetricError::UnsupportedBoundary`] for the same shapes
/// [`join_metrics`] rejects.
pub fn boundary_region_codes(doc: &Value, key: &str) -> Result<Vec<String>, MetricError> {
    let codes = feature_properties_ref(doc)?
        .into_iter()
        .filter_map(|props| props.get(key).and_then(Value::as_str))
        .map(|code| code.trim().to_ascii_uppercase())
        .collect();
    Ok(codes)
}

/// The two supported boundary layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    /// Features under `objects.*.geometries`.
    Topology,
    /// Features under `features[].properties`.
    FeatureCollection,
}

/// Checks the document shape before either walker touches it.
fn layout(doc: &Value) -> Result<Layout, MetricError> {
    let Value::Object(root) = doc else {
        return Err(MetricError::UnsupportedBoundary(
            "document is not a JSON object".to_string(),
        ));
    };
    match root.get("type").and_then(Value::as_str).unwrap_or("") {
        "Topology" => match root.get("objects") {
            Some(Value::Object(_)) => Ok(Layout::Topology),
            _ => Err(MetricError::UnsupportedBoundary(
                "topology has no objects".to_string(),
            )),
        },
        "FeatureCollection" => match root.get("features") {
            Some(Value::Array(_)) => Ok(Layout::FeatureCollection),
            _ => Err(MetricError::UnsupportedBoundary(
                "feature collection has no features".to_string(),
            )),
        },
        other => Err(MetricError::UnsupportedBoundary(format!(
            "unexpected document type '{other}'"
        ))),
    }
}

/// Collects a mutable handle on every feature's property bag.
fn feature_properties(doc: &mut Value) -> Result<Vec<&mut Properties>, MetricError> {
    let layout = layout(doc)?;
    let mut out = Vec::new();
    match (layout, doc) {
        (Layout::Topology, Value::Object(root)) => {
            if let Some(Value::Object(objects)) = root.get_mut("objects") {
                for object in objects.values_mut() {
                    collect_geometry_properties(object, &mut out);
                }
            }
        }
        (Layout::FeatureCollection, Value::Object(root)) => {
            if let Some(Value::Array(features)) = root.get_mut("features") {
                for feature in features {
                    if let Some(Value::Object(props)) = feature.get_mut("properties") {
                        out.push(props);
                    }
                }
            }
        }
        _ => {}
    }
    Ok(out)
}

/// Read-only counterpart of [`feature_properties`].
fn feature_properties_ref(doc: &Value) -> Result<Vec<&Properties>, MetricError> {
    let mut out = Vec::new();
    match layout(doc)? {
        Layout::Topology => {
            if let Some(Value::Object(objects)) = doc.get("objects") {
                for object in objects.values() {
                    collect_geometry_properties_ref(object, &mut out);
                }
            }
        }
        Layout::FeatureCollection => {
            if let Some(Value::Array(features)) = doc.get("features") {
                out.extend(
                    features
                        .iter()
                        .filter_map(|f| f.get("properties").and_then(Value::as_object)),
                );
            }
        }
    }
    Ok(out)
}

/// Walks a TopoJSON geometry, descending into geometry collections.
fn collect_geometry_properties<'a>(geometry: &'a mut Value, out: &mut Vec<&'a mut Properties>) {
    let Value::Object(obj) = geometry else {
        return;
    };
    if obj.contains_key("geometries") {
        if let Some(Value::Array(children)) = obj.get_mut("geometries") {
            for child in children {
                collect_geometry_properties(child, out);
            }
        }
        return;
    }
    if let Some(Value::Object(props)) = obj.get_mut("properties") {
        out.push(props);
    }
}

fn collect_geometry_properties_ref<'a>(geometry: &'a Value, out: &mut Vec<&'a Properties>) {
    let Value::Object(obj) = geometry else {
        return;
    };
    if let Some(children) = obj.get("geometries") {
        for child in children.as_array().into_iter().flatten() {
            collect_geometry_properties_ref(child, out);
        }
        return;
    }
    if let Some(props) = obj.get("properties").and_then(Value::as_object) {
        out.push(props);
    }
}
