use foundation::math::GeoPoint;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Country attributes carried by a feature. Only the fields the globe reads
/// are typed; everything else is kept verbatim in `other`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CountryProperties {
    #[serde(rename = "ISO_A2_EH", default, deserialize_with = "lenient_string")]
    pub iso_a2_eh: Option<String>,
    #[serde(rename = "ISO_A2", default, deserialize_with = "lenient_string")]
    pub iso_a2: Option<String>,
    #[serde(rename = "WB_A2", default, deserialize_with = "lenient_string")]
    pub wb_a2: Option<String>,
    #[serde(rename = "NAME_LONG", default, deserialize_with = "lenient_string")]
    pub name_long: Option<String>,
    #[serde(rename = "ADMIN", default, deserialize_with = "lenient_string")]
    pub admin: Option<String>,
    #[serde(rename = "NAME", default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(rename = "SOVEREIGNT", default, deserialize_with = "lenient_string")]
    pub sovereignt: Option<String>,
    #[serde(rename = "GEOUNIT", default, deserialize_with = "lenient_string")]
    pub geounit: Option<String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// Strings pass through, numbers and booleans are stringified, anything else
/// reads as absent.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// Area geometry; rings are `[outer, hole, hole, ...]`.
#[derive(Debug, Clone, PartialEq)]
pub enum AreaGeometry {
    Polygon(Vec<Vec<GeoPoint>>),
    MultiPolygon(Vec<Vec<Vec<GeoPoint>>>),
}

impl AreaGeometry {
    /// Polygons as ring lists, regardless of the geometry kind.
    pub fn polygons(&self) -> Vec<&[Vec<GeoPoint>]> {
        match self {
            AreaGeometry::Polygon(rings) => vec![rings.as_slice()],
            AreaGeometry::MultiPolygon(polys) => polys.iter().map(|p| p.as_slice()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeoFeatureRecord {
    pub id: Option<String>,
    pub properties: CountryProperties,
    /// `None` for null geometry or for non-area geometry kinds.
    pub geometry: Option<AreaGeometry>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeographyDocument {
    pub features: Vec<GeoFeatureRecord>,
}

#[derive(Debug)]
pub enum GeoJsonError {
    InvalidJson(String),
    NotAFeatureCollection,
    InvalidFeature { index: usize, reason: String },
}

impl std::fmt::Display for GeoJsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeoJsonError::InvalidJson(e) => write!(f, "JSON parse error: {e}"),
            GeoJsonError::NotAFeatureCollection => {
                write!(f, "expected GeoJSON FeatureCollection")
            }
            GeoJsonError::InvalidFeature { index, reason } => {
                write!(f, "invalid feature at index {index}: {reason}")
            }
        }
    }
}

impl std::error::Error for GeoJsonError {}

impl GeographyDocument {
    pub fn from_geojson_str(payload: &str) -> Result<Self, GeoJsonError> {
        let value: Value =
            serde_json::from_str(payload).map_err(|e| GeoJsonError::InvalidJson(e.to_string()))?;
        Self::from_geojson_value(value)
    }

    pub fn from_geojson_value(value: Value) -> Result<Self, GeoJsonError> {
        let obj = value.as_object().ok_or(GeoJsonError::NotAFeatureCollection)?;
        let ty = obj
            .get("type")
            .and_then(|v| v.as_str())
            .ok_or(GeoJsonError::NotAFeatureCollection)?;
        if ty != "FeatureCollection" {
            return Err(GeoJsonError::NotAFeatureCollection);
        }

        let features_val = obj
            .get("features")
            .and_then(|v| v.as_array())
            .ok_or(GeoJsonError::NotAFeatureCollection)?;

        let mut features = Vec::with_capacity(features_val.len());
        for (index, feat_val) in features_val.iter().enumerate() {
            let feat_obj = feat_val.as_object().ok_or(GeoJsonError::InvalidFeature {
                index,
                reason: "feature must be an object".to_string(),
            })?;

            let feat_type = feat_obj.get("type").and_then(|v| v.as_str()).ok_or(
                GeoJsonError::InvalidFeature {
                    index,
                    reason: "feature missing type".to_string(),
                },
            )?;
            if feat_type != "Feature" {
                return Err(GeoJsonError::InvalidFeature {
                    index,
                    reason: format!("unexpected feature type: {feat_type}"),
                });
            }

            let id = match feat_obj.get("id") {
                Some(Value::String(s)) => Some(s.clone()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            };

            let properties = match feat_obj.get("properties") {
                Some(v @ Value::Object(_)) => CountryProperties::deserialize(v).map_err(|e| {
                    GeoJsonError::InvalidFeature {
                        index,
                        reason: format!("bad properties: {e}"),
                    }
                })?,
                _ => CountryProperties::default(),
            };

            let geometry = match feat_obj.get("geometry") {
                None | Some(Value::Null) => None,
                Some(g) => parse_area_geometry(g)
                    .map_err(|reason| GeoJsonError::InvalidFeature { index, reason })?,
            };

            features.push(GeoFeatureRecord {
                id,
                properties,
                geometry,
            });
        }

        Ok(Self { features })
    }
}

fn parse_area_geometry(value: &Value) -> Result<Option<AreaGeometry>, String> {
    let obj = value
        .as_object()
        .ok_or("geometry must be an object".to_string())?;
    let ty = obj
        .get("type")
        .and_then(|v| v.as_str())
        .ok_or("geometry missing type".to_string())?;

    let coords = || {
        obj.get("coordinates")
            .ok_or("geometry missing coordinates".to_string())
    };

    match ty {
        "Polygon" => Ok(Some(AreaGeometry::Polygon(parse_polygon(coords()?)?))),
        "MultiPolygon" => Ok(Some(AreaGeometry::MultiPolygon(parse_multi_polygon(
            coords()?,
        )?))),
        // points and lines carry no area to fill or pick
        _ => Ok(None),
    }
}

fn parse_point(coords: &Value) -> Result<GeoPoint, String> {
    let arr = coords
        .as_array()
        .ok_or("position must be an array".to_string())?;
    if arr.len() < 2 {
        return Err("position must have [lon, lat]".to_string());
    }
    let lon = arr[0].as_f64().ok_or("lon must be a number".to_string())?;
    let lat = arr[1].as_f64().ok_or("lat must be a number".to_string())?;
    Ok(GeoPoint::new(lon, lat))
}

fn parse_ring(coords: &Value) -> Result<Vec<GeoPoint>, String> {
    let arr = coords
        .as_array()
        .ok_or("ring must be an array".to_string())?;
    let mut out = Vec::with_capacity(arr.len());
    for item in arr {
        out.push(parse_point(item)?);
    }
    Ok(out)
}

fn parse_polygon(coords: &Value) -> Result<Vec<Vec<GeoPoint>>, String> {
    let rings = coords
        .as_array()
        .ok_or("Polygon coordinates must be an array of rings".to_string())?;
    let mut out = Vec::with_capacity(rings.len());
    for ring in rings {
        out.push(parse_ring(ring)?);
    }
    Ok(out)
}

fn parse_multi_polygon(coords: &Value) -> Result<Vec<Vec<Vec<GeoPoint>>>, String> {
    let polys = coords
        .as_array()
        .ok_or("MultiPolygon coordinates must be an array of polygons".to_string())?;
    let mut out = Vec::with_capacity(polys.len());
    for poly in polys {
        out.push(parse_polygon(poly)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "id": 7,
                "properties": { "ISO_A2": " fr ", "ISO_A2_EH": "-99", "NAME": "France", "POP_EST": 67 },
                "geometry": { "type": "Polygon", "coordinates": [[[0,40],[10,40],[10,50],[0,50]]] }
            },
            {
                "type": "Feature",
                "properties": { "WB_A2": 12 },
                "geometry": { "type": "MultiPolygon", "coordinates": [
                    [[[0,0],[1,0],[1,1],[0,0]]],
                    [[[5,5],[6,5],[6,6],[5,5]], [[5.2,5.2],[5.4,5.2],[5.4,5.4]]]
                ] }
            },
            { "type": "Feature", "properties": null, "geometry": null },
            { "type": "Feature", "properties": {}, "geometry": { "type": "Point", "coordinates": [1, 2] } }
        ]
    }"#;

    #[test]
    fn parses_area_features_and_properties() {
        let doc = GeographyDocument::from_geojson_str(SAMPLE).unwrap();
        assert_eq!(doc.features.len(), 4);

        let fr = &doc.features[0];
        assert_eq!(fr.id.as_deref(), Some("7"));
        assert_eq!(fr.properties.iso_a2.as_deref(), Some(" fr "));
        assert_eq!(fr.properties.iso_a2_eh.as_deref(), Some("-99"));
        assert_eq!(fr.properties.name.as_deref(), Some("France"));
        assert_eq!(fr.properties.other.get("POP_EST"), Some(&Value::from(67)));
        assert!(matches!(fr.geometry, Some(AreaGeometry::Polygon(ref r)) if r[0].len() == 4));

        let multi = &doc.features[1];
        assert_eq!(multi.properties.wb_a2.as_deref(), Some("12"));
        let polys = multi.geometry.as_ref().unwrap().polygons();
        assert_eq!(polys.len(), 2);
        assert_eq!(polys[1].len(), 2);
    }

    #[test]
    fn null_and_non_area_geometry_read_as_none() {
        let doc = GeographyDocument::from_geojson_str(SAMPLE).unwrap();
        assert!(doc.features[2].geometry.is_none());
        assert_eq!(doc.features[2].properties, CountryProperties::default());
        assert!(doc.features[3].geometry.is_none());
    }

    #[test]
    fn rejects_non_collections() {
        assert!(matches!(
            GeographyDocument::from_geojson_str(r#"{"type":"Feature"}"#),
            Err(GeoJsonError::NotAFeatureCollection)
        ));
        assert!(matches!(
            GeographyDocument::from_geojson_str("not json"),
            Err(GeoJsonError::InvalidJson(_))
        ));
    }

    #[test]
    fn malformed_coordinates_name_the_feature() {
        let bad = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{},"geometry":{"type":"Polygon","coordinates":[[["x",1]]]}}
        ]}"#;
        let err = GeographyDocument::from_geojson_str(bad).unwrap_err();
        assert!(matches!(err, GeoJsonError::InvalidFeature { index: 0, .. }));
        assert!(err.to_string().contains("index 0"));
    }
}
