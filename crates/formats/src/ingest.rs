use foundation::math::GeoPoint;
use scene::{FeatureIndex, FeatureIndexBuilder, Polygon, Ring, normalize_code};

use crate::geojson::{CountryProperties, GeographyDocument};

pub type PropertyAccessor = fn(&CountryProperties) -> Option<&str>;

fn iso_a2_eh(p: &CountryProperties) -> Option<&str> {
    p.iso_a2_eh.as_deref()
}

fn iso_a2(p: &CountryProperties) -> Option<&str> {
    p.iso_a2.as_deref()
}

fn wb_a2(p: &CountryProperties) -> Option<&str> {
    p.wb_a2.as_deref()
}

fn name_long(p: &CountryProperties) -> Option<&str> {
    p.name_long.as_deref()
}

fn admin(p: &CountryProperties) -> Option<&str> {
    p.admin.as_deref()
}

fn name(p: &CountryProperties) -> Option<&str> {
    p.name.as_deref()
}

fn sovereignt(p: &CountryProperties) -> Option<&str> {
    p.sovereignt.as_deref()
}

fn geounit(p: &CountryProperties) -> Option<&str> {
    p.geounit.as_deref()
}

/// Candidate code fields, most specific first.
pub const CODE_ACCESSORS: &[PropertyAccessor] = &[iso_a2_eh, iso_a2, wb_a2];

/// Candidate display-name fields, most descriptive first.
pub const NAME_ACCESSORS: &[PropertyAccessor] = &[name_long, admin, name, sovereignt, geounit];

/// First accessor yielding a normalized code.
pub fn country_code(props: &CountryProperties) -> Option<String> {
    CODE_ACCESSORS
        .iter()
        .find_map(|get| get(props).and_then(normalize_code))
}

/// First accessor yielding a non-blank name.
pub fn country_name(props: &CountryProperties) -> Option<String> {
    NAME_ACCESSORS.iter().find_map(|get| {
        get(props)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

fn polygon_from_rings(rings: &[Vec<GeoPoint>]) -> Option<Polygon> {
    let (outer, holes) = rings.split_first()?;
    Polygon::new(
        Ring::new(outer.clone()),
        holes.iter().map(|h| Ring::new(h.clone())).collect(),
    )
}

/// Builds the feature index in document order. Features without area
/// geometry are skipped; features without a code are kept for picking.
pub fn build_feature_index(doc: &GeographyDocument) -> FeatureIndex {
    let mut builder = FeatureIndexBuilder::new();
    let mut skipped = 0usize;

    for record in &doc.features {
        let Some(geometry) = &record.geometry else {
            skipped += 1;
            continue;
        };
        let polygons: Vec<Polygon> = geometry
            .polygons()
            .into_iter()
            .filter_map(polygon_from_rings)
            .collect();

        let pushed = builder.push(
            country_code(&record.properties),
            country_name(&record.properties),
            polygons,
        );
        if pushed.is_none() {
            skipped += 1;
        }
    }

    let index = builder.build();
    tracing::debug!(
        features = index.len(),
        codes = index.code_count(),
        skipped,
        "feature index built"
    );
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn code_candidates_are_tried_in_order() {
        let props = CountryProperties {
            iso_a2_eh: Some("-99".into()),
            iso_a2: Some(" ".into()),
            wb_a2: Some("xk".into()),
            ..Default::default()
        };
        assert_eq!(country_code(&props), Some("XK".to_string()));

        let props = CountryProperties {
            iso_a2_eh: Some("fr".into()),
            iso_a2: Some("-99".into()),
            ..Default::default()
        };
        assert_eq!(country_code(&props), Some("FR".to_string()));
        assert_eq!(country_code(&CountryProperties::default()), None);
    }

    #[test]
    fn name_candidates_are_tried_in_order() {
        let props = CountryProperties {
            admin: Some("Admin".into()),
            name: Some("Short".into()),
            ..Default::default()
        };
        assert_eq!(country_name(&props), Some("Admin".to_string()));
    }

    #[test]
    fn builds_index_from_document() {
        let doc = GeographyDocument::from_geojson_str(
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","properties":{"ISO_A2":"ab","NAME":"Alpha"},
                 "geometry":{"type":"Polygon","coordinates":[[[10,10],[20,10],[20,20],[10,20]]]}},
                {"type":"Feature","properties":{"ISO_A2":"-99"},
                 "geometry":{"type":"MultiPolygon","coordinates":[[[[0,0],[1,0],[1,1]]],[[]]]}},
                {"type":"Feature","properties":{"ISO_A2":"CD"},"geometry":null},
                {"type":"Feature","properties":{"ISO_A2":"AB","NAME":"Dup"},
                 "geometry":{"type":"Polygon","coordinates":[[[30,30],[31,30],[31,31]]]}}
            ]}"#,
        )
        .unwrap();
        let index = build_feature_index(&doc);

        assert_eq!(index.len(), 3);
        assert_eq!(index.code_count(), 1);
        assert_eq!(index.find_by_code("ab").unwrap().name.as_deref(), Some("Alpha"));
        assert!(index.find_by_code("CD").is_none());

        // empty outer ring is dropped, the rest of the multipolygon survives
        let codeless = &index.features()[1];
        assert_eq!(codeless.code, None);
        assert_eq!(codeless.polygons.len(), 1);
    }
}
