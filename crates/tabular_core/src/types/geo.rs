use crate::{Cell, Field, GeoPoint, Value};
use serde_json::Map;

const GEOJSON_TYPES: &[&str] = &[
    "Point",
    "MultiPoint",
    "LineString",
    "MultiLineString",
    "Polygon",
    "MultiPolygon",
    "GeometryCollection",
    "Feature",
    "FeatureCollection",
];

/// Accepts a JSON object or a string holding one.
fn json_object(cell: &Cell) -> Option<Map<String, Cell>> {
    match cell {
        Cell::Object(map) => Some(map.clone()),
        Cell::String(text) => match serde_json::from_str(text).ok()? {
            Cell::Object(map) => Some(map),
            _ => None,
        },
        _ => None,
    }
}

fn coordinate(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(number) => number.as_f64(),
        Cell::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

pub(super) fn read_geopoint(field: &Field, cell: &Cell) -> Option<Value> {
    let (lon, lat) = match field.format() {
        "array" => {
            let items = match cell {
                Cell::Array(items) => items.clone(),
                Cell::String(text) => serde_json::from_str::<Vec<Cell>>(text).ok()?,
                _ => return None,
            };
            match items.as_slice() {
                [lon, lat] => (coordinate(lon)?, coordinate(lat)?),
                _ => return None,
            }
        }
        "object" => {
            let map = json_object(cell)?;
            if map.len() != 2 {
                return None;
            }
            (coordinate(map.get("lon")?)?, coordinate(map.get("lat")?)?)
        }
        _ => {
            let (lon, lat) = cell.as_str()?.split_once(',')?;
            (lon.trim().parse().ok()?, lat.trim().parse().ok()?)
        }
    };
    GeoPoint::new(lon, lat).map(Value::GeoPoint)
}

pub(super) fn write_geopoint(field: &Field, point: &GeoPoint) -> String {
    match field.format() {
        "array" => format!("[{}, {}]", point.lon, point.lat),
        "object" => format!("{{\"lon\": {}, \"lat\": {}}}", point.lon, point.lat),
        _ => point.to_string(),
    }
}

pub(super) fn read_geojson(field: &Field, cell: &Cell) -> Option<Value> {
    let map = json_object(cell)?;
    let kind = map.get("type")?.as_str()?;
    let valid = match field.format() {
        "topojson" => kind == "Topology",
        _ => GEOJSON_TYPES.contains(&kind),
    };
    valid.then_some(Value::GeoJson(map))
}

#[cfg(test)]
mod tests {
    use crate::{Field, FieldType, GeoPoint, Value};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn geopoint(format: &str) -> Field {
        let mut field = Field::new("location", FieldType::Geopoint);
        field.format = format.to_string();
        field
    }

    #[test]
    fn test_read_geopoint_default() {
        let field = geopoint("default");
        assert_eq!(
            field.read_cell(&json!("90, 45")).0,
            Some(Value::GeoPoint(GeoPoint { lon: 90.0, lat: 45.0 }))
        );
        assert_eq!(field.read_cell(&json!("181, 45")).0, None);
        assert_eq!(field.read_cell(&json!("90")).0, None);
        assert_eq!(
            field.write_cell(Some(&Value::GeoPoint(GeoPoint { lon: 90.5, lat: 45.0 }))).0,
            Some("90.5, 45".to_string())
        );
    }

    #[test]
    fn test_read_geopoint_array_and_object() {
        let field = geopoint("array");
        assert!(field.read_cell(&json!([90, 45])).0.is_some());
        assert!(field.read_cell(&json!("[90, 45]")).0.is_some());
        assert!(field.read_cell(&json!([90, 45, 1])).0.is_none());

        let field = geopoint("object");
        assert!(field.read_cell(&json!({"lon": 90, "lat": 45})).0.is_some());
        assert!(field.read_cell(&json!("{\"lon\": 90, \"lat\": 45}")).0.is_some());
        assert!(field.read_cell(&json!({"lon": 90})).0.is_none());
    }

    #[test]
    fn test_read_geojson() {
        let field = Field::new("shape", FieldType::Geojson);
        assert!(
            field
                .read_cell(&json!({"type": "Point", "coordinates": [0, 0]}))
                .0
                .is_some()
        );
        assert!(field.read_cell(&json!("{\"type\": \"Point\"}")).0.is_some());
        assert!(field.read_cell(&json!({"type": "Circle"})).0.is_none());
        assert!(field.read_cell(&json!("not json")).0.is_none());

        let mut topo = Field::new("shape", FieldType::Geojson);
        topo.format = "topojson".into();
        assert!(topo.read_cell(&json!({"type": "Topology"})).0.is_some());
    }
}
