//! Records for the same acquisition must come out identical from every backend.

use forcesar_cloud::{asf, resto};
use forcesar_core::{Repository, SceneRecord};

const RESTO_PAGE: &str = r#"{
  "type": "FeatureCollection",
  "properties": {"totalResults": 1, "links": []},
  "features": [{
    "type": "Feature",
    "id": "1a2b",
    "properties": {
      "completionDate": "2023-01-05T17:22:40.000Z",
      "relativeOrbitNumber": 44,
      "orbitDirection": "ASCENDING",
      "productType": "GRD",
      "processingLevel": "LEVEL1",
      "platform": "S1A",
      "sensorMode": "IW",
      "centroid": {"type": "Point", "coordinates": [9.1, 48.3]},
      "productIdentifier": "/eodata/Sentinel-1/SAR/GRD/2023/01/05/S1A_IW_GRDH_1SDV_20230105T172215_20230105T172240_046640_05973D_1A2B.SAFE",
      "gmlgeometry": "<gml:coordinates>7.9,47.1 10.3,47.1 10.3,49.5 7.9,49.5 7.9,47.1</gml:coordinates>"
    }
  }]
}"#;

const ASF_RESPONSE: &str = r#"{
  "type": "FeatureCollection",
  "features": [{
    "type": "Feature",
    "geometry": {
      "type": "Polygon",
      "coordinates": [[[7.9, 47.1], [10.3, 47.1], [10.3, 49.5], [7.9, 49.5], [7.9, 47.1]]]
    },
    "properties": {
      "fileID": "S1A_IW_GRDH_1SDV_20230105T172215_20230105T172240_046640_05973D_1A2B-GRD_HD",
      "stopTime": "2023-01-05T17:22:40.000Z",
      "pathNumber": "44",
      "flightDirection": "ASCENDING",
      "processingLevel": "GRD_HD",
      "platform": "Sentinel-1A",
      "beamModeType": "IW",
      "centerLon": "9.1",
      "centerLat": "48.3",
      "url": "https://datapool.asf.alaska.edu/GRD_HD/SA/S1A_IW_GRDH_1SDV_20230105T172215_20230105T172240_046640_05973D_1A2B.zip"
    }
  }]
}"#;

fn without_identifier(record: &SceneRecord) -> SceneRecord {
    SceneRecord {
        product_identifier: String::new(),
        ..record.clone()
    }
}

#[test]
fn resto_catalogs_agree() {
    let (codede, _) = resto::parse_page(Repository::CodeDe, RESTO_PAGE).unwrap();
    let (creodias, _) = resto::parse_page(Repository::Creodias, RESTO_PAGE).unwrap();
    assert_eq!(codede, creodias);
}

#[test]
fn resto_and_asf_agree_except_identifier() {
    let (resto_records, next) = resto::parse_page(Repository::CodeDe, RESTO_PAGE).unwrap();
    assert!(next.is_none());
    let asf_records = asf::parse_response(ASF_RESPONSE).unwrap();

    assert_eq!(resto_records.len(), 1);
    assert_eq!(asf_records.len(), 1);
    assert_ne!(
        resto_records[0].product_identifier,
        asf_records[0].product_identifier
    );
    assert_eq!(
        without_identifier(&resto_records[0]),
        without_identifier(&asf_records[0])
    );
}
