use std::fs;
use std::io::Write;
use std::path::Path;

use serde_json::{json, Value};
use xz::write::XzEncoder;

use osm_wrangle::etl::load_documents::{LoadDocumentsEtl, LoadSummary};
use osm_wrangle::etl::sample_osm::SampleOsmEtl;
use osm_wrangle::{
    open_source, shape_element, DocumentStore, ElementStream, ErrorKind, Etl, JsonLinesStore,
    MemoryStore, UserConfig,
};

const CHICAGO: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<osm version="0.6" generator="CGImap 0.0.2">
 <bounds minlat="41.9704500" minlon="-87.6928300" maxlat="41.9758200" maxlon="-87.6894800"/>
 <node id="261114295" visible="true" version="7" changeset="11129782" timestamp="2012-03-28T18:31:23Z" user="bbmiller" uid="451048" lat="41.9730791" lon="-87.6866303"/>
 <node id="261114296" visible="true" version="6" changeset="8448766" timestamp="2011-06-15T17:04:54Z" user="bbmiller" uid="451048" lat="41.9730416" lon="-87.6878512">
  <tag k="addr:housenumber" v="5157"/>
  <tag k="addr:street" v="North Lincoln Ave"/>
  <tag k="name" v="Matty &amp; Co"/>
 </node>
 <node id="261114297" lat="41.9729" lon="-87.6891">
  <tag k="addr:housenumber" v="3,5,7"/>
 </node>
 <way id="258219703" visible="true" version="1" changeset="20187382" timestamp="2014-01-25T02:01:54Z" user="linuxUser16" uid="1219059">
  <nd ref="2636084635"/>
  <nd ref="2636084632"/>
  <tag k="highway" v="service"/>
  <tag k="addr:housenumber" v="12A-15"/>
  <tag k="name" v="A"/>
  <tag k="name" v="B"/>
 </way>
 <relation id="1557627" visible="true" version="2" changeset="8394" timestamp="2011-06-12T00:00:00Z" user="x" uid="1">
  <member type="way" ref="258219703" role="outer"/>
  <tag k="type" v="multipolygon"/>
 </relation>
</osm>
"#;

fn write_xz(path: &Path, text: &str) {
    let mut encoder = XzEncoder::new(fs::File::create(path).unwrap(), 6);
    encoder.write_all(text.as_bytes()).unwrap();
    encoder.finish().unwrap();
}

fn shaped(xml: &str) -> Vec<Option<Value>> {
    ElementStream::new(xml.as_bytes())
        .map(|element| {
            shape_element(element.unwrap().element())
                .unwrap()
                .map(Value::from)
        })
        .collect()
}

#[test]
fn documents_follow_the_shaping_rules() {
    let documents = shaped(CHICAGO);
    assert_eq!(documents.len(), 5);

    assert_eq!(
        documents[0],
        Some(json!({
            "id": "261114295",
            "visible": "true",
            "created": {
                "version": "7",
                "changeset": "11129782",
                "timestamp": "2012-03-28T18:31:23Z",
                "user": "bbmiller",
                "uid": "451048"
            },
            "pos": [41.9730791, -87.6866303],
            "type": "node"
        }))
    );

    let second = documents[1].as_ref().unwrap();
    assert_eq!(second["addr:housenumber"], json!(["5157"]));
    assert_eq!(second["name"], json!("Matty & Co"));

    let third = documents[2].as_ref().unwrap();
    assert_eq!(third["addr:housenumber"], json!(["3", "5", "7"]));
    assert!(third.get("created").is_none());

    let way = documents[3].as_ref().unwrap();
    assert_eq!(way["type"], json!("way"));
    assert_eq!(way["addr:housenumber"], json!(["12A-15"]));
    assert_eq!(way["name"], json!("B"));
    assert!(way.get("pos").is_none());

    assert_eq!(documents[4], None);
}

#[test]
fn xz_sources_stream_like_plain_ones() {
    let dir = tempfile::tempdir().unwrap();
    let plain = dir.path().join("chicago.osm");
    let packed = dir.path().join("chicago.osm.xz");
    fs::write(&plain, CHICAGO).unwrap();
    write_xz(&packed, CHICAGO);

    let plain_ids: Vec<String> = ElementStream::new(open_source(&plain).unwrap())
        .map(|el| el.unwrap().element().attribute("id").unwrap().to_string())
        .collect();
    let packed_ids: Vec<String> = ElementStream::new(open_source(&packed).unwrap())
        .map(|el| el.unwrap().element().attribute("id").unwrap().to_string())
        .collect();
    assert_eq!(plain_ids.len(), 5);
    assert_eq!(plain_ids, packed_ids);
}

#[test]
fn missing_source_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = open_source(&dir.path().join("absent.osm")).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Io);
}

#[test]
fn configured_run_samples_and_loads() {
    let dir = tempfile::tempdir().unwrap();
    let data_path = dir.path().join("chicago.osm.xz");
    let sample_path = dir.path().join("sample.osm");
    let documents_path = dir.path().join("documents.jsonl");
    write_xz(&data_path, CHICAGO);

    let config = UserConfig::from_json(
        &json!({
            "data_path": data_path,
            "sample_path": sample_path,
            "sample_interval": 2,
            "documents_path": documents_path,
        })
        .to_string(),
    )
    .unwrap();

    let mut sample_etl = SampleOsmEtl::from_config(&config).unwrap();
    sample_etl.process().unwrap();
    assert_eq!(sample_etl.written(), 3);

    let sample_ids: Vec<String> = ElementStream::new(open_source(&sample_path).unwrap())
        .map(|el| el.unwrap().element().attribute("id").unwrap().to_string())
        .collect();
    assert_eq!(sample_ids, vec!["261114295", "261114297", "1557627"]);
    let sample_text = fs::read_to_string(&sample_path).unwrap();
    assert!(sample_text.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<osm>\n"));
    assert!(sample_text.contains("<tag k=\"addr:housenumber\" v=\"3,5,7\"/>"));

    let mut store = JsonLinesStore::create(&config.documents_path()).unwrap();
    let summary = {
        let mut load_etl = LoadDocumentsEtl::from_config(&config, &mut store);
        load_etl.process().unwrap();
        load_etl.summary()
    };
    assert_eq!(summary, LoadSummary { elements: 5, upserted: 4, skipped: 1 });

    let lines: Vec<Value> = fs::read_to_string(&documents_path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0]["id"], json!("261114295"));
    assert_eq!(store.find_one().unwrap().unwrap().id(), Some("261114295"));
}

#[test]
fn inclusive_ranges_can_be_configured() {
    let dir = tempfile::tempdir().unwrap();
    let data_path = dir.path().join("range.osm");
    fs::write(
        &data_path,
        r#"<osm><node id="1"><tag k="addr:housenumber" v="12-15"/></node></osm>"#,
    )
    .unwrap();
    let config = UserConfig::from_json(
        &json!({
            "data_path": data_path,
            "sample_path": dir.path().join("unused.osm"),
            "inclusive_ranges": true,
        })
        .to_string(),
    )
    .unwrap();

    let mut store = MemoryStore::new();
    LoadDocumentsEtl::from_config(&config, &mut store).process().unwrap();
    let document = store.find_one().unwrap().unwrap();
    assert_eq!(document.get("addr:housenumber"), Some(&json!(["12", "13", "14", "15"])));
}

#[test]
fn loading_twice_does_not_duplicate_documents() {
    let dir = tempfile::tempdir().unwrap();
    let data_path = dir.path().join("chicago.osm");
    fs::write(&data_path, CHICAGO).unwrap();

    let mut store = MemoryStore::new();
    for _ in 0..2 {
        let mut etl = LoadDocumentsEtl::from_config(
            &UserConfig::from_json(
                &json!({"data_path": data_path, "sample_path": dir.path().join("s.osm")}).to_string(),
            )
            .unwrap(),
            &mut store,
        );
        etl.process().unwrap();
    }
    assert_eq!(store.len(), 4);
}

#[test]
fn malformed_source_fails_the_load() {
    let dir = tempfile::tempdir().unwrap();
    let data_path = dir.path().join("broken.osm");
    fs::write(&data_path, "<osm><node id=\"1\" lat=\"1\" lon=\"2\"></osm>").unwrap();

    let mut store = MemoryStore::new();
    let config = UserConfig::from_json(
        &json!({"data_path": data_path, "sample_path": dir.path().join("s.osm")}).to_string(),
    )
    .unwrap();
    let err = LoadDocumentsEtl::from_config(&config, &mut store)
        .process()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Xml);
}
