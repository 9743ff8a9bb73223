use agri_stakeholder_map::config::AppConfig;
use agri_stakeholder_map::error::{LoadError, PipelineError};
use agri_stakeholder_map::html::data_document;
use agri_stakeholder_map::pipeline::{self, Warning};
use pretty_assertions::assert_eq;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

const HEADER: &str = "Company Name,Category,Commodity,Office Address,Contact Person,Phone number,Designation,Email/Website,Latitude,Longitude";

const LGA_GEOJSON: &str = r#"{"type":"FeatureCollection","features":[
  {"type":"Feature","properties":{"lga_name":"Zaria"},
   "geometry":{"type":"Polygon","coordinates":[[[7.5,11.0],[7.9,11.0],[7.9,11.3],[7.5,11.3],[7.5,11.0]]]}}]}"#;

fn write_csv(dir: &Path, rows: &[&str]) -> String {
    let path = dir.join("stakeholders.csv");
    let mut content = String::from(HEADER);
    for row in rows {
        content.push('\n');
        content.push_str(row);
    }
    content.push('\n');
    fs::write(&path, content).unwrap();
    path.display().to_string()
}

fn config_for(dir: &TempDir, rows: &[&str], extra: &str) -> AppConfig {
    let csv = write_csv(dir.path(), rows);
    let toml = format!(
        r#"
        [input]
        stakeholders_csv = {csv:?}
        state_boundaries = {state:?}
        lga_boundaries = {lga:?}

        [output]
        html = {html:?}

        {extra}
        "#,
        csv = csv,
        state = dir.path().join("kaduna.geojson").display().to_string(),
        lga = dir.path().join("lga_boundaries.geojson").display().to_string(),
        html = dir.path().join("out/stakeholders_map.html").display().to_string(),
        extra = extra,
    );
    AppConfig::from_toml(&toml).unwrap()
}

fn embedded_data(page: &str) -> Value {
    let open = r#"<script type="application/json" id="stakeholder-data">"#;
    let start = page.find(open).unwrap() + open.len();
    let end = start + page[start..].find("</script>").unwrap();
    serde_json::from_str(&page[start..end]).unwrap()
}

const THREE_ROWS: [&str; 3] = [
    "AgroFresh Ltd,Aggregator,Maize,Kaduna,Ada,0803,CEO,info@agrofresh.ng,10.52,7.44",
    "Fertilizer Co,Fertilizer Company,NPK,Zaria,Bello,0805,MD,fert.ng,not-a-number,7.70",
    "Kaduna Seeds,Seeds Company,Rice,Kafanchan,Chi,0807,Manager,seeds.ng,9.60,8.30",
];

#[tokio::test]
async fn invalid_latitude_row_is_excluded_from_markers_and_search() {
    let dir = tempdir().unwrap();
    let config = config_for(&dir, &THREE_ROWS, "");

    let report = pipeline::run(&config).await.unwrap();
    assert_eq!(report.total_rows, 3);
    assert_eq!(report.valid_rows, 2);
    assert_eq!(report.markers, 2);
    assert_eq!(report.search_entries, 2);
    assert_eq!(report.dropped.len(), 1);
    assert_eq!(report.dropped[0].line, 3);
    assert_eq!(report.dropped[0].company_name, "Fertilizer Co");

    let page = fs::read_to_string(&config.output.html).unwrap();
    let data = embedded_data(&page);
    assert_eq!(data["map"]["markers"].as_array().unwrap().len(), 2);
    let names: Vec<&str> = data["search"]["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["AgroFresh Ltd", "Kaduna Seeds"]);
}

#[test]
fn center_is_mean_of_valid_rows_only() {
    let dir = tempdir().unwrap();
    let config = config_for(&dir, &THREE_ROWS, "");

    let built = pipeline::build(&config).unwrap().value;
    let [lat, lon] = built.map.view.center;
    assert!((lat - (10.52 + 9.60) / 2.0).abs() < 1e-9);
    assert!((lon - (7.44 + 8.30) / 2.0).abs() < 1e-9);
}

#[test]
fn no_valid_rows_falls_back_to_configured_center() {
    let dir = tempdir().unwrap();
    let config = config_for(
        &dir,
        &["Nowhere Ltd,Processors,,,,,,,,"],
        "[map]\nfallback_center = [9.0, 8.0]",
    );

    let built = pipeline::build(&config).unwrap().value;
    assert_eq!(built.map.view.center, [9.0, 8.0]);
    assert!(built.map.markers.is_empty());
    assert!(built.search.is_empty());
}

#[test]
fn missing_boundaries_degrade_without_blocking_markers_or_search() {
    let dir = tempdir().unwrap();
    let config = config_for(&dir, &THREE_ROWS, "");

    let staged = pipeline::build(&config).unwrap();
    let skipped: Vec<&str> = staged
        .warnings
        .iter()
        .filter_map(|w| match w {
            Warning::BoundarySkipped { layer, .. } => Some(layer.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(skipped, vec!["State Boundaries", "LGA Boundaries"]);
    assert!(staged
        .warnings
        .contains(&Warning::RowsDropped { count: 1 }));

    let built = staged.value;
    assert!(built.map.boundaries.is_empty());
    assert_eq!(built.map.markers.len(), 2);
    assert_eq!(built.search.len(), 2);

    let page = built.page(&config).unwrap();
    assert!(page.contains(r#"id="search-box""#));
}

#[test]
fn loaded_boundaries_become_toggleable_overlays() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("lga_boundaries.geojson"), LGA_GEOJSON).unwrap();
    fs::write(dir.path().join("kaduna.geojson"), LGA_GEOJSON).unwrap();
    let config = config_for(
        &dir,
        &THREE_ROWS,
        r#"
        [heatmap]
        enabled = true

        [boundaries.state]
        name = "Kaduna State Boundary"
        color = "blue"
        weight = 2

        [boundaries.lga]
        name = "LGA Boundaries"
        color = "green"
        label_property = "lga_name"
        "#,
    );

    let staged = pipeline::build(&config).unwrap();
    assert!(!staged
        .warnings
        .iter()
        .any(|w| matches!(w, Warning::BoundarySkipped { .. })));

    let map = &staged.value.map;
    assert_eq!(
        map.overlay_names(),
        vec!["Stakeholders", "Density", "Kaduna State Boundary", "LGA Boundaries"]
    );
    assert_eq!(map.boundaries[0].color, "blue");
    assert_eq!(map.boundaries[1].color, "green");
    assert_eq!(map.boundaries[1].label_property.as_deref(), Some("lga_name"));
}

#[test]
fn identical_input_gives_identical_embedded_data() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("lga_boundaries.geojson"), LGA_GEOJSON).unwrap();
    let config = config_for(&dir, &THREE_ROWS, "[heatmap]\nenabled = true");

    let first = pipeline::build(&config).unwrap().value;
    let second = pipeline::build(&config).unwrap().value;
    assert_eq!(
        data_document(&first.map, &first.search).unwrap(),
        data_document(&second.map, &second.search).unwrap()
    );
}

#[test]
fn hostile_company_names_stay_inside_the_data_document() {
    let dir = tempdir().unwrap();
    let config = config_for(
        &dir,
        &[r#""</script><script>alert(1)</script>",Processors,Maize,,,,,,10.0,7.0"#],
        "",
    );

    let page = pipeline::build(&config).unwrap().value.page(&config).unwrap();
    assert!(!page.contains("<script>alert(1)"));
    let data = embedded_data(&page);
    assert_eq!(
        data["search"]["entries"][0]["name"],
        "</script><script>alert(1)</script>"
    );
}

#[test]
fn missing_required_column_is_fatal() {
    let dir = tempdir().unwrap();
    let csv = dir.path().join("stakeholders.csv");
    fs::write(&csv, "Company Name,Category,Latitude\nA,B,10\n").unwrap();
    let config = AppConfig::from_toml(&format!(
        "[input]\nstakeholders_csv = {:?}\n",
        csv.display().to_string()
    ))
    .unwrap();

    match pipeline::build(&config) {
        Err(PipelineError::Load(LoadError::MissingColumns { columns, .. })) => {
            assert!(columns.contains(&"Longitude".to_string()));
        }
        other => panic!("expected missing columns, got {:?}", other.map(|s| s.warnings)),
    }
}

#[test]
fn missing_input_file_is_fatal() {
    let dir = tempdir().unwrap();
    let config = AppConfig::from_toml(&format!(
        "[input]\nstakeholders_csv = {:?}\n",
        dir.path().join("absent.csv").display().to_string()
    ))
    .unwrap();

    assert!(matches!(
        pipeline::check(&config),
        Err(PipelineError::Load(LoadError::FileNotFound(_)))
    ));
}

#[tokio::test]
async fn routing_without_key_warns_and_still_writes_outputs() {
    let dir = tempdir().unwrap();
    let cleaned = dir.path().join("filtered_stakeholders.csv");
    let mut config = config_for(
        &dir,
        &THREE_ROWS,
        "[routing]\nenabled = true\n\n[search]\nmode = \"dropdown\"\n",
    );
    config.output.cleaned_csv = Some(cleaned.clone());

    let report = pipeline::run(&config).await.unwrap();
    assert!(report
        .warnings
        .iter()
        .any(|w| matches!(w, Warning::RouteUnavailable { .. })));
    assert!(!report.overlays.contains(&"Route".to_string()));

    let page = fs::read_to_string(&config.output.html).unwrap();
    assert!(page.contains(r#"id="company-select""#));
    assert!(page.contains(r#"<option value="1">Kaduna Seeds</option>"#));

    let csv = fs::read_to_string(&cleaned).unwrap();
    assert_eq!(csv.lines().count(), 3);
    assert!(!csv.contains("Fertilizer Co"));
}

#[test]
fn check_reports_without_writing() {
    let dir = tempdir().unwrap();
    let config = config_for(&dir, &THREE_ROWS, "");

    let report = pipeline::check(&config).unwrap();
    assert_eq!(report.valid_rows, 2);
    assert!(report.output.is_none());
    assert!(!config.output.html.exists());
}
