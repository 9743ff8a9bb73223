use geo::Point;
use geojson::FeatureCollection;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const COL_COMPANY: &str = "Company Name";
pub const COL_CATEGORY: &str = "Category";
pub const COL_COMMODITY: &str = "Commodity";
pub const COL_ADDRESS: &str = "Office Address";
pub const COL_CONTACT_PERSON: &str = "Contact Person";
pub const COL_PHONE: &str = "Phone number";
pub const COL_DESIGNATION: &str = "Designation";
pub const COL_CONTACT: &str = "Email/Website";
pub const COL_LATITUDE: &str = "Latitude";
pub const COL_LONGITUDE: &str = "Longitude";

/// Columns the stakeholder CSV must carry, in output order.
pub const REQUIRED_COLUMNS: [&str; 10] = [
    COL_COMPANY,
    COL_CATEGORY,
    COL_COMMODITY,
    COL_ADDRESS,
    COL_CONTACT_PERSON,
    COL_PHONE,
    COL_DESIGNATION,
    COL_CONTACT,
    COL_LATITUDE,
    COL_LONGITUDE,
];

/// One CSV row before cleaning.
#[derive(Debug, Clone)]
pub struct RawRow {
    /// 1-based line in the source file (header is line 1).
    pub line: u64,
    pub fields: HashMap<String, String>,
}

impl RawRow {
    /// Missing columns read as the empty string.
    pub fn get(&self, column: &str) -> &str {
        self.fields.get(column).map(String::as_str).unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StakeholderRecord {
    #[serde(rename = "Company Name")]
    pub company_name: String,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Commodity")]
    pub commodity: String,
    #[serde(rename = "Office Address")]
    pub office_address: String,
    #[serde(rename = "Contact Person")]
    pub contact_person: String,
    #[serde(rename = "Phone number")]
    pub phone: String,
    #[serde(rename = "Designation")]
    pub designation: String,
    #[serde(rename = "Email/Website")]
    pub contact: String,
    #[serde(rename = "Latitude")]
    pub latitude: f64,
    #[serde(rename = "Longitude")]
    pub longitude: f64,
}

impl StakeholderRecord {
    /// geo points are (x = lon, y = lat).
    pub fn point(&self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }
}

/// A polygon collection rendered as one toggleable overlay.
#[derive(Debug, Clone)]
pub struct BoundaryLayer {
    pub name: String,
    pub color: String,
    pub weight: f64,
    pub label_property: Option<String>,
    pub features: FeatureCollection,
}
