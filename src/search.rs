use crate::config::{SearchConfig, SearchMode};
use crate::render::popup_html;
use crate::templates::SearchWidgetTemplate;
use crate::types::StakeholderRecord;
use askama::Template;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SearchEntry {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub popup: String,
}

/// Company lookup embedded in the page; one entry per rendered marker.
#[derive(Debug, Clone, Serialize, Default, PartialEq)]
pub struct SearchIndex {
    pub entries: Vec<SearchEntry>,
}

impl SearchIndex {
    pub fn from_records(records: &[StakeholderRecord]) -> askama::Result<Self> {
        let entries = records
            .iter()
            .map(|r| {
                Ok(SearchEntry {
                    name: r.company_name.clone(),
                    lat: r.latitude,
                    lng: r.longitude,
                    popup: popup_html(r)?,
                })
            })
            .collect::<askama::Result<_>>()?;
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Case-insensitive substring match on the company name, same rule the
    /// page applies while typing. An empty query suggests nothing.
    pub fn filter(&self, query: &str) -> Vec<&SearchEntry> {
        let needle = query.to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.entries
            .iter()
            .filter(|e| e.name.to_lowercase().contains(&needle))
            .collect()
    }

    /// Input markup for the configured widget. Handlers are attached by the
    /// page script once the map exists.
    pub fn widget_html(&self, config: &SearchConfig) -> askama::Result<String> {
        SearchWidgetTemplate {
            dropdown: config.mode == SearchMode::Dropdown,
            placeholder: &config.placeholder,
            entries: &self.entries,
        }
        .render()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(name: &str, lat: f64, lon: f64) -> StakeholderRecord {
        StakeholderRecord {
            company_name: name.to_string(),
            category: "Aggregator".to_string(),
            commodity: "Maize".to_string(),
            office_address: String::new(),
            contact_person: String::new(),
            phone: String::new(),
            designation: String::new(),
            contact: String::new(),
            latitude: lat,
            longitude: lon,
        }
    }

    fn index() -> SearchIndex {
        SearchIndex::from_records(&[
            record("AgroFresh Ltd", 10.5, 7.4),
            record("Fertilizer Co", 10.6, 7.5),
            record("Kaduna Agro Hub", 10.7, 7.6),
        ])
        .unwrap()
    }

    #[test]
    fn filter_is_case_insensitive_substring() {
        let index = index();
        let names: Vec<&str> = index.filter("agro").iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["AgroFresh Ltd", "Kaduna Agro Hub"]);

        assert_eq!(index.filter("FERTI").len(), 1);
        assert!(index.filter("seed").is_empty());
        assert!(index.filter("").is_empty());
    }

    #[test]
    fn entries_carry_marker_popup() {
        let records = vec![record("AgroFresh Ltd", 10.5, 7.4)];
        let index = SearchIndex::from_records(&records).unwrap();
        assert_eq!(index.entries[0].popup, popup_html(&records[0]).unwrap());
        assert_eq!((index.entries[0].lat, index.entries[0].lng), (10.5, 7.4));
    }

    #[test]
    fn dropdown_escapes_names_and_indexes_options() {
        let index = SearchIndex::from_records(&[record("A & B <Farms>", 1.0, 1.0)]).unwrap();
        let config = SearchConfig {
            mode: SearchMode::Dropdown,
            ..SearchConfig::default()
        };
        let html = index.widget_html(&config).unwrap();
        assert!(html.contains(r#"<option value="0">A &amp; B &lt;Farms&gt;</option>"#));
        assert!(html.contains(r#"id="company-select""#));
        assert!(!html.contains(r#"id="search-box""#));
    }

    #[test]
    fn autocomplete_uses_placeholder() {
        let config = SearchConfig {
            placeholder: "Find \"company\"".to_string(),
            ..SearchConfig::default()
        };
        let html = index().widget_html(&config).unwrap();
        assert!(html.contains(r#"placeholder="Find &quot;company&quot;""#));
        assert!(html.contains(r#"<ul id="suggestions"></ul>"#));
    }
}
