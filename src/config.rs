use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub icons: IconPolicy,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub heatmap: HeatmapConfig,
    #[serde(default)]
    pub boundaries: BoundariesConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    pub stakeholders_csv: PathBuf,
    pub state_boundaries: Option<PathBuf>,
    pub lga_boundaries: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OutputConfig {
    pub html: PathBuf,
    pub cleaned_csv: Option<PathBuf>, // copy of the rows that survived cleaning
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            html: PathBuf::from("stakeholders_map.html"),
            cleaned_csv: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MapConfig {
    pub zoom_start: u8,
    pub search_zoom: u8,
    /// [lat, lon] used when no record has usable coordinates.
    pub fallback_center: [f64; 2],
    pub tiles: String,
    pub attribution: String,
    pub mouse_position: bool,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            zoom_start: 6,
            search_zoom: 12,
            fallback_center: [10.5, 7.5],
            tiles: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            attribution: "&copy; OpenStreetMap contributors".to_string(),
            mouse_position: false,
        }
    }
}

/// Category -> icon lookup with an explicit fallback.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct IconPolicy {
    pub default: String,
    pub size: u32,
    pub categories: BTreeMap<String, String>,
}

impl Default for IconPolicy {
    fn default() -> Self {
        Self {
            default: "https://cdn-icons-png.flaticon.com/512/684/684908.png".to_string(),
            size: 30,
            categories: BTreeMap::new(),
        }
    }
}

impl IconPolicy {
    /// Exact match on the category string, otherwise the default icon.
    pub fn icon_for(&self, category: &str) -> &str {
        self.categories
            .get(category)
            .map(String::as_str)
            .unwrap_or(&self.default)
    }

    fn validate(&self) -> Result<()> {
        if self.default.trim().is_empty() {
            bail!("icons.default must not be empty");
        }
        if self.size == 0 {
            bail!("icons.size must be greater than zero");
        }
        for (category, icon) in &self.categories {
            if icon.trim().is_empty() {
                bail!("icon for category '{}' must not be empty", category);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RenderConfig {
    pub cluster: bool,
    pub category_layers: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            cluster: true,
            category_layers: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HeatmapConfig {
    pub enabled: bool,
    pub radius: u32,
    pub blur: u32,
    /// Stop ("0.0".."1.0") -> CSS colour.
    pub gradient: BTreeMap<String, String>,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            radius: 10,
            blur: 15,
            gradient: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryStyle {
    pub name: String,
    pub color: String,
    pub weight: f64,
    /// Feature property shown as a hover label.
    pub label_property: Option<String>,
}

/// One `[boundaries.*]` table as written; unset keys keep the layer default.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct BoundaryStyleTable {
    name: Option<String>,
    color: Option<String>,
    weight: Option<f64>,
    label_property: Option<String>,
}

impl BoundaryStyleTable {
    fn over(self, base: BoundaryStyle) -> BoundaryStyle {
        BoundaryStyle {
            name: self.name.unwrap_or(base.name),
            color: self.color.unwrap_or(base.color),
            weight: self.weight.unwrap_or(base.weight),
            label_property: self.label_property.or(base.label_property),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct BoundaryTables {
    state: BoundaryStyleTable,
    lga: BoundaryStyleTable,
}

impl From<BoundaryTables> for BoundariesConfig {
    fn from(tables: BoundaryTables) -> Self {
        let defaults = BoundariesConfig::default();
        Self {
            state: tables.state.over(defaults.state),
            lga: tables.lga.over(defaults.lga),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(from = "BoundaryTables")]
pub struct BoundariesConfig {
    pub state: BoundaryStyle,
    pub lga: BoundaryStyle,
}

impl Default for BoundariesConfig {
    fn default() -> Self {
        Self {
            state: BoundaryStyle {
                name: "State Boundaries".to_string(),
                color: "blue".to_string(),
                weight: 2.0,
                label_property: None,
            },
            lga: BoundaryStyle {
                name: "LGA Boundaries".to_string(),
                color: "green".to_string(),
                weight: 1.0,
                label_property: None,
            },
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    Autocomplete,
    Dropdown,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SearchConfig {
    pub mode: SearchMode,
    pub placeholder: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            mode: SearchMode::Autocomplete,
            placeholder: "Search for a company...".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RoutingConfig {
    pub enabled: bool,
    pub api_key: Option<String>,
    pub api_key_env: Option<String>,
    pub profile: String,
    pub endpoint: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            api_key_env: None,
            profile: "driving-car".to_string(),
            endpoint: "https://api.openrouteservice.org/v2/directions".to_string(),
        }
    }
}

impl RoutingConfig {
    /// Inline key first, then the named environment variable. Blank values
    /// count as unset.
    pub fn resolve_api_key(&self) -> Option<String> {
        let present = |key: &String| !key.trim().is_empty();
        self.api_key.clone().filter(present).or_else(|| {
            self.api_key_env
                .as_ref()
                .and_then(|var| std::env::var(var).ok())
                .filter(present)
        })
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AppConfig =
            toml::from_str(content).with_context(|| "Failed to parse TOML configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.icons.validate()?;

        if self.map.zoom_start > 20 || self.map.search_zoom > 20 {
            bail!("map zoom levels must be between 0 and 20");
        }
        let [lat, lon] = self.map.fallback_center;
        if !lat.is_finite() || !lon.is_finite() {
            bail!("map.fallback_center must contain finite numbers");
        }

        if self.heatmap.enabled && self.heatmap.radius == 0 {
            bail!("heatmap.radius must be greater than zero");
        }
        for (stop, color) in &self.heatmap.gradient {
            let value: f64 = stop
                .parse()
                .with_context(|| format!("heatmap gradient stop '{}' is not a number", stop))?;
            if !(0.0..=1.0).contains(&value) {
                bail!("heatmap gradient stop '{}' must lie in [0, 1]", stop);
            }
            if color.trim().is_empty() {
                bail!("heatmap gradient colour for stop '{}' is empty", stop);
            }
        }

        for style in [&self.boundaries.state, &self.boundaries.lga] {
            if style.color.trim().is_empty() {
                bail!("boundary layer '{}' needs an outline colour", style.name);
            }
        }

        if self.routing.enabled && self.routing.profile.trim().is_empty() {
            bail!("routing.profile must not be empty");
        }

        Ok(())
    }
}
