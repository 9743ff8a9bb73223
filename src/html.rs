//! Static page assets and the escaping used to embed data in them.
//!
//! Records reach the browser only through the JSON document inside
//! `<script type="application/json" id="stakeholder-data">`. The page script
//! parses it, so no record text is ever spliced into executable code.

use crate::config::SearchConfig;
use crate::error::PipelineResult;
use crate::render::MapDocument;
use crate::search::SearchIndex;
use crate::templates::PageTemplate;
use askama::Template;
use serde::Serialize;

const LEAFLET_CSS: &str = r#"<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css" crossorigin="">"#;
const LEAFLET_JS: &str = r#"<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js" crossorigin=""></script>"#;
const CLUSTER_CSS: &str = r#"<link rel="stylesheet" href="https://unpkg.com/leaflet.markercluster@1.5.3/dist/MarkerCluster.css">
  <link rel="stylesheet" href="https://unpkg.com/leaflet.markercluster@1.5.3/dist/MarkerCluster.Default.css">"#;
const CLUSTER_JS: &str = r#"<script src="https://unpkg.com/leaflet.markercluster@1.5.3/dist/leaflet.markercluster.js"></script>"#;
const HEAT_JS: &str = r#"<script src="https://unpkg.com/leaflet.heat@0.2.0/dist/leaflet-heat.js"></script>"#;

pub const APP_SCRIPT: &str = r#"(function () {
  var data = JSON.parse(document.getElementById('stakeholder-data').textContent);
  var doc = data.map;
  var view = doc.view;

  var map = L.map('map', { center: view.center, zoom: view.zoom });
  L.control.scale().addTo(map);
  L.tileLayer(doc.tiles.url, { attribution: doc.tiles.attribution }).addTo(map);

  var overlays = {};
  var icons = {};
  function iconFor(url) {
    if (!icons[url]) {
      icons[url] = L.icon({ iconUrl: url, iconSize: [doc.icon_size, doc.icon_size] });
    }
    return icons[url];
  }

  doc.marker_layers.forEach(function (layer) {
    var group = layer.cluster && L.markerClusterGroup ? L.markerClusterGroup() : L.featureGroup();
    layer.members.forEach(function (i) {
      var m = doc.markers[i];
      L.marker([m.lat, m.lng], { icon: iconFor(m.icon) })
        .bindPopup(m.popup, { maxWidth: 300 })
        .bindTooltip(m.name)
        .addTo(group);
    });
    group.addTo(map);
    overlays[layer.name] = group;
  });

  if (doc.heat && L.heatLayer) {
    var heatOptions = { radius: doc.heat.radius, blur: doc.heat.blur };
    if (Object.keys(doc.heat.gradient).length > 0) {
      heatOptions.gradient = doc.heat.gradient;
    }
    var heat = L.heatLayer(doc.heat.points, heatOptions).addTo(map);
    overlays[doc.heat.name] = heat;
  }

  doc.boundaries.forEach(function (b) {
    var layer = L.geoJSON(b.data, {
      style: function () {
        return { color: b.color, weight: b.weight, fillColor: 'transparent', fillOpacity: 0 };
      },
      onEachFeature: function (feature, l) {
        var props = feature.properties || {};
        if (b.label_property && props[b.label_property] != null) {
          l.bindTooltip(String(props[b.label_property]));
        }
      }
    }).addTo(map);
    overlays[b.name] = layer;
  });

  if (doc.route) {
    overlays[doc.route.name] = L.polyline(doc.route.points, {
      color: doc.route.color, weight: doc.route.weight, opacity: doc.route.opacity
    }).addTo(map);
  }

  L.control.layers(null, overlays, { collapsed: false }).addTo(map);

  if (doc.mouse_position) {
    var position = L.control({ position: 'topright' });
    position.onAdd = function () {
      var div = L.DomUtil.create('div', 'mouse-position');
      div.textContent = 'No coordinates';
      map.on('mousemove', function (e) {
        div.textContent = e.latlng.lat.toFixed(5) + ' | ' + e.latlng.lng.toFixed(5);
      });
      map.on('mouseout', function () { div.textContent = 'No coordinates'; });
      return div;
    };
    position.addTo(map);
  }

  var entries = data.search.entries;
  function flyTo(entry) {
    map.flyTo([entry.lat, entry.lng], view.search_zoom);
    L.popup({ maxWidth: 300 }).setLatLng([entry.lat, entry.lng]).setContent(entry.popup).openOn(map);
  }

  var box = document.getElementById('search-box');
  var suggestions = document.getElementById('suggestions');
  if (box && suggestions) {
    box.addEventListener('input', function () {
      var query = box.value.toLowerCase();
      suggestions.innerHTML = '';
      if (query.length === 0) {
        return;
      }
      entries.forEach(function (entry) {
        if (entry.name.toLowerCase().indexOf(query) === -1) {
          return;
        }
        var li = document.createElement('li');
        li.textContent = entry.name;
        li.addEventListener('click', function () {
          box.value = entry.name;
          suggestions.innerHTML = '';
          flyTo(entry);
        });
        suggestions.appendChild(li);
      });
    });
  }

  var select = document.getElementById('company-select');
  if (select) {
    select.addEventListener('change', function () {
      var entry = entries[parseInt(select.value, 10)];
      if (entry) {
        flyTo(entry);
      }
    });
  }
})();"#;

#[derive(Serialize)]
struct PageData<'a> {
    map: &'a MapDocument,
    search: &'a SearchIndex,
}

/// Makes serialized JSON safe inside a `<script>` element. The escaped
/// characters can only occur inside JSON strings, where `\uXXXX` is valid.
pub fn escape_json_for_script(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        match c {
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            _ => out.push(c),
        }
    }
    out
}

/// The embedded data document: map layers plus the search index.
pub fn data_document(map: &MapDocument, search: &SearchIndex) -> serde_json::Result<String> {
    let json = serde_json::to_string(&PageData { map, search })?;
    Ok(escape_json_for_script(&json))
}

/// Assembles the complete standalone page.
pub fn render_page(
    title: &str,
    map: &MapDocument,
    search: &SearchIndex,
    search_config: &SearchConfig,
) -> PipelineResult<String> {
    let mut stylesheets = vec![LEAFLET_CSS];
    let mut scripts = vec![LEAFLET_JS];
    if map.uses_clustering() {
        stylesheets.push(CLUSTER_CSS);
        scripts.push(CLUSTER_JS);
    }
    if map.heat.is_some() {
        scripts.push(HEAT_JS);
    }

    let page = PageTemplate {
        title,
        stylesheets,
        scripts,
        widget: search.widget_html(search_config)?,
        data: data_document(map, search)?,
        app_script: APP_SCRIPT,
    };
    Ok(page.render()?)
}
